use crate::agent::{ QuizAgent, DEFAULT_SESSION_ID };
use crate::cli::Args;
use crate::models::quiz::{ ErrorResponse, QuizRequest, QuizResponse };
use std::error::Error;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use axum::{
    routing::{ get, post },
    Router,
    Json,
    extract::State,
    response::{ Html, IntoResponse, Response },
    http::{ HeaderMap, HeaderName, StatusCode },
};
use axum_server::Handle;
use tower_http::cors::{ Any, CorsLayer };
use log::{ info, warn, error };
use uuid::Uuid;

/// Request/response header naming the conversation a turn belongs to.
pub const SESSION_HEADER: &str = "x-session-id";
const MAX_SESSION_ID_LEN: usize = 128;
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

const DASHBOARD_HTML: &str = include_str!("../../assets/dashboard.html");

#[derive(Clone)]
struct AppState {
    agent: Arc<QuizAgent>,
}

pub fn router(agent: Arc<QuizAgent>, dashboard: bool) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(SESSION_HEADER)]);

    let mut app = Router::new().route("/quiz", post(quiz_handler));
    if dashboard {
        app = app.route("/", get(dashboard_handler));
    }

    app.layer(cors).with_state(AppState { agent })
}

pub async fn start_http_server(
    addr: SocketAddr,
    agent: Arc<QuizAgent>,
    args: &Args,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let app = router(agent, args.dashboard);
    if args.dashboard {
        info!("Dashboard enabled on GET /");
    }

    if args.enable_tls {
        let (cert_path, key_path) = match (&args.tls_cert_path, &args.tls_key_path) {
            (Some(cert), Some(key)) => (cert, key),
            _ => {
                error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
                return Err("TLS enabled without cert/key".into());
            }
        };
        // Several providers may be compiled in; pin ring before loading certificates.
        let _ = rustls::crypto::ring::default_provider().install_default();
        let tls_config = axum_server::tls_rustls::RustlsConfig
            ::from_pem_file(cert_path, key_path).await
            .map_err(|e| format!("Failed to load TLS certificate/key: {}", e))?;

        let handle = Handle::new();
        shutdown_on(handle.clone(), shutdown_signal());

        info!("HTTPS server listening on: https://{}", addr);
        axum_server
            ::bind_rustls(addr, tls_config)
            .handle(handle)
            .serve(app.into_make_service()).await?;
    } else {
        let listener = tokio::net::TcpListener
            ::bind(addr).await
            .map_err(|e| format!("Failed to bind HTTP server to {}: {}", addr, e))?;

        info!("HTTP server listening on: http://{}", addr);
        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(shutdown_signal()).await?;
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Drains in-flight requests on `handle` once `signal` resolves.
fn shutdown_on<F>(handle: Handle, signal: F)
    where F: Future<Output = ()> + Send + 'static
{
    tokio::spawn(async move {
        signal.await;
        handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
    });
}

fn session_id(headers: &HeaderMap) -> Result<String, String> {
    let Some(value) = headers.get(SESSION_HEADER) else {
        return Ok(DEFAULT_SESSION_ID.to_string());
    };
    let id = value
        .to_str()
        .map_err(|_| "Session id must be visible ASCII".to_string())?
        .trim();

    if id.is_empty() {
        Ok(DEFAULT_SESSION_ID.to_string())
    } else if id.len() > MAX_SESSION_ID_LEN {
        Err(format!("Session id longer than {} characters", MAX_SESSION_ID_LEN))
    } else {
        Ok(id.to_string())
    }
}

async fn quiz_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<QuizRequest>,
) -> Response {
    let session_id = match session_id(&headers) {
        Ok(id) => id,
        Err(message) => {
            warn!("Rejected quiz turn: {}", message);
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: message })).into_response();
        }
    };
    let prompt = req.into_prompt();
    info!("Quiz turn for '{}' ({} chars)", session_id, prompt.len());

    match state.agent.process_message(&session_id, &prompt).await {
        Ok(response) => (
            [(SESSION_HEADER, session_id)],
            Json(QuizResponse { response }),
        ).into_response(),
        Err(e) => {
            error!("Quiz turn for '{}' failed: {}", session_id, e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error: e.to_string() }))
                .into_response()
        }
    }
}

async fn dashboard_handler() -> Html<String> {
    Html(DASHBOARD_HTML.replace("{{session_id}}", &Uuid::new_v4().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tests::{ agent_with, FailingChatClient, StubChatClient, SYSTEM };
    use crate::models::chat::Role;
    use axum::body::{ to_bytes, Body };
    use axum::http::Request;
    use serde_json::{ json, Value };
    use tower::ServiceExt;

    fn post_quiz(body: &str, session: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/quiz")
            .header("content-type", "application/json");
        if let Some(id) = session {
            builder = builder.header(SESSION_HEADER, id);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(resp: Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn go_returns_the_stubbed_reply_and_records_the_turn() {
        let agent = Arc::new(agent_with(Arc::new(StubChatClient::new("Welcome!")), 0));

        let resp = router(agent.clone(), false)
            .oneshot(post_quiz(r#"{"prompt":"Go"}"#, None)).await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[SESSION_HEADER], DEFAULT_SESSION_ID);
        assert_eq!(json_body(resp).await, json!({"response": "Welcome!"}));

        let conv = agent.conversation(DEFAULT_SESSION_ID).await.unwrap();
        let transcript: Vec<(Role, &str)> = conv.messages
            .iter()
            .map(|m| (m.role, m.content.as_str()))
            .collect();
        assert_eq!(
            transcript,
            vec![(Role::System, SYSTEM), (Role::User, "Go"), (Role::Assistant, "Welcome!")]
        );
    }

    #[tokio::test]
    async fn second_post_grows_history_by_two() {
        let agent = Arc::new(agent_with(Arc::new(StubChatClient::new("Q")), 0));
        let app = router(agent.clone(), false);

        app.clone().oneshot(post_quiz(r#"{"prompt":"Go"}"#, None)).await.unwrap();
        let before = agent.conversation(DEFAULT_SESSION_ID).await.unwrap().len();
        app.oneshot(post_quiz(r#"{"prompt":"Go"}"#, None)).await.unwrap();
        let after = agent.conversation(DEFAULT_SESSION_ID).await.unwrap();

        assert_eq!(after.len(), before + 2);
        assert_eq!(after.messages[0].role, Role::System);
    }

    #[tokio::test]
    async fn missing_prompt_is_sent_as_empty_text() {
        let agent = Arc::new(agent_with(Arc::new(StubChatClient::new("Welcome!")), 0));

        let resp = router(agent.clone(), false).oneshot(post_quiz("{}", None)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let conv = agent.conversation(DEFAULT_SESSION_ID).await.unwrap();
        assert_eq!(conv.messages[1].role, Role::User);
        assert_eq!(conv.messages[1].content, "");
    }

    #[tokio::test]
    async fn completion_failure_is_a_server_error_without_an_assistant_entry() {
        let agent = Arc::new(agent_with(Arc::new(FailingChatClient), 0));

        let resp = router(agent.clone(), false)
            .oneshot(post_quiz(r#"{"prompt":"Go"}"#, None)).await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(resp).await;
        assert!(body["error"].as_str().unwrap().contains("completion service error"));

        let conv = agent.conversation(DEFAULT_SESSION_ID).await.unwrap();
        assert!(conv.messages.iter().all(|m| m.role != Role::Assistant));
        assert!(conv.len() <= 1);
    }

    #[tokio::test]
    async fn session_header_selects_and_echoes_the_conversation() {
        let agent = Arc::new(agent_with(Arc::new(StubChatClient::new("hi")), 0));
        let app = router(agent.clone(), false);

        let resp = app.clone()
            .oneshot(post_quiz(r#"{"prompt":"Go"}"#, Some("player-1"))).await
            .unwrap();
        assert_eq!(resp.headers()[SESSION_HEADER], "player-1");
        app.oneshot(post_quiz(r#"{"prompt":"Go"}"#, Some("player-2"))).await.unwrap();

        assert_eq!(agent.conversation("player-1").await.unwrap().len(), 3);
        assert_eq!(agent.conversation("player-2").await.unwrap().len(), 3);
        assert!(agent.conversation(DEFAULT_SESSION_ID).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn oversized_session_id_is_rejected() {
        let agent = Arc::new(agent_with(Arc::new(StubChatClient::new("hi")), 0));
        let long_id = "x".repeat(MAX_SESSION_ID_LEN + 1);

        let resp = router(agent, false)
            .oneshot(post_quiz(r#"{"prompt":"Go"}"#, Some(long_id.as_str()))).await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn dashboard_is_only_served_when_enabled() {
        let agent = Arc::new(agent_with(Arc::new(StubChatClient::new("hi")), 0));
        let get_root = || Request::builder().uri("/").body(Body::empty()).unwrap();

        let off = router(agent.clone(), false).oneshot(get_root()).await.unwrap();
        assert_eq!(off.status(), StatusCode::NOT_FOUND);

        let on = router(agent, true).oneshot(get_root()).await.unwrap();
        assert_eq!(on.status(), StatusCode::OK);
        let bytes = to_bytes(on.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Welcome to QuizBot!"));
        assert!(!html.contains("{{session_id}}"));
    }

    #[tokio::test]
    async fn cors_preflight_allows_any_origin() {
        let agent = Arc::new(agent_with(Arc::new(StubChatClient::new("hi")), 0));
        let preflight = Request::builder()
            .method("OPTIONS")
            .uri("/quiz")
            .header("origin", "http://localhost:3000")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();

        let resp = router(agent, false).oneshot(preflight).await.unwrap();

        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn handle_server_stops_when_the_signal_fires() {
        let agent = Arc::new(agent_with(Arc::new(StubChatClient::new("hi")), 0));
        let handle = Handle::new();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        shutdown_on(handle.clone(), async move {
            let _ = rx.await;
        });

        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let server = tokio::spawn(
            axum_server::bind(addr).handle(handle.clone()).serve(router(agent, false).into_make_service())
        );
        assert!(handle.listening().await.is_some());

        tx.send(()).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), server).await;
        assert!(result.unwrap().unwrap().is_ok());
    }
}
