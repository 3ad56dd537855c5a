use clap::Parser;
use dotenv::dotenv;
use log::error;
use nobel_quizbot::cli::Args;
use nobel_quizbot::config::credentials::ensure_credential;
use nobel_quizbot::llm::LlmType;
use std::error::Error;
use std::process;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let llm_type: LlmType = args.chat_llm_type.parse()?;
    let api_key = match ensure_credential(&llm_type, args.api_key_for(&llm_type)) {
        Ok(key) => key,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e.guidance());
            process::exit(1);
        }
    };

    nobel_quizbot::run(args, api_key).await
}
