use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod answer;
mod cache;
mod config;
mod engine;
mod engines;
mod error;
mod language;
mod llm;
mod server;
mod translate;

#[derive(Parser, Debug)]
#[command(name = "pixiread-server")]
#[command(about = "OCR, translation and document Q&A server")]
#[command(version)]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "PIXIREAD_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PIXIREAD_PORT", default_value = "8808")]
    pub port: u16,

    /// Groq API key used for translation and question answering
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub groq_api_key: Option<String>,

    /// Chat-completion model identifier
    #[arg(long, env = "PIXIREAD_MODEL", default_value = crate::llm::DEFAULT_MODEL)]
    pub model: String,

    /// Base URL of the chat-completions API
    #[arg(long, env = "PIXIREAD_LLM_BASE_URL", default_value = crate::llm::DEFAULT_BASE_URL)]
    pub llm_base_url: String,

    /// OCR language (leptess engine only, e.g. "eng", "hin", "fra")
    #[arg(long, env = "PIXIREAD_OCR_LANGUAGE", default_value = "eng")]
    pub ocr_language: String,

    /// Maximum upload size in bytes (default: 50MB)
    #[arg(long, env = "PIXIREAD_MAX_FILE_SIZE", default_value = "52428800")]
    pub max_file_size: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match config::Config::try_from(args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            return Err(e);
        }
    };

    tracing::info!("Starting pixiread-server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Binding to {}:{}", config.host, config.port);

    server::run(config).await
}
