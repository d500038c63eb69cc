use crate::Args;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub groq_api_key: String,
    pub model: String,
    pub llm_base_url: String,
    pub ocr_language: String,
    pub max_file_size: usize,
}

impl TryFrom<Args> for Config {
    type Error = anyhow::Error;

    /// A missing API key is fatal here, before anything binds or downloads.
    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let groq_api_key = match args.groq_api_key {
            Some(key) if !key.trim().is_empty() => key,
            _ => anyhow::bail!(
                "❌ GROQ_API_KEY missing. Set it in the environment or pass --groq-api-key."
            ),
        };

        Ok(Self {
            host: args.host,
            port: args.port,
            groq_api_key,
            model: args.model,
            llm_base_url: args.llm_base_url,
            ocr_language: args.ocr_language,
            max_file_size: args.max_file_size,
        })
    }
}
