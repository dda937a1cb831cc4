use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    /// OAuth client id the ID tokens must be issued for. Google sign-in is
    /// refused with a server error while this is unset.
    pub client_id: Option<String>,
    pub tokeninfo_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub google: GoogleConfig,
    pub openai: OpenAiConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;

        let secret = std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        anyhow::ensure!(!secret.trim().is_empty(), "JWT_SECRET is empty");

        let port = std::env::var("APP_PORT")
            .or_else(|_| std::env::var("PORT"))
            .ok()
            .map(|v| v.parse::<u16>())
            .transpose()
            .context("APP_PORT/PORT is not a valid port")?
            .unwrap_or(4000);

        let google = GoogleConfig {
            client_id: non_empty_var("GOOGLE_CLIENT_ID"),
            tokeninfo_url: std::env::var("GOOGLE_TOKENINFO_URL")
                .unwrap_or_else(|_| DEFAULT_TOKENINFO_URL.into()),
        };

        let openai = OpenAiConfig {
            api_key: non_empty_var("OPENAI_API_KEY"),
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.into()),
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.into()),
        };

        Ok(Self {
            database_url,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            jwt: JwtConfig { secret },
            google,
            openai,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
