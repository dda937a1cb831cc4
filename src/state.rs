use std::sync::Arc;

use crate::auth::google::{GoogleTokenInfo, IdTokenVerifier};
use crate::auth::jwt::JwtKeys;
use crate::chat::client::{ChatClient, OpenAiClient};
use crate::config::AppConfig;
use crate::db;
use crate::knowledge::repo::{InfoRepo, PgInfoRepo};
use crate::notifs::repo::{NotifRepo, PgNotifRepo};
use crate::users::repo::{PgUserRepo, UserRepo};

/// Shared, read-only handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jwt: JwtKeys,
    pub users: Arc<dyn UserRepo>,
    pub notifs: Arc<dyn NotifRepo>,
    pub infos: Arc<dyn InfoRepo>,
    pub google: Arc<dyn IdTokenVerifier>,
    pub chat: Arc<dyn ChatClient>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let pool = db::connect(&config.database_url).await?;

        if config.google.client_id.is_none() {
            tracing::warn!("GOOGLE_CLIENT_ID is not set; /auth/google will fail");
        }
        if config.openai.api_key.is_none() {
            tracing::warn!("OPENAI_API_KEY is not set; /api/openai/ask will fail");
        }

        let google = Arc::new(GoogleTokenInfo::new(
            config.google.tokeninfo_url.clone(),
            config.google.client_id.clone(),
        )) as Arc<dyn IdTokenVerifier>;
        let chat = Arc::new(OpenAiClient::new(&config.openai)) as Arc<dyn ChatClient>;

        Ok(Self {
            jwt: JwtKeys::new(&config.jwt.secret),
            users: Arc::new(PgUserRepo::new(pool.clone())),
            notifs: Arc::new(PgNotifRepo::new(pool.clone())),
            infos: Arc::new(PgInfoRepo::new(pool)),
            google,
            chat,
            config,
        })
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserRepo>,
        notifs: Arc<dyn NotifRepo>,
        infos: Arc<dyn InfoRepo>,
        google: Arc<dyn IdTokenVerifier>,
        chat: Arc<dyn ChatClient>,
    ) -> Self {
        Self {
            jwt: JwtKeys::new(&config.jwt.secret),
            config,
            users,
            notifs,
            infos,
            google,
            chat,
        }
    }
}
