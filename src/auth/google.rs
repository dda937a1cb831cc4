//! Google ID-token verification.
//!
//! Tokens are checked against Google's tokeninfo endpoint, which validates
//! the signature and expiry; the audience and issuer are checked here.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Identity claims of a verified Google ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleIdentity {
    pub sub: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("id token rejected: {0}")]
    Rejected(String),
    #[error("GOOGLE_CLIENT_ID is not configured")]
    NotConfigured,
    #[error("tokeninfo answered with status {0}")]
    Upstream(u16),
    #[error("tokeninfo request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait IdTokenVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, VerifyError>;
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: Option<String>,
    iss: Option<String>,
    sub: Option<String>,
    email: Option<String>,
    /// tokeninfo sends `"true"`/`"false"`; the boolean form is accepted too.
    email_verified: Option<serde_json::Value>,
    name: Option<String>,
    picture: Option<String>,
}

impl TokenInfo {
    fn email_is_verified(&self) -> bool {
        match &self.email_verified {
            Some(serde_json::Value::Bool(v)) => *v,
            Some(serde_json::Value::String(v)) => v == "true",
            _ => false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GoogleTokenInfo {
    http: reqwest::Client,
    endpoint: String,
    client_id: Option<String>,
}

impl GoogleTokenInfo {
    pub fn new(endpoint: impl Into<String>, client_id: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            client_id,
        }
    }
}

#[async_trait]
impl IdTokenVerifier for GoogleTokenInfo {
    async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, VerifyError> {
        let client_id = self.client_id.as_deref().ok_or(VerifyError::NotConfigured)?;

        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("id_token", id_token)])
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() {
            return Err(VerifyError::Rejected(format!("tokeninfo status {}", status)));
        }
        if !status.is_success() {
            return Err(VerifyError::Upstream(status.as_u16()));
        }

        let info: TokenInfo = response.json().await?;

        if info.aud.as_deref() != Some(client_id) {
            warn!(aud = ?info.aud, "id token issued for another client");
            return Err(VerifyError::Rejected("audience mismatch".into()));
        }
        if !info
            .iss
            .as_deref()
            .is_some_and(|iss| GOOGLE_ISSUERS.contains(&iss))
        {
            return Err(VerifyError::Rejected("unexpected issuer".into()));
        }

        let sub = info.sub.clone().filter(|s| !s.is_empty());
        let email = info.email.clone().filter(|e| !e.is_empty());
        let (Some(sub), Some(email)) = (sub, email) else {
            return Err(VerifyError::Rejected("payload lacks sub or email".into()));
        };
        // Accounts are keyed by email, so an unverified address must not sign in.
        if !info.email_is_verified() {
            warn!(google_sub = %sub, "google email is not verified");
            return Err(VerifyError::Rejected("email not verified".into()));
        }

        debug!(google_sub = %sub, "google id token verified");
        Ok(GoogleIdentity {
            sub,
            email,
            name: info.name,
            picture: info.picture,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CLIENT_ID: &str = "client-123.apps.googleusercontent.com";

    async fn verifier_with(body: serde_json::Value, status: u16) -> (MockServer, GoogleTokenInfo) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tokeninfo"))
            .and(query_param("id_token", "tok"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&server)
            .await;
        let verifier = GoogleTokenInfo::new(
            format!("{}/tokeninfo", server.uri()),
            Some(CLIENT_ID.to_string()),
        );
        (server, verifier)
    }

    #[tokio::test]
    async fn accepts_token_for_our_client() {
        let (_server, verifier) = verifier_with(
            json!({
                "aud": CLIENT_ID,
                "iss": "https://accounts.google.com",
                "sub": "1093",
                "email": "ann@example.com",
                "email_verified": "true",
                "name": "Ann",
                "picture": "https://img/ann.png",
                "exp": "1999999999"
            }),
            200,
        )
        .await;

        let identity = verifier.verify("tok").await.expect("verified");
        assert_eq!(identity.sub, "1093");
        assert_eq!(identity.email, "ann@example.com");
        assert_eq!(identity.name.as_deref(), Some("Ann"));
    }

    #[tokio::test]
    async fn rejects_token_for_other_audience() {
        let (_server, verifier) = verifier_with(
            json!({
                "aud": "someone-else",
                "iss": "accounts.google.com",
                "sub": "1093",
                "email": "ann@example.com"
            }),
            200,
        )
        .await;

        assert!(matches!(
            verifier.verify("tok").await,
            Err(VerifyError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn rejects_payload_without_email() {
        let (_server, verifier) = verifier_with(
            json!({ "aud": CLIENT_ID, "iss": "accounts.google.com", "sub": "1093" }),
            200,
        )
        .await;

        assert!(matches!(
            verifier.verify("tok").await,
            Err(VerifyError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn rejects_unverified_email() {
        let (_server, verifier) = verifier_with(
            json!({
                "aud": CLIENT_ID,
                "iss": "accounts.google.com",
                "sub": "attacker-1",
                "email": "root@example.com",
                "email_verified": "false"
            }),
            200,
        )
        .await;

        assert!(matches!(
            verifier.verify("tok").await,
            Err(VerifyError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn rejects_payload_without_email_verified_flag() {
        let (_server, verifier) = verifier_with(
            json!({
                "aud": CLIENT_ID,
                "iss": "accounts.google.com",
                "sub": "1093",
                "email": "ann@example.com"
            }),
            200,
        )
        .await;

        assert!(matches!(
            verifier.verify("tok").await,
            Err(VerifyError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn invalid_token_answer_is_a_rejection() {
        let (_server, verifier) =
            verifier_with(json!({ "error_description": "Invalid Value" }), 400).await;

        assert!(matches!(
            verifier.verify("tok").await,
            Err(VerifyError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn missing_client_id_is_a_configuration_error() {
        let verifier = GoogleTokenInfo::new("http://127.0.0.1:9/tokeninfo", None);
        assert!(matches!(
            verifier.verify("tok").await,
            Err(VerifyError::NotConfigured)
        ));
    }
}
