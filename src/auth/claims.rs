use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload carried by bearer tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: Uuid,     // user ID
    pub email: String, // user email at issuance
    pub name: String,  // display name at issuance, may be empty
    pub iat: i64,      // issued at (unix timestamp)
    pub exp: i64,      // expires at (unix timestamp)
}

/// Payload as found on the wire. Identity fields are optional so that a
/// correctly signed token with an incomplete payload can be told apart from
/// a forged or expired one.
#[derive(Debug, Deserialize)]
pub(crate) struct RawClaims {
    pub sub: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub iat: i64,
    pub exp: i64,
}

impl RawClaims {
    pub(crate) fn complete(self) -> Option<Claims> {
        let sub = self.sub.and_then(|s| Uuid::parse_str(&s).ok())?;
        let email = self.email.filter(|e| !e.is_empty())?;
        Some(Claims {
            sub,
            email,
            name: self.name?,
            iat: self.iat,
            exp: self.exp,
        })
    }
}
