use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo::AdminNotif;

#[derive(Debug, Deserialize)]
pub struct NotifRequest {
    #[serde(rename = "AdNotif")]
    pub ad_notif: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NotifResponse {
    pub message: String,
    pub data: AdminNotif,
}

/// Body of `GET /notif/latest`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestNotif {
    pub notif: String,
    pub title: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<AdminNotif> for LatestNotif {
    fn from(n: AdminNotif) -> Self {
        Self {
            notif: n.ad_notif,
            title: n.title,
            created_at: n.created_at,
        }
    }
}
