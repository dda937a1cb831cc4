use serde::{Deserialize, Serialize};

use super::repo::InfoEntry;

#[derive(Debug, Deserialize)]
pub struct InfoRequest {
    pub info: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub message: String,
    pub data: InfoEntry,
}
