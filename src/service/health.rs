use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::connection::format_timestamp;
use crate::db::{BackendKind, Db};

/// Body of `GET /health`. `dbMode` is the backend the request resolved to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub db_mode: BackendKind,
    /// Only reported for the embedded backend.
    pub sqlite_version: Option<String>,
}

impl HealthStatus {
    pub async fn check(db: &Db) -> Self {
        let db_mode = db.resolve_mode(None);
        let sqlite_version = match db_mode {
            BackendKind::Embedded => db.sqlite_version().await,
            BackendKind::Networked => None,
        };
        Self {
            status: "healthy".to_string(),
            timestamp: format_timestamp(Utc::now()),
            db_mode,
            sqlite_version,
        }
    }
}
