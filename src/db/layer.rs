use std::future::Future;
use std::sync::Arc;
use tracing::info;

use super::backend::BackendKind;
use super::connection::ConnectionHandle;
use super::context::run_with_mode;
use super::manager::ConnectionManager;
use super::mapper::Mapper;
use super::resolver::ModeResolver;
use super::tables::TableSpec;
use crate::config::DbConfig;
use crate::error::WorldforgeError;

/// Entry point of the data layer: mode resolution plus the per-backend connection cache.
///
/// Cloning is cheap; every clone shares the same cache.
#[derive(Debug, Clone)]
pub struct Db {
    manager: Arc<ConnectionManager>,
    resolver: ModeResolver,
}

impl Db {
    pub fn new(config: &DbConfig) -> Self {
        Self {
            manager: Arc::new(ConnectionManager::new(config.clone())),
            resolver: ModeResolver::from_config(config),
        }
    }

    pub fn default_mode(&self) -> BackendKind {
        self.resolver.default_kind()
    }

    pub fn resolve_mode(&self, explicit: Option<BackendKind>) -> BackendKind {
        self.resolver.resolve(explicit)
    }

    pub async fn connection(&self, kind: BackendKind) -> Result<ConnectionHandle, WorldforgeError> {
        self.manager.get(kind).await
    }

    pub async fn run_with_mode<F>(&self, mode: Option<BackendKind>, body: F) -> F::Output
    where
        F: Future,
    {
        run_with_mode(mode, body).await
    }

    pub fn mapper(&self, spec: &'static TableSpec) -> Mapper {
        Mapper::new(self.clone(), spec)
    }

    /// Provisions the embedded backend up front when it is the static default, so a
    /// broken database file surfaces at startup instead of on the first request.
    pub async fn warm_up(&self) -> Result<(), WorldforgeError> {
        if self.default_mode() == BackendKind::Embedded {
            self.connection(BackendKind::Embedded).await?;
        }
        info!(default = %self.default_mode(), "data layer initialized");
        Ok(())
    }

    /// `sqlite_version()` of the embedded database, if it can be opened.
    pub async fn sqlite_version(&self) -> Option<String> {
        let conn = self.connection(BackendKind::Embedded).await.ok()?;
        let row = conn
            .fetch_optional("SELECT sqlite_version() AS version", &[])
            .await
            .ok()??;
        row.get("version")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
    }

    pub async fn close_all(&self) {
        self.manager.close().await;
    }
}
