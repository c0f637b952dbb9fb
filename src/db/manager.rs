use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::backend::BackendKind;
use super::connection::ConnectionHandle;
use super::migrate::{self, LOCAL_MIGRATOR, REMOTE_MIGRATOR};
use crate::config::{DbConfig, MigrationFailurePolicy};
use crate::error::{ConfigError, WorldforgeError};

type Slot = Mutex<Option<ConnectionHandle>>;

/// Lazily provisions and caches one connection handle per backend.
///
/// Provisioning holds the backend's slot lock, so concurrent first calls for the same
/// backend wait for a single provisioning and share its handle. The two backends never
/// block each other.
#[derive(Debug)]
pub struct ConnectionManager {
    config: DbConfig,
    embedded: Slot,
    networked: Slot,
}

impl ConnectionManager {
    pub fn new(config: DbConfig) -> Self {
        Self {
            config,
            embedded: Mutex::new(None),
            networked: Mutex::new(None),
        }
    }

    fn slot(&self, kind: BackendKind) -> &Slot {
        match kind {
            BackendKind::Embedded => &self.embedded,
            BackendKind::Networked => &self.networked,
        }
    }

    /// Cached handle for `kind`, provisioning it on first use.
    ///
    /// A failed provisioning caches nothing; the next call tries again.
    pub async fn get(&self, kind: BackendKind) -> Result<ConnectionHandle, WorldforgeError> {
        let mut slot = self.slot(kind).lock().await;
        if let Some(handle) = slot.as_ref() {
            return Ok(handle.clone());
        }

        let handle = match kind {
            BackendKind::Embedded => self.open_embedded().await?,
            BackendKind::Networked => self.open_networked().await?,
        };
        *slot = Some(handle.clone());
        Ok(handle)
    }

    /// Handle for `kind` if one is cached; never provisions.
    pub async fn cached(&self, kind: BackendKind) -> Option<ConnectionHandle> {
        self.slot(kind).lock().await.clone()
    }

    /// Releases both cached handles. Safe to call repeatedly; a later `get` provisions anew.
    pub async fn close(&self) {
        for kind in [BackendKind::Embedded, BackendKind::Networked] {
            let taken = self.slot(kind).lock().await.take();
            if let Some(handle) = taken {
                handle.close().await;
                info!(backend = %kind, "database connection closed");
            }
        }
    }

    async fn open_embedded(&self) -> Result<ConnectionHandle, WorldforgeError> {
        let local = &self.config.local;
        if let Some(dir) = local.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }

        let connect_opts = SqliteConnectOptions::new()
            .filename(&local.path)
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;

        if let Err(error) = migrate::apply(
            &LOCAL_MIGRATOR,
            &pool,
            BackendKind::Embedded,
            local.on_migration_failure,
        )
        .await
        {
            pool.close().await;
            return Err(error);
        }

        info!(path = %local.path.display(), "embedded database ready");
        Ok(ConnectionHandle::embedded(pool))
    }

    async fn open_networked(&self) -> Result<ConnectionHandle, WorldforgeError> {
        let remote = &self.config.remote;
        let url = remote.connection_url.trim();
        if url.is_empty() {
            return Err(ConfigError::MissingSetting {
                setting: "db.remote.connection_url",
                backend: BackendKind::Networked.as_str(),
            }
            .into());
        }

        // Lazy: no connection is opened until the first query.
        let pool = PgPoolOptions::new()
            .max_connections(remote.max_connections.max(1))
            .acquire_timeout(Duration::from_secs(10))
            .connect_lazy(url)?;

        if remote.run_migrations {
            if let Err(error) = migrate::apply(
                &REMOTE_MIGRATOR,
                &pool,
                BackendKind::Networked,
                MigrationFailurePolicy::Abort,
            )
            .await
            {
                pool.close().await;
                return Err(error);
            }
        } else {
            debug!("db.remote.run_migrations is off; remote schema is managed externally");
        }

        info!(
            max_connections = remote.max_connections,
            "networked database pool configured"
        );
        Ok(ConnectionHandle::networked(pool))
    }
}
