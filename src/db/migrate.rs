use sqlx::Acquire;
use sqlx::migrate::{Migrate, Migrator};
use std::ops::Deref;
use tracing::{debug, warn};

use super::backend::BackendKind;
use crate::config::MigrationFailurePolicy;
use crate::error::WorldforgeError;

/// Schema for the embedded SQLite file.
pub static LOCAL_MIGRATOR: Migrator = sqlx::migrate!("./migrations/local");

/// Schema for the networked PostgreSQL database.
pub static REMOTE_MIGRATOR: Migrator = sqlx::migrate!("./migrations/remote");

/// Runs pending migrations. Under [`MigrationFailurePolicy::Warn`] a failure is logged and
/// the caller keeps going with whatever schema is already there.
pub(crate) async fn apply<'a, A>(
    migrator: &Migrator,
    conn: A,
    kind: BackendKind,
    policy: MigrationFailurePolicy,
) -> Result<(), WorldforgeError>
where
    A: Acquire<'a>,
    <A::Connection as Deref>::Target: Migrate,
{
    match migrator.run(conn).await {
        Ok(()) => {
            debug!(backend = %kind, "migrations up to date");
            Ok(())
        }
        Err(error) => match policy {
            MigrationFailurePolicy::Warn => {
                warn!(
                    backend = %kind,
                    %error,
                    "migration failed; continuing with existing schema"
                );
                Ok(())
            }
            MigrationFailurePolicy::Abort => Err(error.into()),
        },
    }
}
