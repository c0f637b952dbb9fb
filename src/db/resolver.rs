use tracing::warn;

use super::backend::BackendKind;
use super::context::current_mode;
use crate::config::DbConfig;

/// Picks the backend for the current operation.
///
/// Precedence: explicit argument, then the active [`OperationContext`](super::OperationContext),
/// then the static default. Pure; never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeResolver {
    default: BackendKind,
}

impl ModeResolver {
    pub fn new(default: BackendKind) -> Self {
        Self { default }
    }

    /// Reads `db.mode`; anything but `local`/`remote` falls back to [`BackendKind::FALLBACK`].
    pub fn from_config(config: &DbConfig) -> Self {
        let default = config
            .mode
            .trim()
            .parse::<BackendKind>()
            .unwrap_or_else(|error| {
                warn!(
                    %error,
                    fallback = %BackendKind::FALLBACK,
                    "unrecognized db.mode; using fallback backend"
                );
                BackendKind::FALLBACK
            });
        Self::new(default)
    }

    pub fn default_kind(&self) -> BackendKind {
        self.default
    }

    pub fn resolve(&self, explicit: Option<BackendKind>) -> BackendKind {
        explicit.or_else(current_mode).unwrap_or(self.default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::context::run_with_mode;

    fn config_with_mode(mode: &str) -> DbConfig {
        DbConfig {
            mode: mode.to_string(),
            ..DbConfig::default()
        }
    }

    #[tokio::test]
    async fn explicit_always_wins() {
        let resolver = ModeResolver::new(BackendKind::Embedded);
        let kind = run_with_mode(Some(BackendKind::Embedded), async {
            resolver.resolve(Some(BackendKind::Networked))
        })
        .await;
        assert_eq!(kind, BackendKind::Networked);
        assert_eq!(
            resolver.resolve(Some(BackendKind::Embedded)),
            BackendKind::Embedded
        );
    }

    #[tokio::test]
    async fn context_beats_default() {
        let resolver = ModeResolver::new(BackendKind::Embedded);
        let kind = run_with_mode(Some(BackendKind::Networked), async { resolver.resolve(None) })
            .await;
        assert_eq!(kind, BackendKind::Networked);
        assert_eq!(resolver.resolve(None), BackendKind::Embedded);
    }

    #[test]
    fn config_default_is_used_without_context() {
        let resolver = ModeResolver::from_config(&config_with_mode("remote"));
        assert_eq!(resolver.resolve(None), BackendKind::Networked);
    }

    #[test]
    fn invalid_config_falls_back_to_embedded() {
        for raw in ["", "postgres", "REMOTE"] {
            let resolver = ModeResolver::from_config(&config_with_mode(raw));
            assert_eq!(resolver.default_kind(), BackendKind::Embedded, "mode {raw:?}");
        }
    }
}
