//! Per-operation backend override.
//!
//! An [`OperationContext`] is attached to one logical operation (an inbound request or an
//! explicit [`run_with_mode`] block) through a tokio task-local. Everything awaited inside
//! that scope sees it; code running outside any scope sees nothing and falls through to the
//! configured default.

use std::future::Future;
use tokio::task::JoinHandle;

use super::backend::BackendKind;

tokio::task_local! {
    static OPERATION: OperationContext;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OperationContext {
    target: Option<BackendKind>,
}

impl OperationContext {
    pub fn new(target: Option<BackendKind>) -> Self {
        Self { target }
    }

    pub fn target(&self) -> Option<BackendKind> {
        self.target
    }

    /// Context of the operation currently executing, if any.
    pub fn current() -> Option<Self> {
        OPERATION.try_with(|ctx| *ctx).ok()
    }
}

/// Backend override of the operation currently executing.
pub fn current_mode() -> Option<BackendKind> {
    OPERATION.try_with(OperationContext::target).ok().flatten()
}

/// Runs `body` with `mode` as the active override.
///
/// `None` runs `body` unchanged, so an enclosing scope (if any) stays in effect.
pub async fn run_with_mode<F>(mode: Option<BackendKind>, body: F) -> F::Output
where
    F: Future,
{
    match mode {
        Some(kind) => {
            OPERATION
                .scope(OperationContext::new(Some(kind)), body)
                .await
        }
        None => body.await,
    }
}

/// `tokio::spawn` that carries the caller's override into the new task.
///
/// Task-locals do not cross `tokio::spawn`; child work started from a request must go
/// through here to keep resolving to the same backend.
pub fn spawn_in_context<F>(body: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let mode = current_mode();
    tokio::spawn(run_with_mode(mode, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_context_outside_any_scope() {
        assert_eq!(current_mode(), None);
        assert_eq!(OperationContext::current(), None);
    }

    #[tokio::test]
    async fn scope_is_visible_to_nested_awaits_and_ends_with_body() {
        let seen = run_with_mode(Some(BackendKind::Networked), async {
            async { current_mode() }.await
        })
        .await;
        assert_eq!(seen, Some(BackendKind::Networked));
        assert_eq!(current_mode(), None);
    }

    #[tokio::test]
    async fn none_keeps_enclosing_scope() {
        let seen = run_with_mode(Some(BackendKind::Networked), async {
            run_with_mode(None, async { current_mode() }).await
        })
        .await;
        assert_eq!(seen, Some(BackendKind::Networked));
    }

    #[tokio::test]
    async fn inner_scope_overrides_outer() {
        let (inner, outer) = run_with_mode(Some(BackendKind::Networked), async {
            let inner = run_with_mode(Some(BackendKind::Embedded), async { current_mode() }).await;
            (inner, current_mode())
        })
        .await;
        assert_eq!(inner, Some(BackendKind::Embedded));
        assert_eq!(outer, Some(BackendKind::Networked));
    }

    #[tokio::test]
    async fn concurrent_scopes_do_not_leak() {
        let a = run_with_mode(Some(BackendKind::Networked), async {
            tokio::task::yield_now().await;
            current_mode()
        });
        let b = async {
            tokio::task::yield_now().await;
            current_mode()
        };
        let (a, b) = tokio::join!(a, b);
        assert_eq!(a, Some(BackendKind::Networked));
        assert_eq!(b, None);
    }

    #[tokio::test]
    async fn spawned_child_inherits_only_through_helper() {
        let (inherited, plain) = run_with_mode(Some(BackendKind::Networked), async {
            let inherited = spawn_in_context(async { current_mode() });
            let plain = tokio::spawn(async { current_mode() });
            (
                inherited.await.expect("join inherited"),
                plain.await.expect("join plain"),
            )
        })
        .await;
        assert_eq!(inherited, Some(BackendKind::Networked));
        assert_eq!(plain, None);
    }
}
