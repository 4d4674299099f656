//! Best-effort termination of a desktop session after a failed exchange.

use std::time::Duration;

use crate::desktop::DesktopSession;
use crate::util::with_timeout;

#[derive(Debug, Clone)]
pub struct CleanupHandler {
    timeout: Duration,
}

impl CleanupHandler {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Kill the session. Failures and timeouts are logged, never returned.
    pub async fn terminate(&self, session: &dyn DesktopSession) {
        let sandbox_id = session.sandbox_id().to_string();
        match with_timeout(self.timeout, session.kill()).await {
            Ok(()) => tracing::debug!(%sandbox_id, "desktop session terminated"),
            Err(e) => tracing::error!(%sandbox_id, error = %e, "desktop cleanup failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desktop::{ActionOutput, DesktopAction};
    use crate::error::PilotError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StuckDesktop {
        kills: AtomicUsize,
    }

    #[async_trait]
    impl DesktopSession for StuckDesktop {
        fn sandbox_id(&self) -> &str {
            "sbx-stuck"
        }

        async fn perform(&self, _action: DesktopAction) -> Result<ActionOutput, PilotError> {
            Ok(ActionOutput::Done)
        }

        async fn kill(&self) -> Result<(), PilotError> {
            self.kills.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hung_kill_is_abandoned_after_timeout() {
        let desktop = StuckDesktop {
            kills: AtomicUsize::new(0),
        };
        CleanupHandler::new(Duration::from_secs(10))
            .terminate(&desktop)
            .await;
        assert_eq!(desktop.kills.load(Ordering::SeqCst), 1);
    }
}
