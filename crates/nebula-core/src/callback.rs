// Run-completion hooks.

use async_trait::async_trait;

use crate::error::SyncError;

/// Notified once per run, after the run concluded.
///
/// Implementations swallow their own failures: a callback can never change
/// the outcome of the run it is told about. Relative order between
/// callbacks is unspecified.
#[async_trait]
pub trait SyncCallback: Send + Sync {
    async fn on_success(&self);

    async fn on_failure(&self, error: &SyncError);
}
