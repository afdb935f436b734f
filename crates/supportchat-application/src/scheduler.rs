//! Fire-once delayed tasks that die with the widget.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Spawns delayed callbacks tied to one cancellation token.
///
/// Cancelling the scheduler drops every callback that has not fired yet;
/// a callback that already started is cancelled at its next await point.
#[derive(Clone, Default)]
pub struct Scheduler {
    token: CancellationToken,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `task` after `delay` unless the scheduler is cancelled first.
    pub fn schedule<F>(&self, delay: Duration, task: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self.token.child_token();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = async {
                    tokio::time::sleep(delay).await;
                    task.await;
                } => {}
            }
        })
    }

    /// A token cancelled together with this scheduler.
    pub fn token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Completes once the scheduler is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    pub fn cancel_all(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
