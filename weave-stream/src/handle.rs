//! [`StreamHandle`] — the `start()` return value (§4.5).

use tokio::task::JoinHandle;
use weave_turn::AgentResult;

/// A background-running stream, returned by [`crate::StreamFacade::start`].
/// Completes once the loop reaches a terminal result or suspends.
pub struct StreamHandle {
    task: JoinHandle<AgentResult>,
}

impl StreamHandle {
    pub(crate) fn new(task: JoinHandle<AgentResult>) -> Self {
        Self { task }
    }

    /// Wait for the run to finish, returning its terminal `AgentResult`.
    ///
    /// # Panics
    /// Panics if the background task itself panicked (not if the run
    /// produced an `AgentResult::Error` — that's a normal return value).
    pub async fn join(self) -> AgentResult {
        self.task
            .await
            .expect("stream facade task panicked")
    }

    /// Abort the background run before it completes.
    pub fn abort(&self) {
        self.task.abort();
    }
}
