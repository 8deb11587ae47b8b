//! Deferred callbacks on the tokio runtime

use pulsewarden_host_api::{DeferredAction, DeferredScheduler};
use std::time::Duration;
use tokio::runtime::Handle;

/// Runs each deferred action on its own tokio task after the delay
///
/// Holds a runtime handle so actions can be scheduled from threads that
/// are not inside the runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime this is called from. Panics outside a runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl DeferredScheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, action: DeferredAction) {
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            action();
        });
    }
}
