//! Handle to a spawned polling loop.

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use super::ViewportController;
use crate::coord::Viewport;

/// Controls a controller started with [`ViewportController::start`].
pub struct ControllerHandle<C, H> {
    viewports: mpsc::UnboundedSender<Viewport>,
    shutdown: CancellationToken,
    task: JoinHandle<ViewportController<C, H>>,
}

impl<C, H> ControllerHandle<C, H> {
    pub(crate) fn new(
        viewports: mpsc::UnboundedSender<Viewport>,
        shutdown: CancellationToken,
        task: JoinHandle<ViewportController<C, H>>,
    ) -> Self {
        Self {
            viewports,
            shutdown,
            task,
        }
    }

    /// Send a viewport change to the loop.
    ///
    /// Returns `false` if the loop has already exited.
    pub fn update_viewport(&self, viewport: Viewport) -> bool {
        self.viewports.send(viewport).is_ok()
    }

    /// Stop polling. Pages already being fetched are still merged.
    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_cancelled() || self.task.is_finished()
    }

    /// Token cancelled by [`stop`](Self::stop), e.g. to wire up Ctrl-C.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Wait for the loop to exit and take the controller back.
    pub async fn join(self) -> Result<ViewportController<C, H>, JoinError> {
        self.task.await
    }

    /// Stop accepting viewport changes and wait until nothing is left to load.
    pub async fn finish(self) -> Result<ViewportController<C, H>, JoinError> {
        drop(self.viewports);
        self.task.await
    }
}
