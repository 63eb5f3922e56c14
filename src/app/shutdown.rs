use super::orchestrator::GoCaptureApp;
use crate::error::Result;
use tracing::{info, warn};

impl GoCaptureApp {
    /// Cancel outstanding work and give the terminal back
    pub(super) async fn shutdown(&mut self) -> Result<()> {
        info!("Shutting down GoCapture session");

        if let Some(request) = self.request.take() {
            info!("Cancelling in-flight {} request {}", request.operation, request.id);
            request.token.cancel();
        }
        self.cancellation_token.cancel();

        if let Some(keyboard) = &self.keyboard {
            if let Err(e) = keyboard.stop().await {
                warn!("Failed to stop keyboard handler: {}", e);
            }
        }

        self.renderer.restore()?;

        info!("GoCapture session shutdown complete");
        Ok(())
    }
}
