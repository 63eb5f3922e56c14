use super::orchestrator::GoCaptureApp;
use super::types::RunMode;
use crate::error::Result;
use crate::events::{Intent, SessionEvent};
use std::sync::Arc;
use tracing::info;

impl GoCaptureApp {
    /// Kick off startup work without blocking the loop
    pub(super) async fn start(&mut self) -> Result<()> {
        info!("Starting GoCapture session ({:?})", self.mode);

        // Storage permission is requested once; the answer arrives as an event.
        // Capture stays offered until a denial comes back.
        let permission = Arc::clone(&self.permission);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = permission.request().await;
            events.send(SessionEvent::PermissionResolved { result }).await;
        });

        if let Some(keyboard) = &self.keyboard {
            keyboard.start()?;
        }

        if let RunMode::Once(_) = self.mode {
            self.events
                .send(SessionEvent::Intent(Intent::TakePhoto))
                .await;
        }

        Ok(())
    }
}
