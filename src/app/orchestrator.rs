use super::types::RunMode;
use crate::capture::{PermissionGate, PhotoCapture};
use crate::config::GoCaptureConfig;
use crate::events::{EventReceiver, EventSender};
use crate::navigator::Navigator;
use crate::remote::RemoteClient;
use crate::session::{Operation, Session};
use crate::ui::{KeyboardInputHandler, Notification, Renderer};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// The request currently owned by the session
pub(super) struct InFlightRequest {
    pub(super) id: Uuid,
    pub(super) operation: Operation,
    pub(super) token: CancellationToken,
    pub(super) started: Instant,
}

/// Owns the session and every collaborator. Runs as a single loop: spawned
/// work reports back through the event channel and only the loop mutates
/// session or view state.
pub struct GoCaptureApp {
    pub(super) config: GoCaptureConfig,
    pub(super) mode: RunMode,
    pub(super) session: Session,

    // Collaborators
    pub(super) capture: PhotoCapture,
    pub(super) client: RemoteClient,
    pub(super) navigator: Arc<dyn Navigator>,
    pub(super) permission: Arc<dyn PermissionGate>,
    pub(super) renderer: Box<dyn Renderer>,
    pub(super) keyboard: Option<KeyboardInputHandler>,

    // Loop state
    pub(super) events: EventSender,
    pub(super) receiver: Option<EventReceiver>,
    pub(super) notification: Option<Notification>,
    pub(super) request: Option<InFlightRequest>,
    pub(super) capture_in_progress: bool,
    pub(super) permission_notified: bool,
    pub(super) cancellation_token: CancellationToken,
}

impl GoCaptureApp {
    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Sender for feeding intents from outside the loop
    pub fn event_sender(&self) -> EventSender {
        self.events.clone()
    }

    pub(super) fn notification_ttl(&self) -> Duration {
        Duration::from_secs(self.config.ui.notification_seconds)
    }
}
