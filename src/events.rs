use crate::error::{CaptureError, GoCaptureError, NavigationError, PermissionError};
use crate::frame::CapturedImage;
use crate::remote::{RemoteResponse, ScoreOutcome};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Something the user asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    TakePhoto,
    Score,
    Upload,
    Cancel,
    Quit,
}

/// Everything delivered to the session loop: user intents and the
/// completions of work it started
#[derive(Debug)]
pub enum SessionEvent {
    Intent(Intent),
    CaptureFinished {
        result: Result<CapturedImage, CaptureError>,
    },
    ScoreFinished {
        id: Uuid,
        result: Result<ScoreOutcome, GoCaptureError>,
    },
    UploadFinished {
        id: Uuid,
        result: Result<RemoteResponse, GoCaptureError>,
    },
    NavigationFinished {
        result: Result<(), NavigationError>,
    },
    PermissionResolved {
        result: Result<(), PermissionError>,
    },
    ShutdownRequested {
        reason: String,
    },
}

impl SessionEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            SessionEvent::Intent(intent) => format!("User intent: {:?}", intent),
            SessionEvent::CaptureFinished { result: Ok(image) } => {
                format!("Capture finished: {}x{}", image.width(), image.height())
            }
            SessionEvent::CaptureFinished { result: Err(e) } => format!("Capture failed: {}", e),
            SessionEvent::ScoreFinished { id, result } => match result {
                Ok(outcome) => format!("Score {} finished: {}", id, outcome.response.status()),
                Err(e) => format!("Score {} failed: {}", id, e),
            },
            SessionEvent::UploadFinished { id, result } => match result {
                Ok(response) => format!("Upload {} finished: {}", id, response.status()),
                Err(e) => format!("Upload {} failed: {}", id, e),
            },
            SessionEvent::NavigationFinished { result: Ok(()) } => "Navigation finished".to_string(),
            SessionEvent::NavigationFinished { result: Err(e) } => {
                format!("Navigation failed: {}", e)
            }
            SessionEvent::PermissionResolved { result: Ok(()) } => "Permission granted".to_string(),
            SessionEvent::PermissionResolved { result: Err(e) } => {
                format!("Permission denied: {}", e)
            }
            SessionEvent::ShutdownRequested { reason } => format!("Shutdown requested: {}", reason),
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::Intent(_) => "intent",
            SessionEvent::CaptureFinished { .. } => "capture_finished",
            SessionEvent::ScoreFinished { .. } => "score_finished",
            SessionEvent::UploadFinished { .. } => "upload_finished",
            SessionEvent::NavigationFinished { .. } => "navigation_finished",
            SessionEvent::PermissionResolved { .. } => "permission_resolved",
            SessionEvent::ShutdownRequested { .. } => "shutdown_requested",
        }
    }
}

/// Sending half of the session event channel. Cloned into every task that
/// reports back to the session loop.
#[derive(Clone)]
pub struct EventSender {
    sender: mpsc::Sender<SessionEvent>,
}

/// Receiving half, owned by the session loop
pub struct EventReceiver {
    receiver: mpsc::Receiver<SessionEvent>,
}

/// Create a session event channel with the specified capacity
pub fn channel(capacity: usize) -> (EventSender, EventReceiver) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (EventSender { sender }, EventReceiver { receiver })
}

impl EventSender {
    /// Deliver an event; returns false once the loop has gone away
    pub async fn send(&self, event: SessionEvent) -> bool {
        debug!("Publishing event: {}", event.description());
        match self.sender.send(event).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Session loop gone, dropping {}", e.0.event_type());
                false
            }
        }
    }

    /// Deliver from a blocking thread (keyboard reader)
    pub fn blocking_send(&self, event: SessionEvent) -> bool {
        debug!("Publishing event: {}", event.description());
        self.sender.blocking_send(event).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl EventReceiver {
    /// Next event, or `None` when every sender is gone
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        self.receiver.recv().await
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Option<SessionEvent> {
        self.receiver.try_recv().ok()
    }
}
