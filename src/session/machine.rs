use super::state::{Action, Operation, SessionState};
use crate::error::SessionError;
use crate::frame::CapturedImage;
use tracing::{debug, info};
use uuid::Uuid;

/// Everything a request task needs, handed out when a request begins
#[derive(Debug, Clone)]
pub struct RequestTicket {
    pub id: Uuid,
    pub operation: Operation,
    pub image: CapturedImage,
}

/// Single-photo session.
///
/// Owns the current photograph and the workflow state. All mutation goes
/// through the transition methods, which reject anything the current state
/// does not allow. Completions carry the id of the request they answer and
/// are refused unless that request is the one in flight.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    image: Option<CapturedImage>,
    in_flight: Option<Uuid>,
    capture_enabled: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            image: None,
            in_flight: None,
            capture_enabled: true,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn image(&self) -> Option<&CapturedImage> {
        self.image.as_ref()
    }

    pub fn in_flight(&self) -> Option<Uuid> {
        self.in_flight
    }

    pub fn capture_enabled(&self) -> bool {
        self.capture_enabled
    }

    /// Disable or re-enable the camera action (storage permission)
    pub fn set_capture_enabled(&mut self, enabled: bool) {
        if self.capture_enabled != enabled {
            info!("Capture action {}", if enabled { "enabled" } else { "disabled" });
        }
        self.capture_enabled = enabled;
    }

    /// Actions the presenter may offer right now
    pub fn available_actions(&self) -> Vec<Action> {
        self.state
            .available_actions()
            .iter()
            .copied()
            .filter(|action| *action != Action::TakePhoto || self.capture_enabled)
            .collect()
    }

    pub fn is_available(&self, action: Action) -> bool {
        self.available_actions().contains(&action)
    }

    /// Idle → Captured
    pub fn capture_succeeded(&mut self, image: CapturedImage) -> Result<(), SessionError> {
        self.expect(SessionState::Idle, "accept a capture")?;
        info!(
            "Captured {}x{} photo from {}",
            image.width(),
            image.height(),
            image.source().label()
        );
        self.image = Some(image);
        self.transition(SessionState::Captured);
        Ok(())
    }

    /// Idle → Idle. Cancelled or failed captures change nothing.
    pub fn capture_failed(&mut self) {
        debug!("Capture did not produce a photo, staying {}", self.state);
    }

    /// Captured → RequestInFlight(operation)
    pub fn begin_request(&mut self, operation: Operation) -> Result<RequestTicket, SessionError> {
        self.expect(SessionState::Captured, operation.name())?;
        let image = self.image.clone().ok_or(SessionError::NoImage)?;

        let id = Uuid::new_v4();
        self.in_flight = Some(id);
        self.transition(SessionState::RequestInFlight(operation));

        Ok(RequestTicket {
            id,
            operation,
            image,
        })
    }

    /// RequestInFlight(Score) → Captured, replacing the photo when a result
    /// image was decoded.
    pub fn score_succeeded(
        &mut self,
        id: Uuid,
        result: Option<CapturedImage>,
    ) -> Result<(), SessionError> {
        self.finish(id, Operation::Score)?;
        match result {
            Some(image) => {
                info!(
                    "Score result {}x{} replaces the current photo",
                    image.width(),
                    image.height()
                );
                self.image = Some(image);
            }
            None => debug!("Score finished without a displayable image, keeping current photo"),
        }
        self.transition(SessionState::Captured);
        Ok(())
    }

    /// RequestInFlight(Upload) → Completed
    pub fn upload_succeeded(&mut self, id: Uuid) -> Result<(), SessionError> {
        self.finish(id, Operation::Upload)?;
        self.transition(SessionState::Completed);
        Ok(())
    }

    /// Completed → Idle once external navigation has happened
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.expect(SessionState::Completed, "reset")?;
        self.image = None;
        self.transition(SessionState::Idle);
        Ok(())
    }

    /// RequestInFlight(*) → Captured. Used for failures and cancellations;
    /// the photo is left untouched so the user can retry.
    pub fn request_failed(&mut self, id: Uuid) -> Result<(), SessionError> {
        let operation = match self.state {
            SessionState::RequestInFlight(operation) => operation,
            state => {
                return Err(SessionError::InvalidTransition {
                    action: "fail a request",
                    state: state.name(),
                })
            }
        };
        self.finish(id, operation)?;
        self.transition(SessionState::Captured);
        Ok(())
    }

    fn finish(&mut self, id: Uuid, operation: Operation) -> Result<(), SessionError> {
        self.expect(SessionState::RequestInFlight(operation), "complete a request")?;
        if self.in_flight != Some(id) {
            return Err(SessionError::StaleCompletion);
        }
        self.in_flight = None;
        Ok(())
    }

    fn expect(&self, expected: SessionState, action: &'static str) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                action,
                state: self.state.name(),
            })
        }
    }

    fn transition(&mut self, next: SessionState) {
        info!("Session {} -> {}", self.state, next);
        self.state = next;
    }
}
