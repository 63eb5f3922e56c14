use serde::{Deserialize, Serialize};
use std::fmt;

/// Server operations a captured photo can be submitted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Score,
    Upload,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Score => "score",
            Operation::Upload => "upload",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where the single on-screen workflow currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Captured,
    RequestInFlight(Operation),
    Completed,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Captured => "captured",
            SessionState::RequestInFlight(Operation::Score) => "scoring",
            SessionState::RequestInFlight(Operation::Upload) => "uploading",
            SessionState::Completed => "completed",
        }
    }

    /// User actions offered in this state. Nothing but waiting is offered
    /// while a request is in flight.
    pub fn available_actions(&self) -> &'static [Action] {
        match self {
            SessionState::Idle => &[Action::TakePhoto],
            SessionState::Captured => &[Action::Score, Action::Upload],
            SessionState::RequestInFlight(_) | SessionState::Completed => &[],
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, SessionState::RequestInFlight(_))
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A user intent offered by the presenter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    TakePhoto,
    Score,
    Upload,
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Action::TakePhoto => "Take photo",
            Action::Score => "Score",
            Action::Upload => "Upload",
        }
    }

    pub fn operation(&self) -> Option<Operation> {
        match self {
            Action::TakePhoto => None,
            Action::Score => Some(Operation::Score),
            Action::Upload => Some(Operation::Upload),
        }
    }
}
