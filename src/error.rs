use crate::session::Operation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GoCaptureError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Permission error: {0}")]
    Permission(#[from] PermissionError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("System error: {message}")]
    System { message: String },
}

impl GoCaptureError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }
}

/// Camera or photo source failures. These revert the session to `Idle` silently.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("capture source unavailable: {details}")]
    Unavailable { details: String },

    #[error("capture cancelled")]
    Cancelled,

    #[error("capture command `{command}` failed: {details}")]
    CommandFailed { command: String, details: String },

    #[error("captured photo could not be read: {source}")]
    Read {
        #[source]
        source: std::io::Error,
    },

    #[error("captured photo is not a valid image: {0}")]
    Decode(#[from] CodecError),
}

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("image has no pixel data")]
    Empty,

    #[error("bytes are not a valid image: {details}")]
    InvalidImage { details: String },

    #[error("JPEG encoding failed: {details}")]
    Encode { details: String },
}

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("{operation} request failed: {details}")]
    Network {
        operation: Operation,
        details: String,
    },

    #[error("{operation} request timed out after {elapsed_ms} ms")]
    Timeout { operation: Operation, elapsed_ms: u64 },

    #[error("{operation} response was malformed: {details}")]
    Protocol {
        operation: Operation,
        details: String,
    },

    #[error("a request is already in flight, {operation} rejected")]
    Busy { operation: Operation },

    #[error("{operation} request cancelled")]
    Cancelled { operation: Operation },
}

impl RemoteError {
    pub fn operation(&self) -> Operation {
        match self {
            RemoteError::Network { operation, .. }
            | RemoteError::Timeout { operation, .. }
            | RemoteError::Protocol { operation, .. }
            | RemoteError::Busy { operation }
            | RemoteError::Cancelled { operation } => *operation,
        }
    }

    /// Protocol failures are reported to the user exactly like network failures.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            RemoteError::Network { .. } | RemoteError::Timeout { .. } | RemoteError::Protocol { .. }
        )
    }

    /// The single human-readable message shown in a notification.
    pub fn user_message(&self) -> String {
        match self {
            RemoteError::Network { details, .. } => format!("Network error: {}", details),
            RemoteError::Timeout { elapsed_ms, .. } => {
                format!("Network error: server did not answer within {} s", elapsed_ms / 1000)
            }
            RemoteError::Protocol { details, .. } => {
                format!("Network error: unexpected server response ({})", details)
            }
            RemoteError::Busy { .. } => "Please wait for the current request".to_string(),
            RemoteError::Cancelled { .. } => "Request cancelled".to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum PermissionError {
    #[error("storage access denied for {path}: {details}")]
    StorageDenied { path: String, details: String },
}

#[derive(Error, Debug)]
pub enum NavigationError {
    #[error("no browser could open {url}: {details}")]
    NoHandler { url: String, details: String },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("no captured image to submit")]
    NoImage,

    #[error("completion does not belong to the request in flight")]
    StaleCompletion,
}

pub type Result<T> = std::result::Result<T, GoCaptureError>;
