pub mod app;
pub mod capture;
pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod frame;
pub mod navigator;
pub mod remote;
pub mod session;
pub mod ui;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use app::{GoCaptureApp, GoCaptureAppBuilder, RunMode, ShutdownReason};
pub use capture::{CaptureAdapter, CommandCapture, FileCapture, PermissionGate, PhotoCapture};
pub use codec::EncodedPayload;
pub use config::GoCaptureConfig;
pub use error::{
    CaptureError, CodecError, GoCaptureError, NavigationError, PermissionError, RemoteError,
    Result, SessionError,
};
pub use events::{Intent, SessionEvent};
pub use frame::{CapturedImage, ImageSource};
pub use navigator::{BrowserNavigator, Navigator};
pub use remote::{RemoteClient, RemoteResponse, RetryPolicy, ScoreOutcome};
pub use session::{Action, Operation, Session, SessionState};
