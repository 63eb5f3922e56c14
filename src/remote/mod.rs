mod client;
mod retry;
mod types;

pub use client::RemoteClient;
pub use retry::{AttemptError, RetryPolicy};
pub use types::{ImageRequestBody, RemoteRequest, RemoteResponse, ScoreOutcome};
