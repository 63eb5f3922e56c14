mod builder;
mod handlers;
mod orchestrator;
mod runtime;
mod shutdown;
mod startup;
mod types;


pub use builder::GoCaptureAppBuilder;
pub use orchestrator::GoCaptureApp;
pub use types::{RunMode, ShutdownReason};
