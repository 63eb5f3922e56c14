mod adapter;
mod permission;
mod store;
#[cfg(test)]
mod tests;

pub use adapter::{adapter_from_config, CaptureAdapter, CommandCapture, FileCapture, PhotoCapture};
pub use permission::{PermissionGate, StoragePermission};
pub use store::{TempStore, CAPTURE_FILE_NAME};
