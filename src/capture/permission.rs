use crate::error::PermissionError;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{info, warn};

const PROBE_FILE_NAME: &str = ".write-probe";

/// Runtime permission facility consulted once at startup
#[async_trait]
pub trait PermissionGate: Send + Sync {
    async fn request(&self) -> Result<(), PermissionError>;
}

/// Storage access for the private capture directory
pub struct StoragePermission {
    dir: PathBuf,
}

impl StoragePermission {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    fn denied(&self, e: std::io::Error) -> PermissionError {
        PermissionError::StorageDenied {
            path: self.dir.display().to_string(),
            details: e.to_string(),
        }
    }
}

#[async_trait]
impl PermissionGate for StoragePermission {
    async fn request(&self) -> Result<(), PermissionError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| self.denied(e))?;

        let probe = self.dir.join(PROBE_FILE_NAME);
        if let Err(e) = tokio::fs::write(&probe, b"").await {
            warn!("Storage at {} is not writable: {}", self.dir.display(), e);
            return Err(self.denied(e));
        }
        let _ = tokio::fs::remove_file(&probe).await;

        info!("Storage permission granted for {}", self.dir.display());
        Ok(())
    }
}
