use crate::codec;
use crate::error::CaptureError;
use crate::frame::{CapturedImage, ImageSource};
use std::path::PathBuf;
use tracing::debug;

pub const CAPTURE_FILE_NAME: &str = "tmp.jpg";

/// Holds exactly one pending capture at `<app_dir>/tmp.jpg`
#[derive(Debug, Clone)]
pub struct TempStore {
    dir: PathBuf,
}

impl TempStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CAPTURE_FILE_NAME)
    }

    /// Create the directory and clear any previous capture
    pub async fn prepare(&self) -> Result<PathBuf, CaptureError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| CaptureError::Read { source })?;

        let path = self.path();
        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!("Removed previous capture {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => return Err(CaptureError::Read { source }),
        }

        Ok(path)
    }

    /// Decode the pending capture
    pub async fn load(&self) -> Result<CapturedImage, CaptureError> {
        let path = self.path();
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| CaptureError::Read { source })?;

        let image = codec::decode(&bytes, ImageSource::Camera { path: path.clone() })?;
        debug!(
            "Loaded {}x{} capture from {}",
            image.width(),
            image.height(),
            path.display()
        );
        Ok(image)
    }
}
