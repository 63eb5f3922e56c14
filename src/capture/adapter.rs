use super::store::TempStore;
use crate::config::CaptureConfig;
use crate::error::CaptureError;
use crate::frame::CapturedImage;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Platform camera facility: writes a JPEG photo to `target`
#[async_trait]
pub trait CaptureAdapter: Send + Sync {
    async fn capture(&self, target: &Path) -> Result<(), CaptureError>;

    fn name(&self) -> &str;
}

/// Runs an external camera program, e.g. `libcamera-still -o {output}`
pub struct CommandCapture {
    command: String,
}

impl CommandCapture {
    pub fn new<S: Into<String>>(command: S) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Program and arguments with `{output}` substituted.
    ///
    /// The command is split on whitespace before substitution, so the
    /// output path may contain spaces but other arguments cannot. Quoting
    /// is not interpreted.
    pub fn argv(&self, target: &Path) -> Vec<String> {
        let output = target.to_string_lossy();
        self.command
            .split_whitespace()
            .map(|part| part.replace("{output}", &output))
            .collect()
    }
}

#[async_trait]
impl CaptureAdapter for CommandCapture {
    async fn capture(&self, target: &Path) -> Result<(), CaptureError> {
        let argv = self.argv(target);
        let (program, args) = argv.split_first().ok_or_else(|| CaptureError::Unavailable {
            details: "capture command is empty".to_string(),
        })?;

        debug!("Running capture command: {:?}", argv);

        let status = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| CaptureError::Unavailable {
                details: format!("cannot run `{}`: {}", program, e),
            })?;

        match status.code() {
            Some(0) => {}
            Some(code) => {
                return Err(CaptureError::CommandFailed {
                    command: self.command.clone(),
                    details: format!("exited with status {}", code),
                })
            }
            None => {
                warn!("Capture command terminated by signal");
                return Err(CaptureError::Cancelled);
            }
        }

        if !tokio::fs::try_exists(target).await.unwrap_or(false) {
            // The camera exited cleanly without taking a picture
            return Err(CaptureError::Cancelled);
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "command"
    }
}

/// Copies an existing photo into place
pub struct FileCapture {
    source: Option<PathBuf>,
}

impl FileCapture {
    pub fn new(source: Option<PathBuf>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl CaptureAdapter for FileCapture {
    async fn capture(&self, target: &Path) -> Result<(), CaptureError> {
        let source = self.source.as_ref().ok_or_else(|| CaptureError::Unavailable {
            details: "no capture command or source photo configured".to_string(),
        })?;

        tokio::fs::copy(source, target)
            .await
            .map_err(|e| CaptureError::Unavailable {
                details: format!("cannot read {}: {}", source.display(), e),
            })?;

        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

/// Pick the adapter named by the configuration; a command wins over a source file
pub fn adapter_from_config(config: &CaptureConfig) -> Arc<dyn CaptureAdapter> {
    match (&config.command, &config.source) {
        (Some(command), _) => Arc::new(CommandCapture::new(command.clone())),
        (None, source) => Arc::new(FileCapture::new(source.as_ref().map(PathBuf::from))),
    }
}

/// Capture adapter bound to the temporary store
#[derive(Clone)]
pub struct PhotoCapture {
    adapter: Arc<dyn CaptureAdapter>,
    store: TempStore,
}

impl PhotoCapture {
    pub fn new(adapter: Arc<dyn CaptureAdapter>, store: TempStore) -> Self {
        Self { adapter, store }
    }

    /// Take a photo and load it as the new session image
    pub async fn take_photo(&self) -> Result<CapturedImage, CaptureError> {
        let target = self.store.prepare().await?;

        info!(
            "Capturing photo with {} adapter into {}",
            self.adapter.name(),
            target.display()
        );

        self.adapter.capture(&target).await?;
        self.store.load().await
    }
}
