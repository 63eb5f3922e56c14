use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GoCaptureConfig {
    pub remote: RemoteConfig,
    pub capture: CaptureConfig,
    pub browser: BrowserConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RemoteConfig {
    /// Scheme and host of the scoring server
    #[serde(default = "default_base_url", alias = "baseUrl", alias = "baseurl")]
    pub base_url: String,

    /// Path of the score endpoint relative to the base URL
    #[serde(default = "default_score_path")]
    pub score_path: String,

    /// Path of the upload endpoint relative to the base URL
    #[serde(default = "default_upload_path")]
    pub upload_path: String,

    /// Directory under the base URL that serves scored result images
    #[serde(default = "default_image_path")]
    pub image_path: String,

    /// Time allowed for a single attempt
    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,

    /// Total attempts per request, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Hard ceiling for a whole operation, all retries included
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CaptureConfig {
    /// Private directory holding the pending capture (`tmp.jpg`)
    #[serde(default = "default_app_dir")]
    pub app_dir: String,

    /// External camera command; `{output}` is replaced with the capture path.
    /// Split on whitespace without shell quoting.
    pub command: Option<String>,

    /// Photo copied into place when no camera command is configured
    pub source: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BrowserConfig {
    /// Browser program tried first when opening an upload URL
    pub preferred: Option<String>,

    /// Openers tried in order when the preferred browser is missing
    #[serde(default = "default_browser_fallback")]
    pub fallback: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UiConfig {
    /// How long a notification stays on screen
    #[serde(default = "default_notification_seconds")]
    pub notification_seconds: u64,

    /// Draw the full-screen terminal view and read keys
    #[serde(default = "default_interactive")]
    pub interactive: bool,
}

impl RemoteConfig {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

impl CaptureConfig {
    pub fn app_dir(&self) -> PathBuf {
        PathBuf::from(&self.app_dir)
    }
}

impl GoCaptureConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("gocapture.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            // remote.base_url is defaulted by serde (alias `baseUrl`)
            .set_default("remote.score_path", default_score_path())?
            .set_default("remote.upload_path", default_upload_path())?
            .set_default("remote.image_path", default_image_path())?
            .set_default("remote.attempt_timeout_ms", default_attempt_timeout_ms())?
            .set_default("remote.max_attempts", default_max_attempts())?
            .set_default("remote.initial_backoff_ms", default_initial_backoff_ms())?
            .set_default("remote.max_backoff_ms", default_max_backoff_ms())?
            .set_default("remote.deadline_ms", default_deadline_ms())?
            .set_default("capture.app_dir", default_app_dir())?
            .set_default("browser.fallback", default_browser_fallback())?
            .set_default("ui.notification_seconds", default_notification_seconds())?
            .set_default("ui.interactive", default_interactive())?
            .add_source(File::with_name(&path_str).required(false))
            .add_source(
                Environment::with_prefix("GOCAPTURE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: GoCaptureConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let remote = &self.remote;

        match reqwest::Url::parse(&remote.base_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => {
                return Err(ConfigError::Message(format!(
                    "Remote base_url must be http or https, got scheme '{}'",
                    url.scheme()
                )));
            }
            Err(e) => {
                return Err(ConfigError::Message(format!(
                    "Remote base_url '{}' is not a valid URL: {}",
                    remote.base_url, e
                )));
            }
        }

        if remote.attempt_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "Remote attempt_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if remote.max_attempts == 0 {
            return Err(ConfigError::Message(
                "Remote max_attempts must be greater than 0".to_string(),
            ));
        }

        if remote.initial_backoff_ms > remote.max_backoff_ms {
            return Err(ConfigError::Message(
                "Remote initial_backoff_ms must not exceed max_backoff_ms".to_string(),
            ));
        }

        if remote.deadline_ms < remote.attempt_timeout_ms {
            return Err(ConfigError::Message(
                "Remote deadline_ms must be at least attempt_timeout_ms".to_string(),
            ));
        }

        if self.capture.app_dir.trim().is_empty() {
            return Err(ConfigError::Message(
                "Capture app_dir must not be empty".to_string(),
            ));
        }

        if let Some(command) = &self.capture.command {
            if !command.contains("{output}") {
                return Err(ConfigError::Message(
                    "Capture command must contain the {output} placeholder".to_string(),
                ));
            }
        }

        if self.ui.notification_seconds == 0 {
            return Err(ConfigError::Message(
                "UI notification_seconds must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for GoCaptureConfig {
    fn default() -> Self {
        Self {
            remote: RemoteConfig {
                base_url: default_base_url(),
                score_path: default_score_path(),
                upload_path: default_upload_path(),
                image_path: default_image_path(),
                attempt_timeout_ms: default_attempt_timeout_ms(),
                max_attempts: default_max_attempts(),
                initial_backoff_ms: default_initial_backoff_ms(),
                max_backoff_ms: default_max_backoff_ms(),
                deadline_ms: default_deadline_ms(),
            },
            capture: CaptureConfig {
                app_dir: default_app_dir(),
                command: None,
                source: None,
            },
            browser: BrowserConfig {
                preferred: None,
                fallback: default_browser_fallback(),
            },
            ui: UiConfig {
                notification_seconds: default_notification_seconds(),
                interactive: default_interactive(),
            },
        }
    }
}

// Default value functions
fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_score_path() -> String {
    "api/score".to_string()
}
fn default_upload_path() -> String {
    "api/upload".to_string()
}
fn default_image_path() -> String {
    "sgf".to_string()
}
fn default_attempt_timeout_ms() -> u64 {
    60_000
}
fn default_max_attempts() -> u32 {
    4
}
fn default_initial_backoff_ms() -> u64 {
    500
}
fn default_max_backoff_ms() -> u64 {
    8_000
}
fn default_deadline_ms() -> u64 {
    180_000
}

fn default_app_dir() -> String {
    "./.gocapture".to_string()
}

fn default_browser_fallback() -> Vec<String> {
    vec!["xdg-open".to_string()]
}

fn default_notification_seconds() -> u64 {
    3
}
fn default_interactive() -> bool {
    true
}
