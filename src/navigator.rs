use crate::config::BrowserConfig;
use crate::error::NavigationError;
use async_trait::async_trait;
use reqwest::Url;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// "Open this URL outside the app" facility
#[async_trait]
pub trait Navigator: Send + Sync {
    async fn open(&self, url: &Url) -> Result<(), NavigationError>;
}

/// Launches a browser program, trying the preferred one before the fallbacks
pub struct BrowserNavigator {
    candidates: Vec<String>,
}

impl BrowserNavigator {
    pub fn new(config: &BrowserConfig) -> Self {
        let candidates = config
            .preferred
            .iter()
            .chain(config.fallback.iter())
            .filter(|program| !program.trim().is_empty())
            .cloned()
            .collect();

        Self { candidates }
    }

    /// Programs in the order they will be tried
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }
}

#[async_trait]
impl Navigator for BrowserNavigator {
    async fn open(&self, url: &Url) -> Result<(), NavigationError> {
        let mut failures = Vec::new();

        for program in &self.candidates {
            debug!("Opening {} with {}", url, program);
            match Command::new(program)
                .arg(url.as_str())
                .stdin(std::process::Stdio::null())
                .stdout(std::process::Stdio::null())
                .stderr(std::process::Stdio::null())
                .spawn()
            {
                Ok(_child) => {
                    info!("Opened {} in {}", url, program);
                    return Ok(());
                }
                Err(e) => {
                    warn!("Browser {} unavailable: {}", program, e);
                    failures.push(format!("{}: {}", program, e));
                }
            }
        }

        Err(NavigationError::NoHandler {
            url: url.to_string(),
            details: if failures.is_empty() {
                "no browser configured".to_string()
            } else {
                failures.join("; ")
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferred_browser_tried_first() {
        let navigator = BrowserNavigator::new(&BrowserConfig {
            preferred: Some("chromium".to_string()),
            fallback: vec!["xdg-open".to_string(), " ".to_string()],
        });

        assert_eq!(navigator.candidates(), ["chromium", "xdg-open"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_falls_back_when_preferred_missing() {
        let navigator = BrowserNavigator::new(&BrowserConfig {
            preferred: Some("gocapture-no-such-browser".to_string()),
            fallback: vec!["true".to_string()],
        });
        let url = Url::parse("https://example.com/g/1").unwrap();

        navigator.open(&url).await.unwrap();
    }

    #[tokio::test]
    async fn test_no_handler_error() {
        let navigator = BrowserNavigator::new(&BrowserConfig {
            preferred: None,
            fallback: vec!["gocapture-no-such-browser".to_string()],
        });
        let url = Url::parse("https://example.com/g/1").unwrap();

        let err = navigator.open(&url).await.unwrap_err();
        assert!(err.to_string().contains("gocapture-no-such-browser"));

        let empty = BrowserNavigator::new(&BrowserConfig {
            preferred: None,
            fallback: Vec::new(),
        });
        assert!(empty.open(&url).await.is_err());
    }
}
