use super::retry::{AttemptError, RetryPolicy};
use super::types::{RemoteRequest, RemoteResponse, ScoreOutcome};
use crate::codec;
use crate::config::RemoteConfig;
use crate::error::{GoCaptureError, RemoteError, Result};
use crate::frame::ImageSource;
use crate::session::Operation;
use reqwest::{StatusCode, Url};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// HTTP client for the score and upload endpoints.
///
/// At most one operation runs at a time; a call made while another is
/// outstanding fails with [`RemoteError::Busy`] without touching the network.
#[derive(Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    base_url: Url,
    config: RemoteConfig,
    policy: RetryPolicy,
    in_flight: Arc<AtomicBool>,
}

/// Clears the in-flight flag when the operation ends, however it ends
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl RemoteClient {
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let base_url = normalized_base(&config.base_url)?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("gocapture/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GoCaptureError::system(format!("Failed to build HTTP client: {}", e)))?;
        let policy = RetryPolicy::from_config(&config);

        info!(
            "Remote client targeting {} ({} attempts, {} ms per attempt, {} ms deadline)",
            base_url, policy.max_attempts, config.attempt_timeout_ms, config.deadline_ms
        );

        Ok(Self {
            http,
            base_url,
            config,
            policy,
            in_flight: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// POST target for an operation
    pub fn endpoint(&self, operation: Operation) -> Result<Url> {
        let path = match operation {
            Operation::Score => &self.config.score_path,
            Operation::Upload => &self.config.upload_path,
        };
        self.join(path.trim_start_matches('/'))
    }

    /// Where a scored board named `reference` is served
    ///
    /// The reference is always a single path segment under the image
    /// directory; slashes, dot-segments, `?` and `#` are percent-encoded.
    pub fn image_url(&self, reference: &str) -> Result<Url> {
        let name = reference.trim_start_matches('/');
        if matches!(name, "" | "." | "..") {
            return Err(GoCaptureError::system(format!(
                "Image reference '{}' is not a file name",
                reference
            )));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                GoCaptureError::system(format!("Base URL '{}' cannot hold a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(self.config.image_path.split('/').filter(|s| !s.is_empty()))
            .push(name);
        Ok(url)
    }

    /// Submit for scoring, then fetch and decode the annotated board.
    ///
    /// Undecodable result bytes are not an error: the outcome simply
    /// carries no image.
    pub async fn score(
        &self,
        request: &RemoteRequest,
        cancel: &CancellationToken,
    ) -> std::result::Result<ScoreOutcome, RemoteError> {
        let operation = Operation::Score;
        let _guard = self.acquire(operation)?;
        let started = Instant::now();

        let body = self.post_image(request, cancel, started).await?;
        let response = RemoteResponse::from_json(operation, &body)?;
        let image_ref = response
            .image_ref()
            .map(str::to_string)
            .ok_or_else(|| RemoteError::Protocol {
                operation,
                details: "missing `image` field".to_string(),
            })?;

        let url = self.image_url(&image_ref).map_err(|e| RemoteError::Protocol {
            operation,
            details: format!("image reference `{}` unusable: {}", image_ref, e),
        })?;
        let bytes = self.fetch(operation, &url, cancel, started).await?;

        let image = match codec::decode(
            &bytes,
            ImageSource::ScoreResult {
                reference: image_ref.clone(),
            },
        ) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("Score result {} not displayable: {}", url, e);
                None
            }
        };

        info!(
            "Score request {} finished in {:?}: {}",
            request.id(),
            started.elapsed(),
            response.status()
        );

        Ok(ScoreOutcome { response, image })
    }

    /// Submit for upload and return the shareable URL
    pub async fn upload(
        &self,
        request: &RemoteRequest,
        cancel: &CancellationToken,
    ) -> std::result::Result<RemoteResponse, RemoteError> {
        let operation = Operation::Upload;
        let _guard = self.acquire(operation)?;
        let started = Instant::now();

        let body = self.post_image(request, cancel, started).await?;
        let response = RemoteResponse::from_json(operation, &body)?;

        info!(
            "Upload request {} finished in {:?}: {}",
            request.id(),
            started.elapsed(),
            response.status()
        );

        Ok(response)
    }

    fn acquire(&self, operation: Operation) -> std::result::Result<InFlightGuard, RemoteError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| {
                warn!("Rejecting {} request: another request is in flight", operation);
                RemoteError::Busy { operation }
            })?;
        Ok(InFlightGuard(Arc::clone(&self.in_flight)))
    }

    async fn post_image(
        &self,
        request: &RemoteRequest,
        cancel: &CancellationToken,
        started: Instant,
    ) -> std::result::Result<Value, RemoteError> {
        let operation = request.operation();
        let url = self.endpoint(operation).map_err(|e| RemoteError::Network {
            operation,
            details: e.to_string(),
        })?;

        debug!(
            "POST {} for request {} ({} payload chars)",
            url,
            request.id(),
            request.payload().len()
        );

        self.policy
            .run(operation, started, cancel, |_| {
                let send = self.http.post(url.clone()).json(&request.body()).send();
                async move {
                    let response = send.await.map_err(transport_error)?;
                    let bytes = read_success_body(operation, response).await?;
                    serde_json::from_slice::<Value>(&bytes).map_err(|e| {
                        AttemptError::Fatal(RemoteError::Protocol {
                            operation,
                            details: format!("body is not JSON: {}", e),
                        })
                    })
                }
            })
            .await
    }

    async fn fetch(
        &self,
        operation: Operation,
        url: &Url,
        cancel: &CancellationToken,
        started: Instant,
    ) -> std::result::Result<Vec<u8>, RemoteError> {
        debug!("GET {}", url);

        self.policy
            .run(operation, started, cancel, |_| {
                let send = self.http.get(url.clone()).send();
                async move {
                    let response = send.await.map_err(transport_error)?;
                    read_success_body(operation, response).await
                }
            })
            .await
    }

    fn join(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| GoCaptureError::system(format!("Invalid remote path '{}': {}", path, e)))
    }
}

fn normalized_base(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)
        .map_err(|e| GoCaptureError::system(format!("Invalid base URL '{}': {}", raw, e)))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn transport_error(error: reqwest::Error) -> AttemptError {
    AttemptError::Retryable(error.to_string())
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

async fn read_success_body(
    operation: Operation,
    response: reqwest::Response,
) -> std::result::Result<Vec<u8>, AttemptError> {
    let status = response.status();
    if !status.is_success() {
        let details = format!("server returned {}", status);
        return if is_retryable_status(status) {
            Err(AttemptError::Retryable(details))
        } else {
            Err(AttemptError::Fatal(RemoteError::Network { operation, details }))
        };
    }

    let bytes = response.bytes().await.map_err(transport_error)?;
    Ok(bytes.to_vec())
}
