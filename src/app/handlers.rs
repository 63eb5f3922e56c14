use super::orchestrator::{GoCaptureApp, InFlightRequest};
use super::types::{RunMode, ShutdownReason};
use crate::codec;
use crate::error::{CaptureError, GoCaptureError, NavigationError, PermissionError, RemoteError};
use crate::events::{Intent, SessionEvent};
use crate::frame::CapturedImage;
use crate::remote::{RemoteRequest, RemoteResponse, ScoreOutcome};
use crate::session::{Action, Operation};
use crate::ui::Notification;
use reqwest::Url;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

impl GoCaptureApp {
    /// Apply one event. Returns a reason when the loop should end.
    pub(super) fn handle_event(&mut self, event: SessionEvent) -> Option<ShutdownReason> {
        match event {
            SessionEvent::Intent(intent) => self.on_intent(intent),
            SessionEvent::CaptureFinished { result } => self.on_capture_finished(result),
            SessionEvent::ScoreFinished { id, result } => self.on_score_finished(id, result),
            SessionEvent::UploadFinished { id, result } => self.on_upload_finished(id, result),
            SessionEvent::NavigationFinished { result } => self.on_navigation_finished(result),
            SessionEvent::PermissionResolved { result } => self.on_permission_resolved(result),
            SessionEvent::ShutdownRequested { reason } => Some(ShutdownReason::Signal(reason)),
        }
    }

    fn on_intent(&mut self, intent: Intent) -> Option<ShutdownReason> {
        match intent {
            Intent::TakePhoto => self.take_photo(),
            Intent::Score => self.submit(Operation::Score),
            Intent::Upload => self.submit(Operation::Upload),
            Intent::Cancel => {
                match &self.request {
                    Some(request) => {
                        info!("User cancelled {} request {}", request.operation, request.id);
                        request.token.cancel();
                    }
                    None => debug!("Nothing to cancel"),
                }
                None
            }
            Intent::Quit => Some(ShutdownReason::UserRequest),
        }
    }

    fn take_photo(&mut self) -> Option<ShutdownReason> {
        if self.capture_in_progress || !self.session.is_available(Action::TakePhoto) {
            debug!("Take photo not available while {}", self.session.state());
            return self.finish_once(false);
        }

        self.capture_in_progress = true;
        let capture = self.capture.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = capture.take_photo().await;
            events.send(SessionEvent::CaptureFinished { result }).await;
        });
        None
    }

    fn on_capture_finished(
        &mut self,
        result: Result<CapturedImage, CaptureError>,
    ) -> Option<ShutdownReason> {
        self.capture_in_progress = false;

        match result {
            Ok(image) => {
                if let Err(e) = self.session.capture_succeeded(image) {
                    warn!("Discarding capture: {}", e);
                    return None;
                }
                match self.mode {
                    RunMode::Once(operation) => self.submit(operation),
                    RunMode::Interactive => None,
                }
            }
            Err(e) => {
                // Capture problems are silent: the session just stays idle
                warn!("Capture failed: {}", e);
                self.session.capture_failed();
                self.finish_once(false)
            }
        }
    }

    fn submit(&mut self, operation: Operation) -> Option<ShutdownReason> {
        let action = match operation {
            Operation::Score => Action::Score,
            Operation::Upload => Action::Upload,
        };
        if !self.session.is_available(action) {
            debug!("{} not available while {}", operation, self.session.state());
            return None;
        }

        let ticket = match self.session.begin_request(operation) {
            Ok(ticket) => ticket,
            Err(e) => {
                warn!("Cannot start {}: {}", operation, e);
                return None;
            }
        };

        let token = self.cancellation_token.child_token();
        self.request = Some(InFlightRequest {
            id: ticket.id,
            operation,
            token: token.clone(),
            started: Instant::now(),
        });

        info!("Starting {} request {}", operation, ticket.id);

        let client = self.client.clone();
        let events = self.events.clone();
        let id = ticket.id;
        let image = ticket.image;
        tokio::spawn(async move {
            let payload = match tokio::task::spawn_blocking(move || codec::encode(&image)).await {
                Ok(Ok(payload)) => Ok(payload),
                Ok(Err(e)) => Err(GoCaptureError::from(e)),
                Err(e) => Err(GoCaptureError::system(format!("Encoder task failed: {}", e))),
            };

            let event = match operation {
                Operation::Score => {
                    let result = match payload {
                        Ok(payload) => client
                            .score(&RemoteRequest::new(id, operation, payload), &token)
                            .await
                            .map_err(GoCaptureError::from),
                        Err(e) => Err(e),
                    };
                    SessionEvent::ScoreFinished { id, result }
                }
                Operation::Upload => {
                    let result = match payload {
                        Ok(payload) => client
                            .upload(&RemoteRequest::new(id, operation, payload), &token)
                            .await
                            .map_err(GoCaptureError::from),
                        Err(e) => Err(e),
                    };
                    SessionEvent::UploadFinished { id, result }
                }
            };

            events.send(event).await;
        });

        None
    }

    fn on_score_finished(
        &mut self,
        id: Uuid,
        result: Result<ScoreOutcome, GoCaptureError>,
    ) -> Option<ShutdownReason> {
        if !self.claim_request(id) {
            return None;
        }

        match result {
            Ok(outcome) => {
                let status = outcome.response.status().to_string();
                if let Err(e) = self.session.score_succeeded(id, outcome.image) {
                    error!("Score completion rejected: {}", e);
                    return None;
                }
                self.notify_info(status);
                self.finish_once(true)
            }
            Err(e) => self.request_failed(id, e),
        }
    }

    fn on_upload_finished(
        &mut self,
        id: Uuid,
        result: Result<RemoteResponse, GoCaptureError>,
    ) -> Option<ShutdownReason> {
        if !self.claim_request(id) {
            return None;
        }

        let response = match result {
            Ok(response) => response,
            Err(e) => return self.request_failed(id, e),
        };

        let Some(url) = response.url().cloned() else {
            let e = RemoteError::Protocol {
                operation: Operation::Upload,
                details: "missing `url` field".to_string(),
            };
            return self.request_failed(id, e.into());
        };

        if let Err(e) = self.session.upload_succeeded(id) {
            error!("Upload completion rejected: {}", e);
            return None;
        }
        self.notify_info(response.status().to_string());
        self.open_url(url);
        None
    }

    fn open_url(&self, url: Url) {
        if let RunMode::Once(_) = self.mode {
            println!("{}", url);
        }

        let navigator = Arc::clone(&self.navigator);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = navigator.open(&url).await;
            events.send(SessionEvent::NavigationFinished { result }).await;
        });
    }

    fn on_navigation_finished(
        &mut self,
        result: Result<(), NavigationError>,
    ) -> Option<ShutdownReason> {
        if let Err(e) = result {
            error!("Failed to open upload URL: {}", e);
            self.notify_error(e.to_string());
        }

        if let Err(e) = self.session.reset() {
            warn!("Session reset skipped: {}", e);
        }

        self.finish_once(true)
    }

    fn on_permission_resolved(
        &mut self,
        result: Result<(), PermissionError>,
    ) -> Option<ShutdownReason> {
        match result {
            Ok(()) => {
                self.session.set_capture_enabled(true);
                None
            }
            Err(e) => {
                warn!("Storage permission denied: {}", e);
                self.session.set_capture_enabled(false);
                if !self.permission_notified {
                    self.permission_notified = true;
                    self.notify_error(format!("Camera disabled: {}", e));
                }
                // A one-shot run has nothing left to do without storage
                self.finish_once(false)
            }
        }
    }

    /// Drop the in-flight record if `id` is the request it tracks
    fn claim_request(&mut self, id: Uuid) -> bool {
        match &self.request {
            Some(request) if request.id == id => {
                self.request = None;
                true
            }
            _ => {
                debug!("Ignoring completion of stale request {}", id);
                false
            }
        }
    }

    fn request_failed(&mut self, id: Uuid, error: GoCaptureError) -> Option<ShutdownReason> {
        if let Err(e) = self.session.request_failed(id) {
            error!("Failure completion rejected: {}", e);
            return None;
        }

        match &error {
            GoCaptureError::Remote(RemoteError::Cancelled { .. }) => {
                info!("Request {} cancelled", id);
                self.notify_info("Request cancelled");
            }
            GoCaptureError::Remote(remote) => {
                error!("Request {} failed: {}", id, remote);
                self.notify_error(remote.user_message());
            }
            GoCaptureError::Codec(e) => {
                error!("Request {} failed before sending: {}", id, e);
                self.notify_error(format!("Could not encode photo: {}", e));
            }
            other => {
                error!("Request {} failed: {}", id, other);
                self.notify_error(other.to_string());
            }
        }

        self.finish_once(false)
    }

    fn finish_once(&self, success: bool) -> Option<ShutdownReason> {
        match self.mode {
            RunMode::Once(_) => Some(ShutdownReason::Finished { success }),
            RunMode::Interactive => None,
        }
    }

    fn notify_info<S: Into<String>>(&mut self, text: S) {
        self.notification = Some(Notification::info(text, self.notification_ttl()));
    }

    fn notify_error<S: Into<String>>(&mut self, text: S) {
        self.notification = Some(Notification::error(text, self.notification_ttl()));
    }
}
