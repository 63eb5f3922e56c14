use super::orchestrator::GoCaptureApp;
use super::types::ShutdownReason;
use crate::error::{GoCaptureError, Result};
use crate::events::{EventSender, SessionEvent};
use crate::ui::ViewModel;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

const TICK_INTERVAL: Duration = Duration::from_millis(250);

impl GoCaptureApp {
    /// Run the session loop until the user quits, a one-shot run finishes,
    /// or a signal arrives. Returns the process exit code.
    pub async fn run(&mut self) -> Result<i32> {
        let mut receiver = self
            .receiver
            .take()
            .ok_or_else(|| GoCaptureError::system("Event receiver already taken"))?;

        setup_signal_handlers(self.events.clone());
        self.start().await?;
        self.render();

        let mut ticker = interval(TICK_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let reason = loop {
            tokio::select! {
                event = receiver.recv() => {
                    let Some(event) = event else {
                        break ShutdownReason::Signal("event channel closed".to_string());
                    };
                    debug!("Handling {}", event.event_type());
                    let outcome = self.handle_event(event);
                    self.render();
                    if let Some(reason) = outcome {
                        break reason;
                    }
                }
                _ = ticker.tick() => self.on_tick(),
            }
        };

        info!("Shutdown initiated: {:?}", reason);
        self.shutdown().await?;

        Ok(reason.exit_code())
    }

    /// Expire notifications and keep the busy counter moving
    fn on_tick(&mut self) {
        let now = std::time::Instant::now();
        let expired = self
            .notification
            .as_ref()
            .is_some_and(|n| n.is_expired(now));
        if expired {
            self.notification = None;
        }

        if expired || self.session.state().is_busy() {
            self.render();
        }
    }

    pub(super) fn render(&mut self) {
        let busy_for = self.request.as_ref().map(|r| r.started.elapsed());
        let view = ViewModel::build(&self.session, self.notification.as_ref(), busy_for);
        if let Err(e) = self.renderer.render(&view) {
            warn!("Failed to render view: {}", e);
        }
    }
}

/// Forward SIGINT/SIGTERM into the session loop
fn setup_signal_handlers(events: EventSender) {
    #[cfg(unix)]
    {
        let events = events.clone();
        tokio::spawn(async move {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    if sigterm.recv().await.is_some() {
                        info!("Received SIGTERM signal");
                        events
                            .send(SessionEvent::ShutdownRequested {
                                reason: "SIGTERM".to_string(),
                            })
                            .await;
                    }
                }
                Err(e) => warn!("Failed to register SIGTERM handler: {}", e),
            }
        });
    }

    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            info!("Received SIGINT signal (Ctrl+C)");
            events
                .send(SessionEvent::ShutdownRequested {
                    reason: "SIGINT".to_string(),
                })
                .await;
        }
    });
}
