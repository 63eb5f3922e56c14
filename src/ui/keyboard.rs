use crate::error::Result;
use crate::events::{EventSender, Intent, SessionEvent};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::time::Duration;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Map a key press to a user intent
pub fn intent_for_key(code: KeyCode, modifiers: KeyModifiers) -> Option<Intent> {
    match code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Some(Intent::Quit),
        KeyCode::Char('c') | KeyCode::Char(' ') => Some(Intent::TakePhoto),
        KeyCode::Char('s') => Some(Intent::Score),
        KeyCode::Char('u') => Some(Intent::Upload),
        KeyCode::Char('x') => Some(Intent::Cancel),
        KeyCode::Char('q') | KeyCode::Esc => Some(Intent::Quit),
        _ => None,
    }
}

/// Reads key presses in raw mode and forwards them as intents
pub struct KeyboardInputHandler {
    events: EventSender,
    cancellation_token: CancellationToken,
}

impl KeyboardInputHandler {
    pub fn new(events: EventSender, cancellation_token: CancellationToken) -> Self {
        Self {
            events,
            cancellation_token,
        }
    }

    /// Start listening for keyboard input
    pub fn start(&self) -> Result<()> {
        info!("Starting keyboard input handler");

        let events = self.events.clone();
        let cancellation_token = self.cancellation_token.clone();

        enable_raw_mode()?;

        task::spawn_blocking(move || {
            loop {
                if cancellation_token.is_cancelled() {
                    debug!("Keyboard input handler stopping");
                    break;
                }

                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => {
                        let Ok(Event::Key(key_event)) = event::read() else {
                            continue;
                        };
                        // Only handle key press events (not release)
                        if key_event.kind != KeyEventKind::Press {
                            continue;
                        }

                        match intent_for_key(key_event.code, key_event.modifiers) {
                            Some(intent) => {
                                debug!("Key {:?} -> {:?}", key_event.code, intent);
                                if !events.blocking_send(SessionEvent::Intent(intent)) {
                                    break;
                                }
                                if intent == Intent::Quit {
                                    break;
                                }
                            }
                            None => debug!("Ignoring key {:?}", key_event.code),
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Error polling for keyboard events: {}", e);
                    }
                }
            }

            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            }
            debug!("Keyboard input handler task exited");
        });

        Ok(())
    }

    /// Stop the keyboard input handler
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping keyboard input handler");
        self.cancellation_token.cancel();

        // Give the reader one poll interval to notice
        tokio::time::sleep(Duration::from_millis(150)).await;

        let _ = disable_raw_mode();

        Ok(())
    }
}
