use crate::session::{Action, Session, SessionState};
use std::time::{Duration, Instant};

/// Transient status text, the terminal counterpart of a toast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub text: String,
    pub level: NotificationLevel,
    shown_at: Instant,
    ttl: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

impl Notification {
    pub fn info<S: Into<String>>(text: S, ttl: Duration) -> Self {
        Self::new(text, NotificationLevel::Info, ttl)
    }

    pub fn error<S: Into<String>>(text: S, ttl: Duration) -> Self {
        Self::new(text, NotificationLevel::Error, ttl)
    }

    fn new<S: Into<String>>(text: S, level: NotificationLevel, ttl: Duration) -> Self {
        Self {
            text: text.into(),
            level,
            shown_at: Instant::now(),
            ttl,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.shown_at) >= self.ttl
    }

    pub fn expires_at(&self) -> Instant {
        self.shown_at + self.ttl
    }
}

/// Photo shown on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSummary {
    pub width: u32,
    pub height: u32,
    pub source: String,
    pub age_seconds: i64,
}

/// An offered action and the key that triggers it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionHint {
    pub action: Action,
    pub key: char,
}

impl ActionHint {
    pub fn for_action(action: Action) -> Self {
        let key = match action {
            Action::TakePhoto => 'c',
            Action::Score => 's',
            Action::Upload => 'u',
        };
        Self { action, key }
    }
}

/// Everything the screen shows, derived from the session and nothing else
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModel {
    pub state: SessionState,
    pub image: Option<ImageSummary>,
    pub actions: Vec<ActionHint>,
    pub busy: Option<String>,
    pub notification: Option<(NotificationLevel, String)>,
    pub capture_disabled: bool,
}

impl ViewModel {
    pub fn build(
        session: &Session,
        notification: Option<&Notification>,
        busy_for: Option<Duration>,
    ) -> Self {
        let state = session.state();

        let image = session.image().map(|image| ImageSummary {
            width: image.width(),
            height: image.height(),
            source: image.source().label(),
            age_seconds: image.age_seconds(),
        });

        let actions = session
            .available_actions()
            .into_iter()
            .map(ActionHint::for_action)
            .collect();

        let busy = state.is_busy().then(|| {
            let elapsed = busy_for.unwrap_or_default().as_secs();
            format!("Analyzing... Please wait... ({} s)", elapsed)
        });

        Self {
            state,
            image,
            actions,
            busy,
            notification: notification.map(|n| (n.level, n.text.clone())),
            capture_disabled: state == SessionState::Idle && !session.capture_enabled(),
        }
    }

    pub fn offers(&self, action: Action) -> bool {
        self.actions.iter().any(|hint| hint.action == action)
    }

    /// Plain-text screen, one entry per line
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            "GoCapture".to_string(),
            "=========".to_string(),
            format!("State: {}", self.state),
            String::new(),
        ];

        match &self.image {
            Some(image) => lines.push(format!(
                "Photo: {}x{} from {} ({} s ago)",
                image.width, image.height, image.source, image.age_seconds
            )),
            None => lines.push("Photo: [ no photo yet ]".to_string()),
        }
        lines.push(String::new());

        if let Some(busy) = &self.busy {
            lines.push(busy.clone());
            lines.push("[x] Cancel".to_string());
        } else if self.actions.is_empty() {
            if self.capture_disabled {
                lines.push("Camera disabled: storage permission denied".to_string());
            } else {
                lines.push("(no actions available)".to_string());
            }
        } else {
            let hints: Vec<String> = self
                .actions
                .iter()
                .map(|hint| format!("[{}] {}", hint.key, hint.action.label()))
                .collect();
            lines.push(hints.join("   "));
        }
        lines.push("[q] Quit".to_string());

        if let Some((level, text)) = &self.notification {
            lines.push(String::new());
            let prefix = match level {
                NotificationLevel::Info => ">>",
                NotificationLevel::Error => "!!",
            };
            lines.push(format!("{} {}", prefix, text));
        }

        lines
    }
}
