pub mod keyboard;

mod presenter;
mod view;

pub use keyboard::{intent_for_key, KeyboardInputHandler};
pub use presenter::{LogRenderer, Renderer, TerminalRenderer};
pub use view::{ActionHint, ImageSummary, Notification, NotificationLevel, ViewModel};
