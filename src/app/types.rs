use crate::session::Operation;

/// How the app is driven
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Keyboard-driven session until the user quits
    Interactive,
    /// Capture once, run one operation, exit
    Once(Operation),
}

/// System shutdown reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    Signal(String),
    UserRequest,
    Finished { success: bool },
}

impl ShutdownReason {
    pub fn exit_code(&self) -> i32 {
        match self {
            ShutdownReason::Finished { success: false } => 1,
            _ => 0,
        }
    }
}
