mod machine;
mod state;

pub use machine::{RequestTicket, Session};
pub use state::{Action, Operation, SessionState};
