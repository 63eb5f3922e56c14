use super::view::ViewModel;
use crate::error::Result;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use std::io::{Stdout, Write};
use tracing::info;

/// Draws a view. Called once per state change with the full view model.
pub trait Renderer: Send {
    fn render(&mut self, view: &ViewModel) -> Result<()>;

    /// Give the terminal back before exit
    fn restore(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Full-screen terminal presenter
pub struct TerminalRenderer {
    out: Stdout,
    active: bool,
}

impl TerminalRenderer {
    pub fn new() -> Result<Self> {
        let mut out = std::io::stdout();
        execute!(out, EnterAlternateScreen, Hide)?;
        Ok(Self { out, active: true })
    }
}

impl Renderer for TerminalRenderer {
    fn render(&mut self, view: &ViewModel) -> Result<()> {
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        for line in view.lines() {
            // Raw mode needs explicit carriage returns
            write!(self.out, "{}\r\n", line)?;
        }
        self.out.flush()?;
        Ok(())
    }

    fn restore(&mut self) -> Result<()> {
        if self.active {
            execute!(self.out, Show, LeaveAlternateScreen)?;
            self.active = false;
        }
        Ok(())
    }
}

impl Drop for TerminalRenderer {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Headless presenter: logs each distinct view
#[derive(Default)]
pub struct LogRenderer {
    last: Option<Vec<String>>,
}

impl LogRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for LogRenderer {
    fn render(&mut self, view: &ViewModel) -> Result<()> {
        let lines = view.lines();
        if self.last.as_ref() != Some(&lines) {
            info!(
                state = %view.state,
                notification = view.notification.as_ref().map(|(_, text)| text.as_str()),
                "View updated"
            );
            self.last = Some(lines);
        }
        Ok(())
    }
}
