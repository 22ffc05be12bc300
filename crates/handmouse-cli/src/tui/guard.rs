//! Restores the terminal when the dashboard exits, including on panic.

use crossterm::{cursor, execute, terminal::disable_raw_mode, terminal::LeaveAlternateScreen};

/// Undoes raw mode, the alternate screen and the hidden cursor on drop.
///
/// Create it right after raw mode is enabled so a failure later in setup
/// still leaves the shell usable.
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TerminalGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Best effort, nothing useful to do with errors here
        let _ = disable_raw_mode();
        let _ = execute!(std::io::stdout(), LeaveAlternateScreen, cursor::Show);
    }
}
