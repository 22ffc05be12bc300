//! Terminal events to dashboard inputs.

use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use handmouse_core::ViewInput;
use tokio::sync::mpsc::UnboundedSender;

/// How often the reader checks whether the view has gone away
const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub fn input_for(event: &Event) -> Option<ViewInput> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(ViewInput::Quit),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(ViewInput::Quit)
            }
            _ => None,
        },
        Event::Resize(_, _) => Some(ViewInput::Redraw),
        _ => None,
    }
}

/// Read terminal events on a dedicated thread until the receiver is dropped.
///
/// crossterm's reads block, so they stay off the runtime. If the terminal
/// errors out the sender is dropped, which the view treats as a quit.
pub fn spawn_reader(tx: UnboundedSender<ViewInput>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("handmouse-input".into())
        .spawn(move || read_loop(tx))
}

fn read_loop(tx: UnboundedSender<ViewInput>) {
    while !tx.is_closed() {
        match event::poll(POLL_INTERVAL) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                tracing::warn!("Terminal input failed: {}", e);
                return;
            }
        }

        let event = match event::read() {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("Terminal input failed: {}", e);
                return;
            }
        };

        if let Some(input) = input_for(&event) {
            tracing::debug!("Dashboard input: {:?}", input);
            if tx.send(input).is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEvent;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(
            input_for(&key(KeyCode::Char('q'), KeyModifiers::NONE)),
            Some(ViewInput::Quit)
        );
        assert_eq!(
            input_for(&key(KeyCode::Esc, KeyModifiers::NONE)),
            Some(ViewInput::Quit)
        );
        assert_eq!(
            input_for(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(ViewInput::Quit)
        );
    }

    #[test]
    fn test_other_keys_ignored() {
        assert_eq!(input_for(&key(KeyCode::Char('c'), KeyModifiers::NONE)), None);
        assert_eq!(input_for(&key(KeyCode::Char('Q'), KeyModifiers::SHIFT)), None);
        assert_eq!(input_for(&key(KeyCode::Enter, KeyModifiers::NONE)), None);
        assert_eq!(input_for(&Event::FocusGained), None);
    }

    #[test]
    fn test_key_release_ignored() {
        let mut release = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert_eq!(input_for(&Event::Key(release)), None);
    }

    #[test]
    fn test_resize_redraws() {
        assert_eq!(input_for(&Event::Resize(120, 40)), Some(ViewInput::Redraw));
    }
}
