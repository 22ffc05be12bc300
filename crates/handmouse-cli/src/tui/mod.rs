//! Terminal frontend for the live dashboard.

pub mod guard;
pub mod input;

use std::io::{self, Stdout};

use crossterm::{
    cursor, execute,
    terminal::{enable_raw_mode, EnterAlternateScreen},
};
use handmouse_core::live::{Frontend, Row, Screen};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Padding, Paragraph},
    Frame, Terminal,
};

use guard::TerminalGuard;

const ACCENT: Color = Color::Rgb(0x87, 0x4B, 0xFD);
const LABEL: Color = Color::Rgb(0x7D, 0x56, 0xF4);
const VALUE: Color = Color::Rgb(0xFA, 0xFA, 0xFA);
const MUTED: Color = Color::Rgb(0x62, 0x62, 0x62);
const PANEL_WIDTH: u16 = 44;

pub struct TerminalFrontend {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    // dropped after the terminal
    _guard: TerminalGuard,
}

impl TerminalFrontend {
    /// Switch to raw mode on the alternate screen
    pub fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let guard = TerminalGuard::new();
        execute!(io::stdout(), EnterAlternateScreen, cursor::Hide)?;
        let terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

        Ok(Self {
            terminal,
            _guard: guard,
        })
    }
}

impl Frontend for TerminalFrontend {
    fn draw(&mut self, screen: &Screen) -> io::Result<()> {
        self.terminal.draw(|frame| draw_screen(frame, screen))?;
        Ok(())
    }
}

pub fn draw_screen(frame: &mut Frame, screen: &Screen) {
    let area = frame.area();

    match screen {
        Screen::Farewell(text) => {
            let [line, _] = Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(area);
            frame.render_widget(Paragraph::new(*text), line);
        }
        Screen::Dashboard { title, rows, hint } => {
            let panel_height = rows.len() as u16 + 4;
            let [title_area, panel_area, hint_area, _] = Layout::vertical([
                Constraint::Length(2),
                Constraint::Length(panel_height),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .areas(area);

            let title = Paragraph::new(Span::styled(
                *title,
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ));
            frame.render_widget(title, title_area);

            let block = Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(ACCENT))
                .padding(Padding::new(2, 2, 1, 1));
            let panel = Paragraph::new(row_lines(rows)).block(block);
            frame.render_widget(panel, narrow(panel_area, PANEL_WIDTH));

            let hint = Paragraph::new(Span::styled(*hint, Style::default().fg(MUTED)))
                .alignment(Alignment::Left);
            frame.render_widget(hint, hint_area);
        }
    }
}

fn row_lines(rows: &[Row]) -> Vec<Line<'_>> {
    let label = Style::default().fg(LABEL).add_modifier(Modifier::BOLD);
    let value = Style::default().fg(VALUE);

    rows.iter()
        .map(|row| {
            Line::from(vec![
                Span::styled(format!("{}: ", row.label), label),
                Span::styled(row.value.as_str(), value),
            ])
        })
        .collect()
}

fn narrow(area: Rect, width: u16) -> Rect {
    Rect {
        width: area.width.min(width),
        ..area
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handmouse_core::live::render;
    use handmouse_core::{DisplayState, StatusReport};
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;

    fn buffer_text(buffer: &Buffer) -> String {
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn draw(screen: &Screen) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        terminal.draw(|frame| draw_screen(frame, screen)).unwrap();
        buffer_text(terminal.backend().buffer())
    }

    #[test]
    fn test_draw_placeholder_dashboard() {
        let text = draw(&render(&DisplayState::new()));

        assert!(text.contains("Hand Mouse OS - Dashboard"));
        assert!(text.contains("Camera: initializing..."));
        assert!(text.contains("Engine: starting..."));
        assert!(text.contains("Mode: none"));
        assert!(text.contains("Performance: 0 FPS"));
        assert!(text.contains("Press 'q' to quit"));
    }

    #[test]
    fn test_draw_live_dashboard() {
        let mut state = DisplayState::new();
        state.apply_status(&StatusReport {
            is_processing: Some(true),
            asl_enabled: Some(true),
            fps: Some(30.0),
            ..Default::default()
        });

        let text = draw(&render(&state));
        assert!(text.contains("Camera: active"));
        assert!(text.contains("Engine: running"));
        assert!(text.contains("Mode: ASL mode"));
        assert!(text.contains("Performance: 30 FPS"));
    }

    #[test]
    fn test_draw_farewell() {
        let mut state = DisplayState::new();
        state.quitting = true;

        let text = draw(&render(&state));
        assert!(text.starts_with("Goodbye!"));
        assert!(!text.contains("Dashboard"));
    }
}
