//! TUI for saavy-lfo
//!
//! Waveform preview on top, step editor below, key help at the bottom.

mod status;
mod steps;
mod waveform;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::Line,
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use std::time::Duration;

use super::app::App;

use status::render_status;
use steps::render_steps;
use waveform::render_waveform;

/// Braille cells hold two dots across
const DOTS_PER_CELL: usize = 2;

/// Run the UI event loop
pub fn run(app: &mut App, terminal: &mut DefaultTerminal) -> EyreResult<()> {
    while !app.should_quit {
        app.poll_updates();

        let size = terminal.size()?;
        app.refresh_waveform(size.width.saturating_sub(2) as usize * DOTS_PER_CELL);

        terminal.draw(|frame| render(frame, app))?;

        // Non-blocking, ~60fps
        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }
    }

    Ok(())
}

fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Status bar
            Constraint::Min(10),    // Waveform
            Constraint::Length(10), // Steps
            Constraint::Length(2),  // Help
        ])
        .split(frame.area());

    render_status(frame, chunks[0], app);
    render_waveform(frame, chunks[1], &app.waveform);
    render_steps(frame, chunks[2], app);

    let help = Paragraph::new(vec![
        Line::from(concat!(
            " [←/→] Step  [↑/↓] Jog (Shift fine)  [PgUp/PgDn] Semitone  [x/n/0] Max/Min/Reset",
            "  [</>] Shift  [t/T] Trigger  [[/]] Loop  [r/R] Ramp/Reset loop",
        )),
        Line::from(concat!(
            " [u/y] Undo/Redo  [Tab] Shape  [+/-] Rate  [s] Sync  [o] Rate off  [m/M] Magnitude",
            "  [d/D] Deform  [b] Envelope  [p] Unipolar  [,/.] BPM  [Q] Quit",
        )),
    ])
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, chunks[3]);
}
