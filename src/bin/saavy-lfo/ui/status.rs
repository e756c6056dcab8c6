//! Status bar widget - shape, rate, tempo and edit history

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;

/// Render the status bar
pub fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(" saavy-lfo ")
        .borders(Borders::ALL);

    let lfo = &app.lfo;
    let rate = if lfo.rate.deactivated {
        "off".to_string()
    } else {
        format!("{:.2} Hz", lfo.rate.hz(&app.tempo))
    };
    let sync = if lfo.rate.temposync { " sync" } else { "" };
    let polarity = if lfo.unipolar { "uni" } else { "bi" };
    let envelope = if lfo.envelope_bypassed { "env off" } else { "env on" };
    let loop_range = app.model.loop_range();

    let line = Line::from(vec![
        Span::styled(
            format!(" {}  ", lfo.shape.name()),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("Rate: {}{}  ", rate, sync),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!(
                "Mag: {:.1}  Deform: {:.1}  {}  {}  ",
                lfo.magnitude, lfo.deform, polarity, envelope
            ),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("BPM: {:.0}  ", app.tempo.bpm),
            Style::default().fg(Color::Green),
        ),
        Span::styled(
            format!(
                "Step {}  Loop {}-{}  ",
                app.selected + 1,
                loop_range.start() + 1,
                loop_range.end() + 1
            ),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(
            format!(
                "Undo: {}  Sent: {}  Dropped: {}",
                app.undo.len(),
                app.published,
                app.dropped_updates()
            ),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let paragraph = Paragraph::new(line).block(block);
    frame.render_widget(paragraph, area);
}
