//! Sampled LFO waveform widget

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

use saavy_lfo::display::{CurvePoint, SampledWaveform};

/// Sampler y grows downward; the chart's grows upward.
fn flip(x: f32, y: f32) -> (f64, f64) {
    (x as f64, 1.0 - y as f64)
}

fn curve(points: &[CurvePoint]) -> Vec<(f64, f64)> {
    points.iter().map(|p| flip(p.x, p.y)).collect()
}

/// Render the waveform preview with envelope bounds, overlay and beat ticks
pub fn render_waveform(frame: &mut Frame, area: Rect, waveform: &SampledWaveform) {
    let title = match waveform.invalid_message() {
        Some(message) => Span::styled(
            format!(" Waveform: {} ", message),
            Style::default().fg(Color::Red),
        ),
        None => Span::raw(" Waveform "),
    };
    let block = Block::default().title(title).borders(Borders::ALL);

    let main: Vec<(f64, f64)> = waveform.points.iter().map(|p| flip(p.x, p.y)).collect();
    let overlay: Vec<(f64, f64)> = waveform
        .overlay
        .as_ref()
        .map(|o| o.points.iter().map(|p| flip(p.x, p.y)).collect())
        .unwrap_or_default();
    let upper = waveform.envelope_upper.as_deref().map(curve).unwrap_or_default();
    let lower = waveform.envelope_lower.as_deref().map(curve).unwrap_or_default();
    let beats: Vec<(f64, f64)> = waveform
        .beat_marks
        .iter()
        .filter(|m| m.labelled)
        .map(|m| (m.x as f64, 0.0))
        .collect();

    let mut datasets = Vec::new();
    let backdrop = [
        (&upper, Color::Blue),
        (&lower, Color::Blue),
        (&overlay, Color::DarkGray),
    ];
    for (data, color) in backdrop {
        if !data.is_empty() {
            datasets.push(
                Dataset::default()
                    .marker(symbols::Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(color))
                    .data(data),
            );
        }
    }
    datasets.push(
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&main),
    );
    if !beats.is_empty() {
        datasets.push(
            Dataset::default()
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(Color::Yellow))
                .data(&beats),
        );
    }

    let labels: Vec<String> = match (waveform.time_marks.first(), waveform.time_marks.last()) {
        (Some(first), Some(last)) if waveform.time_marks.len() > 1 => {
            vec![first.label(), last.label()]
        }
        _ => vec![format!("{:.2} s", waveform.drawn_time)],
    };

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([0.0, 1.0])
                .labels(labels)
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
