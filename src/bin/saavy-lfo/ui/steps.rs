//! Step editor widget - one bar per step, triggers and loop region below

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Bar, BarChart, BarGroup, Block, Borders},
    Frame,
};

use saavy_lfo::{StepTrigger, N_STEPS};

use crate::app::App;

/// Bar heights are step values scaled to 0..BAR_SCALE
const BAR_SCALE: f32 = 100.0;

fn trigger_glyph(trigger: StepTrigger) -> &'static str {
    match trigger {
        StepTrigger::None => "·",
        StepTrigger::AmpOnly => "A",
        StepTrigger::FilterOnly => "F",
        StepTrigger::AmpAndFilter => "*",
    }
}

/// Render the step values of the model being edited
pub fn render_steps(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(" Steps ")
        .borders(Borders::ALL);

    let model = &app.model;
    let low = model.min_value();
    let loop_range = model.loop_range();

    let bars: Vec<Bar> = model
        .steps()
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let height = ((value - low) / (1.0 - low) * BAR_SCALE).round().max(0.0) as u64;
            let color = if i == app.selected {
                Color::Yellow
            } else if loop_range.contains(&i) {
                Color::Cyan
            } else {
                Color::DarkGray
            };
            Bar::default()
                .value(height)
                .text_value(format!("{:.2}", value))
                .label(Line::from(trigger_glyph(model.trigger(i))))
                .style(Style::default().fg(color))
        })
        .collect();

    let inner_width = area.width.saturating_sub(2);
    let bar_width = (inner_width / N_STEPS as u16).saturating_sub(1).max(1);

    let chart = BarChart::default()
        .block(block)
        .bar_width(bar_width)
        .bar_gap(1)
        .max(BAR_SCALE as u64)
        .data(BarGroup::default().bars(&bars));

    frame.render_widget(chart, area);
}
