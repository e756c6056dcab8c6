//! saavy-lfo - Terminal LFO editor
//!
//! Run with: cargo run --bin saavy-lfo
//!
//! Logs go to `saavy-lfo.log` in the working directory; set `RUST_LOG` to
//! change the level.

mod app;
mod ui;

use std::fs::File;

use color_eyre::eyre::{Result as EyreResult, WrapErr};

use app::App;
use saavy_lfo::{
    modulation::{LfoConfig, LfoShape, Rate},
    step_sequencer::channel,
    StepSequencerModel, Tempo,
};

/// Slots in the update ring; the editor only ever needs the newest one
const UPDATE_CAPACITY: usize = 64;

fn init_logging() -> EyreResult<()> {
    let file = File::create("saavy-lfo.log").wrap_err("failed to create log file")?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    init_logging()?;

    let (patch, updates) = channel(UPDATE_CAPACITY);
    let lfo = LfoConfig::new(LfoShape::StepSequencer).rate(Rate::new(1.0));

    let mut app = App::new(lfo, Tempo::new(120.0), StepSequencerModel::new(0), patch, updates);

    let mut terminal = ratatui::init();
    let result = ui::run(&mut app, &mut terminal);
    ratatui::restore();
    result
}
