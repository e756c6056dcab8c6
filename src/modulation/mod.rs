//! LFO settings and their display-time simulation.

pub mod config;
pub mod simulator;
pub mod source;

pub use crate::dsp::envelope::{Dahdsr, EnvelopeTime};
pub use config::{Formula, FormulaInput, LfoConfig, LfoShape, Rate};
pub use simulator::LfoSimulator;
pub use source::ModulationSource;
