//! Step-sequencer LFO editing.
//!
//! [`StepSequencerStorage`] is the plain data a patch carries. The
//! [`StepSequencerModel`] wraps it with the editing operations a step
//! editor needs, grouped into gestures that each leave one undo entry.

pub mod model;
#[cfg(feature = "rtrb")]
pub mod publish;
pub mod storage;
pub mod trigger;
pub mod undo;

pub use model::{
    DirtyFlag, Direction, EditGuard, Extreme, JogSize, PatchSink, Quantize, StepSequencerModel,
    UndoSink,
};
#[cfg(feature = "rtrb")]
pub use publish::{channel, PublishError, RingPatchSink, StepSequencerUpdate, UpdateReceiver};
pub use storage::StepSequencerStorage;
pub use trigger::StepTrigger;
pub use undo::UndoStack;
