use std::fmt;

use log::warn;
use rtrb::{Consumer, Producer, RingBuffer};

use super::model::PatchSink;
use super::storage::StepSequencerStorage;

/// A committed step-sequencer state, sent to the audio side.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StepSequencerUpdate {
    pub sequence_index: usize,
    pub storage: StepSequencerStorage,
}

pub trait UpdateReceiver {
    fn pop(&mut self) -> Option<StepSequencerUpdate>;

    /// Drain everything queued, keeping only the newest update.
    fn latest(&mut self) -> Option<StepSequencerUpdate> {
        let mut latest = None;
        while let Some(update) = self.pop() {
            latest = Some(update);
        }
        latest
    }
}

impl UpdateReceiver for Consumer<StepSequencerUpdate> {
    fn pop(&mut self) -> Option<StepSequencerUpdate> {
        Consumer::pop(self).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishError {
    /// The consumer has not drained the ring buffer
    Full { sequence_index: usize },
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishError::Full { sequence_index } => write!(
                f,
                "update queue full, dropped step sequencer {} update",
                sequence_index
            ),
        }
    }
}

impl std::error::Error for PublishError {}

/// [`PatchSink`] that copies every committed gesture into a lock-free ring
/// buffer. Pushing never blocks or allocates; if the consumer falls behind
/// the update is dropped and counted.
pub struct RingPatchSink {
    tx: Producer<StepSequencerUpdate>,
    dropped: usize,
}

/// Create a sink and the consumer end for the realtime side.
pub fn channel(capacity: usize) -> (RingPatchSink, Consumer<StepSequencerUpdate>) {
    let (tx, rx) = RingBuffer::<StepSequencerUpdate>::new(capacity);
    (RingPatchSink { tx, dropped: 0 }, rx)
}

impl RingPatchSink {
    pub fn try_publish(
        &mut self,
        sequence_index: usize,
        storage: &StepSequencerStorage,
    ) -> Result<(), PublishError> {
        self.tx
            .push(StepSequencerUpdate {
                sequence_index,
                storage: *storage,
            })
            .map_err(|_| PublishError::Full { sequence_index })
    }

    /// Updates lost to a full buffer so far.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl PatchSink for RingPatchSink {
    fn mark_dirty(&mut self, sequence_index: usize, storage: &StepSequencerStorage) {
        if let Err(err) = self.try_publish(sequence_index, storage) {
            self.dropped += 1;
            warn!("{}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step_sequencer::{StepSequencerModel, UndoStack};

    #[test]
    fn committed_gesture_reaches_consumer() {
        let (mut sink, mut rx) = channel(4);
        let mut undo = UndoStack::new();
        let mut model = StepSequencerModel::new(1);
        {
            let mut edit = model.edit(&mut undo, &mut sink);
            edit.set_step(3, 0.75);
        }

        let update = rx.latest().expect("an update should be queued");
        assert_eq!(update.sequence_index, 1);
        assert_eq!(update.storage.steps[3], 0.75);
    }

    #[test]
    fn full_buffer_drops_and_counts() {
        let (mut sink, _rx) = channel(1);
        let storage = StepSequencerStorage::new();

        assert!(sink.try_publish(0, &storage).is_ok());
        assert_eq!(
            sink.try_publish(0, &storage),
            Err(PublishError::Full { sequence_index: 0 })
        );

        sink.mark_dirty(0, &storage);
        assert_eq!(sink.dropped(), 1);
    }
}
