#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
LFO Envelope (DAHDSR)
=====================

Every LFO carries its own envelope that scales the waveform. It runs at
block rate: one `advance` per processing block, never per sample. That is
all a display needs, and it matches how the engine runs its modulators.

Vocabulary
----------

  stage       Which phase the envelope is in: Delay, Attack, Hold, Decay,
              Sustain, Release, or Finished.

  stage time  log2 seconds. A stage at its minimum time is skipped outright
              when the envelope is triggered.

  phase       Progress through the current stage, 0.0 → 1.0. Each block adds
              block_size / sample_rate * 2^-time (times the tempo ratio when
              the stage is tempo-synced).

  level       The envelope output, 0.0 to 1.0.


The Shape
---------

  Level
    1.0 ┐      ╱‾‾‾‾╲
        │     ╱      ╲
    S   │    ╱        ╲_________
        │   ╱                   ╲
    0.0 └──╱─────────────────────╲──→ Time
        Delay Att Hold Decay Sustain Release


The State Machine
-----------------

    Delay ─→ Attack ─→ Hold ─→ Decay ─→ Sustain
                                           │ release()
                                           ↓
                                        Release ─→ Finished

Sustain and Finished are resting stages: `advance` leaves them alone.
`release()` may be called from any stage; release always starts from the
current level. A release time at its maximum means "never release", and
`release()` reports that it did nothing.
*/

/// A stage duration as log2 seconds, optionally tempo-synced.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeTime {
    pub value: f32,
    pub temposync: bool,
}

impl EnvelopeTime {
    /// Shortest stage time. Stages at this value are skipped on attack.
    pub const MIN: f32 = -8.0;
    /// Longest stage time. A release at this value holds forever.
    pub const MAX: f32 = 5.0;

    pub const fn new(value: f32) -> Self {
        Self {
            value,
            temposync: false,
        }
    }

    pub const fn min() -> Self {
        Self::new(Self::MIN)
    }

    pub const fn synced(mut self) -> Self {
        self.temposync = true;
        self
    }

    /// Duration in seconds, ignoring tempo sync.
    pub fn seconds(&self) -> f32 {
        self.value.exp2()
    }

    pub fn is_min(&self) -> bool {
        self.value <= Self::MIN
    }

    pub fn is_max(&self) -> bool {
        self.value >= Self::MAX
    }
}

/// Delay/attack/hold/decay/sustain/release settings of an LFO envelope.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dahdsr {
    pub delay: EnvelopeTime,
    pub attack: EnvelopeTime,
    pub hold: EnvelopeTime,
    pub decay: EnvelopeTime,
    /// Linear level, 0.0 to 1.0
    pub sustain: f32,
    pub release: EnvelopeTime,
}

impl Dahdsr {
    /// Sum of delay, attack, hold and decay in seconds.
    pub fn onset_seconds(&self) -> f32 {
        self.delay.seconds() + self.attack.seconds() + self.hold.seconds() + self.decay.seconds()
    }

    pub fn any_temposync(&self) -> bool {
        self.delay.temposync
            || self.attack.temposync
            || self.hold.temposync
            || self.decay.temposync
            || self.release.temposync
    }
}

impl Default for Dahdsr {
    fn default() -> Self {
        Self {
            delay: EnvelopeTime::min(),
            attack: EnvelopeTime::min(),
            hold: EnvelopeTime::min(),
            decay: EnvelopeTime::new(0.0),
            sustain: 1.0,
            release: EnvelopeTime::min(),
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Delay,
    Attack,
    Hold,
    Decay,
    Sustain,  // Holding at sustain level until released
    Release,  // Ramping from the release start level to 0
    Finished, // Never triggered, or release completed
}

pub struct LfoEnvelope {
    stage: EnvelopeStage,
    phase: f32,
    level: f32,
    release_start: f32,
}

impl LfoEnvelope {
    /// An envelope that has not been triggered reads as finished.
    pub fn new() -> Self {
        Self {
            stage: EnvelopeStage::Finished,
            phase: 0.0,
            level: 0.0,
            release_start: 0.0,
        }
    }

    /// Gate high: restart from the first stage whose time is not minimal.
    pub fn attack(&mut self, settings: &Dahdsr) {
        self.level = 0.0;
        self.phase = 0.0;
        self.stage = EnvelopeStage::Delay;

        if settings.delay.is_min() {
            self.stage = EnvelopeStage::Attack;

            if settings.attack.is_min() {
                self.stage = EnvelopeStage::Hold;
                self.level = 1.0;

                if settings.hold.is_min() {
                    self.stage = EnvelopeStage::Decay;
                }
            }
        }
    }

    /// Gate low: start releasing from the current level.
    ///
    /// Returns false when the release time is at its maximum, in which case
    /// the envelope keeps its current stage.
    pub fn release(&mut self, settings: &Dahdsr) -> bool {
        if settings.release.is_max() {
            return false;
        }

        self.release_start = self.level;
        self.phase = 0.0;
        self.stage = EnvelopeStage::Release;
        true
    }

    /// Advance by one processing block.
    ///
    /// `block_rate` is block_size / sample_rate; `tempo_ratio` scales
    /// tempo-synced stages.
    pub fn advance(&mut self, settings: &Dahdsr, block_rate: f32, tempo_ratio: f32) {
        let time = match self.stage {
            EnvelopeStage::Delay => settings.delay,
            EnvelopeStage::Attack => settings.attack,
            EnvelopeStage::Hold => settings.hold,
            EnvelopeStage::Decay => settings.decay,
            EnvelopeStage::Release => settings.release,
            EnvelopeStage::Sustain | EnvelopeStage::Finished => return,
        };

        let mut increment = block_rate * (-time.value).exp2();
        if time.temposync {
            increment *= tempo_ratio;
        }
        self.phase += increment;

        if self.phase > 1.0 {
            self.phase = 0.0;
            self.stage = match self.stage {
                EnvelopeStage::Delay => EnvelopeStage::Attack,
                EnvelopeStage::Attack => EnvelopeStage::Hold,
                EnvelopeStage::Hold => EnvelopeStage::Decay,
                EnvelopeStage::Decay => {
                    self.level = settings.sustain;
                    EnvelopeStage::Sustain
                }
                EnvelopeStage::Release => {
                    self.level = 0.0;
                    EnvelopeStage::Finished
                }
                resting => resting,
            };
        }

        match self.stage {
            EnvelopeStage::Delay => self.level = 0.0,
            EnvelopeStage::Attack => self.level = self.phase,
            EnvelopeStage::Hold => self.level = 1.0,
            EnvelopeStage::Decay => {
                self.level = (1.0 - self.phase) + self.phase * settings.sustain;
            }
            EnvelopeStage::Release => {
                self.level = (1.0 - self.phase) * self.release_start;
            }
            EnvelopeStage::Sustain | EnvelopeStage::Finished => {}
        }
    }

    /// Get the current envelope level (0.0 to 1.0)
    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }
}

impl Default for LfoEnvelope {
    fn default() -> Self {
        Self::new()
    }
}
