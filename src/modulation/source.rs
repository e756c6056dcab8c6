use crate::dsp::envelope::EnvelopeStage;

/// A block-rate modulation source the waveform sampler can drive.
///
/// The sampler calls [`attack`](Self::attack) once, then
/// [`process_block`](Self::process_block) repeatedly, reading
/// [`output`](Self::output) after every block. When the source reports
/// [`EnvelopeStage::Sustain`] for the first time, the sampler holds it for a
/// while and then calls [`release`](Self::release).
pub trait ModulationSource {
    /// Gate on: reset the phase and start the envelope.
    fn attack(&mut self);

    /// Gate off: start the envelope release.
    fn release(&mut self);

    /// Advance by one processing block.
    fn process_block(&mut self);

    /// Output after the last processed block, envelope and magnitude
    /// applied.
    fn output(&self) -> f32;

    /// Envelope level after the last processed block, 0..1.
    fn envelope_value(&self) -> f32;

    fn envelope_stage(&self) -> EnvelopeStage;

    /// Whether the envelope contributes to [`output`](Self::output).
    fn uses_envelope(&self) -> bool {
        true
    }
}

impl<S: ModulationSource + ?Sized> ModulationSource for Box<S> {
    fn attack(&mut self) {
        (**self).attack()
    }

    fn release(&mut self) {
        (**self).release()
    }

    fn process_block(&mut self) {
        (**self).process_block()
    }

    fn output(&self) -> f32 {
        (**self).output()
    }

    fn envelope_value(&self) -> f32 {
        (**self).envelope_value()
    }

    fn envelope_stage(&self) -> EnvelopeStage {
        (**self).envelope_stage()
    }

    fn uses_envelope(&self) -> bool {
        (**self).uses_envelope()
    }
}
