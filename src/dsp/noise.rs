/// PCG32 pseudo-random number generator.
///
/// Display simulations seed it with a fixed value so the same settings
/// always draw the same noise curve.
#[derive(Clone, Copy, Debug)]
pub struct Rng {
    state: u64,
}

impl Rng {
    /// Seed used by every display-time simulation.
    pub const DISPLAY_SEED: u64 = 46;

    pub const fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(0x2C9277B5_27D4EB2D_u64),
        }
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        let old_state = self.state;
        self.state = old_state
            .wrapping_mul(6364136223846793005_u64)
            .wrapping_add(1442695040888963407_u64);

        let xor_shifted = (((old_state >> 18) ^ old_state) >> 27) as u32;
        let rot = (old_state >> 59) as u32;
        xor_shifted.rotate_right(rot)
    }

    /// Uniform f32 in [-1.0, 1.0].
    #[inline]
    pub fn next_bipolar(&mut self) -> f32 {
        let normalized = ((self.next_u32() >> 8) as f32) / 16_777_215.0;
        normalized * 2.0 - 1.0
    }
}

impl Default for Rng {
    fn default() -> Self {
        Self::new(Self::DISPLAY_SEED)
    }
}

/// Second-order correlated noise.
///
/// `correlation` near +1 gives slow, smooth wandering; near -1 gives
/// jittery, alternating values; 0 is plain white noise. The output is
/// rescaled so its spread stays roughly constant across correlations.
#[derive(Clone, Copy, Debug, Default)]
pub struct CorrelatedNoise {
    last: f32,
    last2: f32,
}

impl CorrelatedNoise {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.last = 0.0;
        self.last2 = 0.0;
    }

    pub fn next(&mut self, correlation: f32, rng: &mut Rng) -> f32 {
        let wf = correlation.clamp(-1.0, 1.0) * 0.9;
        let wf_abs = wf.abs();
        let gain = 1.0 / (1.0 - wf_abs).sqrt();

        self.last2 = rng.next_bipolar() * (1.0 - wf_abs) - wf * self.last2;
        self.last = self.last2 * (1.0 - wf_abs) - wf * self.last;
        self.last * gain
    }
}
