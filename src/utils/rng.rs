//! Seeded random number generation.
//!
//! A small xorshift PRNG used for weight initialisation and synthetic inputs,
//! so that every demo and test is reproducible from a single `u64` seed.

/// Xorshift64 generator.
pub struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    /// Create a new RNG with explicit seed (if zero, use a fixed value).
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 0x9e3779b97f4a7c15 } else { seed };
        Self { state }
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        (x >> 32) as u32
    }

    /// Uniform sample in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Uniform sample in [low, high).
    pub fn gen_range_f32(&mut self, low: f32, high: f32) -> f32 {
        low + (high - low) * self.next_f32()
    }

    /// Overwrite every element of `data` with a sample from [low, high).
    pub fn fill_uniform(&mut self, data: &mut [f32], low: f32, high: f32) {
        for value in data.iter_mut() {
            *value = self.gen_range_f32(low, high);
        }
    }

    /// `len` samples from [low, high).
    pub fn uniform_vec(&mut self, len: usize, low: f32, high: f32) -> Vec<f32> {
        let mut data = vec![0.0f32; len];
        self.fill_uniform(&mut data, low, high);
        data
    }
}
