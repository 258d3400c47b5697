//! Seeded noise for scatter and texture brushes.

use std::sync::atomic::{AtomicU32, Ordering};

/// Generate a seed for a new brush instance.
/// Counter + hash, so it works the same on every platform including WASM.
pub(crate) fn next_brush_seed() -> u32 {
    static SEED_COUNTER: AtomicU32 = AtomicU32::new(1);
    mix(SEED_COUNTER.fetch_add(1, Ordering::Relaxed).wrapping_mul(0x9E37_79B9))
}

fn mix(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x85EB_CA6B);
    x ^= x >> 13;
    x = x.wrapping_mul(0xC2B2_AE35);
    x ^= x >> 16;
    x
}

/// Splitmix32 generator.
#[derive(Debug, Clone)]
pub struct Noise {
    state: u32,
}

impl Noise {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x9E37_79B9);
        mix(self.state)
    }

    /// Uniform value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.next_u32() as f64 / (u32::MAX as f64 + 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = Noise::new(42);
        let mut b = Noise::new(42);
        for _ in 0..16 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn test_unit_range() {
        let mut noise = Noise::new(7);
        for _ in 0..1000 {
            let v = noise.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_brush_seeds_differ() {
        assert_ne!(next_brush_seed(), next_brush_seed());
    }
}
