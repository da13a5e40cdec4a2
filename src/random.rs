//! Randomness inbound interface. Seed management stays out of scope; only
//! drawing a uniform sample is.
//!
//! The teacher crate itself has no `rand` dependency, so this is grounded on
//! `rand` usage elsewhere in the pack (the `geometric-traits` and `tinyzkp`
//! example repos) rather than on the teacher.

use rand::Rng;
use rand::rngs::StdRng;

pub trait RandomSource {
    /// A uniform sample in `[0, 1)`.
    fn next_f64(&mut self) -> f64;
}

pub struct StdRandomSource {
    rng: StdRng,
}

impl StdRandomSource {
    pub fn new(rng: StdRng) -> Self {
        Self { rng }
    }
}

impl RandomSource for StdRandomSource {
    fn next_f64(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn samples_land_in_unit_interval() {
        let mut source = StdRandomSource::new(StdRng::seed_from_u64(7));
        for _ in 0..100 {
            let v = source.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }
}
