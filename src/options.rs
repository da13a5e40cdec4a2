//! Session configuration.
//!
//! A plain struct with `Default` and `with_*` builder setters, in the style
//! of the teacher's `QPSolverBuilder`, rather than the teacher's dynamic
//! `SolverOptions` proc-macro registry (`explicit_options!`/`build_options!`)
//! — see DESIGN.md for why that machinery isn't carried over: this crate has
//! a small, fixed set of knobs known at compile time, so the registry's
//! runtime type-erased lookup buys nothing here.

use crate::E;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacerOptions {
    /// Relative residual tolerance for the conjugate-gradient solves.
    pub cg_epsilon: E,
    /// Iteration cap per conjugate-gradient solve.
    pub cg_max_iterations: usize,
    /// Floor applied to any bound-to-bound or anchor distance before taking
    /// its reciprocal, to keep spring weights finite.
    pub delta_floor: E,
    /// Growth rate applied to `pseudoWeightFactor` (`alpha`) across the main
    /// iteration loop.
    pub pseudo_weight_growth: E,
    /// Whether to multiply spring weights by `net.timing_weight()` on
    /// non-initial solves.
    pub timing_driven: bool,
    /// Whether the initial legalization pass (and, per the schedule, every
    /// subsequent one) should also re-distribute I/O blocks over the
    /// perimeter.
    pub legalize_io: bool,
    /// Number of anchor-free solve/legalize warm-up iterations before the
    /// main schedule begins.
    pub warmup_iterations: usize,
    /// `tileCapacitySchedule`: the tile-capacity slack for each main-schedule
    /// iteration, in order. A non-increasing sequence `≥ 1.0` ending at
    /// exactly `1.0`, so the final committed placement is strictly legal.
    /// Its length is the number of main-schedule iterations.
    pub tile_capacity_schedule: Vec<f64>,
}

/// `tileCapacitySchedule`'s default shape: a linear decay from just over
/// `1.0` down to exactly `1.0` over `main_iterations` steps, relaxing
/// occupancy overshoot early on and tightening for the final pass.
fn default_tile_capacity_schedule(main_iterations: usize) -> Vec<f64> {
    if main_iterations <= 1 {
        return vec![1.0; main_iterations];
    }
    (0..main_iterations)
        .map(|nit| {
            if nit + 1 >= main_iterations {
                1.0
            } else {
                let remaining = (main_iterations - 1 - nit) as f64;
                1.0 + remaining / (main_iterations - 1) as f64
            }
        })
        .collect()
}

impl Default for PlacerOptions {
    fn default() -> Self {
        Self {
            cg_epsilon: 1e-4,
            cg_max_iterations: 200,
            delta_floor: 0.005,
            pseudo_weight_growth: 0.3,
            timing_driven: false,
            legalize_io: true,
            warmup_iterations: 7,
            tile_capacity_schedule: default_tile_capacity_schedule(30),
        }
    }
}

impl PlacerOptions {
    pub fn with_cg_epsilon(mut self, cg_epsilon: E) -> Self {
        self.cg_epsilon = cg_epsilon;
        self
    }

    pub fn with_cg_max_iterations(mut self, cg_max_iterations: usize) -> Self {
        self.cg_max_iterations = cg_max_iterations;
        self
    }

    pub fn with_delta_floor(mut self, delta_floor: E) -> Self {
        self.delta_floor = delta_floor;
        self
    }

    pub fn with_pseudo_weight_growth(mut self, pseudo_weight_growth: E) -> Self {
        self.pseudo_weight_growth = pseudo_weight_growth;
        self
    }

    pub fn with_timing_driven(mut self, timing_driven: bool) -> Self {
        self.timing_driven = timing_driven;
        self
    }

    pub fn with_legalize_io(mut self, legalize_io: bool) -> Self {
        self.legalize_io = legalize_io;
        self
    }

    /// Replaces the tile-capacity schedule outright, and with it the number
    /// of main-schedule iterations (`tile_capacity_schedule.len()`).
    pub fn with_tile_capacity_schedule(mut self, tile_capacity_schedule: Vec<f64>) -> Self {
        self.tile_capacity_schedule = tile_capacity_schedule;
        self
    }

    /// Convenience over [`Self::with_tile_capacity_schedule`]: keeps the
    /// default linear-decay shape but runs it over `main_iterations` steps.
    pub fn with_main_iterations(mut self, main_iterations: usize) -> Self {
        self.tile_capacity_schedule = default_tile_capacity_schedule(main_iterations);
        self
    }

    pub fn main_iterations(&self) -> usize {
        self.tile_capacity_schedule.len()
    }

    /// The tile-capacity slack for main-schedule iteration `nit` (0-based).
    /// Clamps to the schedule's last entry past its end, rather than
    /// panicking, since `placer.rs` only ever calls this within
    /// `0..main_iterations()`.
    pub fn tile_capacity_for_iteration(&self, nit: usize) -> f64 {
        self.tile_capacity_schedule
            .get(nit)
            .copied()
            .or_else(|| self.tile_capacity_schedule.last().copied())
            .unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_capacity_reaches_one_at_final_iteration() {
        let options = PlacerOptions::default();
        let last = options.main_iterations() - 1;
        assert_eq!(options.tile_capacity_for_iteration(last), 1.0);
        assert!(options.tile_capacity_for_iteration(0) >= 1.0);
    }

    #[test]
    fn with_tile_capacity_schedule_drives_main_iterations() {
        let options = PlacerOptions::default().with_tile_capacity_schedule(vec![1.5, 1.2, 1.0]);
        assert_eq!(options.main_iterations(), 3);
        assert_eq!(options.tile_capacity_for_iteration(0), 1.5);
        assert_eq!(options.tile_capacity_for_iteration(2), 1.0);
    }

    #[test]
    fn with_main_iterations_rebuilds_the_default_decay_shape() {
        let options = PlacerOptions::default().with_main_iterations(5);
        assert_eq!(options.main_iterations(), 5);
        assert_eq!(options.tile_capacity_for_iteration(4), 1.0);
    }
}
