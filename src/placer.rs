//! Placement loop (C7): the exact schedule of spec.md §4.5 — a random
//! seed, `N_init` anchor-free solves, one initializing legalization, then
//! `N_main` solve/legalize cycles with `solveMode` rotation and
//! `pseudoWeightFactor` growth, finishing with a commit of `bestLegal*` to
//! the device.
//!
//! Carries the teacher's driver shape from
//! `nlp::ipm::InteriorPointMethod::solve`: a bounded `for` loop invoking a
//! [`Callback`] once per iteration and returning a status enum, the
//! placement analogue of the teacher's `Status`.

use faer::Col;

use crate::E;
use crate::blocks::BlockRegistry;
use crate::callback::{Callback, IterationReport};
use crate::cost::CostCalculator;
use crate::device::{Device, require_block_types};
use crate::error::{ConfigurationError, PlacementIntegrityError};
use crate::legalize::Legalizer;
use crate::netlist::Net;
use crate::options::PlacerOptions;
use crate::random::RandomSource;
use crate::solve;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementStatus {
    /// The full schedule ran to completion and the best legal placement was
    /// committed to the device.
    Committed,
}

pub struct PlacementSession {
    registry: BlockRegistry,
    linear_x: Col<E>,
    linear_y: Col<E>,
    legalizer: Legalizer,
    options: PlacerOptions,
}

impl PlacementSession {
    /// Seeds `linearX/Y` with uniform random values in `[1, W-1] x [1, H-1]`
    /// for movable blocks (fixed I/O positions come straight from the
    /// device), per spec.md §4.5 step 1.
    ///
    /// Fails with `ConfigurationError::MissingBlockType` if `device` has no
    /// site lattice for one of `registry`'s movable categories — checked
    /// up front so a bad device/registry pairing never silently falls back
    /// to a `(1, 1)` lattice default deep inside the legalizer.
    pub fn new(
        registry: BlockRegistry,
        device: &dyn Device,
        rng: &mut dyn RandomSource,
        options: PlacerOptions,
    ) -> Result<Self, ConfigurationError> {
        require_block_types(device, registry.categories())?;

        let n = registry.num_blocks();
        let num_io = registry.num_io();
        let w = device.width();
        let h = device.height();

        let linear_x = Col::from_fn(n, |i| {
            if i < num_io {
                device.fixed_position(i).unwrap_or((0, 0)).0 as E
            } else {
                1.0 + rng.next_f64() * ((w - 2).max(1) as E)
            }
        });
        let linear_y = Col::from_fn(n, |i| {
            if i < num_io {
                device.fixed_position(i).unwrap_or((0, 0)).1 as E
            } else {
                1.0 + rng.next_f64() * ((h - 2).max(1) as E)
            }
        });

        let mut legalizer = Legalizer::new(n);
        legalizer.seed_from_linear(&registry, device, &linear_x, &linear_y);

        Ok(Self {
            registry,
            linear_x,
            linear_y,
            legalizer,
            options,
        })
    }

    pub fn best_legal_x(&self) -> &[i32] {
        self.legalizer.best_legal_x()
    }

    pub fn best_legal_y(&self) -> &[i32] {
        self.legalizer.best_legal_y()
    }

    pub fn best_cost(&self) -> f64 {
        self.legalizer.best_cost()
    }

    /// Runs the full placement schedule and commits `bestLegal*` to
    /// `device`.
    pub fn run(
        &mut self,
        device: &mut dyn Device,
        nets: &[Net],
        cost_calc: &dyn CostCalculator,
        callback: &mut dyn Callback,
    ) -> Result<PlacementStatus, PlacementIntegrityError> {
        // Step 2: N_init anchor-free solves at solve_mode 0.
        for nit in 0..self.options.warmup_iterations {
            self.try_solve(device, nets, 0, true, 0.0, callback);
            callback.call(&IterationReport {
                nit,
                solve_mode: 0,
                pseudo_weight_factor: 0.0,
                best_cost: self.legalizer.best_cost(),
            });
        }

        // Step 3: one legalization at solve_mode 0 to initialize anchors.
        let mut best_cost = self.legalizer.legalize(
            &self.registry,
            device,
            &self.linear_x,
            &self.linear_y,
            1.0,
            self.options.legalize_io,
            cost_calc,
        )?;

        // Step 4: the main schedule. solve_mode and pseudo_weight_factor
        // carry across iterations exactly as spec.md §4.5 describes, rather
        // than being derived fresh from the iteration index.
        let num_modes = self.registry.num_types() + 1;
        let mut solve_mode = 0usize;
        let mut pseudo_weight_factor: E = 0.0;

        for main_nit in 0..self.options.main_iterations() {
            solve_mode = (solve_mode + 1) % num_modes;
            if solve_mode <= 1 {
                pseudo_weight_factor += self.options.pseudo_weight_growth;
            }

            self.try_solve(device, nets, solve_mode, false, pseudo_weight_factor, callback);

            let tile_capacity = self.options.tile_capacity_for_iteration(main_nit);
            best_cost = self.legalizer.legalize(
                &self.registry,
                device,
                &self.linear_x,
                &self.linear_y,
                tile_capacity,
                false,
                cost_calc,
            )?;

            callback.call(&IterationReport {
                nit: self.options.warmup_iterations + main_nit,
                solve_mode,
                pseudo_weight_factor,
                best_cost,
            });
        }

        self.commit(device)?;
        Ok(PlacementStatus::Committed)
    }

    #[allow(clippy::too_many_arguments)]
    fn try_solve(
        &mut self,
        device: &dyn Device,
        nets: &[Net],
        solve_mode: usize,
        first_solve: bool,
        pseudo_weight_factor: E,
        callback: &mut dyn Callback,
    ) {
        // A `SolverDiagnostic` is non-fatal per spec.md §7: the solve is
        // aborted and this iteration's linear positions are left
        // unchanged; the outer loop naturally reattempts next cycle. It is
        // still reported to the callback rather than silently dropped.
        if let Err(diagnostic) = solve::solve(
            &self.registry,
            device,
            nets,
            self.legalizer.best_legal_x(),
            self.legalizer.best_legal_y(),
            &mut self.linear_x,
            &mut self.linear_y,
            solve_mode,
            first_solve,
            pseudo_weight_factor,
            &self.options,
        ) {
            callback.on_diagnostic(diagnostic);
        }
    }

    fn commit(&self, device: &mut dyn Device) -> Result<(), PlacementIntegrityError> {
        for i in self.registry.num_io()..self.registry.num_blocks() {
            let x = self.legalizer.best_legal_x()[i];
            let y = self.legalizer.best_legal_y()[i];
            device.set_position(i, x, y)?;
        }
        Ok(())
    }
}
