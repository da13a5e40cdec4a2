//! Bound-to-bound (B2B) net model and anchor pseudo-nets.
//!
//! Grounded on the bound-pin / star / clique net-decomposition pattern in
//! the pack's FPGA placer reference (`AnalyticWirelengthProblem`'s
//! mobile/fixed Hessian contributions and its `NetStrategy` enum of
//! decomposition strategies); adapted here to the fixed two-bound B2B rule:
//! every net always decomposes into a bound-bound spring between its two
//! extreme pins plus a bound-inner spring from every other pin to each
//! bound, rather than switching strategy per net size.

use std::ops::Range;

use faer::Col;

use crate::E;
use crate::blocks::BlockRegistry;
use crate::device::{Category, Device};
use crate::error::SolverDiagnostic;
use crate::linalg::cg;
use crate::linalg::sparse::SparseMatrix;
use crate::netlist::Net;
use crate::options::PlacerOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

#[allow(clippy::too_many_arguments)]
pub fn solve_axis(
    registry: &BlockRegistry,
    device: &dyn Device,
    nets: &[Net],
    best_legal: &[i32],
    linear: &Col<E>,
    axis: Axis,
    active: &Range<usize>,
    solve_mode: usize,
    first_solve: bool,
    pseudo_weight_factor: E,
    options: &PlacerOptions,
) -> Result<Col<E>, SolverDiagnostic> {
    let coords = effective_coords(registry, device, linear, best_legal, solve_mode, axis);

    let mut mat = SparseMatrix::new(active.len());
    let mut rhs = Col::<E>::zeros(active.len());

    for net in nets {
        let weight_mult = if !first_solve && options.timing_driven {
            net.timing_weight()
        } else {
            1.0
        };
        accumulate_net(
            &mut mat,
            &mut rhs,
            net,
            &coords,
            registry,
            solve_mode,
            active,
            options.delta_floor,
            weight_mult,
        );
    }

    if !first_solve {
        add_anchor_terms(
            &mut mat,
            &mut rhs,
            active,
            best_legal,
            linear,
            pseudo_weight_factor,
            options.delta_floor,
        );
    }

    mat.is_symmetric_and_finite()?;

    let diag = mat.diagonal();
    let csr = mat.to_csr();
    let outcome = cg::solve(&csr, &diag, &rhs, options.cg_epsilon, options.cg_max_iterations);
    // A CG stall is non-fatal: the best iterate found is used and the outer
    // loop continues, so the stall itself is not surfaced here. Callers that
    // want to observe it can inspect `outcome.status` in a future revision;
    // today there is no consumer for per-axis stall diagnostics beyond the
    // best iterate itself.
    Ok(outcome.x)
}

/// Reads each block's coordinate for this axis: the device's fixed position
/// for I/O, `bestLegal*` for a movable block outside the active range, and
/// the current real-valued position otherwise.
fn effective_coords(
    registry: &BlockRegistry,
    device: &dyn Device,
    linear: &Col<E>,
    best_legal: &[i32],
    solve_mode: usize,
    axis: Axis,
) -> Vec<E> {
    (0..registry.num_blocks())
        .map(|i| {
            if !registry.is_fixed_pin(i, solve_mode) {
                return linear[i];
            }
            if i < registry.num_io() {
                let (x, y) = device
                    .fixed_position(i)
                    .expect("I/O block must have a fixed device position");
                match axis {
                    Axis::X => x as E,
                    Axis::Y => y as E,
                }
            } else {
                best_legal[i] as E
            }
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn accumulate_net(
    mat: &mut SparseMatrix,
    rhs: &mut Col<E>,
    net: &Net,
    coords: &[E],
    registry: &BlockRegistry,
    solve_mode: usize,
    active: &Range<usize>,
    delta_floor: E,
    weight_mult: E,
) {
    let pins = net.pins();
    if pins.len() < 2 {
        return;
    }

    let mut min_k = 0usize;
    let mut max_k = 0usize;
    for k in 1..pins.len() {
        if coords[pins[k].block] < coords[pins[min_k].block] {
            min_k = k;
        }
        if coords[pins[k].block] > coords[pins[max_k].block] {
            max_k = k;
        }
    }
    let min_block = pins[min_k].block;
    let max_block = pins[max_k].block;

    let is_fixed = |b: usize| registry.is_fixed_pin(b, solve_mode);
    let k_pins = pins.len() as E;

    let bound_delta = (coords[max_block] - coords[min_block]).abs().max(delta_floor);
    let bound_weight = (2.0 / (k_pins - 1.0)) * (1.0 / bound_delta) * weight_mult;
    add_spring(mat, rhs, active, min_block, max_block, bound_weight, coords, is_fixed);

    for (k, pin) in pins.iter().enumerate() {
        if k == min_k || k == max_k {
            continue;
        }
        let p = pin.block;

        let d_min = (coords[p] - coords[min_block]).abs().max(delta_floor);
        let w_min = (2.0 / (k_pins - 1.0)) * (1.0 / d_min) * weight_mult;
        add_spring(mat, rhs, active, p, min_block, w_min, coords, is_fixed);

        let d_max = (coords[p] - coords[max_block]).abs().max(delta_floor);
        let w_max = (2.0 / (k_pins - 1.0)) * (1.0 / d_max) * weight_mult;
        add_spring(mat, rhs, active, p, max_block, w_max, coords, is_fixed);
    }
}

/// Adds one spring's contribution to the system. A spring between two fixed
/// endpoints contributes nothing — no movable unknown touches it — which is
/// exactly the degenerate fixed–fixed skip the bound-inner construction
/// calls for when an inner pin coincides with an already-fixed extreme; no
/// separate dedup bookkeeping is needed to realize it.
fn add_spring(
    mat: &mut SparseMatrix,
    rhs: &mut Col<E>,
    active: &Range<usize>,
    a: usize,
    b: usize,
    weight: E,
    coords: &[E],
    is_fixed: impl Fn(usize) -> bool,
) {
    match (is_fixed(a), is_fixed(b)) {
        (false, false) => {
            let la = a - active.start;
            let lb = b - active.start;
            mat.add(la, la, weight);
            mat.add(lb, lb, weight);
            mat.add(la, lb, -weight);
            mat.add(lb, la, -weight);
        }
        (false, true) => {
            let la = a - active.start;
            mat.diag_add(la, weight);
            rhs[la] += weight * coords[b];
        }
        (true, false) => {
            let lb = b - active.start;
            mat.diag_add(lb, weight);
            rhs[lb] += weight * coords[a];
        }
        (true, true) => {}
    }
}

fn add_anchor_terms(
    mat: &mut SparseMatrix,
    rhs: &mut Col<E>,
    active: &Range<usize>,
    best_legal: &[i32],
    linear: &Col<E>,
    pseudo_weight_factor: E,
    delta_floor: E,
) {
    for g in active.clone() {
        let local = g - active.start;
        let anchor = best_legal[g] as E;
        let delta = (anchor - linear[g]).abs().max(delta_floor);
        let w = 2.0 * pseudo_weight_factor / delta;
        mat.diag_add(local, w);
        rhs[local] += w * anchor;
    }
}
