//! Linear system builder + solver driver (C5).

mod b2b;

use faer::Col;

use crate::E;
use crate::blocks::BlockRegistry;
use crate::device::Device;
use crate::error::SolverDiagnostic;
use crate::netlist::Net;
use crate::options::PlacerOptions;

/// Re-solves the active axis ranges for `solve_mode`, writing the result
/// back into `linear_x`/`linear_y` in place. Returns `Err` without mutating
/// either vector if either axis's assembled matrix fails the
/// symmetric-and-finite check — the caller skips the rest of this
/// iteration, per the non-fatal `SolverDiagnostic` handling.
#[allow(clippy::too_many_arguments)]
pub fn solve(
    registry: &BlockRegistry,
    device: &dyn Device,
    nets: &[Net],
    best_legal_x: &[i32],
    best_legal_y: &[i32],
    linear_x: &mut Col<E>,
    linear_y: &mut Col<E>,
    solve_mode: usize,
    first_solve: bool,
    pseudo_weight_factor: E,
    options: &PlacerOptions,
) -> Result<(), SolverDiagnostic> {
    let active = registry.active_range(solve_mode);

    let x_solution = b2b::solve_axis(
        registry,
        device,
        nets,
        best_legal_x,
        linear_x,
        b2b::Axis::X,
        &active,
        solve_mode,
        first_solve,
        pseudo_weight_factor,
        options,
    )?;
    let y_solution = b2b::solve_axis(
        registry,
        device,
        nets,
        best_legal_y,
        linear_y,
        b2b::Axis::Y,
        &active,
        solve_mode,
        first_solve,
        pseudo_weight_factor,
        options,
    )?;

    for local in 0..x_solution.nrows() {
        linear_x[active.start + local] = x_solution[local];
    }
    for local in 0..y_solution.nrows() {
        linear_y[active.start + local] = y_solution[local];
    }

    Ok(())
}
