//! Jacobi-preconditioned conjugate gradient.
//!
//! Grounded on the CSR-based CG loop in the pack's sublinear-time-solver
//! reference (`optimized_solver.rs`: residual tracking, per-iteration spmv,
//! early exit on relative-residual tolerance); this version adds the Jacobi
//! preconditioner the B2B solve needs since the net-spring matrices can be
//! badly diagonally-scaled across block types.

use faer::Col;

use crate::E;
use crate::error::NumericStall;
use crate::linalg::sparse::Csr;
use crate::linalg::vector_ops::{axpy, cwise_multiply, dot, norm2};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CgStatus {
    Converged { iterations: usize },
    Stalled(NumericStall),
}

pub struct CgOutcome {
    pub x: Col<E>,
    pub status: CgStatus,
}

/// Solves `A x = b` for symmetric positive (semi-)definite `A`, given as a
/// [`Csr`] plus its diagonal (the diagonal is taken as a parameter rather
/// than recomputed from `mat` so the B2B builder, which already has the
/// diagonal entries handy from `SparseMatrix`, does not pay for a second
/// scan).
///
/// Never returns an error: on exceeding `max_iterations` without reaching
/// `epsilon` relative residual, the best iterate found is returned alongside
/// a [`CgStatus::Stalled`] marker, matching the non-fatal handling spec'd for
/// numeric stalls.
pub fn solve(mat: &Csr, diag: &[E], b: &Col<E>, epsilon: E, max_iterations: usize) -> CgOutcome {
    let n = mat.n();
    let b_norm = norm2(b.as_ref()).max(1e-300);

    let inv_diag = Col::<E>::from_fn(n, |i| if diag[i].abs() > 1e-14 { 1. / diag[i] } else { 1. });

    let mut x = Col::<E>::zeros(n);
    let mut r = b.clone();
    let mut z = cwise_multiply(r.as_ref(), inv_diag.as_ref());
    let mut p = z.clone();
    let mut rz = dot(r.as_ref(), z.as_ref());

    if r.as_ref().norm_l2() / b_norm <= epsilon {
        return CgOutcome {
            x,
            status: CgStatus::Converged { iterations: 0 },
        };
    }

    for it in 1..=max_iterations {
        let ap = mat.mat_vec(&p);
        let p_ap = dot(p.as_ref(), ap.as_ref());
        if p_ap.abs() < 1e-300 {
            return CgOutcome {
                x,
                status: CgStatus::Stalled(NumericStall {
                    iterations: it,
                    relative_residual: norm2(r.as_ref()) / b_norm,
                }),
            };
        }
        let alpha = rz / p_ap;

        axpy(alpha, p.as_ref(), &mut x);
        axpy(-alpha, ap.as_ref(), &mut r);

        let relative_residual = norm2(r.as_ref()) / b_norm;
        if relative_residual <= epsilon {
            return CgOutcome {
                x,
                status: CgStatus::Converged { iterations: it },
            };
        }

        z = cwise_multiply(r.as_ref(), inv_diag.as_ref());
        let rz_new = dot(r.as_ref(), z.as_ref());
        let beta = rz_new / rz;
        rz = rz_new;

        let mut new_p = z.clone();
        axpy(beta, p.as_ref(), &mut new_p);
        p = new_p;
    }

    CgOutcome {
        x,
        status: CgStatus::Stalled(NumericStall {
            iterations: max_iterations,
            relative_residual: norm2(r.as_ref()) / b_norm,
        }),
    }
}
