//! Force solvers for the n-body engine
//!
//! Both solvers implement [`ForceSolver`]: given a state and the physical
//! parameters, produce one acceleration per body. Integrators and the
//! engine only ever see the trait, so any solver pairs with any integrator.
//!
//! - [`DirectSolver`]: exact O(N^2) pairwise sum
//! - [`BarnesHutSolver`]: octree approximation controlled by `theta`

use log::trace;

use crate::configuration::config::SolverConfig;
use crate::simulation::error::{SimError, SimResult};
use crate::simulation::octree::{Bounds, Octree};
use crate::simulation::params::Gravity;
use crate::simulation::states::{check_finite, NVec3, SystemState};

/// Softened Newtonian acceleration toward a source of mass `m` at offset `r`
/// (source position minus target position):
///
/// `G * m * r / (|r|^2 + eps^2)^(3/2)`
///
/// With `eps2 == 0` and `r == 0` this is NaN; callers surface that as a
/// numerical failure rather than hiding it.
#[inline]
pub fn pair_acceleration(r: NVec3, m: f64, g: f64, eps2: f64) -> NVec3 {
    let d2 = r.norm_squared() + eps2;
    let inv_r = d2.sqrt().recip();
    let inv_r3 = inv_r * inv_r * inv_r;
    (g * m * inv_r3) * r
}

/// Common contract of every force solver.
///
/// Implementors provide [`ForceSolver::evaluate`]; callers use
/// [`ForceSolver::accelerations_into`] or [`ForceSolver::compute_accelerations`],
/// which add the parameter and state checks and reject non-finite output.
/// Solvers never mutate the state and keep nothing between calls.
pub trait ForceSolver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Write the acceleration of body `i` into `out[i]` for every body.
    /// `out` has the same length as the state and may hold stale values.
    fn evaluate(&self, state: &SystemState, gravity: &Gravity, out: &mut [NVec3]);

    /// Checked evaluation into a caller-owned buffer.
    fn accelerations_into(&self, state: &SystemState, gravity: &Gravity, out: &mut [NVec3]) -> SimResult<()> {
        gravity.validate()?;
        state.validate()?;
        check_finite("position", state.positions())?;
        if out.len() != state.len() {
            return Err(SimError::BufferLength {
                expected: state.len(),
                got: out.len(),
            });
        }

        self.evaluate(state, gravity, out);
        check_finite("acceleration", out)
    }

    /// Checked evaluation into a fresh vector.
    fn compute_accelerations(&self, state: &SystemState, gravity: &Gravity) -> SimResult<Vec<NVec3>> {
        let mut out = vec![NVec3::zeros(); state.len()];
        self.accelerations_into(state, gravity, &mut out)?;
        Ok(out)
    }
}

/// Build the solver selected in configuration.
pub fn make_solver(kind: SolverConfig, theta: f64) -> SimResult<Box<dyn ForceSolver>> {
    Ok(match kind {
        SolverConfig::Direct => Box::new(DirectSolver),
        SolverConfig::BarnesHut => Box::new(BarnesHutSolver::new(theta)?),
    })
}

// =========================================================================================
// Direct summation
// =========================================================================================

/// Exact pairwise gravity, Θ(N^2).
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectSolver;

impl ForceSolver for DirectSolver {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn evaluate(&self, state: &SystemState, gravity: &Gravity, out: &mut [NVec3]) {
        out.fill(NVec3::zeros());

        let x = state.positions();
        let m = state.masses();
        let eps2 = gravity.eps2();
        let n = x.len();

        // Each unordered pair once; i is pulled along +r, j along -r
        for i in 0..n {
            for j in (i + 1)..n {
                let r = x[j] - x[i];
                let d2 = r.norm_squared() + eps2;
                let inv_r = d2.sqrt().recip();
                let coef = gravity.G * inv_r * inv_r * inv_r;

                out[i] += (coef * m[j]) * r;
                out[j] -= (coef * m[i]) * r;
            }
        }
    }
}

// =========================================================================================
// Barnes-Hut
// =========================================================================================

/// Gravity evaluated through an [`Octree`] rebuilt on every call.
///
/// `theta` trades accuracy for speed: small values open almost every node
/// (Direct-like cost and accuracy), large values accept coarse aggregates.
#[derive(Debug, Clone, Copy)]
pub struct BarnesHutSolver {
    theta: f64,
}

impl BarnesHutSolver {
    pub fn new(theta: f64) -> SimResult<Self> {
        if theta > 0.0 && theta.is_finite() {
            Ok(Self { theta })
        } else {
            Err(SimError::InvalidTheta(theta))
        }
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }
}

impl ForceSolver for BarnesHutSolver {
    fn name(&self) -> &'static str {
        "barnes-hut"
    }

    fn evaluate(&self, state: &SystemState, gravity: &Gravity, out: &mut [NVec3]) {
        let x = state.positions();
        let m = state.masses();

        // build completes before any walk starts; the walks only read it
        let tree = Octree::build(state, Bounds::enclosing(x));
        trace!(
            "barnes-hut tree: {} bodies, {} nodes, depth {}",
            x.len(),
            tree.node_count(),
            tree.depth()
        );

        for (i, a) in out.iter_mut().enumerate() {
            *a = tree.acceleration_on(i, x, m, gravity, self.theta);
        }
    }
}
