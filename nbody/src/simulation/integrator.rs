//! Fixed-step time integrators for the N-body system
//!
//! Both integrators implement [`Integrator`] and drive any [`ForceSolver`]:
//! - [`Euler`]: explicit first order, one force evaluation per step
//! - [`Leapfrog`]: velocity-Verlet kick-drift-kick, second order and
//!   symplectic, two force evaluations per step
//!
//! Steps update the state in place and advance `state.t`. An error leaves
//! the state partially updated; it must not be stepped again.

use crate::configuration::config::IntegratorConfig;
use crate::simulation::error::SimResult;
use crate::simulation::forces::ForceSolver;
use crate::simulation::params::{validate_dt, Gravity};
use crate::simulation::states::{NVec3, SystemState};

pub trait Integrator: Send {
    fn name(&self) -> &'static str;

    /// Advance `state` by `dt`.
    fn step(&mut self, state: &mut SystemState, solver: &dyn ForceSolver, gravity: &Gravity, dt: f64) -> SimResult<()>;

    /// Number of solver calls made by one [`Integrator::step`].
    fn evaluations_per_step(&self) -> usize;

    /// Velocities to use for diagnostics after a completed step.
    fn synchronized_velocities<'a>(&'a self, state: &'a SystemState) -> &'a [NVec3] {
        state.velocities()
    }
}

/// Build the integrator selected in configuration.
pub fn make_integrator(kind: IntegratorConfig) -> Box<dyn Integrator> {
    match kind {
        IntegratorConfig::Euler => Box::new(Euler::default()),
        IntegratorConfig::Leapfrog => Box::new(Leapfrog::default()),
    }
}

/// Resize a scratch buffer to `n` entries without shrinking its capacity.
fn fit(buf: &mut Vec<NVec3>, n: usize) {
    buf.resize(n, NVec3::zeros());
}

// =========================================================================================
// Euler
// =========================================================================================

/// Explicit Euler. Energy error grows without bound for any dt > 0.
#[derive(Debug, Default)]
pub struct Euler {
    acc: Vec<NVec3>,
}

impl Integrator for Euler {
    fn name(&self) -> &'static str {
        "euler"
    }

    fn step(&mut self, state: &mut SystemState, solver: &dyn ForceSolver, gravity: &Gravity, dt: f64) -> SimResult<()> {
        validate_dt(dt)?;
        fit(&mut self.acc, state.len());

        // a_n from x_n
        solver.accelerations_into(state, gravity, &mut self.acc)?;

        // x_n+1 = x_n + dt v_n  (old velocity), v_n+1 = v_n + dt a_n
        let (x, v) = state.kinematics_mut();
        for ((xi, vi), ai) in x.iter_mut().zip(v.iter_mut()).zip(&self.acc) {
            *xi += dt * *vi;
            *vi += dt * *ai;
        }

        state.t += dt;
        state.check_finite()
    }

    fn evaluations_per_step(&self) -> usize {
        1
    }
}

// =========================================================================================
// Leapfrog
// =========================================================================================

/// Velocity-Verlet leapfrog.
///
/// 1. kick:  v_half = v_n + (dt/2) a(x_n)
/// 2. drift: x_n+1 = x_n + dt v_half
/// 3. a(x_n+1)
/// 4. kick:  v_n+1 = v_half + (dt/2) a(x_n+1)
///
/// `v_half` never reaches the state: after `step` returns the state holds
/// the synchronized `v_n+1`. The half-step values of the last step stay
/// readable through [`Leapfrog::half_step_velocities`].
#[derive(Debug, Default)]
pub struct Leapfrog {
    acc: Vec<NVec3>,
    v_half: Vec<NVec3>,
}

impl Leapfrog {
    /// `v_n+1/2` from the most recent step (empty before the first step).
    pub fn half_step_velocities(&self) -> &[NVec3] {
        &self.v_half
    }
}

impl Integrator for Leapfrog {
    fn name(&self) -> &'static str {
        "leapfrog"
    }

    fn step(&mut self, state: &mut SystemState, solver: &dyn ForceSolver, gravity: &Gravity, dt: f64) -> SimResult<()> {
        validate_dt(dt)?;
        let n = state.len();
        fit(&mut self.acc, n);
        fit(&mut self.v_half, n);
        let half_dt = 0.5 * dt;

        // a_n from x_n
        solver.accelerations_into(state, gravity, &mut self.acc)?;

        // Kick + drift
        {
            let (x, v) = state.kinematics_mut();
            for i in 0..n {
                self.v_half[i] = v[i] + half_dt * self.acc[i];
                x[i] += dt * self.v_half[i];
            }
        }
        state.t += dt;

        // a_n+1 from x_n+1
        solver.accelerations_into(state, gravity, &mut self.acc)?;

        // Second kick writes the synchronized velocity
        let (_, v) = state.kinematics_mut();
        for ((vi, vh), ai) in v.iter_mut().zip(&self.v_half).zip(&self.acc) {
            *vi = *vh + half_dt * *ai;
        }

        state.check_finite()
    }

    fn evaluations_per_step(&self) -> usize {
        2
    }
}
