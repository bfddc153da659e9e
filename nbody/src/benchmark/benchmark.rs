use std::time::Instant;

use crate::configuration::config::{IntegratorConfig, SolverConfig};
use crate::simulation::forces::{make_solver, BarnesHutSolver, DirectSolver, ForceSolver};
use crate::simulation::error::SimResult;
use crate::simulation::integrator::make_integrator;
use crate::simulation::params::Gravity;
use crate::simulation::states::{NVec3, SystemState};

/// One row of the solver sweep
#[derive(Debug, Clone, Copy)]
pub struct SolverTiming {
    pub n: usize,
    pub direct_s: f64,
    pub barnes_hut_s: f64,
    pub max_rel_error: f64, // Barnes–Hut vs direct, worst body
}

/// One row of the per-step cost curve
#[derive(Debug, Clone, Copy)]
pub struct StepTiming {
    pub n: usize,
    pub direct_ms: f64,
    pub barnes_hut_ms: f64,
}

/// Deterministic system of `n` unit masses, no rand needed
pub fn make_system(n: usize) -> SimResult<SystemState> {
    let positions = (0..n)
        .map(|i| {
            let i_f = i as f64;
            NVec3::new(
                (i_f * 0.37).sin() * 5.0,
                (i_f * 0.13).cos() * 5.0,
                (i_f * 0.07).sin() * 5.0,
            )
        })
        .collect();
    SystemState::new(positions, vec![NVec3::zeros(); n], vec![1.0; n])
}

fn bench_gravity() -> Gravity {
    Gravity { G: 0.1, softening: 1e-2 }
}

/// Time one acceleration evaluation per solver for each `n`
pub fn bench_solvers(ns: &[usize], theta: f64) -> SimResult<Vec<SolverTiming>> {
    let gravity = bench_gravity();
    let direct = DirectSolver;
    let bh = BarnesHutSolver::new(theta)?;

    let mut rows = Vec::with_capacity(ns.len());
    for &n in ns {
        let sys = make_system(n)?;
        let mut a_direct = vec![NVec3::zeros(); n];
        let mut a_bh = vec![NVec3::zeros(); n];

        // Warm up
        direct.accelerations_into(&sys, &gravity, &mut a_direct)?;
        bh.accelerations_into(&sys, &gravity, &mut a_bh)?;

        let t0 = Instant::now();
        direct.accelerations_into(&sys, &gravity, &mut a_direct)?;
        let direct_s = t0.elapsed().as_secs_f64();

        let t1 = Instant::now();
        bh.accelerations_into(&sys, &gravity, &mut a_bh)?;
        let barnes_hut_s = t1.elapsed().as_secs_f64();

        let max_rel_error = a_direct
            .iter()
            .zip(&a_bh)
            .map(|(d, b)| (b - d).norm() / d.norm().max(f64::MIN_POSITIVE))
            .fold(0.0, f64::max);

        rows.push(SolverTiming { n, direct_s, barnes_hut_s, max_rel_error });
    }
    Ok(rows)
}

/// Average wall time of `steps` integrator steps with the given solver
fn time_steps(sys: &SystemState, solver: SolverConfig, integrator: IntegratorConfig, theta: f64, steps: usize) -> SimResult<f64> {
    let gravity = bench_gravity();
    let solver = make_solver(solver, theta)?;
    let mut integrator = make_integrator(integrator);
    let mut sys = sys.clone();

    let t0 = Instant::now();
    for _ in 0..steps {
        integrator.step(&mut sys, solver.as_ref(), &gravity, 1e-3)?;
    }
    Ok(t0.elapsed().as_secs_f64() * 1000.0 / steps as f64)
}

/// Per-step cost for direct and Barnes–Hut over `ns`
pub fn bench_step_curve(ns: &[usize], integrator: IntegratorConfig, theta: f64) -> SimResult<Vec<StepTiming>> {
    let mut rows = Vec::with_capacity(ns.len());
    for &n in ns {
        // Small n: average over a few steps to smooth noise
        // Large n: only 1 step to avoid minutes of runtime
        let steps_direct = if n <= 800 { 5 } else { 1 };
        let steps_bh = if n <= 2000 { 3 } else { 1 };

        let sys = make_system(n)?;
        let direct_ms = time_steps(&sys, SolverConfig::Direct, integrator, theta, steps_direct)?;
        let barnes_hut_ms = time_steps(&sys, SolverConfig::BarnesHut, integrator, theta, steps_bh)?;

        rows.push(StepTiming { n, direct_ms, barnes_hut_ms });
    }
    Ok(rows)
}
