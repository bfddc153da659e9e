//! Build fully-initialized simulation scenarios from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces a [`Scenario`]:
//! - solver / integrator selection and theta
//! - run settings (`RunSettings`)
//! - system state at t = 0
//!
//! Also home to the scene presets: deterministic initial conditions
//! (random ones are seeded) plus run presets tuned per scene.

use std::f64::consts::PI;

use log::warn;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::configuration::config::{IntegratorConfig, ScenarioConfig, ScenePreset, SolverConfig};
use crate::simulation::diagnostics::{kinetic_energy, linear_momentum, potential_energy, total_mass};
use crate::simulation::engine::{Engine, RunSettings};
use crate::simulation::error::SimResult;
use crate::simulation::forces::make_solver;
use crate::simulation::integrator::make_integrator;
use crate::simulation::params::Gravity;
use crate::simulation::states::{Body, NVec3, SystemState};

/// Runtime bundle built from a [`ScenarioConfig`]
#[derive(Debug, Clone)]
pub struct Scenario {
    pub solver: SolverConfig,
    pub integrator: IntegratorConfig,
    pub theta: f64,
    pub settings: RunSettings,
    pub state: SystemState,
}

impl Scenario {
    pub fn build_scenario(cfg: &ScenarioConfig) -> SimResult<Self> {
        let p = &cfg.parameters;
        let gravity = Gravity::new(p.G, p.softening)?;
        let settings = RunSettings {
            gravity,
            dt: p.dt,
            steps: p.steps,
            sample_every: p.sample_every,
        };
        settings.validate()?;

        let bodies: Vec<Body> = match &cfg.scene {
            Some(scene) => {
                if !cfg.bodies.is_empty() {
                    warn!("scenario has both a scene and explicit bodies; using scene {:?}", scene.name);
                }
                scene.name.bodies(scene.n, scene.seed, &gravity)
            }
            None => cfg.bodies.iter().map(|bc| Body::new(bc.x, bc.v, bc.m)).collect(),
        };

        Ok(Self {
            solver: cfg.engine.solver,
            integrator: cfg.engine.integrator,
            theta: cfg.theta(),
            settings,
            state: SystemState::from_bodies(&bodies)?,
        })
    }

    /// Scenario for a preset with its tuned run settings (G = 1).
    pub fn from_preset(preset: ScenePreset, solver: SolverConfig, integrator: IntegratorConfig, theta: f64) -> SimResult<Self> {
        let gravity = Gravity::new(1.0, preset.run_preset().softening)?;
        Self::from_preset_with_gravity(preset, solver, integrator, theta, gravity)
    }

    /// Preset scenario under `gravity`.
    ///
    /// Presets whose velocities depend on G or softening (circular binary,
    /// virialised cluster) are generated with these values.
    pub fn from_preset_with_gravity(
        preset: ScenePreset,
        solver: SolverConfig,
        integrator: IntegratorConfig,
        theta: f64,
        gravity: Gravity,
    ) -> SimResult<Self> {
        gravity.validate()?;
        let run = preset.run_preset();
        let bodies = preset.bodies(None, None, &gravity);
        Ok(Self {
            solver,
            integrator,
            theta,
            settings: RunSettings {
                gravity,
                dt: run.dt,
                steps: run.steps,
                sample_every: Some(run.sample_every),
            },
            state: SystemState::from_bodies(&bodies)?,
        })
    }

    pub fn into_engine(self) -> SimResult<Engine> {
        let solver = make_solver(self.solver, self.theta)?;
        let integrator = make_integrator(self.integrator);
        Engine::new(self.state, solver, integrator, self.settings)
    }
}

// =========================================================================================
// Presets
// =========================================================================================

/// Default run settings for a preset (G = 1)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunPreset {
    pub dt: f64,
    pub steps: usize,
    pub softening: f64,
    pub sample_every: usize,
}

impl ScenePreset {
    pub const ALL: [ScenePreset; 6] = [
        ScenePreset::TwoBody,
        ScenePreset::CircularBinary,
        ScenePreset::ThreeBody,
        ScenePreset::RandomCluster,
        ScenePreset::Disk,
        ScenePreset::BenchmarkCluster,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScenePreset::TwoBody => "two_body",
            ScenePreset::CircularBinary => "circular_binary",
            ScenePreset::ThreeBody => "three_body",
            ScenePreset::RandomCluster => "random_cluster",
            ScenePreset::Disk => "disk",
            ScenePreset::BenchmarkCluster => "benchmark_cluster",
        }
    }

    pub fn run_preset(&self) -> RunPreset {
        let (dt, steps, softening, sample_every) = match self {
            ScenePreset::TwoBody => (0.002, 4000, 1e-3, 5),
            ScenePreset::CircularBinary => (0.01, 1000, 0.01, 10),
            ScenePreset::ThreeBody => (0.002, 6000, 1e-3, 5),
            ScenePreset::RandomCluster => (0.001, 4000, 0.01, 25),
            ScenePreset::Disk => (0.001, 5000, 0.002, 15),
            ScenePreset::BenchmarkCluster => (0.001, 300, 0.01, 50),
        };
        RunPreset { dt, steps, softening, sample_every }
    }

    /// Initial bodies. `n` and `seed` override the defaults of the random
    /// presets and are ignored by the fixed ones.
    pub fn bodies(&self, n: Option<usize>, seed: Option<u64>, gravity: &Gravity) -> Vec<Body> {
        match self {
            ScenePreset::TwoBody => two_body(1.0, 1.0, 0.5),
            ScenePreset::CircularBinary => circular_binary(1.0, 1.0, gravity.G),
            ScenePreset::ThreeBody => three_body(1.0, 1.0),
            ScenePreset::RandomCluster => random_cluster(&ClusterSpec {
                n: n.unwrap_or(500),
                seed: seed.unwrap_or(42),
                radius: 3.0,
                mass_min: 1e-3,
                mass_max: 1e-2,
                v_scale: 0.05,
            }),
            ScenePreset::Disk => disk(n.unwrap_or(300), seed.unwrap_or(42), 5.0, 5e-2, 0.30, 0.05),
            ScenePreset::BenchmarkCluster => benchmark_cluster(
                &ClusterSpec {
                    n: n.unwrap_or(2500),
                    seed: seed.unwrap_or(123),
                    radius: 5.0,
                    mass_min: 1e-3,
                    mass_max: 1e-2,
                    v_scale: 0.06,
                },
                gravity,
            ),
        }
    }
}

/// Two equal masses at ±separation/2 on x with opposite y-velocities.
pub fn two_body(separation: f64, mass: f64, v: f64) -> Vec<Body> {
    let x = 0.5 * separation;
    vec![
        Body::new([-x, 0.0, 0.0], [0.0, -v, 0.0], mass),
        Body::new([x, 0.0, 0.0], [0.0, v, 0.0], mass),
    ]
}

/// Two equal masses on a circular orbit about their barycentre.
///
/// Each body circles at radius separation/2, so
/// v² / (s/2) = G m / s²  →  v = sqrt(G m / (2 s)).
#[allow(non_snake_case)]
pub fn circular_binary(separation: f64, mass: f64, G: f64) -> Vec<Body> {
    let v = (G * mass / (2.0 * separation)).sqrt();
    two_body(separation, mass, v)
}

/// Three equal masses, a loosely bound chaotic configuration.
pub fn three_body(scale: f64, mass: f64) -> Vec<Body> {
    vec![
        Body::new([-scale, 0.0, 0.0], [0.0, -0.2, 0.0], mass),
        Body::new([scale, 0.0, 0.0], [0.0, 0.2, 0.0], mass),
        Body::new([0.0, scale, 0.0], [0.2, 0.0, 0.0], mass),
    ]
}

/// Parameters of a uniform random cluster
#[derive(Debug, Clone, Copy)]
pub struct ClusterSpec {
    pub n: usize,
    pub seed: u64,
    pub radius: f64,  // half-edge of the cube positions are drawn from
    pub mass_min: f64,
    pub mass_max: f64,
    pub v_scale: f64, // velocity components drawn from [-v_scale, v_scale]
}

/// Bodies uniform in the cube [-radius, radius]^3 with small random velocities.
pub fn random_cluster(spec: &ClusterSpec) -> Vec<Body> {
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let r = spec.radius;
    let vs = spec.v_scale;

    (0..spec.n)
        .map(|_| {
            let x = [rng.gen_range(-r..=r), rng.gen_range(-r..=r), rng.gen_range(-r..=r)];
            let v = [rng.gen_range(-vs..=vs), rng.gen_range(-vs..=vs), rng.gen_range(-vs..=vs)];
            let m = rng.gen_range(spec.mass_min..=spec.mass_max);
            Body::new(x, v, m)
        })
        .collect()
}

/// Thin rotating disk in the xy-plane with uniform surface density.
pub fn disk(n: usize, seed: u64, radius: f64, mass: f64, v_scale: f64, thickness: f64) -> Vec<Body> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..n)
        .map(|_| {
            let r = radius * rng.gen::<f64>().sqrt();
            let phi = rng.gen_range(0.0..(2.0 * PI));
            let z = rng.gen_range(-thickness..=thickness);

            // tangential velocity
            let speed = v_scale / (r + 0.1).sqrt();
            Body::new(
                [r * phi.cos(), r * phi.sin(), z],
                [-speed * phi.sin(), speed * phi.cos(), 0.0],
                mass,
            )
        })
        .collect()
}

/// Random cluster moved to the zero-momentum frame and virialised
/// (velocities scaled so that 2K = |U|).
pub fn benchmark_cluster(spec: &ClusterSpec, gravity: &Gravity) -> Vec<Body> {
    let mut bodies = random_cluster(spec);
    if bodies.is_empty() {
        return bodies;
    }

    let x: Vec<NVec3> = bodies.iter().map(|b| b.x).collect();
    let v: Vec<NVec3> = bodies.iter().map(|b| b.v).collect();
    let m: Vec<f64> = bodies.iter().map(|b| b.m).collect();

    let v_com = linear_momentum(&m, &v) / total_mass(&m);
    for b in bodies.iter_mut() {
        b.v -= v_com;
    }

    let v: Vec<NVec3> = bodies.iter().map(|b| b.v).collect();
    let k = kinetic_energy(&m, &v);
    let u = potential_energy(&x, &m, gravity);
    if k > 0.0 {
        let scale = (u.abs() / (2.0 * k)).sqrt();
        for b in bodies.iter_mut() {
            b.v *= scale;
        }
    }

    bodies
}
