//! YAML-facing scenario description.
//!
//! Plain `serde` structs, turned into runtime objects by
//! `simulation::scenario`. A scenario file has:
//!
//! - [`EngineConfig`]     – solver, integrator and Barnes–Hut theta
//! - [`ParametersConfig`] – time step, step count and physical constants
//! - [`SceneConfig`]      – optional named preset for the initial bodies
//! - [`BodyConfig`]       – explicit initial state for each body
//! - [`ScenarioConfig`]   – top-level wrapper used to load a scenario from YAML
//!
//! # YAML format
//!
//! ```yaml
//! engine:
//!   solver: "barnes_hut"    # or "direct"
//!   integrator: "leapfrog"  # or "euler"
//!   theta: 0.5
//!
//! parameters:
//!   dt: 0.01                # fixed step size
//!   steps: 1000             # number of steps
//!   softening: 0.01         # softening length epsilon
//!   G: 1.0                  # gravitational constant
//!   sample_every: 10        # recorder interval in steps (optional)
//!
//! bodies:
//!   - x: [ -0.5, 0.0, 0.0 ]
//!     v: [  0.0, -0.7, 0.0 ]
//!     m: 1.0
//!   - x: [  0.5, 0.0, 0.0 ]
//!     v: [  0.0, 0.7, 0.0 ]
//!     m: 1.0
//! ```
//!
//! Instead of `bodies`, a `scene` block selects a preset:
//!
//! ```yaml
//! scene:
//!   name: "random_cluster"
//!   n: 200
//!   seed: 7
//! ```

use std::io::Read;

use clap::ValueEnum;
use serde::Deserialize;

/// Barnes–Hut opening threshold used when none is configured.
pub const DEFAULT_THETA: f64 = 0.7;

/// Which force solver the engine uses
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SolverConfig {
    #[serde(rename = "direct")] // exact pairwise sum, O(N^2)
    Direct,

    #[serde(rename = "barnes_hut", alias = "barneshut", alias = "barnes-hut")] // octree approximation, ~O(N log N)
    #[value(name = "barnes-hut", alias = "barneshut")]
    BarnesHut,
}

/// Which time integrator the engine uses
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IntegratorConfig {
    #[serde(rename = "euler")] // explicit first order, not symplectic
    Euler,

    #[serde(rename = "leapfrog", alias = "verlet")] // velocity-Verlet kick-drift-kick, symplectic
    #[value(alias = "verlet")]
    Leapfrog,
}

/// Named initial conditions
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum ScenePreset {
    TwoBody,
    CircularBinary,
    ThreeBody,
    RandomCluster,
    Disk,
    BenchmarkCluster,
}

/// Force/integration method selection
#[derive(Deserialize, Debug, Clone)]
pub struct EngineConfig {
    pub solver: SolverConfig,         // force solver
    pub integrator: IntegratorConfig, // time integrator
    pub theta: Option<f64>,           // Barnes–Hut opening threshold, DEFAULT_THETA when absent
}

/// Numerical and physical parameters for a scenario
#[allow(non_snake_case)]
#[derive(Deserialize, Debug, Clone)]
pub struct ParametersConfig {
    pub dt: f64,                   // time step size
    pub steps: usize,              // number of steps to run
    pub softening: f64,            // softening length, prevents singular forces at small separations
    #[serde(default = "default_g")]
    pub G: f64,                    // gravitational constant
    #[serde(default)]
    pub sample_every: Option<usize>, // recorder interval in steps, no recording when absent
}

fn default_g() -> f64 {
    1.0
}

/// Preset selection with optional overrides of its defaults
#[derive(Deserialize, Debug, Clone)]
pub struct SceneConfig {
    pub name: ScenePreset,
    #[serde(default)]
    pub n: Option<usize>,   // body count for the random presets
    #[serde(default)]
    pub seed: Option<u64>,  // RNG seed for the random presets
}

/// Configuration for a single body's initial state
#[derive(Deserialize, Debug, Clone)]
pub struct BodyConfig {
    pub x: [f64; 3], // initial position
    pub v: [f64; 3], // initial velocity
    pub m: f64,      // mass
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioConfig {
    pub engine: EngineConfig,         // solver / integrator selection
    pub parameters: ParametersConfig, // numerical and physical parameters
    #[serde(default)]
    pub scene: Option<SceneConfig>,   // preset initial conditions
    #[serde(default)]
    pub bodies: Vec<BodyConfig>,      // explicit initial conditions, used when no scene is given
}

impl ScenarioConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(s)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_reader(reader)
    }

    pub fn theta(&self) -> f64 {
        self.engine.theta.unwrap_or(DEFAULT_THETA)
    }
}
