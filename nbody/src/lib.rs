pub mod simulation;
pub mod configuration;
pub mod recording;
pub mod benchmark;

pub use simulation::states::{Body, SystemState, NVec3};
pub use simulation::params::Gravity;
pub use simulation::error::{SimError, SimResult};
pub use simulation::octree::{Bounds, NodeKind, Octree, OctreeNode, DEFAULT_MAX_DEPTH};
pub use simulation::forces::{ForceSolver, DirectSolver, BarnesHutSolver, make_solver};
pub use simulation::integrator::{Integrator, Euler, Leapfrog, make_integrator};
pub use simulation::diagnostics::Diagnostics;
pub use simulation::engine::{Engine, Phase, RunSettings};
pub use simulation::scenario::{Scenario, RunPreset};

pub use configuration::config::{SolverConfig, IntegratorConfig, ScenePreset, EngineConfig, ParametersConfig, SceneConfig, BodyConfig, ScenarioConfig, DEFAULT_THETA};

pub use recording::recorder::{Recorder, Sample, Frame, FrameRecorder, DiagnosticsRecorder, DiagnosticsSample};

pub use benchmark::benchmark::{bench_solvers, bench_step_curve};
