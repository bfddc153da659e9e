pub mod states;
pub mod params;
pub mod error;
pub mod octree;
pub mod forces;
pub mod integrator;
pub mod diagnostics;
pub mod engine;
pub mod scenario;
