//! Error type shared by solvers, integrators and the engine.

use thiserror::Error;

pub type SimResult<T> = Result<T, SimError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("theta must be positive and finite, got {0}")]
    InvalidTheta(f64),

    #[error("time step must be positive and finite, got {0}")]
    InvalidTimeStep(f64),

    #[error("step count must be positive, got {0}")]
    InvalidStepCount(usize),

    #[error("sample interval must be positive, got {0}")]
    InvalidSampleInterval(usize),

    #[error("softening must be non-negative and finite, got {0}")]
    InvalidSoftening(f64),

    #[error("gravitational constant must be positive and finite, got {0}")]
    InvalidGravitationalConstant(f64),

    #[error("body {index} has non-positive mass {mass}")]
    NonPositiveMass { index: usize, mass: f64 },

    #[error("state arrays differ in length: {positions} positions, {velocities} velocities, {masses} masses")]
    LengthMismatch {
        positions: usize,
        velocities: usize,
        masses: usize,
    },

    #[error("acceleration buffer holds {got} entries for {expected} bodies")]
    BufferLength { expected: usize, got: usize },

    #[error("non-finite {quantity} for body {index}")]
    NonFinite { quantity: &'static str, index: usize },

    #[error("engine has already finished and cannot step further")]
    EngineFinished,
}
