//! Physical parameters threaded through every solver call.
//!
//! `Gravity` holds the gravitational constant and the Plummer softening
//! length. Nothing here is global: each call receives the values it uses.

use crate::simulation::error::{SimError, SimResult};

#[allow(non_snake_case)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gravity {
    pub G: f64,         // gravitational constant
    pub softening: f64, // softening length epsilon (not squared)
}

impl Gravity {
    #[allow(non_snake_case)]
    pub fn new(G: f64, softening: f64) -> SimResult<Self> {
        let gravity = Self { G, softening };
        gravity.validate()?;
        Ok(gravity)
    }

    /// Range checks: G > 0, softening >= 0, both finite.
    pub fn validate(&self) -> SimResult<()> {
        if !(self.G > 0.0 && self.G.is_finite()) {
            return Err(SimError::InvalidGravitationalConstant(self.G));
        }
        if !(self.softening >= 0.0 && self.softening.is_finite()) {
            return Err(SimError::InvalidSoftening(self.softening));
        }
        Ok(())
    }

    /// epsilon^2, the term added to |r|^2 in the force law
    pub fn eps2(&self) -> f64 {
        self.softening * self.softening
    }
}

/// Positive, finite time step.
pub fn validate_dt(dt: f64) -> SimResult<()> {
    if dt > 0.0 && dt.is_finite() {
        Ok(())
    } else {
        Err(SimError::InvalidTimeStep(dt))
    }
}
