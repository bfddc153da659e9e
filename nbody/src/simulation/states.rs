//! Core state types for the N-body simulation.
//!
//! - `Body` is the per-body view used when building a system (position,
//!   velocity, mass).
//! - `SystemState` stores the whole system as parallel arrays indexed
//!   `0..N`. The index is the body's identity for the lifetime of a run.
//!
//! The arrays are private so the equal-length invariant cannot be broken
//! from outside; solvers read through slices and integrators write through
//! the `*_mut` accessors.

use nalgebra::Vector3;

use crate::simulation::error::{SimError, SimResult};

pub type NVec3 = Vector3<f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub x: NVec3, // position
    pub v: NVec3, // velocity
    pub m: f64,   // mass
}

impl Body {
    pub fn new(x: [f64; 3], v: [f64; 3], m: f64) -> Self {
        Self {
            x: x.into(),
            v: v.into(),
            m,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SystemState {
    positions: Vec<NVec3>,
    velocities: Vec<NVec3>,
    masses: Vec<f64>,
    pub t: f64, // simulation time
}

impl SystemState {
    /// Build a state from parallel arrays.
    ///
    /// Fails if the arrays differ in length or any mass is not strictly
    /// positive and finite.
    pub fn new(positions: Vec<NVec3>, velocities: Vec<NVec3>, masses: Vec<f64>) -> SimResult<Self> {
        let state = Self {
            positions,
            velocities,
            masses,
            t: 0.0,
        };
        state.validate()?;
        Ok(state)
    }

    pub fn from_bodies(bodies: &[Body]) -> SimResult<Self> {
        Self::new(
            bodies.iter().map(|b| b.x).collect(),
            bodies.iter().map(|b| b.v).collect(),
            bodies.iter().map(|b| b.m).collect(),
        )
    }

    /// Check the structural invariants: equal array lengths, positive masses.
    pub fn validate(&self) -> SimResult<()> {
        if self.positions.len() != self.velocities.len() || self.positions.len() != self.masses.len() {
            return Err(SimError::LengthMismatch {
                positions: self.positions.len(),
                velocities: self.velocities.len(),
                masses: self.masses.len(),
            });
        }
        for (index, &mass) in self.masses.iter().enumerate() {
            if !(mass > 0.0 && mass.is_finite()) {
                return Err(SimError::NonPositiveMass { index, mass });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.masses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }

    pub fn positions(&self) -> &[NVec3] {
        &self.positions
    }

    pub fn velocities(&self) -> &[NVec3] {
        &self.velocities
    }

    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    pub fn positions_mut(&mut self) -> &mut [NVec3] {
        &mut self.positions
    }

    pub fn velocities_mut(&mut self) -> &mut [NVec3] {
        &mut self.velocities
    }

    /// Positions and velocities borrowed mutably together, for updates that
    /// read one while writing the other.
    pub fn kinematics_mut(&mut self) -> (&mut [NVec3], &mut [NVec3]) {
        (&mut self.positions, &mut self.velocities)
    }

    /// Reconstruct body `i` as a standalone value.
    pub fn body(&self, i: usize) -> Body {
        Body {
            x: self.positions[i],
            v: self.velocities[i],
            m: self.masses[i],
        }
    }

    pub fn bodies(&self) -> impl Iterator<Item = Body> + '_ {
        (0..self.len()).map(move |i| self.body(i))
    }

    /// Fails with `NonFinite` naming the first body whose position or
    /// velocity has a NaN/inf component.
    pub fn check_finite(&self) -> SimResult<()> {
        check_finite("position", &self.positions)?;
        check_finite("velocity", &self.velocities)
    }
}

/// Scan a vector set for NaN/inf components.
pub(crate) fn check_finite(quantity: &'static str, values: &[NVec3]) -> SimResult<()> {
    match values.iter().position(|v| !v.iter().all(|c| c.is_finite())) {
        Some(index) => Err(SimError::NonFinite { quantity, index }),
        None => Ok(()),
    }
}
