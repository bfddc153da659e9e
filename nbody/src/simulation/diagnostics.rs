//! Conserved-quantity diagnostics.
//!
//! Plain reductions over a state. The engine never calls these while a step
//! is in progress; recorders call them on completed steps with the
//! integrator's synchronized velocities.

use crate::simulation::params::Gravity;
use crate::simulation::states::{NVec3, SystemState};

pub fn total_mass(masses: &[f64]) -> f64 {
    masses.iter().sum()
}

/// Mass-weighted mean position (origin for an empty system).
pub fn center_of_mass(positions: &[NVec3], masses: &[f64]) -> NVec3 {
    let m = total_mass(masses);
    if m == 0.0 {
        return NVec3::zeros();
    }
    let weighted = positions
        .iter()
        .zip(masses)
        .fold(NVec3::zeros(), |acc, (x, &mi)| acc + *x * mi);
    weighted / m
}

/// Σ ½ m |v|²
pub fn kinetic_energy(masses: &[f64], velocities: &[NVec3]) -> f64 {
    masses
        .iter()
        .zip(velocities)
        .map(|(&m, v)| 0.5 * m * v.norm_squared())
        .sum()
}

/// Σ_{i<j} −G m_i m_j / sqrt(|r_ij|² + ε²), softened like the force law.
pub fn potential_energy(positions: &[NVec3], masses: &[f64], gravity: &Gravity) -> f64 {
    let eps2 = gravity.eps2();
    let n = positions.len();
    let mut total = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            let d = ((positions[j] - positions[i]).norm_squared() + eps2).sqrt();
            total -= gravity.G * masses[i] * masses[j] / d;
        }
    }
    total
}

/// Σ m v
pub fn linear_momentum(masses: &[f64], velocities: &[NVec3]) -> NVec3 {
    masses
        .iter()
        .zip(velocities)
        .fold(NVec3::zeros(), |acc, (&m, v)| acc + *v * m)
}

/// Σ m (x × v) about the origin
pub fn angular_momentum(positions: &[NVec3], masses: &[f64], velocities: &[NVec3]) -> NVec3 {
    positions
        .iter()
        .zip(masses)
        .zip(velocities)
        .fold(NVec3::zeros(), |acc, ((x, &m), v)| acc + x.cross(v) * m)
}

/// |E − E0| / |E0|, or the absolute difference when E0 is zero.
pub fn relative_energy_drift(e0: f64, e: f64) -> f64 {
    if e0 == 0.0 {
        (e - e0).abs()
    } else {
        ((e - e0) / e0).abs()
    }
}

/// One snapshot of every diagnostic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Diagnostics {
    pub t: f64,
    pub kinetic: f64,
    pub potential: f64,
    pub total: f64,
    pub momentum: NVec3,
    pub angular_momentum: NVec3,
    pub center_of_mass: NVec3,
}

impl Diagnostics {
    /// Measure `state` using `velocities` in place of the stored ones
    /// (pass the integrator's synchronized velocities).
    pub fn measure_with(state: &SystemState, velocities: &[NVec3], gravity: &Gravity) -> Self {
        let x = state.positions();
        let m = state.masses();
        let kinetic = kinetic_energy(m, velocities);
        let potential = potential_energy(x, m, gravity);
        Self {
            t: state.t,
            kinetic,
            potential,
            total: kinetic + potential,
            momentum: linear_momentum(m, velocities),
            angular_momentum: angular_momentum(x, m, velocities),
            center_of_mass: center_of_mass(x, m),
        }
    }

    pub fn measure(state: &SystemState, gravity: &Gravity) -> Self {
        Self::measure_with(state, state.velocities(), gravity)
    }
}
