//! Sampling hooks called by the engine.
//!
//! The engine hands a [`Sample`] to every recorder at step 0, every
//! `sample_every` steps and at the last step. Recorders copy what they need;
//! the engine keeps no history itself.

use crate::simulation::diagnostics::{relative_energy_drift, Diagnostics};
use crate::simulation::params::Gravity;
use crate::simulation::states::{NVec3, SystemState};

/// A completed step as seen by recorders.
pub struct Sample<'a> {
    pub step: usize,
    pub state: &'a SystemState,
    pub velocities: &'a [NVec3], // synchronized velocities for diagnostics
}

impl Sample<'_> {
    pub fn positions(&self) -> &[NVec3] {
        self.state.positions()
    }
}

pub trait Recorder {
    fn record(&mut self, sample: &Sample<'_>);
}

impl<F> Recorder for F
where
    F: FnMut(&Sample<'_>),
{
    fn record(&mut self, sample: &Sample<'_>) {
        self(sample)
    }
}

/// Body positions at one sampled step
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub step: usize,
    pub t: f64,
    pub positions: Vec<NVec3>,
}

/// Keeps every sampled set of positions (for animation / export).
#[derive(Debug, Default)]
pub struct FrameRecorder {
    pub frames: Vec<Frame>,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Recorder for FrameRecorder {
    fn record(&mut self, sample: &Sample<'_>) {
        self.frames.push(Frame {
            step: sample.step,
            t: sample.state.t,
            positions: sample.positions().to_vec(),
        });
    }
}

/// Diagnostics measured at one sampled step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiagnosticsSample {
    pub step: usize,
    pub diagnostics: Diagnostics,
    pub energy_drift: f64, // relative to the first sample
}

/// Measures conserved quantities at every sample.
#[derive(Debug)]
pub struct DiagnosticsRecorder {
    gravity: Gravity,
    pub samples: Vec<DiagnosticsSample>,
}

impl DiagnosticsRecorder {
    pub fn new(gravity: Gravity) -> Self {
        Self {
            gravity,
            samples: Vec::new(),
        }
    }

    pub fn initial_energy(&self) -> Option<f64> {
        self.samples.first().map(|s| s.diagnostics.total)
    }

    pub fn energy_drifts(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.energy_drift)
    }

    pub fn max_energy_drift(&self) -> f64 {
        self.energy_drifts().fold(0.0, f64::max)
    }

    pub fn last(&self) -> Option<&DiagnosticsSample> {
        self.samples.last()
    }
}

impl Recorder for DiagnosticsRecorder {
    fn record(&mut self, sample: &Sample<'_>) {
        let diagnostics = Diagnostics::measure_with(sample.state, sample.velocities, &self.gravity);
        let e0 = self.initial_energy().unwrap_or(diagnostics.total);
        self.samples.push(DiagnosticsSample {
            step: sample.step,
            diagnostics,
            energy_drift: relative_energy_drift(e0, diagnostics.total),
        });
    }
}
