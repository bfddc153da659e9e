//! Simulation engine: owns the state and the time loop.
//!
//! The engine holds a solver and an integrator behind their traits and
//! calls `integrator.step` once per step. It computes no physics itself.
//!
//! Phases: `Idle` → `Running` → `Complete`. Any solver or integrator error
//! is fatal: the engine moves to `Failed`, returns the error and refuses
//! further steps.

use std::time::Instant;

use log::{debug, error, info};

use crate::recording::recorder::{Recorder, Sample};
use crate::simulation::error::{SimError, SimResult};
use crate::simulation::forces::ForceSolver;
use crate::simulation::integrator::Integrator;
use crate::simulation::params::{validate_dt, Gravity};
use crate::simulation::states::{NVec3, SystemState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Complete,
    Failed,
}

/// Run-level settings consumed by the engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSettings {
    pub gravity: Gravity,            // G and softening
    pub dt: f64,                     // fixed step size
    pub steps: usize,                // total step count
    pub sample_every: Option<usize>, // recorder interval, None disables recording
}

impl RunSettings {
    pub fn validate(&self) -> SimResult<()> {
        self.gravity.validate()?;
        validate_dt(self.dt)?;
        if self.steps == 0 {
            return Err(SimError::InvalidStepCount(self.steps));
        }
        if self.sample_every == Some(0) {
            return Err(SimError::InvalidSampleInterval(0));
        }
        Ok(())
    }
}

pub struct Engine {
    settings: RunSettings,
    state: SystemState,
    solver: Box<dyn ForceSolver>,
    integrator: Box<dyn Integrator>,
    phase: Phase,
    steps_done: usize,
}

impl Engine {
    /// Validates settings and initial state before anything runs.
    pub fn new(
        state: SystemState,
        solver: Box<dyn ForceSolver>,
        integrator: Box<dyn Integrator>,
        settings: RunSettings,
    ) -> SimResult<Self> {
        settings.validate()?;
        state.validate()?;
        state.check_finite()?;
        Ok(Self {
            settings,
            state,
            solver,
            integrator,
            phase: Phase::Idle,
            steps_done: 0,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn steps_done(&self) -> usize {
        self.steps_done
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Current state. Valid between steps only; velocities are synchronized.
    pub fn state(&self) -> &SystemState {
        &self.state
    }

    pub fn into_state(self) -> SystemState {
        self.state
    }

    pub fn synchronized_velocities(&self) -> &[NVec3] {
        self.integrator.synchronized_velocities(&self.state)
    }

    pub fn solver_name(&self) -> &'static str {
        self.solver.name()
    }

    pub fn integrator_name(&self) -> &'static str {
        self.integrator.name()
    }

    /// Advance one step and return the resulting phase.
    pub fn step(&mut self) -> SimResult<Phase> {
        match self.phase {
            Phase::Complete | Phase::Failed => return Err(SimError::EngineFinished),
            Phase::Idle => self.phase = Phase::Running,
            Phase::Running => {}
        }

        let result = self.integrator.step(
            &mut self.state,
            self.solver.as_ref(),
            &self.settings.gravity,
            self.settings.dt,
        );
        if let Err(e) = result {
            error!("step {} failed: {}", self.steps_done + 1, e);
            self.phase = Phase::Failed;
            return Err(e);
        }

        self.steps_done += 1;
        if self.steps_done >= self.settings.steps {
            self.phase = Phase::Complete;
        }
        Ok(self.phase)
    }

    /// Run the remaining steps, feeding every sampled step to `recorders`.
    ///
    /// When started from `Idle` the initial state is recorded as step 0.
    pub fn run(&mut self, recorders: &mut [&mut dyn Recorder]) -> SimResult<()> {
        if matches!(self.phase, Phase::Complete | Phase::Failed) {
            return Err(SimError::EngineFinished);
        }

        info!(
            "running {} steps: {} bodies, solver {}, integrator {}, dt {}",
            self.settings.steps - self.steps_done,
            self.state.len(),
            self.solver.name(),
            self.integrator.name(),
            self.settings.dt
        );
        let started = Instant::now();

        if self.phase == Phase::Idle {
            self.sample(recorders);
        }

        while self.step()? != Phase::Complete {
            if self.sample_due() {
                self.sample(recorders);
            }
        }
        // last step is always sampled
        if self.settings.sample_every.is_some() {
            self.sample(recorders);
        }

        info!(
            "run complete after {} steps in {:.3} s",
            self.steps_done,
            started.elapsed().as_secs_f64()
        );
        Ok(())
    }

    fn sample_due(&self) -> bool {
        matches!(self.settings.sample_every, Some(every) if self.steps_done % every == 0)
    }

    fn sample(&self, recorders: &mut [&mut dyn Recorder]) {
        if self.settings.sample_every.is_none() || recorders.is_empty() {
            return;
        }
        debug!("sample at step {} (t = {})", self.steps_done, self.state.t);

        let sample = Sample {
            step: self.steps_done,
            state: &self.state,
            velocities: self.synchronized_velocities(),
        };
        for recorder in recorders.iter_mut() {
            recorder.record(&sample);
        }
    }
}
