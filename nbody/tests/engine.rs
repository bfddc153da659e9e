use nbody::simulation::scenario::circular_binary;
use nbody::{
    make_integrator, make_solver, Body, DiagnosticsRecorder, DirectSolver, Engine, FrameRecorder, Gravity,
    IntegratorConfig, Leapfrog, Phase, Recorder, RunSettings, Sample, SimError, SolverConfig, SystemState,
};

fn settings(steps: usize, sample_every: Option<usize>) -> RunSettings {
    RunSettings {
        gravity: Gravity { G: 1.0, softening: 0.01 },
        dt: 0.01,
        steps,
        sample_every,
    }
}

fn binary_engine(settings: RunSettings) -> Engine {
    let state = SystemState::from_bodies(&circular_binary(1.0, 1.0, 1.0)).unwrap();
    Engine::new(state, Box::new(DirectSolver), Box::new(Leapfrog::default()), settings).unwrap()
}

fn step_logger(steps: &mut Vec<usize>) -> impl FnMut(&Sample<'_>) + '_ {
    move |s| steps.push(s.step)
}

#[test]
fn phases_move_from_idle_to_complete() {
    let mut engine = binary_engine(settings(3, None));
    assert_eq!(engine.phase(), Phase::Idle);

    assert_eq!(engine.step().unwrap(), Phase::Running);
    assert_eq!(engine.step().unwrap(), Phase::Running);
    assert_eq!(engine.step().unwrap(), Phase::Complete);
    assert_eq!(engine.steps_done(), 3);
    assert!((engine.state().t - 0.03).abs() < 1e-12);

    assert_eq!(engine.step().unwrap_err(), SimError::EngineFinished);
    assert_eq!(engine.phase(), Phase::Complete);
}

#[test]
fn samples_first_every_kth_and_last_step() {
    let mut engine = binary_engine(settings(10, Some(3)));
    let mut steps = Vec::new();
    {
        let mut log = step_logger(&mut steps);
        engine.run(&mut [&mut log as &mut dyn Recorder]).unwrap();
    }
    assert_eq!(steps, vec![0, 3, 6, 9, 10]);
    assert_eq!(engine.phase(), Phase::Complete);
}

#[test]
fn last_step_on_the_interval_is_sampled_once() {
    let mut engine = binary_engine(settings(6, Some(3)));
    let mut frames = FrameRecorder::new();
    engine.run(&mut [&mut frames as &mut dyn Recorder]).unwrap();

    let steps: Vec<usize> = frames.frames.iter().map(|f| f.step).collect();
    assert_eq!(steps, vec![0, 3, 6]);
    assert_eq!(frames.frames.last().unwrap().positions, engine.state().positions());
}

#[test]
fn every_recorder_sees_every_sample() {
    let mut engine = binary_engine(settings(20, Some(5)));
    let mut frames = FrameRecorder::new();
    let mut diagnostics = DiagnosticsRecorder::new(engine.settings().gravity);
    engine.run(&mut [&mut frames as &mut dyn Recorder, &mut diagnostics]).unwrap();

    assert_eq!(frames.frames.len(), diagnostics.samples.len());
    assert_eq!(frames.frames[0].t, 0.0);
    assert_eq!(diagnostics.samples[0].energy_drift, 0.0);
    assert!(diagnostics.max_energy_drift() < 1e-3);
}

#[test]
fn recording_is_off_without_an_interval() {
    let mut engine = binary_engine(settings(5, None));
    let mut steps = Vec::new();
    {
        let mut log = step_logger(&mut steps);
        engine.run(&mut [&mut log as &mut dyn Recorder]).unwrap();
    }
    assert!(steps.is_empty());
    assert_eq!(engine.steps_done(), 5);
}

#[test]
fn run_after_completion_is_rejected() {
    let mut engine = binary_engine(settings(2, None));
    engine.run(&mut []).unwrap();
    assert_eq!(engine.run(&mut []).unwrap_err(), SimError::EngineFinished);
}

#[test]
fn run_resumes_after_manual_steps() {
    let mut engine = binary_engine(settings(4, Some(1)));
    engine.step().unwrap();

    let mut steps = Vec::new();
    {
        let mut log = step_logger(&mut steps);
        engine.run(&mut [&mut log as &mut dyn Recorder]).unwrap();
    }
    // no step-0 sample once the engine has left Idle
    assert_eq!(steps, vec![2, 3, 4]);
}

#[test]
fn solver_errors_are_fatal() {
    let state = SystemState::from_bodies(&[
        Body::new([1.0, 1.0, 1.0], [0.0; 3], 1.0),
        Body::new([1.0, 1.0, 1.0], [0.0; 3], 1.0),
    ])
    .unwrap();
    let mut s = settings(10, Some(1));
    s.gravity.softening = 0.0;
    let mut engine = Engine::new(state, Box::new(DirectSolver), Box::new(Leapfrog::default()), s).unwrap();

    let mut steps = Vec::new();
    let err;
    {
        let mut log = step_logger(&mut steps);
        err = engine.run(&mut [&mut log as &mut dyn Recorder]).unwrap_err();
    }
    assert!(matches!(err, SimError::NonFinite { .. }));
    assert_eq!(engine.phase(), Phase::Failed);
    assert_eq!(engine.steps_done(), 0);
    assert_eq!(steps, vec![0]);

    assert_eq!(engine.step().unwrap_err(), SimError::EngineFinished);
}

#[test]
fn construction_validates_settings_and_state() {
    let state = || SystemState::from_bodies(&circular_binary(1.0, 1.0, 1.0)).unwrap();
    let build = |s: RunSettings| Engine::new(state(), Box::new(DirectSolver), Box::new(Leapfrog::default()), s).err();

    assert_eq!(build(settings(0, None)), Some(SimError::InvalidStepCount(0)));
    assert_eq!(build(settings(10, Some(0))), Some(SimError::InvalidSampleInterval(0)));

    let mut s = settings(10, None);
    s.dt = -0.1;
    assert_eq!(build(s), Some(SimError::InvalidTimeStep(-0.1)));

    let mut s = settings(10, None);
    s.gravity.softening = -1.0;
    assert_eq!(build(s), Some(SimError::InvalidSoftening(-1.0)));

    let mut s = settings(10, None);
    s.gravity.G = 0.0;
    assert_eq!(build(s), Some(SimError::InvalidGravitationalConstant(0.0)));
}

#[test]
fn engines_built_from_config_run_both_solvers() {
    let bodies = circular_binary(1.0, 1.0, 1.0);
    let mut finals = Vec::new();
    for solver in [SolverConfig::Direct, SolverConfig::BarnesHut] {
        let state = SystemState::from_bodies(&bodies).unwrap();
        let mut engine = Engine::new(
            state,
            make_solver(solver, 0.5).unwrap(),
            make_integrator(IntegratorConfig::Leapfrog),
            settings(100, None),
        )
        .unwrap();
        engine.run(&mut []).unwrap();
        finals.push(engine.into_state());
    }
    // two bodies: Barnes–Hut never approximates
    for (d, b) in finals[0].positions().iter().zip(finals[1].positions()) {
        assert!((d - b).norm() < 1e-12);
    }
    assert_eq!(finals[0].t, finals[1].t);
}
