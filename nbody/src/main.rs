use nbody::{Gravity, Scenario, ScenarioConfig, ScenePreset, SolverConfig, IntegratorConfig, DEFAULT_THETA};
use nbody::{Recorder, FrameRecorder, DiagnosticsRecorder};
use nbody::{bench_solvers, bench_step_curve};
use nbody::recording::export::{save_frames_csv, save_diagnostics_csv};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "nbody", about = "Newtonian N-body simulator (direct / Barnes–Hut, Euler / leapfrog)")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a preset scene or a YAML scenario
    Run(RunArgs),
    /// List available scenes and their run presets
    ListScenes,
    /// Time direct vs Barnes–Hut
    Bench(BenchArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Preset scene, ignored when --file is given
    #[arg(long, value_enum, default_value = "two_body")]
    scene: ScenePreset,

    /// YAML scenario file (looked up under scenarios/ if not found as given)
    #[arg(short, long)]
    file: Option<PathBuf>,

    #[arg(long, value_enum)]
    solver: Option<SolverConfig>,

    #[arg(long, value_enum)]
    integrator: Option<IntegratorConfig>,

    #[arg(long)]
    theta: Option<f64>,

    #[arg(long)]
    dt: Option<f64>,

    #[arg(long)]
    steps: Option<usize>,

    #[arg(long)]
    softening: Option<f64>,

    /// Gravitational constant
    #[arg(long = "G")]
    g: Option<f64>,

    /// Recorder interval in steps
    #[arg(long)]
    sample_every: Option<usize>,

    /// Write sampled positions to this CSV file
    #[arg(long)]
    frames: Option<PathBuf>,

    /// Write sampled diagnostics to this CSV file
    #[arg(long)]
    diagnostics: Option<PathBuf>,

    /// Print energy drift summary
    #[arg(long)]
    energy: bool,
}

#[derive(Args, Debug)]
struct BenchArgs {
    /// Per-step cost curve (CSV) instead of the solver sweep
    #[arg(long)]
    curve: bool,

    #[arg(long, default_value_t = DEFAULT_THETA)]
    theta: f64,

    #[arg(long, value_enum, default_value = "leapfrog")]
    integrator: IntegratorConfig,
}

// load here to keep main clean
fn load_scenario_from_yaml(path: &Path) -> Result<ScenarioConfig> {
    let config_path = if path.exists() {
        path.to_path_buf()
    } else {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(path)
    };
    let file = File::open(&config_path).with_context(|| format!("failed to open {}", config_path.display()))?;
    let reader = BufReader::new(file);
    let scenario_cfg = ScenarioConfig::from_reader(reader)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(scenario_cfg)
}

fn build_scenario(args: &RunArgs) -> Result<Scenario> {
    // G and softening shape some presets' initial velocities, so they are
    // settled before any bodies are generated
    let mut scenario = match &args.file {
        Some(path) => {
            let mut cfg = load_scenario_from_yaml(path)?;
            if let Some(g) = args.g { cfg.parameters.G = g; }
            if let Some(softening) = args.softening { cfg.parameters.softening = softening; }
            Scenario::build_scenario(&cfg)?
        }
        None => {
            let gravity = Gravity::new(
                args.g.unwrap_or(1.0),
                args.softening.unwrap_or(args.scene.run_preset().softening),
            )?;
            Scenario::from_preset_with_gravity(
                args.scene,
                args.solver.unwrap_or(SolverConfig::Direct),
                args.integrator.unwrap_or(IntegratorConfig::Leapfrog),
                args.theta.unwrap_or(DEFAULT_THETA),
                gravity,
            )?
        }
    };

    // command-line overrides
    if let Some(solver) = args.solver { scenario.solver = solver; }
    if let Some(integrator) = args.integrator { scenario.integrator = integrator; }
    if let Some(theta) = args.theta { scenario.theta = theta; }
    if let Some(dt) = args.dt { scenario.settings.dt = dt; }
    if let Some(steps) = args.steps { scenario.settings.steps = steps; }
    if args.sample_every.is_some() { scenario.settings.sample_every = args.sample_every; }

    // recording needs samples even if the scenario set none
    let wants_samples = args.frames.is_some() || args.diagnostics.is_some() || args.energy;
    if wants_samples && scenario.settings.sample_every.is_none() {
        scenario.settings.sample_every = Some(1);
    }

    Ok(scenario)
}

fn run(args: RunArgs) -> Result<()> {
    let scenario = build_scenario(&args)?;
    let gravity = scenario.settings.gravity;
    let mut engine = scenario.into_engine()?;

    let mut frames = FrameRecorder::new();
    let mut diagnostics = DiagnosticsRecorder::new(gravity);
    {
        let mut recorders: Vec<&mut dyn Recorder> = Vec::new();
        if args.frames.is_some() {
            recorders.push(&mut frames);
        }
        if args.diagnostics.is_some() || args.energy {
            recorders.push(&mut diagnostics);
        }
        engine.run(&mut recorders)?;
    }

    if let Some(path) = &args.frames {
        save_frames_csv(&frames.frames, path).with_context(|| format!("failed to write {}", path.display()))?;
        info!("{} frames written to {}", frames.frames.len(), path.display());
    }
    if let Some(path) = &args.diagnostics {
        save_diagnostics_csv(&diagnostics.samples, path).with_context(|| format!("failed to write {}", path.display()))?;
        info!("{} diagnostics samples written to {}", diagnostics.samples.len(), path.display());
    }

    let settings = engine.settings();
    println!("Simulation complete");
    println!("Solver:      {}", engine.solver_name());
    println!("Integrator:  {}", engine.integrator_name());
    println!("Bodies:      {}", engine.state().len());
    println!("Steps:       {}", engine.steps_done());
    println!("dt:          {}", settings.dt);
    println!("softening:   {}", settings.gravity.softening);

    if args.energy {
        if let Some(last) = diagnostics.last() {
            println!("Final energy:     {:.6e}", last.diagnostics.total);
            println!("Final drift:      {:.6e}", last.energy_drift);
            println!("Max drift:        {:.6e}", diagnostics.max_energy_drift());
        }
    }
    Ok(())
}

fn list_scenes() {
    println!("Available scenes (run presets, G = 1):\n");
    for preset in ScenePreset::ALL {
        let rp = preset.run_preset();
        println!("- {}", preset.name());
        println!(
            "  dt={}  steps={}  softening={}  sample_every={}",
            rp.dt, rp.steps, rp.softening, rp.sample_every
        );
    }
}

fn bench(args: BenchArgs) -> Result<()> {
    if args.curve {
        // Paste output directly into a spreadsheet to graph
        let ns: Vec<usize> = (200..=6400).step_by(200).collect();
        println!("N,direct_ms,bh_ms");
        for row in bench_step_curve(&ns, args.integrator, args.theta)? {
            println!("{},{:.6},{:.6}", row.n, row.direct_ms, row.barnes_hut_ms);
        }
    } else {
        for row in bench_solvers(&[200, 400, 800, 1600, 3200, 6400], args.theta)? {
            println!(
                "N = {:5}, direct = {:8.6} s, BH = {:8.6} s, max rel err = {:.3e}",
                row.n, row.direct_s, row.barnes_hut_s, row.max_rel_error
            );
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Run(args) => run(args),
        Command::ListScenes => {
            list_scenes();
            Ok(())
        }
        Command::Bench(args) => bench(args),
    }
}
