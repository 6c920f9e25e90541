//! Coulomb force field demo
//!
//! Loads a scene of point obstacles, renders their field on a simulated haptic
//! device and reports the probe state from the frame loop. Type `p` and enter
//! to flip the field polarity, `q` to quit.

use anyhow::{Context, Result};
use clap::Parser;
use hapticfield_algorithms::{CoulombField, FieldParams};
use hapticfield_core::{HapticConfig, PolarityCell};
use hapticfield_device::{Capabilities, CoulombServoTask, HapticSession, SimulatedDevice};
use hapticfield_visualization::{forward_commands, Command, FrameLoop, FrameLoopExit, LogSink, Viewport};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "coulomb_field", about = "Render a Coulomb force field on a simulated haptic device")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scene file, overrides scene.path from the configuration
    #[arg(short, long)]
    scene: Option<PathBuf>,

    /// Stop after this many display frames
    #[arg(long)]
    frames: Option<u64>,
}

fn main() -> ExitCode {
    init_tracing();

    match run(Args::parse()) {
        Ok(FrameLoopExit::ServoTaskExited) => {
            error!("Servo task exited; force rendering stopped");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn run(args: Args) -> Result<FrameLoopExit> {
    let mut config = match &args.config {
        Some(path) => HapticConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => HapticConfig::default(),
    };
    if let Some(scene) = args.scene {
        config.scene.path = scene;
    }
    config.validate()?;

    let obstacles = hapticfield_io::load_scene(&config.scene)
        .with_context(|| format!("loading scene {}", config.scene.path.display()))?;
    let field = CoulombField::new(Arc::new(obstacles), FieldParams::try_from(&config.field)?);
    let polarity = Arc::new(PolarityCell::new(config.field.initial_polarity));

    let mut commands = spawn_command_reader()?;
    let device = SimulatedDevice::from_config(&config.device);
    let mut session = HapticSession::open(device, Capabilities::default(), &config.servo)
        .context("Failed to initialize haptic device")?;
    info!("Found device {}", session.model());
    session.start_servo_task(CoulombServoTask::new(field.clone(), Arc::clone(&polarity)))?;

    let (min, max) = session.workspace_bounds();
    let viewport = Viewport::fit_workspace(&min, &max, 16.0 / 9.0);
    let mut sink = LogSink::new(config.display.frame_rate_hz.round() as u64);

    let exit = FrameLoop::new(field, polarity, &config.display)
        .with_frame_limit(args.frames)
        .run(&session, &viewport, &mut commands, &mut sink)?;

    let stats = session.stats();
    session.close()?;
    info!("Done after {} servo ticks", stats.ticks);
    Ok(exit)
}

/// Forward stdin lines as commands
///
/// End of input and Ctrl-C both turn into [`Command::Quit`], so the frame loop
/// returns and the session disables the device on the way out.
fn spawn_command_reader() -> Result<flume::Receiver<Command>> {
    let (tx, rx) = flume::unbounded();

    let interrupt_tx = tx.clone();
    ctrlc::set_handler(move || {
        info!("Shutdown signal received");
        let _ = interrupt_tx.send(Command::Quit);
    })
    .context("Failed to install Ctrl-C handler")?;

    std::thread::Builder::new()
        .name("stdin-commands".to_string())
        .spawn(move || forward_commands(std::io::stdin().lock(), &tx))
        .context("Failed to spawn command reader")?;
    Ok(rx)
}
