//! Evaluate the force field of a scene at given probe positions
//!
//! No device is involved; this prints what the servo loop would command.

use anyhow::{bail, Context, Result};
use clap::Parser;
use hapticfield_algorithms::{CoulombField, FieldParams};
use hapticfield_core::{ContactPolicy, ForceField, HapticConfig, Point3d, Polarity};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "field_probe", about = "Print Coulomb field forces at probe positions")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scene file, overrides scene.path from the configuration
    #[arg(short, long)]
    scene: Option<PathBuf>,

    /// Evaluate with negative polarity
    #[arg(long)]
    negative: bool,

    /// Resolve overlaps with the nearest obstacle instead of the first found
    #[arg(long)]
    nearest: bool,

    /// Probe positions in device coordinates, as x,y,z
    #[arg(required = true, allow_hyphen_values = true)]
    positions: Vec<String>,
}

fn parse_position(text: &str) -> Result<Point3d> {
    let coords = text
        .split(',')
        .map(|part| part.trim().parse::<f64>().with_context(|| format!("invalid coordinate {:?}", part)))
        .collect::<Result<Vec<_>>>()?;
    match coords.as_slice() {
        [x, y, z] => Ok(Point3d::new(*x, *y, *z)),
        _ => bail!("expected x,y,z but got {:?}", text),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => HapticConfig::load(path)?,
        None => HapticConfig::default(),
    };
    if let Some(scene) = args.scene {
        config.scene.path = scene;
    }
    if args.nearest {
        config.field.contact_policy = ContactPolicy::Nearest;
    }

    let obstacles = hapticfield_io::load_scene(&config.scene)?;
    let field = CoulombField::new(Arc::new(obstacles), FieldParams::try_from(&config.field)?);
    let polarity = if args.negative { Polarity::Negative } else { Polarity::Positive };

    println!("{} obstacles, polarity {}", field.obstacles().len(), polarity);
    for text in &args.positions {
        let probe = parse_position(text)?;
        let force = field.force_at(&probe, polarity);
        let contacts = field.contacts(&probe);
        println!(
            "({:.3}, {:.3}, {:.3}) -> force ({:.6}, {:.6}, {:.6}) |{:.6}| contacts {}",
            probe.x,
            probe.y,
            probe.z,
            force.x,
            force.y,
            force.z,
            force.norm(),
            contacts.len()
        );
    }
    Ok(())
}
