//! pinch_keyboard: interactive entry point.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use pinch_keyboard::app;
use pinch_keyboard::config::AppConfig;
use pinch_keyboard::logging;

/// Type by pinching over an on-screen keyboard.
#[derive(Parser, Debug)]
#[command(name = "pinch_keyboard", version, about)]
struct Args {
    /// TOML config file; built-in defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use the test pattern and drive the hand with the mouse
    #[arg(long)]
    simulate: bool,

    /// Override `camera.index`
    #[arg(long)]
    camera_index: Option<u32>,

    /// Enable debug logging (RUST_LOG may refine it)
    #[arg(short, long)]
    debug: bool,

    /// Print the effective config as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None       => AppConfig::default(),
    };
    if let Some(index) = args.camera_index {
        cfg.camera.index = index;
    }

    if args.print_config {
        print!("{}", cfg.to_toml()?);
        return Ok(());
    }

    logging::init(args.debug || cfg.debug_logging);

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Pinch Keyboard: point, pinch, type                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let simulate = args.simulate || !cfg!(feature = "camera");
    if simulate {
        println!("  Mode: Mouse simulation  (use --features camera for a webcam)");
        println!("  Move the mouse to point, hold the left button to pinch.");
    } else {
        println!("  Mode: Camera {}  ({:?} hand detector)", cfg.camera.index, cfg.detector.backend);
    }
    println!("  Press Q or Esc to quit.");
    println!();

    let text = app::run(&cfg, args.simulate)?;
    info!(chars = text.chars().count(), "session finished");

    println!("Typed text: {:?}", text);
    Ok(())
}
