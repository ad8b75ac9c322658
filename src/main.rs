//! Headless locomotion runner.
//!
//! Usage:
//!   strider [--config tuning.toml] [--script tour] [--fps 60] [--frames N] [--json]
//!
//! Replays a scripted input sequence against the demo scene and logs a
//! summary. With `--json`, every frame is printed as one JSON line.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use strider::config::TuningConfig;
use strider::game::script::{InputScript, ScriptPlayer};
use strider::game::Session;

#[derive(Parser)]
#[command(name = "strider")]
#[command(about = "Third-person locomotion demo runner", long_about = None)]
struct Cli {
    /// Tuning file (TOML); defaults are used when omitted
    #[arg(short, long, env = "STRIDER_CONFIG")]
    config: Option<PathBuf>,

    /// Scripted input sequence to replay
    #[arg(short, long, value_enum, default_value = "tour")]
    script: InputScript,

    /// Simulated frames per second
    #[arg(long, default_value = "60")]
    fps: u32,

    /// Frame count; defaults to the length of the script
    #[arg(long)]
    frames: Option<u64>,

    /// Print one JSON snapshot per frame to stdout
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.fps == 0 {
        anyhow::bail!("--fps must be at least 1");
    }

    let tuning = match &cli.config {
        Some(path) => TuningConfig::from_file(path)
            .with_context(|| format!("load tuning from {}", path.display()))?,
        None => TuningConfig::default(),
    };

    let dt = 1.0 / cli.fps as f32;
    let frames = cli
        .frames
        .unwrap_or_else(|| (cli.script.duration() / dt).ceil() as u64);
    info!(script = ?cli.script, fps = cli.fps, frames, "Starting run");

    let mut session = Session::new(tuning).context("create session")?;
    let origin = session.tuning().character.spawn;
    let mut player = ScriptPlayer::new(cli.script);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut last = None;
    for _ in 0..frames {
        for event in player.advance(dt) {
            session.handle_input(&event);
        }
        let snapshot = session.frame(dt);
        if cli.json {
            serde_json::to_writer(&mut out, &snapshot).context("write snapshot")?;
            writeln!(out).context("write snapshot")?;
        }
        last = Some(snapshot);
    }
    out.flush().context("flush stdout")?;

    let stats = session.stats();
    if let Some(last) = last {
        let travelled = ((last.position[0] - origin[0]).powi(2)
            + (last.position[2] - origin[2]).powi(2))
        .sqrt();
        info!(
            ticks = stats.ticks,
            skipped = stats.skipped_ticks,
            jumps = stats.jumps,
            landings = stats.landings,
            travelled,
            position = ?last.position,
            grounded = last.grounded,
            "Run complete"
        );
    }
    Ok(())
}
