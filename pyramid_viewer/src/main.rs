//! Standalone viewer binary.
//!
//! Usage:
//!   cargo run -p pyramid_viewer -- [--config pyramid.json] [--seed 42] [--v3-frac 12] [--frame-hz 30]
//!
//! The viewer builds a pyramid at startup, pulls a wireframe frame at a fixed
//! rate, and regenerates whenever the bound key is entered.
//!
//! Console commands:
//!   r / regen            - Regenerate the pyramid (r is the default binding)
//!   status               - Show generator status
//!   metrics              - Print the current metrics
//!   bind <key> <command> - Bind a key
//!   unbind <key>         - Remove a key binding
//!   cvarlist             - List tunables (pyr_v3_frac, pyr_len_min, ...)
//!   quit                 - Exit viewer

use std::env;
use std::io::{BufRead, Write};
use std::time::Duration;

use anyhow::{bail, Context};
use pyramid_shared::config::{clamp_v3_frac, GeneratorConfig};
use pyramid_shared::render::FrameRecorder;
use pyramid_viewer::input::InputEvent;
use pyramid_viewer::PyramidGenerator;
use tokio::sync::mpsc;
use tracing::{debug, info};

fn parse_args() -> anyhow::Result<GeneratorConfig> {
    let args: Vec<String> = env::args().collect();

    let mut cfg = match args.iter().position(|a| a == "--config") {
        Some(i) => {
            let Some(path) = args.get(i + 1) else {
                bail!("--config needs a path");
            };
            let text = std::fs::read_to_string(path).with_context(|| format!("read config {}", path))?;
            GeneratorConfig::from_json_str(&text).with_context(|| format!("load config {}", path))?
        }
        None => GeneratorConfig::default(),
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--seed" if i + 1 < args.len() => {
                cfg.seed = Some(args[i + 1].parse().context("--seed")?);
                i += 2;
            }
            "--v3-frac" if i + 1 < args.len() => {
                cfg.v3_frac = clamp_v3_frac(args[i + 1].parse().context("--v3-frac")?);
                i += 2;
            }
            "--frame-hz" if i + 1 < args.len() => {
                cfg.frame_hz = args[i + 1].parse().context("--frame-hz")?;
                i += 2;
            }
            _ => i += 1,
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cfg = parse_args()?;
    info!(v3_frac = cfg.v3_frac, seed = ?cfg.seed, frame_hz = cfg.frame_hz, "Starting viewer");

    let mut host = PyramidGenerator::new(&cfg).context("create generator")?;
    host.on_regenerate();

    // Set up console input channel.
    let (console_tx, mut console_rx) = mpsc::channel::<String>(32);

    // Spawn stdin reader thread.
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        loop {
            print!("] ");
            let _ = stdout.flush();
            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = line.trim().to_string();
            if !line.is_empty() && console_tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    println!(
        "Viewer ready. Press '{}' + Enter to regenerate, 'status' for info, 'quit' to exit.",
        cfg.regen_key
    );
    println!();

    let frame_interval = Duration::from_secs_f32(1.0 / cfg.frame_hz as f32);
    let mut next_frame = tokio::time::Instant::now();
    let mut recorder = FrameRecorder::default();

    loop {
        // Process console input.
        loop {
            match console_rx.try_recv() {
                Ok(line) => {
                    let Some(event) = InputEvent::classify(&line, &host.bindings) else {
                        continue;
                    };
                    match host.handle_input(event) {
                        Ok(output) => {
                            for line in output {
                                println!("{}", line);
                            }
                        }
                        Err(e) => println!("Error: {:#}", e),
                    }
                }
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    info!("Input closed");
                    return Ok(());
                }
            }
        }

        if host.quit_requested() {
            break;
        }

        let drawn = host.on_render_request(&mut recorder);
        if recorder.frames % (cfg.frame_hz as u64 * 10) == 0 {
            debug!(frame = recorder.frames, segments = drawn, calls = recorder.calls.len(), "Frame");
        }

        next_frame += frame_interval;
        tokio::time::sleep_until(next_frame).await;
    }

    info!(frames = host.frames(), regenerations = host.regenerations(), "Viewer stopped");
    Ok(())
}
