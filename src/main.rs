// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tokio::sync::broadcast::error::TryRecvError;
use tracing::Level;

use chordpad::config::{validate_config, ConfigEvent, ConfigWatcher, SessionFile};
use chordpad::grid::{generate_grid, validate_width, GridParams, RowType, DEFAULT_GRID_WIDTH};
use chordpad::music::{Pitch, Scale, TensionLevel};
use chordpad::output::{print_midi_outputs, shared, LogSink, MidirSink};
use chordpad::progression::{Engine, EngineEvent};
use chordpad::timing::beat_duration;

fn print_usage() {
    println!("chordpad - Harmonic navigation engine");
    println!();
    println!("Usage: chordpad [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --grid [ROOT] [WIDTH] [TENSION]  Print the chord grid (default C 5 0)");
    println!("  --list-midi                      List available MIDI outputs");
    println!("  --auto <FILE> [MEASURES]         Run auto mode from a session file (YAML or TOML)");
    println!("  --verbose, -v                    Debug logging");
    println!("  --help                           Show this help message");
}

fn print_grid(root: Pitch, width: usize, tension: TensionLevel) {
    let params = GridParams::new(root, width, tension);
    let grid = generate_grid(&params);

    println!(
        "{}, width {}, {}",
        Scale::major(params.current_root.simplify()),
        params.grid_width,
        tension.label()
    );
    println!("(bracketed chords are outside the key)");
    println!();

    print!("{:6}", "");
    for cell in &grid.same {
        print!("{:>10}", cell.col_index);
    }
    println!();

    for row in RowType::ALL {
        print!("{:6}", row.to_string());
        for cell in grid.row(row) {
            let name = if cell.is_in_key {
                cell.full_name.clone()
            } else {
                format!("({})", cell.full_name)
            };
            print!("{:>10}", name);
        }
        println!();
    }
}

fn apply_reload(engine: &Engine, previous: &SessionFile, config: &SessionFile) -> Result<()> {
    let params = config.grid_params()?;
    let auto = config.auto_state()?;

    engine.set_tension(params.tension_level);
    engine.set_width(params.grid_width)?;
    engine.set_direction(auto.direction);
    engine.set_bpm(auto.bpm)?;
    engine.set_velocity(config.output.velocity)?;
    // Only an edited root moves the grid; otherwise auto mode keeps walking
    if config.grid.root != previous.grid.root {
        engine.navigate(params.current_root);
    }
    if auto.is_active != engine.is_auto_active() {
        engine.set_auto_active(auto.is_active);
    }
    Ok(())
}

async fn run_auto(path: &Path, measures: Option<u64>) -> Result<()> {
    let mut config = validate_config(path)?;
    let engine = Engine::new(config.engine_config()?, shared(LogSink::default()))?;

    if let Some(port) = &config.output.midi_port {
        let sink = MidirSink::connect(port, config.output.channel)
            .with_context(|| format!("Failed to open MIDI output '{}'", port))?;
        engine.set_external_output(Some(shared(sink)));
    }

    let watcher = ConfigWatcher::new(path, None)?;
    let mut events = engine.subscribe();
    let session = engine.session();

    println!(
        "Auto mode from {} at {} BPM, direction {} (Ctrl+C to stop)",
        engine.current_root(),
        config.auto.bpm,
        config.auto.direction
    );
    engine.set_auto_active(true);

    let mut poll = tokio::time::interval(Duration::from_millis(50));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = poll.tick() => {}
        }

        loop {
            match events.try_recv() {
                Ok(EngineEvent::ChordPlayed { name, source }) => println!("{:>8}  {}", name, source),
                Ok(EngineEvent::RootChanged { from, to }) => tracing::info!("Root {} -> {}", from, to),
                Ok(EngineEvent::AutoStateChanged { active }) => tracing::info!("Auto mode active: {}", active),
                Ok(EngineEvent::OutputError { target, message }) => {
                    tracing::warn!("Output error on {}: {}", target, message)
                }
                Err(TryRecvError::Lagged(skipped)) => tracing::warn!("Skipped {} events", skipped),
                Err(_) => break,
            }
        }

        for event in watcher.recv_all() {
            match event {
                ConfigEvent::Reloaded(reloaded) => match apply_reload(&engine, &config, &reloaded) {
                    Ok(()) => {
                        tracing::info!("Reloaded {:?}", path);
                        config = *reloaded;
                    }
                    Err(e) => tracing::warn!("Could not apply reloaded session: {:#}", e),
                },
                ConfigEvent::Error(message) => tracing::warn!("{}", message),
                ConfigEvent::FileDeleted(deleted) => tracing::warn!("Session file removed: {:?}", deleted),
            }
        }

        let played = session
            .lock()
            .map_err(|_| anyhow!("Session lock poisoned"))?
            .clock()
            .measures();
        if measures.is_some_and(|limit| played >= limit) {
            // Let the last measure ring for its beat
            tokio::time::sleep(beat_duration(config.auto.bpm)).await;
            break;
        }
    }

    engine.set_auto_active(false);
    // Armed note-offs fire within one beat
    tokio::time::sleep(beat_duration(config.auto.bpm)).await;
    engine.release();
    println!("Stopped.");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut args: Vec<String> = env::args().collect();

    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    args.retain(|a| a != "--verbose" && a != "-v");
    tracing_subscriber::fmt()
        .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .init();

    if args.len() < 2 {
        println!("chordpad - Harmonic navigation engine");
        println!("Run with --help for usage information");
        return Ok(());
    }

    match args[1].as_str() {
        "--grid" => {
            let root: Pitch = match args.get(2) {
                Some(root) => root.parse()?,
                None => "C".parse()?,
            };
            let width: usize = match args.get(3) {
                Some(width) => width
                    .parse()
                    .map_err(|_| anyhow!("Invalid grid width: {}", width))?,
                None => DEFAULT_GRID_WIDTH,
            };
            validate_width(width)?;
            let tension = match args.get(4) {
                Some(level) => {
                    let level: u8 = level
                        .parse()
                        .map_err(|_| anyhow!("Invalid tension level: {}", level))?;
                    TensionLevel::try_from(level)?
                }
                None => TensionLevel::default(),
            };
            print_grid(root, width, tension);
        }
        "--list-midi" => {
            print_midi_outputs()?;
        }
        "--auto" => {
            if args.len() < 3 {
                eprintln!("Error: --auto requires a session file");
                std::process::exit(1);
            }
            let measures = match args.get(3) {
                Some(count) => Some(
                    count
                        .parse::<u64>()
                        .map_err(|_| anyhow!("Invalid measure count: {}", count))?,
                ),
                None => None,
            };
            run_auto(Path::new(&args[2]), measures).await?;
        }
        "--help" | "-h" => {
            print_usage();
        }
        _ => {
            eprintln!("Unknown option: {}", args[1]);
            print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}
