//! dscratch-player - timecode monitor
//!
//! Opens the default capture device, runs timecode control for every
//! configured deck and prints the resulting playback parameters. Commands are
//! read from stdin:
//!
//! ```text
//! manual <deck>              hand a deck to manual control
//! timecode <deck>            give a deck back to its vinyl
//! rpm <deck> <33|45>
//! vinyl <deck> <name>        final_scratch | serato | mixvibes
//! channels <deck> <l> <r>    capture channels of a deck
//! status                     print turntable settings
//! quit
//! ```
//!
//! Decks are numbered from 1 on the command line.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use dscratch_core::config::load_config;
use dscratch_core::{DscratchEngine, TurntableHandle, VinylType};
use dscratch_player::config::default_player_config_path;
use dscratch_player::{
    command_channel, ControlMode, PlaybackParameters, PlayerConfig, SoundCaptureProcess,
    StatusReporter, TimecodeCommand, TimecodeCommandSender, TimecodeControlProcess,
};

const STATUS_INTERVAL: Duration = Duration::from_millis(500);

struct Deck {
    name: String,
    handle: TurntableHandle,
    params: Arc<PlaybackParameters>,
}

fn main() -> Result<()> {
    // RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("dscratch-player {} starting up", dscratch_core::api::version());

    let config_path = default_player_config_path();
    let config: PlayerConfig = load_config(&config_path);
    if config.decks.is_empty() {
        bail!("No deck configured in {:?}", config_path);
    }

    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .context("No capture device available")?;
    let supported = device
        .default_input_config()
        .context("Capture device has no default configuration")?;
    if supported.sample_format() != cpal::SampleFormat::F32 {
        bail!(
            "Capture device delivers {:?} samples, only f32 is supported",
            supported.sample_format()
        );
    }

    let stream_config: cpal::StreamConfig = supported.into();
    let channels = stream_config.channels as usize;
    let sample_rate = stream_config.sample_rate.0;
    if channels < config.required_channels() {
        bail!(
            "Capture device has {} channel(s), the deck routing needs {}",
            channels,
            config.required_channels()
        );
    }
    if sample_rate != config.sample_rate {
        log::info!(
            "Configured {}Hz, capture device runs at {}Hz; using the device rate",
            config.sample_rate,
            sample_rate
        );
    }
    log::info!(
        "Capture: {:?}, {} channels, {}Hz",
        device.name().unwrap_or_default(),
        channels,
        sample_rate
    );

    let engine = Arc::new(DscratchEngine::new());
    let sinks: Vec<_> = config
        .decks
        .iter()
        .map(|_| Arc::new(PlaybackParameters::new()))
        .collect();
    let mut control = TimecodeControlProcess::with_config(
        engine.clone(),
        sinks.clone(),
        &config.deck_names(),
        &config.turntable,
        sample_rate,
    )?;
    for (deck, deck_config) in config.decks.iter().enumerate() {
        control.set_mode(deck, deck_config.mode)?;
    }

    let decks = config
        .decks
        .iter()
        .zip(sinks)
        .enumerate()
        .map(|(deck, (deck_config, params))| {
            Ok(Deck {
                name: deck_config.name.clone(),
                handle: control.handle(deck)?,
                params,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let reporter = StatusReporter::new(control.status().clone());
    let (command_tx, command_rx) = command_channel();
    let mut capture = SoundCaptureProcess::new(control, config.routing(), command_rx)?;

    let stream = device
        .build_input_stream(
            &stream_config,
            move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                // Failures are counted in the control status and logged by
                // the status thread
                let _ = capture.process(data, channels);
            },
            move |err| {
                log::error!("Capture stream error: {}", err);
            },
            None,
        )
        .context("Failed to build capture stream")?;
    stream.play().context("Failed to start capture stream")?;
    log::info!("Capture stream started");

    let decks = Arc::new(decks);
    let running = Arc::new(AtomicBool::new(true));
    let status = {
        let decks = decks.clone();
        let running = running.clone();
        thread::Builder::new()
            .name("dscratch-status".to_string())
            .spawn(move || print_status(&decks, reporter, &running))
            .context("Failed to spawn status thread")?
    };

    let result = command_loop(&engine, &decks, command_tx);

    running.store(false, Ordering::Relaxed);
    let _ = status.join();
    drop(stream);
    log::info!("dscratch-player stopped");
    result
}

fn print_status(decks: &[Deck], mut reporter: StatusReporter, running: &AtomicBool) {
    let mut last_updates = vec![0u64; decks.len()];
    while running.load(Ordering::Relaxed) {
        thread::sleep(STATUS_INTERVAL);
        reporter.poll();
        let line: Vec<String> = decks
            .iter()
            .zip(last_updates.iter_mut())
            .map(|(deck, last)| {
                let updates = deck.params.updates();
                let marker = if updates == *last { " (held)" } else { "" };
                *last = updates;
                format!(
                    "{}: speed {:+.3} volume {:.2}{}",
                    deck.name,
                    deck.params.speed(),
                    deck.params.volume(),
                    marker
                )
            })
            .collect();
        println!("{}", line.join(" | "));
    }
}

fn command_loop(engine: &DscratchEngine, decks: &[Deck], mut commands: TimecodeCommandSender) -> Result<()> {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&verb, rest)) = words.split_first() else {
            continue;
        };
        if verb == "quit" || verb == "exit" {
            break;
        }
        if let Err(e) = run_command(engine, decks, &mut commands, verb, rest) {
            eprintln!("{:#}", e);
        }
    }
    Ok(())
}

fn run_command(
    engine: &DscratchEngine,
    decks: &[Deck],
    commands: &mut TimecodeCommandSender,
    verb: &str,
    args: &[&str],
) -> Result<()> {
    if verb == "status" {
        for deck in decks {
            println!("{}", engine.display_turntable(deck.handle)?);
        }
        return Ok(());
    }

    let deck_arg = args.first().context("Missing deck number")?;
    let number: usize = deck_arg.parse().with_context(|| format!("Bad deck number {}", deck_arg))?;
    let deck = number
        .checked_sub(1)
        .filter(|&d| d < decks.len())
        .with_context(|| format!("Deck {} does not exist", number))?;
    let handle = decks[deck].handle;
    let value = |i: usize| args.get(i).copied().with_context(|| format!("{} needs more arguments", verb));

    let command = match verb {
        "manual" => TimecodeCommand::SetMode {
            deck,
            mode: ControlMode::Manual,
        },
        "timecode" => TimecodeCommand::SetMode {
            deck,
            mode: ControlMode::Timecode,
        },
        "channels" => TimecodeCommand::SetChannels {
            deck,
            left_channel: value(1)?.parse().context("left channel")?,
            right_channel: value(2)?.parse().context("right channel")?,
        },
        "rpm" => {
            let rpm: u16 = value(1)?.parse().context("rpm")?;
            engine.set_rpm(handle, rpm)?;
            return Ok(());
        }
        "vinyl" => {
            let vinyl: VinylType = value(1)?.parse()?;
            engine.change_vinyl_type(handle, vinyl)?;
            return Ok(());
        }
        other => bail!("Unknown command {}", other),
    };

    if commands.send(command).is_err() {
        bail!("Command queue full, try again");
    }
    Ok(())
}
