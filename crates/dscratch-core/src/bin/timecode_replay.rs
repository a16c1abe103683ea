//! timecode-replay - run a timecode recording through the engine
//!
//! ```text
//! timecode-replay <capture.wav|capture.txt> [options]
//! timecode-replay --synthesize <out.txt|out.wav> [options]
//!
//! options:
//!   --vinyl <name>        final_scratch | serato | mixvibes (default: serato)
//!   --rpm <33|45>         disc speed (default: 33)
//!   --sample-rate <hz>    for text fixtures and synthesis (default: 44100)
//!   --buffer <frames>     frames per analysis call (default: 512)
//!   --config <file.yaml>  turntable settings applied before replay
//!   --quiet               only print the summary
//! ```
//!
//! Text fixtures carry an expected speed per frame; the exit status is non-zero
//! if any buffer misses it.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};

use dscratch_core::config::{try_load_config, TurntableConfig};
use dscratch_core::fixture::{self, FixtureSegment, TimecodeFixture, DEFAULT_REPLAY_BUFFER};
use dscratch_core::{DscratchEngine, Rpm, VinylType};

struct Args {
    input: PathBuf,
    synthesize: bool,
    vinyl: VinylType,
    rpm: Rpm,
    sample_rate: u32,
    buffer: usize,
    config: Option<PathBuf>,
    quiet: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut input = None;
    let mut parsed = Args {
        input: PathBuf::new(),
        synthesize: false,
        vinyl: VinylType::default(),
        rpm: Rpm::default(),
        sample_rate: 44100,
        buffer: DEFAULT_REPLAY_BUFFER,
        config: None,
        quiet: false,
    };

    while let Some(arg) = args.next() {
        let mut value = |name: &str| args.next().with_context(|| format!("{} needs a value", name));
        match arg.as_str() {
            "--synthesize" => {
                parsed.synthesize = true;
                input = Some(PathBuf::from(value("--synthesize")?));
            }
            "--vinyl" => parsed.vinyl = value("--vinyl")?.parse()?,
            "--rpm" => {
                let rpm: u16 = value("--rpm")?.parse().context("--rpm")?;
                parsed.rpm = Rpm::try_from(rpm)?;
            }
            "--sample-rate" => {
                parsed.sample_rate = value("--sample-rate")?.parse().context("--sample-rate")?
            }
            "--buffer" => parsed.buffer = value("--buffer")?.parse().context("--buffer")?,
            "--config" => parsed.config = Some(PathBuf::from(value("--config")?)),
            "--quiet" => parsed.quiet = true,
            other if other.starts_with("--") => bail!("Unknown option {}", other),
            other => input = Some(PathBuf::from(other)),
        }
    }

    parsed.input = input.context("Missing input file (see --help in the source header)")?;
    Ok(parsed)
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
}

/// A short DJ gesture: play, slow down, scratch back, lift, drop
fn demo_session(sample_rate: u32) -> Vec<FixtureSegment> {
    let second = sample_rate as usize;
    vec![
        FixtureSegment::new(1.0, 0.5, second),
        FixtureSegment::new(0.5, 0.5, second / 2),
        FixtureSegment::new(-1.5, 0.45, second / 4),
        FixtureSegment::silence(second / 4),
        FixtureSegment::new(1.0, 0.5, second),
    ]
}

fn synthesize(args: &Args) -> Result<()> {
    let settle = args.sample_rate as usize / 10;
    let fixture = TimecodeFixture::synthesize(
        args.vinyl,
        args.rpm,
        args.sample_rate,
        &demo_session(args.sample_rate),
        settle,
    );
    if is_wav(&args.input) {
        fixture.save_wav(&args.input, args.sample_rate)?;
    } else {
        fixture.save(&args.input)?;
    }
    println!(
        "Wrote {} frames of {} at {} rpm to {:?}",
        fixture.frames.len(),
        args.vinyl,
        args.rpm,
        args.input
    );
    Ok(())
}

fn run(args: &Args) -> Result<bool> {
    let (recording, sample_rate) = if is_wav(&args.input) {
        TimecodeFixture::load_wav(&args.input)?
    } else {
        (TimecodeFixture::load(&args.input)?, args.sample_rate)
    };
    log::info!(
        "Replaying {} frames from {:?} at {}Hz",
        recording.frames.len(),
        args.input,
        sample_rate
    );

    let engine = DscratchEngine::new();
    let handle = engine.create_named_turntable("replay", args.vinyl, sample_rate)?;
    engine.set_rpm(handle, args.rpm.value())?;
    if let Some(path) = &args.config {
        let config: TurntableConfig =
            try_load_config(path)?.with_context(|| format!("{:?} does not exist", path))?;
        engine.apply_config(handle, &config)?;
    }
    if !args.quiet {
        println!("{}", engine.display_turntable(handle)?);
    }

    let quiet = args.quiet;
    let mut position = 0usize;
    let report = fixture::replay(&engine, handle, &recording, args.buffer, |index, buffer, found| {
        let seconds = position as f64 / f64::from(sample_rate);
        position += buffer.left.len();
        if quiet {
            return;
        }
        let found = match found {
            Some(p) => format!("speed {:+.4}  volume {:.3}", p.speed, p.volume),
            None => "not found".to_string(),
        };
        match buffer.expected_speed {
            Some(expected) => println!("{:6} {:9.3}s  {}  (expected {:+.4})", index, seconds, found, expected),
            None => println!("{:6} {:9.3}s  {}", index, seconds, found),
        }
    })?;

    println!(
        "{} buffers, {} checked, {} mismatched, max error {:.6}",
        report.buffers,
        report.checked,
        report.mismatches.len(),
        report.max_error
    );
    for mismatch in report.mismatches.iter().take(10) {
        println!(
            "  buffer {}: expected {:+.4}, found {:?}",
            mismatch.buffer, mismatch.expected, mismatch.found
        );
    }
    Ok(report.passed())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let result = parse_args().and_then(|args| {
        if args.synthesize {
            synthesize(&args).map(|()| true)
        } else {
            run(&args)
        }
    });

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}
