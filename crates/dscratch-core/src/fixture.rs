//! Timecode recordings with their expected speed
//!
//! Text format, one frame per line:
//!
//! ```text
//! # comment
//! <left>;<right>;<expected_speed>
//! ```
//!
//! An expected speed of `-99` (or a missing third field) means the frame
//! carries no expectation, e.g. while the filters settle after a speed change.
//! Replay groups consecutive frames sharing the same expectation into buffers
//! and checks the engine's speed at the end of each buffer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::api::DscratchEngine;
use crate::engine::TurntableHandle;
use crate::error::{DscratchError, DscratchResult};
use crate::types::{PlayingParameters, NO_NEW_SPEED_FOUND};
use crate::vinyl::{Rpm, TimecodeGenerator, VinylType};

/// Largest buffer replayed in one analysis call
pub const DEFAULT_REPLAY_BUFFER: usize = 512;

/// Speed tolerance of a replay
pub const SPEED_TOLERANCE: f32 = 0.0001;

/// One captured frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixtureFrame {
    pub left: f32,
    pub right: f32,
    pub expected_speed: Option<f32>,
}

/// Frames replayed by one analysis call
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureBuffer {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
    pub expected_speed: Option<f32>,
}

/// One constant-speed section of a synthesized recording
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixtureSegment {
    pub speed: f64,
    pub amplitude: f32,
    pub frames: usize,
}

impl FixtureSegment {
    pub fn new(speed: f64, amplitude: f32, frames: usize) -> Self {
        Self {
            speed,
            amplitude,
            frames,
        }
    }

    /// Needle lifted: no signal
    pub fn silence(frames: usize) -> Self {
        Self::new(0.0, 0.0, frames)
    }
}

/// A timecode recording
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimecodeFixture {
    pub frames: Vec<FixtureFrame>,
}

impl TimecodeFixture {
    pub fn parse(text: &str) -> DscratchResult<Self> {
        let mut frames = Vec::new();
        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            frames.push(parse_frame(line).map_err(|reason| DscratchError::InvalidFixture {
                line: number + 1,
                reason,
            })?);
        }
        Ok(Self { frames })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture {:?}", path))?;
        Self::parse(&text).with_context(|| format!("Failed to parse fixture {:?}", path))
    }

    pub fn write<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        for frame in &self.frames {
            let expected = frame.expected_speed.unwrap_or(NO_NEW_SPEED_FOUND);
            writeln!(out, "{};{};{}", frame.left, frame.right, expected)?;
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
        let mut out = BufWriter::new(file);
        self.write(&mut out)
            .and_then(|()| out.flush())
            .with_context(|| format!("Failed to write fixture {:?}", path))
    }

    /// Read a stereo WAV capture (no expectations)
    ///
    /// Integer samples are scaled to [-1, 1]. Returns the fixture and the
    /// sample rate of the file.
    pub fn load_wav(path: &Path) -> Result<(Self, u32)> {
        let mut reader =
            hound::WavReader::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        let spec = reader.spec();
        if spec.channels < 2 {
            anyhow::bail!("{:?} has {} channel(s), timecode needs 2", path, spec.channels);
        }

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .context("Failed to decode WAV samples")?,
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|s| s as f32 / scale))
                    .collect::<Result<_, _>>()
                    .context("Failed to decode WAV samples")?
            }
        };

        let frames = samples
            .chunks_exact(usize::from(spec.channels))
            .map(|frame| FixtureFrame {
                left: frame[0],
                right: frame[1],
                expected_speed: None,
            })
            .collect();
        Ok((Self { frames }, spec.sample_rate))
    }

    /// Write the frames as a 32-bit float stereo WAV
    pub fn save_wav(&self, path: &Path, sample_rate: u32) -> Result<()> {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec)
            .with_context(|| format!("Failed to create {:?}", path))?;
        for frame in &self.frames {
            writer.write_sample(frame.left)?;
            writer.write_sample(frame.right)?;
        }
        writer.finalize().context("Failed to finalize WAV")?;
        Ok(())
    }

    /// Ideal recording of `segments`, each expecting its speed once `settle`
    /// frames have passed; silent segments expect nothing
    pub fn synthesize(
        vinyl: VinylType,
        rpm: Rpm,
        sample_rate: u32,
        segments: &[FixtureSegment],
        settle: usize,
    ) -> Self {
        let mut generator = TimecodeGenerator::new(vinyl, rpm, sample_rate);
        let mut frames = Vec::with_capacity(segments.iter().map(|s| s.frames).sum());
        let mut left = Vec::new();
        let mut right = Vec::new();

        for segment in segments {
            left.resize(segment.frames, 0.0);
            right.resize(segment.frames, 0.0);
            generator.fill(segment.speed, segment.amplitude, &mut left, &mut right);

            let audible = segment.amplitude > 0.0;
            frames.extend(left.iter().zip(&right).enumerate().map(|(i, (&l, &r))| {
                FixtureFrame {
                    left: l,
                    right: r,
                    expected_speed: (audible && i >= settle).then_some(segment.speed as f32),
                }
            }));
        }
        Self { frames }
    }

    /// Split into analysis buffers of at most `max_frames`, never mixing two
    /// expectations in one buffer
    pub fn buffers(&self, max_frames: usize) -> Vec<FixtureBuffer> {
        let max_frames = max_frames.max(1);
        let mut buffers: Vec<FixtureBuffer> = Vec::new();
        for frame in &self.frames {
            let start_new = match buffers.last() {
                Some(b) => b.left.len() >= max_frames || b.expected_speed != frame.expected_speed,
                None => true,
            };
            if start_new {
                buffers.push(FixtureBuffer {
                    left: Vec::with_capacity(max_frames),
                    right: Vec::with_capacity(max_frames),
                    expected_speed: frame.expected_speed,
                });
            }
            if let Some(buffer) = buffers.last_mut() {
                buffer.left.push(frame.left);
                buffer.right.push(frame.right);
            }
        }
        buffers
    }
}

fn parse_frame(line: &str) -> Result<FixtureFrame, String> {
    let fields: Vec<&str> = line.split(';').map(str::trim).collect();
    if !(2..=3).contains(&fields.len()) {
        return Err(format!("expected 2 or 3 fields, found {}", fields.len()));
    }
    let number = |s: &str| {
        s.parse::<f32>()
            .map_err(|e| format!("{:?} is not a number: {}", s, e))
    };
    let expected = match fields.get(2) {
        Some(s) => Some(number(s)?).filter(|&v| v != NO_NEW_SPEED_FOUND),
        None => None,
    };
    Ok(FixtureFrame {
        left: number(fields[0])?,
        right: number(fields[1])?,
        expected_speed: expected,
    })
}

/// A buffer whose speed missed its expectation
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayMismatch {
    pub buffer: usize,
    pub expected: f32,
    pub found: Option<PlayingParameters>,
}

/// Outcome of replaying a fixture
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayReport {
    pub buffers: usize,
    /// Buffers that carried an expectation
    pub checked: usize,
    pub max_error: f32,
    pub mismatches: Vec<ReplayMismatch>,
}

impl ReplayReport {
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Replay `fixture` on a live turntable, calling `observe` after each buffer
pub fn replay<F>(
    engine: &DscratchEngine,
    handle: TurntableHandle,
    fixture: &TimecodeFixture,
    max_frames: usize,
    mut observe: F,
) -> DscratchResult<ReplayReport>
where
    F: FnMut(usize, &FixtureBuffer, Option<PlayingParameters>),
{
    let mut report = ReplayReport::default();
    for (index, buffer) in fixture.buffers(max_frames).iter().enumerate() {
        engine.analyze_recorded_data(handle, &buffer.left, &buffer.right)?;
        let found = engine.playing_parameters(handle)?;
        observe(index, buffer, found);
        report.buffers += 1;

        let Some(expected) = buffer.expected_speed else {
            continue;
        };
        report.checked += 1;
        match found {
            Some(p) if (p.speed - expected).abs() < SPEED_TOLERANCE => {
                report.max_error = report.max_error.max((p.speed - expected).abs());
            }
            _ => report.mismatches.push(ReplayMismatch {
                buffer: index,
                expected,
                found,
            }),
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 44100;

    fn session() -> Vec<FixtureSegment> {
        vec![
            FixtureSegment::new(1.0, 0.5, 8192),
            FixtureSegment::new(0.5, 0.4, 8192),
            FixtureSegment::new(-1.0, 0.5, 8192),
            FixtureSegment::silence(4096),
            FixtureSegment::new(1.0, 0.3, 8192),
        ]
    }

    #[test]
    fn test_parse_fields_and_comments() {
        let text = "# capture\n0.5;-0.25;1.0\n\n0.1;0.2;-99\n0.3;0.4\n";
        let fixture = TimecodeFixture::parse(text).unwrap();
        assert_eq!(fixture.frames.len(), 3);
        assert_eq!(fixture.frames[0].expected_speed, Some(1.0));
        assert_eq!(fixture.frames[0].right, -0.25);
        assert_eq!(fixture.frames[1].expected_speed, None);
        assert_eq!(fixture.frames[2].expected_speed, None);
    }

    #[test]
    fn test_parse_errors_carry_line() {
        let err = TimecodeFixture::parse("0.1;0.2;1\n0.1;abc;1\n").unwrap_err();
        assert!(matches!(err, DscratchError::InvalidFixture { line: 2, .. }));
        assert!(TimecodeFixture::parse("0.1\n").is_err());
    }

    #[test]
    fn test_buffers_split_on_expectation_and_size() {
        let frame = |e| FixtureFrame {
            left: 0.0,
            right: 0.0,
            expected_speed: e,
        };
        let mut frames = vec![frame(None); 3];
        frames.extend(vec![frame(Some(1.0)); 5]);
        let fixture = TimecodeFixture { frames };

        let sizes: Vec<_> = fixture.buffers(4).iter().map(|b| b.left.len()).collect();
        assert_eq!(sizes, vec![3, 4, 1]);
        assert_eq!(fixture.buffers(4)[1].expected_speed, Some(1.0));
    }

    #[test]
    fn test_text_round_trip_is_exact() {
        let fixture = TimecodeFixture::synthesize(
            VinylType::Serato,
            Rpm::Rpm33,
            SAMPLE_RATE,
            &[FixtureSegment::new(0.7, 0.5, 300)],
            100,
        );
        let mut text = Vec::new();
        fixture.write(&mut text).unwrap();
        let parsed = TimecodeFixture::parse(std::str::from_utf8(&text).unwrap()).unwrap();
        assert_eq!(parsed, fixture);
    }

    #[test]
    fn test_recorded_sessions_replay_for_every_format() {
        for vinyl in VinylType::ALL {
            for rpm in Rpm::ALL {
                let fixture = TimecodeFixture::synthesize(vinyl, rpm, SAMPLE_RATE, &session(), 4096);

                let engine = DscratchEngine::new();
                let handle = engine.create_turntable(vinyl, SAMPLE_RATE).unwrap();
                engine.set_rpm(handle, rpm.value()).unwrap();

                let report =
                    replay(&engine, handle, &fixture, DEFAULT_REPLAY_BUFFER, |_, _, _| {}).unwrap();
                assert!(report.checked > 0);
                assert!(
                    report.passed(),
                    "{} at {}: {:?}",
                    vinyl,
                    rpm,
                    &report.mismatches[..report.mismatches.len().min(3)]
                );
            }
        }
    }

    #[test]
    fn test_fixture_file_and_wav_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = TimecodeFixture::synthesize(
            VinylType::Mixvibes,
            Rpm::Rpm45,
            SAMPLE_RATE,
            &[FixtureSegment::new(1.0, 0.5, 2048)],
            1024,
        );

        let text_path = dir.path().join("capture.txt");
        fixture.save(&text_path).unwrap();
        assert_eq!(TimecodeFixture::load(&text_path).unwrap(), fixture);

        let wav_path = dir.path().join("capture.wav");
        fixture.save_wav(&wav_path, SAMPLE_RATE).unwrap();
        let (wav, rate) = TimecodeFixture::load_wav(&wav_path).unwrap();
        assert_eq!(rate, SAMPLE_RATE);
        assert_eq!(wav.frames.len(), fixture.frames.len());
        for (a, b) in wav.frames.iter().zip(&fixture.frames) {
            assert_eq!((a.left, a.right), (b.left, b.right));
            assert_eq!(a.expected_speed, None);
        }
    }
}
