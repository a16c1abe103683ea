//! Per-deck timecode control
//!
//! Once per audio callback and per deck: feed the deck's two timecode
//! channels to the engine, then push the detected speed and volume into the
//! deck's [`PlaybackParameters`]. When nothing is detected the parameters are
//! left as they are, so a short dropout freezes the motion instead of
//! stopping the track.
//!
//! Nothing here logs once built: failed calls are counted in a
//! [`ControlStatus`] that the control thread reports.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use dscratch_core::config::TurntableConfig;
use dscratch_core::{DscratchEngine, PlayingParameters, TurntableHandle, VinylType};

use crate::error::{PlayerError, PlayerResult};
use crate::playback::PlaybackParameters;
use crate::status::ControlStatus;

/// Who drives a deck's playback parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    /// The timecoded vinyl
    #[default]
    Timecode,
    /// Something else (UI, keyboard); timecode is not analyzed
    Manual,
}

#[derive(Debug)]
struct DeckControl {
    handle: TurntableHandle,
    sink: Arc<PlaybackParameters>,
    mode: ControlMode,
}

/// Timecode control of a set of decks
///
/// Owns one turntable per deck; they are deleted when the process is dropped.
#[derive(Debug)]
pub struct TimecodeControlProcess {
    engine: Arc<DscratchEngine>,
    decks: Vec<DeckControl>,
    status: Arc<ControlStatus>,
}

impl TimecodeControlProcess {
    /// One turntable per sink, all playing `vinyl` captured at `sample_rate`
    pub fn new(
        engine: Arc<DscratchEngine>,
        sinks: Vec<Arc<PlaybackParameters>>,
        vinyl: VinylType,
        sample_rate: u32,
    ) -> PlayerResult<Self> {
        Self::build(engine, sinks, |engine, _deck| {
            engine.create_turntable(vinyl, sample_rate)
        })
    }

    /// Named turntables configured from `config`
    pub fn with_config(
        engine: Arc<DscratchEngine>,
        sinks: Vec<Arc<PlaybackParameters>>,
        names: &[String],
        config: &TurntableConfig,
        sample_rate: u32,
    ) -> PlayerResult<Self> {
        Self::build(engine, sinks, |engine, deck| {
            let handle = match names.get(deck) {
                Some(name) => engine.create_named_turntable(name, config.vinyl_type, sample_rate)?,
                None => engine.create_turntable(config.vinyl_type, sample_rate)?,
            };
            if let Err(e) = engine.apply_config(handle, config) {
                let _ = engine.delete_turntable(handle);
                return Err(e);
            }
            Ok(handle)
        })
    }

    fn build<F>(
        engine: Arc<DscratchEngine>,
        sinks: Vec<Arc<PlaybackParameters>>,
        mut create: F,
    ) -> PlayerResult<Self>
    where
        F: FnMut(&DscratchEngine, usize) -> dscratch_core::DscratchResult<TurntableHandle>,
    {
        if sinks.is_empty() {
            return Err(PlayerError::NoDecks);
        }

        // Dropping a partially built process deletes what was created
        let mut process = Self {
            engine,
            decks: Vec::with_capacity(sinks.len()),
            status: Arc::new(ControlStatus::new(sinks.len())),
        };
        for (deck, sink) in sinks.into_iter().enumerate() {
            let handle = create(process.engine.as_ref(), deck)
                .map_err(|source| PlayerError::Deck { deck, source })?;
            process.decks.push(DeckControl {
                handle,
                sink,
                mode: ControlMode::Timecode,
            });
        }
        log::info!("Timecode control ready for {} deck(s)", process.decks.len());
        Ok(process)
    }

    pub fn deck_count(&self) -> usize {
        self.decks.len()
    }

    pub fn engine(&self) -> &Arc<DscratchEngine> {
        &self.engine
    }

    /// Failure counters, for the control thread
    pub fn status(&self) -> &Arc<ControlStatus> {
        &self.status
    }

    /// Turntable analyzing `deck`
    pub fn handle(&self, deck: usize) -> PlayerResult<TurntableHandle> {
        self.deck(deck).map(|d| d.handle)
    }

    pub fn mode(&self, deck: usize) -> PlayerResult<ControlMode> {
        self.deck(deck).map(|d| d.mode)
    }

    pub fn set_mode(&mut self, deck: usize, mode: ControlMode) -> PlayerResult<()> {
        let control = self.decks.get_mut(deck).ok_or(PlayerError::UnknownDeck(deck))?;
        control.mode = mode;
        Ok(())
    }

    fn deck(&self, deck: usize) -> PlayerResult<&DeckControl> {
        self.decks.get(deck).ok_or(PlayerError::UnknownDeck(deck))
    }

    /// Analyze one buffer of `deck`'s timecode channels
    ///
    /// Returns the parameters pushed to the deck, `None` if the deck is in
    /// manual mode or no motion was detected.
    pub fn run(
        &mut self,
        deck: usize,
        left: &[f32],
        right: &[f32],
    ) -> PlayerResult<Option<PlayingParameters>> {
        self.run_with(deck, |engine, handle| {
            engine.analyze_recorded_data(handle, left, right)
        })
    }

    /// Same as [`run`](Self::run) on an interleaved capture buffer
    pub fn run_interleaved(
        &mut self,
        deck: usize,
        channels: usize,
        left_index: usize,
        right_index: usize,
        data: &[f32],
    ) -> PlayerResult<Option<PlayingParameters>> {
        self.run_with(deck, |engine, handle| {
            engine.analyze_recorded_data_interleaved(handle, channels, left_index, right_index, data)
        })
    }

    fn run_with<F>(&mut self, deck: usize, analyze: F) -> PlayerResult<Option<PlayingParameters>>
    where
        F: FnOnce(&DscratchEngine, TurntableHandle) -> dscratch_core::DscratchResult<()>,
    {
        let engine: &DscratchEngine = &self.engine;
        let control = self.decks.get_mut(deck).ok_or(PlayerError::UnknownDeck(deck))?;
        if control.mode == ControlMode::Manual {
            return Ok(None);
        }

        let found = analyze(engine, control.handle).and_then(|()| engine.playing_parameters(control.handle));
        match found {
            Ok(found) => {
                if let Some(params) = found {
                    control.sink.set_speed(params.speed);
                    control.sink.set_volume(params.volume);
                }
                Ok(found)
            }
            Err(source) => {
                self.status.record_failure(deck);
                Err(PlayerError::Deck { deck, source })
            }
        }
    }
}

impl Drop for TimecodeControlProcess {
    fn drop(&mut self) {
        for control in &self.decks {
            if let Err(e) = self.engine.delete_turntable(control.handle) {
                log::warn!("Failed to delete turntable {}: {}", control.handle, e);
            }
        }
    }
}
