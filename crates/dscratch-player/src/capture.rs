//! Sound capture process
//!
//! Runs inside the capture stream callback. Each callback carries one
//! interleaved buffer holding every deck's timecode channels; the process
//! applies pending commands, then hands each deck its channel pair.

use crate::command::TimecodeCommand;
use crate::error::{PlayerError, PlayerResult};
use crate::timecode::TimecodeControlProcess;

/// Capture channels carrying one deck's timecode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelPair {
    pub left: usize,
    pub right: usize,
}

impl ChannelPair {
    pub fn new(left: usize, right: usize) -> Self {
        Self { left, right }
    }
}

/// Routes a capture buffer to the timecode control of every deck
pub struct SoundCaptureProcess {
    control: TimecodeControlProcess,
    routing: Vec<ChannelPair>,
    commands: rtrb::Consumer<TimecodeCommand>,
}

impl SoundCaptureProcess {
    /// `routing[deck]` gives the channels of `deck`; one entry per deck
    pub fn new(
        control: TimecodeControlProcess,
        routing: Vec<ChannelPair>,
        commands: rtrb::Consumer<TimecodeCommand>,
    ) -> PlayerResult<Self> {
        if routing.len() != control.deck_count() {
            return Err(PlayerError::RoutingMismatch {
                routes: routing.len(),
                decks: control.deck_count(),
            });
        }
        Ok(Self {
            control,
            routing,
            commands,
        })
    }

    pub fn control(&self) -> &TimecodeControlProcess {
        &self.control
    }

    pub fn routing(&self) -> &[ChannelPair] {
        &self.routing
    }

    /// Process one interleaved capture buffer of `channels` channels
    ///
    /// Every deck is run even if an earlier one fails; the first failure is
    /// returned. Failures are also counted in the control status.
    pub fn process(&mut self, data: &[f32], channels: usize) -> PlayerResult<()> {
        self.apply_commands();

        let mut first_error = None;
        for (deck, pair) in self.routing.iter().enumerate() {
            if let Err(e) = self
                .control
                .run_interleaved(deck, channels, pair.left, pair.right, data)
            {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Commands naming an unknown deck are dropped and counted
    fn apply_commands(&mut self) {
        while let Ok(cmd) = self.commands.pop() {
            let applied = match cmd {
                TimecodeCommand::SetMode { deck, mode } => self.control.set_mode(deck, mode).is_ok(),
                TimecodeCommand::SetChannels {
                    deck,
                    left_channel,
                    right_channel,
                } => match self.routing.get_mut(deck) {
                    Some(pair) => {
                        *pair = ChannelPair::new(left_channel, right_channel);
                        true
                    }
                    None => false,
                },
            };
            if !applied {
                self.control.status().record_rejected_command();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use dscratch_core::vinyl::TimecodeGenerator;
    use dscratch_core::{DscratchEngine, Rpm, VinylType};

    use crate::command::command_channel;
    use crate::playback::PlaybackParameters;
    use crate::timecode::ControlMode;

    const SAMPLE_RATE: u32 = 44100;
    const FRAMES: usize = 512;
    const CHANNELS: usize = 4;

    fn setup(decks: usize) -> (Vec<Arc<PlaybackParameters>>, TimecodeControlProcess) {
        let engine = Arc::new(DscratchEngine::new());
        let sinks: Vec<_> = (0..decks).map(|_| Arc::new(PlaybackParameters::new())).collect();
        let control =
            TimecodeControlProcess::new(engine, sinks.clone(), VinylType::Serato, SAMPLE_RATE).unwrap();
        (sinks, control)
    }

    /// Deck 1 timecode on channels 0/1, deck 2 on channels 2/3
    fn fill(generators: &mut [TimecodeGenerator], speeds: &[f64], data: &mut [f32]) {
        for (deck, generator) in generators.iter_mut().enumerate() {
            generator.fill_interleaved(speeds[deck], 0.5, data, CHANNELS, deck * 2, deck * 2 + 1);
        }
    }

    fn generators() -> Vec<TimecodeGenerator> {
        (0..2)
            .map(|_| TimecodeGenerator::new(VinylType::Serato, Rpm::Rpm33, SAMPLE_RATE))
            .collect()
    }

    #[test]
    fn test_routing_must_cover_decks() {
        let (_sinks, control) = setup(2);
        let (_tx, rx) = command_channel();
        let result = SoundCaptureProcess::new(control, vec![ChannelPair::new(0, 1)], rx);
        assert!(matches!(
            result,
            Err(PlayerError::RoutingMismatch { routes: 1, decks: 2 })
        ));
    }

    #[test]
    fn test_each_deck_follows_its_channels() {
        let (sinks, control) = setup(2);
        let (_tx, rx) = command_channel();
        let routing = vec![ChannelPair::new(0, 1), ChannelPair::new(2, 3)];
        let mut capture = SoundCaptureProcess::new(control, routing, rx).unwrap();
        let mut gens = generators();

        let mut data = vec![0.0; FRAMES * CHANNELS];
        for _ in 0..20 {
            fill(&mut gens, &[1.0, -0.5], &mut data);
            capture.process(&data, CHANNELS).unwrap();
        }
        assert!((sinks[0].speed() - 1.0).abs() < 0.0001);
        assert!((sinks[1].speed() + 0.5).abs() < 0.0001);
    }

    #[test]
    fn test_commands_applied_before_analysis() {
        let (sinks, control) = setup(2);
        let (mut tx, rx) = command_channel();
        let routing = vec![ChannelPair::new(0, 1), ChannelPair::new(2, 3)];
        let mut capture = SoundCaptureProcess::new(control, routing, rx).unwrap();
        let mut gens = generators();

        // Deck 2 reads deck 1's channels, deck 1 is handed to manual control
        tx.send(TimecodeCommand::SetChannels {
            deck: 1,
            left_channel: 0,
            right_channel: 1,
        })
        .unwrap();
        tx.send(TimecodeCommand::SetMode {
            deck: 0,
            mode: ControlMode::Manual,
        })
        .unwrap();
        tx.send(TimecodeCommand::SetMode {
            deck: 7,
            mode: ControlMode::Manual,
        })
        .unwrap();

        let mut data = vec![0.0; FRAMES * CHANNELS];
        for _ in 0..20 {
            fill(&mut gens, &[0.75, -1.0], &mut data);
            capture.process(&data, CHANNELS).unwrap();
        }
        assert_eq!(capture.routing()[1], ChannelPair::new(0, 1));
        assert_eq!(capture.control().mode(0), Ok(ControlMode::Manual));
        assert_eq!(capture.control().status().rejected_commands(), 1);
        assert_eq!(sinks[0].updates(), 0);
        assert!((sinks[1].speed() - 0.75).abs() < 0.0001);
    }

    #[test]
    fn test_failing_deck_does_not_stop_others() {
        let (sinks, control) = setup(2);
        let (_tx, rx) = command_channel();
        // Deck 1 routed to a channel the stream does not have
        let routing = vec![ChannelPair::new(0, 9), ChannelPair::new(2, 3)];
        let mut capture = SoundCaptureProcess::new(control, routing, rx).unwrap();
        let mut gens = generators();

        let mut data = vec![0.0; FRAMES * CHANNELS];
        for _ in 0..20 {
            fill(&mut gens, &[1.0, 1.0], &mut data);
            let result = capture.process(&data, CHANNELS);
            assert!(matches!(result, Err(PlayerError::Deck { deck: 0, .. })));
        }
        assert_eq!(capture.control().status().failures(0), 20);
        assert_eq!(capture.control().status().failures(1), 0);
        assert_eq!(sinks[0].updates(), 0);
        assert!((sinks[1].speed() - 1.0).abs() < 0.0001);
    }
}
