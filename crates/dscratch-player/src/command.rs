//! Lock-free commands from the control thread to the audio callback
//!
//! Turntable settings (rpm, thresholds, vinyl) go straight through the engine,
//! which already accepts them from any thread. What lives here is state owned
//! by the capture process on the audio thread: per-deck mode and channel
//! routing. Commands are drained at the start of every callback.

use crate::timecode::ControlMode;

/// Commands processed by the capture process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimecodeCommand {
    /// Switch a deck between timecode and manual control
    SetMode { deck: usize, mode: ControlMode },
    /// Read a deck's timecode from other capture channels
    SetChannels {
        deck: usize,
        left_channel: usize,
        right_channel: usize,
    },
}

/// Queue capacity; commands come from a human, a burst never gets close
pub const COMMAND_QUEUE_CAPACITY: usize = 64;

/// Sending side, owned by the control thread
pub struct TimecodeCommandSender {
    producer: rtrb::Producer<TimecodeCommand>,
}

impl TimecodeCommandSender {
    /// Queue a command without blocking; gives it back if the queue is full
    pub fn send(&mut self, cmd: TimecodeCommand) -> Result<(), TimecodeCommand> {
        self.producer.push(cmd).map_err(|e| match e {
            rtrb::PushError::Full(value) => value,
        })
    }
}

/// Create a command channel (sender, audio-thread consumer)
pub fn command_channel() -> (TimecodeCommandSender, rtrb::Consumer<TimecodeCommand>) {
    let (producer, consumer) = rtrb::RingBuffer::new(COMMAND_QUEUE_CAPACITY);
    (TimecodeCommandSender { producer }, consumer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_and_drain() {
        let (mut tx, mut rx) = command_channel();
        let cmd = TimecodeCommand::SetMode {
            deck: 1,
            mode: ControlMode::Manual,
        };
        tx.send(cmd).unwrap();
        assert_eq!(rx.pop().unwrap(), cmd);
        assert!(rx.pop().is_err());
    }

    #[test]
    fn test_full_queue_returns_command() {
        let (mut tx, _rx) = command_channel();
        let cmd = TimecodeCommand::SetChannels {
            deck: 0,
            left_channel: 2,
            right_channel: 3,
        };
        for _ in 0..COMMAND_QUEUE_CAPACITY {
            tx.send(cmd).unwrap();
        }
        assert_eq!(tx.send(cmd), Err(cmd));
    }
}
