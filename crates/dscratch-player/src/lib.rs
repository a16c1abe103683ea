//! Digital Scratch player: timecode control of playback decks
//!
//! The [`SoundCaptureProcess`] runs on the capture callback, routing channels
//! to a [`TimecodeControlProcess`] which drives each deck's
//! [`PlaybackParameters`]. The control thread talks to the capture side
//! through a [`command_channel`].

pub mod capture;
pub mod command;
pub mod config;
pub mod error;
pub mod playback;
pub mod status;
pub mod timecode;

pub use capture::{ChannelPair, SoundCaptureProcess};
pub use command::{command_channel, TimecodeCommand, TimecodeCommandSender};
pub use config::{DeckConfig, PlayerConfig};
pub use error::{PlayerError, PlayerResult};
pub use playback::PlaybackParameters;
pub use status::{ControlStatus, StatusEvent, StatusReporter};
pub use timecode::{ControlMode, TimecodeControlProcess};
