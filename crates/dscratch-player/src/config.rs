//! Player configuration
//!
//! Stored as YAML in the user's config directory.
//! Default location: `<config_dir>/digitalscratch/player.yaml`

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use dscratch_core::config::{default_config_path, TurntableConfig};

use crate::capture::ChannelPair;
use crate::timecode::ControlMode;

/// File name of the player configuration
pub const CONFIG_FILE: &str = "player.yaml";

/// Root configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Requested capture sample rate; the device rate wins if it differs
    pub sample_rate: u32,
    /// One entry per deck, in deck order
    pub decks: Vec<DeckConfig>,
    /// Settings shared by every turntable
    pub turntable: TurntableConfig,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            decks: vec![
                DeckConfig::new("deck 1", 0, 1),
                DeckConfig::new("deck 2", 2, 3),
            ],
            turntable: TurntableConfig::default(),
        }
    }
}

impl PlayerConfig {
    pub fn deck_names(&self) -> Vec<String> {
        self.decks.iter().map(|d| d.name.clone()).collect()
    }

    pub fn routing(&self) -> Vec<ChannelPair> {
        self.decks
            .iter()
            .map(|d| ChannelPair::new(d.left_channel, d.right_channel))
            .collect()
    }

    /// Capture channels needed to serve every deck
    pub fn required_channels(&self) -> usize {
        self.decks
            .iter()
            .map(|d| d.left_channel.max(d.right_channel) + 1)
            .max()
            .unwrap_or(0)
    }
}

/// One deck: its name and the capture channels carrying its timecode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    pub name: String,
    pub left_channel: usize,
    pub right_channel: usize,
    pub mode: ControlMode,
}

impl DeckConfig {
    pub fn new(name: impl Into<String>, left_channel: usize, right_channel: usize) -> Self {
        Self {
            name: name.into(),
            left_channel,
            right_channel,
            mode: ControlMode::Timecode,
        }
    }
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self::new("deck", 0, 1)
    }
}

pub fn default_player_config_path() -> PathBuf {
    default_config_path(CONFIG_FILE)
}
