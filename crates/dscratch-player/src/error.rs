//! Player error types

use dscratch_core::DscratchError;
use thiserror::Error;

/// Errors of the per-deck timecode control
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlayerError {
    /// A control process needs at least one deck
    #[error("No deck configured")]
    NoDecks,

    /// Deck index out of range
    #[error("Deck {0} does not exist")]
    UnknownDeck(usize),

    /// Channel routing does not cover every deck
    #[error("Channel routing for {routes} deck(s), {decks} deck(s) configured")]
    RoutingMismatch { routes: usize, decks: usize },

    /// Engine call failed for one deck
    #[error("Deck {deck}: {source}")]
    Deck { deck: usize, source: DscratchError },

    #[error(transparent)]
    Engine(#[from] DscratchError),
}

pub type PlayerResult<T> = Result<T, PlayerError>;
