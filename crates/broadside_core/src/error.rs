//! Error types for the match core.
//!
//! Player actions are not reported through [`GameError`]; the gateway has its
//! own rejection type, [`crate::gateway::ActionError`].

use thiserror::Error;

use crate::components::MatchState;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for construction, data and match-state failures.
#[derive(Debug, Error)]
pub enum GameError {
    /// Match configuration failed validation.
    #[error("Invalid match configuration: {0}")]
    InvalidConfig(String),

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParse {
        /// Path (or label) of the data that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// A card definition is malformed.
    #[error("Invalid card '{id}': {reason}")]
    InvalidCard {
        /// Card identifier.
        id: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Two catalog entries share an identifier.
    #[error("Duplicate card ID: {0}")]
    DuplicateCard(String),

    /// The requested match transition is not legal from the current state.
    #[error("Cannot {action} while match is {from:?}")]
    InvalidTransition {
        /// State the match was in.
        from: MatchState,
        /// The transition that was attempted.
        action: &'static str,
    },
}
