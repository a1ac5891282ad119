//! Match configuration and card catalog loading.
//!
//! Files are RON. Without an explicit path the shipped assets compiled into
//! the binary are used.

use std::fs;
use std::path::{Path, PathBuf};

use broadside_core::config::MatchConfig;
use broadside_core::data::CardCatalog;
use broadside_core::error::GameError;
use thiserror::Error;

/// Shipped match tuning.
pub const DEFAULT_MATCH_RON: &str = include_str!("../assets/data/match.ron");

/// Shipped card catalog.
pub const DEFAULT_CARDS_RON: &str = include_str!("../assets/data/cards.ron");

/// Error loading a data file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to read the file.
    #[error("IO error reading '{path}': {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file parsed but was rejected by the core.
    #[error("Invalid data in '{path}': {source}")]
    Invalid {
        /// File that failed.
        path: PathBuf,
        /// Core error.
        source: GameError,
    },
}

/// Everything a match needs before it starts.
#[derive(Debug, Clone)]
pub struct MatchData {
    /// Match tuning.
    pub config: MatchConfig,
    /// Card catalog.
    pub catalog: CardCatalog,
}

impl MatchData {
    /// Load from optional file paths, falling back to the shipped assets.
    pub fn load(config: Option<&Path>, cards: Option<&Path>) -> Result<Self, LoadError> {
        Ok(Self {
            config: load_config(config)?,
            catalog: load_catalog(cards)?,
        })
    }

    /// The shipped assets.
    pub fn shipped() -> Result<Self, LoadError> {
        Self::load(None, None)
    }
}

/// Load a match configuration.
pub fn load_config(path: Option<&Path>) -> Result<MatchConfig, LoadError> {
    let (label, text) = read_or_default(path, "<shipped match.ron>", DEFAULT_MATCH_RON)?;
    MatchConfig::from_ron_str(&text).map_err(|source| LoadError::Invalid {
        path: label,
        source,
    })
}

/// Load a card catalog.
pub fn load_catalog(path: Option<&Path>) -> Result<CardCatalog, LoadError> {
    let (label, text) = read_or_default(path, "<shipped cards.ron>", DEFAULT_CARDS_RON)?;
    let catalog = CardCatalog::from_ron_str(&text).map_err(|source| LoadError::Invalid {
        path: label.clone(),
        source,
    })?;
    tracing::debug!(path = %label.display(), cards = catalog.len(), "Loaded card catalog");
    Ok(catalog)
}

fn read_or_default(
    path: Option<&Path>,
    default_label: &str,
    default_text: &str,
) -> Result<(PathBuf, String), LoadError> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            Ok((path.to_path_buf(), text))
        }
        None => Ok((PathBuf::from(default_label), default_text.to_string())),
    }
}
