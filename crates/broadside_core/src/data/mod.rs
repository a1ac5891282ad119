//! Data structures for the card catalog.
//!
//! This module contains pure data structures that define the cards a side
//! can play. All structs are designed to be deserialized from RON files.
//!
//! **Note:** This module contains no IO - it only defines data types.
//! File loading is handled by `broadside_headless`.

mod card_data;
mod catalog;

pub use card_data::{CardId, UnitDefinition, UnitKind, VisualRef};
pub use catalog::CardCatalog;
