//! Read-only card catalog.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::card_data::{CardId, UnitDefinition, UnitKind};
use crate::effects::EffectKind;
use crate::error::{GameError, Result};

/// On-disk layout of a catalog file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CatalogFile {
    cards: Vec<UnitDefinition>,
}

/// Catalog of card definitions, keyed by [`CardId`].
///
/// Loaded before a match starts and never mutated by the match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardCatalog {
    cards: BTreeMap<CardId, UnitDefinition>,
}

impl CardCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cards: BTreeMap::new(),
        }
    }

    /// Build a catalog from definitions, validating each one.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid definition or a duplicate id.
    pub fn from_definitions(defs: impl IntoIterator<Item = UnitDefinition>) -> Result<Self> {
        let mut catalog = Self::new();
        for def in defs {
            catalog.insert(def)?;
        }
        Ok(catalog)
    }

    /// Parse a catalog from RON: `(cards: [UnitDefinition(..), ..])`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParse`] for malformed RON, or the first
    /// validation error among the parsed cards.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let file: CatalogFile = ron::from_str(source).map_err(|e| GameError::DataParse {
            path: "<card catalog>".to_string(),
            message: e.to_string(),
        })?;
        Self::from_definitions(file.cards)
    }

    /// Serialize the catalog back to pretty RON.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParse`] if serialization fails.
    pub fn to_ron_string(&self) -> Result<String> {
        let file = CatalogFile {
            cards: self.cards.values().cloned().collect(),
        };
        ron::ser::to_string_pretty(&file, ron::ser::PrettyConfig::default()).map_err(|e| {
            GameError::DataParse {
                path: "<card catalog>".to_string(),
                message: e.to_string(),
            }
        })
    }

    /// Add a definition.
    ///
    /// # Errors
    ///
    /// Returns an error if the definition is invalid or its id is taken.
    pub fn insert(&mut self, def: UnitDefinition) -> Result<()> {
        def.validate()?;
        if self.cards.contains_key(&def.id) {
            return Err(GameError::DuplicateCard(def.id.to_string()));
        }
        self.cards.insert(def.id.clone(), def);
        Ok(())
    }

    /// Look up a definition.
    #[must_use]
    pub fn get(&self, id: &CardId) -> Option<&UnitDefinition> {
        self.cards.get(id)
    }

    /// All definitions in id order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitDefinition> {
        self.cards.values()
    }

    /// Definitions of one kind, in id order.
    pub fn of_kind(&self, kind: UnitKind) -> impl Iterator<Item = &UnitDefinition> {
        self.cards.values().filter(move |def| def.kind == kind)
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Whether the catalog has no definitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// The stock deck shipped with the game.
    #[must_use]
    pub fn standard() -> Self {
        let defs = [
            UnitDefinition::new("deckhand", "Deckhand", UnitKind::Crew, 2)
                .with_stats(1, 3)
                .with_visual("sloop"),
            UnitDefinition::new("boatswain", "Boatswain", UnitKind::Crew, 3)
                .with_stats(2, 4)
                .with_visual("brig"),
            UnitDefinition::new("gunner", "Gunner", UnitKind::Crew, 4)
                .with_stats(4, 2)
                .with_visual("frigate"),
            UnitDefinition::new("cannon", "Cannon", UnitKind::Equipment, 3).with_stats(3, 0),
            UnitDefinition::new("hull_plating", "Hull Plating", UnitKind::Equipment, 2)
                .with_stats(0, 4),
            UnitDefinition::new("broadside_volley", "Broadside Volley", UnitKind::Maneuver, 4)
                .with_effect(EffectKind::Damage { amount: 5 }),
            UnitDefinition::new("change_course", "Change Course", UnitKind::Maneuver, 2)
                .with_effect(EffectKind::Reposition { lane_offset: 1 }),
        ];
        Self {
            cards: defs.into_iter().map(|def| (def.id.clone(), def)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_is_valid() {
        let catalog = CardCatalog::standard();
        assert_eq!(catalog.len(), 7);
        for def in catalog.iter() {
            assert!(def.validate().is_ok(), "{} should validate", def.id);
        }
        assert_eq!(catalog.of_kind(UnitKind::Crew).count(), 3);
        assert_eq!(catalog.of_kind(UnitKind::Maneuver).count(), 2);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let def = UnitDefinition::new("deckhand", "Deckhand", UnitKind::Crew, 2).with_stats(1, 3);
        let result = CardCatalog::from_definitions([def.clone(), def]);
        assert!(matches!(result, Err(GameError::DuplicateCard(id)) if id == "deckhand"));
    }

    #[test]
    fn test_ron_roundtrip_preserves_catalog() {
        let catalog = CardCatalog::standard();
        let text = catalog.to_ron_string().unwrap();
        let parsed = CardCatalog::from_ron_str(&text).unwrap();
        assert_eq!(parsed, catalog);
    }

    #[test]
    fn test_parse_catalog_with_effect() {
        let catalog = CardCatalog::from_ron_str(
            r#"(cards: [
                UnitDefinition(
                    id: "volley",
                    name: "Volley",
                    kind: Maneuver,
                    energy_cost: 4,
                    effect: Some(Damage(amount: 6)),
                ),
            ])"#,
        )
        .unwrap();

        let volley = catalog.get(&CardId::new("volley")).unwrap();
        assert_eq!(volley.effect, Some(EffectKind::Damage { amount: 6 }));
    }

    #[test]
    fn test_invalid_card_in_file_rejected() {
        let result = CardCatalog::from_ron_str(
            r#"(cards: [
                UnitDefinition(id: "x", name: "X", kind: Crew, energy_cost: 1, attack: 1),
            ])"#,
        );
        assert!(matches!(result, Err(GameError::InvalidCard { .. })));
    }
}
