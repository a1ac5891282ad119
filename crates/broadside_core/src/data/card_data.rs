//! Card data structures for data-driven unit definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::effects::EffectKind;
use crate::error::{GameError, Result};

/// Unique string identifier for a card.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub String);

impl CardId {
    /// Create a new card ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Opaque reference to the visual the presentation layer instantiates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisualRef(pub String);

impl VisualRef {
    /// Create a new visual reference.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Card category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Crew member: starts or joins a lane buffer, or boards an own ship.
    Crew,
    /// Equipment: fitted to an existing own ship.
    Equipment,
    /// Maneuver: one-shot effect.
    Maneuver,
    /// Anything the core does not know how to play.
    Other,
}

/// Data-driven card definition.
///
/// Owned by the catalog; the core only ever reads it.
///
/// # Example RON
///
/// ```ron
/// UnitDefinition(
///     id: "boatswain",
///     name: "Boatswain",
///     kind: Crew,
///     energy_cost: 3,
///     attack: 2,
///     defense: 4,
///     visual: Some("brig"),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDefinition {
    /// Unique identifier.
    pub id: CardId,

    /// Display name (localization is handled outside the core).
    pub name: String,

    /// Card category.
    pub kind: UnitKind,

    /// Energy spent when the card is played.
    pub energy_cost: u32,

    /// Attack contributed to a buffer or ship.
    #[serde(default)]
    pub attack: i32,

    /// Defense (health) contributed to a buffer or ship.
    #[serde(default)]
    pub defense: i32,

    /// Ship visual used when this card opens a buffer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual: Option<VisualRef>,

    /// Effect of a maneuver card.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<EffectKind>,
}

impl UnitDefinition {
    /// Create a definition with no stats.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: UnitKind, cost: u32) -> Self {
        Self {
            id: CardId::new(id),
            name: name.into(),
            kind,
            energy_cost: cost,
            attack: 0,
            defense: 0,
            visual: None,
            effect: None,
        }
    }

    /// Builder method to set attack and defense contributions.
    #[must_use]
    pub fn with_stats(mut self, attack: i32, defense: i32) -> Self {
        self.attack = attack;
        self.defense = defense;
        self
    }

    /// Builder method to set the ship visual.
    #[must_use]
    pub fn with_visual(mut self, visual: impl Into<String>) -> Self {
        self.visual = Some(VisualRef::new(visual));
        self
    }

    /// Builder method to attach a maneuver effect.
    #[must_use]
    pub fn with_effect(mut self, effect: EffectKind) -> Self {
        self.effect = Some(effect);
        self
    }

    /// Whether this card contributes to a lane buffer.
    #[must_use]
    pub fn is_deployable(&self) -> bool {
        self.kind == UnitKind::Crew
    }

    /// Check the definition is playable.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidCard`] for negative stats, crew without
    /// defense, maneuvers without an effect, or damage that is not positive.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| GameError::InvalidCard {
            id: self.id.to_string(),
            reason: reason.to_string(),
        };

        if self.attack < 0 || self.defense < 0 {
            return Err(invalid("attack and defense must not be negative"));
        }
        if let Some(EffectKind::Damage { amount }) = self.effect {
            if amount <= 0 {
                return Err(invalid("damage amount must be positive"));
            }
        }
        match self.kind {
            UnitKind::Crew if self.defense == 0 => Err(invalid("crew needs at least 1 defense")),
            UnitKind::Maneuver if self.effect.is_none() => {
                Err(invalid("maneuver cards need an effect"))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_builder() {
        let def = UnitDefinition::new("gunner", "Gunner", UnitKind::Crew, 4)
            .with_stats(4, 2)
            .with_visual("frigate");

        assert_eq!(def.id, CardId::new("gunner"));
        assert_eq!(def.attack, 4);
        assert_eq!(def.defense, 2);
        assert_eq!(def.visual, Some(VisualRef::new("frigate")));
        assert!(def.is_deployable());
        assert!(def.validate().is_ok());
    }

    #[test]
    fn test_crew_without_defense_is_invalid() {
        let def = UnitDefinition::new("ghost", "Ghost", UnitKind::Crew, 1).with_stats(3, 0);
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_maneuver_needs_effect() {
        let bare = UnitDefinition::new("feint", "Feint", UnitKind::Maneuver, 1);
        assert!(bare.validate().is_err());

        let volley = bare.with_effect(EffectKind::Damage { amount: 5 });
        assert!(volley.validate().is_ok());
        assert!(!volley.is_deployable());
    }

    #[test]
    fn test_damage_must_be_positive() {
        for amount in [0, -3, i32::MIN] {
            let def = UnitDefinition::new("salve", "Salve", UnitKind::Maneuver, 1)
                .with_effect(EffectKind::Damage { amount });
            let err = def.validate().unwrap_err();
            assert!(
                matches!(&err, GameError::InvalidCard { reason, .. } if reason.contains("damage")),
                "damage {amount} gave {err}"
            );
        }
    }

    #[test]
    fn test_definition_from_ron() {
        let def: UnitDefinition = ron::from_str(
            r#"UnitDefinition(
                id: "cannon",
                name: "Cannon",
                kind: Equipment,
                energy_cost: 3,
                attack: 3,
            )"#,
        )
        .unwrap();

        assert_eq!(def.kind, UnitKind::Equipment);
        assert_eq!(def.defense, 0);
        assert!(def.visual.is_none());
    }
}
