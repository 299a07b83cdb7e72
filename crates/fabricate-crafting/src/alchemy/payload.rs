//! Synthesized item data produced by alchemy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a damage formula is neither `NdM` nor a number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid damage formula: {0}")]
pub struct ParseRollError(pub String);

/// A damage amount: a dice roll or a fixed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DamageRoll {
    /// `count` dice with `faces` sides each
    Dice {
        /// Number of dice
        count: u32,
        /// Sides per die
        faces: u32,
    },
    /// A flat amount
    Fixed(u32),
}

impl DamageRoll {
    /// Dice-roller formula, e.g. `2d8` or `1`.
    #[must_use]
    pub fn formula(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DamageRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dice { count, faces } => write!(f, "{count}d{faces}"),
            Self::Fixed(amount) => write!(f, "{amount}"),
        }
    }
}

impl FromStr for DamageRoll {
    type Err = ParseRollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || ParseRollError(s.to_string());
        match trimmed.split_once(|c: char| c.eq_ignore_ascii_case(&'d')) {
            Some((count, faces)) => {
                let count = if count.is_empty() {
                    1
                } else {
                    count.parse().map_err(|_| invalid())?
                };
                let faces: u32 = faces.parse().map_err(|_| invalid())?;
                if count == 0 || faces == 0 {
                    return Err(invalid());
                }
                Ok(Self::Dice { count, faces })
            },
            None => trimmed.parse().map(Self::Fixed).map_err(|_| invalid()),
        }
    }
}

impl TryFrom<String> for DamageRoll {
    type Error = ParseRollError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DamageRoll> for String {
    fn from(value: DamageRoll) -> Self {
        value.to_string()
    }
}

/// One damage entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamagePart {
    /// Amount rolled or dealt
    pub roll: DamageRoll,
    /// Damage type, e.g. `acid`
    pub damage_type: String,
}

/// Area or target an item affects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetShape {
    /// Size or count
    pub value: u32,
    /// Units of `value` (`ft`, `none`, ...)
    pub units: String,
    /// Shape or target kind (`radius`, `creature`, ...)
    pub kind: String,
}

/// Saving throw forced by an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingThrow {
    /// Ability abbreviation, e.g. `dex`
    pub ability: String,
    /// Difficulty class, when fixed
    pub dc: Option<u32>,
    /// How the DC scales (`flat`, `spell`, ...)
    pub scaling: String,
}

/// How long an item's effect lasts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectDuration {
    /// Amount of `units`, absent for open-ended units
    pub value: Option<u32>,
    /// Duration units (`round`, `minute`, `special`, ...)
    pub units: String,
}

/// Item data assembled from matched alchemical effects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPayload {
    /// Item name, taken from the base component
    pub name: String,
    /// Description paragraphs in application order
    pub description: Vec<String>,
    /// Damage entries
    pub damage: Vec<DamagePart>,
    /// Target or area
    pub target: Option<TargetShape>,
    /// Saving throw
    pub saving_throw: Option<SavingThrow>,
    /// Duration
    pub duration: Option<EffectDuration>,
}

impl ItemPayload {
    /// Creates an empty payload for an item.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Description rendered as HTML paragraphs.
    #[must_use]
    pub fn description_html(&self) -> String {
        self.description
            .iter()
            .map(|paragraph| format!("<p>{paragraph}</p>"))
            .collect()
    }

    /// Damage entries as `(formula, type)` pairs.
    #[must_use]
    pub fn damage_parts(&self) -> Vec<(String, String)> {
        self.damage
            .iter()
            .map(|part| (part.roll.formula(), part.damage_type.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rolls() {
        assert_eq!(
            "2d8".parse::<DamageRoll>().expect("dice"),
            DamageRoll::Dice { count: 2, faces: 8 }
        );
        assert_eq!(
            "d6".parse::<DamageRoll>().expect("single die"),
            DamageRoll::Dice { count: 1, faces: 6 }
        );
        assert_eq!("3".parse::<DamageRoll>().expect("fixed"), DamageRoll::Fixed(3));
        assert!("2d".parse::<DamageRoll>().is_err());
        assert!("0d4".parse::<DamageRoll>().is_err());
        assert!("lots".parse::<DamageRoll>().is_err());
    }

    #[test]
    fn test_description_html() {
        let mut payload = ItemPayload::new("Alchemical Bomb");
        payload.description.push("Deal 1d8 acid damage on contact.".to_string());
        payload.description.push("Roll double the number of all damage dice.".to_string());
        assert_eq!(
            payload.description_html(),
            "<p>Deal 1d8 acid damage on contact.</p><p>Roll double the number of all damage dice.</p>"
        );
    }

    #[test]
    fn test_damage_parts() {
        let mut payload = ItemPayload::new("Bomb");
        payload.damage.push(DamagePart {
            roll: DamageRoll::Dice { count: 2, faces: 8 },
            damage_type: "acid".to_string(),
        });
        assert_eq!(payload.damage_parts(), vec![("2d8".to_string(), "acid".to_string())]);
    }
}
