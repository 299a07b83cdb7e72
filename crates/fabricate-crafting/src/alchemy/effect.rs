//! Alchemical effects and effect sets.

use ahash::AHashMap;
use fabricate_common::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

use super::payload::{DamagePart, DamageRoll, EffectDuration, ItemPayload, SavingThrow, TargetShape};
use crate::combination::Combination;
use crate::essence::EssenceDefinition;

/// Whether an effect stands alone or adjusts other effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Contributes directly to the payload
    Basic,
    /// Transforms what basic effects assembled
    Modifier,
}

/// Arithmetic used by modifier actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierOp {
    /// `current + value`
    Add,
    /// `current * value`
    Multiply,
}

impl ModifierOp {
    /// Applies the operation.
    #[must_use]
    pub const fn apply(self, current: u32, value: u32) -> u32 {
        match self {
            Self::Add => current.saturating_add(value),
            Self::Multiply => current.saturating_mul(value),
        }
    }
}

/// A single change an effect makes to an [`ItemPayload`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectAction {
    /// Adds a damage entry
    Damage {
        /// Formula such as `1d4` or `1`
        roll: DamageRoll,
        /// Damage type
        damage_type: String,
    },
    /// Sets the target
    Target {
        /// Size or count
        value: u32,
        /// Units of `value`
        units: String,
        /// Target kind
        kind: String,
    },
    /// Sets the saving throw
    SavingThrow {
        /// Ability abbreviation
        ability: String,
        /// Difficulty class
        #[serde(default)]
        dc: Option<u32>,
        /// DC scaling
        scaling: String,
    },
    /// Sets the duration
    Duration {
        /// Amount of units
        #[serde(default)]
        value: Option<u32>,
        /// Duration units
        units: String,
    },
    /// Grows the area of effect. A target of another kind is replaced by an
    /// area of `kind` measured in feet.
    AreaExtender {
        /// Operation applied to the area size
        op: ModifierOp,
        /// Operand
        value: u32,
        /// Area kind, e.g. `radius`
        kind: String,
    },
    /// Scales damage: dice counts for rolled parts, amounts for fixed parts
    DamageModifier {
        /// Operation
        op: ModifierOp,
        /// Operand
        value: u32,
    },
    /// Adjusts the saving throw DC
    SavingThrowModifier {
        /// Operation
        op: ModifierOp,
        /// Operand
        value: u32,
    },
}

impl EffectAction {
    /// Applies this action to a payload.
    pub fn apply_to(&self, payload: &mut ItemPayload) {
        match self {
            Self::Damage { roll, damage_type } => payload.damage.push(DamagePart {
                roll: *roll,
                damage_type: damage_type.clone(),
            }),
            Self::Target { value, units, kind } => {
                payload.target = Some(TargetShape {
                    value: *value,
                    units: units.clone(),
                    kind: kind.clone(),
                });
            },
            Self::SavingThrow {
                ability,
                dc,
                scaling,
            } => {
                payload.saving_throw = Some(SavingThrow {
                    ability: ability.clone(),
                    dc: *dc,
                    scaling: scaling.clone(),
                });
            },
            Self::Duration { value, units } => {
                payload.duration = Some(EffectDuration {
                    value: *value,
                    units: units.clone(),
                });
            },
            Self::AreaExtender { op, value, kind } => match payload.target.as_mut() {
                Some(target) if target.kind == *kind => {
                    target.value = op.apply(target.value, *value);
                },
                _ => {
                    payload.target = Some(TargetShape {
                        value: op.apply(0, *value),
                        units: "ft".to_string(),
                        kind: kind.clone(),
                    });
                },
            },
            Self::DamageModifier { op, value } => {
                for part in &mut payload.damage {
                    part.roll = match part.roll {
                        DamageRoll::Dice { count, faces } => DamageRoll::Dice {
                            count: op.apply(count, *value),
                            faces,
                        },
                        DamageRoll::Fixed(amount) => DamageRoll::Fixed(op.apply(amount, *value)),
                    };
                }
            },
            Self::SavingThrowModifier { op, value } => {
                if let Some(save) = payload.saving_throw.as_mut() {
                    save.dc = save.dc.map(|dc| op.apply(dc, *value));
                }
            },
        }
    }
}

/// A rule mapping an essence subset to payload changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlchemicalEffect {
    /// Display name
    pub name: String,
    /// Essences the effect requires
    pub essences: Combination<EssenceDefinition>,
    /// Basic or modifier
    pub kind: EffectKind,
    /// Description paragraph added to the payload
    pub description: String,
    /// Changes applied to the payload
    pub actions: Vec<EffectAction>,
}

impl AlchemicalEffect {
    /// Creates an effect.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        essences: Combination<EssenceDefinition>,
        kind: EffectKind,
        description: impl Into<String>,
        actions: Vec<EffectAction>,
    ) -> Self {
        Self {
            name: name.into(),
            essences,
            kind,
            description: description.into(),
            actions,
        }
    }

    /// Adds this effect's description and applies its actions.
    pub fn apply_to(&self, payload: &mut ItemPayload) {
        if !self.description.is_empty() {
            payload.description.push(self.description.clone());
        }
        for action in &self.actions {
            action.apply_to(payload);
        }
    }

    /// Normalized key of the effect's essence subset.
    #[must_use]
    pub fn subset_key(&self) -> String {
        subset_key(&self.essences)
    }
}

/// Normalized key for an essence subset: `id:qty` pairs in id order.
#[must_use]
pub fn subset_key(essences: &Combination<EssenceDefinition>) -> String {
    essences
        .units()
        .map(|unit| format!("{}:{}", unit.element().id, unit.quantity()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Registered effects keyed by their essence subset.
#[derive(Debug, Clone, Default)]
pub struct AlchemicalResultSet {
    effects: Vec<AlchemicalEffect>,
    by_subset: AHashMap<String, usize>,
}

impl AlchemicalResultSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from effects in registration order.
    pub fn from_effects(effects: impl IntoIterator<Item = AlchemicalEffect>) -> ConfigResult<Self> {
        let mut set = Self::new();
        for effect in effects {
            set.insert(effect)?;
        }
        Ok(set)
    }

    /// Registers an effect. Empty or already registered subsets are rejected.
    pub fn insert(&mut self, effect: AlchemicalEffect) -> ConfigResult<()> {
        if effect.essences.is_empty() {
            return Err(ConfigError::EmptyEffectEssences(effect.name));
        }
        let key = effect.subset_key();
        if self.by_subset.contains_key(&key) {
            return Err(ConfigError::DuplicateEffect(key));
        }
        self.by_subset.insert(key, self.effects.len());
        self.effects.push(effect);
        Ok(())
    }

    /// Looks up the effect registered for exactly this subset.
    #[must_use]
    pub fn get(&self, essences: &Combination<EssenceDefinition>) -> Option<&AlchemicalEffect> {
        self.by_subset
            .get(&subset_key(essences))
            .map(|&index| &self.effects[index])
    }

    /// Effects in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &AlchemicalEffect> + '_ {
        self.effects.iter()
    }

    /// Every registered subset, in registration order.
    pub fn subsets(&self) -> impl Iterator<Item = &Combination<EssenceDefinition>> + '_ {
        self.effects.iter().map(|effect| &effect.essences)
    }

    /// Number of registered effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// True when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn essence(id: &str) -> EssenceDefinition {
        EssenceDefinition::new(id, "alchemists", id, "")
    }

    fn subset(ids: &[&str]) -> Combination<EssenceDefinition> {
        ids.iter().map(|id| (essence(id), 1)).collect()
    }

    fn acid() -> AlchemicalEffect {
        AlchemicalEffect::new(
            "acid",
            subset(&["fire", "earth"]),
            EffectKind::Basic,
            "Deal 1d8 acid damage on contact.",
            vec![
                EffectAction::Damage {
                    roll: DamageRoll::Dice { count: 1, faces: 8 },
                    damage_type: "acid".to_string(),
                },
                EffectAction::Target {
                    value: 1,
                    units: "none".to_string(),
                    kind: "creature".to_string(),
                },
            ],
        )
    }

    #[test]
    fn test_subset_key_is_order_independent() {
        assert_eq!(subset_key(&subset(&["fire", "earth"])), "earth:1,fire:1");
        assert_eq!(subset_key(&subset(&["earth", "fire"])), "earth:1,fire:1");
    }

    #[test]
    fn test_result_set_rejects_empty_and_duplicate() {
        let mut set = AlchemicalResultSet::new();
        set.insert(acid()).expect("first insert");

        let err = set.insert(acid()).expect_err("duplicate");
        assert!(matches!(err, ConfigError::DuplicateEffect(_)));

        let hollow = AlchemicalEffect::new("hollow", Combination::new(), EffectKind::Basic, "", vec![]);
        let err = set.insert(hollow).expect_err("empty");
        assert!(matches!(err, ConfigError::EmptyEffectEssences(_)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_lookup_by_exact_subset() {
        let set = AlchemicalResultSet::from_effects([acid()]).expect("valid set");
        assert!(set.get(&subset(&["earth", "fire"])).is_some());
        assert!(set.get(&subset(&["fire"])).is_none());
    }

    #[test]
    fn test_area_extender_replaces_other_kinds() {
        let mut payload = ItemPayload::new("Bomb");
        acid().apply_to(&mut payload);

        let spray = EffectAction::AreaExtender {
            op: ModifierOp::Add,
            value: 5,
            kind: "radius".to_string(),
        };
        spray.apply_to(&mut payload);
        assert_eq!(
            payload.target,
            Some(TargetShape {
                value: 5,
                units: "ft".to_string(),
                kind: "radius".to_string(),
            })
        );

        spray.apply_to(&mut payload);
        assert_eq!(payload.target.map(|target| target.value), Some(10));
    }

    #[test]
    fn test_damage_modifier_scales_dice_count() {
        let mut payload = ItemPayload::new("Bomb");
        acid().apply_to(&mut payload);
        EffectAction::DamageModifier {
            op: ModifierOp::Multiply,
            value: 2,
        }
        .apply_to(&mut payload);
        assert_eq!(payload.damage_parts(), vec![("2d8".to_string(), "acid".to_string())]);
    }

    #[test]
    fn test_saving_throw_modifier() {
        let mut payload = ItemPayload::new("Bomb");
        EffectAction::SavingThrow {
            ability: "dex".to_string(),
            dc: Some(10),
            scaling: "flat".to_string(),
        }
        .apply_to(&mut payload);
        EffectAction::SavingThrowModifier {
            op: ModifierOp::Add,
            value: 2,
        }
        .apply_to(&mut payload);
        assert_eq!(payload.saving_throw.and_then(|save| save.dc), Some(12));
    }

    #[test]
    fn test_actions_deserialize_from_tagged_tables() {
        let action: EffectAction = serde_json::from_str(
            r#"{"type": "damage", "roll": "1d4", "damage_type": "fire"}"#,
        )
        .expect("valid action");
        assert_eq!(
            action,
            EffectAction::Damage {
                roll: DamageRoll::Dice { count: 1, faces: 4 },
                damage_type: "fire".to_string(),
            }
        );
    }
}
