//! Essence-subset matching.
//!
//! Candidates are the registered effects whose essences the aggregate
//! contains, ordered by subset size (largest first) and then registration
//! order. The chosen effects never share an essence unit. Among all such
//! choices the matcher keeps the one leaving the fewest essence units
//! unused, then the one with fewer (hence larger) effects, then the first in
//! candidate order. A greedy pass over the same candidates is always
//! computed as well; when the two disagree the match is flagged.

use std::cmp::Reverse;
use tracing::{debug, warn};

use super::effect::{AlchemicalEffect, AlchemicalResultSet, EffectKind};
use super::payload::ItemPayload;
use crate::combination::Combination;
use crate::essence::EssenceDefinition;

/// Default number of search nodes visited per match.
pub const DEFAULT_MATCH_BUDGET: usize = 10_000;

/// Effects selected for an aggregate essence combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectMatch<'a> {
    /// Chosen effects in candidate order
    pub effects: Vec<&'a AlchemicalEffect>,
    /// Essence units no chosen effect used
    pub leftover: Combination<EssenceDefinition>,
    /// The greedy pass would have chosen differently
    pub diverges_from_greedy: bool,
    /// The optimal search finished within its budget
    pub exhaustive: bool,
}

impl EffectMatch<'_> {
    /// Builds the payload, basic effects first, then modifiers in selection
    /// order. Returns `None` when nothing matched.
    #[must_use]
    pub fn synthesize(&self, item_name: &str) -> Option<ItemPayload> {
        if self.effects.is_empty() {
            return None;
        }
        let mut payload = ItemPayload::new(item_name);
        let basics = self.effects.iter().filter(|effect| effect.kind == EffectKind::Basic);
        let modifiers = self.effects.iter().filter(|effect| effect.kind == EffectKind::Modifier);
        for effect in basics.chain(modifiers) {
            effect.apply_to(&mut payload);
        }
        Some(payload)
    }

    /// Names of the chosen effects.
    #[must_use]
    pub fn effect_names(&self) -> Vec<String> {
        self.effects.iter().map(|effect| effect.name.clone()).collect()
    }
}

/// Selects non-overlapping effects for an essence aggregate.
#[derive(Debug, Clone, Copy)]
pub struct EffectMatcher {
    budget: usize,
}

impl Default for EffectMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_BUDGET)
    }
}

impl EffectMatcher {
    /// Creates a matcher visiting at most `budget` nodes per match.
    #[must_use]
    pub const fn new(budget: usize) -> Self {
        Self { budget }
    }

    /// Effects the aggregate contains, largest subsets first.
    #[must_use]
    pub fn candidates<'a>(
        effects: &'a AlchemicalResultSet,
        aggregate: &Combination<EssenceDefinition>,
    ) -> Vec<&'a AlchemicalEffect> {
        let mut candidates: Vec<&AlchemicalEffect> = effects
            .iter()
            .filter(|effect| aggregate.is_sufficient_for(&effect.essences))
            .collect();
        candidates.sort_by_key(|effect| Reverse(effect.essences.size()));
        candidates
    }

    /// Matches `aggregate` against `effects`.
    #[must_use]
    pub fn match_effects<'a>(
        &self,
        effects: &'a AlchemicalResultSet,
        aggregate: &Combination<EssenceDefinition>,
    ) -> EffectMatch<'a> {
        let candidates = Self::candidates(effects, aggregate);
        let greedy = greedy(&candidates, aggregate);

        let mut search = OptimalSearch {
            candidates: &candidates,
            budget: self.budget,
            nodes: 0,
            exhausted: false,
            chosen: Vec::new(),
            best: None,
        };
        search.visit(0, aggregate);

        let exhaustive = !search.exhausted;
        let chosen = match (search.best, exhaustive) {
            (Some((chosen, _, _)), true) => chosen,
            _ => {
                warn!(
                    "Effect matching stopped after {} nodes, using greedy selection",
                    search.nodes
                );
                greedy.clone()
            },
        };

        let diverges_from_greedy = chosen != greedy;
        if diverges_from_greedy {
            warn!(
                "Optimal effect match {:?} differs from greedy match {:?}",
                names(&candidates, &chosen),
                names(&candidates, &greedy)
            );
        }

        let selected: Vec<&'a AlchemicalEffect> = chosen.iter().map(|&index| candidates[index]).collect();
        let leftover = selected
            .iter()
            .fold(aggregate.clone(), |remaining, effect| remaining.subtract(&effect.essences));
        debug!(
            "Matched {} of {} candidate effects, {} essence units left over",
            selected.len(),
            candidates.len(),
            leftover.size()
        );

        EffectMatch {
            effects: selected,
            leftover,
            diverges_from_greedy,
            exhaustive,
        }
    }
}

fn greedy(candidates: &[&AlchemicalEffect], aggregate: &Combination<EssenceDefinition>) -> Vec<usize> {
    let mut remaining = aggregate.clone();
    let mut chosen = Vec::new();
    for (index, effect) in candidates.iter().enumerate() {
        if remaining.is_sufficient_for(&effect.essences) {
            remaining = remaining.subtract(&effect.essences);
            chosen.push(index);
        }
    }
    chosen
}

fn names(candidates: &[&AlchemicalEffect], chosen: &[usize]) -> Vec<String> {
    chosen.iter().map(|&index| candidates[index].name.clone()).collect()
}

struct OptimalSearch<'c, 'a> {
    candidates: &'c [&'a AlchemicalEffect],
    budget: usize,
    nodes: usize,
    exhausted: bool,
    chosen: Vec<usize>,
    /// (chosen, leftover units, effect count)
    best: Option<(Vec<usize>, u32, usize)>,
}

impl OptimalSearch<'_, '_> {
    fn visit(&mut self, index: usize, remaining: &Combination<EssenceDefinition>) {
        if self.exhausted {
            return;
        }
        self.nodes += 1;
        if self.nodes > self.budget {
            self.exhausted = true;
            return;
        }

        if let Some((_, leftover, count)) = &self.best {
            // Nothing beats zero leftover except fewer effects.
            if *leftover == 0 && self.chosen.len() >= *count {
                return;
            }
        }

        if index == self.candidates.len() {
            let score = (remaining.size(), self.chosen.len());
            let improves = self
                .best
                .as_ref()
                .map_or(true, |(_, leftover, count)| score < (*leftover, *count));
            if improves {
                self.best = Some((self.chosen.clone(), score.0, score.1));
            }
            return;
        }

        let essences = &self.candidates[index].essences;
        if remaining.is_sufficient_for(essences) {
            let next = remaining.subtract(essences);
            self.chosen.push(index);
            self.visit(index + 1, &next);
            self.chosen.pop();
        }
        self.visit(index + 1, remaining);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alchemy::effect::{EffectAction, ModifierOp};
    use crate::alchemy::payload::DamageRoll;

    fn essence(id: &str) -> EssenceDefinition {
        EssenceDefinition::new(id, "alchemists", id, "")
    }

    fn essences(ids: &[&str]) -> Combination<EssenceDefinition> {
        ids.iter().map(|id| (essence(id), 1)).collect()
    }

    fn basic(name: &str, ids: &[&str], damage: &str) -> AlchemicalEffect {
        AlchemicalEffect::new(
            name,
            essences(ids),
            EffectKind::Basic,
            format!("Deal {damage} {name} damage on contact."),
            vec![EffectAction::Damage {
                roll: damage.parse().expect("valid roll"),
                damage_type: name.to_string(),
            }],
        )
    }

    fn double_damage(ids: &[&str]) -> AlchemicalEffect {
        AlchemicalEffect::new(
            "double",
            essences(ids),
            EffectKind::Modifier,
            "Roll double the number of all damage dice.",
            vec![EffectAction::DamageModifier {
                op: ModifierOp::Multiply,
                value: 2,
            }],
        )
    }

    #[test]
    fn test_candidates_prefer_larger_subsets() {
        let set = AlchemicalResultSet::from_effects([
            double_damage(&["positive"]),
            basic("fire", &["fire", "fire"], "1d4"),
        ])
        .expect("valid set");
        let aggregate = essences(&["fire", "fire", "positive"]);

        let names: Vec<&str> = EffectMatcher::candidates(&set, &aggregate)
            .iter()
            .map(|effect| effect.name.as_str())
            .collect();
        assert_eq!(names, vec!["fire", "double"]);
    }

    #[test]
    fn test_optimal_match_flags_greedy_divergence() {
        let set = AlchemicalResultSet::from_effects([
            basic("fire", &["fire", "fire"], "1d4"),
            basic("cold", &["fire", "air"], "1d4"),
            basic("acid", &["fire", "earth"], "1d8"),
        ])
        .expect("valid set");
        let aggregate = essences(&["fire", "fire", "air", "earth"]);

        let matched = EffectMatcher::default().match_effects(&set, &aggregate);
        assert_eq!(matched.effect_names(), vec!["cold", "acid"]);
        assert!(matched.leftover.is_empty());
        assert!(matched.diverges_from_greedy);
        assert!(matched.exhaustive);
    }

    #[test]
    fn test_equal_leftover_prefers_fewer_effects() {
        let set = AlchemicalResultSet::from_effects([
            basic("storm", &["air", "water"], "2d6"),
            basic("gust", &["air"], "1d4"),
            basic("mist", &["water"], "1d4"),
        ])
        .expect("valid set");
        let matched = EffectMatcher::default().match_effects(&set, &essences(&["air", "water"]));
        assert_eq!(matched.effect_names(), vec!["storm"]);
        assert!(!matched.diverges_from_greedy);
    }

    #[test]
    fn test_modifiers_apply_after_basics() {
        let set = AlchemicalResultSet::from_effects([
            double_damage(&["positive"]),
            basic("acid", &["earth"], "1d8"),
        ])
        .expect("valid set");
        let matched = EffectMatcher::default().match_effects(&set, &essences(&["positive", "earth"]));

        let payload = matched.synthesize("Alchemical Bomb").expect("effects matched");
        assert_eq!(payload.damage[0].roll, DamageRoll::Dice { count: 2, faces: 8 });
        assert_eq!(
            payload.description,
            vec![
                "Deal 1d8 acid damage on contact.".to_string(),
                "Roll double the number of all damage dice.".to_string(),
            ]
        );
    }

    #[test]
    fn test_no_match_yields_no_payload() {
        let set = AlchemicalResultSet::from_effects([basic("fire", &["fire", "fire"], "1d4")])
            .expect("valid set");
        let matched = EffectMatcher::default().match_effects(&set, &essences(&["water"]));
        assert!(matched.effects.is_empty());
        assert!(matched.synthesize("Alchemical Bomb").is_none());
        assert_eq!(matched.leftover.size(), 1);
    }

    #[test]
    fn test_matching_is_idempotent() {
        let set = AlchemicalResultSet::from_effects([
            basic("fire", &["fire", "fire"], "1d4"),
            basic("acid", &["fire", "earth"], "1d8"),
            double_damage(&["positive"]),
        ])
        .expect("valid set");
        let aggregate = essences(&["fire", "earth", "positive"]);
        let matcher = EffectMatcher::default();

        let first = matcher.match_effects(&set, &aggregate);
        let second = matcher.match_effects(&set, &aggregate);
        assert_eq!(first, second);
        assert_eq!(first.synthesize("Bomb"), second.synthesize("Bomb"));
    }

    #[test]
    fn test_exhausted_budget_falls_back_to_greedy() {
        let set = AlchemicalResultSet::from_effects([
            basic("fire", &["fire", "fire"], "1d4"),
            basic("cold", &["fire", "air"], "1d4"),
            basic("acid", &["fire", "earth"], "1d8"),
        ])
        .expect("valid set");
        let aggregate = essences(&["fire", "fire", "air", "earth"]);

        let matched = EffectMatcher::new(2).match_effects(&set, &aggregate);
        assert!(!matched.exhaustive);
        assert_eq!(matched.effect_names(), vec!["fire"]);
        assert!(!matched.diverges_from_greedy);
    }
}
