//! Requirement satisfaction and component selection.
//!
//! Given an inventory snapshot and a [`RequirementOption`], the [`Selector`]
//! decides whether the option can be met and which concrete units to consume:
//!
//! 1. Catalysts must be present. They are reserved, never consumed.
//! 2. Ingredients must be present in what remains after catalysts.
//! 3. An essence target is covered by a subset of what remains after
//!    catalysts and ingredients.
//!
//! Essence covering is a bounded depth-first search over the candidate
//! components (those contributing at least one target essence), in id order.
//! The best subset minimizes leftover essence units, then the number of
//! distinct component types. Equal-best subsets resolve to the first one
//! found and are reported as ambiguous. The search visits at most
//! `exploration_budget` nodes; when the budget runs out it keeps the best
//! subset found so far, or reports the essences as unmet.

use serde::Serialize;
use std::cmp::Ordering;
use tracing::{debug, warn};

use crate::combination::Combination;
use crate::component::CraftingComponent;
use crate::essence::EssenceDefinition;
use crate::recipe::RequirementOption;

/// Default number of search nodes visited per essence selection.
pub const DEFAULT_EXPLORATION_BUDGET: usize = 100_000;

/// Tuning for the selection engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionConfig {
    /// Maximum search nodes visited per essence selection
    pub exploration_budget: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            exploration_budget: DEFAULT_EXPLORATION_BUDGET,
        }
    }
}

/// The class of requirement that was not met.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementClass {
    /// Required-but-not-consumed components
    Catalysts,
    /// Consumed components
    Ingredients,
    /// Abstract essence target
    Essences,
}

/// What an inventory lacks to meet a requirement option.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Insufficiency {
    /// Catalysts not owned
    pub missing_catalysts: Combination<CraftingComponent>,
    /// Ingredients not owned beyond the reserved catalysts
    pub missing_ingredients: Combination<CraftingComponent>,
    /// Essences not covered by the remaining components
    pub missing_essences: Combination<EssenceDefinition>,
}

impl Insufficiency {
    /// Requirement classes with a non-empty shortfall.
    #[must_use]
    pub fn unmet(&self) -> Vec<RequirementClass> {
        let mut classes = Vec::new();
        if !self.missing_catalysts.is_empty() {
            classes.push(RequirementClass::Catalysts);
        }
        if !self.missing_ingredients.is_empty() {
            classes.push(RequirementClass::Ingredients);
        }
        if !self.missing_essences.is_empty() {
            classes.push(RequirementClass::Essences);
        }
        classes
    }

    /// True when nothing is missing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unmet().is_empty()
    }
}

/// Components chosen to cover an essence target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EssenceSelection {
    /// Components to consume
    pub components: Combination<CraftingComponent>,
    /// Leftover essence units beyond the target
    pub waste: u32,
    /// Another subset was equally good
    pub ambiguous: bool,
    /// The search covered the whole space
    pub exhaustive: bool,
}

/// A satisfied requirement option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Catalysts verified present
    pub catalysts: Combination<CraftingComponent>,
    /// Fixed ingredients to consume
    pub ingredients: Combination<CraftingComponent>,
    /// Components chosen for the essence target
    pub essences: EssenceSelection,
}

impl Selection {
    /// Everything the craft removes from the inventory.
    #[must_use]
    pub fn consumed(&self) -> Combination<CraftingComponent> {
        self.ingredients.add(&self.essences.components)
    }
}

/// Outcome of evaluating a requirement option against an inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Satisfaction {
    /// The option can be met with this selection
    Satisfied(Selection),
    /// The option cannot be met
    Insufficient(Insufficiency),
}

impl Satisfaction {
    /// Whether the option can be met.
    #[must_use]
    pub const fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied(_))
    }
}

/// Evaluates requirement options against inventory snapshots.
#[derive(Debug, Clone, Default)]
pub struct Selector {
    config: SelectionConfig,
}

impl Selector {
    /// Creates a selector.
    #[must_use]
    pub const fn new(config: SelectionConfig) -> Self {
        Self { config }
    }

    /// Returns the selector configuration.
    #[must_use]
    pub const fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Checks `option` against `inventory` and picks what to consume.
    #[must_use]
    pub fn evaluate(
        &self,
        option: &RequirementOption,
        inventory: &Combination<CraftingComponent>,
    ) -> Satisfaction {
        let missing_catalysts = inventory.shortfall(&option.catalysts);
        let remainder = inventory.subtract(&option.catalysts);
        let missing_ingredients = remainder.shortfall(&option.ingredients);
        let available = remainder.subtract(&option.ingredients);

        let essences = if option.requires_essences() {
            self.select_essences(&option.essences, &available)
        } else {
            Some(EssenceSelection {
                exhaustive: true,
                ..EssenceSelection::default()
            })
        };

        let missing_essences = if essences.is_some() {
            Combination::new()
        } else {
            let shortfall = available.essences().shortfall(&option.essences);
            if shortfall.is_empty() {
                // Covering exists but the budget ran out before reaching it.
                option.essences.clone()
            } else {
                shortfall
            }
        };

        match essences {
            Some(essences) if missing_catalysts.is_empty() && missing_ingredients.is_empty() => {
                Satisfaction::Satisfied(Selection {
                    catalysts: option.catalysts.clone(),
                    ingredients: option.ingredients.clone(),
                    essences,
                })
            },
            _ => Satisfaction::Insufficient(Insufficiency {
                missing_catalysts,
                missing_ingredients,
                missing_essences,
            }),
        }
    }

    /// Chooses components from `available` covering `target` with the least
    /// leftover essence.
    #[must_use]
    pub fn select_essences(
        &self,
        target: &Combination<EssenceDefinition>,
        available: &Combination<CraftingComponent>,
    ) -> Option<EssenceSelection> {
        if target.is_empty() {
            return Some(EssenceSelection {
                exhaustive: true,
                ..EssenceSelection::default()
            });
        }

        let mut search = EssenceSearch::new(target, available, self.config.exploration_budget);
        let root_need: Vec<u32> = target.units().map(|unit| unit.quantity()).collect();
        search.visit(0, &root_need, 0, 0);

        if search.exhausted {
            warn!(
                "Essence selection stopped after {} nodes ({} candidates)",
                search.nodes,
                search.candidates.len()
            );
        }

        let best = search.best.take()?;
        let components: Combination<CraftingComponent> = search
            .candidates
            .iter()
            .zip(&best.counts)
            .map(|(candidate, &count)| (candidate.component.clone(), count))
            .collect();

        if search.ambiguous {
            debug!(
                "Essence selection tie at waste {}, keeping first of equal subsets",
                best.waste
            );
        }

        Some(EssenceSelection {
            components,
            waste: best.waste,
            ambiguous: search.ambiguous,
            exhaustive: !search.exhausted,
        })
    }
}

struct Candidate<'a> {
    component: &'a CraftingComponent,
    cap: u32,
    per_unit: Vec<u32>,
    unit_size: u32,
}

struct Best {
    counts: Vec<u32>,
    waste: u32,
    distinct: usize,
}

struct EssenceSearch<'a> {
    candidates: Vec<Candidate<'a>>,
    /// `reach[i][e]`: most of target essence `e` candidates `i..` can supply
    reach: Vec<Vec<u32>>,
    target_total: u32,
    budget: usize,
    nodes: usize,
    exhausted: bool,
    counts: Vec<u32>,
    best: Option<Best>,
    ambiguous: bool,
}

impl<'a> EssenceSearch<'a> {
    fn new(
        target: &Combination<EssenceDefinition>,
        available: &'a Combination<CraftingComponent>,
        budget: usize,
    ) -> Self {
        let candidates: Vec<Candidate<'a>> = available
            .units()
            .filter_map(|unit| {
                let component = unit.element();
                let per_unit: Vec<u32> = target
                    .units()
                    .map(|wanted| component.essences.amount_for(&wanted.element().id))
                    .collect();
                let useful_units = target
                    .units()
                    .zip(&per_unit)
                    .filter(|(_, &supplied)| supplied > 0)
                    .map(|(wanted, &supplied)| wanted.quantity().div_ceil(supplied))
                    .max()?;
                Some(Candidate {
                    component,
                    cap: useful_units.min(unit.quantity()),
                    per_unit,
                    unit_size: component.essences.size(),
                })
            })
            .collect();

        let width = target.distinct_count();
        let mut reach = vec![vec![0u32; width]; candidates.len() + 1];
        for index in (0..candidates.len()).rev() {
            let candidate = &candidates[index];
            for essence in 0..width {
                reach[index][essence] =
                    reach[index + 1][essence]
                    .saturating_add(candidate.cap.saturating_mul(candidate.per_unit[essence]));
            }
        }

        let counts = vec![0; candidates.len()];
        Self {
            candidates,
            reach,
            target_total: target.size(),
            budget,
            nodes: 0,
            exhausted: false,
            counts,
            best: None,
            ambiguous: false,
        }
    }

    fn visit(&mut self, index: usize, need: &[u32], size: u32, distinct: usize) {
        if self.exhausted {
            return;
        }
        self.nodes += 1;
        if self.nodes > self.budget {
            self.exhausted = true;
            return;
        }

        if need.iter().all(|&remaining| remaining == 0) {
            self.record(size.saturating_sub(self.target_total), distinct);
            return;
        }
        if index == self.candidates.len() {
            return;
        }
        // Not yet covering: any completion adds at least one more unit.
        if let Some(best) = &self.best {
            if size >= self.target_total.saturating_add(best.waste) {
                return;
            }
        }
        if need
            .iter()
            .zip(&self.reach[index])
            .any(|(remaining, reachable)| remaining > reachable)
        {
            return;
        }

        let cap = self.candidates[index].cap;
        let per_unit = self.candidates[index].per_unit.clone();
        let unit_size = self.candidates[index].unit_size;

        for count in (0..=cap).rev() {
            let next: Vec<u32> = need
                .iter()
                .zip(&per_unit)
                .map(|(remaining, supplied)| {
                    remaining.saturating_sub(supplied.saturating_mul(count))
                })
                .collect();
            self.counts[index] = count;
            self.visit(
                index + 1,
                &next,
                size.saturating_add(unit_size.saturating_mul(count)),
                distinct + usize::from(count > 0),
            );
            if self.exhausted {
                break;
            }
        }
        self.counts[index] = 0;
    }

    fn record(&mut self, waste: u32, distinct: usize) {
        let ordering = self
            .best
            .as_ref()
            .map(|best| (waste, distinct).cmp(&(best.waste, best.distinct)));
        match ordering {
            Some(Ordering::Greater) => {},
            Some(Ordering::Equal) => self.ambiguous = true,
            _ => {
                self.best = Some(Best {
                    counts: self.counts.clone(),
                    waste,
                    distinct,
                });
                self.ambiguous = false;
            },
        }
    }
}
