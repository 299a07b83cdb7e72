//! Immutable multisets of keyed crafting entities.
//!
//! A [`Combination`] maps each distinct entity (by key) to a positive
//! quantity. Every operation returns a new value; zero quantities are never
//! stored. Quantities saturate at `u32::MAX` instead of overflowing.
//! Backing storage is a `BTreeMap`, so iteration order is the key
//! order, which is what the selection engine relies on for determinism.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, Mul, Sub};

/// An entity that can be counted inside a [`Combination`].
pub trait Keyed {
    /// Stable identifier type.
    type Key: Ord + Clone + fmt::Debug;

    /// Returns the entity's identifier.
    fn key(&self) -> &Self::Key;
}

/// A quantity of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unit<T> {
    element: T,
    quantity: u32,
}

impl<T> Unit<T> {
    /// Creates a unit. Units with a zero quantity are ignored by
    /// [`Combination`] constructors.
    #[must_use]
    pub const fn new(element: T, quantity: u32) -> Self {
        Self { element, quantity }
    }

    /// The counted entity.
    #[must_use]
    pub const fn element(&self) -> &T {
        &self.element
    }

    /// How many of the entity.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }
}

/// Immutable multiset of keyed entities with positive quantities.
#[derive(Clone, PartialEq, Eq)]
pub struct Combination<T: Keyed> {
    units: BTreeMap<T::Key, Unit<T>>,
}

impl<T: Keyed> Default for Combination<T> {
    fn default() -> Self {
        Self {
            units: BTreeMap::new(),
        }
    }
}

impl<T: Keyed + fmt::Debug> fmt::Debug for Combination<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.units.iter().map(|(key, unit)| (key, unit.quantity)))
            .finish()
    }
}

impl<T: Keyed + Clone> Combination<T> {
    /// Creates an empty combination.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a combination holding a single entity.
    #[must_use]
    pub fn of(element: T, quantity: u32) -> Self {
        Self::from_units([Unit::new(element, quantity)])
    }

    /// Creates a combination from units, merging units with the same key.
    pub fn from_units(units: impl IntoIterator<Item = Unit<T>>) -> Self {
        let mut merged: BTreeMap<T::Key, Unit<T>> = BTreeMap::new();
        for unit in units {
            if unit.quantity == 0 {
                continue;
            }
            merged
                .entry(unit.element.key().clone())
                .and_modify(|existing| {
                    existing.quantity = existing.quantity.saturating_add(unit.quantity);
                })
                .or_insert(unit);
        }
        Self { units: merged }
    }

    /// Total number of entities (sum of all quantities).
    #[must_use]
    pub fn size(&self) -> u32 {
        self.units
            .values()
            .fold(0, |total: u32, unit| total.saturating_add(unit.quantity))
    }

    /// Number of distinct entities.
    #[must_use]
    pub fn distinct_count(&self) -> usize {
        self.units.len()
    }

    /// Returns true if the combination holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Quantity held for a key, zero when absent.
    #[must_use]
    pub fn amount_for(&self, key: &T::Key) -> u32 {
        self.units.get(key).map_or(0, |unit| unit.quantity)
    }

    /// Checks that at least `amount` of the keyed entity is present.
    #[must_use]
    pub fn has(&self, key: &T::Key, amount: u32) -> bool {
        self.amount_for(key) >= amount.max(1)
    }

    /// Looks up the unit stored for a key.
    #[must_use]
    pub fn get(&self, key: &T::Key) -> Option<&Unit<T>> {
        self.units.get(key)
    }

    /// Iterates units in key order.
    pub fn units(&self) -> impl Iterator<Item = &Unit<T>> + '_ {
        self.units.values()
    }

    /// Iterates distinct entities in key order.
    pub fn members(&self) -> impl Iterator<Item = &T> + '_ {
        self.units.values().map(Unit::element)
    }

    /// Returns the sum of both combinations.
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        let mut units = self.units.clone();
        for (key, unit) in &other.units {
            units
                .entry(key.clone())
                .and_modify(|existing| {
                    existing.quantity = existing.quantity.saturating_add(unit.quantity);
                })
                .or_insert_with(|| unit.clone());
        }
        Self { units }
    }

    /// Returns this combination with `quantity` more of `element`.
    #[must_use]
    pub fn add_unit(&self, element: T, quantity: u32) -> Self {
        self.add(&Self::of(element, quantity))
    }

    /// Removes `other` from this combination, flooring every quantity at
    /// zero and dropping entries that reach zero.
    #[must_use]
    pub fn subtract(&self, other: &Self) -> Self {
        let units = self
            .units
            .iter()
            .filter_map(|(key, unit)| {
                let remaining = unit.quantity.saturating_sub(other.amount_for(key));
                (remaining > 0).then(|| {
                    (
                        key.clone(),
                        Unit::new(unit.element.clone(), remaining),
                    )
                })
            })
            .collect();
        Self { units }
    }

    /// Scales every quantity by `factor`. A zero factor yields an empty
    /// combination.
    #[must_use]
    pub fn multiply(&self, factor: u32) -> Self {
        if factor == 0 {
            return Self::new();
        }
        let units = self
            .units
            .iter()
            .map(|(key, unit)| {
                (
                    key.clone(),
                    Unit::new(unit.element.clone(), unit.quantity.saturating_mul(factor)),
                )
            })
            .collect();
        Self { units }
    }

    /// Entities present in both, at the smaller of the two quantities.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        let units = self
            .units
            .iter()
            .filter_map(|(key, unit)| {
                let shared = unit.quantity.min(other.amount_for(key));
                (shared > 0).then(|| (key.clone(), Unit::new(unit.element.clone(), shared)))
            })
            .collect();
        Self { units }
    }

    /// Entities present in either, at the larger of the two quantities.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut units = self.units.clone();
        for (key, unit) in &other.units {
            units
                .entry(key.clone())
                .and_modify(|existing| existing.quantity = existing.quantity.max(unit.quantity))
                .or_insert_with(|| unit.clone());
        }
        Self { units }
    }

    /// Returns this combination without the keyed entity.
    #[must_use]
    pub fn without(&self, key: &T::Key) -> Self {
        let mut units = self.units.clone();
        units.remove(key);
        Self { units }
    }

    /// Checks that, for every entity in `requirement`, this combination
    /// holds at least as many.
    #[must_use]
    pub fn is_sufficient_for(&self, requirement: &Self) -> bool {
        requirement
            .units
            .iter()
            .all(|(key, unit)| self.amount_for(key) >= unit.quantity)
    }

    /// What `requirement` needs beyond what this combination holds.
    #[must_use]
    pub fn shortfall(&self, requirement: &Self) -> Self {
        requirement.subtract(self)
    }
}

impl<T: Keyed + Clone> FromIterator<Unit<T>> for Combination<T> {
    fn from_iter<I: IntoIterator<Item = Unit<T>>>(iter: I) -> Self {
        Self::from_units(iter)
    }
}

impl<T: Keyed + Clone> FromIterator<(T, u32)> for Combination<T> {
    fn from_iter<I: IntoIterator<Item = (T, u32)>>(iter: I) -> Self {
        Self::from_units(iter.into_iter().map(|(element, quantity)| Unit::new(element, quantity)))
    }
}

impl<T: Keyed + Clone> Add for &Combination<T> {
    type Output = Combination<T>;

    fn add(self, rhs: Self) -> Self::Output {
        Combination::add(self, rhs)
    }
}

impl<T: Keyed + Clone> Sub for &Combination<T> {
    type Output = Combination<T>;

    fn sub(self, rhs: Self) -> Self::Output {
        self.subtract(rhs)
    }
}

impl<T: Keyed + Clone> Mul<u32> for &Combination<T> {
    type Output = Combination<T>;

    fn mul(self, rhs: u32) -> Self::Output {
        self.multiply(rhs)
    }
}

impl<T: Keyed + Serialize> Serialize for Combination<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.units.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Token(u8);

    impl Keyed for Token {
        type Key = u8;

        fn key(&self) -> &u8 {
            &self.0
        }
    }

    fn combo(pairs: &[(u8, u32)]) -> Combination<Token> {
        pairs.iter().map(|&(key, qty)| (Token(key), qty)).collect()
    }

    #[test]
    fn test_of_and_size() {
        let mud = Combination::of(Token(1), 3);
        assert_eq!(mud.size(), 3);
        assert_eq!(mud.distinct_count(), 1);
        assert_eq!(mud.amount_for(&1), 3);
        assert_eq!(mud.amount_for(&2), 0);
    }

    #[test]
    fn test_zero_quantity_units_are_dropped() {
        let c = combo(&[(1, 0), (2, 4)]);
        assert_eq!(c.distinct_count(), 1);
        assert!(c.get(&1).is_none());
    }

    #[test]
    fn test_from_units_merges_duplicates() {
        let c = combo(&[(1, 2), (1, 3), (2, 1)]);
        assert_eq!(c.amount_for(&1), 5);
        assert_eq!(c.size(), 6);
    }

    #[test]
    fn test_subtract_floors_at_zero() {
        let a = combo(&[(1, 2), (2, 1)]);
        let b = combo(&[(1, 5), (3, 1)]);
        let rest = a.subtract(&b);
        assert_eq!(rest, combo(&[(2, 1)]));
    }

    #[test]
    fn test_multiply() {
        let c = combo(&[(1, 2), (2, 1)]);
        assert_eq!(&c * 3, combo(&[(1, 6), (2, 3)]));
        assert!(c.multiply(0).is_empty());
    }

    #[test]
    fn test_intersection_and_union() {
        let a = combo(&[(1, 2), (2, 5)]);
        let b = combo(&[(2, 3), (3, 1)]);
        assert_eq!(a.intersection(&b), combo(&[(2, 3)]));
        assert_eq!(a.union(&b), combo(&[(1, 2), (2, 5), (3, 1)]));
    }

    #[test]
    fn test_has_defaults_to_one() {
        let c = combo(&[(1, 2)]);
        assert!(c.has(&1, 0));
        assert!(c.has(&1, 2));
        assert!(!c.has(&1, 3));
        assert!(!c.has(&9, 0));
    }

    #[test]
    fn test_shortfall() {
        let inventory = combo(&[(1, 1)]);
        let required = combo(&[(1, 2), (2, 1)]);
        assert_eq!(inventory.shortfall(&required), combo(&[(1, 1), (2, 1)]));
    }

    #[test]
    fn test_equality_ignores_construction_order() {
        assert_eq!(combo(&[(1, 1), (2, 2)]), combo(&[(2, 2), (1, 1)]));
    }

    #[test]
    fn test_large_quantities_saturate() {
        let c = combo(&[(1, u32::MAX - 1), (1, 5), (2, 3_000_000_000)]);
        assert_eq!(c.amount_for(&1), u32::MAX);
        assert_eq!(c.size(), u32::MAX);
        assert_eq!(c.multiply(2).amount_for(&2), u32::MAX);
        assert_eq!(c.add(&combo(&[(2, 3_000_000_000)])).amount_for(&2), u32::MAX);
    }

    #[test]
    fn test_values_do_not_share_storage() {
        let a = combo(&[(1, 1)]);
        let b = a.add_unit(Token(1), 1);
        assert_eq!(a.amount_for(&1), 1);
        assert_eq!(b.amount_for(&1), 2);
    }

    fn arb_combination() -> impl Strategy<Value = Combination<Token>> {
        prop::collection::vec((0u8..6, 0u32..8), 0..8).prop_map(|pairs| combo(&pairs))
    }

    proptest! {
        #[test]
        fn prop_add_then_subtract_is_identity(a in arb_combination(), b in arb_combination()) {
            prop_assert_eq!(a.add(&b).subtract(&b), a);
        }

        #[test]
        fn prop_sufficient_for_self_but_not_more(a in arb_combination(), key in 0u8..6) {
            prop_assert!(a.is_sufficient_for(&a));
            prop_assert!(!a.is_sufficient_for(&a.add_unit(Token(key), 1)));
        }

        #[test]
        fn prop_intersection_within_both_union_covers_both(a in arb_combination(), b in arb_combination()) {
            let meet = a.intersection(&b);
            let join = a.union(&b);
            prop_assert!(a.is_sufficient_for(&meet) && b.is_sufficient_for(&meet));
            prop_assert!(join.is_sufficient_for(&a) && join.is_sufficient_for(&b));
        }

        #[test]
        fn prop_shortfall_closes_the_gap(a in arb_combination(), b in arb_combination()) {
            prop_assert!(a.add(&a.shortfall(&b)).is_sufficient_for(&b));
        }
    }
}
