//! Combatants.
//!
//! A unit carries a name, its current health and up to two catalog items.
//! It has no position of its own: where it stands is decided solely by the
//! [`Battlefield`](crate::battlefield::Battlefield) cell that holds it.

use serde::{Deserialize, Serialize};

use crate::error::SetupError;
use crate::items::ItemId;

/// Health every unit starts with.
pub const STARTING_HEALTH: i32 = 100;

/// Longest unit name in bytes.
pub const MAX_NAME_LEN: usize = 100;

/// Inventory slots available to every unit.
pub const SLOT_CAPACITY: u8 = 2;

/// A combatant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    name: String,
    /// Current health. Zero or below means defeated.
    pub health: i32,
    primary: ItemId,
    secondary: Option<ItemId>,
}

impl Unit {
    /// Create a unit at full health.
    ///
    /// The name is truncated to [`MAX_NAME_LEN`] bytes on a character
    /// boundary.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::Slots`] if the two items need more than
    /// [`SLOT_CAPACITY`] slots together.
    pub fn new(
        name: impl Into<String>,
        primary: ItemId,
        secondary: Option<ItemId>,
    ) -> Result<Self, SetupError> {
        Self::with_health(name, STARTING_HEALTH, primary, secondary)
    }

    /// Create a unit with an explicit health value, as restored from a save.
    ///
    /// # Errors
    ///
    /// Same as [`Unit::new`].
    pub fn with_health(
        name: impl Into<String>,
        health: i32,
        primary: ItemId,
        secondary: Option<ItemId>,
    ) -> Result<Self, SetupError> {
        let name = truncate_name(name.into());
        let required = primary.item().slots + secondary.map_or(0, |id| id.item().slots);
        if required > SLOT_CAPACITY {
            return Err(SetupError::Slots { name, required });
        }

        Ok(Self {
            name,
            health,
            primary,
            secondary,
        })
    }

    /// Unit name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mandatory slot-1 item.
    #[must_use]
    pub const fn primary(&self) -> ItemId {
        self.primary
    }

    /// Optional slot-2 item.
    #[must_use]
    pub const fn secondary(&self) -> Option<ItemId> {
        self.secondary
    }

    /// Equipped items in slot order.
    pub fn items(&self) -> impl Iterator<Item = ItemId> {
        std::iter::once(self.primary).chain(self.secondary)
    }

    /// Slots used by the equipped items.
    #[must_use]
    pub fn slots_used(&self) -> u8 {
        self.items().map(|id| id.item().slots).sum()
    }

    /// Sum of the equipped items' attack values.
    #[must_use]
    pub fn attack_power(&self) -> i32 {
        self.items().map(|id| id.item().attack).sum()
    }

    /// Sum of the equipped items' defense values.
    #[must_use]
    pub fn defense(&self) -> i32 {
        self.items().map(|id| id.item().defense).sum()
    }

    /// Larger range of the two items. Slot-1 is always present, so a unit
    /// whose items all have range 0 simply cannot reach anyone.
    #[must_use]
    pub fn effective_range(&self) -> i32 {
        self.items().map(|id| id.item().range).max().unwrap_or(0)
    }

    /// Radius of the unit's area ability: the first equipped item with a
    /// non-zero radius, slot-1 first.
    #[must_use]
    pub fn area_radius(&self) -> Option<i32> {
        self.items()
            .map(|id| id.item().radius)
            .find(|&radius| radius > 0)
    }

    /// Whether the unit can use the Special action.
    #[must_use]
    pub fn has_special_ability(&self) -> bool {
        self.area_radius().is_some()
    }

    /// Whether health has dropped to zero or below.
    #[must_use]
    pub const fn is_defeated(&self) -> bool {
        self.health <= 0
    }

    /// Subtract damage and return the remaining health.
    pub fn take_damage(&mut self, damage: i32) -> i32 {
        self.health -= damage;
        self.health
    }
}

fn truncate_name(mut name: String) -> String {
    if name.len() > MAX_NAME_LEN {
        let mut end = MAX_NAME_LEN;
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        name.truncate(end);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::find_item;

    fn item(name: &str) -> ItemId {
        find_item(name).unwrap()
    }

    #[test]
    fn test_new_unit_starts_at_full_health() {
        let unit = Unit::new("Astolfo", item("Sword"), Some(item("Shield"))).unwrap();
        assert_eq!(unit.health, STARTING_HEALTH);
        assert_eq!(unit.name(), "Astolfo");
        assert_eq!(unit.slots_used(), 2);
    }

    #[test]
    fn test_slot_overflow_rejected() {
        let err = Unit::new("Tank", item("Armor"), Some(item("Sword"))).unwrap_err();
        assert_eq!(
            err,
            SetupError::Slots {
                name: "Tank".into(),
                required: 3
            }
        );
        assert_eq!(err.code(), -4);
    }

    #[test]
    fn test_stats_sum_both_items() {
        let unit = Unit::new("Knight", item("Sword"), Some(item("Shield"))).unwrap();
        assert_eq!(unit.attack_power(), 10);
        assert_eq!(unit.defense(), 20);
        assert_eq!(unit.effective_range(), 1);
    }

    #[test]
    fn test_effective_range_is_max_of_items() {
        let unit = Unit::new("Scout", item("Dagger"), Some(item("Bow"))).unwrap();
        assert_eq!(unit.effective_range(), 3);

        let turtle = Unit::new("Turtle", item("Shield"), None).unwrap();
        assert_eq!(turtle.effective_range(), 0);
    }

    #[test]
    fn test_area_radius_prefers_slot_one() {
        let mage = Unit::new("Mage", item("Ice Staff"), None).unwrap();
        assert_eq!(mage.area_radius(), Some(2));
        assert!(mage.has_special_ability());

        let soldier = Unit::new("Soldier", item("Spear"), Some(item("Mace"))).unwrap();
        assert_eq!(soldier.area_radius(), None);
        assert!(!soldier.has_special_ability());
    }

    #[test]
    fn test_name_truncated_on_char_boundary() {
        let long = "é".repeat(80);
        let unit = Unit::new(long, item("Sword"), None).unwrap();
        assert!(unit.name().len() <= MAX_NAME_LEN);
        assert_eq!(unit.name().chars().count(), 50);
    }

    #[test]
    fn test_take_damage_defeats_at_zero() {
        let mut unit = Unit::new("Victim", item("Dagger"), None).unwrap();
        assert_eq!(unit.take_damage(99), 1);
        assert!(!unit.is_defeated());
        assert_eq!(unit.take_damage(1), 0);
        assert!(unit.is_defeated());
    }
}
