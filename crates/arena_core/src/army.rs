//! Army setup.
//!
//! Armies are assembled before a battle from unit specifications naming
//! catalog items. Every failure maps to a [`SetupError`] whose code the mode
//! controller reports before returning to the menu.

use serde::{Deserialize, Serialize};

use crate::error::SetupError;
use crate::items::{find_item, ItemId};
use crate::roster::ROSTER_CAPACITY;
use crate::unit::{Unit, SLOT_CAPACITY};

/// Smallest allowed army.
pub const MIN_ARMY: usize = 1;

/// Largest allowed army.
pub const MAX_ARMY: usize = ROSTER_CAPACITY;

/// A unit as written in a scenario: a name and catalog item names.
///
/// # Example RON
///
/// ```ron
/// UnitSpec(name: "Roland", primary: Some("Sword"), secondary: Some("Shield"))
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSpec {
    /// Unit name.
    pub name: String,
    /// Slot-1 item name. Mandatory, but kept optional so a missing choice
    /// is reported as a setup error rather than a parse error.
    #[serde(default)]
    pub primary: Option<String>,
    /// Slot-2 item name.
    #[serde(default)]
    pub secondary: Option<String>,
}

impl UnitSpec {
    /// Spec with a primary item only.
    pub fn new(name: impl Into<String>, primary: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary: Some(primary.into()),
            secondary: None,
        }
    }

    /// Add a secondary item.
    pub fn with_secondary(mut self, secondary: impl Into<String>) -> Self {
        self.secondary = Some(secondary.into());
        self
    }

    /// Resolve item names and build the unit at full health.
    ///
    /// # Errors
    ///
    /// - [`SetupError::MissingPrimaryItem`] when no primary item is given
    /// - [`SetupError::UnknownItem`] when a name is not in the catalog
    /// - [`SetupError::Slots`] when the secondary does not fit the slots
    ///   left by the primary
    pub fn build(&self) -> Result<Unit, SetupError> {
        let primary_name = self
            .primary
            .as_deref()
            .ok_or_else(|| SetupError::MissingPrimaryItem(self.name.clone()))?;
        let primary = lookup(primary_name)?;
        let secondary = self.secondary.as_deref().map(lookup).transpose()?;
        Unit::new(self.name.clone(), primary, secondary)
    }
}

fn lookup(name: &str) -> Result<ItemId, SetupError> {
    find_item(name).ok_or_else(|| SetupError::UnknownItem(name.to_string()))
}

/// Slots left for the secondary item once `primary` is equipped.
#[must_use]
pub fn slots_left_after(primary: ItemId) -> u8 {
    SLOT_CAPACITY.saturating_sub(primary.item().slots)
}

/// An army of one to five units, in deployment order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Army {
    units: Vec<Unit>,
}

impl Army {
    /// Wrap already-built units.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::UnitCount`] unless `1..=5` units are given.
    pub fn new(units: Vec<Unit>) -> Result<Self, SetupError> {
        if !(MIN_ARMY..=MAX_ARMY).contains(&units.len()) {
            return Err(SetupError::UnitCount(units.len()));
        }
        Ok(Self { units })
    }

    /// Build every spec, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Any error from [`Army::new`] or [`UnitSpec::build`].
    pub fn from_specs(specs: &[UnitSpec]) -> Result<Self, SetupError> {
        if !(MIN_ARMY..=MAX_ARMY).contains(&specs.len()) {
            return Err(SetupError::UnitCount(specs.len()));
        }
        let units = specs
            .iter()
            .map(UnitSpec::build)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(units = units.len(), "Army assembled");
        Self::new(units)
    }

    /// Units in deployment order.
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Number of units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Always false for a validated army; provided for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Consume the army, yielding its units.
    #[must_use]
    pub fn into_units(self) -> Vec<Unit> {
        self.units
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_builds_unit() {
        let unit = UnitSpec::new("Roland", "Sword")
            .with_secondary("Shield")
            .build()
            .unwrap();
        assert_eq!(unit.name(), "Roland");
        assert_eq!(unit.defense(), 20);
    }

    #[test]
    fn test_missing_primary() {
        let spec = UnitSpec {
            name: "Nobody".into(),
            primary: None,
            secondary: Some("Bow".into()),
        };
        assert_eq!(spec.build().unwrap_err().code(), -2);
    }

    #[test]
    fn test_unknown_item() {
        let err = UnitSpec::new("Jester", "Rubber Chicken").build().unwrap_err();
        assert_eq!(err, SetupError::UnknownItem("Rubber Chicken".into()));
        assert_eq!(err.code(), -3);
    }

    #[test]
    fn test_secondary_must_fit_remaining_slots() {
        let err = UnitSpec::new("Giant", "Greatsword")
            .with_secondary("Dagger")
            .build()
            .unwrap_err();
        assert_eq!(err.code(), -4);
        assert_eq!(slots_left_after(find_item("Greatsword").unwrap()), 0);
        assert_eq!(slots_left_after(find_item("Dagger").unwrap()), 1);
    }

    #[test]
    fn test_army_size_bounds() {
        assert_eq!(Army::from_specs(&[]).unwrap_err(), SetupError::UnitCount(0));

        let six: Vec<_> = (0..6)
            .map(|i| UnitSpec::new(format!("u{i}"), "Dagger"))
            .collect();
        assert_eq!(Army::from_specs(&six).unwrap_err().code(), -1);

        let five = &six[..5];
        assert_eq!(Army::from_specs(five).unwrap().len(), 5);
    }

    #[test]
    fn test_spec_from_ron() {
        let spec: UnitSpec =
            ron::from_str(r#"(name: "Roland", primary: Some("Sword"))"#).unwrap();
        assert_eq!(spec, UnitSpec::new("Roland", "Sword"));
    }
}
