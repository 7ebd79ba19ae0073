//! Immutable item catalog.
//!
//! Units refer to items only through [`ItemId`], a stable index into
//! [`CATALOG`]. Save files store the same index, so the table can be tuned
//! without migrating saves as long as indices stay valid.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of entries in the catalog.
pub const NUMBER_OF_ITEMS: usize = 16;

/// An equippable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Item {
    /// Display name.
    pub name: &'static str,
    /// Attack bonus added to the wielder's attack power.
    pub attack: i32,
    /// Defense bonus added to the wielder's defense.
    pub defense: i32,
    /// Inventory slots consumed (a unit has two).
    pub slots: u8,
    /// Manhattan attack range granted by the item.
    pub range: i32,
    /// Chebyshev radius of the item's area ability (0 = none).
    pub radius: i32,
}

impl Item {
    const fn new(
        name: &'static str,
        attack: i32,
        defense: i32,
        slots: u8,
        range: i32,
        radius: i32,
    ) -> Self {
        Self {
            name,
            attack,
            defense,
            slots,
            range,
            radius,
        }
    }

    /// Whether the item grants an area ability.
    #[must_use]
    pub const fn has_area(&self) -> bool {
        self.radius > 0
    }
}

/// The item table. Grouped loosely by slot cost.
pub static CATALOG: [Item; NUMBER_OF_ITEMS] = [
    Item::new("Sword", 10, 5, 1, 1, 0),
    Item::new("Shield", 0, 15, 1, 0, 0),
    Item::new("Bow", 8, 0, 1, 3, 0),
    Item::new("Staff", 5, 5, 1, 2, 0),
    Item::new("Axe", 12, 3, 1, 1, 0),
    Item::new("Armor", 0, 20, 2, 0, 0),
    Item::new("Dagger", 7, 2, 1, 1, 0),
    Item::new("Spear", 9, 4, 1, 2, 0),
    Item::new("Wand", 6, 0, 1, 3, 0),
    Item::new("Hammer", 11, 6, 2, 1, 0),
    Item::new("Crossbow", 10, 0, 2, 4, 0),
    Item::new("Mace", 8, 7, 1, 1, 0),
    Item::new("Greatsword", 15, 8, 2, 1, 0),
    Item::new("Fireball Staff", 12, 0, 2, 3, 1),
    Item::new("Ice Staff", 8, 0, 2, 3, 2),
    Item::new("Lightning Rod", 14, 0, 2, 2, 1),
];

/// Stable identity of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ItemId(u8);

impl ItemId {
    /// Look up an id from a raw index as found in save files.
    ///
    /// Returns `None` for negative or out-of-catalog indices.
    #[must_use]
    pub fn from_index(index: i32) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .filter(|&i| i < NUMBER_OF_ITEMS)
            .map(|i| Self(i as u8))
    }

    /// Index into [`CATALOG`].
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The catalog entry this id refers to.
    #[must_use]
    pub fn item(self) -> &'static Item {
        &CATALOG[self.0 as usize]
    }

    /// Iterate over every catalog id in table order.
    pub fn all() -> impl Iterator<Item = ItemId> {
        (0..NUMBER_OF_ITEMS as u8).map(ItemId)
    }
}

impl TryFrom<u8> for ItemId {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_index(i32::from(value)).ok_or_else(|| format!("item index {value} out of range"))
    }
}

impl From<ItemId> for u8 {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.item().name)
    }
}

/// Find a catalog entry by exact name.
#[must_use]
pub fn find_item(name: &str) -> Option<ItemId> {
    ItemId::all().find(|id| id.item().name == name)
}

/// Items that fit into the given number of free slots, in catalog order.
pub fn items_fitting(slots_available: u8) -> impl Iterator<Item = ItemId> {
    ItemId::all().filter(move |id| id.item().slots <= slots_available)
}

/// One-line summary used by unit lists, e.g. `Sword (A:10,D:5,R:1)`.
#[must_use]
pub fn item_summary(item: Option<ItemId>) -> String {
    match item {
        Some(id) => {
            let item = id.item();
            format!(
                "{} (A:{},D:{},R:{})",
                item.name, item.attack, item.defense, item.range
            )
        }
        None => "None".to_string(),
    }
}
