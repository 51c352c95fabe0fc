//! Tokens: naming, classification, the name → id table and item groups.
//!
//! Real tokens carry a stable numeric id offset by [`ITEM_ID_OFFSET`] so
//! they never collide with other games sharing a multiworld. Event tokens
//! have no id; they exist only to drive rule evaluation and are never seen
//! by the host's network layer.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, PokemonType};

pub const ITEM_ID_OFFSET: u64 = 8_574_000;
const TYPE_KEY_ID_BASE: u64 = 2000;
const USEFUL_ID_BASE: u64 = 3001;
const TRAP_ID_BASE: u64 = 4001;

/// Useful tokens, in id order.
pub const USEFUL_ITEMS: [&str; 3] = ["Master Ball", "Pokedex", "Pokegear"];

/// Trap tokens, in id order.
pub const TRAP_ITEMS: [&str; 4] = [
    "Small Shuffle Trap",
    "Big Shuffle Trap",
    "Derpy Mon Trap",
    "Release Trap",
];

/// Global guess counter, granted once per guessed species.
pub const GUESSED_EVENT: &str = "Pokemon Guessed";

/// Terminal token; holding it means the goal is complete.
pub const VICTORY_EVENT: &str = "Victory";

pub const UNLOCKS_GROUP: &str = "Unlocks";
pub const TYPE_KEYS_GROUP: &str = "Type Keys";
pub const USEFUL_GROUP: &str = "Useful";
pub const TRAPS_GROUP: &str = "Traps";

/// Identifies the owning player within a multiworld.
pub type PlayerId = u32;

pub fn unlock_name(species: &str) -> String {
    format!("{species} Unlock")
}

pub fn type_key_name(t: PokemonType) -> String {
    format!("{} Type Key", t.name())
}

/// Per-type guess counter.
pub fn type_guessed_event(t: PokemonType) -> String {
    format!("{} Guessed", t.name())
}

pub fn type_unlocks_group(t: PokemonType) -> String {
    format!("{} Unlocks", t.name())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemClassification {
    /// Required to reach some location.
    Progression,
    /// Helpful, never required.
    Useful,
    /// Hinders the receiving player.
    Trap,
}

/// A player-scoped token instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    /// `None` marks an event token.
    pub code: Option<u64>,
    pub classification: ItemClassification,
    pub player: PlayerId,
}

impl Item {
    /// An identity-less token that only drives rule evaluation.
    pub fn event(name: impl Into<String>, player: PlayerId) -> Self {
        Self {
            name: name.into(),
            code: None,
            classification: ItemClassification::Progression,
            player,
        }
    }

    pub fn is_event(&self) -> bool {
        self.code.is_none()
    }
}

/// Name → id and classification of every real token in a catalog.
#[derive(Debug, Clone, Serialize)]
pub struct ItemTable {
    entries: BTreeMap<String, (u64, ItemClassification)>,
}

impl ItemTable {
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut entries = BTreeMap::new();
        for species in catalog.species() {
            entries.insert(
                unlock_name(&species.name),
                (
                    ITEM_ID_OFFSET + species.id as u64,
                    ItemClassification::Progression,
                ),
            );
        }
        for &t in PokemonType::all() {
            entries.insert(
                type_key_name(t),
                (
                    ITEM_ID_OFFSET + TYPE_KEY_ID_BASE + t.index() as u64,
                    ItemClassification::Progression,
                ),
            );
        }
        for (i, name) in USEFUL_ITEMS.iter().enumerate() {
            entries.insert(
                name.to_string(),
                (
                    ITEM_ID_OFFSET + USEFUL_ID_BASE + i as u64,
                    ItemClassification::Useful,
                ),
            );
        }
        for (i, name) in TRAP_ITEMS.iter().enumerate() {
            entries.insert(
                name.to_string(),
                (
                    ITEM_ID_OFFSET + TRAP_ID_BASE + i as u64,
                    ItemClassification::Trap,
                ),
            );
        }
        Self { entries }
    }

    pub fn id(&self, name: &str) -> Option<u64> {
        self.entries.get(name).map(|(id, _)| *id)
    }

    /// Instantiate a real token for `player`. `None` for unknown names.
    pub fn create(&self, name: &str, player: PlayerId) -> Option<Item> {
        self.entries.get(name).map(|&(id, classification)| Item {
            name: name.to_string(),
            code: Some(id),
            classification,
            player,
        })
    }

    /// The name → id mapping handed to the host.
    pub fn name_to_id(&self) -> BTreeMap<String, u64> {
        self.entries
            .iter()
            .map(|(name, (id, _))| (name.clone(), *id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Symbolic group name → member token names.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ItemGroups {
    groups: BTreeMap<String, BTreeSet<String>>,
}

impl ItemGroups {
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for species in catalog.species() {
            let unlock = unlock_name(&species.name);
            groups
                .entry(UNLOCKS_GROUP.to_string())
                .or_default()
                .insert(unlock.clone());
            for &t in &species.types {
                groups
                    .entry(type_unlocks_group(t))
                    .or_default()
                    .insert(unlock.clone());
            }
        }
        groups.insert(
            TYPE_KEYS_GROUP.to_string(),
            PokemonType::all().iter().map(|&t| type_key_name(t)).collect(),
        );
        groups.insert(
            USEFUL_GROUP.to_string(),
            USEFUL_ITEMS.iter().map(|s| s.to_string()).collect(),
        );
        groups.insert(
            TRAPS_GROUP.to_string(),
            TRAP_ITEMS.iter().map(|s| s.to_string()).collect(),
        );
        Self { groups }
    }

    /// Members of `group`; empty for unknown groups.
    pub fn members(&self, group: &str) -> impl Iterator<Item = &str> {
        self.groups
            .get(group)
            .into_iter()
            .flat_map(|m| m.iter().map(String::as_str))
    }

    pub fn insert(&mut self, group: impl Into<String>, members: BTreeSet<String>) {
        self.groups.insert(group.into(), members);
    }

    pub fn as_map(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.groups
    }
}
