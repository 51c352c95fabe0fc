//! Content catalog: the ordered, read-only list of guessable species.
//!
//! The catalog is handed to generation once and never mutated. Every
//! derived table (item ids, location ids, groups) is computed from the
//! full catalog so that ids stay stable regardless of options; the
//! inclusion limit only narrows which records are *active* for a seed.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Species ids that are always granted at the start of a game.
pub const STARTER_IDS: [u32; 3] = [1, 4, 7];

/// Elemental type of a species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PokemonType {
    Normal,
    Fire,
    Water,
    Electric,
    Grass,
    Ice,
    Fighting,
    Poison,
    Ground,
    Flying,
    Psychic,
    Bug,
    Rock,
    Ghost,
    Dragon,
    Dark,
    Steel,
    Fairy,
}

impl PokemonType {
    /// All types in table order. The index is part of the type key's item id.
    pub fn all() -> &'static [PokemonType] {
        &[
            PokemonType::Normal,
            PokemonType::Fire,
            PokemonType::Water,
            PokemonType::Electric,
            PokemonType::Grass,
            PokemonType::Ice,
            PokemonType::Fighting,
            PokemonType::Poison,
            PokemonType::Ground,
            PokemonType::Flying,
            PokemonType::Psychic,
            PokemonType::Bug,
            PokemonType::Rock,
            PokemonType::Ghost,
            PokemonType::Dragon,
            PokemonType::Dark,
            PokemonType::Steel,
            PokemonType::Fairy,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            PokemonType::Normal => "Normal",
            PokemonType::Fire => "Fire",
            PokemonType::Water => "Water",
            PokemonType::Electric => "Electric",
            PokemonType::Grass => "Grass",
            PokemonType::Ice => "Ice",
            PokemonType::Fighting => "Fighting",
            PokemonType::Poison => "Poison",
            PokemonType::Ground => "Ground",
            PokemonType::Flying => "Flying",
            PokemonType::Psychic => "Psychic",
            PokemonType::Bug => "Bug",
            PokemonType::Rock => "Rock",
            PokemonType::Ghost => "Ghost",
            PokemonType::Dragon => "Dragon",
            PokemonType::Dark => "Dark",
            PokemonType::Steel => "Steel",
            PokemonType::Fairy => "Fairy",
        }
    }

    /// Position in [`PokemonType::all`].
    pub fn index(self) -> u32 {
        self as u32
    }
}

/// One catalog record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Species {
    pub id: u32,
    pub name: String,
    pub types: Vec<PokemonType>,
}

impl Species {
    pub fn is_starter(&self) -> bool {
        STARTER_IDS.contains(&self.id)
    }
}

/// Errors raised while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog ids must be strictly increasing: {previous} followed by {found}")]
    UnorderedId { previous: u32, found: u32 },
    #[error("species {0} has an empty name")]
    EmptyName(u32),
    #[error("species {0} has no types")]
    NoTypes(u32),
    #[error("species name {0} appears more than once")]
    DuplicateName(String),
}

/// Immutable, id-ordered list of species.
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    species: Vec<Species>,
}

impl Catalog {
    /// Build a catalog, rejecting unordered ids, repeated names and
    /// malformed records. Names key every token and location, so they must
    /// be unique.
    pub fn new(species: Vec<Species>) -> Result<Self, CatalogError> {
        let mut previous: Option<u32> = None;
        let mut names = BTreeSet::new();
        for s in &species {
            if let Some(prev) = previous {
                if s.id <= prev {
                    return Err(CatalogError::UnorderedId {
                        previous: prev,
                        found: s.id,
                    });
                }
            }
            if s.name.trim().is_empty() {
                return Err(CatalogError::EmptyName(s.id));
            }
            if s.types.is_empty() {
                return Err(CatalogError::NoTypes(s.id));
            }
            if !names.insert(s.name.as_str()) {
                return Err(CatalogError::DuplicateName(s.name.clone()));
            }
            previous = Some(s.id);
        }
        Ok(Self { species })
    }

    /// Parse a JSON array of `{id, name, types}` records.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let species: Vec<Species> = serde_json::from_str(json)?;
        Self::new(species)
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&Species> {
        self.species
            .binary_search_by_key(&id, |s| s.id)
            .ok()
            .map(|i| &self.species[i])
    }

    /// Species with `id <= max_id`, in catalog order.
    pub fn active(&self, max_id: u32) -> Vec<&Species> {
        self.species.iter().filter(|s| s.id <= max_id).collect()
    }

    /// Types used by at least one species in `subset`, in table order.
    pub fn types_in(subset: &[&Species]) -> Vec<PokemonType> {
        PokemonType::all()
            .iter()
            .copied()
            .filter(|t| subset.iter().any(|s| s.types.contains(t)))
            .collect()
    }
}
