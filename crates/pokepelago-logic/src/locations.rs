//! Location naming, milestone step sequences and the name → id table.
//!
//! Milestones are never hand-authored: each is a threshold drawn from a
//! fixed step sequence and cut off at the largest count the active species
//! can actually produce. A threshold above that maximum is never emitted.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::{Catalog, PokemonType, Species};
use crate::options::InclusionLimit;

pub const LOCATION_ID_OFFSET: u64 = 8_573_000;
const GLOBAL_MILESTONE_BASE: u64 = 20_000;
const TYPE_MILESTONE_BASE: u64 = 30_000;
const TYPE_MILESTONE_STRIDE: u64 = 1_000;

/// Host-invisible location holding the terminal token.
pub const VICTORY_LOCATION: &str = "Pokedex Complete";

pub fn guess_location_name(species: &str) -> String {
    format!("Guess {species}")
}

/// Event location granting the global guess counter.
pub fn guessed_event_location(species: &str) -> String {
    format!("{species} Guessed")
}

/// Event location granting a per-type guess counter.
pub fn type_guessed_event_location(species: &str, t: PokemonType) -> String {
    format!("{species} {} Guessed", t.name())
}

pub fn global_milestone_name(threshold: u32) -> String {
    format!("Guessed {threshold} Pokemon")
}

pub fn type_milestone_name(threshold: u32, t: PokemonType) -> String {
    format!("Guessed {threshold} {} Pokemon", t.name())
}

/// Fixed global sequence: 1..=10, every 5 to 100, every 10 to 1020.
pub fn global_steps() -> Vec<u32> {
    (1..=10)
        .chain((15..=100).step_by(5))
        .chain((110..=1020).step_by(10))
        .collect()
}

/// Fixed per-type sequence.
pub fn type_steps() -> Vec<u32> {
    (1..=10)
        .chain([12, 15, 18, 20, 25, 30, 35, 40, 45, 50])
        .chain((60..=150).step_by(10))
        .collect()
}

/// Global milestones achievable with `max` guesses, ending with `max` itself.
pub fn global_milestones(max: u32) -> Vec<u32> {
    let mut steps: Vec<u32> = global_steps().into_iter().filter(|&t| t <= max).collect();
    if max > 0 && steps.last() != Some(&max) {
        steps.push(max);
    }
    steps
}

/// Per-type milestones achievable with `max` guesses, as `(step index, threshold)`.
pub fn type_milestones(max: u32) -> Vec<(usize, u32)> {
    type_steps()
        .into_iter()
        .enumerate()
        .filter(|&(_, t)| t <= max)
        .collect()
}

/// Guesses available beyond the starters in `subset`.
pub fn achievable_guesses(subset: &[&Species]) -> u32 {
    subset.iter().filter(|s| !s.is_starter()).count() as u32
}

/// Guesses of type `t` available beyond the starters in `subset`.
pub fn achievable_type_guesses(subset: &[&Species], t: PokemonType) -> u32 {
    subset
        .iter()
        .filter(|s| !s.is_starter() && s.types.contains(&t))
        .count() as u32
}

/// Name → id of every networked location any option set can produce.
#[derive(Debug, Clone, Serialize)]
pub struct LocationTable {
    ids: BTreeMap<String, u64>,
}

impl LocationTable {
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut ids = BTreeMap::new();
        for species in catalog.species() {
            ids.insert(
                guess_location_name(&species.name),
                LOCATION_ID_OFFSET + species.id as u64,
            );
        }

        let limits = [
            InclusionLimit::Gen1,
            InclusionLimit::Gen2,
            InclusionLimit::Gen3,
            InclusionLimit::Gen4,
            InclusionLimit::Gen5,
            InclusionLimit::Gen6,
            InclusionLimit::Gen7,
            InclusionLimit::Gen8,
            InclusionLimit::Gen9,
        ];
        for limit in limits {
            let active = catalog.active(limit.max_id());
            for t in global_milestones(achievable_guesses(&active)) {
                ids.insert(
                    global_milestone_name(t),
                    LOCATION_ID_OFFSET + GLOBAL_MILESTONE_BASE + t as u64,
                );
            }
        }

        let all: Vec<&Species> = catalog.species().iter().collect();
        for &ty in PokemonType::all() {
            for (_, t) in type_milestones(achievable_type_guesses(&all, ty)) {
                ids.insert(
                    type_milestone_name(t, ty),
                    LOCATION_ID_OFFSET
                        + TYPE_MILESTONE_BASE
                        + TYPE_MILESTONE_STRIDE * ty.index() as u64
                        + t as u64,
                );
            }
        }
        Self { ids }
    }

    pub fn id(&self, name: &str) -> Option<u64> {
        self.ids.get(name).copied()
    }

    pub fn name_to_id(&self) -> &BTreeMap<String, u64> {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_sequences_are_strictly_increasing() {
        for steps in [global_steps(), type_steps()] {
            assert!(steps.windows(2).all(|w| w[0] < w[1]));
            assert_eq!(steps[0], 1);
        }
    }

    #[test]
    fn global_milestones_end_at_maximum() {
        let m = global_milestones(148);
        assert_eq!(*m.last().unwrap(), 148);
        assert!(m.contains(&140));
        assert!(m.contains(&50));
        assert!(!m.contains(&150));
        assert!(m.iter().all(|&t| t <= 148));

        // Already on the sequence: no duplicate.
        let m = global_milestones(100);
        assert_eq!(m.iter().filter(|&&t| t == 100).count(), 1);

        assert!(global_milestones(0).is_empty());
    }

    #[test]
    fn type_milestones_never_exceed_maximum() {
        let m = type_milestones(11);
        assert_eq!(
            m.iter().map(|&(_, t)| t).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10]
        );
        assert_eq!(m[9], (9, 10));
        assert!(type_milestones(0).is_empty());
    }

    #[test]
    fn names() {
        assert_eq!(guess_location_name("Mew"), "Guess Mew");
        assert_eq!(global_milestone_name(50), "Guessed 50 Pokemon");
        assert_eq!(
            type_milestone_name(5, PokemonType::Fire),
            "Guessed 5 Fire Pokemon"
        );
        assert_eq!(
            type_guessed_event_location("Charmander", PokemonType::Fire),
            "Charmander Fire Guessed"
        );
    }

    #[test]
    fn table_ids_are_unique() {
        let catalog = Catalog::new(
            (1..=20)
                .map(|id| Species {
                    id,
                    name: format!("Mon{id}"),
                    types: vec![if id % 2 == 0 {
                        PokemonType::Water
                    } else {
                        PokemonType::Fire
                    }],
                })
                .collect(),
        )
        .unwrap();
        let table = LocationTable::from_catalog(&catalog);
        let ids: std::collections::BTreeSet<u64> =
            table.name_to_id().values().copied().collect();
        assert_eq!(ids.len(), table.len());
        assert_eq!(table.id("Guess Mon3"), Some(LOCATION_ID_OFFSET + 3));
        // 20 species minus 3 starters
        assert!(table.id("Guessed 17 Pokemon").is_some());
        assert!(table.id("Guessed 18 Pokemon").is_none());
        assert!(table.id(VICTORY_LOCATION).is_none());
    }
}
