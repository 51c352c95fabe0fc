//! Item pool balancer.
//!
//! Decides what the player starts with, what goes into the shared pool,
//! and how many filler tokens are needed so the player's contribution
//! matches their fillable locations exactly. The shared pool may already
//! hold other players' items, so the contribution is counted on its own.

use rand::Rng;
use serde::Serialize;
use thiserror::Error;

use crate::catalog::{Catalog, PokemonType, Species};
use crate::items::{
    type_guessed_event, type_key_name, unlock_name, Item, ItemClassification, ItemTable, PlayerId,
    GUESSED_EVENT,
};
use crate::options::PokepelagoOptions;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("{items} required items exceed {locations} fillable locations")]
    Overflow { items: usize, locations: usize },
    #[error("pool holds {items} items for {locations} fillable locations")]
    Mismatch { items: usize, locations: usize },
    #[error("unknown item {0}")]
    UnknownItem(String),
    #[error("filler needed but no useful items configured")]
    NoFiller,
}

/// What one player added to the pool.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PoolSummary {
    /// Granted before any sweep: starter unlocks, keys and counters.
    pub precollected: Vec<Item>,
    /// Items this player appended to the shared pool.
    pub contributed: usize,
    pub progression: usize,
    pub useful: usize,
    pub traps: usize,
}

pub struct PoolBalancer<'a> {
    active: &'a [&'a Species],
    options: &'a PokepelagoOptions,
    items: &'a ItemTable,
    player: PlayerId,
}

impl<'a> PoolBalancer<'a> {
    pub fn new(
        active: &'a [&'a Species],
        options: &'a PokepelagoOptions,
        items: &'a ItemTable,
        player: PlayerId,
    ) -> Self {
        Self {
            active,
            options,
            items,
            player,
        }
    }

    fn create(&self, name: &str) -> Result<Item, PoolError> {
        self.items
            .create(name, self.player)
            .ok_or_else(|| PoolError::UnknownItem(name.to_string()))
    }

    fn starters(&self) -> impl Iterator<Item = &'a Species> + 'a {
        self.active.iter().copied().filter(|s| s.is_starter())
    }

    /// Types whose keys the starters hand out.
    fn starter_types(&self) -> Vec<PokemonType> {
        PokemonType::all()
            .iter()
            .copied()
            .filter(|t| self.starters().any(|s| s.types.contains(t)))
            .collect()
    }

    /// Starter unlocks, their type keys (with type locks) and their counters.
    pub fn precollected(&self) -> Result<Vec<Item>, PoolError> {
        let mut items = Vec::new();
        for starter in self.starters() {
            items.push(self.create(&unlock_name(&starter.name))?);
        }
        if self.options.type_locks {
            for t in self.starter_types() {
                items.push(self.create(&type_key_name(t))?);
            }
        }
        for starter in self.starters() {
            items.push(Item::event(GUESSED_EVENT, self.player));
            for &t in &starter.types {
                items.push(Item::event(type_guessed_event(t), self.player));
            }
        }
        Ok(items)
    }

    /// Every unlock and type key not already precollected.
    pub fn progression_items(&self) -> Result<Vec<Item>, PoolError> {
        let mut items = Vec::new();
        for species in self.active.iter().filter(|s| !s.is_starter()) {
            items.push(self.create(&unlock_name(&species.name))?);
        }
        if self.options.type_locks {
            let starter_types = self.starter_types();
            for t in Catalog::types_in(self.active) {
                if !starter_types.contains(&t) {
                    items.push(self.create(&type_key_name(t))?);
                }
            }
        }
        Ok(items)
    }

    /// Pick `count` filler tokens: traps with `trap_chance` percent,
    /// otherwise the next useful token in round-robin order.
    pub fn filler<R: Rng>(&self, count: usize, rng: &mut R) -> Result<Vec<Item>, PoolError> {
        let useful = &self.options.useful_items;
        let traps = &self.options.trap_items;
        let mut cycle = 0usize;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            let roll: u32 = rng.gen_range(1..=100);
            let name = if roll <= self.options.trap_chance && !traps.is_empty() {
                &traps[rng.gen_range(0..traps.len())]
            } else {
                let name = useful
                    .get(cycle % useful.len().max(1))
                    .ok_or(PoolError::NoFiller)?;
                cycle += 1;
                name
            };
            items.push(self.create(name)?);
        }
        Ok(items)
    }

    /// Append this player's pool to `shared_pool`, sized to `fillable`.
    ///
    /// Nothing is appended on error.
    pub fn balance<R: Rng>(
        &self,
        fillable: usize,
        rng: &mut R,
        shared_pool: &mut Vec<Item>,
    ) -> Result<PoolSummary, PoolError> {
        let precollected = self.precollected()?;
        let mut pool = self.progression_items()?;
        let progression = pool.len();
        if progression > fillable {
            return Err(PoolError::Overflow {
                items: progression,
                locations: fillable,
            });
        }

        let filler = self.filler(fillable - progression, rng)?;
        let traps = filler
            .iter()
            .filter(|i| i.classification == ItemClassification::Trap)
            .count();
        pool.extend(filler);

        if pool.len() != fillable {
            return Err(PoolError::Mismatch {
                items: pool.len(),
                locations: fillable,
            });
        }

        log::info!(
            "Player {}: {} precollected, {} pool items ({} progression, {} traps)",
            self.player,
            precollected.len(),
            pool.len(),
            progression,
            traps
        );

        let contributed = pool.len();
        shared_pool.extend(pool);
        Ok(PoolSummary {
            precollected,
            contributed,
            progression,
            useful: contributed - progression - traps,
            traps,
        })
    }
}
