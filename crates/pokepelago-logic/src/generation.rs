//! End-to-end world generation for one player.
//!
//! Pipeline: validate options → select active species → build graph →
//! resolve goal → balance pool → emit slot data. One seeded RNG is
//! created per call and consumed only by the pool balancer, so equal
//! seeds and options give byte-identical graphs and pools.
//!
//! ```
//! use pokepelago_logic::catalog::{Catalog, PokemonType, Species};
//! use pokepelago_logic::generation::generate;
//! use pokepelago_logic::options::PokepelagoOptions;
//!
//! let catalog = Catalog::new(
//!     (1..=30)
//!         .map(|id| Species { id, name: format!("Mon{id}"), types: vec![PokemonType::Normal] })
//!         .collect(),
//! )
//! .unwrap();
//! let mut shared_pool = Vec::new();
//! let world = generate(&catalog, &PokepelagoOptions::default(), 7, 1, &mut shared_pool).unwrap();
//!
//! let mut state = world.initial_state();
//! world.sweep(&mut state);
//! assert!(!world.is_complete(&state));
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{Catalog, Species};
use crate::goal::{attach_victory, resolve_goal, Goal};
use crate::items::{Item, ItemGroups, ItemTable, PlayerId, VICTORY_EVENT};
use crate::locations::LocationTable;
use crate::options::{validate_options, OptionsError, PokepelagoOptions};
use crate::pool::{PoolBalancer, PoolError, PoolSummary};
use crate::regions::{GraphBuilder, WorldLayout};
use crate::rules::{Rule, RuleContext};
use crate::state::CollectionState;
use crate::sweep::{sweep, Reachability};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid options: {}", join_errors(.0))]
    InvalidOptions(Vec<OptionsError>),
    #[error("no species with id <= {0}")]
    NoActiveSpecies(u32),
    #[error("no achievable milestone to set the goal on")]
    NoMilestones,
    #[error(transparent)]
    Pool(#[from] PoolError),
}

fn join_errors(errors: &[OptionsError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Summary handed to the client out-of-band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotData {
    pub inclusion_limit: u32,
    pub type_locks: bool,
    pub goal: u32,
    pub victory_count: u32,
    pub starter_offset: u32,
}

/// Everything one player's generation produced.
#[derive(Debug, Clone)]
pub struct GeneratedWorld {
    pub player: PlayerId,
    pub seed: u64,
    pub options: PokepelagoOptions,
    pub layout: WorldLayout,
    pub goal: Goal,
    pub pool: PoolSummary,
    /// Copy of the items this player appended to the shared pool.
    pub items: Vec<Item>,
    pub item_table: ItemTable,
    pub location_table: LocationTable,
    pub groups: ItemGroups,
}

impl GeneratedWorld {
    pub fn rule_context(&self) -> RuleContext<'_> {
        RuleContext {
            options: &self.options,
            groups: &self.groups,
        }
    }

    /// State holding only the precollected items.
    pub fn initial_state(&self) -> CollectionState {
        CollectionState::with_items(&self.pool.precollected)
    }

    pub fn sweep(&self, state: &mut CollectionState) -> Reachability {
        sweep(&self.layout.graph, state, &self.rule_context())
    }

    /// Whether `state` holds the terminal token.
    pub fn is_complete(&self, state: &CollectionState) -> bool {
        state.has(VICTORY_EVENT, 1)
    }

    pub fn location_rule(&self, name: &str) -> Option<&Rule> {
        let id = self.layout.graph.location_id(name)?;
        self.layout.graph.location(id).rule.as_ref()
    }

    /// Evaluate a location's own rule against `state`, ignoring regions.
    pub fn location_rule_holds(&self, name: &str, state: &CollectionState) -> bool {
        self.location_rule(name)
            .map_or(true, |rule| rule.evaluate(state, &self.rule_context()))
    }

    pub fn slot_data(&self) -> SlotData {
        SlotData {
            inclusion_limit: self.options.inclusion_limit.max_id(),
            type_locks: self.options.type_locks,
            goal: self.goal.threshold,
            victory_count: self.goal.victory_count,
            starter_offset: self.layout.starter_offset,
        }
    }

    pub fn slot_data_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.slot_data())
    }

    /// Serialized graph, pool and precollected items.
    pub fn fingerprint(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(&(&self.layout.graph, &self.items, &self.pool.precollected))
    }
}

/// Generate one player's world, appending their pool to `shared_pool`.
pub fn generate(
    catalog: &Catalog,
    options: &PokepelagoOptions,
    seed: u64,
    player: PlayerId,
    shared_pool: &mut Vec<Item>,
) -> Result<GeneratedWorld, GenerationError> {
    let errors = validate_options(options);
    if !errors.is_empty() {
        return Err(GenerationError::InvalidOptions(errors));
    }

    let max_id = options.inclusion_limit.max_id();
    let active: Vec<&Species> = catalog.active(max_id);
    if active.is_empty() {
        return Err(GenerationError::NoActiveSpecies(max_id));
    }
    log::info!(
        "Generating player {} (seed {}): {} active species, type locks {}",
        player,
        seed,
        active.len(),
        if options.type_locks { "on" } else { "off" }
    );

    let item_table = ItemTable::from_catalog(catalog);
    let location_table = LocationTable::from_catalog(catalog);
    let groups = ItemGroups::from_catalog(catalog);

    let mut layout = GraphBuilder::new(&active, options, &location_table, player).build();

    let goal = resolve_goal(
        options,
        active.len() as u32,
        &layout.milestones,
        layout.starter_offset,
    )
    .ok_or(GenerationError::NoMilestones)?;
    attach_victory(&mut layout, &goal);
    log::info!(
        "Goal: {} guesses (raw {}), victory at {} counters",
        goal.threshold,
        goal.raw,
        goal.victory_count
    );

    let mut rng = StdRng::seed_from_u64(seed);
    let balancer = PoolBalancer::new(&active, options, &item_table, player);
    let mut own_pool = Vec::new();
    let pool = balancer.balance(layout.graph.fillable_count(), &mut rng, &mut own_pool)?;
    shared_pool.extend(own_pool.iter().cloned());

    Ok(GeneratedWorld {
        player,
        seed,
        options: options.clone(),
        layout,
        goal,
        pool,
        items: own_pool,
        item_table,
        location_table,
        groups,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PokemonType;
    use crate::options::GoalMode;

    fn catalog(n: u32) -> Catalog {
        Catalog::new(
            (1..=n)
                .map(|id| Species {
                    id,
                    name: format!("Mon{id}"),
                    types: vec![PokemonType::Normal],
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn invalid_options_abort() {
        let options = PokepelagoOptions {
            goal_percentage: 0,
            ..PokepelagoOptions::default()
        };
        let err = generate(&catalog(30), &options, 1, 1, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidOptions(_)));
        assert_eq!(
            err.to_string(),
            "invalid options: goal percentage 0 is outside 1-100"
        );
    }

    #[test]
    fn empty_subset_aborts() {
        let catalog = Catalog::new(vec![Species {
            id: 200,
            name: "Late".to_string(),
            types: vec![PokemonType::Normal],
        }])
        .unwrap();
        let err = generate(&catalog, &PokepelagoOptions::default(), 1, 1, &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, GenerationError::NoActiveSpecies(151)));
    }

    #[test]
    fn starters_only_has_no_goal() {
        let catalog = Catalog::new(
            [1, 4, 7]
                .into_iter()
                .map(|id| Species {
                    id,
                    name: format!("Mon{id}"),
                    types: vec![PokemonType::Normal],
                })
                .collect(),
        )
        .unwrap();
        let err = generate(&catalog, &PokepelagoOptions::default(), 1, 1, &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, GenerationError::NoMilestones));
    }

    #[test]
    fn shared_pool_receives_exactly_the_contribution() {
        let mut shared = vec![Item::event("Other Player Item", 9)];
        let world = generate(&catalog(30), &PokepelagoOptions::default(), 5, 1, &mut shared)
            .unwrap();
        assert_eq!(shared.len(), 1 + world.pool.contributed);
        assert_eq!(world.items.len(), world.layout.graph.fillable_count());
    }

    #[test]
    fn slot_data_reports_resolved_goal() {
        let options = PokepelagoOptions {
            goal_mode: GoalMode::Count,
            goal_count: 10,
            type_locks: true,
            ..PokepelagoOptions::default()
        };
        let world = generate(&catalog(30), &options, 5, 1, &mut Vec::new()).unwrap();
        let slot = world.slot_data();
        assert_eq!(
            slot,
            SlotData {
                inclusion_limit: 151,
                type_locks: true,
                goal: 10,
                victory_count: 13,
                starter_offset: 3,
            }
        );
        let json = world.slot_data_json().unwrap();
        let back: SlotData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, slot);
    }

    #[test]
    fn sweeping_all_items_completes_the_goal() {
        let world = generate(&catalog(30), &PokepelagoOptions::default(), 5, 1, &mut Vec::new())
            .unwrap();
        let mut state = world.initial_state();
        for item in &world.items {
            state.collect(&item.name);
        }
        world.sweep(&mut state);
        assert!(world.is_complete(&state));
    }
}
