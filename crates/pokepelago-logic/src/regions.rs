//! Graph builder: turns the active species and options into a region graph.
//!
//! Layout:
//!
//! ```text
//! Menu ──▶ Tier 1 ──▶ <Species> Area  (Guess <Species>, <Species> Guessed, ...)
//!   │                 milestones
//!   ├──[Pokemon Guessed ≥ t2]──▶ Tier 2 ──▶ ...
//!   ├── ...
//!   └──▶ Victory  (Pokedex Complete)
//! ```
//!
//! Building is two passes. [`GraphBuilder::allocate`] creates every node
//! and edge; [`GraphBuilder::assign_rules`] then attaches rules and locked
//! event tokens. The victory rule is attached later by [`crate::goal`].

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::catalog::{Catalog, PokemonType, Species};
use crate::graph::{EntranceId, LocationId, RegionId, WorldGraph};
use crate::items::{
    type_guessed_event, type_key_name, unlock_name, Item, PlayerId, GUESSED_EVENT, VICTORY_EVENT,
};
use crate::locations::{
    achievable_guesses, achievable_type_guesses, global_milestone_name, global_milestones,
    guess_location_name, guessed_event_location, type_guessed_event_location,
    type_milestone_name, type_milestones, LocationTable, VICTORY_LOCATION,
};
use crate::options::{OptionCheck, PokepelagoOptions};
use crate::rules::Rule;

pub const MENU_REGION: &str = "Menu";
pub const VICTORY_REGION: &str = "Victory";

/// Consecutive per-type steps that share a tier.
const TYPE_STEPS_PER_TIER: usize = 8;

pub fn tier_region_name(tier: usize) -> String {
    format!("Tier {}", tier + 1)
}

pub fn species_region_name(species: &str) -> String {
    format!("{species} Area")
}

/// Non-fatal build findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BuildWarning {
    /// A milestone sits behind a tier gate higher than its own requirement.
    TierAboveMilestone {
        location: String,
        tier: usize,
        tier_threshold: u32,
        required: u32,
    },
    /// A tier threshold exceeded the guesses available below it.
    TierClamped {
        tier: usize,
        configured: u32,
        clamped: u32,
    },
    /// A milestone had no network id in the location table and was dropped.
    MissingAddress(String),
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildWarning::TierAboveMilestone {
                location,
                tier,
                tier_threshold,
                required,
            } => write!(
                f,
                "{location} requires {required} but {} needs {tier_threshold} to enter",
                tier_region_name(*tier)
            ),
            BuildWarning::TierClamped {
                tier,
                configured,
                clamped,
            } => write!(
                f,
                "{} threshold {configured} is unreachable, clamped to {clamped}",
                tier_region_name(*tier)
            ),
            BuildWarning::MissingAddress(name) => {
                write!(f, "no address for {name}, location omitted")
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildDiagnostics {
    pub warnings: Vec<BuildWarning>,
}

impl BuildDiagnostics {
    fn warn(&mut self, warning: BuildWarning) {
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Tier {
    pub region: RegionId,
    /// `None` for the lowest tier.
    pub entrance: Option<EntranceId>,
    /// Guesses beyond the starters needed to enter.
    pub threshold: u32,
}

/// What a location is for; decides its rule in the second pass.
#[derive(Debug, Clone)]
enum Slot {
    Guess(usize),
    Guessed(usize),
    TypeGuessed(usize, PokemonType),
    GlobalMilestone(u32),
    TypeMilestone(u32, PokemonType),
}

/// Output of the builder.
#[derive(Debug, Clone, Serialize)]
pub struct WorldLayout {
    pub graph: WorldGraph,
    pub tiers: Vec<Tier>,
    /// Species id → tier index.
    pub species_tiers: BTreeMap<u32, usize>,
    /// Guess counters granted up front by the starters.
    pub starter_offset: u32,
    pub type_offsets: BTreeMap<PokemonType, u32>,
    /// Emitted global milestone thresholds, ascending.
    pub milestones: Vec<u32>,
    pub victory_location: LocationId,
    pub diagnostics: BuildDiagnostics,
}

pub struct GraphBuilder<'a> {
    active: &'a [&'a Species],
    options: &'a PokepelagoOptions,
    table: &'a LocationTable,
    player: PlayerId,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(
        active: &'a [&'a Species],
        options: &'a PokepelagoOptions,
        table: &'a LocationTable,
        player: PlayerId,
    ) -> Self {
        Self {
            active,
            options,
            table,
            player,
        }
    }

    pub fn build(&self) -> WorldLayout {
        let (mut layout, slots) = self.allocate();
        self.assign_rules(&mut layout, &slots);
        log::info!(
            "Built graph: {} regions, {} entrances, {} locations ({} fillable)",
            layout.graph.regions().len(),
            layout.graph.entrances().len(),
            layout.graph.locations().len(),
            layout.graph.fillable_count()
        );
        layout
    }

    /// Tier of a species: equal id ranges over the active subset, starters first.
    pub fn species_tier(&self, species: &Species) -> usize {
        let tier_count = self.options.tier_count().max(1);
        if species.is_starter() {
            return 0;
        }
        let (Some(first), Some(last)) = (self.active.first(), self.active.last()) else {
            return 0;
        };
        let span = (last.id - first.id + 1) as u64;
        let offset = species.id.saturating_sub(first.id) as u64;
        ((offset * tier_count as u64 / span) as usize).min(tier_count - 1)
    }

    /// Configured thresholds, clamped to what lower tiers can supply.
    fn effective_thresholds(
        &self,
        species_tiers: &BTreeMap<u32, usize>,
        diagnostics: &mut BuildDiagnostics,
    ) -> Vec<u32> {
        let tier_count = self.options.tier_count().max(1);
        let mut below = vec![0u32; tier_count];
        for species in self.active.iter().filter(|s| !s.is_starter()) {
            let tier = species_tiers[&species.id];
            for slot in below.iter_mut().skip(tier + 1) {
                *slot += 1;
            }
        }

        (0..tier_count)
            .map(|tier| {
                let configured = self.options.tier_thresholds.get(tier).copied().unwrap_or(0);
                if configured > below[tier] {
                    diagnostics.warn(BuildWarning::TierClamped {
                        tier,
                        configured,
                        clamped: below[tier],
                    });
                    below[tier]
                } else {
                    configured
                }
            })
            .collect()
    }

    fn allocate(&self) -> (WorldLayout, Vec<(LocationId, Slot)>) {
        let mut diagnostics = BuildDiagnostics::default();
        let mut graph = WorldGraph::new(MENU_REGION);
        let menu = graph.start();
        let mut slots = Vec::new();

        let species_tiers: BTreeMap<u32, usize> = self
            .active
            .iter()
            .map(|s| (s.id, self.species_tier(s)))
            .collect();
        let thresholds = self.effective_thresholds(&species_tiers, &mut diagnostics);

        let tiers: Vec<Tier> = thresholds
            .iter()
            .enumerate()
            .map(|(k, &threshold)| {
                let name = tier_region_name(k);
                let region = graph.add_region(name.clone());
                let edge = graph.connect(menu, region, format!("{MENU_REGION} -> {name}"));
                Tier {
                    region,
                    entrance: (k > 0).then_some(edge),
                    threshold,
                }
            })
            .collect();

        for (idx, species) in self.active.iter().enumerate() {
            let tier = &tiers[species_tiers[&species.id]];
            let region_name = species_region_name(&species.name);
            let region = graph.add_region(region_name.clone());
            let tier_name = &graph.region(tier.region).name;
            let entrance_name = format!("{tier_name} -> {region_name}");
            graph.connect(tier.region, region, entrance_name);

            let guess_name = guess_location_name(&species.name);
            let address = self.table.id(&guess_name);
            slots.push((
                graph.add_location(region, guess_name, address),
                Slot::Guess(idx),
            ));

            // Starter counters are precollected instead.
            if species.is_starter() {
                continue;
            }
            slots.push((
                graph.add_location(region, guessed_event_location(&species.name), None),
                Slot::Guessed(idx),
            ));
            for &t in &species.types {
                slots.push((
                    graph.add_location(
                        region,
                        type_guessed_event_location(&species.name, t),
                        None,
                    ),
                    Slot::TypeGuessed(idx, t),
                ));
            }
        }

        let milestones = global_milestones(achievable_guesses(self.active));
        for &t in &milestones {
            let tier = thresholds.iter().rposition(|&th| th <= t).unwrap_or(0);
            let name = global_milestone_name(t);
            match self.table.id(&name) {
                Some(address) => slots.push((
                    graph.add_location(tiers[tier].region, name, Some(address)),
                    Slot::GlobalMilestone(t),
                )),
                None => diagnostics.warn(BuildWarning::MissingAddress(name)),
            }
        }

        for ty in Catalog::types_in(self.active) {
            for (step, t) in type_milestones(achievable_type_guesses(self.active, ty)) {
                let tier = (step / TYPE_STEPS_PER_TIER).min(tiers.len() - 1);
                let name = type_milestone_name(t, ty);
                if thresholds[tier] > t {
                    diagnostics.warn(BuildWarning::TierAboveMilestone {
                        location: name.clone(),
                        tier,
                        tier_threshold: thresholds[tier],
                        required: t,
                    });
                }
                match self.table.id(&name) {
                    Some(address) => slots.push((
                        graph.add_location(tiers[tier].region, name, Some(address)),
                        Slot::TypeMilestone(t, ty),
                    )),
                    None => diagnostics.warn(BuildWarning::MissingAddress(name)),
                }
            }
        }

        let victory = graph.add_region(VICTORY_REGION);
        graph.connect(menu, victory, format!("{MENU_REGION} -> {VICTORY_REGION}"));
        let victory_location = graph.add_location(victory, VICTORY_LOCATION, None);

        let starters: Vec<&&Species> = self.active.iter().filter(|s| s.is_starter()).collect();
        let type_offsets = Catalog::types_in(self.active)
            .into_iter()
            .map(|t| {
                let n = starters.iter().filter(|s| s.types.contains(&t)).count() as u32;
                (t, n)
            })
            .collect();

        let layout = WorldLayout {
            graph,
            tiers,
            species_tiers,
            starter_offset: starters.len() as u32,
            type_offsets,
            milestones,
            victory_location,
            diagnostics,
        };
        (layout, slots)
    }

    /// Guess rule before option folding: the unlock, plus type keys unless
    /// type locks are off.
    pub fn guess_rule(species: &Species) -> Rule {
        Rule::And(vec![
            Rule::has(unlock_name(&species.name), 1),
            Rule::Or(vec![
                Rule::has_all(species.types.iter().map(|&t| type_key_name(t))),
                Rule::OptionFilter(OptionCheck::TypeLocks(false)),
            ]),
        ])
    }

    fn assign_rules(&self, layout: &mut WorldLayout, slots: &[(LocationId, Slot)]) {
        for tier in &layout.tiers {
            if let Some(entrance) = tier.entrance {
                layout.graph.set_entrance_rule(
                    entrance,
                    Rule::has(GUESSED_EVENT, tier.threshold + layout.starter_offset),
                );
            }
        }

        for (location, slot) in slots {
            let location = *location;
            match slot {
                Slot::Guess(idx) => {
                    let rule = Self::guess_rule(self.active[*idx]).specialize(self.options);
                    layout.graph.set_location_rule(location, rule);
                }
                Slot::Guessed(idx) => {
                    let rule = Self::guess_rule(self.active[*idx]).specialize(self.options);
                    layout.graph.set_location_rule(location, rule);
                    layout
                        .graph
                        .place_locked(location, Item::event(GUESSED_EVENT, self.player));
                }
                Slot::TypeGuessed(idx, t) => {
                    let rule = Self::guess_rule(self.active[*idx]).specialize(self.options);
                    layout.graph.set_location_rule(location, rule);
                    layout
                        .graph
                        .place_locked(location, Item::event(type_guessed_event(*t), self.player));
                }
                Slot::GlobalMilestone(t) => {
                    layout.graph.set_location_rule(
                        location,
                        Rule::has(GUESSED_EVENT, t + layout.starter_offset),
                    );
                }
                Slot::TypeMilestone(t, ty) => {
                    let offset = layout.type_offsets.get(ty).copied().unwrap_or(0);
                    layout
                        .graph
                        .set_location_rule(location, Rule::has(type_guessed_event(*ty), t + offset));
                }
            }
        }

        layout
            .graph
            .place_locked(layout.victory_location, Item::event(VICTORY_EVENT, self.player));
    }
}
