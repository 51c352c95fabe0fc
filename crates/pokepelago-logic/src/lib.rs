//! World generation and progression logic for Pokepelago.
//!
//! Pokepelago is a guessing game plugged into a multi-world randomizer:
//! each Pokémon needs an unlock token (and, with type locks, its type
//! keys) before the player may guess it, and every guess is a check that
//! may hold another player's item. This crate is engine-free: it builds
//! the region graph, the item pool and the victory condition from plain
//! data, and answers reachability queries over a collection state.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`catalog`] | Species records, types, starters, active subsets |
//! | [`options`] | Player options and their validation |
//! | [`items`] | Item names, network ids, classifications, item groups |
//! | [`locations`] | Location names, network ids, milestone sequences |
//! | [`state`] | Multiset of collected tokens |
//! | [`rules`] | Access rule algebra, evaluation and option folding |
//! | [`graph`] | Region/entrance/location arena with integer handles |
//! | [`regions`] | Two-pass graph builder (tiers, species areas, milestones) |
//! | [`sweep`] | Dependency-driven reachability sweep |
//! | [`pool`] | Item pool balancing, precollected items, filler |
//! | [`goal`] | Goal resolution and milestone snapping |
//! | [`generation`] | End-to-end pipeline and slot data |

pub mod catalog;
pub mod generation;
pub mod goal;
pub mod graph;
pub mod items;
pub mod locations;
pub mod options;
pub mod pool;
pub mod regions;
pub mod rules;
pub mod state;
pub mod sweep;
