//! Reachability sweep: a monotone fixed point over the region graph.
//!
//! Starting from the start region, every outgoing entrance and every
//! location of a newly reached region is tested once. A rule that fails is
//! parked under each token it depends on. Whenever an event location pays
//! out, only the rules parked under that token are retried, which is how
//! an entrance gated on a counter produced by a sibling branch eventually
//! opens within the same sweep.
//!
//! Regions and locations only ever move from unknown to reachable, and the
//! state only grows, so the sweep terminates once both work queues drain.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use crate::graph::{EntranceId, LocationId, RegionId, WorldGraph};
use crate::rules::{Rule, RuleContext};
use crate::state::CollectionState;

/// Result of one sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reachability {
    regions: Vec<bool>,
    locations: Vec<bool>,
    /// Event locations that paid out during this sweep, in order.
    pub collected_events: Vec<String>,
    /// Number of rule evaluations performed.
    pub evaluations: usize,
}

impl Reachability {
    pub fn region_reachable(&self, region: RegionId) -> bool {
        self.regions.get(region.0).copied().unwrap_or(false)
    }

    /// Whether the location's region is reachable and its rule holds.
    pub fn location_accessible(&self, location: LocationId) -> bool {
        self.locations.get(location.0).copied().unwrap_or(false)
    }

    pub fn can_reach_location(&self, graph: &WorldGraph, name: &str) -> bool {
        graph
            .location_id(name)
            .is_some_and(|id| self.location_accessible(id))
    }

    pub fn can_reach_region(&self, graph: &WorldGraph, name: &str) -> bool {
        graph
            .region_id(name)
            .is_some_and(|id| self.region_reachable(id))
    }

    pub fn reachable_regions(&self) -> BTreeSet<RegionId> {
        self.regions
            .iter()
            .enumerate()
            .filter(|(_, &r)| r)
            .map(|(i, _)| RegionId(i))
            .collect()
    }

    pub fn accessible_locations(&self) -> BTreeSet<LocationId> {
        self.locations
            .iter()
            .enumerate()
            .filter(|(_, &l)| l)
            .map(|(i, _)| LocationId(i))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Waiter {
    Entrance(EntranceId),
    Location(LocationId),
}

struct Sweep<'a> {
    graph: &'a WorldGraph,
    ctx: &'a RuleContext<'a>,
    regions: Vec<bool>,
    locations: Vec<bool>,
    /// Token name → rules that failed and read it.
    waiting: HashMap<String, Vec<Waiter>>,
    parked: HashSet<Waiter>,
    region_queue: VecDeque<RegionId>,
    changed: VecDeque<String>,
    collected_events: Vec<String>,
    evaluations: usize,
}

/// Expand `state` to its fixed point over `graph`, banking event tokens.
///
/// `state` may already hold precollected and received tokens; nothing is
/// assumed about it being empty.
pub fn sweep(graph: &WorldGraph, state: &mut CollectionState, ctx: &RuleContext) -> Reachability {
    let mut sweep = Sweep {
        graph,
        ctx,
        regions: vec![false; graph.regions().len()],
        locations: vec![false; graph.locations().len()],
        waiting: HashMap::new(),
        parked: HashSet::new(),
        region_queue: VecDeque::new(),
        changed: VecDeque::new(),
        collected_events: Vec::new(),
        evaluations: 0,
    };
    sweep.reach(graph.start());

    loop {
        if let Some(region) = sweep.region_queue.pop_front() {
            sweep.expand(region, state);
        } else if let Some(token) = sweep.changed.pop_front() {
            sweep.wake(&token, state);
        } else {
            break;
        }
    }

    log::debug!(
        "Sweep done: {} regions, {} locations, {} events, {} evaluations",
        sweep.regions.iter().filter(|&&r| r).count(),
        sweep.locations.iter().filter(|&&l| l).count(),
        sweep.collected_events.len(),
        sweep.evaluations
    );

    Reachability {
        regions: sweep.regions,
        locations: sweep.locations,
        collected_events: sweep.collected_events,
        evaluations: sweep.evaluations,
    }
}

impl Sweep<'_> {
    fn reach(&mut self, region: RegionId) {
        if !self.regions[region.0] {
            self.regions[region.0] = true;
            self.region_queue.push_back(region);
        }
    }

    fn passes(&mut self, rule: Option<&Rule>, state: &CollectionState) -> bool {
        match rule {
            None => true,
            Some(rule) => {
                self.evaluations += 1;
                rule.evaluate(state, self.ctx)
            }
        }
    }

    fn expand(&mut self, region: RegionId, state: &mut CollectionState) {
        let graph = self.graph;
        for &exit in &graph.region(region).exits {
            let waiter = Waiter::Entrance(exit);
            if !self.retry(waiter, state) {
                self.park(waiter);
            }
        }
        for &location in &graph.region(region).locations {
            let waiter = Waiter::Location(location);
            if !self.retry(waiter, state) {
                self.park(waiter);
            }
        }
    }

    /// Test a waiter once. `true` once it no longer needs retrying.
    fn retry(&mut self, waiter: Waiter, state: &mut CollectionState) -> bool {
        let graph = self.graph;
        match waiter {
            Waiter::Entrance(id) => {
                let entrance = graph.entrance(id);
                if self.regions[entrance.target.0] {
                    return true;
                }
                if self.passes(entrance.rule.as_ref(), state) {
                    self.reach(entrance.target);
                    return true;
                }
                false
            }
            Waiter::Location(id) => {
                if self.locations[id.0] {
                    return true;
                }
                let location = graph.location(id);
                if !self.passes(location.rule.as_ref(), state) {
                    return false;
                }
                self.locations[id.0] = true;
                if let Some(item) = &location.locked {
                    if state.mark_event_collected(&location.name) {
                        state.collect(&item.name);
                        self.changed.push_back(item.name.clone());
                        self.collected_events.push(location.name.clone());
                    }
                }
                true
            }
        }
    }

    fn park(&mut self, waiter: Waiter) {
        if !self.parked.insert(waiter) {
            return;
        }
        let graph = self.graph;
        let rule = match waiter {
            Waiter::Entrance(id) => graph.entrance(id).rule.as_ref(),
            Waiter::Location(id) => graph.location(id).rule.as_ref(),
        };
        // A rule without dependencies cannot change its outcome.
        if let Some(rule) = rule {
            for token in rule.dependencies(self.ctx.groups) {
                self.waiting.entry(token).or_default().push(waiter);
            }
        }
    }

    fn wake(&mut self, token: &str, state: &mut CollectionState) {
        let Some(waiters) = self.waiting.remove(token) else {
            return;
        };
        let mut still_waiting = Vec::new();
        for waiter in waiters {
            if !self.retry(waiter, state) {
                still_waiting.push(waiter);
            }
        }
        if !still_waiting.is_empty() {
            self.waiting.insert(token.to_string(), still_waiting);
        }
    }
}
