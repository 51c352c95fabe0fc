//! Arena of regions, entrances and locations.
//!
//! Nodes reference each other by integer handles into flat vectors, never
//! by pointers. Construction happens in two passes: all nodes are
//! allocated first, then rules and locked tokens are attached. After the
//! rule pass the graph is only read.

use std::collections::HashMap;

use serde::Serialize;

use crate::items::Item;
use crate::rules::Rule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RegionId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntranceId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LocationId(pub usize);

#[derive(Debug, Clone, Serialize)]
pub struct Region {
    pub name: String,
    pub locations: Vec<LocationId>,
    pub exits: Vec<EntranceId>,
}

/// Directed, optionally gated edge.
#[derive(Debug, Clone, Serialize)]
pub struct Entrance {
    pub name: String,
    pub source: RegionId,
    pub target: RegionId,
    /// `None` is always traversable.
    pub rule: Option<Rule>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Location {
    pub name: String,
    /// Network id; `None` marks a host-invisible event location.
    pub address: Option<u64>,
    pub region: RegionId,
    pub rule: Option<Rule>,
    /// Token placed at build time (events and victory).
    pub locked: Option<Item>,
}

impl Location {
    /// Whether the host's fill step must put a pool item here.
    pub fn is_fillable(&self) -> bool {
        self.address.is_some() && self.locked.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorldGraph {
    regions: Vec<Region>,
    entrances: Vec<Entrance>,
    locations: Vec<Location>,
    start: RegionId,
    #[serde(skip)]
    region_index: HashMap<String, RegionId>,
    #[serde(skip)]
    location_index: HashMap<String, LocationId>,
}

impl WorldGraph {
    /// A graph containing only the start region.
    pub fn new(start_region: impl Into<String>) -> Self {
        let mut graph = Self {
            regions: Vec::new(),
            entrances: Vec::new(),
            locations: Vec::new(),
            start: RegionId(0),
            region_index: HashMap::new(),
            location_index: HashMap::new(),
        };
        graph.start = graph.add_region(start_region);
        graph
    }

    pub fn add_region(&mut self, name: impl Into<String>) -> RegionId {
        let name = name.into();
        let id = RegionId(self.regions.len());
        self.region_index.insert(name.clone(), id);
        self.regions.push(Region {
            name,
            locations: Vec::new(),
            exits: Vec::new(),
        });
        id
    }

    /// Connect `source` to `target` with an ungated entrance.
    pub fn connect(
        &mut self,
        source: RegionId,
        target: RegionId,
        name: impl Into<String>,
    ) -> EntranceId {
        let id = EntranceId(self.entrances.len());
        self.entrances.push(Entrance {
            name: name.into(),
            source,
            target,
            rule: None,
        });
        self.regions[source.0].exits.push(id);
        id
    }

    /// Allocate a location with no rule and no locked token.
    pub fn add_location(
        &mut self,
        region: RegionId,
        name: impl Into<String>,
        address: Option<u64>,
    ) -> LocationId {
        let name = name.into();
        let id = LocationId(self.locations.len());
        self.location_index.insert(name.clone(), id);
        self.locations.push(Location {
            name,
            address,
            region,
            rule: None,
            locked: None,
        });
        self.regions[region.0].locations.push(id);
        id
    }

    pub fn set_entrance_rule(&mut self, entrance: EntranceId, rule: Rule) {
        self.entrances[entrance.0].rule = Some(rule);
    }

    pub fn set_location_rule(&mut self, location: LocationId, rule: Rule) {
        self.locations[location.0].rule = Some(rule);
    }

    pub fn place_locked(&mut self, location: LocationId, item: Item) {
        self.locations[location.0].locked = Some(item);
    }

    pub fn start(&self) -> RegionId {
        self.start
    }

    pub fn region(&self, id: RegionId) -> &Region {
        &self.regions[id.0]
    }

    pub fn entrance(&self, id: EntranceId) -> &Entrance {
        &self.entrances[id.0]
    }

    pub fn location(&self, id: LocationId) -> &Location {
        &self.locations[id.0]
    }

    pub fn region_id(&self, name: &str) -> Option<RegionId> {
        self.region_index.get(name).copied()
    }

    pub fn location_id(&self, name: &str) -> Option<LocationId> {
        self.location_index.get(name).copied()
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn entrances(&self) -> &[Entrance] {
        &self.entrances
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn fillable_locations(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter().filter(|l| l.is_fillable())
    }

    pub fn fillable_count(&self) -> usize {
        self.fillable_locations().count()
    }

    /// Bytes of the graph's serialized form, for determinism checks.
    pub fn fingerprint(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_wires_back_references() {
        let mut graph = WorldGraph::new("Menu");
        let tier = graph.add_region("Tier 1");
        let e = graph.connect(graph.start(), tier, "Menu -> Tier 1");
        let loc = graph.add_location(tier, "Guess Mew", Some(8573151));

        assert_eq!(graph.region(graph.start()).exits, vec![e]);
        assert_eq!(graph.entrance(e).target, tier);
        assert_eq!(graph.region(tier).locations, vec![loc]);
        assert_eq!(graph.location(loc).region, tier);
        assert_eq!(graph.region_id("Tier 1"), Some(tier));
        assert_eq!(graph.location_id("Guess Mew"), Some(loc));
    }

    #[test]
    fn event_and_locked_locations_are_not_fillable() {
        let mut graph = WorldGraph::new("Menu");
        let start = graph.start();
        graph.add_location(start, "Guess Mew", Some(1));
        let event = graph.add_location(start, "Mew Guessed", None);
        graph.place_locked(event, Item::event("Pokemon Guessed", 1));
        assert_eq!(graph.fillable_count(), 1);
    }

    #[test]
    fn rules_attach_after_allocation() {
        let mut graph = WorldGraph::new("Menu");
        let start = graph.start();
        let loc = graph.add_location(start, "Guess Mew", Some(1));
        assert!(graph.location(loc).rule.is_none());
        graph.set_location_rule(loc, Rule::has("Mew Unlock", 1));
        assert_eq!(graph.location(loc).rule, Some(Rule::has("Mew Unlock", 1)));
    }
}
