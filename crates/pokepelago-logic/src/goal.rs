//! Goal resolution: option value → reachable guess threshold.
//!
//! The raw goal is snapped onto the emitted milestone list, which never
//! extends past the achievable maximum, so the victory rule can always be
//! satisfied.

use serde::Serialize;

use crate::items::GUESSED_EVENT;
use crate::options::{GoalMode, PokepelagoOptions};
use crate::regions::WorldLayout;
use crate::rules::Rule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Goal {
    /// Goal before snapping.
    pub raw: u32,
    /// Guesses beyond the starters needed to win.
    pub threshold: u32,
    /// Counter value the victory rule requires (`threshold` + starters).
    pub victory_count: u32,
}

/// Goal as configured, before snapping.
pub fn raw_goal(options: &PokepelagoOptions, active_count: u32) -> u32 {
    match options.goal_mode {
        GoalMode::Percentage => {
            let scaled = active_count as u64 * options.goal_percentage as u64;
            (scaled.div_ceil(100) as u32).max(1)
        }
        GoalMode::Count => options.goal_count.min(active_count),
    }
}

/// Nearest milestone to `raw`; ties go to the lower one.
///
/// `milestones` must be ascending. Returns `None` when it is empty.
pub fn snap_to_milestone(raw: u32, milestones: &[u32]) -> Option<u32> {
    milestones
        .iter()
        .copied()
        .min_by_key(|&m| (m.abs_diff(raw), m))
}

pub fn resolve_goal(
    options: &PokepelagoOptions,
    active_count: u32,
    milestones: &[u32],
    starter_offset: u32,
) -> Option<Goal> {
    let raw = raw_goal(options, active_count);
    let threshold = snap_to_milestone(raw, milestones)?;
    Some(Goal {
        raw,
        threshold,
        victory_count: threshold + starter_offset,
    })
}

/// Attach the victory rule to the layout's victory location.
pub fn attach_victory(layout: &mut WorldLayout, goal: &Goal) {
    layout.graph.set_location_rule(
        layout.victory_location,
        Rule::has(GUESSED_EVENT, goal.victory_count),
    );
}
