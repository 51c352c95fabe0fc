//! Player options, resolved before any graph is built.
//!
//! Options arrive already parsed (typically from a JSON or YAML file on the
//! host side). This module owns the defaults, the validation rules, and
//! the [`OptionCheck`] values that [`crate::rules::Rule::OptionFilter`]
//! compares against.
//!
//! ```
//! use pokepelago_logic::options::{validate_options, PokepelagoOptions};
//!
//! let options = PokepelagoOptions::default();
//! assert!(validate_options(&options).is_empty());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::items::{TRAP_ITEMS, USEFUL_ITEMS};

/// Highest species id included in a seed, by generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InclusionLimit {
    #[default]
    Gen1,
    Gen2,
    Gen3,
    Gen4,
    Gen5,
    Gen6,
    Gen7,
    Gen8,
    Gen9,
}

impl InclusionLimit {
    pub fn max_id(self) -> u32 {
        match self {
            InclusionLimit::Gen1 => 151,
            InclusionLimit::Gen2 => 251,
            InclusionLimit::Gen3 => 386,
            InclusionLimit::Gen4 => 493,
            InclusionLimit::Gen5 => 649,
            InclusionLimit::Gen6 => 721,
            InclusionLimit::Gen7 => 809,
            InclusionLimit::Gen8 => 905,
            InclusionLimit::Gen9 => 1025,
        }
    }
}

/// How the goal option is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GoalMode {
    #[default]
    Percentage,
    Count,
}

/// Resolved per-player options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PokepelagoOptions {
    pub inclusion_limit: InclusionLimit,
    /// Guessing a species also requires a key for each of its types.
    pub type_locks: bool,
    pub goal_mode: GoalMode,
    /// Percentage of active species to guess (1–100).
    pub goal_percentage: u32,
    /// Absolute number of species to guess (1–1025).
    pub goal_count: u32,
    /// Chance in percent that a filler slot holds a trap (0–100).
    pub trap_chance: u32,
    /// Useful tokens cycled through for non-trap filler.
    pub useful_items: Vec<String>,
    /// Trap tokens drawn uniformly for trap filler.
    pub trap_items: Vec<String>,
    /// Extra guesses (beyond the starters) needed to enter each tier.
    pub tier_thresholds: Vec<u32>,
}

impl Default for PokepelagoOptions {
    fn default() -> Self {
        Self {
            inclusion_limit: InclusionLimit::Gen1,
            type_locks: false,
            goal_mode: GoalMode::Percentage,
            goal_percentage: 100,
            goal_count: 151,
            trap_chance: 0,
            useful_items: USEFUL_ITEMS.iter().map(|s| s.to_string()).collect(),
            trap_items: TRAP_ITEMS.iter().map(|s| s.to_string()).collect(),
            tier_thresholds: vec![0, 15, 40, 70, 100],
        }
    }
}

impl PokepelagoOptions {
    /// Whether the resolved options satisfy `check`. Independent of any state.
    pub fn matches(&self, check: &OptionCheck) -> bool {
        match check {
            OptionCheck::TypeLocks(expected) => self.type_locks == *expected,
            OptionCheck::GoalMode(expected) => self.goal_mode == *expected,
            OptionCheck::InclusionLimit(expected) => self.inclusion_limit == *expected,
        }
    }

    pub fn tier_count(&self) -> usize {
        self.tier_thresholds.len()
    }
}

/// An option value a rule can be gated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionCheck {
    TypeLocks(bool),
    GoalMode(GoalMode),
    InclusionLimit(InclusionLimit),
}

/// Option validation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    /// Goal percentage outside 1–100.
    #[error("goal percentage {0} is outside 1-100")]
    GoalPercentageOutOfRange(u32),
    /// Goal count outside 1–1025.
    #[error("goal count {0} is outside 1-1025")]
    GoalCountOutOfRange(u32),
    /// Trap chance above 100.
    #[error("trap chance {0} exceeds 100")]
    TrapChanceOutOfRange(u32),
    /// No useful tokens to cycle through.
    #[error("no useful items configured")]
    NoUsefulItems,
    /// A useful-token name that is not a known useful token.
    #[error("unknown useful item {0}")]
    UnknownUsefulItem(String),
    /// A trap-token name that is not a known trap token.
    #[error("unknown trap item {0}")]
    UnknownTrapItem(String),
    /// Traps enabled but no trap tokens configured.
    #[error("trap chance set but no trap items configured")]
    NoTrapItems,
    /// No tiers configured.
    #[error("no tier thresholds configured")]
    NoTiers,
    /// The lowest tier must be unconditional.
    #[error("first tier threshold is {0}, not 0")]
    FirstTierNotZero(u32),
    /// Tier thresholds must not decrease.
    #[error("tier {} threshold {threshold} is below the previous tier", .tier + 1)]
    TierThresholdsDecreasing { tier: usize, threshold: u32 },
}

/// Validate options, returning all errors found.
pub fn validate_options(options: &PokepelagoOptions) -> Vec<OptionsError> {
    let mut errors = Vec::new();

    if !(1..=100).contains(&options.goal_percentage) {
        errors.push(OptionsError::GoalPercentageOutOfRange(
            options.goal_percentage,
        ));
    }
    if !(1..=1025).contains(&options.goal_count) {
        errors.push(OptionsError::GoalCountOutOfRange(options.goal_count));
    }
    if options.trap_chance > 100 {
        errors.push(OptionsError::TrapChanceOutOfRange(options.trap_chance));
    }

    if options.useful_items.is_empty() {
        errors.push(OptionsError::NoUsefulItems);
    }
    for name in &options.useful_items {
        if !USEFUL_ITEMS.contains(&name.as_str()) {
            errors.push(OptionsError::UnknownUsefulItem(name.clone()));
        }
    }
    for name in &options.trap_items {
        if !TRAP_ITEMS.contains(&name.as_str()) {
            errors.push(OptionsError::UnknownTrapItem(name.clone()));
        }
    }
    if options.trap_chance > 0 && options.trap_items.is_empty() {
        errors.push(OptionsError::NoTrapItems);
    }

    match options.tier_thresholds.first() {
        None => errors.push(OptionsError::NoTiers),
        Some(&first) if first != 0 => errors.push(OptionsError::FirstTierNotZero(first)),
        Some(_) => {}
    }
    for (tier, pair) in options.tier_thresholds.windows(2).enumerate() {
        if pair[1] < pair[0] {
            errors.push(OptionsError::TierThresholdsDecreasing {
                tier: tier + 1,
                threshold: pair[1],
            });
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_valid() {
        let errors = validate_options(&PokepelagoOptions::default());
        assert!(errors.is_empty(), "default options should be valid: {errors:?}");
    }

    #[test]
    fn goal_ranges() {
        let mut options = PokepelagoOptions::default();
        options.goal_percentage = 0;
        options.goal_count = 2000;
        let errors = validate_options(&options);
        assert!(errors.contains(&OptionsError::GoalPercentageOutOfRange(0)));
        assert!(errors.contains(&OptionsError::GoalCountOutOfRange(2000)));
    }

    #[test]
    fn errors_render_readable_messages() {
        assert_eq!(
            OptionsError::GoalPercentageOutOfRange(250).to_string(),
            "goal percentage 250 is outside 1-100"
        );
        assert_eq!(
            OptionsError::TierThresholdsDecreasing {
                tier: 1,
                threshold: 3
            }
            .to_string(),
            "tier 2 threshold 3 is below the previous tier"
        );
    }

    #[test]
    fn trap_chance_range() {
        let mut options = PokepelagoOptions::default();
        options.trap_chance = 101;
        assert!(validate_options(&options).contains(&OptionsError::TrapChanceOutOfRange(101)));
    }

    #[test]
    fn traps_need_trap_items() {
        let mut options = PokepelagoOptions::default();
        options.trap_chance = 20;
        options.trap_items.clear();
        assert!(validate_options(&options).contains(&OptionsError::NoTrapItems));

        options.trap_chance = 0;
        assert!(validate_options(&options).is_empty());
    }

    #[test]
    fn unknown_filler_names() {
        let mut options = PokepelagoOptions::default();
        options.useful_items = vec!["Rare Candy".to_string()];
        options.trap_items = vec!["Master Ball".to_string()];
        let errors = validate_options(&options);
        assert!(errors.contains(&OptionsError::UnknownUsefulItem("Rare Candy".to_string())));
        assert!(errors.contains(&OptionsError::UnknownTrapItem("Master Ball".to_string())));
    }

    #[test]
    fn tier_threshold_shape() {
        let mut options = PokepelagoOptions::default();
        options.tier_thresholds = vec![5, 3];
        let errors = validate_options(&options);
        assert!(errors.contains(&OptionsError::FirstTierNotZero(5)));
        assert!(errors.contains(&OptionsError::TierThresholdsDecreasing {
            tier: 1,
            threshold: 3
        }));

        options.tier_thresholds.clear();
        assert!(validate_options(&options).contains(&OptionsError::NoTiers));
    }

    #[test]
    fn option_checks_match_resolved_values() {
        let mut options = PokepelagoOptions::default();
        assert!(options.matches(&OptionCheck::TypeLocks(false)));
        assert!(!options.matches(&OptionCheck::TypeLocks(true)));
        options.type_locks = true;
        assert!(options.matches(&OptionCheck::TypeLocks(true)));
        assert!(options.matches(&OptionCheck::InclusionLimit(InclusionLimit::Gen1)));
        assert!(!options.matches(&OptionCheck::GoalMode(GoalMode::Count)));
    }

    #[test]
    fn deserializes_partial_json_with_defaults() {
        let options: PokepelagoOptions =
            serde_json::from_str(r#"{"type_locks": true, "goal_mode": "Count", "goal_count": 50}"#)
                .unwrap();
        assert!(options.type_locks);
        assert_eq!(options.goal_mode, GoalMode::Count);
        assert_eq!(options.goal_count, 50);
        assert_eq!(options.inclusion_limit.max_id(), 151);
        assert_eq!(options.tier_thresholds, vec![0, 15, 40, 70, 100]);
    }
}
