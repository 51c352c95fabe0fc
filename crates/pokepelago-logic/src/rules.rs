//! Rule algebra: immutable access predicates over a [`CollectionState`].
//!
//! Rules are a closed tagged enum rather than closures, so every operand
//! is owned by the node that uses it and every variant must say which
//! tokens it reads. The sweep relies on [`Rule::dependencies`] to decide
//! which failed rules to re-test when a token count changes; a composite
//! that forgot a child's dependencies would stall the sweep.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::items::ItemGroups;
use crate::options::{OptionCheck, PokepelagoOptions};
use crate::state::CollectionState;

/// Everything a rule may read besides the state.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub options: &'a PokepelagoOptions,
    pub groups: &'a ItemGroups,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rule {
    /// At least `count` copies of `token`.
    Has { token: String, count: u32 },
    /// One copy of each token.
    HasAll(Vec<String>),
    /// At least `count` distinct members of `group`.
    HasGroup { group: String, count: u32 },
    /// Every child holds. Empty is true.
    And(Vec<Rule>),
    /// Some child holds. Empty is false.
    Or(Vec<Rule>),
    /// The resolved options match, regardless of state.
    OptionFilter(OptionCheck),
}

impl Rule {
    pub fn has(token: impl Into<String>, count: u32) -> Self {
        Rule::Has {
            token: token.into(),
            count: count.max(1),
        }
    }

    pub fn has_all<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Rule::HasAll(tokens.into_iter().map(Into::into).collect())
    }

    pub fn has_group(group: impl Into<String>, count: u32) -> Self {
        Rule::HasGroup {
            group: group.into(),
            count: count.max(1),
        }
    }

    pub fn always() -> Self {
        Rule::And(Vec::new())
    }

    pub fn never() -> Self {
        Rule::Or(Vec::new())
    }

    pub fn is_always(&self) -> bool {
        matches!(self, Rule::And(children) if children.is_empty())
    }

    pub fn is_never(&self) -> bool {
        matches!(self, Rule::Or(children) if children.is_empty())
    }

    pub fn evaluate(&self, state: &CollectionState, ctx: &RuleContext) -> bool {
        match self {
            Rule::Has { token, count } => state.has(token, *count),
            Rule::HasAll(tokens) => tokens.iter().all(|t| state.has(t, 1)),
            Rule::HasGroup { group, count } => {
                let held = ctx
                    .groups
                    .members(group)
                    .filter(|m| state.has(m, 1))
                    .count();
                held >= *count as usize
            }
            Rule::And(children) => children.iter().all(|r| r.evaluate(state, ctx)),
            Rule::Or(children) => children.iter().any(|r| r.evaluate(state, ctx)),
            Rule::OptionFilter(check) => ctx.options.matches(check),
        }
    }

    /// Token names whose counts can change this rule's outcome.
    pub fn dependencies(&self, groups: &ItemGroups) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_dependencies(groups, &mut out);
        out
    }

    fn collect_dependencies(&self, groups: &ItemGroups, out: &mut BTreeSet<String>) {
        match self {
            Rule::Has { token, .. } => {
                out.insert(token.clone());
            }
            Rule::HasAll(tokens) => out.extend(tokens.iter().cloned()),
            Rule::HasGroup { group, .. } => {
                out.extend(groups.members(group).map(str::to_string));
            }
            Rule::And(children) | Rule::Or(children) => {
                for child in children {
                    child.collect_dependencies(groups, out);
                }
            }
            Rule::OptionFilter(_) => {}
        }
    }

    /// Fold every [`Rule::OptionFilter`] against `options` and simplify.
    ///
    /// The result evaluates identically to `self` for any state under the
    /// same options; it just skips checks the options already decided.
    pub fn specialize(self, options: &PokepelagoOptions) -> Rule {
        match self {
            Rule::OptionFilter(check) => {
                if options.matches(&check) {
                    Rule::always()
                } else {
                    Rule::never()
                }
            }
            Rule::And(children) => {
                let mut kept = Vec::with_capacity(children.len());
                for child in children {
                    let child = child.specialize(options);
                    if child.is_never() {
                        return Rule::never();
                    }
                    if !child.is_always() {
                        kept.push(child);
                    }
                }
                if kept.len() == 1 {
                    kept.pop().unwrap_or_else(Rule::always)
                } else {
                    Rule::And(kept)
                }
            }
            Rule::Or(children) => {
                let mut kept = Vec::with_capacity(children.len());
                for child in children {
                    let child = child.specialize(options);
                    if child.is_always() {
                        return Rule::always();
                    }
                    if !child.is_never() {
                        kept.push(child);
                    }
                }
                if kept.len() == 1 {
                    kept.pop().unwrap_or_else(Rule::never)
                } else {
                    Rule::Or(kept)
                }
            }
            leaf => leaf,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn groups() -> ItemGroups {
        let mut groups = ItemGroups::default();
        groups.insert(
            "Starters",
            ["Bulbasaur Unlock", "Charmander Unlock", "Squirtle Unlock"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        groups
    }

    fn guess_rule() -> Rule {
        Rule::And(vec![
            Rule::has("Charmander Unlock", 1),
            Rule::Or(vec![
                Rule::has_all(["Fire Type Key"]),
                Rule::OptionFilter(OptionCheck::TypeLocks(false)),
            ]),
        ])
    }

    #[test]
    fn has_respects_count() {
        let options = PokepelagoOptions::default();
        let groups = groups();
        let ctx = RuleContext {
            options: &options,
            groups: &groups,
        };
        let rule = Rule::has("Pokemon Guessed", 3);
        let mut state = CollectionState::new();
        state.collect_n("Pokemon Guessed", 2);
        assert!(!rule.evaluate(&state, &ctx));
        state.collect("Pokemon Guessed");
        assert!(rule.evaluate(&state, &ctx));
    }

    #[test]
    fn has_count_is_at_least_one() {
        assert_eq!(
            Rule::has("X", 0),
            Rule::Has {
                token: "X".to_string(),
                count: 1
            }
        );
    }

    #[test]
    fn has_group_counts_distinct_members() {
        let options = PokepelagoOptions::default();
        let groups = groups();
        let ctx = RuleContext {
            options: &options,
            groups: &groups,
        };
        let rule = Rule::has_group("Starters", 2);
        let mut state = CollectionState::new();
        state.collect_n("Bulbasaur Unlock", 5);
        assert!(!rule.evaluate(&state, &ctx));
        state.collect("Squirtle Unlock");
        assert!(rule.evaluate(&state, &ctx));
    }

    #[test]
    fn empty_composites() {
        let options = PokepelagoOptions::default();
        let groups = groups();
        let ctx = RuleContext {
            options: &options,
            groups: &groups,
        };
        let state = CollectionState::new();
        assert!(Rule::always().evaluate(&state, &ctx));
        assert!(!Rule::never().evaluate(&state, &ctx));
    }

    #[test]
    fn option_filter_short_circuits_type_keys() {
        let mut options = PokepelagoOptions::default();
        let groups = groups();
        let mut state = CollectionState::new();
        state.collect("Charmander Unlock");

        let ctx = RuleContext {
            options: &options,
            groups: &groups,
        };
        assert!(guess_rule().evaluate(&state, &ctx));

        options.type_locks = true;
        let ctx = RuleContext {
            options: &options,
            groups: &groups,
        };
        assert!(!guess_rule().evaluate(&state, &ctx));
        state.collect("Fire Type Key");
        assert!(guess_rule().evaluate(&state, &ctx));
    }

    #[test]
    fn composite_dependencies_are_the_union_of_children() {
        let groups = groups();
        let rule = Rule::Or(vec![
            Rule::And(vec![
                Rule::has("Pokemon Guessed", 10),
                Rule::has_all(["Fire Type Key", "Water Type Key"]),
            ]),
            Rule::has_group("Starters", 1),
            Rule::OptionFilter(OptionCheck::TypeLocks(false)),
        ]);
        let deps = rule.dependencies(&groups);
        let expected: BTreeSet<String> = [
            "Pokemon Guessed",
            "Fire Type Key",
            "Water Type Key",
            "Bulbasaur Unlock",
            "Charmander Unlock",
            "Squirtle Unlock",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(deps, expected);
    }

    #[test]
    fn option_filter_has_no_dependencies() {
        let rule = Rule::OptionFilter(OptionCheck::TypeLocks(true));
        assert!(rule.dependencies(&groups()).is_empty());
    }

    #[test]
    fn specialize_drops_type_keys_when_locks_off() {
        let options = PokepelagoOptions::default();
        assert_eq!(
            guess_rule().specialize(&options),
            Rule::has("Charmander Unlock", 1)
        );
    }

    #[test]
    fn specialize_keeps_type_keys_when_locks_on() {
        let options = PokepelagoOptions {
            type_locks: true,
            ..PokepelagoOptions::default()
        };
        assert_eq!(
            guess_rule().specialize(&options),
            Rule::And(vec![
                Rule::has("Charmander Unlock", 1),
                Rule::has_all(["Fire Type Key"]),
            ])
        );
    }

    #[test]
    fn specialize_folds_to_constants() {
        let options = PokepelagoOptions::default();
        let dead = Rule::And(vec![
            Rule::has("X", 1),
            Rule::OptionFilter(OptionCheck::TypeLocks(true)),
        ]);
        assert!(dead.specialize(&options).is_never());
        let open = Rule::Or(vec![
            Rule::has("X", 1),
            Rule::OptionFilter(OptionCheck::TypeLocks(false)),
        ]);
        assert!(open.specialize(&options).is_always());
    }

    #[test]
    fn specialize_preserves_outcomes() {
        let groups = groups();
        for type_locks in [false, true] {
            let options = PokepelagoOptions {
                type_locks,
                ..PokepelagoOptions::default()
            };
            let ctx = RuleContext {
                options: &options,
                groups: &groups,
            };
            let specialized = guess_rule().specialize(&options);
            for (unlock, key) in [(false, false), (true, false), (false, true), (true, true)] {
                let mut state = CollectionState::new();
                if unlock {
                    state.collect("Charmander Unlock");
                }
                if key {
                    state.collect("Fire Type Key");
                }
                assert_eq!(
                    guess_rule().evaluate(&state, &ctx),
                    specialized.evaluate(&state, &ctx),
                    "type_locks={type_locks} unlock={unlock} key={key}"
                );
            }
        }
    }
}
