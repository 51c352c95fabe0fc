//! Pokepelago Headless Generation Harness
//!
//! Generates worlds across a seed range and a few option presets, then
//! checks them the way a multiworld host would: pool parity, beatability,
//! determinism, sweep idempotence and id uniqueness. No host, no network.
//!
//! Usage:
//!   cargo run -p pokepelago-simtest
//!   cargo run -p pokepelago-simtest -- --seeds 32 --verbose
//!   cargo run -p pokepelago-simtest -- --options my_options.json
//!   RUST_LOG=pokepelago_logic=debug cargo run -p pokepelago-simtest

use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::Parser;
use pokepelago_logic::catalog::Catalog;
use pokepelago_logic::generation::{generate, GeneratedWorld, SlotData};
use pokepelago_logic::items::{ItemTable, GUESSED_EVENT};
use pokepelago_logic::locations::LocationTable;
use pokepelago_logic::options::{validate_options, GoalMode, PokepelagoOptions};
use tracing_subscriber::EnvFilter;

// ── Bundled catalog ─────────────────────────────────────────────────────
const CATALOG_JSON: &str = include_str!("../../../data/pokemon_gen1.json");

#[derive(Parser, Debug)]
#[command(name = "pokepelago-simtest", about = "Validate generated Pokepelago worlds")]
struct Args {
    /// First seed of the sweep.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of consecutive seeds per preset.
    #[arg(long, default_value_t = 8)]
    seeds: u64,

    /// Options JSON to test instead of the built-in presets.
    #[arg(long)]
    options: Option<PathBuf>,

    /// Catalog JSON to use instead of the bundled Gen 1 data.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Print passing checks too.
    #[arg(long)]
    verbose: bool,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn check(name: impl Into<String>, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

fn main() {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    println!("=== Pokepelago Generation Harness ===\n");

    let mut results = Vec::new();

    // 1. Catalog
    let catalog = match load_catalog(&args) {
        Ok(catalog) => catalog,
        Err(detail) => {
            results.push(TestResult::check("catalog_parse", false, detail));
            report(&results, args.verbose);
            return;
        }
    };
    results.extend(validate_catalog(&catalog));

    // 2. Presets
    let presets = match load_presets(&args) {
        Ok(presets) => presets,
        Err(detail) => {
            results.push(TestResult::check("options_parse", false, detail));
            report(&results, args.verbose);
            return;
        }
    };
    for (label, options) in &presets {
        results.extend(validate_preset(&catalog, label, options, &args));
    }

    // 3. Multiworld pool
    results.extend(validate_shared_pool(&catalog, &args));

    report(&results, args.verbose);
}

fn report(results: &[TestResult], verbose: bool) {
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;

    for r in results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed,
        results.len(),
        failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn load_catalog(args: &Args) -> Result<Catalog, String> {
    let json = match &args.catalog {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?,
        None => CATALOG_JSON.to_string(),
    };
    Catalog::from_json(&json).map_err(|e| format!("catalog error: {}", e))
}

fn load_presets(args: &Args) -> Result<Vec<(String, PokepelagoOptions)>, String> {
    if let Some(path) = &args.options {
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        let options: PokepelagoOptions =
            serde_json::from_str(&json).map_err(|e| format!("JSON parse error: {}", e))?;
        return Ok(vec![(path.display().to_string(), options)]);
    }

    let defaults = PokepelagoOptions::default();
    Ok(vec![
        ("default".into(), defaults.clone()),
        (
            "type_locks".into(),
            PokepelagoOptions {
                type_locks: true,
                ..defaults.clone()
            },
        ),
        (
            "traps".into(),
            PokepelagoOptions {
                trap_chance: 35,
                goal_percentage: 60,
                ..defaults.clone()
            },
        ),
        (
            "count_goal".into(),
            PokepelagoOptions {
                type_locks: true,
                goal_mode: GoalMode::Count,
                goal_count: 77,
                ..defaults
            },
        ),
    ])
}

// ── 1. Catalog ──────────────────────────────────────────────────────────

fn validate_catalog(catalog: &Catalog) -> Vec<TestResult> {
    println!("--- Catalog ---");
    let mut results = Vec::new();

    results.push(TestResult::check(
        "catalog_not_empty",
        !catalog.is_empty(),
        format!("{} species", catalog.len()),
    ));

    let items = ItemTable::from_catalog(catalog);
    let item_ids: BTreeSet<u64> = items.name_to_id().values().copied().collect();
    results.push(TestResult::check(
        "item_ids_unique",
        item_ids.len() == items.len(),
        format!("{} items, {} distinct ids", items.len(), item_ids.len()),
    ));

    let locations = LocationTable::from_catalog(catalog);
    let location_ids: BTreeSet<u64> = locations.name_to_id().values().copied().collect();
    results.push(TestResult::check(
        "location_ids_unique",
        location_ids.len() == locations.len(),
        format!(
            "{} locations, {} distinct ids",
            locations.len(),
            location_ids.len()
        ),
    ));

    println!(
        "  {} species, {} item ids, {} location ids",
        catalog.len(),
        items.len(),
        locations.len()
    );
    results
}

// ── 2. Presets ──────────────────────────────────────────────────────────

fn validate_preset(
    catalog: &Catalog,
    label: &str,
    options: &PokepelagoOptions,
    args: &Args,
) -> Vec<TestResult> {
    println!("--- Preset: {} ---", label);
    let mut results = Vec::new();

    let errors = validate_options(options);
    if !errors.is_empty() {
        let detail = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        results.push(TestResult::check(format!("{label}/options_valid"), false, detail));
        return results;
    }

    for seed in args.seed..args.seed + args.seeds {
        let name = |check: &str| format!("{label}/seed_{seed}/{check}");
        let world = match generate(catalog, options, seed, 1, &mut Vec::new()) {
            Ok(world) => world,
            Err(e) => {
                results.push(TestResult::check(name("generate"), false, e.to_string()));
                continue;
            }
        };
        results.extend(validate_world(&world, catalog, options, &name));
    }

    let failed = results.iter().filter(|r| !r.passed).count();
    println!("  {} checks, {} failed", results.len(), failed);
    results
}

fn validate_world(
    world: &GeneratedWorld,
    catalog: &Catalog,
    options: &PokepelagoOptions,
    name: &dyn Fn(&str) -> String,
) -> Vec<TestResult> {
    let mut results = Vec::new();

    // Pool parity
    let fillable = world.layout.graph.fillable_count();
    results.push(TestResult::check(
        name("pool_parity"),
        world.items.len() == fillable,
        format!("{} items for {} fillable locations", world.items.len(), fillable),
    ));

    // Goal sits on an emitted milestone
    results.push(TestResult::check(
        name("goal_on_milestone"),
        world.layout.milestones.contains(&world.goal.threshold),
        format!(
            "raw {} → {} (victory at {})",
            world.goal.raw, world.goal.threshold, world.goal.victory_count
        ),
    ));

    // Not beaten from the start
    let mut start = world.initial_state();
    world.sweep(&mut start);
    results.push(TestResult::check(
        name("not_complete_at_start"),
        !world.is_complete(&start),
        format!("{} counters at start", start.count(GUESSED_EVENT)),
    ));

    // Beatable with every pool item
    let mut state = world.initial_state();
    for item in &world.items {
        state.collect(&item.name);
    }
    let first = world.sweep(&mut state);
    results.push(TestResult::check(
        name("beatable"),
        world.is_complete(&state),
        format!(
            "{} events, {} evaluations",
            first.collected_events.len(),
            first.evaluations
        ),
    ));

    // Idempotent sweep
    let settled = state.clone();
    let second = world.sweep(&mut state);
    results.push(TestResult::check(
        name("sweep_idempotent"),
        state == settled && second.collected_events.is_empty(),
        format!("{} events on re-sweep", second.collected_events.len()),
    ));

    // Determinism
    let deterministic = match generate(catalog, options, world.seed, world.player, &mut Vec::new())
    {
        Ok(again) => match (world.fingerprint(), again.fingerprint()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        },
        Err(_) => false,
    };
    results.push(TestResult::check(
        name("deterministic"),
        deterministic,
        "regenerated with same seed",
    ));

    // Slot data
    let slot = world
        .slot_data_json()
        .ok()
        .and_then(|json| serde_json::from_str::<SlotData>(&json).ok());
    results.push(TestResult::check(
        name("slot_data"),
        slot.as_ref() == Some(&world.slot_data()),
        format!("{:?}", world.slot_data()),
    ));

    if !world.layout.diagnostics.warnings.is_empty() {
        log::info!(
            "{}: {} build warnings",
            name("diagnostics"),
            world.layout.diagnostics.warnings.len()
        );
    }

    results
}

// ── 3. Shared pool ──────────────────────────────────────────────────────

fn validate_shared_pool(catalog: &Catalog, args: &Args) -> Vec<TestResult> {
    println!("--- Shared pool ---");
    let mut shared = Vec::new();
    let mut contributed = 0;
    let mut errors = Vec::new();

    for player in 1..=4u32 {
        let options = PokepelagoOptions {
            type_locks: player % 2 == 0,
            trap_chance: 10 * player,
            ..PokepelagoOptions::default()
        };
        match generate(catalog, &options, args.seed + player as u64, player, &mut shared) {
            Ok(world) => contributed += world.pool.contributed,
            Err(e) => errors.push(format!("player {}: {}", player, e)),
        }
    }

    vec![TestResult::check(
        "shared_pool/parity",
        errors.is_empty() && shared.len() == contributed,
        if errors.is_empty() {
            format!("{} items from 4 players", shared.len())
        } else {
            errors.join("; ")
        },
    )]
}
