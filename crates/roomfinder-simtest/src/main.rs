//! Campus Room Finder Headless Harness
//!
//! Validates room-finder logic and shipped data without a browser.
//! Runs entirely in-process: no map tiles, no networking, no rendering.
//!
//! Usage:
//!   cargo run -p roomfinder-simtest
//!   cargo run -p roomfinder-simtest -- --verbose
//!   RUST_LOG=debug cargo run -p roomfinder-simtest

use std::sync::Arc;

use roomfinder_logic::access::{self, AccessDecision, CampusBoundary, DenialReason};
use roomfinder_logic::catalog::RoomCatalog;
use roomfinder_logic::config::{validate_config, FinderConfig};
use roomfinder_logic::geometry::LatLon;
use roomfinder_logic::location::UserLocation;
use roomfinder_logic::map_sync::{ControllerState, LayerKey, MapSnapshot, MapSyncController};
use roomfinder_logic::recording::{LayerKind, RecordingSurface};
use roomfinder_logic::route;
use roomfinder_logic::search::SearchIndex;
use serde::Deserialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// ── Shipped data (same files a deployment reads) ────────────────────────
const ROOMS_JSON: &str = include_str!("../../../data/rooms.json");
const BOUNDARY_JSON: &str = include_str!("../../../data/campus_boundary.json");
const CONFIG_JSON: &str = include_str!("../../../data/finder_config.json");

/// Just enough of a room record to cross-check the catalog's counts.
#[derive(Debug, Deserialize)]
struct RecordHeader {
    id: Option<u32>,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

struct Fixture {
    config: FinderConfig,
    catalog: Arc<RoomCatalog>,
    boundary: CampusBoundary,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");

    // Library code logs through `log`; the subscriber picks those records up.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "roomfinder_logic=debug" } else { "warn" })
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
    println!("=== Campus Room Finder Harness ===\n");

    let mut results = Vec::new();

    // 1. Configuration and data files
    let fixture = match load_fixture(&mut results) {
        Some(f) => f,
        None => return finish(results, verbose),
    };

    // 2. Room catalog
    results.extend(validate_catalog(&fixture, verbose));

    // 3. Search
    results.extend(validate_search(&fixture, verbose));

    // 4. Walking routes
    results.extend(validate_routes(&fixture, verbose));

    // 5. Access gate
    results.extend(validate_access(&fixture, verbose));

    // 6. Map synchronisation against a recording surface
    results.extend(validate_map_sync(&fixture, verbose));

    finish(results, verbose);
}

fn finish(results: Vec<TestResult>, verbose: bool) {
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Data files ───────────────────────────────────────────────────────

fn load_fixture(results: &mut Vec<TestResult>) -> Option<Fixture> {
    println!("--- Data Files ---");

    let config = match FinderConfig::from_json_str(CONFIG_JSON) {
        Ok(c) => c,
        Err(e) => {
            results.push(TestResult {
                name: "config_parse".into(),
                passed: false,
                detail: e.to_string(),
            });
            return None;
        }
    };
    let problems = validate_config(&config);
    results.push(TestResult {
        name: "config_valid".into(),
        passed: problems.is_empty(),
        detail: if problems.is_empty() {
            "finder_config.json passes validation".into()
        } else {
            problems.join("; ")
        },
    });

    let boundary = match CampusBoundary::from_json_str(BOUNDARY_JSON) {
        Ok(b) => b,
        Err(e) => {
            results.push(TestResult {
                name: "boundary_parse".into(),
                passed: false,
                detail: e.to_string(),
            });
            return None;
        }
    };
    results.push(TestResult {
        name: "boundary_enforceable".into(),
        passed: boundary.is_enforceable(),
        detail: boundary
            .warning()
            .unwrap_or_else(|| format!("{} vertices", boundary.vertices().len())),
    });

    let catalog = match RoomCatalog::from_json_str(ROOMS_JSON, &config.envelope) {
        Ok((catalog, report)) => {
            results.push(TestResult {
                name: "catalog_load".into(),
                passed: !catalog.is_empty(),
                detail: report.to_string(),
            });
            catalog
        }
        Err(e) => {
            results.push(TestResult {
                name: "catalog_parse".into(),
                passed: false,
                detail: e.to_string(),
            });
            return None;
        }
    };

    Some(Fixture {
        config,
        catalog: Arc::new(catalog),
        boundary,
    })
}

// ── 2. Room catalog ─────────────────────────────────────────────────────

fn validate_catalog(fx: &Fixture, verbose: bool) -> Vec<TestResult> {
    println!("--- Room Catalog ---");
    let mut results = Vec::new();

    let records: Vec<serde_json::Value> = serde_json::from_str(ROOMS_JSON).unwrap_or_default();
    let explicit_ids = records
        .iter()
        .filter_map(|v| RecordHeader::deserialize(v).ok().and_then(|h| h.id))
        .count();
    let mut catalog_ids: Vec<u32> = fx.catalog.all().iter().map(|r| r.id).collect();
    catalog_ids.sort_unstable();
    catalog_ids.dedup();
    results.push(TestResult {
        name: "catalog_ids_unique".into(),
        passed: catalog_ids.len() == fx.catalog.len() && fx.catalog.len() <= records.len(),
        detail: format!(
            "{} records ({} with ids), {} rooms",
            records.len(),
            explicit_ids,
            fx.catalog.len()
        ),
    });

    let all_resolvable = fx
        .catalog
        .all()
        .iter()
        .all(|r| fx.catalog.by_id(r.id).map(|found| found.id) == Some(r.id));
    results.push(TestResult {
        name: "catalog_lookup_by_id".into(),
        passed: all_resolvable,
        detail: "every loaded room resolves by its id".into(),
    });

    let outside: Vec<&str> = fx
        .catalog
        .all()
        .iter()
        .filter(|r| !fx.config.envelope.contains(r.position))
        .map(|r| r.name.as_str())
        .collect();
    results.push(TestResult {
        name: "catalog_inside_envelope".into(),
        passed: outside.is_empty(),
        detail: if outside.is_empty() {
            "all rooms inside the configured envelope".into()
        } else {
            format!("outside envelope: {}", outside.join(", "))
        },
    });

    let unnamed = fx.catalog.all().iter().filter(|r| r.name.trim().is_empty()).count();
    results.push(TestResult {
        name: "catalog_names_present".into(),
        passed: unnamed == 0,
        detail: format!("{} unnamed rooms", unnamed),
    });

    if verbose {
        for room in fx.catalog.all() {
            println!(
                "    #{:<3} {:<20} {} / floor {}",
                room.id, room.name, room.building, room.floor
            );
        }
    }

    results
}

// ── 3. Search ───────────────────────────────────────────────────────────

fn validate_search(fx: &Fixture, verbose: bool) -> Vec<TestResult> {
    println!("--- Search ---");
    let mut results = Vec::new();
    let index = SearchIndex::new(&fx.catalog);
    let limit = fx.config.search.limit;
    let threshold = fx.config.search.fuzzy_threshold;

    // Every room finds itself by exact name at full score.
    let misses: Vec<&str> = fx
        .catalog
        .all()
        .iter()
        .filter(|room| {
            !index
                .search(&room.name, limit, threshold)
                .iter()
                .any(|h| h.room.id == room.id && h.score == 100.0)
        })
        .map(|room| room.name.as_str())
        .collect();
    results.push(TestResult {
        name: "search_finds_every_room".into(),
        passed: misses.is_empty(),
        detail: if misses.is_empty() {
            format!("{} rooms found by name", fx.catalog.len())
        } else {
            format!("not found: {}", misses.join(", "))
        },
    });

    // Ranking and limit hold over a query sweep.
    let queries = [
        "lab", "libary", "cafe", "block a", "ground", "computr", "a10", "gym", "xyz", "  ",
    ];
    let mut bad_order = Vec::new();
    for q in queries {
        let hits = index.search(q, limit, threshold);
        let sorted = hits.windows(2).all(|w| w[0].score >= w[1].score);
        let bounded = hits.len() <= limit && hits.iter().all(|h| h.score >= threshold);
        if !sorted || !bounded {
            bad_order.push(q);
        }
        if verbose {
            let names: Vec<String> = hits
                .iter()
                .map(|h| format!("{} ({:.0})", h.room.name, h.score))
                .collect();
            println!("    {:>10?} → {}", q, names.join(", "));
        }
    }
    results.push(TestResult {
        name: "search_sorted_and_bounded".into(),
        passed: bad_order.is_empty(),
        detail: format!("{} queries, {} violations", queries.len(), bad_order.len()),
    });

    let typo = index.search("libary", limit, threshold);
    results.push(TestResult {
        name: "search_fuzzy_typo".into(),
        passed: typo.first().map(|h| h.room.name.as_str()) == Some("Library"),
        detail: format!("{} hits for 'libary'", typo.len()),
    });

    let featured = index.featured(&fx.config.search.featured);
    results.push(TestResult {
        name: "search_featured_resolve".into(),
        passed: featured.len() == fx.config.search.featured.len(),
        detail: format!(
            "{}/{} featured rooms in catalog",
            featured.len(),
            fx.config.search.featured.len()
        ),
    });

    let suggestions = index.suggest("cafetria", 3, threshold);
    results.push(TestResult {
        name: "search_suggestions".into(),
        passed: suggestions.first() == Some(&"Cafeteria"),
        detail: format!("suggestions: {:?}", suggestions),
    });

    results
}

// ── 4. Walking routes ───────────────────────────────────────────────────

fn validate_routes(fx: &Fixture, verbose: bool) -> Vec<TestResult> {
    println!("--- Walking Routes ---");
    let mut results = Vec::new();
    let speed = fx.config.route.walking_speed_kmh;

    let reference = route::estimate(LatLon::new(0.0, 0.0), LatLon::new(0.009, 0.0), 5.0);
    results.push(TestResult {
        name: "route_reference_walk".into(),
        passed: matches!(&reference, Ok(r) if r.duration_minutes() == 12),
        detail: match &reference {
            Ok(r) => r.to_string(),
            Err(e) => e.to_string(),
        },
    });

    // All room pairs: symmetric distance, positive duration.
    let rooms = fx.catalog.all();
    let mut pairs = 0;
    let mut failures = Vec::new();
    let mut longest = 0.0_f64;
    for a in rooms {
        for b in rooms {
            pairs += 1;
            match (
                route::estimate(a.position, b.position, speed),
                route::estimate(b.position, a.position, speed),
            ) {
                (Ok(ab), Ok(ba)) => {
                    longest = longest.max(ab.distance_km());
                    if (ab.distance_km() - ba.distance_km()).abs() > 1e-12
                        || ab.duration_minutes() < 1
                    {
                        failures.push(format!("{} ↔ {}", a.name, b.name));
                    }
                }
                _ => failures.push(format!("{} ↔ {}: error", a.name, b.name)),
            }
        }
    }
    results.push(TestResult {
        name: "route_all_pairs".into(),
        passed: failures.is_empty(),
        detail: format!(
            "{} pairs, longest {:.2} km, {} failures",
            pairs,
            longest,
            failures.len()
        ),
    });
    if verbose {
        for f in &failures {
            println!("    {}", f);
        }
    }

    let zero = route::estimate(LatLon::new(0.0, 0.0), LatLon::new(0.0, 0.0), 0.0);
    results.push(TestResult {
        name: "route_rejects_zero_speed".into(),
        passed: zero.is_err(),
        detail: match zero {
            Ok(r) => format!("unexpected estimate {}", r),
            Err(e) => e.to_string(),
        },
    });

    results
}

// ── 5. Access gate ──────────────────────────────────────────────────────

fn validate_access(fx: &Fixture, _verbose: bool) -> Vec<TestResult> {
    println!("--- Access Gate ---");
    let mut results = Vec::new();

    let off_campus: Vec<&str> = fx
        .catalog
        .all()
        .iter()
        .filter(|r| !access::check(r.position, &fx.boundary).is_allowed())
        .map(|r| r.name.as_str())
        .collect();
    results.push(TestResult {
        name: "access_rooms_on_campus".into(),
        passed: off_campus.is_empty(),
        detail: if off_campus.is_empty() {
            "every room lies inside the campus boundary".into()
        } else {
            format!("off campus: {}", off_campus.join(", "))
        },
    });

    let far = access::check(LatLon::new(-1.2921, 36.8219), &fx.boundary);
    results.push(TestResult {
        name: "access_denies_off_campus".into(),
        passed: far == AccessDecision::Denied(DenialReason::OutsideBoundary),
        detail: format!("{:?}", far),
    });

    let vertex = fx.boundary.vertices().first().copied();
    let on_edge = vertex.map(|v| access::check(v, &fx.boundary));
    results.push(TestResult {
        name: "access_vertex_inside".into(),
        passed: on_edge.is_some_and(|d| d.is_allowed()),
        detail: format!("{:?}", on_edge),
    });

    let open = access::check(LatLon::new(51.5, -0.12), &CampusBoundary::default());
    results.push(TestResult {
        name: "access_fail_open".into(),
        passed: open == AccessDecision::Allowed { fail_open: true },
        detail: format!("{:?}", open),
    });

    results
}

// ── 6. Map synchronisation ──────────────────────────────────────────────

fn validate_map_sync(fx: &Fixture, verbose: bool) -> Vec<TestResult> {
    println!("--- Map Sync ---");
    let mut results = Vec::new();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            results.push(TestResult {
                name: "map_runtime".into(),
                passed: false,
                detail: e.to_string(),
            });
            return results;
        }
    };

    let mut controller = MapSyncController::new(
        RecordingSurface::ready_after(3),
        Arc::clone(&fx.catalog),
        fx.boundary.clone(),
        fx.config.map.clone(),
    );

    let first_room = fx.catalog.all().first().map(|r| (r.id, r.position));
    let start = fx.boundary.bounds().map(|b| b.center()).unwrap_or(LatLon::new(0.0, 0.0));
    let user = UserLocation::new(start.lat, start.lon, 1);

    controller.reconcile(MapSnapshot::new("standard").with_user(user));
    let ready = runtime.block_on(controller.wait_until_ready());
    results.push(TestResult {
        name: "map_becomes_ready".into(),
        passed: ready.is_ok() && controller.state() == ControllerState::Ready,
        detail: format!(
            "{} readiness checks, {} layers",
            controller.surface().readiness_checks(),
            controller.layer_count()
        ),
    });

    let markers = controller.surface().live_count(LayerKind::Marker);
    results.push(TestResult {
        name: "map_room_markers".into(),
        passed: markers == fx.catalog.len() + 1,
        detail: format!("{} markers for {} rooms + user", markers, fx.catalog.len()),
    });

    if let Some((id, dest)) = first_room {
        let snapshot = match route::estimate(start, dest, fx.config.route.walking_speed_kmh) {
            Ok(r) => MapSnapshot::new("satellite")
                .with_user(user)
                .with_selection(id, Some(r)),
            Err(_) => MapSnapshot::new("satellite").with_user(user).with_selection(id, None),
        };
        controller.reconcile(snapshot.clone());
        let before = controller.surface().mutation_count();
        controller.reconcile(snapshot);
        let after = controller.surface().mutation_count();
        results.push(TestResult {
            name: "map_idempotent".into(),
            passed: before == after && controller.has_layer(LayerKey::Route),
            detail: format!("{} mutations before, {} after repeat", before, after),
        });
    }

    let live_before = controller.surface().live_layer_count();
    controller.dispose();
    let clean = controller.surface().live_layer_count() == 0
        && controller.surface().violations().is_empty();
    results.push(TestResult {
        name: "map_dispose_clean".into(),
        passed: clean,
        detail: format!(
            "{} layers removed, {} lifecycle violations",
            live_before,
            controller.surface().violations().len()
        ),
    });
    if verbose {
        for v in controller.surface().violations() {
            println!("    {}", v);
        }
    }

    results
}
