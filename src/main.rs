//! EdgeTabs: background tab-state reconciliation engine.
//!
//! Entry point: runs a console demo against the simulated host, walking through a
//! browser session, a restart with reassigned tab IDs, and the reconciliation that
//! follows.

use std::sync::Arc;

use edgetabs::config::EngineConfig;
use edgetabs::engine::Engine;
use edgetabs::host::{SimulatedHost, TabHost};
use edgetabs::services::command_dispatcher::Intent;
use edgetabs::services::event_bus::EventBus;
use edgetabs::storage::{KeyValueStorage, MemoryStorage};
use edgetabs::types::tab::TabRecord;

use tracing_subscriber::EnvFilter;

fn section(name: &str) {
    println!("───────────────────────────────────────────────────────────────");
    println!("  {}", name);
    println!("───────────────────────────────────────────────────────────────");
}

fn print_tabs(tabs: &[TabRecord]) {
    for tab in tabs {
        let marker = if tab.is_active { "*" } else { " " };
        let id = tab.id.map_or_else(|| "-".to_string(), |id| id.to_string());
        println!("  {} [{:>3}] {}", marker, id, tab.label());
    }
    println!("  ({} tabs)", tabs.len());
}

/// Lets the event loop and the debounced resync catch up.
async fn settle(engine: &Engine) {
    tokio::time::sleep(engine.config().debounce_delay() * 2).await;
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("edgetabs=info")),
        )
        .init();

    println!();
    println!("  EdgeTabs v{} Demo Mode", env!("CARGO_PKG_VERSION"));
    println!();

    let storage: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());

    // ─── First session ───
    section("Session 1: browsing");
    let host = Arc::new(SimulatedHost::new());
    let (bus, events) = EventBus::channel();
    host.attach_bus(bus);
    let engine = Engine::new(EngineConfig::default(), host.clone(), storage.clone());
    let runner = engine.clone();
    let loop_handle = tokio::spawn(async move { runner.run(events).await });

    if let Err(e) = engine.initialize().await {
        println!("  initialization failed: {}", e);
        return;
    }
    let docs = host.open_tab("https://docs.rs", 1, false);
    let crates = host.open_tab("https://crates.io", 1, false);
    host.open_tab("https://blog.rust-lang.org", 1, true);
    host.navigate(docs, "https://docs.rs/tokio");
    settle(&engine).await;
    print_tabs(&engine.tabs());

    section("Session 1: close crates.io, switch to docs");
    engine.dispatch(Intent::Close(crates)).await;
    engine.dispatch(Intent::Switch(docs)).await;
    settle(&engine).await;
    print_tabs(&engine.tabs());

    // ─── Restart ───
    section("Browser restart: every tab gets a new id");
    drop(engine);
    loop_handle.abort();
    let mapping = host.restart();
    for (old, new) in &mapping {
        println!("  {} -> {}", old, new);
    }
    // One tab did not come back.
    if let Some((_, gone)) = mapping.last() {
        host.close_externally(*gone);
    }

    section("Session 2: reconcile cached tabs with the live ones");
    let (bus, events) = EventBus::channel();
    host.attach_bus(bus);
    let engine = Engine::new(EngineConfig::default(), host.clone(), storage);
    let runner = engine.clone();
    tokio::spawn(async move { runner.run(events).await });
    if let Err(e) = engine.initialize().await {
        println!("  initialization failed: {}", e);
        return;
    }
    print_tabs(&engine.tabs());

    section("Session 2: full resync");
    match engine.full_resync().await {
        Ok(report) => println!(
            "  reconciled {}, pruned {}, delivered to {} surfaces",
            report.merge.reconciled.len(),
            report.prune.pruned.len(),
            report.commit.delivery.delivered
        ),
        Err(e) => println!("  resync failed: {}", e),
    }
    print_tabs(&engine.tabs());

    match host.query_tabs(Default::default()).await {
        Ok(live) => println!("  host reports {} live tabs", live.len()),
        Err(e) => println!("  host query failed: {}", e),
    }
}
