//! EdgeTabs bridge: newline-delimited JSON over stdin/stdout, backed by the simulated host.
//!
//! Protocol: one JSON object per line.
//! Request:  {"id":1, "method":"message", "params":{"type":"GET_TABS"}}
//!           {"id":2, "method":"host.open", "params":{"url":"https://a","active":true}}
//! Response: {"id":1, "result":...} or {"id":1, "error":"..."}
//!
//! Logs go to stderr so stdout carries only protocol lines.

use std::io::{self, Write};
use std::sync::Arc;

use edgetabs::config::{self, EngineConfig};
use edgetabs::engine::Engine;
use edgetabs::host::SimulatedHost;
use edgetabs::rpc_handler::handle_message;
use edgetabs::services::event_bus::EventBus;
use edgetabs::storage::sqlite::SqliteStorage;
use edgetabs::storage::{KeyValueStorage, MemoryStorage};

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

fn respond(value: Value) {
    let mut out = io::stdout().lock();
    let _ = writeln!(out, "{}", value);
    let _ = out.flush();
}

/// Host-side controls, so a driver can play the browser's part.
fn handle_host(host: &SimulatedHost, method: &str, params: &Value) -> Result<Value, String> {
    let tab_id = || params.get("tab_id").and_then(|v| v.as_i64()).ok_or("missing tab_id");
    match method {
        "host.open" => {
            let url = params.get("url").and_then(|v| v.as_str()).ok_or("missing url")?;
            let window_id = params.get("window_id").and_then(|v| v.as_i64()).unwrap_or(1);
            let active = params.get("active").and_then(|v| v.as_bool()).unwrap_or(true);
            Ok(json!({"tabId": host.open_tab(url, window_id, active)}))
        }
        "host.close" => Ok(json!({"ok": host.close_externally(tab_id()?)})),
        "host.navigate" => {
            let url = params.get("url").and_then(|v| v.as_str()).ok_or("missing url")?;
            Ok(json!({"ok": host.navigate(tab_id()?, url)}))
        }
        "host.restart" => {
            let remapped: Vec<Value> = host
                .restart()
                .into_iter()
                .map(|(old, new)| json!({"old": old, "new": new}))
                .collect();
            Ok(json!(remapped))
        }
        "host.tabs" => Ok(json!(host.tab_ids())),
        _ => Err(format!("unknown method: {}", method)),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("edgetabs=info")),
        )
        .with_writer(io::stderr)
        .init();

    let engine_config = match EngineConfig::load(&config::config_path()) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %e, "using default config");
            EngineConfig::default()
        }
    };

    let storage: Arc<dyn KeyValueStorage> = if std::env::args().any(|a| a == "--memory") {
        Arc::new(MemoryStorage::new())
    } else {
        Arc::new(SqliteStorage::open(config::database_path()).expect("Failed to open EdgeTabs storage"))
    };

    let host = Arc::new(SimulatedHost::new());
    let (bus, events) = EventBus::channel();
    host.attach_bus(bus);

    let engine = Engine::new(engine_config, host.clone(), storage);
    let runner = engine.clone();
    tokio::spawn(async move { runner.run(events).await });
    let _periodic = engine.spawn_periodic_resync();

    respond(json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")}));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                respond(json!({"id": null, "error": format!("parse error: {}", e)}));
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);
        let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("message");
        let params = req.get("params").cloned().unwrap_or(json!({}));

        let result = if method == "message" {
            handle_message(&engine, &params).await
        } else {
            handle_host(&host, method, &params)
        };

        let response = match result {
            Ok(val) => json!({"id": id, "result": val}),
            Err(err) => json!({"id": id, "error": err}),
        };
        respond(response);
    }
}
