//! JSON message handler for the EdgeTabs bridge.
//!
//! Extracted from `rpc_server.rs` so it can be unit-tested independently.
//! `handle_message` decodes a raw UI message and routes it through the [`Engine`].

use serde_json::{json, Value};

use crate::engine::{Engine, Reply};
use crate::types::message::Message;

/// Dispatch a raw UI message to the engine.
///
/// Returns the JSON reply on success (`GET_TABS` yields the tab array, everything
/// else `{"ok": true}`), or `Err(String)` with an error message.
pub async fn handle_message(engine: &Engine, raw: &Value) -> Result<Value, String> {
    let message: Message =
        serde_json::from_value(raw.clone()).map_err(|e| format!("invalid message: {}", e))?;

    match engine.handle_message(message).await.map_err(|e| e.to_string())? {
        Reply::Tabs(tabs) => serde_json::to_value(tabs).map_err(|e| e.to_string()),
        Reply::Ack => Ok(json!({"ok": true})),
        Reply::Ignored => Ok(json!({"ok": true, "ignored": true})),
    }
}
