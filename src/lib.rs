//! EdgeTabs: keeps one authoritative view of the browser's tabs and keeps every tab-strip
//! overlay in sync with it.
//!
//! This library crate exposes all modules for use by the binaries and integration tests.

pub mod config;
pub mod engine;
pub mod host;
pub mod managers;
pub mod rpc_handler;
pub mod services;
pub mod storage;
pub mod types;
