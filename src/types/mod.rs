// EdgeTabs shared type definitions
// Each submodule defines types used across the engine, its host seam and its UI messages.

pub mod errors;
pub mod message;
pub mod settings;
pub mod tab;
