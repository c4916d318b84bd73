// EdgeTabs state managers
// Managers own in-memory tab state: the record store, the snapshot merger and the ghost pruner.

pub mod ghost_pruner;
pub mod snapshot_merger;
pub mod tab_store;
