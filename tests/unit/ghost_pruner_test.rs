use edgetabs::host::SimulatedHost;
use edgetabs::managers::ghost_pruner::GhostPruner;
use edgetabs::managers::tab_store::{SharedTabStore, TabStore, TabStoreTrait};
use edgetabs::types::tab::{HostTab, TabRecord};

fn stored(id: i64, url: &str) -> TabRecord {
    TabRecord::from_host(&HostTab::new(id, url))
}

#[tokio::test]
async fn test_prunes_record_unknown_to_host() {
    let host = SimulatedHost::new();
    let mut store = TabStore::new();
    store.upsert(stored(42, "https://gone"));
    let shared = SharedTabStore::new(store);

    let report = GhostPruner::prune(&shared, &[], &host).await;

    assert_eq!(report.pruned, vec![42]);
    assert!(report.kept_non_visible.is_empty());
    assert!(!shared.contains(42));
}

#[tokio::test]
async fn test_keeps_record_found_by_probe() {
    let host = SimulatedHost::new();
    let id = host.open_tab("https://background", 2, false);
    host.hide_from_query(id);

    let mut store = TabStore::new();
    store.upsert(stored(id, "https://background"));
    let shared = SharedTabStore::new(store);

    let report = GhostPruner::prune(&shared, &[], &host).await;

    assert_eq!(report.kept_non_visible, vec![id]);
    assert!(report.pruned.is_empty());
    assert!(shared.contains(id));
}

#[tokio::test]
async fn test_live_records_are_not_probed() {
    let host = SimulatedHost::new();
    let mut store = TabStore::new();
    store.upsert(stored(1, "https://a"));
    let shared = SharedTabStore::new(store);

    // Tab 1 is in the live set even though this host does not know it.
    let report = GhostPruner::prune(&shared, &[HostTab::new(1, "https://a")], &host).await;

    assert!(report.pruned.is_empty());
    assert!(report.kept_non_visible.is_empty());
    assert!(shared.contains(1));
}

#[tokio::test]
async fn test_records_without_id_are_kept() {
    let host = SimulatedHost::new();
    let mut store = TabStore::new();
    store.upsert(TabRecord {
        url: Some("https://pending".to_string()),
        ..Default::default()
    });
    let shared = SharedTabStore::new(store);

    let report = GhostPruner::prune(&shared, &[], &host).await;

    assert_eq!(report, Default::default());
    assert_eq!(shared.with(|s| s.len()), 1);
}

#[test]
fn test_suspects_keep_store_order() {
    let mut store = TabStore::new();
    for id in [4, 1, 3, 2] {
        store.upsert(stored(id, "https://x"));
    }
    let live = [HostTab::new(1, "https://x"), HostTab::new(2, "https://x")];
    assert_eq!(GhostPruner::suspects(&store, &live), vec![4, 3]);
}
