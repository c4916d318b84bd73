use std::sync::Arc;

use edgetabs::host::simulated::HostCall;
use edgetabs::host::{QueryScope, SimulatedHost, TabHost};
use edgetabs::managers::snapshot_merger::{MergeMode, SnapshotMerger};
use edgetabs::managers::tab_store::{SharedTabStore, TabStore, TabStoreTrait};
use edgetabs::services::command_dispatcher::{CommandDispatcher, Confirmation, Intent, PendingIntent};
use edgetabs::types::message::Message;
use edgetabs::types::tab::{HostTab, TabRecord};
use rstest::rstest;

/// A host with `count` tabs (ids 1..=count, last one active) and a store mirroring it.
async fn setup(count: usize) -> (Arc<SimulatedHost>, SharedTabStore, CommandDispatcher) {
    let host = Arc::new(SimulatedHost::new());
    for i in 1..=count {
        host.open_tab(&format!("https://site/{}", i), 1, i == count);
    }
    let live = host.query_tabs(QueryScope::AllWindows).await.unwrap();
    let mut store = TabStore::new();
    SnapshotMerger::merge(&mut store, &live, MergeMode::Incremental);
    let dispatcher = CommandDispatcher::new(host.clone(), "edge://newtab");
    (host, SharedTabStore::new(store), dispatcher)
}

#[rstest]
#[case::switch(Message::TabSwitch { tab_id: 1 }, Some(Intent::Switch(1)))]
#[case::close(Message::TabClose { tab_id: 2 }, Some(Intent::Close(2)))]
#[case::close_others(Message::TabCloseOthers { tab_id: 3 }, Some(Intent::CloseOthers(3)))]
#[case::new(Message::TabNew, Some(Intent::New))]
#[case::duplicate(Message::TabDuplicate { tab_id: 4 }, Some(Intent::Duplicate(4)))]
#[case::get_tabs(Message::GetTabs, None)]
fn test_intent_from_message(#[case] message: Message, #[case] expected: Option<Intent>) {
    assert_eq!(Intent::from_message(&message), expected);
}

// ─── Close ───

#[tokio::test]
async fn test_close_removes_record_before_host_confirms() {
    let (host, store, dispatcher) = setup(8).await;

    let pending = dispatcher.apply_optimistic(&store, Intent::Close(7));

    assert!(!store.contains(7));
    assert!(pending.changed_store());
    assert!(host.tab_ids().contains(&7));
    assert!(host.calls().is_empty());

    let confirmation = dispatcher.confirm(&store, pending).await;
    assert_eq!(confirmation, Confirmation::Confirmed);
    assert!(!host.tab_ids().contains(&7));
    assert_eq!(host.calls(), vec![HostCall::Remove(vec![7])]);
}

#[tokio::test]
async fn test_close_tolerates_removed_event_before_optimistic_write() {
    let (_host, store, dispatcher) = setup(8).await;

    // The host's removal event wins the race.
    store.with(|s| s.remove(7));
    let pending = dispatcher.apply_optimistic(&store, Intent::Close(7));
    assert!(!pending.changed_store());

    let confirmation = dispatcher.confirm(&store, pending).await;
    assert_eq!(confirmation, Confirmation::Confirmed);
    assert_eq!(store.ids(), vec![1, 2, 3, 4, 5, 6, 8]);
}

#[tokio::test]
async fn test_close_tolerates_removed_event_after_confirmation() {
    let (_host, store, dispatcher) = setup(8).await;

    let pending = dispatcher.apply_optimistic(&store, Intent::Close(7));
    dispatcher.confirm(&store, pending).await;
    store.with(|s| s.remove(7));

    assert_eq!(store.ids(), vec![1, 2, 3, 4, 5, 6, 8]);
}

#[tokio::test]
async fn test_close_of_ghost_tab_stays_removed() {
    let (_host, store, dispatcher) = setup(2).await;
    store.with(|s| s.upsert(TabRecord::from_host(&HostTab::new(99, "https://ghost"))));

    let pending = dispatcher.apply_optimistic(&store, Intent::Close(99));
    let confirmation = dispatcher.confirm(&store, pending).await;

    assert_eq!(confirmation, Confirmation::GhostsRemoved(vec![99]));
    assert!(!store.contains(99));
}

#[tokio::test]
async fn test_close_reverts_when_host_refuses_and_tab_survives() {
    let (host, store, dispatcher) = setup(4).await;
    host.fail_removals(true);

    let pending = dispatcher.apply_optimistic(&store, Intent::Close(2));
    assert_eq!(store.ids(), vec![1, 3, 4]);

    let confirmation = dispatcher.confirm(&store, pending).await;

    assert_eq!(confirmation, Confirmation::Reverted(vec![2]));
    assert!(confirmation.changed_store());
    assert_eq!(store.ids(), vec![1, 2, 3, 4]);
    assert_eq!(store.with(|s| s.active_id()), Some(4));
}

#[tokio::test]
async fn test_close_of_untracked_tab_fails_without_revert() {
    let (host, store, dispatcher) = setup(2).await;
    let untracked = host.open_tab("https://untracked", 1, false);
    host.fail_removals(true);

    let pending = dispatcher.apply_optimistic(&store, Intent::Close(untracked));
    assert!(!pending.changed_store());
    let confirmation = dispatcher.confirm(&store, pending).await;

    assert!(matches!(confirmation, Confirmation::Failed(_)));
    assert!(!confirmation.changed_store());
    assert_eq!(store.ids(), vec![1, 2]);
    assert!(host.tab_ids().contains(&untracked));
}

#[tokio::test]
async fn test_reverted_active_tab_becomes_active_again() {
    let (host, store, dispatcher) = setup(3).await;
    host.fail_removals(true);

    let pending = dispatcher.apply_optimistic(&store, Intent::Close(3));
    assert_eq!(store.with(|s| s.active_id()), None);

    dispatcher.confirm(&store, pending).await;
    assert_eq!(store.with(|s| s.active_id()), Some(3));
}

// ─── Close others ───

#[tokio::test]
async fn test_close_others_collapses_store_to_kept_tab() {
    let (host, store, dispatcher) = setup(4).await;

    let pending = dispatcher.apply_optimistic(&store, Intent::CloseOthers(3));
    assert_eq!(store.ids(), vec![3]);
    match &pending {
        PendingIntent::CloseOthers { keep, targets, .. } => {
            assert_eq!(*keep, 3);
            assert_eq!(targets, &vec![1, 2, 4]);
        }
        other => panic!("unexpected pending intent: {:?}", other),
    }

    let confirmation = dispatcher.confirm(&store, pending).await;
    assert_eq!(confirmation, Confirmation::Confirmed);
    assert_eq!(host.tab_ids(), vec![3]);
    assert_eq!(store.ids(), vec![3]);
}

#[tokio::test]
async fn test_close_others_ignores_tab_created_after_targets_are_fixed() {
    let (host, store, dispatcher) = setup(4).await;

    let pending = dispatcher.apply_optimistic(&store, Intent::CloseOthers(3));
    let late = host.open_tab("https://late", 1, false);
    store.with(|s| SnapshotMerger::merge_tab(s, &HostTab::new(late, "https://late")));

    dispatcher.confirm(&store, pending).await;

    assert_eq!(host.tab_ids(), vec![3, late]);
    assert_eq!(store.ids(), vec![3, late]);
}

#[tokio::test]
async fn test_close_others_with_nothing_else_is_a_noop() {
    let (host, store, dispatcher) = setup(1).await;

    let pending = dispatcher.apply_optimistic(&store, Intent::CloseOthers(1));
    assert_eq!(pending, PendingIntent::Noop);
    assert!(!pending.changed_store());

    assert_eq!(dispatcher.confirm(&store, pending).await, Confirmation::Confirmed);
    assert!(host.calls().is_empty());
}

#[tokio::test]
async fn test_close_others_drops_ghost_targets_and_retries() {
    let (host, store, dispatcher) = setup(3).await;
    store.with(|s| s.upsert(TabRecord::from_host(&HostTab::new(50, "https://ghost"))));

    let pending = dispatcher.apply_optimistic(&store, Intent::CloseOthers(3));
    let confirmation = dispatcher.confirm(&store, pending).await;

    assert_eq!(confirmation, Confirmation::GhostsRemoved(vec![50]));
    assert_eq!(host.tab_ids(), vec![3]);
    assert_eq!(store.ids(), vec![3]);
    assert_eq!(
        host.calls(),
        vec![HostCall::Remove(vec![1, 2, 50]), HostCall::Remove(vec![1, 2])]
    );
}

#[tokio::test]
async fn test_close_others_restores_survivors_in_order_on_failure() {
    let (host, store, dispatcher) = setup(4).await;
    host.fail_removals(true);

    let pending = dispatcher.apply_optimistic(&store, Intent::CloseOthers(2));
    let confirmation = dispatcher.confirm(&store, pending).await;

    assert_eq!(confirmation, Confirmation::Reverted(vec![1, 3, 4]));
    assert_eq!(store.ids(), vec![1, 2, 3, 4]);
}

// ─── Switch / New / Duplicate ───

#[tokio::test]
async fn test_switch_does_not_touch_store_optimistically() {
    let (host, store, dispatcher) = setup(3).await;

    let pending = dispatcher.apply_optimistic(&store, Intent::Switch(1));
    assert!(!pending.changed_store());

    assert_eq!(dispatcher.confirm(&store, pending).await, Confirmation::Confirmed);
    assert_eq!(host.active_tab(1), Some(1));
    // The activated event drives the store, not the dispatcher.
    assert_eq!(store.with(|s| s.active_id()), Some(3));
}

#[tokio::test]
async fn test_switch_failure_removes_ghost() {
    let (_host, store, dispatcher) = setup(2).await;
    store.with(|s| s.upsert(TabRecord::from_host(&HostTab::new(42, "https://ghost"))));

    let pending = dispatcher.apply_optimistic(&store, Intent::Switch(42));
    let confirmation = dispatcher.confirm(&store, pending).await;

    assert_eq!(confirmation, Confirmation::GhostsRemoved(vec![42]));
    assert_eq!(store.ids(), vec![1, 2]);
}

#[tokio::test]
async fn test_switch_failure_of_any_kind_counts_as_ghost() {
    let (host, store, dispatcher) = setup(2).await;
    host.fail_activations(true);

    let pending = dispatcher.apply_optimistic(&store, Intent::Switch(1));
    let confirmation = dispatcher.confirm(&store, pending).await;

    assert_eq!(confirmation, Confirmation::GhostsRemoved(vec![1]));
    assert_eq!(store.ids(), vec![2]);
    assert_eq!(host.calls(), vec![HostCall::Activate(1)]);
}

#[tokio::test]
async fn test_new_opens_default_location_without_store_change() {
    let (host, store, dispatcher) = setup(1).await;

    let pending = dispatcher.apply_optimistic(&store, Intent::New);
    assert_eq!(dispatcher.confirm(&store, pending).await, Confirmation::Confirmed);

    assert_eq!(host.calls(), vec![HostCall::Create("edge://newtab".to_string())]);
    assert_eq!(host.tab_ids().len(), 2);
    assert_eq!(store.ids(), vec![1]);
}

#[tokio::test]
async fn test_duplicate_failure_is_reported_without_store_change() {
    let (_host, store, dispatcher) = setup(1).await;

    let pending = dispatcher.apply_optimistic(&store, Intent::Duplicate(9));
    let confirmation = dispatcher.confirm(&store, pending).await;

    assert!(matches!(confirmation, Confirmation::Failed(_)));
    assert!(!confirmation.changed_store());
    assert_eq!(store.ids(), vec![1]);
}

#[tokio::test]
async fn test_duplicate_places_copy_after_source() {
    let (host, store, dispatcher) = setup(2).await;

    let pending = dispatcher.apply_optimistic(&store, Intent::Duplicate(1));
    dispatcher.confirm(&store, pending).await;

    assert_eq!(host.tab_ids(), vec![1, 3, 2]);
    assert_eq!(host.active_tab(1), Some(3));
}
