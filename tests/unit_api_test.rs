use replwarden::core::counter::SharedCounter;

#[tokio::test]
async fn counter_notify_and_get_round_trip() {
    let counter = SharedCounter::new();
    assert_eq!(counter.get().value, -1);

    counter.set(42, "node-a");
    let snap = counter.get();
    assert_eq!(snap.value, 42);
    assert_eq!(snap.meta, "node-a");
    assert_eq!(snap.generation, 1);

    assert!(counter.notify(99, 2, "node-b"));
    assert_eq!(counter.get().value, 99);

    assert!(!counter.notify(1, 1, "stale"));
    assert_eq!(counter.get().value, 99);
}
