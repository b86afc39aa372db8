use replwarden::core::reconcile::{filter_by_args, filter_deleted, filter_readded};

fn v(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// S1 — Blacklist of a deleted topic.
#[test]
fn blacklist_of_a_deleted_topic() {
    let to_blacklist = filter_deleted(&v(&["a", "b", "c"]), &v(&["x"]), &v(&["a", "b"]), &v(&["a", "b"]));
    let to_whitelist = filter_readded(&v(&["x"]), &v(&["a", "b"]), &v(&["a", "b"]));
    assert_eq!(to_blacklist, v(&["c"]));
    assert!(to_whitelist.is_empty());
}

/// S2 — Whitelist readmission.
#[test]
fn whitelist_readmission() {
    let to_blacklist = filter_deleted(&v(&["a"]), &v(&["y", "z"]), &v(&["a", "y", "z"]), &v(&["a", "y", "z"]));
    let to_whitelist = filter_readded(&v(&["y", "z"]), &v(&["a", "y", "z"]), &v(&["a", "y", "z"]));
    assert!(to_blacklist.is_empty());
    assert_eq!(to_whitelist, v(&["y", "z"]));
}

/// S3 — Empty blacklist short-circuits deletion path.
#[test]
fn empty_blacklist_short_circuits_deletion() {
    let to_blacklist = filter_deleted(&v(&["a", "b", "c"]), &[], &v(&[]), &v(&[]));
    assert!(to_blacklist.is_empty());
}

/// S6 — Filter arguments.
#[test]
fn filter_arguments_narrow_the_dispatch_list() {
    let candidates = v(&["alpha", "beta", "gamma"]);
    let filtered = filter_by_args(&candidates, &v(&["bet.*"]));
    assert_eq!(filtered, v(&["beta"]));
}

/// Invariant 4: filter_deleted result is a subset of configured-minus-the-rest.
#[test]
fn filter_deleted_is_subset_of_configured() {
    let configured = v(&["a", "b", "c", "d"]);
    let blacklisted = v(&["z"]);
    let src = v(&["a"]);
    let dst = v(&["b"]);
    let result = filter_deleted(&configured, &blacklisted, &src, &dst);
    for topic in &result {
        assert!(configured.contains(topic));
        assert!(!blacklisted.contains(topic));
        assert!(!src.contains(topic));
        assert!(!dst.contains(topic));
    }
}

/// Invariant 6: both result lists are sorted ascending.
#[test]
fn result_lists_are_sorted_ascending() {
    let result = filter_deleted(&v(&["c", "a", "b", "d"]), &v(&["x"]), &v(&[]), &v(&[]));
    let mut sorted = result.clone();
    sorted.sort();
    assert_eq!(result, sorted);
}
