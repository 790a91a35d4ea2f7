use sposhcli::diff::{ItemCounter, TrackDiff, reconcile};

// Helper to build a track list from short names
fn tracks(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

// Apply the edit the way the remote API would: remove first, then add
fn apply(current: &[String], diff: &TrackDiff) -> Vec<String> {
    let mut result = current.to_vec();
    for uri in &diff.to_remove {
        let position = result
            .iter()
            .position(|t| t == uri)
            .expect("removal of a track that is not present");
        result.remove(position);
    }
    result.extend(diff.to_add.iter().cloned());
    result
}

fn as_multiset(mut tracks: Vec<String>) -> Vec<String> {
    tracks.sort();
    tracks
}

#[test]
fn test_item_counter() {
    let mut counter = ItemCounter::new();
    assert!(!counter.contains(&"a"));

    counter.add("a");
    counter.add("a");
    counter.add("b");
    assert!(counter.contains(&"a"));

    // two units of "a" can be consumed, not three
    assert!(counter.remove(&"a"));
    assert!(counter.remove(&"a"));
    assert!(!counter.remove(&"a"));
    assert!(!counter.contains(&"a"));

    assert!(counter.remove(&"b"));
    assert!(!counter.remove(&"c"));
}

#[test]
fn test_reconcile_identical_lists_is_empty() {
    let x = tracks(&["t1", "t2", "t2", "t3"]);
    let diff = reconcile(&x, &x);
    assert!(diff.is_empty());
    assert_eq!(diff, TrackDiff::default());
}

#[test]
fn test_reconcile_end_to_end_scenario() {
    let current = tracks(&["t1", "t2", "t3"]);
    let desired = tracks(&["t1", "t4"]);

    let diff = reconcile(&current, &desired);

    assert_eq!(diff.to_add, tracks(&["t4"]));
    assert_eq!(diff.to_remove, tracks(&["t2", "t3"]));
    assert_eq!(as_multiset(apply(&current, &diff)), as_multiset(desired));
}

#[test]
fn test_reconcile_respects_duplicates() {
    let current = tracks(&["a", "a", "b"]);
    let desired = tracks(&["a", "b", "b"]);

    let diff = reconcile(&current, &desired);

    // one surplus "a" goes, one missing "b" comes
    assert_eq!(diff.to_add, tracks(&["b"]));
    assert_eq!(diff.to_remove, tracks(&["a"]));
    assert_eq!(as_multiset(apply(&current, &diff)), as_multiset(desired));
}

#[test]
fn test_reconcile_converges_and_is_minimal() {
    let cases: Vec<(Vec<String>, Vec<String>)> = vec![
        (tracks(&[]), tracks(&[])),
        (tracks(&[]), tracks(&["x"])),
        (tracks(&["x"]), tracks(&[])),
        (tracks(&["a", "b", "c"]), tracks(&["c", "b", "a"])),
        (
            tracks(&["a", "a", "a", "b"]),
            tracks(&["a", "b", "b", "c", "c"]),
        ),
        (tracks(&["x", "y", "y", "z"]), tracks(&["y", "q", "x", "y"])),
    ];

    for (current, desired) in cases {
        let diff = reconcile(&current, &desired);

        // applying the edit converges exactly
        assert_eq!(
            as_multiset(apply(&current, &diff)),
            as_multiset(desired.clone()),
            "current={current:?} desired={desired:?}"
        );

        // minimality: only the per-track surplus moves in either direction
        let count = |list: &[String], uri: &String| list.iter().filter(|t| *t == uri).count();

        let mut surplus_adds = 0;
        let mut seen = Vec::new();
        for uri in &desired {
            if seen.contains(uri) {
                continue;
            }
            seen.push(uri.clone());
            surplus_adds += count(&desired, uri).saturating_sub(count(&current, uri));
        }
        let mut surplus_removes = 0;
        let mut seen = Vec::new();
        for uri in &current {
            if seen.contains(uri) {
                continue;
            }
            seen.push(uri.clone());
            surplus_removes += count(&current, uri).saturating_sub(count(&desired, uri));
        }

        assert_eq!(diff.to_add.len(), surplus_adds);
        assert_eq!(diff.to_remove.len(), surplus_removes);
    }
}

#[test]
fn test_reconcile_order_of_first_encounter() {
    let current = tracks(&["r2", "keep", "r1", "r2"]);
    let desired = tracks(&["keep", "n1", "n2"]);

    let diff = reconcile(&current, &desired);

    assert_eq!(diff.to_add, tracks(&["n1", "n2"]));
    assert_eq!(diff.to_remove, tracks(&["r2", "r1", "r2"]));
}
