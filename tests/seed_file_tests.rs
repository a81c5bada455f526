use epigraph::EpigraphError;
use epigraph::resolver::{candidate_seed_paths, load_from_candidates};
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_json_path(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "epigraph-seedfile-{tag}-{}-{}.json",
        std::process::id(),
        nanos
    ));
    path
}

#[test]
fn marker_objects_are_filtered_out() {
    let path = temp_json_path("markers");
    let payload = json!([
        { "_comment": "header" },
        { "author": "A", "text": "one" },
        { "_comment": "section two" },
        { "author": "B", "text": "two" },
        { "author": "C", "text": "three" }
    ]);
    fs::write(&path, serde_json::to_vec(&payload).expect("serialize")).expect("write seed");

    let entries = load_from_candidates(std::slice::from_ref(&path)).expect("seed loads");
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].text, "one");

    let _ = fs::remove_file(path);
}

#[test]
fn missing_candidates_report_a_distinguishable_failure() {
    let missing = vec![
        temp_json_path("missing-a"),
        temp_json_path("missing-b"),
    ];
    let err = load_from_candidates(&missing).expect_err("nothing to load");
    assert!(matches!(err, EpigraphError::SeedFilesMissing));
}

#[test]
fn unparsable_candidate_falls_through_to_the_next_one() {
    let broken = temp_json_path("broken");
    fs::write(&broken, b"{ not json").expect("write broken seed");

    let valid = temp_json_path("valid");
    fs::write(
        &valid,
        serde_json::to_vec(&json!([{ "author": "A", "text": "kept" }])).expect("serialize"),
    )
    .expect("write valid seed");

    let entries =
        load_from_candidates(&[broken.clone(), valid.clone()]).expect("second candidate parses");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].text, "kept");

    let _ = fs::remove_file(broken);
    let _ = fs::remove_file(valid);
}

#[test]
fn override_path_is_probed_first() {
    let override_path = PathBuf::from("/tmp/custom-quotes.json");
    let candidates = candidate_seed_paths(Some(override_path.as_path()));
    assert_eq!(candidates[0], override_path);
    // The packaged copy is always a candidate.
    assert!(
        candidates
            .iter()
            .any(|p| p.ends_with("database/seed/quotes.json"))
    );
}

#[test]
fn packaged_seed_dataset_is_valid() {
    let candidates = candidate_seed_paths(None);
    let entries = load_from_candidates(&candidates).expect("packaged seed must parse");
    assert!(!entries.is_empty());
    assert!(entries.iter().all(|e| !e.text.is_empty()));
}
