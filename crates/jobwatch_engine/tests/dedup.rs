mod support;

use std::collections::HashSet;
use std::fs;

use jobwatch_engine::DedupStore;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn set(links: &[&str]) -> HashSet<String> {
    links.iter().map(|l| l.to_string()).collect()
}

#[test]
fn missing_file_is_an_empty_store() {
    support::init_logging();
    let dir = tempdir().unwrap();
    let store = DedupStore::new(dir.path().join("posted_jobs.txt"));
    assert!(store.load().unwrap().is_empty());
    assert!(!store.path().exists());
}

#[test]
fn appended_links_survive_a_reload() {
    support::init_logging();
    let dir = tempdir().unwrap();
    let store = DedupStore::new(dir.path().join("data").join("posted_jobs.txt"));

    store.append("https://jobs.example.com/jobs/1").unwrap();
    store.append("  https://jobs.example.com/jobs/2 ").unwrap();

    assert_eq!(
        store.load().unwrap(),
        set(&["https://jobs.example.com/jobs/1", "https://jobs.example.com/jobs/2"])
    );
    assert_eq!(
        fs::read_to_string(store.path()).unwrap(),
        "https://jobs.example.com/jobs/1\nhttps://jobs.example.com/jobs/2\n"
    );
}

#[test]
fn append_starts_a_new_line_after_a_truncated_one() {
    support::init_logging();
    let dir = tempdir().unwrap();
    let path = dir.path().join("posted_jobs.txt");
    fs::write(&path, "https://a.example/1").unwrap();
    let store = DedupStore::new(&path);

    store.append("https://a.example/2").unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "https://a.example/1\nhttps://a.example/2\n"
    );
}

#[test]
fn untidy_file_is_compacted_on_load() {
    support::init_logging();
    let dir = tempdir().unwrap();
    let path = dir.path().join("posted_jobs.txt");
    fs::write(
        &path,
        "https://a.example/1\n\n   https://a.example/2  \nhttps://a.example/1\n\n",
    )
    .unwrap();
    let store = DedupStore::new(&path);

    let links = store.load().unwrap();

    assert_eq!(links, set(&["https://a.example/1", "https://a.example/2"]));
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "https://a.example/1\nhttps://a.example/2\n"
    );
}

#[test]
fn tidy_file_is_left_untouched() {
    support::init_logging();
    let dir = tempdir().unwrap();
    let path = dir.path().join("posted_jobs.txt");
    fs::write(&path, "https://a.example/1\nhttps://a.example/2").unwrap();
    let store = DedupStore::new(&path);

    assert_eq!(store.load().unwrap().len(), 2);
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "https://a.example/1\nhttps://a.example/2"
    );
}

#[test]
fn unreadable_store_is_an_error() {
    support::init_logging();
    let dir = tempdir().unwrap();
    // A directory where the file should be.
    let store = DedupStore::new(dir.path());
    assert!(store.load().is_err());
}
