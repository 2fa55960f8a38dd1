use super::*;

fn exercise(store: &dyn KvStore) {
    assert_eq!(store.get("allVideos").unwrap(), None);
    store.set("allVideos", "[]").unwrap();
    assert_eq!(store.get("allVideos").unwrap().as_deref(), Some("[]"));
    store.set("allVideos", "[1]").unwrap();
    assert_eq!(store.get("allVideos").unwrap().as_deref(), Some("[1]"));
    store.remove("allVideos").unwrap();
    store.remove("allVideos").unwrap();
    assert_eq!(store.get("allVideos").unwrap(), None);
}

#[test]
fn memory_store_round_trips() {
    exercise(&MemoryStore::new());
}

#[test]
fn file_store_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path().join("kv")).unwrap();
    exercise(&store);
}

#[test]
fn file_store_persists_across_handles() {
    let dir = tempfile::tempdir().unwrap();
    FileStore::open(dir.path()).unwrap().set("myVideos", "[42]").unwrap();
    let reopened = FileStore::open(dir.path()).unwrap();
    assert_eq!(reopened.get("myVideos").unwrap().as_deref(), Some("[42]"));
    assert!(dir.path().join("myVideos.json").is_file());
}

#[test]
fn file_store_rejects_path_like_keys() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    assert!(store.set("../escape", "x").is_err());
    assert!(store.get("").is_err());
}
