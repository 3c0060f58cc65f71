use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Notification broadcast after a successful write
///
/// `key` is `None` for notifications that carry no key information; those
/// match every subscriber.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub key: Option<String>,
}

/// Durable key-value store with an internal change bus
///
/// The on-disk format is a single JSON object mapping each key to its
/// value's serialized JSON text, one entry per key. A store opened without a
/// backing file ("detached") degrades every read to its fallback and skips
/// writes with a warning.
///
/// Change propagation between consumers of the same key goes through one
/// internal pub/sub bus; there is no external notification source.
pub struct KvStore {
    path: Option<PathBuf>,
    subscribers: Mutex<Vec<(String, Sender<ChangeEvent>)>>,
}

impl KvStore {
    /// Creates a store backed by the file at `path`
    ///
    /// The file does not need to exist yet; it is created by the first write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Creates a store with no durable backend
    ///
    /// Models an environment without persistent storage: reads return their
    /// fallback and writes are skipped.
    pub fn detached() -> Self {
        Self {
            path: None,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Whether this store has a durable backend
    pub fn is_detached(&self) -> bool {
        self.path.is_none()
    }

    /// Reads the value stored under `key`
    ///
    /// Returns `fallback` when the store is detached, when no entry exists,
    /// or when the stored entry fails to deserialize. The malformed case is
    /// logged as a warning; it never propagates upward.
    pub fn read<T: DeserializeOwned>(&self, key: &str, fallback: T) -> T {
        let Some(path) = &self.path else {
            debug!(key, "no durable store available, using fallback");
            return fallback;
        };

        let entries = self.load_entries(path);
        let Some(raw) = entries.get(key) else {
            return fallback;
        };

        match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => {
                warn!(key, %err, "stored entry failed to deserialize, using fallback");
                fallback
            }
        }
    }

    /// Serializes `value` under `key` and notifies subscribers of that key
    ///
    /// When the store is detached the write is skipped with a warning.
    /// Serialization and file-write failures are logged and swallowed; no
    /// notification goes out unless the entry actually reached disk.
    pub fn write<T: Serialize>(&self, key: &str, value: &T) {
        let Some(path) = self.path.clone() else {
            warn!(key, "tried to write but no durable store is available");
            return;
        };

        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(key, %err, "failed to serialize value, write dropped");
                return;
            }
        };

        let mut entries = self.load_entries(&path);
        entries.insert(key.to_string(), raw);

        if let Err(err) = persist_entries(&path, &entries) {
            warn!(key, %err, "failed to write store file");
            return;
        }

        self.notify(Some(key));
    }

    /// Registers a subscriber for change notifications on `key`
    ///
    /// The receiver sees every notification for `key`, plus any notification
    /// broadcast without key information.
    pub fn subscribe(&self, key: &str) -> Receiver<ChangeEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .expect("subscriber list poisoned")
            .push((key.to_string(), tx));
        rx
    }

    /// Broadcasts a change notification on the internal bus
    ///
    /// Subscribers whose receiver has been dropped are pruned along the way.
    pub fn notify(&self, key: Option<&str>) {
        let mut subscribers = self.subscribers.lock().expect("subscriber list poisoned");
        subscribers.retain(|(subscriber_key, tx)| {
            if key.is_some_and(|k| k != subscriber_key.as_str()) {
                return true;
            }
            tx.send(ChangeEvent {
                key: key.map(str::to_string),
            })
            .is_ok()
        });
    }

    fn load_entries(&self, path: &Path) -> HashMap<String, String> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(err) => {
                warn!(path = %path.display(), %err, "failed to read store file, treating as empty");
                return HashMap::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(path = %path.display(), %err, "store file is not valid JSON, treating as empty");
                HashMap::new()
            }
        }
    }
}

fn persist_entries(path: &Path, entries: &HashMap<String, String>) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(entries)?;
    fs::write(path, json)?;
    Ok(())
}

/// In-memory mirror of a single store key
///
/// Starts in a distinct not-yet-hydrated phase so consumers can tell "the
/// first read has not run" apart from "hydrated with the fallback value" and
/// defer rendering real content until the store has actually been consulted.
pub struct Mirror<T> {
    store: Arc<KvStore>,
    key: String,
    fallback: T,
    value: Option<T>,
    events: Receiver<ChangeEvent>,
}

impl<T: Serialize + DeserializeOwned + Clone> Mirror<T> {
    /// Creates an un-hydrated mirror over `key`
    pub fn new(store: Arc<KvStore>, key: impl Into<String>, fallback: T) -> Self {
        let key = key.into();
        let events = store.subscribe(&key);
        Self {
            store,
            key,
            fallback,
            value: None,
            events,
        }
    }

    /// Whether the first read has completed
    pub fn is_hydrated(&self) -> bool {
        self.value.is_some()
    }

    /// Performs a read from the durable store, replacing the mirrored value
    pub fn hydrate(&mut self) -> &T {
        let value = self.store.read(&self.key, self.fallback.clone());
        self.value.insert(value)
    }

    /// The mirrored value, or `None` before hydration
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Drains pending change notifications and re-reads if any arrived
    ///
    /// Returns whether a re-read happened. The mirror's own writes also show
    /// up here, so a refresh after `set` is a harmless no-op re-read.
    pub fn refresh(&mut self) -> bool {
        let pending = self.events.try_iter().count();
        if pending == 0 {
            return false;
        }
        self.hydrate();
        true
    }

    /// Writes through to the durable store and updates the mirror in place
    ///
    /// If the durable write fails the mirror still holds `value`; the store
    /// logs the failure and sends no notification, so nothing claims the
    /// write succeeded.
    pub fn set(&mut self, value: T) {
        self.store.write(&self.key, &value);
        self.value = Some(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(dir: &tempfile::TempDir) -> Arc<KvStore> {
        Arc::new(KvStore::open(dir.path().join("store.json")))
    }

    #[test]
    fn test_read_missing_key_returns_fallback() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);

        let value: Vec<String> = store.read("absent", vec!["fallback".to_string()]);
        assert_eq!(value, vec!["fallback".to_string()]);
    }

    #[test]
    fn test_write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);

        let original = vec!["one".to_string(), "two".to_string()];
        store.write("list", &original);

        let back: Vec<String> = store.read("list", Vec::new());
        assert_eq!(back, original);
    }

    #[test]
    fn test_writes_to_different_keys_do_not_interfere() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);

        store.write("a", &1u32);
        store.write("b", &2u32);

        assert_eq!(store.read("a", 0u32), 1);
        assert_eq!(store.read("b", 0u32), 2);
    }

    #[test]
    fn test_malformed_entry_falls_back_without_panicking() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        // a valid store file whose entry is not valid JSON for the target type
        fs::write(&path, r#"{ "civiclog-requests": "not [ valid json" }"#).unwrap();

        let store = KvStore::open(&path);
        let value: Vec<u32> = store.read("civiclog-requests", vec![7]);
        assert_eq!(value, vec![7]);
    }

    #[test]
    fn test_malformed_store_file_treated_as_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "definitely not json").unwrap();

        let store = KvStore::open(&path);
        let value: u32 = store.read("anything", 42);
        assert_eq!(value, 42);

        // a write still goes through and replaces the corrupt file
        store.write("anything", &5u32);
        assert_eq!(store.read("anything", 0u32), 5);
    }

    #[test]
    fn test_detached_store_degrades_quietly() {
        let store = KvStore::detached();
        assert!(store.is_detached());

        store.write("key", &1u32);
        assert_eq!(store.read("key", 99u32), 99);
    }

    #[test]
    fn test_write_notifies_matching_subscriber_only() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);

        let matching = store.subscribe("watched");
        let other = store.subscribe("unrelated");

        store.write("watched", &1u32);

        let event = matching.try_recv().unwrap();
        assert_eq!(event.key.as_deref(), Some("watched"));
        assert!(other.try_recv().is_err());
    }

    #[test]
    fn test_keyless_notification_reaches_every_subscriber() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);

        let a = store.subscribe("a");
        let b = store.subscribe("b");

        store.notify(None);

        assert!(a.try_recv().is_ok());
        assert!(b.try_recv().is_ok());
    }

    #[test]
    fn test_failed_write_sends_no_notification() {
        // a path whose parent is a file, so the write cannot succeed
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();

        let store = KvStore::open(blocker.join("store.json"));
        let events = store.subscribe("key");

        store.write("key", &1u32);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_mirror_starts_unhydrated() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        store.write("key", &10u32);

        let mut mirror: Mirror<u32> = Mirror::new(Arc::clone(&store), "key", 0);
        assert!(!mirror.is_hydrated());
        assert_eq!(mirror.value(), None);

        mirror.hydrate();
        assert!(mirror.is_hydrated());
        assert_eq!(mirror.value(), Some(&10));
    }

    #[test]
    fn test_mirror_refresh_picks_up_external_write() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);

        let mut mirror: Mirror<u32> = Mirror::new(Arc::clone(&store), "key", 0);
        mirror.hydrate();
        assert_eq!(mirror.value(), Some(&0));

        // another consumer of the same store writes the key
        store.write("key", &33u32);

        assert!(mirror.refresh());
        assert_eq!(mirror.value(), Some(&33));
        // nothing pending on a second refresh
        assert!(!mirror.refresh());
    }

    #[test]
    fn test_mirror_set_writes_through() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);

        let mut mirror: Mirror<Vec<u32>> = Mirror::new(Arc::clone(&store), "key", Vec::new());
        mirror.hydrate();
        mirror.set(vec![1, 2, 3]);

        assert_eq!(mirror.value(), Some(&vec![1, 2, 3]));
        assert_eq!(store.read("key", Vec::<u32>::new()), vec![1, 2, 3]);
    }
}
