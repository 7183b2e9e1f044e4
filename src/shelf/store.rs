use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use lazy_static::lazy_static;
use uuid::Uuid;

use super::ShelfError;

/// Computes the next value for a key from its current one; `None` leaves it as is.
pub type Update<'a> =
    Box<dyn FnOnce(Option<String>) -> Result<Option<String>, ShelfError> + 'a>;

/// String values stored by key, the way a browser's local storage holds them.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, ShelfError>;
    fn set(&self, key: &str, value: String) -> Result<(), ShelfError>;
    /// Read-modify-write of one key, atomic with respect to every other call
    /// on the same store.
    fn update(&self, key: &str, f: Update<'_>) -> Result<(), ShelfError>;
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, ShelfError> {
        let entries = self.entries.lock().map_err(|_| ShelfError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), ShelfError> {
        let mut entries = self.entries.lock().map_err(|_| ShelfError::Poisoned)?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn update(&self, key: &str, f: Update<'_>) -> Result<(), ShelfError> {
        let mut entries = self.entries.lock().map_err(|_| ShelfError::Poisoned)?;
        if let Some(next) = f(entries.get(key).cloned())? {
            entries.insert(key.to_string(), next);
        }
        Ok(())
    }
}

lazy_static! {
    // One lock per path, shared by every FileStore in the process.
    static ref FILE_LOCKS: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>> = Mutex::new(HashMap::new());
}

fn lock_for(path: &Path) -> Result<Arc<Mutex<()>>, ShelfError> {
    let mut locks = FILE_LOCKS.lock().map_err(|_| ShelfError::Poisoned)?;
    Ok(locks.entry(path.to_path_buf()).or_default().clone())
}

/// One JSON object on disk mapping keys to string values.
///
/// Every write replaces the whole file through a uniquely named sibling temp
/// file and a rename.
pub struct FileStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, ShelfError> {
        let path = path.into();
        let lock = lock_for(&path)?;
        Ok(Self { path, lock })
    }

    fn load(&self) -> Result<BTreeMap<String, String>, ShelfError> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), ShelfError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let tmp = self
            .path
            .with_extension(format!("tmp.{}", Uuid::new_v4().simple()));
        std::fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, ShelfError> {
        let _guard = self.lock.lock().map_err(|_| ShelfError::Poisoned)?;
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: String) -> Result<(), ShelfError> {
        let _guard = self.lock.lock().map_err(|_| ShelfError::Poisoned)?;
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value);
        self.persist(&entries)
    }

    fn update(&self, key: &str, f: Update<'_>) -> Result<(), ShelfError> {
        let _guard = self.lock.lock().map_err(|_| ShelfError::Poisoned)?;
        let mut entries = self.load()?;
        if let Some(next) = f(entries.get(key).cloned())? {
            entries.insert(key.to_string(), next);
            self.persist(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_get_set() {
        let store = MemoryStore::new();
        assert_eq!(store.get("cartItems").unwrap(), None);
        store.set("cartItems", "[]".into()).unwrap();
        assert_eq!(store.get("cartItems").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("shelf.json");

        let store = FileStore::new(&path).unwrap();
        assert_eq!(store.get("wishlist").unwrap(), None);
        store.set("wishlist", r#"[{"id":1}]"#.into()).unwrap();
        store.set("cartItems", "[]".into()).unwrap();

        let reopened = FileStore::new(&path).unwrap();
        assert_eq!(
            reopened.get("wishlist").unwrap().as_deref(),
            Some(r#"[{"id":1}]"#)
        );
        assert_eq!(reopened.get("cartItems").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn file_store_reports_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shelf.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = FileStore::new(&path).unwrap().get("wishlist").unwrap_err();
        assert!(matches!(err, ShelfError::Json(_)));
    }

    fn bump(store: &dyn KeyValueStore) {
        store
            .update(
                "counter",
                Box::new(|raw: Option<String>| -> Result<Option<String>, ShelfError> {
                    let n: u64 = raw.as_deref().unwrap_or("0").parse().unwrap();
                    Ok(Some((n + 1).to_string()))
                }),
            )
            .unwrap();
    }

    #[test]
    fn update_skips_write_when_closure_returns_none() {
        let store = MemoryStore::new();
        let keep: Update<'_> = Box::new(|_| Ok(None));
        store.update("wishlist", keep).unwrap();
        assert_eq!(store.get("wishlist").unwrap(), None);
    }

    #[test]
    fn file_store_updates_from_separate_instances_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shelf.json");

        std::thread::scope(|s| {
            for _ in 0..4 {
                let path = &path;
                s.spawn(move || {
                    let store = FileStore::new(path).unwrap();
                    for _ in 0..25 {
                        bump(&store);
                    }
                });
            }
        });

        let store = FileStore::new(&path).unwrap();
        assert_eq!(store.get("counter").unwrap().as_deref(), Some("100"));
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
