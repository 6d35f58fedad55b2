//! Progress persistence: the JSON save file and the shared store handle.
use std::cell::RefCell;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;

use crate::progress::ProgressRecord;

/// File name used when no explicit save path is configured.
pub const DEFAULT_SAVE_FILE: &str = "user_data.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write progress file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode progress record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Backend that reads and writes the whole progress document at once.
pub trait ProgressStorage {
    /// Load the saved record. Never fails: missing or unreadable data yields
    /// [`ProgressRecord::default`].
    fn load(&self) -> ProgressRecord;

    /// Overwrite the saved record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded or written.
    fn save(&self, record: &ProgressRecord) -> Result<(), StoreError>;
}

/// Pretty-printed JSON document at a fixed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for JsonFileStore {
    fn default() -> Self {
        Self::new(DEFAULT_SAVE_FILE)
    }
}

impl ProgressStorage for JsonFileStore {
    fn load(&self) -> ProgressRecord {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!("no progress file at {}, starting fresh", self.path.display());
                return ProgressRecord::default();
            }
            Err(err) => {
                log::warn!(
                    "failed to read progress file {}: {err}; using defaults",
                    self.path.display()
                );
                return ProgressRecord::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            log::warn!(
                "progress file {} is malformed: {err}; using defaults",
                self.path.display()
            );
            ProgressRecord::default()
        })
    }

    fn save(&self, record: &ProgressRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&self.path, json).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// In-memory backend holding the encoded document, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    document: Rc<RefCell<Option<String>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the backend with raw document text, valid or not.
    #[must_use]
    pub fn with_document(raw: impl Into<String>) -> Self {
        Self {
            document: Rc::new(RefCell::new(Some(raw.into()))),
        }
    }

    /// The last document written, if any.
    #[must_use]
    pub fn document(&self) -> Option<String> {
        self.document.borrow().clone()
    }
}

impl ProgressStorage for MemoryStore {
    fn load(&self) -> ProgressRecord {
        self.document
            .borrow()
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default()
    }

    fn save(&self, record: &ProgressRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(record)?;
        *self.document.borrow_mut() = Some(json);
        Ok(())
    }
}

/// Shared handle over one progress record and its backend.
///
/// Cloning the handle shares the same record, so the battle and route
/// sessions always observe each other's changes without re-reading the file.
#[derive(Clone)]
pub struct ProgressStore {
    storage: Rc<dyn ProgressStorage>,
    record: Rc<RefCell<ProgressRecord>>,
}

impl fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressStore")
            .field("record", &self.record.borrow())
            .finish_non_exhaustive()
    }
}

impl ProgressStore {
    /// Load the record from `storage` and wrap both in a shared handle.
    pub fn open(storage: impl ProgressStorage + 'static) -> Self {
        let record = storage.load();
        Self {
            storage: Rc::new(storage),
            record: Rc::new(RefCell::new(record)),
        }
    }

    /// Snapshot of the current record.
    #[must_use]
    pub fn record(&self) -> ProgressRecord {
        self.record.borrow().clone()
    }

    /// Read the current record without cloning it.
    pub fn with_record<R>(&self, f: impl FnOnce(&ProgressRecord) -> R) -> R {
        f(&self.record.borrow())
    }

    /// Mutate the in-memory record. Call [`ProgressStore::commit`] to persist.
    pub fn update<R>(&self, f: impl FnOnce(&mut ProgressRecord) -> R) -> R {
        f(&mut self.record.borrow_mut())
    }

    /// Write the whole record to the backend.
    ///
    /// # Errors
    ///
    /// Returns the backend error. The in-memory record is kept either way.
    pub fn commit(&self) -> Result<(), StoreError> {
        let record = self.record.borrow();
        self.storage.save(&record).inspect_err(|err| {
            log::warn!("progress save failed: {err}");
        })
    }

    /// Discard in-memory changes and re-read the backend.
    pub fn reload(&self) {
        *self.record.borrow_mut() = self.storage.load();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{Inventory, PlayerSnapshot};

    fn temp_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "ecotrail-store-{label}-{}-{}.json",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn missing_file_loads_defaults() {
        let store = JsonFileStore::new(temp_path("missing"));
        assert_eq!(store.load(), ProgressRecord::default());
    }

    #[test]
    fn malformed_file_loads_defaults() {
        let path = temp_path("malformed");
        fs::write(&path, "{ not json").unwrap();
        let store = JsonFileStore::new(&path);
        assert_eq!(store.load(), ProgressRecord::default());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn file_roundtrip_preserves_record() {
        let path = temp_path("roundtrip");
        let store = JsonFileStore::new(&path);
        let record = ProgressRecord {
            total_co2_saved: 7.35,
            game_challenges: 2,
            inventory: Inventory {
                potions: 3,
                iron_sword: 1,
                iron_armor: 0,
            },
            eco_routes_taken: 5,
            player: Some(PlayerSnapshot {
                level: 3,
                exp: 42,
                attack: 26,
                defense: 13,
                max_hp: 130,
                inventory: Inventory {
                    potions: 3,
                    iron_sword: 1,
                    iron_armor: 0,
                },
            }),
        };
        store.save(&record).unwrap();
        assert_eq!(store.load(), record);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn unwritable_path_reports_error() {
        let store = JsonFileStore::new(std::env::temp_dir());
        let err = store.save(&ProgressRecord::default()).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn shared_handles_see_each_other() {
        let backend = MemoryStore::new();
        let battle = ProgressStore::open(backend.clone());
        let routes = battle.clone();
        routes.update(|record| record.game_challenges = 3);
        assert_eq!(battle.record().game_challenges, 3);
        assert!(backend.document().is_none());
        battle.commit().unwrap();
        assert!(backend.document().unwrap().contains("\"game_challenges\": 3"));
    }

    #[test]
    fn reload_discards_uncommitted_changes() {
        let store = ProgressStore::open(MemoryStore::with_document(r#"{"eco_routes_taken": 2}"#));
        store.update(|record| record.eco_routes_taken = 9);
        store.reload();
        assert_eq!(store.with_record(|record| record.eco_routes_taken), 2);
    }

    #[test]
    fn failed_commit_keeps_memory_state() {
        let store = ProgressStore::open(JsonFileStore::new(std::env::temp_dir()));
        store.update(|record| record.game_challenges = 1);
        assert!(store.commit().is_err());
        assert_eq!(store.record().game_challenges, 1);
    }
}
