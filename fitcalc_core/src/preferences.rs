//! Preference persistence: the unit-system choice and the last submitted form.
//!
//! Preferences live in a string key-value store. The file-backed store keeps
//! a JSON object on disk. Every write holds an exclusive lock on a sibling
//! `.lock` file from reload to rename, so concurrent writers in any process
//! never drop each other's keys. Missing or corrupt data never surfaces as an
//! error to the calculator; it simply reads as "nothing saved".

use crate::{CalculationRequest, Error, Result, UnitSystem};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Key holding `"metric"` or `"imperial"`
pub const MEASUREMENT_SYSTEM_KEY: &str = "measurementSystem";
/// Key holding the JSON blob of the last successful form
pub const FORM_DATA_KEY: &str = "fitnessFormData";

/// String key-value store that survives process restarts
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

// ============================================================================
// In-memory Store
// ============================================================================

/// Store that keeps everything in memory
#[derive(Clone, Debug, Default)]
pub struct MemoryPreferenceStore {
    entries: BTreeMap<String, String>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.into(), value.into());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

// ============================================================================
// File Store
// ============================================================================

/// JSON file store with shared-lock reads and atomic, locked writes
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FilePreferenceStore {
    /// Open the store at `path`, loading whatever is readable.
    ///
    /// A missing or corrupt file yields an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_entries(&path);
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file that writers lock, e.g. `preferences.json.lock`
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "preferences".into());
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Reload from disk, modify, and save back atomically.
    ///
    /// The writer lock is held across the whole read-modify-write.
    fn update<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        std::fs::create_dir_all(parent_dir(&self.path))?;
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())?;
        lock.lock_exclusive()?;

        let mut entries = load_entries(&self.path);
        f(&mut entries);
        let saved = save_entries(&self.path, &entries);
        let _ = lock.unlock();

        saved?;
        self.entries = entries;
        Ok(())
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.into(), value.into());
        })
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

/// Load entries from a file with shared locking
///
/// Returns an empty map if the file doesn't exist.
/// If the file is unreadable or corrupted, logs a warning and returns an empty map.
fn load_entries(path: &Path) -> BTreeMap<String, String> {
    if !path.exists() {
        tracing::debug!("No preference file at {:?}, starting empty", path);
        return BTreeMap::new();
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("Unable to open preference file {:?}: {}. Ignoring it.", path, e);
            return BTreeMap::new();
        }
    };

    if let Err(e) = file.lock_shared() {
        tracing::warn!("Unable to lock preference file {:?}: {}. Ignoring it.", path, e);
        return BTreeMap::new();
    }

    let mut contents = String::new();
    let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
    let _ = file.unlock();
    if let Err(e) = read {
        tracing::warn!("Failed to read preference file {:?}: {}. Ignoring it.", path, e);
        return BTreeMap::new();
    }

    match serde_json::from_str::<BTreeMap<String, String>>(&contents) {
        Ok(entries) => {
            tracing::debug!("Loaded {} preferences from {:?}", entries.len(), path);
            entries
        }
        Err(e) => {
            tracing::warn!("Failed to parse preference file {:?}: {}. Ignoring it.", path, e);
            BTreeMap::new()
        }
    }
}

/// Save entries to a file with exclusive locking
///
/// Writes to a temp file in the same directory, syncs it, then renames it
/// over the original.
fn save_entries(path: &Path, entries: &BTreeMap<String, String>) -> Result<()> {
    let parent = parent_dir(path);
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        let contents = serde_json::to_string_pretty(entries)?;
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;

    temp.persist(path).map_err(|e| {
        Error::Preference(format!("Failed to replace {:?}: {}", path, e.error))
    })?;

    tracing::debug!("Saved {} preferences to {:?}", entries.len(), path);
    Ok(())
}

fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

// ============================================================================
// Typed Accessors
// ============================================================================

/// The last successful form, as persisted
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedInputs {
    #[serde(flatten)]
    pub request: CalculationRequest,
    pub saved_at: DateTime<Utc>,
}

/// Read the preferred unit system (imperial when absent or invalid)
pub fn load_unit_system<S: PreferenceStore + ?Sized>(store: &S) -> UnitSystem {
    UnitSystem::from_preference(store.get(MEASUREMENT_SYSTEM_KEY).as_deref())
}

pub fn save_unit_system<S: PreferenceStore + ?Sized>(store: &mut S, system: UnitSystem) -> Result<()> {
    store.set(MEASUREMENT_SYSTEM_KEY, system.as_str())?;
    tracing::info!("Measurement system set to {}", system);
    Ok(())
}

/// Read the last saved form, if any.
///
/// A corrupt entry logs a warning and reads as `None`.
pub fn load_saved_inputs<S: PreferenceStore + ?Sized>(store: &S) -> Option<SavedInputs> {
    let raw = store.get(FORM_DATA_KEY)?;
    match serde_json::from_str::<SavedInputs>(&raw) {
        Ok(saved) => Some(saved),
        Err(e) => {
            tracing::warn!("Failed to parse saved form data: {}. Ignoring it.", e);
            None
        }
    }
}

/// Persist a successful request, stamped with the current time
pub fn save_inputs<S: PreferenceStore + ?Sized>(
    store: &mut S,
    request: &CalculationRequest,
) -> Result<SavedInputs> {
    let saved = SavedInputs {
        request: request.clone(),
        saved_at: Utc::now(),
    };
    let json = serde_json::to_string(&saved)?;
    store.set(FORM_DATA_KEY, &json)?;
    tracing::debug!("Saved form data");
    Ok(saved)
}

/// Forget the saved form; the unit preference is kept
pub fn clear_saved_inputs<S: PreferenceStore + ?Sized>(store: &mut S) -> Result<()> {
    store.remove(FORM_DATA_KEY)?;
    tracing::info!("Cleared saved form data");
    Ok(())
}
