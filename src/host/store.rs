//! File-backed note metadata at ~/.location-picker/notes.json.
//!
//! Whole-object writes, last writer wins. A file that cannot be parsed loads
//! as empty and is moved aside to `notes.json.corrupt` before the first
//! write, so its contents are never overwritten.
//! An in-memory store (no path) backs tests and one-off CLI runs.

use super::{HostError, Metadata};
use crate::location::PlaceInfo;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

type Notes = HashMap<String, Metadata>;

#[derive(Default)]
pub struct NoteStore {
    path: Option<PathBuf>,
    notes: Notes,
    /// Set when the file on disk failed to parse and has not been moved yet.
    unreadable: bool,
}

impl NoteStore {
    pub fn load_from(path: PathBuf) -> Self {
        let (notes, unreadable) = match Self::read_file(&path) {
            Ok(notes) => (notes.unwrap_or_default(), false),
            Err(e) => {
                log::warn!("Ignoring unreadable note store {}: {}", path.display(), e);
                (Notes::new(), true)
            }
        };
        Self {
            path: Some(path),
            notes,
            unreadable,
        }
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    /// `Ok(None)` when there is no file to read.
    fn read_file(path: &Path) -> Result<Option<Notes>, serde_json::Error> {
        let Ok(data) = fs::read_to_string(path) else {
            return Ok(None);
        };
        serde_json::from_str(&data).map(Some)
    }

    /// Where an unreadable store is moved before it would be overwritten.
    pub fn quarantine_path(path: &Path) -> PathBuf {
        let mut name = path.file_name().unwrap_or_default().to_os_string();
        name.push(".corrupt");
        path.with_file_name(name)
    }

    pub fn metadata(&self, note_id: &str) -> Option<Metadata> {
        self.notes.get(note_id).cloned()
    }

    /// Replace a note's metadata. Memory only changes once the write succeeds.
    pub fn upsert(&mut self, note_id: &str, metadata: Metadata) -> Result<(), HostError> {
        let mut notes = self.notes.clone();
        notes.insert(note_id.to_string(), metadata);
        self.persist(&notes)?;
        self.notes = notes;
        Ok(())
    }

    /// The saved place, ignoring the empty "no location" marker.
    pub fn location(&self, note_id: &str) -> Option<PlaceInfo> {
        self.notes
            .get(note_id)
            .and_then(PlaceInfo::from_metadata)
            .filter(|p| !p.is_empty())
    }

    pub fn set_location(&mut self, note_id: &str, place: &PlaceInfo) -> Result<(), HostError> {
        let mut metadata = self.metadata(note_id).unwrap_or_default();
        place.write_into(&mut metadata);
        self.upsert(note_id, metadata)
    }

    /// Overwrite the location with `""/0/0`, keeping other metadata.
    pub fn clear_location(&mut self, note_id: &str) -> Result<(), HostError> {
        self.set_location(note_id, &PlaceInfo::empty())
    }

    fn persist(&mut self, notes: &Notes) -> Result<(), HostError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if self.unreadable {
            let aside = Self::quarantine_path(path);
            fs::rename(path, &aside)?;
            log::warn!("Moved unreadable note store to {}", aside.display());
            self.unreadable = false;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(notes)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Coordinate;
    use serde_json::Value;
    use tempfile::TempDir;

    fn test_store() -> (NoteStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.json");
        (NoteStore::load_from(path), dir)
    }

    fn stockholm() -> PlaceInfo {
        PlaceInfo::new("Stockholm", Coordinate::new(59.3293, 18.0686).unwrap())
    }

    #[test]
    fn test_set_and_get_location() {
        let (mut store, _dir) = test_store();
        store.set_location("n1", &stockholm()).unwrap();
        assert_eq!(store.location("n1").unwrap(), stockholm());
        assert!(store.location("n2").is_none());
    }

    #[test]
    fn test_clear_keeps_other_metadata() {
        let (mut store, _dir) = test_store();
        let mut meta = Metadata::new();
        meta.insert("tag".into(), Value::from("travel"));
        store.upsert("n1", meta).unwrap();
        store.set_location("n1", &stockholm()).unwrap();

        store.clear_location("n1").unwrap();
        assert!(store.location("n1").is_none());
        let meta = store.metadata("n1").unwrap();
        assert_eq!(meta["tag"], "travel");
        assert_eq!(meta["name"], "");
        assert_eq!(meta["lat"], 0.0);
    }

    #[test]
    fn test_persistence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("notes.json");
        {
            let mut store = NoteStore::load_from(path.clone());
            store.set_location("n1", &stockholm()).unwrap();
        }
        let store = NoteStore::load_from(path);
        assert_eq!(store.len(), 1);
        assert_eq!(store.location("n1").unwrap().name, "Stockholm");
    }

    #[test]
    fn test_in_memory() {
        let mut store = NoteStore::in_memory();
        store.set_location("n1", &stockholm()).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.json");
        fs::write(&path, "[1, 2").unwrap();
        let store = NoteStore::load_from(path);
        assert!(store.is_empty());
    }

    #[test]
    fn test_corrupt_file_kept_aside_on_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.json");
        let damaged = r#"{"n1": {"name": "Oslo", "lat": 59.91, "lng": 10.75}, "n2": {"name": "Paris", "lat": 48.85, "lng": 2.35}} x"#;
        fs::write(&path, damaged).unwrap();

        let mut store = NoteStore::load_from(path.clone());
        // Reading alone leaves the file where it is.
        assert_eq!(fs::read_to_string(&path).unwrap(), damaged);

        let rome = PlaceInfo::new("Rome", Coordinate::new(41.9, 12.5).unwrap());
        store.set_location("n3", &rome).unwrap();

        let aside = NoteStore::quarantine_path(&path);
        assert_eq!(aside, dir.path().join("notes.json.corrupt"));
        assert_eq!(fs::read_to_string(&aside).unwrap(), damaged);
        let reloaded = NoteStore::load_from(path);
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.location("n3").unwrap(), rome);

        // Later writes do not touch the moved file again.
        store.set_location("n4", &rome).unwrap();
        assert_eq!(fs::read_to_string(&aside).unwrap(), damaged);
    }

    #[test]
    fn test_failed_write_leaves_memory_unchanged() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let mut store = NoteStore::load_from(blocker.join("notes.json"));
        assert!(store.set_location("n1", &stockholm()).is_err());
        assert!(store.location("n1").is_none());
        assert!(store.is_empty());
    }
}
