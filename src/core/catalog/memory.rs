//! In-memory catalog backend for testing.

use super::{CatalogBackend, CatalogEntry, CatalogStats, NewCatalogEntry, PhotoId};
use crate::error::CatalogError;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::RwLock;

#[derive(Default)]
struct State {
    entries: Vec<CatalogEntry>,
    by_uid: HashMap<String, PhotoId>,
    tags: BTreeSet<(PhotoId, String)>,
}

/// In-memory catalog backend
///
/// Useful for testing and scenarios where persistence isn't needed.
#[derive(Default)]
pub struct InMemoryCatalog {
    state: RwLock<State>,
}

impl InMemoryCatalog {
    /// Create a new, empty in-memory catalog
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> CatalogError {
        CatalogError::Poisoned {
            path: PathBuf::from("memory"),
        }
    }
}

impl CatalogBackend for InMemoryCatalog {
    fn find_by_uid(&self, uid: &str) -> Result<Option<PhotoId>, CatalogError> {
        let state = self.state.read().map_err(|_| Self::poisoned())?;
        Ok(state.by_uid.get(uid).copied())
    }

    fn insert(&self, entry: &NewCatalogEntry) -> Result<PhotoId, CatalogError> {
        let mut state = self.state.write().map_err(|_| Self::poisoned())?;

        if state.by_uid.contains_key(&entry.uid) {
            return Err(CatalogError::QueryFailed(format!(
                "UNIQUE constraint failed: photos.uid ({})",
                entry.uid
            )));
        }

        // Ids start at 1 like SQLite rowids
        let id = PhotoId(state.entries.len() as i64 + 1);
        state.entries.push(CatalogEntry::from_new(id, entry));
        state.by_uid.insert(entry.uid.clone(), id);
        Ok(id)
    }

    fn tag_exists(&self, name: &str, photo_id: PhotoId) -> Result<bool, CatalogError> {
        let state = self.state.read().map_err(|_| Self::poisoned())?;
        Ok(state.tags.contains(&(photo_id, name.to_string())))
    }

    fn insert_tag(&self, name: &str, photo_id: PhotoId) -> Result<(), CatalogError> {
        let mut state = self.state.write().map_err(|_| Self::poisoned())?;
        state.tags.insert((photo_id, name.to_string()));
        Ok(())
    }

    fn get(&self, photo_id: PhotoId) -> Result<Option<CatalogEntry>, CatalogError> {
        let state = self.state.read().map_err(|_| Self::poisoned())?;
        Ok(state.entries.iter().find(|e| e.id == photo_id).cloned())
    }

    fn tags_for(&self, photo_id: PhotoId) -> Result<Vec<String>, CatalogError> {
        let state = self.state.read().map_err(|_| Self::poisoned())?;
        Ok(state
            .tags
            .iter()
            .filter(|(id, _)| *id == photo_id)
            .map(|(_, name)| name.clone())
            .collect())
    }

    fn stats(&self) -> Result<CatalogStats, CatalogError> {
        let state = self.state.read().map_err(|_| Self::poisoned())?;
        let distinct: HashSet<&String> = state.tags.iter().map(|(_, name)| name).collect();

        Ok(CatalogStats {
            total_entries: state.entries.len(),
            total_tags: state.tags.len(),
            distinct_tags: distinct.len(),
        })
    }
}
