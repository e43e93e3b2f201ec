//! Catalog backend trait definition.

use super::{CatalogEntry, CatalogStats, NewCatalogEntry, PhotoId};
use crate::error::CatalogError;

/// Trait for catalog backends
pub trait CatalogBackend: Send + Sync {
    /// Find the item with this UID
    fn find_by_uid(&self, uid: &str) -> Result<Option<PhotoId>, CatalogError>;

    /// Create an item. Callers check `find_by_uid` first; inserting an
    /// existing UID is an error.
    fn insert(&self, entry: &NewCatalogEntry) -> Result<PhotoId, CatalogError>;

    /// Whether the item already carries this tag
    fn tag_exists(&self, name: &str, photo_id: PhotoId) -> Result<bool, CatalogError>;

    /// Tag an item. Tagging twice is a no-op.
    fn insert_tag(&self, name: &str, photo_id: PhotoId) -> Result<(), CatalogError>;

    /// Tag an item unless it already has the tag.
    ///
    /// Returns `true` if a tag was added.
    fn ensure_tag(&self, name: &str, photo_id: PhotoId) -> Result<bool, CatalogError> {
        if self.tag_exists(name, photo_id)? {
            return Ok(false);
        }
        self.insert_tag(name, photo_id)?;
        Ok(true)
    }

    /// Load a stored item
    fn get(&self, photo_id: PhotoId) -> Result<Option<CatalogEntry>, CatalogError>;

    /// Tags of an item, sorted by name
    fn tags_for(&self, photo_id: PhotoId) -> Result<Vec<String>, CatalogError>;

    /// Get catalog statistics
    fn stats(&self) -> Result<CatalogStats, CatalogError>;
}
