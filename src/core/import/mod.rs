//! # Import Module
//!
//! Orchestrates importing a directory tree into the repository.
//!
//! ## Per-file steps
//! 1. **Fingerprint** - Digest of the file's first 64 KiB and length
//! 2. **Date** - EXIF capture time, falling back to the modification time
//! 3. **Resolve** - UID and repository path
//! 4. **Catalog** - Insert if the UID is new, then attach tags
//! 5. **Materialize** - Copy, move or link unless already in place
//!
//! Files are handled one at a time, in walk order. A cancellation request is
//! honored between files.

mod executor;
mod provenance;

pub use executor::{
    CancellationToken, ImportConfig, ImportReport, ImportStatus, Importer, ImporterBuilder,
};
pub use provenance::{original_name, relative_origin};
