//! On-disk state touched by the HTTP API
//!
//! - `uploads`: browser uploads, stored as `<unix_ts>_<base_name>`
//! - `catalog`: read-only scan of `<recordings>/<session>/metadata.json`

pub mod catalog;
pub mod uploads;

pub use catalog::{CatalogListing, SessionCatalog, METADATA_FILE};
pub use uploads::{sanitize_base_name, stored_file_name, PendingUpload, UploadRecord, UploadStore};
