//! Archive module: batching, layout and zip output
//!
//! # Layout
//!
//! ```text
//! summary.md                              manifest (always the first entry)
//! web/<host>/index.md                     root page + table of contents
//! web/<host>/pages/<slug>.md              one file per converted page
//! web/<host>/assets/<file>                deduplicated images
//! <category>/<name>.md                    text and data documents
//! <category>/<name>_attachments/<file>    their extra files
//! ```

mod batch;
mod index;
mod layout;
mod manifest;
mod pressure;
mod writer;

pub use batch::{Batch, FlushRecord};
pub use index::{render_index, TocEntry};
pub use layout::{
    asset_file_name, host_dir, page_slug, relative_path, sanitize_name, PathAllocator,
    FALLBACK_NAME,
};
pub use manifest::{ArchiveManifest, FailedPage, ManifestEntry};
pub use pressure::{NoPressure, PressureLevel, ProcessMemoryProbe, ResourceProbe};
pub use writer::{ArchiveArtifact, ArchiveSettings, BatchArchiver, SUMMARY_FILE};
