//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PageState`: the per-URL state machine (discovered, scheduled, fetched, accepted, ...)
//! - `RejectReason`: why a URL was dropped without contributing to the archive
//! - `VisitedSet`: the shared, budget-aware set of scheduled URLs

mod page_state;
mod visited;

pub use page_state::{PageState, RejectReason};
pub use visited::{Admission, VisitedSet};
