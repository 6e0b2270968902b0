//! URL handling module for Site-Indexer
//!
//! This module provides base-URL validation for submitted crawl jobs and the
//! same-origin prefix filter applied to every extracted link.

mod matcher;
mod normalize;

// Re-export main functions
pub use matcher::{filter_within_base, is_within_base};
pub use normalize::{parse_base_url, strip_fragment};
