//! State module for tracking crawl progress
//!
//! All mutable state of a single crawl lives here and is shared by every
//! concurrently running traversal task.
//!
//! # Components
//!
//! - `CrawlState`: visited/pending URL sets, the write-back buffer, progress counters
//! - `CrawlStats`: per-outcome counters (with content types broken out)
//! - `Outcome`: why a traversal step ended the way it did

mod crawl_state;
mod stats;

// Re-export main types
pub use crawl_state::CrawlState;
pub use stats::{CrawlStats, Outcome, OutcomeKind};
