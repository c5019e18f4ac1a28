//! URL handling module for Spider
//!
//! Pure helpers used by the crawl engine to decide which links to follow:
//! normalization, base-domain extraction, relative link resolution, and the
//! subdomain scope test. None of these touch the network or shared state.

mod domain;
mod normalize;
mod scope;

// Re-export main functions
pub use domain::{authority, base_domain};
pub use normalize::{normalize, resolve};
pub use scope::is_in_scope;
