//! Property-listing search over an OData real-estate API.
//!
//! [`search::SearchService`] turns untrusted form input into a filtered
//! upstream query, serves repeated queries from [`cache::ResponseCache`] and
//! decorates listings with ordered photo URLs. [`client::ClientSearchController`]
//! sits on the caller side and debounces, de-duplicates and cancels searches
//! while keeping the page URL in sync.

pub mod cache;
pub mod client;
pub mod config;
pub mod models;
pub mod mortgage;
pub mod search;
pub mod upstream;

pub use config::Config;
pub use models::{Listing, SearchReply, SearchResults};
pub use search::{SearchError, SearchService};
