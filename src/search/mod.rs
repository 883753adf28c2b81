pub mod error;
pub mod filter;
pub mod photos;
pub mod sanitize;
pub mod service;
pub mod types;

pub use error::SearchError;
pub use filter::{compile, compile_query, CompiledQuery, FilterExpression};
pub use photos::extract_photos;
pub use sanitize::sanitize;
pub use service::{ConnectionReport, SearchOutcome, SearchService};
pub use types::{PropertyType, RawParams, RawValue, SearchParams};
