pub mod client;
pub mod error;

pub use client::{UpstreamClient, USER_AGENT};
pub use error::UpstreamError;
