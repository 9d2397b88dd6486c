pub mod client;
pub mod error;
pub mod outcome;

pub use client::{MetafieldClient, PassthroughResponse};
pub use error::MetafieldError;
pub use outcome::{body_excerpt, SyncOutcome};
