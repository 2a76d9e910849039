//! Strongly-typed indices for network records.

mod indices;

pub use indices::{LinkIndex, NodeIndex};
