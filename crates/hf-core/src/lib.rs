//! hf-core: stable foundation for hydroflow.
//!
//! Contains:
//! - numeric (water tolerances, float and tag helpers)
//! - ids (stable compact IDs for graph/model objects)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use numeric::*;
