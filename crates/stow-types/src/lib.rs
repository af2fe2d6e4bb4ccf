//! Wire-level value types for Stow.
//!
//! These are the small values that every archive back end writes or reads
//! verbatim, independent of how the surrounding object graph is traversed.
//! Every other Stow crate depends on `stow-types`.
//!
//! # Key Types
//!
//! - [`ObjectId`]: Session-local identity of a shared object, with a back-reference flag
//! - [`SizeTag`]: Element count written ahead of a container's elements
//! - [`StrategyChoice`]: The serialization strategy selected for a (type, archive) pair

pub mod error;
pub mod object;
pub mod size_tag;
pub mod strategy;

pub use error::{TypeError, TypeResult};
pub use object::ObjectId;
pub use size_tag::SizeTag;
pub use strategy::StrategyChoice;
