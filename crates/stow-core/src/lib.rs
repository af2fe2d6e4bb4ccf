//! Dispatch and identity core of Stow.
//!
//! Stow turns in-memory values, including values reachable through several
//! shared or non-owning references, into an archive representation and back.
//! The byte or text encoding belongs to a pluggable archive back end; this
//! crate decides *how* each type is written and keeps object identity intact.
//!
//! # Strategies
//!
//! Every (value type, archive type) pair resolves to one
//! [`StrategyChoice`], computed from associated constants only:
//!
//! 1. enums implementing [`Enumeration`] are projected onto their underlying
//!    integer, even when wrapped in an adapter such as `Box`;
//! 2. arithmetic values go through a single raw byte block when the archive's
//!    [`OutputArchive::Binary`] witness is [`Native`];
//! 3. everything else is written element by element, or through a
//!    [`Minimal`] hook when the type supplies one.
//!
//! `Rc`, `Arc` and their `Weak` counterparts route through the per-session
//! [`SaveRegistry`]/[`LoadRegistry`] so each shared object is written once and
//! decoded into a single instance.
//!
//! # Design Rules
//!
//! 1. One archive instance is one session; registries are never shared.
//! 2. Every failure is returned to the caller immediately; nothing retries.
//! 3. Decoding never requires `Default`: [`Persist::load`] constructs values.
//! 4. A non-owning reference never introduces an object.

pub mod archive;
pub mod capability;
pub mod config;
pub mod container;
pub mod enumeration;
pub mod error;
pub mod minimal;
pub mod named;
pub mod persist;
pub mod registry;
pub mod shared;

#[cfg(test)]
mod testing;

pub use archive::{BinaryInput, BinaryOutput, InputArchive, OutputArchive};
pub use capability::{
    resolve_load, resolve_save, BinaryRead, BinaryWrite, Native, RawLayout, Unsupported,
};
pub use config::ArchiveConfig;
pub use container::{load_into, save_sequence, AppendContainer};
pub use enumeration::{Enumeration, Underlying};
pub use error::{StowError, StowResult, Violation};
pub use minimal::Minimal;
pub use named::{load_nvp, save_nvp, DATA_KEY, ID_KEY};
pub use persist::Persist;
pub use registry::{Handle, Identity, LoadRegistry, SaveRegistry};
pub use stow_types::{ObjectId, SizeTag, StrategyChoice, TypeError};
