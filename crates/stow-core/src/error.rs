use std::fmt;

use stow_types::{ObjectId, TypeError};
use thiserror::Error;

/// Ways a non-owning reference can break the owner-first ordering rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Violation {
    /// A non-owning reference was saved before any owning reference to the
    /// same object.
    RawSavedBeforeOwner,
    /// A non-owning reference was decoded before an owning reference
    /// introduced the object.
    RawLoadedBeforeOwner,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RawSavedBeforeOwner => f.write_str(
                "non-owning reference saved before an owning reference to the same object",
            ),
            Self::RawLoadedBeforeOwner => f.write_str(
                "non-owning reference decoded before an owning reference introduced the object",
            ),
        }
    }
}

/// Errors produced while saving or loading through an archive.
///
/// Every variant is fatal for the current archive session: nothing in this
/// crate retries or falls back.
#[derive(Debug, Error)]
pub enum StowError {
    /// A non-owning reference broke the owner-first ordering rule.
    #[error("protocol violation at object {id}: {kind}")]
    ProtocolViolation { id: ObjectId, kind: Violation },

    /// A back-reference named an object that was never introduced.
    #[error("object {0} was never introduced in this session")]
    UnregisteredIdentity(ObjectId),

    /// The same object index was introduced twice.
    #[error("object {0} was introduced twice")]
    DuplicateIdentity(ObjectId),

    /// A back-reference resolved to an object of another type.
    #[error("object {id} is not a {expected}")]
    TypeMismatch { id: ObjectId, expected: &'static str },

    /// The owner of a decoded object was dropped before a later reference
    /// to it was resolved.
    #[error("object {0} was dropped before it could be resolved")]
    Expired(ObjectId),

    /// A non-owning reference whose target is already gone was saved.
    #[error("non-owning reference points to a dropped object")]
    DanglingReference,

    /// More shared objects than the id space can address.
    #[error("shared object id space exhausted")]
    IdSpaceExhausted,

    /// The archive ended before the expected data.
    #[error("truncated archive: {0}")]
    Truncated(String),

    /// A size tag above the configured limit.
    #[error("size tag {size} exceeds the limit of {max}")]
    SizeLimitExceeded { size: u64, max: u64 },

    /// Data that is well-framed but cannot represent the requested value.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// An archive primitive was requested that the archive does not offer.
    #[error("archive does not support {0}")]
    Capability(&'static str),

    #[error(transparent)]
    Type(#[from] TypeError),

    /// Failure specific to a concrete archive back end.
    #[error("archive error: {0}")]
    Archive(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StowError {
    /// Wrap a back-end specific error.
    pub fn archive(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Archive(Box::new(source))
    }
}

/// Result alias for archive operations.
pub type StowResult<T> = Result<T, StowError>;
