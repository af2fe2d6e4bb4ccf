use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};

/// Identifier of a shared object within one archive session.
///
/// The low 31 bits are the object's index, assigned in first-write order
/// starting from zero. The most-significant bit is the back-reference flag:
///
/// - clear: the object is introduced here and its payload follows;
/// - set: the object was already written (or read) earlier in the session
///   and only the id is present.
///
/// The flag is never part of the index space, so at most
/// [`ObjectId::MAX_INDEX`] + 1 objects can be shared per session.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(u32);

impl ObjectId {
    /// The back-reference flag bit.
    pub const BACK_REFERENCE: u32 = 1 << 31;

    /// Largest index an object may be assigned.
    pub const MAX_INDEX: u32 = Self::BACK_REFERENCE - 1;

    /// A freshly introduced object with the given index.
    pub fn new(index: u32) -> TypeResult<Self> {
        if index & Self::BACK_REFERENCE != 0 {
            return Err(TypeError::IdOutOfRange(index));
        }
        Ok(Self(index))
    }

    /// Reinterpret a raw value read from an archive. Any `u32` is accepted.
    pub const fn from_wire(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw value written to an archive, flag included.
    pub const fn to_wire(self) -> u32 {
        self.0
    }

    /// The object's index with the flag stripped.
    pub const fn index(self) -> u32 {
        self.0 & !Self::BACK_REFERENCE
    }

    /// Returns `true` if the id only refers back to an already-seen object.
    pub const fn is_back_reference(self) -> bool {
        self.0 & Self::BACK_REFERENCE != 0
    }

    /// Returns `true` if the object's payload follows this id.
    pub const fn is_new(self) -> bool {
        !self.is_back_reference()
    }

    /// The same index with the back-reference flag set.
    pub const fn as_back_reference(self) -> Self {
        Self(self.0 | Self::BACK_REFERENCE)
    }

    /// The same index with the back-reference flag cleared.
    pub const fn as_new(self) -> Self {
        Self(self.index())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_back_reference() {
            write!(f, "ObjectId(^{})", self.index())
        } else {
            write!(f, "ObjectId({})", self.index())
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index())
    }
}
