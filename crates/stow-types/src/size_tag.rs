use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};

/// Element count of a container, written before its elements.
///
/// The wire form is chosen by the archive; the integer itself must survive
/// the round trip exactly. There is no trailing separator, so a reader relies
/// on the count alone to know how many elements follow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SizeTag(u64);

impl SizeTag {
    /// Wrap a raw count.
    pub const fn new(count: u64) -> Self {
        Self(count)
    }

    /// Tag for an in-memory length.
    pub const fn from_len(len: usize) -> Self {
        Self(len as u64)
    }

    /// The raw count.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The count as an in-memory length.
    pub fn to_usize(self) -> TypeResult<usize> {
        usize::try_from(self.0).map_err(|_| TypeError::SizeOverflow(self.0))
    }
}

impl fmt::Display for SizeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for SizeTag {
    fn from(len: usize) -> Self {
        Self::from_len(len)
    }
}
