use serde::{Deserialize, Serialize};
use stow_types::SizeTag;

use crate::error::{StowError, StowResult};

/// Limits applied by input archives and the container codec.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Upper bound on the number of elements reserved up front when a
    /// container is decoded. Larger containers still decode; they just grow
    /// as elements arrive.
    pub max_preallocation: usize,
    /// Largest size tag accepted from an archive.
    pub max_size_tag: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            max_preallocation: 64 * 1024,
            max_size_tag: u64::from(u32::MAX),
        }
    }
}

impl ArchiveConfig {
    /// No limit on size tags; reservations still capped.
    pub fn unbounded() -> Self {
        Self {
            max_size_tag: u64::MAX,
            ..Default::default()
        }
    }

    /// Reject a size tag above [`max_size_tag`](Self::max_size_tag).
    pub fn check_size(&self, tag: SizeTag) -> StowResult<SizeTag> {
        if tag.get() > self.max_size_tag {
            return Err(StowError::SizeLimitExceeded {
                size: tag.get(),
                max: self.max_size_tag,
            });
        }
        Ok(tag)
    }

    /// Number of elements worth reserving for a container of `len` elements.
    pub fn reservation(&self, len: usize) -> usize {
        len.min(self.max_preallocation)
    }
}
