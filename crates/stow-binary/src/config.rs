use serde::{Deserialize, Serialize};
use stow_core::ArchiveConfig;

/// Wire form of size tags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeTagEncoding {
    /// Eight bytes, little-endian.
    #[default]
    Fixed64,
    /// LEB128, one to ten bytes.
    Varint,
}

/// Configuration for binary archives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryConfig {
    /// Write (or expect) the `STOW` magic, version and flags up front. When
    /// present, the header's flags override `checksum` and `size_tags` on
    /// the reading side.
    pub header: bool,
    /// Append a CRC32 of everything written, verified by `finish()`.
    pub checksum: bool,
    /// How size tags are encoded.
    pub size_tags: SizeTagEncoding,
    /// Decoding limits.
    pub limits: ArchiveConfig,
}

impl Default for BinaryConfig {
    fn default() -> Self {
        Self {
            header: true,
            checksum: false,
            size_tags: SizeTagEncoding::Fixed64,
            limits: ArchiveConfig::default(),
        }
    }
}

impl BinaryConfig {
    /// No header, no checksum: the stream is the values and nothing else.
    pub fn bare() -> Self {
        Self {
            header: false,
            ..Default::default()
        }
    }

    /// Header, varint size tags and a CRC32 trailer.
    pub fn compact() -> Self {
        Self {
            header: true,
            checksum: true,
            size_tags: SizeTagEncoding::Varint,
            limits: ArchiveConfig::default(),
        }
    }
}
