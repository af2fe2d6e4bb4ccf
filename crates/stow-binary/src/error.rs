use stow_core::StowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BinaryError {
    #[error("invalid archive magic: expected {expected}, got {actual}")]
    InvalidMagic { expected: String, actual: String },

    #[error("unsupported archive version: {0}")]
    UnsupportedVersion(u16),

    #[error("unknown header flags: {0:#04x}")]
    UnknownFlags(u8),

    #[error("checksum mismatch: trailer {expected:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { expected: u32, computed: u32 },

    #[error("varint overflow")]
    VarintOverflow,

    #[error("invalid bool byte: {0}")]
    InvalidBool(u8),

    #[error("invalid UTF-8 in string: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

impl From<BinaryError> for StowError {
    fn from(err: BinaryError) -> Self {
        StowError::archive(err)
    }
}

impl BinaryError {
    /// The binary-specific cause of `err`, if it has one.
    pub fn find(err: &StowError) -> Option<&BinaryError> {
        match err {
            StowError::Archive(source) => source.downcast_ref(),
            _ => None,
        }
    }
}

pub type BinaryResult<T> = Result<T, BinaryError>;
