use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("object index {0} collides with the back-reference flag")]
    IdOutOfRange(u32),

    #[error("size tag {0} does not fit in this platform's usize")]
    SizeOverflow(u64),
}

pub type TypeResult<T> = Result<T, TypeError>;
