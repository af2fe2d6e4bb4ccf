//! Capability resolution.
//!
//! Chooses a [`StrategyChoice`] for a (value type, archive type) pair from
//! associated constants alone. Every branch taken on these constants folds
//! away at compile time.

use std::fmt;

use stow_types::StrategyChoice;

use crate::archive::{BinaryInput, BinaryOutput, InputArchive, OutputArchive};
use crate::error::{StowError, StowResult};
use crate::persist::Persist;

/// Capability witness for archives that write and read byte blocks verbatim.
pub enum Native {}

/// Capability witness for archives without byte-block support.
pub enum Unsupported {}

/// Byte-block writing as seen through an archive's `Binary` witness.
pub trait BinaryWrite<A> {
    const SUPPORTED: bool;

    fn write_block(archive: &mut A, bytes: &[u8]) -> StowResult<()>;
}

/// Byte-block reading as seen through an archive's `Binary` witness.
pub trait BinaryRead<A> {
    const SUPPORTED: bool;

    fn read_block(archive: &mut A, buf: &mut [u8]) -> StowResult<()>;
}

impl<A: BinaryOutput> BinaryWrite<A> for Native {
    const SUPPORTED: bool = true;

    fn write_block(archive: &mut A, bytes: &[u8]) -> StowResult<()> {
        archive.binary_data(bytes)
    }
}

impl<A: BinaryInput> BinaryRead<A> for Native {
    const SUPPORTED: bool = true;

    fn read_block(archive: &mut A, buf: &mut [u8]) -> StowResult<()> {
        archive.load_binary_data(buf)
    }
}

impl<A> BinaryWrite<A> for Unsupported {
    const SUPPORTED: bool = false;

    fn write_block(_archive: &mut A, _bytes: &[u8]) -> StowResult<()> {
        Err(StowError::Capability("binary_data"))
    }
}

impl<A> BinaryRead<A> for Unsupported {
    const SUPPORTED: bool = false;

    fn read_block(_archive: &mut A, _buf: &mut [u8]) -> StowResult<()> {
        Err(StowError::Capability("binary_data"))
    }
}

/// Fixed-width byte layout of a trivially copyable value.
///
/// Implemented only for arithmetic types, always little-endian, so a block of
/// them reads back identically on every platform.
pub struct RawLayout<T> {
    /// Bytes per value.
    pub width: usize,
    pub encode: fn(&T, &mut [u8]),
    pub decode: fn(&[u8]) -> T,
}

impl<T> RawLayout<T> {
    pub const fn new(encode: fn(&T, &mut [u8]), decode: fn(&[u8]) -> T) -> Self {
        Self {
            width: std::mem::size_of::<T>(),
            encode,
            decode,
        }
    }
}

impl<T> Clone for RawLayout<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RawLayout<T> {}

impl<T> fmt::Debug for RawLayout<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawLayout")
            .field("width", &self.width)
            .finish()
    }
}

/// Strategy used when `T` is saved through `A`.
pub const fn resolve_save<T: Persist, A: OutputArchive>() -> StrategyChoice {
    classify(
        T::STRATEGY,
        <A::Binary as BinaryWrite<A>>::SUPPORTED && T::RAW.is_some(),
    )
}

/// Strategy used when `T` is loaded through `A`.
pub const fn resolve_load<T: Persist, A: InputArchive>() -> StrategyChoice {
    classify(
        T::STRATEGY,
        <A::Binary as BinaryRead<A>>::SUPPORTED && T::RAW.is_some(),
    )
}

// Enum projection first, then the raw fast path, then whatever the type
// declares for itself.
const fn classify(declared: StrategyChoice, raw: bool) -> StrategyChoice {
    match declared {
        StrategyChoice::EnumProjected => StrategyChoice::EnumProjected,
        _ if raw => StrategyChoice::RawBytes,
        other => other,
    }
}

pub(crate) fn raw_save_layout<T: Persist, A: OutputArchive>() -> Option<RawLayout<T>> {
    match resolve_save::<T, A>() {
        StrategyChoice::RawBytes => T::RAW,
        _ => None,
    }
}

pub(crate) fn raw_load_layout<T: Persist, A: InputArchive>() -> Option<RawLayout<T>> {
    match resolve_load::<T, A>() {
        StrategyChoice::RawBytes => T::RAW,
        _ => None,
    }
}
