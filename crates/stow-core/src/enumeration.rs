//! Enum projection.
//!
//! An enum is written as its underlying integer and read back without range
//! validation: any integer an archive holds becomes a value of the enum. Enums
//! that must survive values added by newer producers carry a catch-all
//! variant so that `from_underlying` is total.

use crate::archive::{InputArchive, OutputArchive};
use crate::error::StowResult;
use crate::persist::Persist;

mod sealed {
    pub trait Sealed {}
}

/// Integer types an enum may be projected onto.
pub trait Underlying: Persist + Copy + sealed::Sealed {}

macro_rules! underlying {
    ($($ty:ty),*) => {$(
        impl sealed::Sealed for $ty {}
        impl Underlying for $ty {}
    )*};
}

underlying!(u8, u16, u32, u64, i8, i16, i32, i64);

/// An enum with an explicit conversion to and from its underlying integer.
pub trait Enumeration: Sized {
    type Repr: Underlying;

    fn to_underlying(&self) -> Self::Repr;

    /// Must accept every value of `Repr`, named or not.
    fn from_underlying(repr: Self::Repr) -> Self;
}

/// Save an enum as its underlying integer.
pub fn save_enum<A, E>(archive: &mut A, value: &E) -> StowResult<()>
where
    A: OutputArchive,
    E: Enumeration,
{
    value.to_underlying().save(archive)
}

/// Load an enum from its underlying integer. Unknown values are kept as-is.
pub fn load_enum<A, E>(archive: &mut A) -> StowResult<E>
where
    A: InputArchive,
    E: Enumeration,
{
    let repr = E::Repr::load(archive)?;
    Ok(E::from_underlying(repr))
}

/// Implement [`Persist`](crate::Persist) for [`Enumeration`](crate::Enumeration)
/// types through enum projection.
///
/// ```ignore
/// stow_core::persist_enum!(Level, Opcode);
/// ```
#[macro_export]
macro_rules! persist_enum {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::Persist for $ty {
            const STRATEGY: $crate::StrategyChoice = $crate::StrategyChoice::EnumProjected;

            fn save<A: $crate::OutputArchive>(&self, archive: &mut A) -> $crate::StowResult<()> {
                $crate::enumeration::save_enum(archive, self)
            }

            fn load<A: $crate::InputArchive>(archive: &mut A) -> $crate::StowResult<Self> {
                $crate::enumeration::load_enum(archive)
            }
        }
    )+};
}
