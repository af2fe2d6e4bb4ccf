//! User-supplied minimal representations.
//!
//! A type implementing [`Minimal`] is written as a single simpler value
//! instead of field by field. Inside containers each element goes through the
//! hook, never through a raw byte block.

use crate::archive::{InputArchive, OutputArchive};
use crate::error::StowResult;
use crate::persist::Persist;

pub trait Minimal: Sized {
    type Repr: Persist;

    fn save_minimal(&self) -> Self::Repr;

    fn load_minimal(repr: Self::Repr) -> StowResult<Self>;
}

pub fn save_minimal<A, M>(archive: &mut A, value: &M) -> StowResult<()>
where
    A: OutputArchive,
    M: Minimal,
{
    value.save_minimal().save(archive)
}

pub fn load_minimal<A, M>(archive: &mut A) -> StowResult<M>
where
    A: InputArchive,
    M: Minimal,
{
    let repr = M::Repr::load(archive)?;
    M::load_minimal(repr)
}

/// Implement [`Persist`](crate::Persist) for [`Minimal`](crate::Minimal) types.
#[macro_export]
macro_rules! persist_minimal {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::Persist for $ty {
            const STRATEGY: $crate::StrategyChoice = $crate::StrategyChoice::UserMinimal;

            fn save<A: $crate::OutputArchive>(&self, archive: &mut A) -> $crate::StowResult<()> {
                $crate::minimal::save_minimal(archive, self)
            }

            fn load<A: $crate::InputArchive>(archive: &mut A) -> $crate::StowResult<Self> {
                $crate::minimal::load_minimal(archive)
            }
        }
    )+};
}
