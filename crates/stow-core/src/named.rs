//! Named values.
//!
//! A name travels with the next value or node for archives that frame by
//! name; positional archives drop it and rely on order alone.

use crate::archive::{InputArchive, OutputArchive};
use crate::error::StowResult;
use crate::persist::Persist;

/// Key under which shared object ids are written.
pub const ID_KEY: &str = "id";

/// Key under which a newly introduced shared object's payload is written.
pub const DATA_KEY: &str = "data";

/// Save `value` under `name`.
pub fn save_nvp<A, T>(archive: &mut A, name: &'static str, value: &T) -> StowResult<()>
where
    A: OutputArchive,
    T: Persist,
{
    archive.set_next_name(name);
    value.save(archive)
}

/// Load the value saved under `name`.
pub fn load_nvp<A, T>(archive: &mut A, name: &'static str) -> StowResult<T>
where
    A: InputArchive,
    T: Persist,
{
    archive.set_next_name(name);
    T::load(archive)
}
