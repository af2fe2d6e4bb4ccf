use stow_types::SizeTag;

use crate::capability::{BinaryRead, BinaryWrite};
use crate::config::ArchiveConfig;
use crate::error::StowResult;
use crate::persist::Persist;
use crate::registry::{LoadRegistry, SaveRegistry};

/// The writing half of an archive back end.
///
/// An output archive owns the [`SaveRegistry`] for its session, so one archive
/// instance is one save pass. Structure is communicated with nodes and names;
/// positional formats may ignore both.
pub trait OutputArchive: Sized {
    /// Whether this archive can write contiguous byte blocks verbatim:
    /// [`Native`](crate::Native) or [`Unsupported`](crate::Unsupported).
    ///
    /// `Native` only type-checks when the archive also implements
    /// [`BinaryOutput`].
    type Binary: BinaryWrite<Self>;

    /// Identity table for shared objects written in this session.
    fn registry(&mut self) -> &mut SaveRegistry;

    /// Attach a name to the next value or node. Archives without named
    /// framing keep the default, which ignores it.
    fn set_next_name(&mut self, name: &'static str) {
        let _ = name;
    }

    /// Open a composite value.
    fn start_node(&mut self) -> StowResult<()> {
        Ok(())
    }

    /// Close the composite value opened by the matching [`start_node`](Self::start_node).
    fn finish_node(&mut self) -> StowResult<()> {
        Ok(())
    }

    fn save_size_tag(&mut self, tag: SizeTag) -> StowResult<()>;
    fn save_bool(&mut self, value: bool) -> StowResult<()>;
    fn save_u8(&mut self, value: u8) -> StowResult<()>;
    fn save_u16(&mut self, value: u16) -> StowResult<()>;
    fn save_u32(&mut self, value: u32) -> StowResult<()>;
    fn save_u64(&mut self, value: u64) -> StowResult<()>;
    fn save_i8(&mut self, value: i8) -> StowResult<()>;
    fn save_i16(&mut self, value: i16) -> StowResult<()>;
    fn save_i32(&mut self, value: i32) -> StowResult<()>;
    fn save_i64(&mut self, value: i64) -> StowResult<()>;
    fn save_f32(&mut self, value: f32) -> StowResult<()>;
    fn save_f64(&mut self, value: f64) -> StowResult<()>;
    fn save_str(&mut self, value: &str) -> StowResult<()>;

    /// Save any persistable value.
    fn save<T: Persist>(&mut self, value: &T) -> StowResult<()> {
        value.save(self)
    }
}

/// The reading half of an archive back end. Mirrors [`OutputArchive`].
pub trait InputArchive: Sized {
    /// See [`OutputArchive::Binary`].
    type Binary: BinaryRead<Self>;

    /// Alias table for shared objects read in this session.
    fn registry(&mut self) -> &mut LoadRegistry;

    /// Limits applied while decoding.
    fn config(&self) -> &ArchiveConfig;

    /// Name of the next value or node to read. Positional archives ignore it.
    fn set_next_name(&mut self, name: &'static str) {
        let _ = name;
    }

    fn start_node(&mut self) -> StowResult<()> {
        Ok(())
    }

    fn finish_node(&mut self) -> StowResult<()> {
        Ok(())
    }

    fn load_size_tag(&mut self) -> StowResult<SizeTag>;
    fn load_bool(&mut self) -> StowResult<bool>;
    fn load_u8(&mut self) -> StowResult<u8>;
    fn load_u16(&mut self) -> StowResult<u16>;
    fn load_u32(&mut self) -> StowResult<u32>;
    fn load_u64(&mut self) -> StowResult<u64>;
    fn load_i8(&mut self) -> StowResult<i8>;
    fn load_i16(&mut self) -> StowResult<i16>;
    fn load_i32(&mut self) -> StowResult<i32>;
    fn load_i64(&mut self) -> StowResult<i64>;
    fn load_f32(&mut self) -> StowResult<f32>;
    fn load_f64(&mut self) -> StowResult<f64>;
    fn load_string(&mut self) -> StowResult<String>;

    /// Load any persistable value.
    fn load<T: Persist>(&mut self) -> StowResult<T> {
        T::load(self)
    }
}

/// Verbatim byte-block writing, required for [`Native`](crate::Native)
/// binary support.
///
/// A block must use the same bytes the archive would produce for the same
/// little-endian scalars written one at a time.
pub trait BinaryOutput {
    fn binary_data(&mut self, bytes: &[u8]) -> StowResult<()>;
}

/// Verbatim byte-block reading, required for [`Native`](crate::Native)
/// binary support. Fills `buf` completely or fails.
pub trait BinaryInput {
    fn load_binary_data(&mut self, buf: &mut [u8]) -> StowResult<()>;
}
