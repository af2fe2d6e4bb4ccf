//! Binary archive back end for Stow.
//!
//! Values are written as fixed-width little-endian scalars; strings and
//! containers carry a size tag first. Arithmetic sequences go out as one raw
//! block, byte-identical to writing their elements one by one.
//!
//! A framed archive starts with a 7-byte header:
//!
//! ```text
//! "STOW" | version: u16 LE | flags: u8 (bit 0 varint size tags, bit 1 CRC32 trailer)
//! ```
//!
//! and, when checksummed, ends with the CRC32 of every preceding byte.

pub mod config;
pub mod error;
pub mod reader;
pub mod writer;

use std::io::{Read, Write};

use stow_core::{InputArchive, OutputArchive, Persist, StowResult};

pub use config::{BinaryConfig, SizeTagEncoding};
pub use error::{BinaryError, BinaryResult};
pub use reader::BinaryInputArchive;
pub use writer::{BinaryOutputArchive, HEADER_LEN, MAGIC, VERSION};

/// Serialize `value` with the default configuration.
pub fn to_bytes<T: Persist>(value: &T) -> StowResult<Vec<u8>> {
    to_bytes_with(value, BinaryConfig::default())
}

pub fn to_bytes_with<T: Persist>(value: &T, config: BinaryConfig) -> StowResult<Vec<u8>> {
    to_writer(Vec::new(), value, config)
}

/// Serialize `value` into `writer` as one session, returning the writer.
pub fn to_writer<W: Write, T: Persist>(writer: W, value: &T, config: BinaryConfig) -> StowResult<W> {
    let mut archive = BinaryOutputArchive::with_config(writer, config)?;
    archive.save(value)?;
    archive.finish()
}

/// Deserialize a value written by [`to_bytes`].
pub fn from_bytes<T: Persist>(bytes: &[u8]) -> StowResult<T> {
    from_bytes_with(bytes, BinaryConfig::default())
}

pub fn from_bytes_with<T: Persist>(bytes: &[u8], config: BinaryConfig) -> StowResult<T> {
    from_reader(bytes, config)
}

/// Deserialize one value from `reader`, verifying the trailer if present.
pub fn from_reader<R: Read, T: Persist>(reader: R, config: BinaryConfig) -> StowResult<T> {
    let mut archive = BinaryInputArchive::with_config(reader, config)?;
    let value = archive.load()?;
    archive.finish()?;
    Ok(value)
}
