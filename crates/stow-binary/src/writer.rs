use std::io::Write;

use stow_core::{BinaryOutput, Native, OutputArchive, SaveRegistry, SizeTag, StowResult};
use tracing::debug;

use crate::config::{BinaryConfig, SizeTagEncoding};

/// Magic bytes at the start of a framed archive.
pub const MAGIC: &[u8; 4] = b"STOW";
/// Current wire version.
pub const VERSION: u16 = 1;
/// Magic, version and flags.
pub const HEADER_LEN: usize = 7;

pub(crate) const FLAG_VARINT: u8 = 0b01;
pub(crate) const FLAG_CHECKSUM: u8 = 0b10;

/// Writes values as little-endian scalars into any [`Write`].
///
/// Arithmetic sequences leave as one contiguous block; the bytes are identical
/// to writing each element on its own.
pub struct BinaryOutputArchive<W: Write> {
    writer: W,
    config: BinaryConfig,
    registry: SaveRegistry,
    hasher: Option<crc32fast::Hasher>,
    bytes_written: u64,
}

impl<W: Write> BinaryOutputArchive<W> {
    pub fn new(writer: W) -> StowResult<Self> {
        Self::with_config(writer, BinaryConfig::default())
    }

    pub fn with_config(writer: W, config: BinaryConfig) -> StowResult<Self> {
        let mut archive = Self {
            writer,
            hasher: config.checksum.then(crc32fast::Hasher::new),
            config,
            registry: SaveRegistry::new(),
            bytes_written: 0,
        };
        if archive.config.header {
            archive.write_header()?;
        }
        Ok(archive)
    }

    pub fn binary_config(&self) -> &BinaryConfig {
        &self.config
    }

    /// Bytes written so far, header included, trailer excluded.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Write the checksum trailer (if enabled), flush, and hand back the writer.
    pub fn finish(mut self) -> StowResult<W> {
        if let Some(hasher) = self.hasher.take() {
            let crc = hasher.finalize();
            self.writer.write_all(&crc.to_le_bytes())?;
            debug!(crc, bytes = self.bytes_written, "wrote checksum trailer");
        }
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn write_header(&mut self) -> StowResult<()> {
        let mut flags = 0u8;
        if self.config.size_tags == SizeTagEncoding::Varint {
            flags |= FLAG_VARINT;
        }
        if self.config.checksum {
            flags |= FLAG_CHECKSUM;
        }

        let mut header = [0u8; HEADER_LEN];
        header[..4].copy_from_slice(MAGIC);
        header[4..6].copy_from_slice(&VERSION.to_le_bytes());
        header[6] = flags;
        self.write_bytes(&header)?;

        debug!(version = VERSION, flags, "wrote archive header");
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> StowResult<()> {
        self.writer.write_all(bytes)?;
        if let Some(hasher) = &mut self.hasher {
            hasher.update(bytes);
        }
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }
}

macro_rules! save_le {
    ($($method:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method(&mut self, value: $ty) -> StowResult<()> {
                self.write_bytes(&value.to_le_bytes())
            }
        )*
    };
}

impl<W: Write> OutputArchive for BinaryOutputArchive<W> {
    type Binary = Native;

    fn registry(&mut self) -> &mut SaveRegistry {
        &mut self.registry
    }

    fn save_size_tag(&mut self, tag: SizeTag) -> StowResult<()> {
        match self.config.size_tags {
            SizeTagEncoding::Fixed64 => self.write_bytes(&tag.get().to_le_bytes()),
            SizeTagEncoding::Varint => {
                let mut buf = Vec::with_capacity(10);
                encode_varint(&mut buf, tag.get());
                self.write_bytes(&buf)
            }
        }
    }

    fn save_bool(&mut self, value: bool) -> StowResult<()> {
        self.write_bytes(&[u8::from(value)])
    }

    save_le! {
        save_u8: u8,
        save_u16: u16,
        save_u32: u32,
        save_u64: u64,
        save_i8: i8,
        save_i16: i16,
        save_i32: i32,
        save_i64: i64,
        save_f32: f32,
        save_f64: f64,
    }

    fn save_str(&mut self, value: &str) -> StowResult<()> {
        self.save_size_tag(SizeTag::from_len(value.len()))?;
        self.write_bytes(value.as_bytes())
    }
}

impl<W: Write> BinaryOutput for BinaryOutputArchive<W> {
    fn binary_data(&mut self, bytes: &[u8]) -> StowResult<()> {
        self.write_bytes(bytes)
    }
}

/// Encode a u64 as a variable-length integer.
pub(crate) fn encode_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value > 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}
