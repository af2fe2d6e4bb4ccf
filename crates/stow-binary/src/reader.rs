use std::io::{ErrorKind, Read};

use stow_core::{
    ArchiveConfig, BinaryInput, InputArchive, LoadRegistry, Native, SizeTag, StowError,
    StowResult,
};
use tracing::{debug, warn};

use crate::config::{BinaryConfig, SizeTagEncoding};
use crate::error::{BinaryError, BinaryResult};
use crate::writer::{FLAG_CHECKSUM, FLAG_VARINT, HEADER_LEN, MAGIC, VERSION};

const STRING_CHUNK: usize = 4096;

/// Validate a header and return its version and flags.
fn parse_header(header: &[u8; HEADER_LEN]) -> BinaryResult<(u16, u8)> {
    if &header[..4] != MAGIC {
        return Err(BinaryError::InvalidMagic {
            expected: String::from_utf8_lossy(MAGIC).into_owned(),
            actual: String::from_utf8_lossy(&header[..4]).into_owned(),
        });
    }

    let version = u16::from_le_bytes([header[4], header[5]]);
    if version != VERSION {
        return Err(BinaryError::UnsupportedVersion(version));
    }

    let flags = header[6];
    if flags & !(FLAG_VARINT | FLAG_CHECKSUM) != 0 {
        return Err(BinaryError::UnknownFlags(flags));
    }
    Ok((version, flags))
}

/// Reads values written by [`BinaryOutputArchive`](crate::BinaryOutputArchive).
///
/// A short read anywhere surfaces as [`StowError::Truncated`].
pub struct BinaryInputArchive<R: Read> {
    reader: R,
    config: BinaryConfig,
    registry: LoadRegistry,
    hasher: Option<crc32fast::Hasher>,
    bytes_read: u64,
}

impl<R: Read> BinaryInputArchive<R> {
    pub fn new(reader: R) -> StowResult<Self> {
        Self::with_config(reader, BinaryConfig::default())
    }

    /// Open an archive. With `config.header` set the header is read and
    /// validated immediately, and its flags replace `checksum` and
    /// `size_tags`.
    pub fn with_config(reader: R, config: BinaryConfig) -> StowResult<Self> {
        let mut archive = Self {
            reader,
            config,
            registry: LoadRegistry::new(),
            hasher: None,
            bytes_read: 0,
        };
        if archive.config.header {
            archive.read_header()?;
        } else if archive.config.checksum {
            archive.hasher = Some(crc32fast::Hasher::new());
        }
        Ok(archive)
    }

    pub fn binary_config(&self) -> &BinaryConfig {
        &self.config
    }

    /// Bytes consumed so far, header included.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Verify the checksum trailer (if enabled) and hand back the reader.
    pub fn finish(mut self) -> StowResult<R> {
        if let Some(hasher) = self.hasher.take() {
            let computed = hasher.finalize();
            let expected = u32::from_le_bytes(self.read_array()?);
            if expected != computed {
                warn!(expected, computed, "archive checksum mismatch");
                return Err(BinaryError::ChecksumMismatch { expected, computed }.into());
            }
            debug!(crc = computed, bytes = self.bytes_read, "verified checksum trailer");
        }
        Ok(self.reader)
    }

    fn read_header(&mut self) -> StowResult<()> {
        let header: [u8; HEADER_LEN] = self.read_array()?;
        let (version, flags) = parse_header(&header)?;

        self.config.size_tags = if flags & FLAG_VARINT != 0 {
            SizeTagEncoding::Varint
        } else {
            SizeTagEncoding::Fixed64
        };
        self.config.checksum = flags & FLAG_CHECKSUM != 0;
        if self.config.checksum {
            let mut hasher = crc32fast::Hasher::new();
            hasher.update(&header);
            self.hasher = Some(hasher);
        }

        debug!(version, flags, "read archive header");
        Ok(())
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> StowResult<()> {
        let offset = self.bytes_read;
        let needed = buf.len();
        self.reader.read_exact(buf).map_err(|err| match err.kind() {
            ErrorKind::UnexpectedEof => {
                StowError::Truncated(format!("needed {needed} bytes at offset {offset}"))
            }
            _ => StowError::Io(err),
        })?;
        if let Some(hasher) = &mut self.hasher {
            hasher.update(buf);
        }
        self.bytes_read += needed as u64;
        Ok(())
    }

    fn read_array<const N: usize>(&mut self) -> StowResult<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_bytes(&mut buf)?;
        Ok(buf)
    }

    fn read_varint(&mut self) -> StowResult<u64> {
        let mut value: u64 = 0;
        let mut shift = 0;
        loop {
            let [byte] = self.read_array::<1>()?;
            value |= u64::from(byte & 0x7F) << shift;
            shift += 7;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            if shift >= 64 {
                return Err(BinaryError::VarintOverflow.into());
            }
        }
    }
}

macro_rules! load_le {
    ($($method:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method(&mut self) -> StowResult<$ty> {
                Ok(<$ty>::from_le_bytes(self.read_array()?))
            }
        )*
    };
}

impl<R: Read> InputArchive for BinaryInputArchive<R> {
    type Binary = Native;

    fn registry(&mut self) -> &mut LoadRegistry {
        &mut self.registry
    }

    fn config(&self) -> &ArchiveConfig {
        &self.config.limits
    }

    fn load_size_tag(&mut self) -> StowResult<SizeTag> {
        let count = match self.config.size_tags {
            SizeTagEncoding::Fixed64 => u64::from_le_bytes(self.read_array()?),
            SizeTagEncoding::Varint => self.read_varint()?,
        };
        Ok(SizeTag::new(count))
    }

    fn load_bool(&mut self) -> StowResult<bool> {
        match self.read_array::<1>()? {
            [0] => Ok(false),
            [1] => Ok(true),
            [other] => Err(BinaryError::InvalidBool(other).into()),
        }
    }

    load_le! {
        load_u8: u8,
        load_u16: u16,
        load_u32: u32,
        load_u64: u64,
        load_i8: i8,
        load_i16: i16,
        load_i32: i32,
        load_i64: i64,
        load_f32: f32,
        load_f64: f64,
    }

    fn load_string(&mut self) -> StowResult<String> {
        let tag = self.load_size_tag()?;
        let tag = self.config.limits.check_size(tag)?;
        let len = tag.to_usize()?;

        // A corrupted length must not turn into one huge allocation.
        let mut bytes = Vec::with_capacity(len.min(self.config.limits.max_preallocation));
        let mut chunk = [0u8; STRING_CHUNK];
        let mut remaining = len;
        while remaining > 0 {
            let n = remaining.min(STRING_CHUNK);
            self.read_bytes(&mut chunk[..n])?;
            bytes.extend_from_slice(&chunk[..n]);
            remaining -= n;
        }

        String::from_utf8(bytes).map_err(|err| BinaryError::InvalidUtf8(err).into())
    }
}

impl<R: Read> BinaryInput for BinaryInputArchive<R> {
    fn load_binary_data(&mut self, buf: &mut [u8]) -> StowResult<()> {
        self.read_bytes(buf)
    }
}
