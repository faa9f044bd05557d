//! Compression framing used by NBT documents and region chunks.

use std::io::{Read, Write};

use flate2::{
    read::GzDecoder,
    read::ZlibDecoder,
    write::GzEncoder,
    write::ZlibEncoder,
    Compression,
};

use crate::{
    SaveError, SaveResult,
    ioext::*,
};

/// The first two bytes of any gzip stream (RFC 1952).
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Compression scheme used for writing or reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionScheme {
    /// GZip compression is used (RFC 1952).
    GZip,
    /// ZLib compression is used (RFC 1950).
    ZLib,
    /// An unrecognized scheme byte. Readable, never writable.
    Unknown(u8),
}

impl CompressionScheme {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => CompressionScheme::GZip,
            2 => CompressionScheme::ZLib,
            other => CompressionScheme::Unknown(other),
        }
    }

    /// The on-disk scheme code, or an error for [CompressionScheme::Unknown].
    pub fn to_u8(self) -> SaveResult<u8> {
        match self {
            CompressionScheme::GZip => Ok(1),
            CompressionScheme::ZLib => Ok(2),
            CompressionScheme::Unknown(value) => Err(SaveError::InvalidCompressionScheme(value)),
        }
    }
}

impl Readable for CompressionScheme {
    fn read_from<R: Read>(reader: &mut R) -> SaveResult<Self> {
        Ok(Self::from_u8(reader.read_value::<u8>()?))
    }
}

impl Writable for CompressionScheme {
    fn write_to<W: Write>(&self, writer: &mut W) -> SaveResult<usize> {
        writer.write_value(self.to_u8()?)
    }
}

/// Tests whether `bytes` begins with the gzip magic.
pub fn is_gzipped(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0..2] == GZIP_MAGIC
}

/// Decompresses `bytes` according to `scheme`.
pub fn inflate(bytes: &[u8], scheme: CompressionScheme) -> SaveResult<Vec<u8>> {
    let mut output = Vec::new();
    match scheme {
        CompressionScheme::GZip => {
            GzDecoder::new(bytes)
                .read_to_end(&mut output)
                .map_err(|_| SaveError::CorruptStream)?;
        }
        CompressionScheme::ZLib => {
            ZlibDecoder::new(bytes)
                .read_to_end(&mut output)
                .map_err(|_| SaveError::CorruptStream)?;
        }
        CompressionScheme::Unknown(value) => {
            return Err(SaveError::InvalidCompressionScheme(value));
        }
    }
    Ok(output)
}

/// Compresses `bytes` according to `scheme`.
pub fn deflate(bytes: &[u8], scheme: CompressionScheme) -> SaveResult<Vec<u8>> {
    match scheme {
        CompressionScheme::GZip => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(bytes).map_err(|_| SaveError::CompressionFailed)?;
            encoder.finish().map_err(|_| SaveError::CompressionFailed)
        }
        CompressionScheme::ZLib => {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(bytes).map_err(|_| SaveError::CompressionFailed)?;
            encoder.finish().map_err(|_| SaveError::CompressionFailed)
        }
        CompressionScheme::Unknown(value) => Err(SaveError::InvalidCompressionScheme(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_both_schemes() {
        let payload = b"the quick brown fox jumps over the lazy dog".repeat(20);
        for scheme in [CompressionScheme::GZip, CompressionScheme::ZLib] {
            let packed = deflate(&payload, scheme).unwrap();
            assert_ne!(payload, packed);
            let unpacked = inflate(&packed, scheme).unwrap();
            assert_eq!(payload, unpacked);
        }
    }

    #[test]
    fn gzip_magic_detection() {
        let packed = deflate(b"data", CompressionScheme::GZip).unwrap();
        assert!(is_gzipped(&packed));
        let packed = deflate(b"data", CompressionScheme::ZLib).unwrap();
        assert!(!is_gzipped(&packed));
        assert!(!is_gzipped(&[]));
    }

    #[test]
    fn corrupt_stream_is_reported() {
        let garbage = [0xAAu8; 64];
        assert!(matches!(
            inflate(&garbage, CompressionScheme::ZLib),
            Err(SaveError::CorruptStream)
        ));
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        assert!(matches!(
            deflate(b"data", CompressionScheme::Unknown(3)),
            Err(SaveError::InvalidCompressionScheme(3))
        ));
        assert_eq!(CompressionScheme::Unknown(3), CompressionScheme::from_u8(3));
    }
}
