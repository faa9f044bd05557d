use std::io::{
	self,
	Write,
	Read,
	SeekFrom,
};

use crate::{SaveError, SaveResult};

/// Anything that can be serialized into a writer.
/// Returns the number of bytes written.
pub trait Writable {
	fn write_to<W: Write>(&self, writer: &mut W) -> SaveResult<usize>;
}

/// Anything that can be deserialized from a reader.
pub trait Readable: Sized {
	fn read_from<R: Read>(reader: &mut R) -> SaveResult<Self>;
}

/// Types that know where they live in a stream.
pub trait Seekable {
	fn seeker(&self) -> SeekFrom;
}

/// Maps an end-of-stream error to [SaveError::Truncated] so that short
/// input surfaces as a format error rather than a plain IO error.
pub(crate) fn read_exact_or_truncated<R: Read>(reader: &mut R, buf: &mut [u8]) -> SaveResult<()> {
	reader.read_exact(buf).map_err(|err| {
		if err.kind() == io::ErrorKind::UnexpectedEof {
			SaveError::Truncated
		} else {
			SaveError::Io(err)
		}
	})
}

macro_rules! __be_primitive_impls {
	($($type:ty)+) => {
		$(
			impl Readable for $type {
				fn read_from<R: Read>(reader: &mut R) -> SaveResult<Self> {
					let mut buffer = [0u8; std::mem::size_of::<$type>()];
					read_exact_or_truncated(reader, &mut buffer)?;
					Ok(<$type>::from_be_bytes(buffer))
				}
			}

			impl Writable for $type {
				fn write_to<W: Write>(&self, writer: &mut W) -> SaveResult<usize> {
					writer.write_all(&self.to_be_bytes())?;
					Ok(std::mem::size_of::<$type>())
				}
			}
		)+
	};
}

// The wire formats handled by this crate are big-endian throughout.
__be_primitive_impls!(u8 u16 u32 u64 i8 i16 i32 i64 f32 f64);

/// Decodes a 3-byte big-endian unsigned integer.
pub const fn u24_from_be_bytes(bytes: [u8; 3]) -> u32 {
	((bytes[0] as u32) << 16) | ((bytes[1] as u32) << 8) | (bytes[2] as u32)
}

/// Encodes the low 24 bits of `value` as 3 big-endian bytes.
pub const fn u24_to_be_bytes(value: u32) -> [u8; 3] {
	[
		(value >> 16) as u8,
		(value >> 8) as u8,
		value as u8,
	]
}

/// Extension for reading [Readable] values out of any reader.
pub trait ReadExt: Read + Sized {
	fn read_value<T: Readable>(&mut self) -> SaveResult<T> {
		T::read_from(self)
	}
}

impl<R: Read> ReadExt for R {}

/// Extension for writing [Writable] values into any writer.
pub trait WriteExt: Write + Sized {
	fn write_value<T: Writable>(&mut self, value: T) -> SaveResult<usize> {
		value.write_to(self)
	}

	fn write_zeroes(&mut self, count: u64) -> io::Result<u64> {
		write_zeroes(self, count)
	}
}

impl<W: Write> WriteExt for W {}

/// Writes zeroes to a writer.
pub fn write_zeroes<W: Write>(writer: &mut W, count: u64) -> io::Result<u64> {
	const ZEROES: &[u8; 4096] = &[0u8; 4096];
	let mut remainder = count;
	while remainder >= ZEROES.len() as u64 {
		writer.write_all(ZEROES)?;
		remainder -= ZEROES.len() as u64;
	}
	if remainder != 0 {
		writer.write_all(&ZEROES[0..remainder as usize])?;
	}
	Ok(count)
}
