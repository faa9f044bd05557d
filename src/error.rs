use thiserror::Error;

/// The master error type.
#[derive(Debug, Error)]
pub enum SaveError {
	#[error("IO Error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Unexpected end of NBT data.")]
	Truncated,
	#[error("Malformed data: {0}")]
	Malformed(String),
	#[error("Unsupported Tag ID: {0}")]
	UnknownTagId(u8),
	#[error("Encountered the End Tag ID marker.")]
	EndTagMarker,
	#[error("Compressed stream is corrupt.")]
	CorruptStream,
	#[error("Compression failed.")]
	CompressionFailed,
	#[error("Invalid compression scheme value: {0}")]
	InvalidCompressionScheme(u8),
	#[error("Chunk is too large to store in a region file.")]
	ChunkTooLarge,
	#[error("Failed to allocate sectors in region file.")]
	RegionAllocationFailure,
	#[error("Region is not opened for writing.")]
	ReadOnlyRegion,
}

pub type SaveResult<T> = Result<T, SaveError>;

impl SaveError {
	pub fn malformed<T, S: AsRef<str>>(msg: S) -> SaveResult<T> {
		Err(SaveError::Malformed(msg.as_ref().to_owned()))
	}
}
