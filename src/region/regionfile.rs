use std::{
	fs::File,
	io::{
		BufWriter, Cursor,
		Seek, Write,
	},
	path::{Path, PathBuf},
};

use memmap2::Mmap;

use crate::{
	SaveError, SaveResult,
	compress::{self, CompressionScheme},
	ioext::*,
	nbt::NbtDocument,
	region::{pad_size, required_sectors},
};

use super::{
	coord::RegionCoord,
	header::{RegionHeader, SectorTable, TimestampTable},
	sector::RegionSector,
	sectormanager::SectorManager,
	timestamp::Timestamp,
};

/// The largest chunk payload that fits a slot: a run is at most 255
/// sectors, and 5 bytes of every run go to the length and scheme fields.
const MAX_PAYLOAD: usize = 255 * 4096 - 5;

/// A chunk write staged in memory until the next flush.
enum PendingWrite {
	Chunk {
		data: Vec<u8>,
		scheme: CompressionScheme,
		timestamp: Timestamp,
	},
	Clear,
}

/// One chunk captured for rewriting the file.
struct StagedChunk {
	data: Vec<u8>,
	scheme: u8,
	timestamp: Timestamp,
}

/// A region file open for random chunk access.
///
/// Reads come straight out of a read-only memory map of the file. Writes
/// are staged in memory (read-your-writes through every accessor) and hit
/// the disk only on [RegionFile::flush], which lays the surviving chunks
/// back out densely and replaces the file through a sibling temp file.
/// Dropping the handle discards any unflushed writes.
pub struct RegionFile {
	path: PathBuf,
	write_mode: bool,
	map: Option<Mmap>,
	header: RegionHeader,
	sector_manager: SectorManager,
	pending: Vec<Option<PendingWrite>>,
}

impl RegionFile {
	/// Opens the region file at `path`. With `write_mode`, a missing file
	/// is created with an empty 8KiB header; without it the file must
	/// exist, and [RegionFile::set_chunk]/[RegionFile::clear_chunk] are
	/// rejected.
	pub fn open<P: AsRef<Path>>(path: P, write_mode: bool) -> SaveResult<Self> {
		let path = path.as_ref().to_path_buf();
		if write_mode && !path.is_file() {
			let file = File::options().write(true).create(true).open(&path)?;
			let mut writer = BufWriter::new(file);
			writer.write_zeroes(4096 * 2)?;
			writer.flush()?;
		}
		let mut region = Self {
			path,
			write_mode,
			map: None,
			header: RegionHeader::default(),
			sector_manager: SectorManager::new(),
			pending: (0..1024).map(|_| None).collect(),
		};
		region.load()?;
		Ok(region)
	}

	/// (Re)maps the file and rebuilds the header tables and the sector
	/// occupancy picture. A file shorter than the 8KiB header (including
	/// an empty one) reads as all-empty tables.
	fn load(&mut self) -> SaveResult<()> {
		let file = File::open(&self.path)?;
		let length = file.metadata()?.len();
		self.map = if length == 0 {
			None
		} else {
			Some(unsafe { Mmap::map(&file)? })
		};
		self.header = match &self.map {
			Some(map) if map.len() >= 4096 * 2 => {
				RegionHeader::read_from(&mut Cursor::new(&map[..4096 * 2]))?
			}
			_ => RegionHeader::default(),
		};
		self.sector_manager = SectorManager::from_table(&self.header.sectors);
		Ok(())
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn is_writable(&self) -> bool {
		self.write_mode
	}

	/// The free-sector picture built from the current header.
	pub fn sector_manager(&self) -> &SectorManager {
		&self.sector_manager
	}

	/// The payload and raw scheme byte of a chunk as stored in the file,
	/// ignoring staged writes. `None` for empty slots and for slots whose
	/// claims don't hold up (those are logged and read as empty).
	fn stored_chunk(&self, coord: RegionCoord) -> Option<(&[u8], u8)> {
		let sector = self.header.sectors[coord];
		if sector.is_empty() {
			return None;
		}
		let map = self.map.as_deref()?;
		let start = sector.offset() as usize;
		let end = (sector.end_offset() as usize).min(map.len());
		if start + 5 > end {
			log::warn!("chunk {} claims sectors beyond the end of the file", coord);
			return None;
		}
		let length = u32::from_be_bytes(map[start..start + 4].try_into().unwrap()) as usize;
		if length == 0 {
			// A claimed run with nothing in it. Treated as empty.
			return None;
		}
		let payload_end = start + 4 + length;
		if payload_end > end {
			log::warn!("chunk {} length field overruns its sector run", coord);
			return None;
		}
		Some((&map[start + 5..payload_end], map[start + 4]))
	}

	/// The slot's location entry as recorded in the header. Staged writes
	/// have no sectors until the next flush.
	pub fn get_sector<C: Into<RegionCoord>>(&self, coord: C) -> RegionSector {
		let coord: RegionCoord = coord.into();
		self.header.sectors[coord]
	}

	/// The chunk's timestamp; zero for an empty slot.
	pub fn get_timestamp<C: Into<RegionCoord>>(&self, coord: C) -> Timestamp {
		let coord: RegionCoord = coord.into();
		match &self.pending[coord.index()] {
			Some(PendingWrite::Chunk { timestamp, .. }) => *timestamp,
			Some(PendingWrite::Clear) => Timestamp::default(),
			None => self.header.timestamps[coord],
		}
	}

	/// Whether the slot holds a chunk, by the timestamp convention: a slot
	/// with a zero timestamp counts as absent even if it claims storage.
	pub fn contains_chunk<C: Into<RegionCoord>>(&self, coord: C) -> bool {
		!self.get_timestamp(coord).is_zero()
	}

	/// The chunk's compressed payload length in bytes; zero for an empty
	/// slot.
	pub fn get_length<C: Into<RegionCoord>>(&self, coord: C) -> u32 {
		let coord: RegionCoord = coord.into();
		match &self.pending[coord.index()] {
			Some(PendingWrite::Chunk { data, .. }) => data.len() as u32,
			Some(PendingWrite::Clear) => 0,
			None => self.stored_chunk(coord).map(|(data, _)| data.len() as u32).unwrap_or(0),
		}
	}

	/// The chunk's compression scheme; `None` for an empty slot, and
	/// [CompressionScheme::Unknown] for an unrecognized scheme byte.
	pub fn get_compression<C: Into<RegionCoord>>(&self, coord: C) -> Option<CompressionScheme> {
		let coord: RegionCoord = coord.into();
		match &self.pending[coord.index()] {
			Some(PendingWrite::Chunk { scheme, .. }) => Some(*scheme),
			Some(PendingWrite::Clear) => None,
			None => self.stored_chunk(coord).map(|(_, scheme)| CompressionScheme::from_u8(scheme)),
		}
	}

	/// The chunk's raw compressed payload: the staged buffer if the slot
	/// has a pending write, otherwise a view into the mapped file. The
	/// borrow is valid until the next mutating call on this handle.
	pub fn get_data<C: Into<RegionCoord>>(&self, coord: C) -> Option<&[u8]> {
		let coord: RegionCoord = coord.into();
		match &self.pending[coord.index()] {
			Some(PendingWrite::Chunk { data, .. }) => Some(data),
			Some(PendingWrite::Clear) => None,
			None => self.stored_chunk(coord).map(|(data, _)| data),
		}
	}

	/// Inflates and parses the chunk into an [NbtDocument].
	pub fn read_document<C: Into<RegionCoord>>(&self, coord: C) -> SaveResult<Option<NbtDocument>> {
		let coord: RegionCoord = coord.into();
		let (data, scheme) = match (self.get_data(coord), self.get_compression(coord)) {
			(Some(data), Some(scheme)) => (data, scheme),
			_ => return Ok(None),
		};
		let raw = compress::inflate(data, scheme)?;
		Ok(Some(NbtDocument::parse(&raw)?))
	}

	/// Stages a chunk write with the current wall-clock timestamp. The
	/// payload is copied; it must already be compressed with `scheme`.
	pub fn set_chunk<C: Into<RegionCoord>>(
		&mut self,
		coord: C,
		data: &[u8],
		scheme: CompressionScheme,
	) -> SaveResult<()> {
		self.set_chunk_timestamped(coord, data, scheme, Timestamp::utc_now())
	}

	/// Stages a chunk write with an explicit timestamp.
	pub fn set_chunk_timestamped<C: Into<RegionCoord>, T: Into<Timestamp>>(
		&mut self,
		coord: C,
		data: &[u8],
		scheme: CompressionScheme,
		timestamp: T,
	) -> SaveResult<()> {
		if !self.write_mode {
			return Err(SaveError::ReadOnlyRegion);
		}
		// Reject unknown schemes and oversized payloads up front.
		scheme.to_u8()?;
		if data.len() > MAX_PAYLOAD {
			return Err(SaveError::ChunkTooLarge);
		}
		let coord: RegionCoord = coord.into();
		self.pending[coord.index()] = Some(PendingWrite::Chunk {
			data: data.to_vec(),
			scheme,
			timestamp: timestamp.into(),
		});
		Ok(())
	}

	/// Stages the slot to be emptied.
	pub fn clear_chunk<C: Into<RegionCoord>>(&mut self, coord: C) -> SaveResult<()> {
		if !self.write_mode {
			return Err(SaveError::ReadOnlyRegion);
		}
		let coord: RegionCoord = coord.into();
		self.pending[coord.index()] = Some(PendingWrite::Clear);
		Ok(())
	}

	/// Commits staged writes. The surviving chunks are laid back out
	/// densely from sector 2 in slot order, written to a sibling temp
	/// file together with a fresh header, and the temp file replaces the
	/// original. Afterwards the file is re-mapped and the staged writes
	/// are dropped. On failure nothing is replaced and the staged writes
	/// are kept.
	///
	/// On a read-only handle this just re-reads the file, picking up
	/// external changes.
	pub fn flush(&mut self) -> SaveResult<()> {
		if !self.write_mode {
			self.map = None;
			return self.load();
		}

		// Snapshot every surviving chunk, applying the staged overrides.
		let mut chunks: Vec<Option<StagedChunk>> = Vec::with_capacity(1024);
		for index in 0..1024usize {
			let coord = RegionCoord::from(index);
			let staged = match &self.pending[index] {
				Some(PendingWrite::Chunk { data, scheme, timestamp }) => Some(StagedChunk {
					data: data.clone(),
					scheme: scheme.to_u8()?,
					timestamp: *timestamp,
				}),
				Some(PendingWrite::Clear) => None,
				None => self.stored_chunk(coord).map(|(data, scheme)| StagedChunk {
					data: data.to_vec(),
					scheme,
					timestamp: self.header.timestamps[coord],
				}),
			};
			chunks.push(staged);
		}

		// Lay the chunks out densely and build the new header.
		let mut manager = SectorManager::new();
		let mut header = RegionHeader::default();
		for (index, chunk) in chunks.iter().enumerate() {
			let Some(chunk) = chunk else { continue };
			let sectors = required_sectors((chunk.data.len() + 5) as u32);
			if sectors > 255 {
				return Err(SaveError::ChunkTooLarge);
			}
			let allocation = manager
				.allocate(sectors as u8)
				.ok_or(SaveError::RegionAllocationFailure)?;
			header.sectors[index] = allocation;
			header.timestamps[index] = chunk.timestamp;
		}

		// Write the replacement file next to the original.
		let directory = self.path
			.parent()
			.filter(|parent| !parent.as_os_str().is_empty())
			.unwrap_or(Path::new("."));
		let temp = tempfile::NamedTempFile::new_in(directory)?;
		{
			let mut writer = BufWriter::new(temp.as_file());
			writer.write_zeroes(4096 * 2)?;
			for (index, chunk) in chunks.iter().enumerate() {
				let Some(chunk) = chunk else { continue };
				let sector: RegionSector = header.sectors[index];
				writer.seek(sector.seeker())?;
				// The stored length counts the scheme byte.
				writer.write_value((chunk.data.len() + 1) as u32)?;
				writer.write_value(chunk.scheme)?;
				writer.write_all(&chunk.data)?;
				writer.write_zeroes(pad_size((chunk.data.len() + 5) as u64))?;
			}
			// Seek back and fill in the header tables.
			writer.seek(SectorTable::seeker())?;
			header.sectors.write_to(&mut writer)?;
			writer.seek(TimestampTable::seeker())?;
			header.timestamps.write_to(&mut writer)?;
			writer.flush()?;
		}
		temp.as_file().sync_all()?;

		// Release the old mapping before replacing the file, then bring
		// the new contents in.
		self.map = None;
		if let Err(err) = temp.persist(&self.path) {
			// Bring the old file back in; the staged writes stay put.
			let _ = self.load();
			return Err(SaveError::Io(err.error));
		}
		self.load()?;
		for slot in self.pending.iter_mut() {
			*slot = None;
		}
		Ok(())
	}
}
