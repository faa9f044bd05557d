use super::{
	header::SectorTable,
	managedsector::ManagedSector,
	sector::RegionSector,
};

/// Tracks which 4KiB sectors of a region file are free. Holes between
/// claimed runs are kept in a free list; everything past the last claim
/// belongs to the end sector, where allocations land when no hole fits.
pub struct SectorManager {
	unused_sectors: Vec<ManagedSector>,
	end_sector: ManagedSector,
}

impl SectorManager {
	/// A manager for an empty region: nothing allocated beyond the header.
	pub fn new() -> Self {
		Self {
			unused_sectors: Vec::new(),
			end_sector: ManagedSector::end_sector(2),
		}
	}

	/// Builds the occupancy picture from a header's location entries.
	/// Overlapping claims are logged and tolerated; the next rewrite of
	/// the file lays the chunks back out without overlap.
	pub fn from_table(table: &SectorTable) -> Self {
		let mut claims: Vec<ManagedSector> = table
			.iter()
			.map(|sector| ManagedSector::from(*sector))
			.filter(ManagedSector::not_empty)
			.collect();
		claims.sort();

		let mut unused_sectors = Vec::new();
		// Tracks the span covered so far, seeded with the header sectors.
		let mut covered = ManagedSector::HEADER;
		for claim in claims {
			if covered.gap(&claim).is_some() {
				unused_sectors.push(ManagedSector::new(covered.end, claim.start));
			} else if covered.intersects(&claim) {
				log::warn!("overlapping sector claims in region header: {} and {}", covered, claim);
			}
			covered.absorb(claim);
		}
		Self {
			unused_sectors,
			end_sector: ManagedSector::end_sector(covered.end),
		}
	}

	pub fn unused_sectors(&self) -> &[ManagedSector] {
		&self.unused_sectors
	}

	pub fn unused_count(&self) -> usize {
		self.unused_sectors.len()
	}

	pub fn end_sector(&self) -> &ManagedSector {
		&self.end_sector
	}

	/// Allocates a run of `count` sectors: the smallest free hole that
	/// fits, or space at the end of the file. `None` only when the 24-bit
	/// sector range is exhausted.
	#[must_use]
	pub fn allocate(&mut self, count: u8) -> Option<RegionSector> {
		let best = self.unused_sectors
			.iter()
			.enumerate()
			.filter(|(_, sector)| sector.size() >= count as u32)
			.min_by_key(|(_, sector)| sector.size())
			.map(|(index, _)| index);
		match best {
			Some(index) => {
				let mut hole = self.unused_sectors[index];
				let result = hole.allocate(count);
				if hole.is_empty() {
					self.unused_sectors.swap_remove(index);
				} else {
					self.unused_sectors[index] = hole;
				}
				result
			}
			None => self.end_sector.allocate(count),
		}
	}
}

impl Default for SectorManager {
	fn default() -> Self {
		Self::new()
	}
}
