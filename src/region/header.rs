use crate::{
    SaveResult,
    ioext::*,
};

use super::coord::RegionCoord;
use super::sector::RegionSector;
use super::timestamp::Timestamp;

use std::{
    io::{Read, Write, SeekFrom},
    ops::{Index, IndexMut},
};

/// Defines the byte offset at which a table's element type is stored in a
/// region file. Implemented for [RegionSector] and [Timestamp].
pub trait RegionTableItem {
    /// The offset in the file that this type's table begins.
    const OFFSET: u64;
}

impl RegionTableItem for RegionSector {
    const OFFSET: u64 = 0;
}

impl RegionTableItem for Timestamp {
    const OFFSET: u64 = 4096;
}

/// One of the two 1024-element header tables of a region file.
#[derive(Debug, Clone)]
pub struct RegionTable<T: RegionTableItem>(Box<[T; 1024]>);

/// The location-entry table in sector 0.
pub type SectorTable = RegionTable<RegionSector>;

/// The timestamp table in sector 1.
pub type TimestampTable = RegionTable<Timestamp>;

/// The 8KiB header at the beginning of every region file.
#[derive(Debug, Clone, Default)]
pub struct RegionHeader {
    /// Where each chunk's sector run lives in the file.
    pub sectors: SectorTable,
    /// The last modification time for each chunk.
    pub timestamps: TimestampTable,
}

impl<T: RegionTableItem> RegionTable<T> {
    pub const OFFSET: u64 = T::OFFSET;

    /// Returns a [SeekFrom] value that will seek to the beginning of the
    /// table.
    pub const fn seeker() -> SeekFrom {
        SeekFrom::Start(Self::OFFSET)
    }

    pub fn iter(&self) -> std::slice::Iter<T> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<T> {
        self.0.iter_mut()
    }
}

impl<T: Default + Copy + RegionTableItem> Default for RegionTable<T> {
    fn default() -> Self {
        Self(Box::new([T::default(); 1024]))
    }
}

impl<C: Into<RegionCoord>, T: RegionTableItem> Index<C> for RegionTable<T> {
    type Output = T;

    fn index(&self, index: C) -> &Self::Output {
        let coord: RegionCoord = index.into();
        &self.0[coord.index()]
    }
}

impl<C: Into<RegionCoord>, T: RegionTableItem> IndexMut<C> for RegionTable<T> {
    fn index_mut(&mut self, index: C) -> &mut Self::Output {
        let coord: RegionCoord = index.into();
        &mut self.0[coord.index()]
    }
}

impl<T: Readable + RegionTableItem> Readable for RegionTable<T> {
    fn read_from<R: Read>(reader: &mut R) -> SaveResult<Self> {
        let table: Vec<T> = (0..1024)
            .map(|_| T::read_from(reader))
            .collect::<SaveResult<Vec<T>>>()?;
        match table.into_boxed_slice().try_into() {
            Ok(table) => Ok(Self(table)),
            Err(_) => unreachable!("exactly 1024 elements were read"),
        }
    }
}

impl<T: Writable + RegionTableItem> Writable for RegionTable<T> {
    fn write_to<W: Write>(&self, writer: &mut W) -> SaveResult<usize> {
        let mut write_size: usize = 0;
        for i in 0..1024 {
            write_size += self.0[i].write_to(writer)?;
        }
        Ok(write_size)
    }
}

impl Readable for RegionHeader {
    fn read_from<R: Read>(reader: &mut R) -> SaveResult<Self> {
        Ok(Self {
            sectors: SectorTable::read_from(reader)?,
            timestamps: TimestampTable::read_from(reader)?,
        })
    }
}

impl Writable for RegionHeader {
    fn write_to<W: Write>(&self, writer: &mut W) -> SaveResult<usize> {
        Ok(self.sectors.write_to(writer)? + self.timestamps.write_to(writer)?)
    }
}
