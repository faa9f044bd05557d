use std::path::Path;

use mcsave::compress::{self, CompressionScheme};
use mcsave::ioext::Writable;
use mcsave::nbt::{NbtDocument, Tag};
use mcsave::region::{RegionFile, RegionHeader, RegionSector, Timestamp};
use mcsave::SaveError;

const SECTOR: u64 = 4096;

fn chunk_document(x: i32, z: i32) -> NbtDocument {
	let mut doc = NbtDocument::new();
	doc.set_name("");
	doc.root_mut().compound_set("xPos", Tag::Int(x));
	doc.root_mut().compound_set("zPos", Tag::Int(z));
	doc
}

fn zlib_chunk(x: i32, z: i32) -> Vec<u8> {
	let raw = chunk_document(x, z).to_bytes().unwrap();
	compress::deflate(&raw, CompressionScheme::ZLib).unwrap()
}

#[test]
fn write_flush_reopen_read() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("r.0.0.mca");

	let payload = zlib_chunk(0, 0);
	{
		let mut region = RegionFile::open(&path, true).unwrap();
		region
			.set_chunk_timestamped((0, 0), &payload, CompressionScheme::ZLib, 1u32)
			.unwrap();
		// Read-your-writes before the flush.
		assert_eq!(Some(&payload[..]), region.get_data((0, 0)));
		assert_eq!(payload.len() as u32, region.get_length((0, 0)));
		assert_eq!(Timestamp::from(1u32), region.get_timestamp((0, 0)));
		region.flush().unwrap();
	}

	let region = RegionFile::open(&path, false).unwrap();
	assert_eq!(Timestamp::from(1u32), region.get_timestamp((0, 0)));
	assert!(region.contains_chunk((0, 0)));
	assert_eq!(Some(CompressionScheme::ZLib), region.get_compression((0, 0)));
	assert_eq!(Some(&payload[..]), region.get_data((0, 0)));

	// Layering inflate + parse over the raw payload gets the chunk back.
	let raw = compress::inflate(region.get_data((0, 0)).unwrap(), CompressionScheme::ZLib).unwrap();
	let doc = NbtDocument::parse(&raw).unwrap();
	assert_eq!(0, doc.find("xPos").unwrap().get_integer());
	assert_eq!(doc, region.read_document((0, 0)).unwrap().unwrap());
}

#[test]
fn sparse_region_stays_dense_on_disk() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("r.0.0.mca");

	let first = zlib_chunk(0, 0);
	let last = zlib_chunk(31, 31);
	{
		let mut region = RegionFile::open(&path, true).unwrap();
		region.set_chunk_timestamped((0, 0), &first, CompressionScheme::ZLib, 10u32).unwrap();
		region.set_chunk_timestamped((31, 31), &last, CompressionScheme::ZLib, 20u32).unwrap();
		region.flush().unwrap();
	}

	// Header plus one sector per chunk: four sectors exactly.
	assert_eq!(4 * SECTOR, std::fs::metadata(&path).unwrap().len());

	let region = RegionFile::open(&path, false).unwrap();
	assert_eq!(Some(&first[..]), region.get_data((0, 0)));
	assert_eq!(Some(&last[..]), region.get_data((31, 31)));
	assert_eq!(Timestamp::from(10u32), region.get_timestamp((0, 0)));
	assert_eq!(Timestamp::from(20u32), region.get_timestamp((31, 31)));

	// The two corner slots land on disjoint sector runs.
	let a = region.get_sector((0, 0));
	let b = region.get_sector((31, 31));
	assert!(!a.intersects(b));

	// Every other slot is empty: zero index entry, zero timestamp.
	for x in 0..32 {
		for z in 0..32 {
			if (x, z) == (0, 0) || (x, z) == (31, 31) {
				continue;
			}
			assert!(region.get_sector((x, z)).is_empty());
			assert!(!region.contains_chunk((x, z)));
			assert_eq!(None, region.get_data((x, z)));
			assert_eq!(0, region.get_length((x, z)));
		}
	}
}

#[test]
fn exact_fit_payload_uses_exact_sectors() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("r.0.0.mca");

	// payload + 5 framing bytes == exactly two sectors.
	let payload = vec![0x55u8; 2 * SECTOR as usize - 5];
	{
		let mut region = RegionFile::open(&path, true).unwrap();
		region.set_chunk_timestamped((3, 4), &payload, CompressionScheme::ZLib, 7u32).unwrap();
		region.flush().unwrap();
	}
	assert_eq!(4 * SECTOR, std::fs::metadata(&path).unwrap().len());

	let region = RegionFile::open(&path, false).unwrap();
	assert_eq!(2, region.get_sector((3, 4)).sector_count());
	assert_eq!(Some(&payload[..]), region.get_data((3, 4)));
}

#[test]
fn clear_chunk_removes_it_from_disk() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("r.0.0.mca");

	let keep = zlib_chunk(1, 0);
	let drop = zlib_chunk(2, 0);
	{
		let mut region = RegionFile::open(&path, true).unwrap();
		region.set_chunk_timestamped((1, 0), &keep, CompressionScheme::ZLib, 5u32).unwrap();
		region.set_chunk_timestamped((2, 0), &drop, CompressionScheme::ZLib, 6u32).unwrap();
		region.flush().unwrap();
	}
	{
		let mut region = RegionFile::open(&path, true).unwrap();
		region.clear_chunk((2, 0)).unwrap();
		// The staged clear is visible before the flush.
		assert_eq!(None, region.get_data((2, 0)));
		assert!(!region.contains_chunk((2, 0)));
		region.flush().unwrap();
	}

	let region = RegionFile::open(&path, false).unwrap();
	assert_eq!(Some(&keep[..]), region.get_data((1, 0)));
	assert_eq!(None, region.get_data((2, 0)));
	assert!(region.get_sector((2, 0)).is_empty());
	// The freed sector is reclaimed: header plus the surviving chunk.
	assert_eq!(3 * SECTOR, std::fs::metadata(&path).unwrap().len());
}

#[test]
fn rewriting_a_chunk_with_larger_data_relays_the_file() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("r.0.0.mca");

	{
		let mut region = RegionFile::open(&path, true).unwrap();
		region.set_chunk_timestamped((0, 0), &[1, 2, 3], CompressionScheme::ZLib, 1u32).unwrap();
		region.set_chunk_timestamped((1, 0), &[9, 9], CompressionScheme::GZip, 1u32).unwrap();
		region.flush().unwrap();
	}
	let big = vec![7u8; SECTOR as usize + 100];
	{
		let mut region = RegionFile::open(&path, true).unwrap();
		region.set_chunk_timestamped((0, 0), &big, CompressionScheme::ZLib, 2u32).unwrap();
		region.flush().unwrap();
	}

	let region = RegionFile::open(&path, false).unwrap();
	assert_eq!(Some(&big[..]), region.get_data((0, 0)));
	assert_eq!(Some(&[9u8, 9][..]), region.get_data((1, 0)));
	assert_eq!(Some(CompressionScheme::GZip), region.get_compression((1, 0)));
	assert_eq!(2, region.get_sector((0, 0)).sector_count());
	assert!(!region.get_sector((0, 0)).intersects(region.get_sector((1, 0))));
}

#[test]
fn read_only_handles_reject_writes() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("r.0.0.mca");
	RegionFile::open(&path, true).unwrap().flush().unwrap();

	let mut region = RegionFile::open(&path, false).unwrap();
	assert!(matches!(
		region.set_chunk((0, 0), &[1], CompressionScheme::ZLib),
		Err(SaveError::ReadOnlyRegion)
	));
	assert!(matches!(
		region.clear_chunk((0, 0)),
		Err(SaveError::ReadOnlyRegion)
	));
	// A read-only flush is just a re-read.
	region.flush().unwrap();
}

#[test]
fn oversized_and_unknown_scheme_writes_are_rejected() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("r.0.0.mca");
	let mut region = RegionFile::open(&path, true).unwrap();

	let too_big = vec![0u8; 255 * SECTOR as usize - 4];
	assert!(matches!(
		region.set_chunk((0, 0), &too_big, CompressionScheme::ZLib),
		Err(SaveError::ChunkTooLarge)
	));
	assert!(matches!(
		region.set_chunk((0, 0), &[1], CompressionScheme::Unknown(3)),
		Err(SaveError::InvalidCompressionScheme(3))
	));
}

/// Hand-writes a region file whose header claims the same sector run for
/// two different slots.
fn write_overlapping_region(path: &Path, payload: &[u8]) {
	let mut header = RegionHeader::default();
	header.sectors[(0, 0)] = RegionSector::new(2, 1);
	header.sectors[(1, 0)] = RegionSector::new(2, 1);
	header.timestamps[(0, 0)] = Timestamp::from(100u32);
	header.timestamps[(1, 0)] = Timestamp::from(200u32);

	let mut bytes = Vec::new();
	header.write_to(&mut bytes).unwrap();
	((payload.len() + 1) as u32).write_to(&mut bytes).unwrap();
	2u8.write_to(&mut bytes).unwrap();
	bytes.extend_from_slice(payload);
	bytes.resize(3 * SECTOR as usize, 0);
	std::fs::write(path, bytes).unwrap();
}

#[test]
fn overlapping_claims_are_readable_and_fixed_by_flush() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("r.0.0.mca");
	let payload = zlib_chunk(0, 0);
	write_overlapping_region(&path, &payload);

	// Read-only: both slots resolve to the shared bytes.
	let region = RegionFile::open(&path, false).unwrap();
	assert_eq!(Some(&payload[..]), region.get_data((0, 0)));
	assert_eq!(Some(&payload[..]), region.get_data((1, 0)));

	// Read-write: a flush re-lays the file without overlap, preserving
	// both payloads.
	let mut region = RegionFile::open(&path, true).unwrap();
	region.flush().unwrap();
	drop(region);

	let region = RegionFile::open(&path, false).unwrap();
	let a = region.get_sector((0, 0));
	let b = region.get_sector((1, 0));
	assert!(!a.is_empty() && !b.is_empty());
	assert!(!a.intersects(b));
	assert_eq!(Some(&payload[..]), region.get_data((0, 0)));
	assert_eq!(Some(&payload[..]), region.get_data((1, 0)));
	assert_eq!(Timestamp::from(100u32), region.get_timestamp((0, 0)));
	assert_eq!(Timestamp::from(200u32), region.get_timestamp((1, 0)));
	assert_eq!(4 * SECTOR, std::fs::metadata(&path).unwrap().len());
}

#[test]
fn dropping_without_flush_discards_staged_writes() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("r.0.0.mca");
	{
		let mut region = RegionFile::open(&path, true).unwrap();
		region.set_chunk_timestamped((5, 5), &[1, 2, 3], CompressionScheme::ZLib, 1u32).unwrap();
		// No flush.
	}
	let region = RegionFile::open(&path, false).unwrap();
	assert_eq!(None, region.get_data((5, 5)));
	assert_eq!(2 * SECTOR, std::fs::metadata(&path).unwrap().len());
}
