use mcsave::compound;
use mcsave::nbt::{Map, NbtDocument, Tag};

#[test]
fn document_file_round_trip() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("test.nbt");

	let mut doc = NbtDocument::new();
	doc.set_name("TestNBT");
	doc.root_mut().compound_set("byte", Tag::Byte(0));
	doc.write_to_file(&path).unwrap();

	// Documents on disk are always gzip-framed.
	let on_disk = std::fs::read(&path).unwrap();
	assert_eq!(&[0x1F, 0x8B], &on_disk[0..2]);

	let back = NbtDocument::read_from_file(&path).unwrap();
	assert_eq!("TestNBT", back.name());
	assert_eq!(0, back.root().compound_chain(&["byte"]).unwrap().get_integer());
}

#[test]
fn edit_game_mode_in_place() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("level.dat");

	let mut level = NbtDocument::new();
	level.set_name("");
	let mut data = compound! {
		("LevelName", "world"),
		("GameType", 0i32),
	};
	data.compound_set("abilities", Tag::Compound(Map::new()));
	level.root_mut().compound_set("Data", data);
	level.write_to_file(&path).unwrap();

	// Reopen, flip the game mode, and write the file back.
	let mut level = NbtDocument::read_from_file(&path).unwrap();
	let mode = level.find_mut("GameType").expect("GameType should exist");
	assert_eq!(0, mode.get_integer());
	mode.set_integer(2);
	level.write_to_file(&path).unwrap();

	let level = NbtDocument::read_from_file(&path).unwrap();
	assert_eq!(2, level.find("GameType").unwrap().get_integer());
}

#[test]
fn write_replaces_existing_file() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("doc.nbt");
	std::fs::write(&path, b"not nbt at all").unwrap();

	let mut doc = NbtDocument::new();
	doc.set_name("fresh");
	doc.write_to_file(&path).unwrap();
	assert_eq!("fresh", NbtDocument::read_from_file(&path).unwrap().name());
}

#[test]
fn unreadable_file_is_an_error() {
	let dir = tempfile::tempdir().unwrap();
	let missing = dir.path().join("missing.nbt");
	assert!(NbtDocument::read_from_file(&missing).is_err());
}
