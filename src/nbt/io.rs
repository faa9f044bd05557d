//! The NBT wire grammar.
//!
//! A named tag on the wire is `u8 id · u16 name-length · name · payload`.
//! The End id (0) carries neither name nor payload and terminates Compound
//! payloads. All integers are big-endian. List payloads are headerless:
//! one element-id byte, a signed 32-bit count, then that many payloads.

use std::io::{Read, Write};

use crate::{
	SaveError, SaveResult,
	ioext::*,
	nbt::Map,
	nbt::tag::{Tag, TagID, ListTag},
};

/// Values with a payload encoding in the NBT wire grammar.
pub trait NbtRead: Sized {
	fn nbt_read<R: Read>(reader: &mut R) -> SaveResult<Self>;
}

pub trait NbtWrite {
	fn nbt_write<W: Write>(&self, writer: &mut W) -> SaveResult<usize>;
}

impl NbtRead for String {
	fn nbt_read<R: Read>(reader: &mut R) -> SaveResult<Self> {
		let length = reader.read_value::<u16>()? as usize;
		let mut bytes = vec![0u8; length];
		read_exact_or_truncated(reader, &mut bytes)?;
		String::from_utf8(bytes)
			.map_err(|_| SaveError::Malformed("string is not valid UTF-8".to_owned()))
	}
}

impl NbtWrite for str {
	fn nbt_write<W: Write>(&self, writer: &mut W) -> SaveResult<usize> {
		if self.len() > u16::MAX as usize {
			return SaveError::malformed("string exceeds the 16-bit length limit");
		}
		writer.write_value(self.len() as u16)?;
		writer.write_all(self.as_bytes())?;
		Ok(2 + self.len())
	}
}

impl NbtWrite for String {
	fn nbt_write<W: Write>(&self, writer: &mut W) -> SaveResult<usize> {
		self.as_str().nbt_write(writer)
	}
}

impl NbtRead for Vec<u8> {
	fn nbt_read<R: Read>(reader: &mut R) -> SaveResult<Self> {
		let length = reader.read_value::<i32>()?;
		if length < 0 {
			return SaveError::malformed("negative byte array length");
		}
		let mut bytes = vec![0u8; length as usize];
		read_exact_or_truncated(reader, &mut bytes)?;
		Ok(bytes)
	}
}

impl NbtWrite for [u8] {
	fn nbt_write<W: Write>(&self, writer: &mut W) -> SaveResult<usize> {
		if self.len() > i32::MAX as usize {
			return SaveError::malformed("byte array exceeds the 32-bit length limit");
		}
		writer.write_value(self.len() as i32)?;
		writer.write_all(self)?;
		Ok(4 + self.len())
	}
}

impl NbtRead for ListTag {
	fn nbt_read<R: Read>(reader: &mut R) -> SaveResult<Self> {
		let id = read_tag_id(reader)?;
		let length = reader.read_value::<i32>()?;
		if length < 0 {
			return SaveError::malformed("negative list length");
		}
		if id == TagID::End && length > 0 {
			return SaveError::malformed("non-empty list of End tags");
		}
		let mut list = ListTag::with_id(id);
		for _ in 0..length {
			list.push(read_payload(reader, id)?);
		}
		Ok(list)
	}
}

impl NbtWrite for ListTag {
	fn nbt_write<W: Write>(&self, writer: &mut W) -> SaveResult<usize> {
		if self.len() > i32::MAX as usize {
			return SaveError::malformed("list exceeds the 32-bit length limit");
		}
		let mut size = writer.write_value(self.id().to_u8())?;
		size += writer.write_value(self.len() as i32)?;
		for child in self {
			size += write_payload(writer, child)?;
		}
		Ok(size)
	}
}

impl NbtRead for Map {
	fn nbt_read<R: Read>(reader: &mut R) -> SaveResult<Self> {
		let mut map = Map::new();
		while let Some((name, tag)) = read_named_tag(reader)? {
			map.insert(name, tag);
		}
		Ok(map)
	}
}

impl NbtWrite for Map {
	fn nbt_write<W: Write>(&self, writer: &mut W) -> SaveResult<usize> {
		let mut size = 0;
		for (name, tag) in self {
			size += write_named_tag(writer, name, tag)?;
		}
		// Named End terminator.
		size += writer.write_value(TagID::End.to_u8())?;
		Ok(size)
	}
}

fn read_tag_id<R: Read>(reader: &mut R) -> SaveResult<TagID> {
	TagID::from_u8(reader.read_value::<u8>()?).map_err(SaveError::UnknownTagId)
}

/// Decodes the payload of a tag whose id byte has already been read.
pub fn read_payload<R: Read>(reader: &mut R, id: TagID) -> SaveResult<Tag> {
	Ok(match id {
		TagID::End => return Err(SaveError::EndTagMarker),
		TagID::Byte => Tag::Byte(reader.read_value()?),
		TagID::Short => Tag::Short(reader.read_value()?),
		TagID::Int => Tag::Int(reader.read_value()?),
		TagID::Long => Tag::Long(reader.read_value()?),
		TagID::Float => Tag::Float(reader.read_value()?),
		TagID::Double => Tag::Double(reader.read_value()?),
		TagID::ByteArray => Tag::ByteArray(Vec::<u8>::nbt_read(reader)?),
		TagID::String => Tag::String(String::nbt_read(reader)?),
		TagID::List => Tag::List(ListTag::nbt_read(reader)?),
		TagID::Compound => Tag::Compound(Map::nbt_read(reader)?),
	})
}

/// Encodes the payload of `tag` (no id byte, no name).
pub fn write_payload<W: Write>(writer: &mut W, tag: &Tag) -> SaveResult<usize> {
	match tag {
		Tag::Byte(value) => writer.write_value(*value),
		Tag::Short(value) => writer.write_value(*value),
		Tag::Int(value) => writer.write_value(*value),
		Tag::Long(value) => writer.write_value(*value),
		Tag::Float(value) => writer.write_value(*value),
		Tag::Double(value) => writer.write_value(*value),
		Tag::ByteArray(data) => data.as_slice().nbt_write(writer),
		Tag::String(value) => value.nbt_write(writer),
		Tag::List(list) => list.nbt_write(writer),
		Tag::Compound(map) => map.nbt_write(writer),
	}
}

/// Reads one named tag. Returns `None` for the End marker that closes a
/// Compound payload.
pub fn read_named_tag<R: Read>(reader: &mut R) -> SaveResult<Option<(String, Tag)>> {
	let id = read_tag_id(reader)?;
	if id == TagID::End {
		return Ok(None);
	}
	let name = String::nbt_read(reader)?;
	let tag = read_payload(reader, id)?;
	Ok(Some((name, tag)))
}

/// Writes one named tag: id, name, payload.
pub fn write_named_tag<W: Write>(writer: &mut W, name: &str, tag: &Tag) -> SaveResult<usize> {
	let mut size = writer.write_value(tag.id().to_u8())?;
	size += name.nbt_write(writer)?;
	size += write_payload(writer, tag)?;
	Ok(size)
}
