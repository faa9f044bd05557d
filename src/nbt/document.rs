use std::io::{Cursor, Write};
use std::path::Path;

use crate::{
	SaveError, SaveResult,
	compress::{self, CompressionScheme},
	nbt::Map,
	nbt::io::{read_named_tag, write_named_tag},
	nbt::tag::{self, Tag},
};

/// A root-level NBT document: a named Compound tag.
///
/// Documents are stored either raw or gzip-framed; [NbtDocument::parse]
/// detects the framing, [NbtDocument::write_to_file] always gzips.
#[derive(Debug, Clone, PartialEq)]
pub struct NbtDocument {
	name: String,
	root: Tag,
}

impl NbtDocument {
	/// Creates an empty document: no name, empty Compound root.
	pub fn new() -> Self {
		Self {
			name: String::new(),
			root: Tag::Compound(Map::new()),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn set_name<S: Into<String>>(&mut self, name: S) {
		self.name = name.into();
	}

	pub fn root(&self) -> &Tag {
		&self.root
	}

	pub fn root_mut(&mut self) -> &mut Tag {
		&mut self.root
	}

	/// Replaces the root tag. The root of a document must be a Compound;
	/// anything else is a contract violation and is dropped.
	pub fn set_root(&mut self, root: Tag) {
		match root {
			Tag::Compound(_) => self.root = root,
			other => log::error!("document root must be a Compound, got {}", other.id().name()),
		}
	}

	/// Depth-first search through the root. See [Tag::find].
	pub fn find(&self, name: &str) -> Option<&Tag> {
		self.root.find(name)
	}

	pub fn find_mut(&mut self, name: &str) -> Option<&mut Tag> {
		self.root.find_mut(name)
	}

	/// Parses a document from raw or gzip-framed bytes.
	pub fn parse(bytes: &[u8]) -> SaveResult<Self> {
		let inflated;
		let bytes = if compress::is_gzipped(bytes) {
			inflated = compress::inflate(bytes, CompressionScheme::GZip)?;
			&inflated[..]
		} else {
			bytes
		};
		let mut reader = Cursor::new(bytes);
		match read_named_tag(&mut reader)? {
			Some((name, root @ Tag::Compound(_))) => Ok(Self { name, root }),
			Some((_, other)) => SaveError::malformed(format!(
				"document root must be a Compound, got {}",
				other.id().name()
			)),
			None => Err(SaveError::EndTagMarker),
		}
	}

	/// Serializes the document, unframed.
	pub fn to_bytes(&self) -> SaveResult<Vec<u8>> {
		let mut buffer = Vec::new();
		write_named_tag(&mut buffer, &self.name, &self.root)?;
		Ok(buffer)
	}

	/// Reads and parses a document file.
	pub fn read_from_file<P: AsRef<Path>>(path: P) -> SaveResult<Self> {
		let bytes = std::fs::read(path)?;
		Self::parse(&bytes)
	}

	/// Serializes, gzip-frames, and writes the document, replacing `path`
	/// through a sibling temp file and a rename.
	pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> SaveResult<()> {
		let packed = compress::deflate(&self.to_bytes()?, CompressionScheme::GZip)?;
		let path = path.as_ref();
		let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
		let mut temp = tempfile::NamedTempFile::new_in(dir)?;
		temp.write_all(&packed)?;
		temp.as_file().sync_all()?;
		temp.persist(path).map_err(|err| SaveError::Io(err.error))?;
		Ok(())
	}

	/// Indented dump of the whole document, root name included.
	pub fn pretty_print<W: Write>(&self, sink: &mut W) -> std::io::Result<()> {
		tag::pretty_print_inner(sink, &self.root, Some(&self.name), 0)
	}
}

impl Default for NbtDocument {
	fn default() -> Self {
		Self::new()
	}
}
