//! The NBT tag tree and its binary codec.

pub mod tag;
pub mod io;
pub mod document;
pub mod macros;

pub use tag::{Tag, TagID, ListTag};
pub use document::NbtDocument;

/// The backing map for Compound tags. Insertion order is preserved and
/// names are unique.
pub type Map = indexmap::IndexMap<String, Tag>;
