use std::io::{Read, Write};

use chrono::{DateTime, Utc};

use crate::{
	SaveResult,
	for_each_int_type,
	ioext::*,
};

/// A 32-bit Unix timestamp. Zero means "never written", which doubles as
/// the "slot holds no chunk" signal in region headers.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
pub struct Timestamp(u32);

impl Timestamp {
	/// Get a [Timestamp] for the current time (in Utc).
	pub fn utc_now() -> Timestamp {
		Timestamp(Utc::now().timestamp() as u32)
	}

	pub fn is_zero(&self) -> bool {
		self.0 == 0
	}

	pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
		DateTime::<Utc>::from_timestamp(self.0 as i64, 0)
	}
}

macro_rules! __timestamp_impls {
	($type:ty) => {
		impl From<$type> for Timestamp {
			fn from(value: $type) -> Self {
				Self(value as u32)
			}
		}

		impl From<Timestamp> for $type {
			fn from(value: Timestamp) -> Self {
				value.0 as $type
			}
		}
	};
}

for_each_int_type!(__timestamp_impls);

impl From<DateTime<Utc>> for Timestamp {
	fn from(value: DateTime<Utc>) -> Self {
		Timestamp(value.timestamp() as u32)
	}
}

impl Readable for Timestamp {
	fn read_from<R: Read>(reader: &mut R) -> SaveResult<Self> {
		Ok(Self(reader.read_value()?))
	}
}

impl Writable for Timestamp {
	fn write_to<W: Write>(&self, writer: &mut W) -> SaveResult<usize> {
		writer.write_value(self.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn conversions() {
		let stamp = Timestamp::from(1234u32);
		assert_eq!(1234u32, stamp.into());
		assert!(!stamp.is_zero());
		assert!(Timestamp::default().is_zero());
		assert!(stamp.to_datetime().is_some());
		assert!(!Timestamp::utc_now().is_zero());
	}
}
