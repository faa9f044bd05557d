/// Shorthand way to create a Compound tag.
/// Example:
/// ```ignore
/// compound!{
///     ("Item One", 0i8),
///     (String::from("Item Two"), 2i32),
///     ("Item Three", Tag::Byte(1))
/// }
/// ```
#[macro_export]
macro_rules! compound {
	($(($name:expr, $value:expr)),+$(,)?) => {
		$crate::nbt::tag::Tag::Compound($crate::nbt::Map::from([
			$(
				(String::from($name), $crate::nbt::tag::Tag::from($value)),
			)+
		]))
	};
	() => {
		$crate::nbt::tag::Tag::Compound($crate::nbt::Map::new())
	};
}

/// Shorthand way to create a List tag. The element kind is adopted from
/// the first item.
/// Example:
/// ```ignore
/// list!{ 1i32, 2i32, 3i32 };
/// ```
#[macro_export]
macro_rules! list {
	($($item:expr),+$(,)?) => {{
		let mut __list = $crate::nbt::tag::ListTag::new();
		$(
			__list.push($crate::nbt::tag::Tag::from($item));
		)+
		$crate::nbt::tag::Tag::List(__list)
	}};
	() => {
		$crate::nbt::tag::Tag::List($crate::nbt::tag::ListTag::new())
	};
}

pub use list;
pub use compound;
