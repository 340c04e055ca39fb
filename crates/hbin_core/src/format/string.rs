use std::borrow::Cow;
use std::fmt;

use crate::format::bytes::Cursor;
use crate::format::Result;

/// Borrowed, length-delimited byte string inside a loaded buffer.
///
/// Equality compares referenced bytes, never offsets.
#[derive(Clone, Copy, Default)]
pub struct BinStr<'a> {
	bytes: &'a [u8],
	offset: usize,
}

impl<'a> BinStr<'a> {
	/// Wrap `bytes` found at absolute buffer offset `offset`.
	pub fn new(bytes: &'a [u8], offset: usize) -> Self {
		Self { bytes, offset }
	}

	/// Absolute offset of the first byte in the source buffer.
	pub fn offset(&self) -> usize {
		self.offset
	}

	/// Length in bytes.
	pub fn len(&self) -> usize {
		self.bytes.len()
	}

	/// Return true for a zero-length string.
	pub fn is_empty(&self) -> bool {
		self.bytes.is_empty()
	}

	/// Referenced bytes.
	pub fn as_bytes(&self) -> &'a [u8] {
		self.bytes
	}

	/// Decode as UTF-8, replacing invalid sequences.
	pub fn to_str_lossy(&self) -> Cow<'a, str> {
		String::from_utf8_lossy(self.bytes)
	}

	/// Return the trailing component after the last `/`.
	pub fn name_from_path(&self) -> BinStr<'a> {
		match self.bytes.iter().rposition(|byte| *byte == b'/') {
			Some(slash) => BinStr::new(&self.bytes[slash + 1..], self.offset + slash + 1),
			None => *self,
		}
	}
}

impl PartialEq for BinStr<'_> {
	fn eq(&self, other: &Self) -> bool {
		self.bytes == other.bytes
	}
}

impl Eq for BinStr<'_> {}

impl PartialEq<[u8]> for BinStr<'_> {
	fn eq(&self, other: &[u8]) -> bool {
		self.bytes == other
	}
}

impl PartialEq<&[u8]> for BinStr<'_> {
	fn eq(&self, other: &&[u8]) -> bool {
		self.bytes == *other
	}
}

impl PartialEq<str> for BinStr<'_> {
	fn eq(&self, other: &str) -> bool {
		self.bytes == other.as_bytes()
	}
}

impl PartialEq<&str> for BinStr<'_> {
	fn eq(&self, other: &&str) -> bool {
		self.bytes == other.as_bytes()
	}
}

impl fmt::Debug for BinStr<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:?}@{}", self.to_str_lossy(), self.offset)
	}
}

impl fmt::Display for BinStr<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_str_lossy())
	}
}

/// Inline string table stored in an attribute descriptor: a count followed by
/// length-prefixed entries.
#[derive(Debug, Clone, Copy)]
pub struct StrTable<'a> {
	bytes: &'a [u8],
	first: usize,
	count: usize,
	end: usize,
}

impl<'a> StrTable<'a> {
	/// Parse a table at the cursor, validating every entry and leaving the cursor past it.
	pub fn parse(cursor: &mut Cursor<'a>) -> Result<Self> {
		let count = cursor.read_count()?;
		let first = cursor.pos();
		for _ in 0..count {
			let _ = cursor.read_str()?;
		}

		Ok(Self {
			bytes: cursor.bytes(),
			first,
			count,
			end: cursor.pos(),
		})
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.count
	}

	/// Return true when the table has no entries.
	pub fn is_empty(&self) -> bool {
		self.count == 0
	}

	/// Byte span of the entries, excluding the leading count.
	pub fn span(&self) -> usize {
		self.end - self.first
	}

	/// Iterate entries in table order.
	pub fn iter(&self) -> StrTableIter<'a> {
		StrTableIter {
			cursor: Cursor::at(self.bytes, self.first),
			left: self.count,
		}
	}

	/// Return the entry at `idx`, walking from the first entry.
	pub fn get(&self, idx: usize) -> Option<BinStr<'a>> {
		self.iter().nth(idx)
	}

	/// Return the first entry, if any.
	pub fn first(&self) -> Option<BinStr<'a>> {
		self.get(0)
	}

	/// Return the index of the first entry equal to `value`.
	pub fn position(&self, value: &[u8]) -> Option<usize> {
		self.iter().position(|entry| entry == value)
	}
}

/// Iterator over [`StrTable`] entries.
pub struct StrTableIter<'a> {
	cursor: Cursor<'a>,
	left: usize,
}

impl<'a> Iterator for StrTableIter<'a> {
	type Item = BinStr<'a>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.left == 0 {
			return None;
		}
		self.left -= 1;
		self.cursor.read_str().ok()
	}
}
