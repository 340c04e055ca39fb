use crate::format::bytes::Cursor;
use crate::format::{BinStr, HbinError, Result, StrTable};

/// Type tag of a float array that stores interleaved capture `(node, weight)` pairs.
pub const CAPTURE_WEIGHTS_FLAG: u32 = 0x10000;

/// Value kind resolved once from a descriptor's 32-bit type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
	/// `elementCount` 32-bit floats per record.
	Float,
	/// `elementCount` 32-bit signed integers per record.
	Int,
	/// One 32-bit index per record into the descriptor's inline string table.
	StringIndex,
	/// Three 32-bit floats per record, whatever the declared element count.
	Vector3,
	/// Float array whose tag is exactly [`CAPTURE_WEIGHTS_FLAG`].
	CaptureWeights,
	/// Any other storage type (low 16 bits of the tag).
	Unsupported(u16),
}

impl AttrKind {
	/// Resolve a kind from a raw type tag.
	pub fn from_tag(tag: u32) -> Self {
		if tag == CAPTURE_WEIGHTS_FLAG {
			return Self::CaptureWeights;
		}
		match tag & 0xFFFF {
			0 => Self::Float,
			1 => Self::Int,
			4 => Self::StringIndex,
			5 => Self::Vector3,
			other => Self::Unsupported(other as u16),
		}
	}

	/// Per-record value size for `element_count` elements of this kind.
	///
	/// Zero means the descriptor cannot be laid out.
	pub fn value_size(self, element_count: usize) -> usize {
		match self {
			Self::Float | Self::Int | Self::CaptureWeights => element_count.saturating_mul(4),
			Self::Vector3 => 12,
			Self::StringIndex => 4,
			Self::Unsupported(_) => 0,
		}
	}

	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Float => "float",
			Self::Int => "int",
			Self::StringIndex => "index",
			Self::Vector3 => "vector",
			Self::CaptureWeights => "capture",
			Self::Unsupported(_) => "unsupported",
		}
	}
}

/// One resolved attribute descriptor.
#[derive(Debug, Clone, Copy)]
pub struct AttrDesc<'a> {
	/// Position in declaration order.
	pub index: usize,
	/// Attribute name.
	pub name: BinStr<'a>,
	/// Resolved value kind.
	pub kind: AttrKind,
	/// Raw type tag including capability bits.
	pub tag: u32,
	/// Declared element count.
	pub element_count: usize,
	/// Byte offset of this attribute's value inside a record, header included.
	pub value_offset: usize,
	/// Per-record value size in bytes.
	pub value_size: usize,
	/// Absolute offset of the descriptor's name-length field.
	pub descriptor_offset: usize,
	/// Absolute offset of the descriptor's default-value region.
	pub default_offset: usize,
	strings: Option<StrTable<'a>>,
}

impl<'a> AttrDesc<'a> {
	/// Inline string table for [`AttrKind::StringIndex`] attributes.
	pub fn strings(&self) -> Option<&StrTable<'a>> {
		self.strings.as_ref()
	}

	/// True for vector-like attributes: `Vector3`, or `Float`/`Int` with at least 3 elements.
	pub fn is_vector(&self) -> bool {
		match self.kind {
			AttrKind::Vector3 => true,
			AttrKind::Float | AttrKind::Int => self.element_count >= 3,
			_ => false,
		}
	}

	/// True for single-valued string attributes.
	pub fn is_string(&self) -> bool {
		self.kind == AttrKind::StringIndex && self.element_count == 1
	}

	/// Number of components [`read_vector`](Self::read_vector) reads.
	pub fn vector_components(&self) -> usize {
		match self.kind {
			AttrKind::Vector3 => 3,
			AttrKind::Float | AttrKind::Int => self.element_count.min(3),
			_ => 0,
		}
	}

	/// Read up to three components from the record starting at `record_start`.
	///
	/// `Int` values are converted to float; missing components stay zero.
	pub fn read_vector(&self, bytes: &[u8], record_start: usize) -> Result<[f32; 3]> {
		let mut out = [0.0_f32; 3];
		let mut cursor = Cursor::at(bytes, record_start + self.value_offset);
		for slot in out.iter_mut().take(self.vector_components()) {
			*slot = match self.kind {
				AttrKind::Int => cursor.read_i32()? as f32,
				_ => cursor.read_f32()?,
			};
		}
		Ok(out)
	}

	/// Read the 32-bit string-table index stored in the record starting at `record_start`.
	pub fn read_index(&self, bytes: &[u8], record_start: usize) -> Result<i32> {
		Cursor::at(bytes, record_start + self.value_offset).read_i32()
	}
}

/// Forward scanner producing descriptors with running value offsets.
///
/// Offsets are a prefix sum over every earlier descriptor, so a descriptor is only valid
/// when produced by a scan that started at the first one. The scanner stops after the
/// first error.
pub struct AttrDescIter<'a> {
	cursor: Cursor<'a>,
	index: usize,
	count: usize,
	value_offset: usize,
	failed: bool,
}

impl<'a> AttrDescIter<'a> {
	/// Scan `count` descriptors at `start`; value offsets begin at `header_size`.
	pub fn new(bytes: &'a [u8], count: usize, start: usize, header_size: usize) -> Self {
		Self {
			cursor: Cursor::at(bytes, start),
			index: 0,
			count,
			value_offset: header_size,
			failed: false,
		}
	}

	/// Cursor position, i.e. the end of the descriptors consumed so far.
	pub fn pos(&self) -> usize {
		self.cursor.pos()
	}

	fn parse_one(&mut self) -> Result<AttrDesc<'a>> {
		let descriptor_offset = self.cursor.pos();
		let name = self.cursor.read_str()?;
		if name.is_empty() {
			return Err(HbinError::EmptyAttributeName { at: descriptor_offset });
		}

		let element_count = self.cursor.read_len()?;
		let tag = self.cursor.read_u32()?;
		let kind = AttrKind::from_tag(tag);
		let value_size = kind.value_size(element_count);
		if value_size == 0 {
			return Err(HbinError::ZeroSizeAttribute { at: descriptor_offset, tag });
		}

		let default_offset = self.cursor.pos();
		let strings = if kind == AttrKind::StringIndex {
			Some(StrTable::parse(&mut self.cursor)?)
		} else {
			self.cursor.skip(value_size)?;
			None
		};

		let desc = AttrDesc {
			index: self.index,
			name,
			kind,
			tag,
			element_count,
			value_offset: self.value_offset,
			value_size,
			descriptor_offset,
			default_offset,
			strings,
		};
		self.value_offset += value_size;
		Ok(desc)
	}
}

impl<'a> Iterator for AttrDescIter<'a> {
	type Item = Result<AttrDesc<'a>>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.failed || self.index >= self.count {
			return None;
		}

		match self.parse_one() {
			Ok(desc) => {
				self.index += 1;
				Some(Ok(desc))
			}
			Err(err) => {
				self.failed = true;
				Some(Err(err))
			}
		}
	}
}

/// Fully resolved attribute table for one record class (point, vertex, primitive, detail).
#[derive(Debug, Clone)]
pub struct AttrTable<'a> {
	/// Fixed record bytes preceding attribute values.
	pub header_size: usize,
	/// Absolute offset of the first descriptor.
	pub start: usize,
	/// Absolute offset one past the last descriptor.
	pub end: usize,
	attrs: Vec<AttrDesc<'a>>,
}

impl<'a> AttrTable<'a> {
	/// Resolve all `count` descriptors starting at `start`.
	///
	/// Any descriptor that cannot be laid out fails the whole table.
	pub fn resolve(bytes: &'a [u8], count: usize, start: usize, header_size: usize) -> Result<Self> {
		let mut iter = AttrDescIter::new(bytes, count, start, header_size);
		let attrs = iter.by_ref().collect::<Result<Vec<_>>>()?;
		Ok(Self {
			header_size,
			start,
			end: iter.pos(),
			attrs,
		})
	}

	/// Scan for the attribute named `name`, stopping at the first match.
	///
	/// Returns `Ok(None)` when the scan exhausts `count` descriptors without a match.
	pub fn lookup(bytes: &'a [u8], count: usize, start: usize, header_size: usize, name: &[u8]) -> Result<Option<AttrDesc<'a>>> {
		for desc in AttrDescIter::new(bytes, count, start, header_size) {
			let desc = desc?;
			if desc.name == name {
				return Ok(Some(desc));
			}
		}
		Ok(None)
	}

	/// Number of descriptors.
	pub fn len(&self) -> usize {
		self.attrs.len()
	}

	/// Return true when the table has no descriptors.
	pub fn is_empty(&self) -> bool {
		self.attrs.is_empty()
	}

	/// Sum of attribute value sizes.
	pub fn values_size(&self) -> usize {
		self.attrs.iter().map(|desc| desc.value_size).sum()
	}

	/// Full record size: header plus every attribute value.
	pub fn record_size(&self) -> usize {
		self.header_size + self.values_size()
	}

	/// Descriptor by declaration index.
	pub fn get(&self, index: usize) -> Option<&AttrDesc<'a>> {
		self.attrs.get(index)
	}

	/// Descriptor by exact, case-sensitive name.
	pub fn find(&self, name: &[u8]) -> Option<&AttrDesc<'a>> {
		self.attrs.iter().find(|desc| desc.name == name)
	}

	/// Descriptors in declaration order.
	pub fn iter(&self) -> std::slice::Iter<'_, AttrDesc<'a>> {
		self.attrs.iter()
	}

	/// Consume the table into its descriptors.
	pub fn into_attrs(self) -> Vec<AttrDesc<'a>> {
		self.attrs
	}
}

#[cfg(test)]
mod tests;
