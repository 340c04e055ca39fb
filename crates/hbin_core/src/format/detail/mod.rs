//! Detail (whole-geometry) attributes, capture weights, and skeleton arrays.

use crate::format::bytes::Cursor;
use crate::format::error::recover;
use crate::format::{AttrDesc, AttrKind, AttrTable, BinStr, GeoDoc, Result};

const CAPTURE_PATH_ATTR: &[u8] = b"pCaptPath";
const CAPTURE_ATTR: &[u8] = b"pCapt";

/// One `(node, weight)` capture pair of a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capture {
	/// Capture node id, `-1` when absent.
	pub node: i32,
	/// Influence weight.
	pub weight: f32,
}

impl Default for Capture {
	fn default() -> Self {
		Self { node: -1, weight: 0.0 }
	}
}

impl<'a> GeoDoc<'a> {
	/// Absolute offset of the detail attribute descriptors.
	///
	/// Located by walking the whole primitive stream; `None` without detail attributes.
	pub fn detail_start(&self) -> Result<Option<usize>> {
		self.require_header()?;
		if self.detail_attr_count() == 0 {
			return Ok(None);
		}
		self.prim_walker()?.finish().map(Some)
	}

	/// Resolve the detail attribute table; `None` without detail attributes.
	pub fn detail_table(&self) -> Result<Option<AttrTable<'a>>> {
		let Some(start) = self.detail_start()? else {
			return Ok(None);
		};
		AttrTable::resolve(self.bytes(), self.detail_attr_count(), start, 0).map(Some)
	}

	fn detail_lookup(&self, name: &[u8]) -> Result<Option<AttrDesc<'a>>> {
		let Some(start) = self.detail_start()? else {
			return Ok(None);
		};
		AttrTable::lookup(self.bytes(), self.detail_attr_count(), start, 0, name)
	}

	fn detail_strings(&self, query: &'static str, name: &[u8]) -> Option<AttrDesc<'a>> {
		recover(query, self.detail_lookup(name), None).filter(|attr| attr.kind == AttrKind::StringIndex)
	}

	/// First string-table entry of detail attribute `name`.
	pub fn detail_string_attr(&self, name: &str) -> Option<BinStr<'a>> {
		self.detail_strings("detail_string_attr", name.as_bytes())?.strings()?.first()
	}

	/// Number of capture nodes (`pCaptPath` entries).
	pub fn capture_node_count(&self) -> usize {
		self.detail_strings("capture_node_count", CAPTURE_PATH_ATTR)
			.and_then(|attr| attr.strings().map(|strings| strings.len()))
			.unwrap_or(0)
	}

	/// Path of capture node `id`.
	pub fn capture_node_path(&self, id: usize) -> Option<BinStr<'a>> {
		self.detail_strings("capture_node_path", CAPTURE_PATH_ATTR)?.strings()?.get(id)
	}

	fn capture_attr(&self) -> Result<Option<AttrDesc<'a>>> {
		if self.point_attr_count() == 0 {
			return Ok(None);
		}
		let attr = self.point_lookup(CAPTURE_ATTR)?;
		Ok(attr.filter(|attr| attr.kind == AttrKind::CaptureWeights))
	}

	/// Capture slots per point: half the `pCapt` element count.
	pub fn max_captures_per_point(&self) -> usize {
		recover("max_captures_per_point", self.capture_attr(), None).map_or(0, |attr| attr.element_count / 2)
	}

	/// Capture pair `slot` of point `id`; `{-1, 0.0}` when out of range.
	pub fn point_capture(&self, id: usize, slot: usize) -> Capture {
		recover("point_capture", self.read_capture(id, slot), Capture::default())
	}

	fn read_capture(&self, id: usize, slot: usize) -> Result<Capture> {
		if id >= self.point_count() {
			return Ok(Capture::default());
		}
		let Some(attr) = self.capture_attr()? else {
			return Ok(Capture::default());
		};
		if slot >= attr.element_count / 2 {
			return Ok(Capture::default());
		}

		let table = self.point_table()?;
		let record = self.point_record(&table, id)?;
		let mut cursor = Cursor::at(self.bytes(), record + attr.value_offset + slot * 8);
		let node = cursor.read_f32()? as i32;
		let weight = cursor.read_f32()?;
		Ok(Capture { node, weight })
	}

	fn skeleton_values<T>(&self, query: &'static str, name: &str, kind: AttrKind, read: fn(&mut Cursor<'a>) -> Result<T>) -> Vec<T> {
		let values = self.detail_table().and_then(|table| {
			let Some(table) = table else {
				return Ok(Vec::new());
			};
			let Some(attr) = table.find(name.as_bytes()).filter(|attr| attr.kind == kind) else {
				return Ok(Vec::new());
			};
			let mut cursor = Cursor::at(self.bytes(), table.end + attr.value_offset);
			(0..attr.element_count).map(|_| read(&mut cursor)).collect()
		});
		recover(query, values, Vec::new())
	}

	/// Every entry of detail string attribute `name`.
	pub fn skeleton_names(&self, name: &str) -> Vec<BinStr<'a>> {
		self.detail_strings("skeleton_names", name.as_bytes())
			.and_then(|attr| attr.strings().map(|strings| strings.iter().collect()))
			.unwrap_or_default()
	}

	/// Every element of detail integer attribute `name`.
	pub fn skeleton_parents(&self, name: &str) -> Vec<i32> {
		self.skeleton_values("skeleton_parents", name, AttrKind::Int, Cursor::read_i32)
	}

	/// Every element of detail float attribute `name`.
	pub fn skeleton_transforms(&self, name: &str) -> Vec<f32> {
		self.skeleton_values("skeleton_transforms", name, AttrKind::Float, Cursor::read_f32)
	}
}
