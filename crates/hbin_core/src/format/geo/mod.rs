use std::ops::ControlFlow;

use crate::format::bytes::Cursor;
use crate::format::error::recover;
use crate::format::{AttrDesc, AttrDescIter, AttrKind, AttrTable, BinStr, HbinError, IndexWidth, PrimWalker, Primitive, Result};

/// Leading signature bytes.
pub const GEO_SIGNATURE: &[u8; 4] = b"Bgeo";
/// Fixed header size; point attribute descriptors start here.
pub const GEO_HEADER_SIZE: usize = 0x29;
/// Standard point record payload: `x, y, z, w` as `f32`.
pub const POINT_HEADER_SIZE: usize = 16;

pub(crate) const MATERIAL_ATTR: &[u8] = b"shop_materialpath";

/// Header scalars read from fixed offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeoHeader {
	/// Format version (offset 5).
	pub version: i32,
	/// Point count (offset 0x9).
	pub point_count: i32,
	/// Primitive count (offset 0xD).
	pub prim_count: i32,
	/// Point group count (offset 0x11).
	pub point_group_count: i32,
	/// Primitive group count (offset 0x15).
	pub prim_group_count: i32,
	/// Point attribute count (offset 0x19).
	pub point_attr_count: i32,
	/// Vertex attribute count (offset 0x1D).
	pub vertex_attr_count: i32,
	/// Primitive attribute count (offset 0x21).
	pub prim_attr_count: i32,
	/// Detail attribute count (offset 0x25).
	pub detail_attr_count: i32,
}

impl GeoHeader {
	/// Parse the header from the beginning of `bytes`.
	pub fn parse(bytes: &[u8]) -> Result<Self> {
		let mut cursor = Cursor::new(bytes);
		let magic = cursor.read_array::<5>()?;
		if &magic[..4] != GEO_SIGNATURE || magic[4] != b'V' {
			return Err(HbinError::BadSignature {
				expected: b"BgeoV",
				got: magic.to_vec(),
			});
		}

		Ok(Self {
			version: cursor.read_i32()?,
			point_count: cursor.read_i32()?,
			prim_count: cursor.read_i32()?,
			point_group_count: cursor.read_i32()?,
			prim_group_count: cursor.read_i32()?,
			point_attr_count: cursor.read_i32()?,
			vertex_attr_count: cursor.read_i32()?,
			prim_attr_count: cursor.read_i32()?,
			detail_attr_count: cursor.read_i32()?,
		})
	}

	fn points(&self) -> usize {
		clamp_count(self.point_count)
	}
}

pub(crate) fn clamp_count(value: i32) -> usize {
	usize::try_from(value).unwrap_or(0)
}

/// Record layout up to the primitive stream.
#[derive(Debug, Clone)]
pub struct GeoLayout<'a> {
	/// Point attribute table (16-byte standard header).
	pub points: AttrTable<'a>,
	/// Absolute offset of the first point record.
	pub points_start: usize,
	/// Absolute offset one past the last point record.
	pub points_end: usize,
	/// Vertex attribute table.
	pub vertices: AttrTable<'a>,
	/// Primitive attribute table.
	pub prims: AttrTable<'a>,
	/// Absolute offset of the first primitive record.
	pub prim_stream_start: usize,
	/// Vertex index width selected by the point count.
	pub index_width: IndexWidth,
}

/// Triangle indices and materials gathered from 3-vertex polygons, in stream order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleList {
	/// One point-index triple per triangle.
	pub indices: Vec<[u32; 3]>,
	/// Material id per triangle, `None` without a material attribute.
	pub materials: Vec<Option<u32>>,
}

impl TriangleList {
	/// Number of triangles.
	pub fn len(&self) -> usize {
		self.indices.len()
	}

	/// Return true when no triangles were found.
	pub fn is_empty(&self) -> bool {
		self.indices.is_empty()
	}

	/// Flattened indices narrowed to 16 bits.
	pub fn indices_u16(&self) -> Vec<u16> {
		self.indices.iter().flatten().map(|index| *index as u16).collect()
	}

	/// Flattened 32-bit indices.
	pub fn indices_u32(&self) -> Vec<u32> {
		self.indices.iter().flatten().copied().collect()
	}

	/// Material ids with `-1` for triangles without one.
	pub fn material_ids(&self) -> Vec<i32> {
		self.materials.iter().map(|id| id.map_or(-1, |id| id as i32)).collect()
	}
}

/// Read-only view over a `.bgeo` buffer.
///
/// Every query recomputes the layout it needs from the buffer. Queries on an invalid or
/// malformed buffer return zero/empty defaults instead of failing.
#[derive(Debug, Clone, Copy)]
pub struct GeoDoc<'a> {
	bytes: &'a [u8],
	header: Option<GeoHeader>,
}

impl<'a> GeoDoc<'a> {
	/// Wrap a buffer; the header is parsed once here.
	pub fn new(bytes: &'a [u8]) -> Self {
		let header = match GeoHeader::parse(bytes) {
			Ok(header) => Some(header),
			Err(err) => {
				tracing::debug!(%err, "not a valid bgeo buffer");
				None
			}
		};
		Self { bytes, header }
	}

	/// Return true when the buffer starts with `BgeoV` and holds a full header.
	pub fn is_valid(&self) -> bool {
		self.header.is_some()
	}

	/// Parsed header, `None` for an invalid buffer.
	pub fn header(&self) -> Option<&GeoHeader> {
		self.header.as_ref()
	}

	/// Underlying buffer.
	pub fn bytes(&self) -> &'a [u8] {
		self.bytes
	}

	/// Format version.
	pub fn version(&self) -> i32 {
		self.header.map_or(0, |header| header.version)
	}

	/// Number of points.
	pub fn point_count(&self) -> usize {
		self.header.map_or(0, |header| header.points())
	}

	/// Number of whole point records the buffer holds, at most [`point_count`](Self::point_count).
	pub fn stored_point_count(&self) -> usize {
		let records = self.point_table().map(|table| self.bytes.len().saturating_sub(table.end) / table.record_size());
		self.point_count().min(recover("stored_point_count", records, 0))
	}

	/// Number of primitives declared in the header.
	pub fn prim_count(&self) -> usize {
		self.header.map_or(0, |header| clamp_count(header.prim_count))
	}

	/// Number of point groups.
	pub fn point_group_count(&self) -> usize {
		self.header.map_or(0, |header| clamp_count(header.point_group_count))
	}

	/// Number of primitive groups.
	pub fn prim_group_count(&self) -> usize {
		self.header.map_or(0, |header| clamp_count(header.prim_group_count))
	}

	/// Number of point attributes.
	pub fn point_attr_count(&self) -> usize {
		self.header.map_or(0, |header| clamp_count(header.point_attr_count))
	}

	/// Number of vertex attributes.
	pub fn vertex_attr_count(&self) -> usize {
		self.header.map_or(0, |header| clamp_count(header.vertex_attr_count))
	}

	/// Number of primitive attributes.
	pub fn prim_attr_count(&self) -> usize {
		self.header.map_or(0, |header| clamp_count(header.prim_attr_count))
	}

	/// Number of detail attributes.
	pub fn detail_attr_count(&self) -> usize {
		self.header.map_or(0, |header| clamp_count(header.detail_attr_count))
	}

	pub(crate) fn require_header(&self) -> Result<&GeoHeader> {
		self.header.as_ref().ok_or_else(|| HbinError::BadSignature {
			expected: b"BgeoV",
			got: self.bytes.iter().take(5).copied().collect(),
		})
	}

	/// Resolve the point attribute table.
	pub fn point_table(&self) -> Result<AttrTable<'a>> {
		self.require_header()?;
		AttrTable::resolve(self.bytes, self.point_attr_count(), GEO_HEADER_SIZE, POINT_HEADER_SIZE)
	}

	/// Resolve every table up to the primitive stream.
	pub fn layout(&self) -> Result<GeoLayout<'a>> {
		let points = self.point_table()?;
		let points_start = points.end;
		let points_end = record_offset(points_start, self.point_count(), points.record_size())?;
		let vertices = AttrTable::resolve(self.bytes, self.vertex_attr_count(), points_end, 0)?;
		let prims = AttrTable::resolve(self.bytes, self.prim_attr_count(), vertices.end, 0)?;
		let prim_stream_start = prims.end;

		Ok(GeoLayout {
			points,
			points_start,
			points_end,
			vertices,
			prims,
			prim_stream_start,
			index_width: IndexWidth::for_point_count(self.point_count()),
		})
	}

	pub(crate) fn point_lookup(&self, name: &[u8]) -> Result<Option<AttrDesc<'a>>> {
		self.require_header()?;
		AttrTable::lookup(self.bytes, self.point_attr_count(), GEO_HEADER_SIZE, POINT_HEADER_SIZE, name)
	}

	/// Absolute offset of point `id`'s record, given a resolved point table.
	pub(crate) fn point_record(&self, table: &AttrTable<'_>, id: usize) -> Result<usize> {
		record_offset(table.end, id, table.record_size())
	}

	/// Position of point `id`; zero when out of range.
	pub fn point_position(&self, id: usize) -> [f32; 3] {
		recover("point_position", self.read_point_position(id), [0.0; 3])
	}

	fn read_point_position(&self, id: usize) -> Result<[f32; 3]> {
		if id >= self.point_count() {
			return Ok([0.0; 3]);
		}
		let table = self.point_table()?;
		let mut cursor = Cursor::at(self.bytes, self.point_record(&table, id)?);
		Ok([cursor.read_f32()?, cursor.read_f32()?, cursor.read_f32()?])
	}

	/// Up to three components of point attribute `name` for point `id`.
	///
	/// Integer attributes are converted to float. Missing attributes read as zero.
	pub fn point_vector_attr(&self, name: &str, id: usize) -> [f32; 3] {
		recover("point_vector_attr", self.read_point_vector(name.as_bytes(), id), [0.0; 3])
	}

	fn read_point_vector(&self, name: &[u8], id: usize) -> Result<[f32; 3]> {
		if id >= self.point_count() || self.point_attr_count() == 0 {
			return Ok([0.0; 3]);
		}
		let Some(attr) = self.point_lookup(name)? else {
			return Ok([0.0; 3]);
		};
		let table = self.point_table()?;
		attr.read_vector(self.bytes, self.point_record(&table, id)?)
	}

	/// First component of point attribute `name`.
	pub fn point_float_attr(&self, name: &str, id: usize) -> f32 {
		self.point_vector_attr(name, id)[0]
	}

	/// Point normal (`N`).
	pub fn point_normal(&self, id: usize) -> [f32; 3] {
		self.point_vector_attr("N", id)
	}

	/// Point color (`Cd`).
	pub fn point_color(&self, id: usize) -> [f32; 3] {
		self.point_vector_attr("Cd", id)
	}

	/// Point texture coordinate (`uv`) with all three components.
	pub fn point_uvw(&self, id: usize) -> [f32; 3] {
		self.point_vector_attr("uv", id)
	}

	/// Point texture coordinate (`uv`), first two components.
	pub fn point_uv(&self, id: usize) -> [f32; 2] {
		let [u, v, _] = self.point_uvw(id);
		[u, v]
	}

	/// String value of single-valued string attribute `name` for point `id`.
	pub fn point_string_attr(&self, name: &str, id: usize) -> Option<BinStr<'a>> {
		recover("point_string_attr", self.read_point_string(name.as_bytes(), id), None)
	}

	fn read_point_string(&self, name: &[u8], id: usize) -> Result<Option<BinStr<'a>>> {
		if id >= self.point_count() {
			return Ok(None);
		}
		let Some(attr) = self.point_lookup(name)? else {
			return Ok(None);
		};
		let Some(strings) = attr.strings().filter(|_| attr.is_string()) else {
			return Ok(None);
		};
		let table = self.point_table()?;
		let index = attr.read_index(self.bytes, self.point_record(&table, id)?)?;
		Ok(usize::try_from(index).ok().and_then(|index| strings.get(index)))
	}

	/// First point whose string attribute `name` equals `value`.
	pub fn find_point_by_string_attr(&self, name: &str, value: &[u8]) -> Option<usize> {
		recover("find_point_by_string_attr", self.scan_points_by_string(name.as_bytes(), value), None)
	}

	fn scan_points_by_string(&self, name: &[u8], value: &[u8]) -> Result<Option<usize>> {
		if self.point_count() == 0 {
			return Ok(None);
		}
		let Some(attr) = self.point_lookup(name)? else {
			return Ok(None);
		};
		let Some(strings) = attr.strings().filter(|_| attr.is_string()) else {
			return Ok(None);
		};
		let Some(wanted) = strings.position(value) else {
			return Ok(None);
		};

		let table = self.point_table()?;
		for id in 0..self.point_count() {
			let stored = attr.read_index(self.bytes, self.point_record(&table, id)?)?;
			if usize::try_from(stored).is_ok_and(|stored| stored == wanted) {
				return Ok(Some(id));
			}
		}
		Ok(None)
	}

	/// Name of the `index`-th point attribute.
	pub fn point_attr_name(&self, index: usize) -> Option<BinStr<'a>> {
		recover("point_attr_name", self.nth_point_attr(index).map(|attr| attr.map(|attr| attr.name)), None)
	}

	/// True when the `index`-th point attribute is vector-like.
	pub fn point_attr_is_vector(&self, index: usize) -> bool {
		recover("point_attr_is_vector", self.nth_point_attr(index), None).is_some_and(|attr| attr.is_vector())
	}

	/// True when the `index`-th point attribute is a single string.
	pub fn point_attr_is_string(&self, index: usize) -> bool {
		recover("point_attr_is_string", self.nth_point_attr(index), None).is_some_and(|attr| attr.is_string())
	}

	fn nth_point_attr(&self, index: usize) -> Result<Option<AttrDesc<'a>>> {
		if self.point_count() == 0 {
			return Ok(None);
		}
		AttrDescIter::new(self.bytes, self.point_attr_count(), GEO_HEADER_SIZE, POINT_HEADER_SIZE)
			.nth(index)
			.transpose()
	}

	/// Every point attribute in declaration order; empty when the table is malformed.
	pub fn point_attrs(&self) -> Vec<AttrDesc<'a>> {
		recover("point_attrs", self.point_table().map(AttrTable::into_attrs), Vec::new())
	}

	/// Walker over the primitive stream.
	pub fn prim_walker(&self) -> Result<PrimWalker<'a>> {
		Ok(PrimWalker::new(self.bytes, &self.layout()?, self.prim_count()))
	}

	/// Visit primitives in stream order until the visitor breaks or the stream ends.
	///
	/// Returns the number of primitives visited.
	pub fn for_each_primitive<F>(&self, mut visitor: F) -> usize
	where
		F: FnMut(&Primitive<'a>) -> ControlFlow<()>,
	{
		let walker = match self.prim_walker() {
			Ok(walker) => walker,
			Err(err) => {
				tracing::debug!(%err, "primitive stream unavailable");
				return 0;
			}
		};

		let mut visited = 0;
		for prim in walker {
			let prim = match prim {
				Ok(prim) => prim,
				Err(err) => {
					tracing::debug!(%err, visited, "primitive walk stopped");
					break;
				}
			};
			visited += 1;
			if visitor(&prim).is_break() {
				break;
			}
		}
		visited
	}

	/// Number of 3-vertex polygons.
	pub fn count_triangles(&self) -> usize {
		let mut count = 0;
		self.for_each_primitive(|prim| {
			if prim.is_polygon() && prim.vertex_count() == 3 {
				count += 1;
			}
			ControlFlow::Continue(())
		});
		count
	}

	/// Number of polygons of any vertex count.
	pub fn count_polygons(&self) -> usize {
		let mut count = 0;
		self.for_each_primitive(|prim| {
			if prim.is_polygon() {
				count += 1;
			}
			ControlFlow::Continue(())
		});
		count
	}

	/// Gather triangle indices and materials.
	pub fn triangles(&self) -> TriangleList {
		let mut out = TriangleList::default();
		self.for_each_primitive(|prim| {
			if prim.is_polygon() && prim.vertex_count() == 3 {
				let vertices = prim.vertices();
				let point = |vtx| vertices.point(vtx).unwrap_or_default();
				out.indices.push([point(0), point(1), point(2)]);
				out.materials.push(prim.material_id());
			}
			ControlFlow::Continue(())
		});
		out
	}

	fn material_attr(&self) -> Result<Option<AttrDesc<'a>>> {
		if self.prim_attr_count() == 0 {
			return Ok(None);
		}
		let points = self.point_table()?;
		let points_end = record_offset(points.end, self.point_count(), points.record_size())?;
		let vertices = AttrTable::resolve(self.bytes, self.vertex_attr_count(), points_end, 0)?;
		let attr = AttrTable::lookup(self.bytes, self.prim_attr_count(), vertices.end, 0, MATERIAL_ATTR)?;
		Ok(attr.filter(|attr| attr.kind == AttrKind::StringIndex))
	}

	/// Number of entries in the material path table.
	pub fn material_count(&self) -> usize {
		let attr = recover("material_count", self.material_attr(), None);
		attr.and_then(|attr| attr.strings().map(|strings| strings.len())).unwrap_or(0)
	}

	/// Material path for material id `id`.
	pub fn material_path(&self, id: usize) -> Option<BinStr<'a>> {
		let attr = recover("material_path", self.material_attr(), None)?;
		attr.strings()?.get(id)
	}
}

/// `start + index * size`, rejecting arithmetic overflow.
pub(crate) fn record_offset(start: usize, index: usize, size: usize) -> Result<usize> {
	index
		.checked_mul(size)
		.and_then(|span| span.checked_add(start))
		.ok_or(HbinError::UnexpectedEof {
			at: start,
			need: usize::MAX,
			rem: 0,
		})
}
