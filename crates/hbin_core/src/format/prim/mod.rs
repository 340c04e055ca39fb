use crate::format::bytes::Cursor;
use crate::format::geo::MATERIAL_ATTR;
use crate::format::{AttrKind, GeoLayout, HbinError, Result, be_i32, be_u16, be_u32};

/// Primitive type tag for polygons.
pub const POLY_TAG: i32 = 1;
/// Primitive type tag for spheres.
pub const SPHERE_TAG: i32 = 0x2000;
/// Type tag introducing a run of same-type primitives.
pub const RUN_TAG: i32 = -1;

/// Byte width of vertex point indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexWidth {
	/// 16-bit indices, used while the point count fits in `u16`.
	U16,
	/// 32-bit indices.
	U32,
}

impl IndexWidth {
	/// Pick the width for a document with `point_count` points.
	pub fn for_point_count(point_count: usize) -> Self {
		if point_count > 0xFFFF { Self::U32 } else { Self::U16 }
	}

	/// Width in bytes.
	pub fn size(self) -> usize {
		match self {
			Self::U16 => 2,
			Self::U32 => 4,
		}
	}
}

/// Vertex-to-point index region of one primitive.
#[derive(Debug, Clone, Copy)]
pub struct VertexRefs<'a> {
	region: &'a [u8],
	width: IndexWidth,
	stride: usize,
	count: usize,
}

impl<'a> VertexRefs<'a> {
	/// Number of vertices.
	pub fn len(&self) -> usize {
		self.count
	}

	/// Return true when the primitive has no vertices.
	pub fn is_empty(&self) -> bool {
		self.count == 0
	}

	/// Point index referenced by vertex `vtx`.
	pub fn point(&self, vtx: usize) -> Option<u32> {
		if vtx >= self.count {
			return None;
		}
		let start = vtx.checked_mul(self.stride)?;
		let raw = self.region.get(start..start + self.width.size())?;
		match self.width {
			IndexWidth::U16 => Some(u32::from(be_u16(raw.try_into().ok()?))),
			IndexWidth::U32 => Some(be_u32(raw.try_into().ok()?)),
		}
	}

	/// Point indices in vertex order.
	pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
		(0..self.count).filter_map(|vtx| self.point(vtx))
	}
}

/// One decoded primitive record.
#[derive(Debug, Clone, Copy)]
pub enum Primitive<'a> {
	/// Polygon with an arbitrary vertex count.
	Polygon {
		/// Position in the primitive stream.
		id: usize,
		/// Vertex point references.
		vertices: VertexRefs<'a>,
		/// Index into the material path table.
		material_id: Option<u32>,
	},
	/// Sphere centered on a single point.
	Sphere {
		/// Position in the primitive stream.
		id: usize,
		/// Single center vertex.
		vertices: VertexRefs<'a>,
		/// Row-major 3x3 transform.
		transform: [f32; 9],
		/// Index into the material path table.
		material_id: Option<u32>,
	},
}

impl<'a> Primitive<'a> {
	/// Position in the primitive stream.
	pub fn id(&self) -> usize {
		match self {
			Self::Polygon { id, .. } | Self::Sphere { id, .. } => *id,
		}
	}

	/// Vertex point references.
	pub fn vertices(&self) -> VertexRefs<'a> {
		match self {
			Self::Polygon { vertices, .. } | Self::Sphere { vertices, .. } => *vertices,
		}
	}

	/// Number of vertices; spheres always have one.
	pub fn vertex_count(&self) -> usize {
		self.vertices().len()
	}

	/// Point index of vertex `vtx`, `None` when out of range.
	pub fn vertex_point(&self, vtx: usize) -> Option<u32> {
		self.vertices().point(vtx)
	}

	/// Material id, `None` without a material attribute.
	pub fn material_id(&self) -> Option<u32> {
		match self {
			Self::Polygon { material_id, .. } | Self::Sphere { material_id, .. } => *material_id,
		}
	}

	/// Return true for polygons.
	pub fn is_polygon(&self) -> bool {
		matches!(self, Self::Polygon { .. })
	}

	/// Return true for spheres.
	pub fn is_sphere(&self) -> bool {
		matches!(self, Self::Sphere { .. })
	}
}

/// Forward-only decoder over the primitive stream.
///
/// Yields at most the declared primitive count. An unrecognized type tag ends the stream
/// without an error; a truncated record yields one error and then ends it.
pub struct PrimWalker<'a> {
	cursor: Cursor<'a>,
	width: IndexWidth,
	vertex_size: usize,
	prim_size: usize,
	material_offset: Option<usize>,
	next_id: usize,
	prim_count: usize,
	run_left: usize,
	tag: i32,
	done: bool,
}

impl<'a> PrimWalker<'a> {
	/// Start walking at `layout.prim_stream_start`.
	pub fn new(bytes: &'a [u8], layout: &GeoLayout<'a>, prim_count: usize) -> Self {
		let material_offset = layout
			.prims
			.find(MATERIAL_ATTR)
			.filter(|attr| attr.kind == AttrKind::StringIndex)
			.map(|attr| attr.value_offset);

		Self {
			cursor: Cursor::at(bytes, layout.prim_stream_start),
			width: layout.index_width,
			vertex_size: layout.vertices.record_size(),
			prim_size: layout.prims.record_size(),
			material_offset,
			next_id: 0,
			prim_count,
			run_left: 0,
			tag: 0,
			done: false,
		}
	}

	/// Offset one past everything consumed so far.
	///
	/// After exhaustion this is the end of the primitive stream, or the byte after an
	/// unrecognized type tag.
	pub fn end(&self) -> usize {
		self.cursor.pos()
	}

	/// Drain the walker and return [`end`](Self::end).
	pub fn finish(mut self) -> Result<usize> {
		for prim in self.by_ref() {
			prim?;
		}
		Ok(self.end())
	}

	fn next_tag(&mut self) -> Result<i32> {
		if self.run_left > 0 {
			self.run_left -= 1;
			return Ok(self.tag);
		}

		let tag = self.cursor.read_i32()?;
		if tag == RUN_TAG {
			let len = self.cursor.read_u16()?;
			self.tag = self.cursor.read_i32()?;
			self.run_left = usize::from(len).saturating_sub(1);
		} else {
			self.tag = tag;
			self.run_left = 0;
		}
		Ok(self.tag)
	}

	fn vertex_refs(&mut self, count: usize) -> Result<VertexRefs<'a>> {
		let stride = self.width.size() + self.vertex_size;
		let at = self.cursor.pos();
		let len = count.checked_mul(stride).ok_or(HbinError::UnexpectedEof {
			at,
			need: usize::MAX,
			rem: self.cursor.remaining(),
		})?;
		Ok(VertexRefs {
			region: self.cursor.read_exact(len)?,
			width: self.width,
			stride,
			count,
		})
	}

	fn material(&mut self) -> Result<Option<u32>> {
		let values = self.cursor.read_exact(self.prim_size)?;
		let Some(offset) = self.material_offset else {
			return Ok(None);
		};
		let id = values
			.get(offset..offset + 4)
			.and_then(|raw| raw.try_into().ok())
			.map(be_i32);
		Ok(id.and_then(|id| u32::try_from(id).ok()))
	}

	fn parse_polygon(&mut self, id: usize) -> Result<Primitive<'a>> {
		let count = self.cursor.read_count()?;
		self.cursor.skip(1)?;
		let vertices = self.vertex_refs(count)?;
		let material_id = self.material()?;
		Ok(Primitive::Polygon { id, vertices, material_id })
	}

	fn parse_sphere(&mut self, id: usize) -> Result<Primitive<'a>> {
		let index = self.cursor.read_exact(self.width.size())?;
		let mut transform = [0.0_f32; 9];
		for slot in &mut transform {
			*slot = self.cursor.read_f32()?;
		}
		self.cursor.skip(self.vertex_size)?;
		let material_id = self.material()?;
		let vertices = VertexRefs {
			region: index,
			width: self.width,
			stride: self.width.size(),
			count: 1,
		};
		Ok(Primitive::Sphere {
			id,
			vertices,
			transform,
			material_id,
		})
	}

	fn parse_next(&mut self) -> Result<Option<Primitive<'a>>> {
		let id = self.next_id;
		let tag = self.next_tag()?;
		let prim = match tag {
			POLY_TAG => self.parse_polygon(id)?,
			SPHERE_TAG => self.parse_sphere(id)?,
			other => {
				tracing::trace!(tag = other, id, at = self.cursor.pos(), "unrecognized primitive tag ends stream");
				return Ok(None);
			}
		};
		self.next_id += 1;
		Ok(Some(prim))
	}
}

impl<'a> Iterator for PrimWalker<'a> {
	type Item = Result<Primitive<'a>>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.done || self.next_id >= self.prim_count {
			return None;
		}

		match self.parse_next() {
			Ok(Some(prim)) => Some(Ok(prim)),
			Ok(None) => {
				self.done = true;
				None
			}
			Err(err) => {
				self.done = true;
				Some(Err(err))
			}
		}
	}
}

#[cfg(test)]
mod tests;
