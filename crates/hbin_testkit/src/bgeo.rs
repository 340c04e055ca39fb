use crate::{be_f32s, be_i32s, push_len, push_str};

/// Header size; attribute descriptors for points start here.
pub const HEADER_SIZE: usize = 0x29;

/// Attribute descriptor to encode.
#[derive(Debug, Clone)]
pub struct AttrSpec {
	/// Attribute name.
	pub name: String,
	/// Declared element count.
	pub element_count: usize,
	/// Raw 32-bit type tag.
	pub tag: u32,
	/// Inline string table (index attributes only).
	pub strings: Vec<String>,
	/// Default-value bytes written after the tag for non-index kinds.
	pub default: Vec<u8>,
}

impl AttrSpec {
	/// Descriptor with an explicit tag and zeroed default of `default_len` bytes.
	pub fn raw(name: &str, element_count: usize, tag: u32, default_len: usize) -> Self {
		Self {
			name: name.to_owned(),
			element_count,
			tag,
			strings: Vec::new(),
			default: vec![0; default_len],
		}
	}

	/// `count` floats per record.
	pub fn float(name: &str, count: usize) -> Self {
		Self::raw(name, count, 0, 4 * count)
	}

	/// `count` ints per record.
	pub fn int(name: &str, count: usize) -> Self {
		Self::raw(name, count, 1, 4 * count)
	}

	/// Three-float vector.
	pub fn vector(name: &str) -> Self {
		Self::raw(name, 3, 5, 12)
	}

	/// Single string index with the given table.
	pub fn strings(name: &str, entries: &[&str]) -> Self {
		Self {
			name: name.to_owned(),
			element_count: 1,
			tag: 4,
			strings: entries.iter().map(|entry| (*entry).to_owned()).collect(),
			default: Vec::new(),
		}
	}

	/// Capture weight array holding `max_captures` `(node, weight)` pairs.
	pub fn capture(name: &str, max_captures: usize) -> Self {
		Self::raw(name, 2 * max_captures, 0x10000, 8 * max_captures)
	}

	/// Append the encoded descriptor.
	pub fn write(&self, out: &mut Vec<u8>) {
		push_str(out, &self.name);
		push_len(out, self.element_count);
		out.extend_from_slice(&self.tag.to_be_bytes());
		if self.tag & 0xFFFF == 4 {
			out.extend_from_slice(&(self.strings.len() as i32).to_be_bytes());
			for entry in &self.strings {
				push_str(out, entry);
			}
		} else {
			out.extend_from_slice(&self.default);
		}
	}
}

/// One polygon body (no type tag).
#[derive(Debug, Clone, Default)]
pub struct PolySpec {
	/// Point index per vertex.
	pub indices: Vec<u32>,
	/// Bytes appended after every vertex index.
	pub vertex_values: Vec<u8>,
	/// Trailing primitive attribute bytes.
	pub prim_values: Vec<u8>,
}

impl PolySpec {
	/// Polygon without attribute bytes.
	pub fn new(indices: &[u32]) -> Self {
		Self {
			indices: indices.to_vec(),
			..Self::default()
		}
	}

	/// Polygon whose primitive attribute bytes are one material index.
	pub fn with_material(indices: &[u32], material: i32) -> Self {
		Self {
			indices: indices.to_vec(),
			vertex_values: Vec::new(),
			prim_values: material.to_be_bytes().to_vec(),
		}
	}
}

/// Primitive stream entry.
#[derive(Debug, Clone)]
pub enum PrimSpec {
	/// Tagged single polygon.
	Poly(PolySpec),
	/// Run-length block of polygons sharing one type tag.
	PolyRun(Vec<PolySpec>),
	/// Sphere with point index and 3x3 transform.
	Sphere {
		/// Center point index.
		index: u32,
		/// Row-major 3x3 transform.
		transform: [f32; 9],
		/// Trailing primitive attribute bytes.
		prim_values: Vec<u8>,
	},
	/// Bare type tag with no body.
	Tag(i32),
}

/// Builder for synthetic `.bgeo` buffers.
#[derive(Debug, Clone, Default)]
pub struct BgeoBuilder {
	version: i32,
	point_groups: i32,
	prim_groups: i32,
	point_attrs: Vec<AttrSpec>,
	vertex_attrs: Vec<AttrSpec>,
	prim_attrs: Vec<AttrSpec>,
	detail_attrs: Vec<AttrSpec>,
	points: Vec<Vec<u8>>,
	prims: Vec<PrimSpec>,
	prim_count: Option<i32>,
	detail_values: Vec<u8>,
}

impl BgeoBuilder {
	/// Empty geometry, version 5.
	pub fn new() -> Self {
		Self {
			version: 5,
			..Self::default()
		}
	}

	/// Set the header version.
	pub fn version(mut self, version: i32) -> Self {
		self.version = version;
		self
	}

	/// Set the point/primitive group counts.
	pub fn groups(mut self, point_groups: i32, prim_groups: i32) -> Self {
		self.point_groups = point_groups;
		self.prim_groups = prim_groups;
		self
	}

	/// Append a point attribute descriptor.
	pub fn point_attr(mut self, spec: AttrSpec) -> Self {
		self.point_attrs.push(spec);
		self
	}

	/// Append a vertex attribute descriptor.
	pub fn vertex_attr(mut self, spec: AttrSpec) -> Self {
		self.vertex_attrs.push(spec);
		self
	}

	/// Append a primitive attribute descriptor.
	pub fn prim_attr(mut self, spec: AttrSpec) -> Self {
		self.prim_attrs.push(spec);
		self
	}

	/// Append a detail attribute descriptor.
	pub fn detail_attr(mut self, spec: AttrSpec) -> Self {
		self.detail_attrs.push(spec);
		self
	}

	/// Append a point at `pos` (w = 1) followed by raw attribute value bytes.
	pub fn point(mut self, pos: [f32; 3], values: &[u8]) -> Self {
		let mut record = be_f32s(&[pos[0], pos[1], pos[2], 1.0]);
		record.extend_from_slice(values);
		self.points.push(record);
		self
	}

	/// Append `count` points at the origin with no attribute bytes.
	pub fn zeroed_points(mut self, count: usize) -> Self {
		for _ in 0..count {
			self.points.push(be_f32s(&[0.0, 0.0, 0.0, 1.0]));
		}
		self
	}

	/// Append a primitive stream entry.
	pub fn prim(mut self, spec: PrimSpec) -> Self {
		self.prims.push(spec);
		self
	}

	/// Override the header primitive count (defaults to the number of encoded primitives).
	pub fn prim_count(mut self, count: i32) -> Self {
		self.prim_count = Some(count);
		self
	}

	/// Raw bytes of the single detail record following the detail descriptors.
	pub fn detail_values(mut self, values: &[u8]) -> Self {
		self.detail_values = values.to_vec();
		self
	}

	/// Encode the buffer.
	pub fn build(&self) -> Vec<u8> {
		let wide = self.points.len() > 0xFFFF;
		let encoded_prims: i32 = self
			.prims
			.iter()
			.map(|spec| match spec {
				PrimSpec::PolyRun(items) => items.len() as i32,
				PrimSpec::Tag(_) => 0,
				_ => 1,
			})
			.sum();

		let mut out = Vec::new();
		out.extend_from_slice(b"BgeoV");
		out.extend_from_slice(&be_i32s(&[
			self.version,
			self.points.len() as i32,
			self.prim_count.unwrap_or(encoded_prims),
			self.point_groups,
			self.prim_groups,
			self.point_attrs.len() as i32,
			self.vertex_attrs.len() as i32,
			self.prim_attrs.len() as i32,
			self.detail_attrs.len() as i32,
		]));
		debug_assert_eq!(out.len(), HEADER_SIZE);

		for spec in &self.point_attrs {
			spec.write(&mut out);
		}
		for record in &self.points {
			out.extend_from_slice(record);
		}
		for spec in &self.vertex_attrs {
			spec.write(&mut out);
		}
		for spec in &self.prim_attrs {
			spec.write(&mut out);
		}
		for spec in &self.prims {
			write_prim(&mut out, spec, wide);
		}
		for spec in &self.detail_attrs {
			spec.write(&mut out);
		}
		out.extend_from_slice(&self.detail_values);
		out
	}
}

fn write_index(out: &mut Vec<u8>, index: u32, wide: bool) {
	if wide {
		out.extend_from_slice(&index.to_be_bytes());
	} else {
		out.extend_from_slice(&(index as u16).to_be_bytes());
	}
}

fn write_poly_body(out: &mut Vec<u8>, poly: &PolySpec, wide: bool) {
	out.extend_from_slice(&(poly.indices.len() as i32).to_be_bytes());
	out.push(0);
	for index in &poly.indices {
		write_index(out, *index, wide);
		out.extend_from_slice(&poly.vertex_values);
	}
	out.extend_from_slice(&poly.prim_values);
}

fn write_prim(out: &mut Vec<u8>, spec: &PrimSpec, wide: bool) {
	match spec {
		PrimSpec::Poly(poly) => {
			out.extend_from_slice(&1_i32.to_be_bytes());
			write_poly_body(out, poly, wide);
		}
		PrimSpec::PolyRun(items) => {
			out.extend_from_slice(&(-1_i32).to_be_bytes());
			out.extend_from_slice(&(items.len() as u16).to_be_bytes());
			out.extend_from_slice(&1_i32.to_be_bytes());
			for poly in items {
				write_poly_body(out, poly, wide);
			}
		}
		PrimSpec::Sphere { index, transform, prim_values } => {
			out.extend_from_slice(&0x2000_i32.to_be_bytes());
			write_index(out, *index, wide);
			out.extend_from_slice(&be_f32s(transform));
			out.extend_from_slice(prim_values);
		}
		PrimSpec::Tag(tag) => out.extend_from_slice(&tag.to_be_bytes()),
	}
}
