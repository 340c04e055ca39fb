//! Interleaved per-point vertex buffer baking.

use crate::format::bytes::Cursor;
use crate::format::error::recover;
use crate::format::{AttrDesc, AttrKind, AttrTable, Capture, GeoDoc, HbinError, Result};

/// Byte layout of one baked vertex. `None` disables a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexLayout {
	/// Bytes per vertex.
	pub stride: usize,
	/// Position, 3 floats.
	pub position: Option<usize>,
	/// Normal (`N`), 3 floats.
	pub normal: Option<usize>,
	/// Color (`Cd`), 3 floats.
	pub color: Option<usize>,
	/// Texture coordinate (`uv`), 2 floats with V flipped.
	pub texcoord: Option<usize>,
	/// Capture weights, `max_weights` floats.
	pub weights: Option<usize>,
	/// Capture node indices, `max_weights` signed ints.
	pub joints: Option<usize>,
	/// Weight/index slots per vertex.
	pub max_weights: usize,
	/// Count retained influences per capture node.
	pub count_influences: bool,
}

impl VertexLayout {
	fn fields(&self) -> [(&'static str, Option<usize>, usize); 6] {
		let skin = self.max_weights * 4;
		[
			("position", self.position, 12),
			("normal", self.normal, 12),
			("color", self.color, 12),
			("texcoord", self.texcoord, 8),
			("weights", self.weights, skin),
			("joints", self.joints, skin),
		]
	}

	/// Reject fields that do not fit inside `stride`.
	pub fn validate(&self) -> Result<()> {
		for (field, offset, size) in self.fields() {
			let Some(offset) = offset else {
				continue;
			};
			if offset.checked_add(size).is_none_or(|end| end > self.stride) {
				return Err(HbinError::VertexFieldOutOfStride {
					field,
					offset,
					size,
					stride: self.stride,
				});
			}
		}
		Ok(())
	}
}

/// Baked vertex data, native-endian.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexBuffer {
	/// `vertex_count * stride` bytes.
	pub bytes: Vec<u8>,
	/// Bytes per vertex.
	pub stride: usize,
	/// One vertex per point.
	pub vertex_count: usize,
	/// Retained influences per capture node; empty unless requested.
	pub influence_counts: Vec<u32>,
}

impl VertexBuffer {
	/// Bytes of vertex `index`.
	pub fn vertex(&self, index: usize) -> Option<&[u8]> {
		let start = index.checked_mul(self.stride)?;
		self.bytes.get(start..start + self.stride)
	}
}

struct PointAttrs<'a> {
	table: AttrTable<'a>,
	normal: Option<AttrDesc<'a>>,
	color: Option<AttrDesc<'a>>,
	texcoord: Option<AttrDesc<'a>>,
	capture: Option<AttrDesc<'a>>,
}

impl<'a> PointAttrs<'a> {
	fn resolve(doc: &GeoDoc<'a>) -> Result<Self> {
		let table = doc.point_table()?;
		let normal = table.find(b"N").copied();
		let color = table.find(b"Cd").copied();
		let texcoord = table.find(b"uv").copied();
		let capture = table.find(b"pCapt").filter(|attr| attr.kind == AttrKind::CaptureWeights).copied();
		Ok(Self {
			table,
			normal,
			color,
			texcoord,
			capture,
		})
	}

	fn vector(&self, doc: &GeoDoc<'a>, attr: Option<&AttrDesc<'a>>, record: usize) -> [f32; 3] {
		let Some(attr) = attr else {
			return [0.0; 3];
		};
		recover("make_vertex_buffer", attr.read_vector(doc.bytes(), record), [0.0; 3])
	}

	fn capture(&self, doc: &GeoDoc<'a>, record: usize, slot: usize) -> Capture {
		let Some(attr) = &self.capture else {
			return Capture::default();
		};
		recover("make_vertex_buffer", read_capture(doc.bytes(), record + attr.value_offset + slot * 8), Capture::default())
	}
}

fn read_position(bytes: &[u8], record: usize) -> Result<[f32; 3]> {
	let mut cursor = Cursor::at(bytes, record);
	Ok([cursor.read_f32()?, cursor.read_f32()?, cursor.read_f32()?])
}

fn read_capture(bytes: &[u8], at: usize) -> Result<Capture> {
	let mut cursor = Cursor::at(bytes, at);
	let node = cursor.read_f32()? as i32;
	let weight = cursor.read_f32()?;
	Ok(Capture { node, weight })
}

fn put_f32s(out: &mut [u8], at: usize, values: &[f32]) {
	for (i, value) in values.iter().enumerate() {
		let start = at + i * 4;
		out[start..start + 4].copy_from_slice(&value.to_ne_bytes());
	}
}

fn put_i32s(out: &mut [u8], at: usize, values: &[i32]) {
	for (i, value) in values.iter().enumerate() {
		let start = at + i * 4;
		out[start..start + 4].copy_from_slice(&value.to_ne_bytes());
	}
}

impl GeoDoc<'_> {
	/// Bake one vertex per point into an interleaved buffer.
	///
	/// Capture slots are filled up to `min(max_weights, max_captures_per_point)` and only when
	/// both weight and joint fields are enabled. A slot with a negative node or a non-positive
	/// weight is cleared to `(0, 0.0)`; without captures the first weight is `1.0`.
	pub fn make_vertex_buffer(&self, layout: &VertexLayout) -> Result<VertexBuffer> {
		layout.validate()?;
		if !self.is_valid() || self.point_count() == 0 {
			return Ok(VertexBuffer {
				stride: layout.stride,
				..VertexBuffer::default()
			});
		}

		let attrs = match PointAttrs::resolve(self) {
			Ok(attrs) => attrs,
			Err(err) => {
				tracing::debug!(%err, "point table unavailable, vertex buffer left empty");
				return Ok(VertexBuffer {
					stride: layout.stride,
					..VertexBuffer::default()
				});
			}
		};

		let record_size = attrs.table.record_size();
		let vertex_count = self.stored_point_count();

		let skinned = layout.weights.is_some() && layout.joints.is_some();
		let slots = if skinned { layout.max_weights.min(self.max_captures_per_point()) } else { 0 };
		let mut influence_counts = if layout.count_influences { vec![0_u32; self.capture_node_count()] } else { Vec::new() };

		let mut bytes = vec![0_u8; vertex_count * layout.stride];
		let mut weights = vec![0.0_f32; layout.max_weights];
		let mut joints = vec![0_i32; layout.max_weights];

		for point in 0..vertex_count {
			let vertex = point * layout.stride;
			let record = attrs.table.end + point * record_size;

			if let Some(at) = layout.position {
				let xyz = recover("make_vertex_buffer", read_position(self.bytes(), record), [0.0; 3]);
				put_f32s(&mut bytes, vertex + at, &xyz);
			}
			if let Some(at) = layout.normal {
				put_f32s(&mut bytes, vertex + at, &attrs.vector(self, attrs.normal.as_ref(), record));
			}
			if let Some(at) = layout.color {
				put_f32s(&mut bytes, vertex + at, &attrs.vector(self, attrs.color.as_ref(), record));
			}
			if let Some(at) = layout.texcoord {
				let [u, v, _] = attrs.vector(self, attrs.texcoord.as_ref(), record);
				put_f32s(&mut bytes, vertex + at, &[u, 1.0 - v]);
			}

			if layout.weights.is_none() && layout.joints.is_none() {
				continue;
			}
			weights.fill(0.0);
			joints.fill(0);
			if let Some(first) = weights.first_mut() {
				*first = 1.0;
			}
			for slot in 0..slots {
				let capture = attrs.capture(self, record, slot);
				let (joint, weight) = if capture.node < 0 || capture.weight <= 0.0 { (0, 0.0) } else { (capture.node, capture.weight) };
				joints[slot] = joint;
				weights[slot] = weight;
				if weight > 0.0 {
					if let Some(count) = usize::try_from(joint).ok().and_then(|joint| influence_counts.get_mut(joint)) {
						*count += 1;
					}
				}
			}
			if let Some(at) = layout.weights {
				put_f32s(&mut bytes, vertex + at, &weights);
			}
			if let Some(at) = layout.joints {
				put_i32s(&mut bytes, vertex + at, &joints);
			}
		}

		Ok(VertexBuffer {
			bytes,
			stride: layout.stride,
			vertex_count,
			influence_counts,
		})
	}
}

#[cfg(test)]
mod tests;
