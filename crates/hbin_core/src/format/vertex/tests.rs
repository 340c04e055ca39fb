use hbin_testkit::{AttrSpec, BgeoBuilder, be_f32s};

use crate::format::{GeoDoc, HbinError, VertexBuffer, VertexLayout};

fn floats(buffer: &VertexBuffer, vertex: usize, at: usize, count: usize) -> Vec<f32> {
	let bytes = buffer.vertex(vertex).expect("vertex in range");
	(0..count)
		.map(|i| {
			let start = at + i * 4;
			f32::from_ne_bytes(bytes[start..start + 4].try_into().expect("4 bytes"))
		})
		.collect()
}

fn ints(buffer: &VertexBuffer, vertex: usize, at: usize, count: usize) -> Vec<i32> {
	let bytes = buffer.vertex(vertex).expect("vertex in range");
	(0..count)
		.map(|i| {
			let start = at + i * 4;
			i32::from_ne_bytes(bytes[start..start + 4].try_into().expect("4 bytes"))
		})
		.collect()
}

fn skinned_layout() -> VertexLayout {
	VertexLayout {
		stride: 28,
		position: Some(0),
		weights: Some(12),
		joints: Some(20),
		max_weights: 2,
		count_influences: true,
		..VertexLayout::default()
	}
}

fn skinned_geo(captures: &[[f32; 4]]) -> Vec<u8> {
	let mut builder = BgeoBuilder::new().point_attr(AttrSpec::capture("pCapt", 2));
	for (i, capture) in captures.iter().enumerate() {
		builder = builder.point([i as f32, 0.0, 0.0], &be_f32s(capture));
	}
	builder.detail_attr(AttrSpec::strings("pCaptPath", &["/a", "/b"])).detail_values(&[0; 4]).build()
}

#[test]
fn negative_weight_is_cleared_and_not_counted() {
	let bytes = skinned_geo(&[[1.0, -0.5, -1.0, 0.0], [0.0, 1.0, -1.0, 0.0]]);
	let doc = GeoDoc::new(&bytes);
	let buffer = doc.make_vertex_buffer(&skinned_layout()).expect("layout is valid");

	assert_eq!(buffer.vertex_count, 2);
	assert_eq!(floats(&buffer, 0, 12, 2), [0.0, 0.0]);
	assert_eq!(ints(&buffer, 0, 20, 2), [0, 0]);
	assert_eq!(floats(&buffer, 1, 12, 2), [1.0, 0.0]);
	assert_eq!(ints(&buffer, 1, 20, 2), [0, 0]);
	assert_eq!(buffer.influence_counts, [1, 0]);
}

#[test]
fn positive_captures_are_kept() {
	let bytes = skinned_geo(&[[1.0, 0.6, 0.0, 0.4]]);
	let doc = GeoDoc::new(&bytes);
	let buffer = doc.make_vertex_buffer(&skinned_layout()).expect("layout is valid");

	assert_eq!(floats(&buffer, 0, 0, 3), [0.0, 0.0, 0.0]);
	assert_eq!(floats(&buffer, 0, 12, 2), [0.6, 0.4]);
	assert_eq!(ints(&buffer, 0, 20, 2), [1, 0]);
	assert_eq!(buffer.influence_counts, [1, 1]);
}

#[test]
fn weights_default_to_single_full_influence() {
	let bytes = BgeoBuilder::new().zeroed_points(1).build();
	let layout = VertexLayout {
		max_weights: 4,
		stride: 32,
		weights: Some(0),
		joints: Some(16),
		..VertexLayout::default()
	};
	let buffer = GeoDoc::new(&bytes).make_vertex_buffer(&layout).expect("layout is valid");
	assert_eq!(floats(&buffer, 0, 0, 4), [1.0, 0.0, 0.0, 0.0]);
	assert_eq!(ints(&buffer, 0, 16, 4), [0, 0, 0, 0]);
	assert!(buffer.influence_counts.is_empty());
}

#[test]
fn attributes_and_flipped_texcoord() {
	let bytes = BgeoBuilder::new()
		.point_attr(AttrSpec::vector("N"))
		.point_attr(AttrSpec::float("Cd", 3))
		.point_attr(AttrSpec::float("uv", 3))
		.point([1.0, 2.0, 3.0], &be_f32s(&[0.0, 0.0, 1.0, 0.2, 0.4, 0.6, 0.25, 0.25, 0.0]))
		.build();
	let layout = VertexLayout {
		stride: 44,
		position: Some(0),
		normal: Some(12),
		color: Some(24),
		texcoord: Some(36),
		..VertexLayout::default()
	};
	let buffer = GeoDoc::new(&bytes).make_vertex_buffer(&layout).expect("layout is valid");

	assert_eq!(buffer.bytes.len(), 44);
	assert_eq!(floats(&buffer, 0, 0, 3), [1.0, 2.0, 3.0]);
	assert_eq!(floats(&buffer, 0, 12, 3), [0.0, 0.0, 1.0]);
	assert_eq!(floats(&buffer, 0, 24, 3), [0.2, 0.4, 0.6]);
	assert_eq!(floats(&buffer, 0, 36, 2), [0.25, 0.75]);
}

#[test]
fn field_outside_stride_is_rejected() {
	let bytes = BgeoBuilder::new().zeroed_points(1).build();
	let layout = VertexLayout {
		stride: 16,
		position: Some(8),
		..VertexLayout::default()
	};
	let err = GeoDoc::new(&bytes).make_vertex_buffer(&layout).expect_err("position overflows stride");
	assert!(matches!(err, HbinError::VertexFieldOutOfStride { field: "position", .. }));
}

#[test]
fn invalid_document_bakes_nothing() {
	let layout = VertexLayout {
		stride: 12,
		position: Some(0),
		..VertexLayout::default()
	};
	let buffer = GeoDoc::new(b"nope").make_vertex_buffer(&layout).expect("layout is valid");
	assert_eq!(buffer.vertex_count, 0);
	assert!(buffer.bytes.is_empty());
}
