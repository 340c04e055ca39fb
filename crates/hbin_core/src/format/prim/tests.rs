use hbin_testkit::{AttrSpec, BgeoBuilder, PolySpec, PrimSpec, be_f32s};

use crate::format::{GeoDoc, HbinError, IndexWidth, Primitive};

fn collect(doc: &GeoDoc<'_>) -> Vec<Vec<u32>> {
	doc.prim_walker()
		.expect("walker starts")
		.map(|prim| prim.expect("primitive decodes").vertices().iter().collect())
		.collect()
}

#[test]
fn run_length_matches_individual_records() {
	let polys = [PolySpec::new(&[0, 1, 2]), PolySpec::new(&[2, 1, 3]), PolySpec::new(&[3, 0, 1])];

	let mut single = BgeoBuilder::new().zeroed_points(4);
	for poly in &polys {
		single = single.prim(PrimSpec::Poly(poly.clone()));
	}
	let single = single.build();
	let run = BgeoBuilder::new().zeroed_points(4).prim(PrimSpec::PolyRun(polys.to_vec())).build();

	let expected = collect(&GeoDoc::new(&single));
	assert_eq!(expected, vec![vec![0, 1, 2], vec![2, 1, 3], vec![3, 0, 1]]);
	assert_eq!(collect(&GeoDoc::new(&run)), expected);
}

#[test]
fn run_followed_by_single_record() {
	let bytes = BgeoBuilder::new()
		.zeroed_points(4)
		.prim(PrimSpec::PolyRun(vec![PolySpec::new(&[0, 1, 2]), PolySpec::new(&[1, 2, 3])]))
		.prim(PrimSpec::Poly(PolySpec::new(&[0, 1, 2, 3])))
		.build();
	let doc = GeoDoc::new(&bytes);
	assert_eq!(collect(&doc), vec![vec![0, 1, 2], vec![1, 2, 3], vec![0, 1, 2, 3]]);

	let mut walker = doc.prim_walker().expect("walker starts");
	walker.by_ref().for_each(drop);
	assert_eq!(walker.end(), bytes.len());
}

#[test]
fn vertex_attributes_widen_the_index_stride() {
	let mut poly = PolySpec::new(&[2, 0, 1]);
	poly.vertex_values = be_f32s(&[0.5]);
	let bytes = BgeoBuilder::new()
		.zeroed_points(3)
		.vertex_attr(AttrSpec::float("w", 1))
		.prim(PrimSpec::Poly(poly))
		.build();
	assert_eq!(collect(&GeoDoc::new(&bytes)), vec![vec![2, 0, 1]]);
}

#[test]
fn wide_point_counts_use_u32_indices() {
	let bytes = BgeoBuilder::new()
		.zeroed_points(0x1_0001)
		.prim(PrimSpec::Poly(PolySpec::new(&[0x1_0000, 1, 2])))
		.build();
	let doc = GeoDoc::new(&bytes);
	assert_eq!(doc.layout().expect("layout resolves").index_width, IndexWidth::U32);
	assert_eq!(collect(&doc), vec![vec![0x1_0000, 1, 2]]);
}

#[test]
fn sphere_decodes_transform_and_center() {
	let transform = [1.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 3.0];
	let bytes = BgeoBuilder::new()
		.zeroed_points(2)
		.prim(PrimSpec::Sphere {
			index: 1,
			transform,
			prim_values: Vec::new(),
		})
		.prim(PrimSpec::Poly(PolySpec::new(&[0, 1, 0])))
		.build();
	let doc = GeoDoc::new(&bytes);
	let prims: Vec<_> = doc.prim_walker().expect("walker starts").collect::<Result<_, _>>().expect("stream decodes");

	assert_eq!(prims.len(), 2);
	match prims[0] {
		Primitive::Sphere { id, transform: decoded, .. } => {
			assert_eq!(id, 0);
			assert_eq!(decoded, transform);
		}
		_ => panic!("expected sphere"),
	}
	assert_eq!(prims[0].vertex_count(), 1);
	assert_eq!(prims[0].vertex_point(0), Some(1));
	assert!(prims[1].is_polygon());
	assert_eq!(prims[1].id(), 1);
	assert_eq!(doc.count_triangles(), 1);
}

#[test]
fn unknown_tag_ends_stream_without_error() {
	let bytes = BgeoBuilder::new()
		.zeroed_points(3)
		.prim(PrimSpec::Poly(PolySpec::new(&[0, 1, 2])))
		.prim(PrimSpec::Tag(0x77))
		.prim_count(3)
		.build();
	let doc = GeoDoc::new(&bytes);
	let mut walker = doc.prim_walker().expect("walker starts");
	assert!(walker.next().expect("first primitive").is_ok());
	assert!(walker.next().is_none());
	assert_eq!(walker.end(), bytes.len());
}

#[test]
fn truncated_record_yields_error_once() {
	let bytes = BgeoBuilder::new()
		.zeroed_points(3)
		.prim(PrimSpec::Poly(PolySpec::new(&[0, 1, 2])))
		.build();
	let cut = &bytes[..bytes.len() - 2];
	let doc = GeoDoc::new(cut);
	let mut walker = doc.prim_walker().expect("walker starts");
	let err = walker.next().expect("one item").expect_err("record is truncated");
	assert!(matches!(err, HbinError::UnexpectedEof { .. }));
	assert!(walker.next().is_none());
	assert_eq!(doc.count_triangles(), 0);
}

#[test]
fn out_of_range_vertex_reads_none() {
	let bytes = BgeoBuilder::new()
		.zeroed_points(3)
		.prim(PrimSpec::Poly(PolySpec::new(&[0, 1, 2])))
		.build();
	let doc = GeoDoc::new(&bytes);
	let prim = doc.prim_walker().expect("walker starts").next().expect("one primitive").expect("decodes");
	assert_eq!(prim.vertex_point(2), Some(2));
	assert_eq!(prim.vertex_point(3), None);
	assert_eq!(prim.material_id(), None);
}
