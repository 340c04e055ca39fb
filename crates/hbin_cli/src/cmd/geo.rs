use std::ops::ControlFlow;
use std::path::Path;

use hbin::format::{AttrDesc, GeoDoc, GeoHeader, HbinFile, Result};

use crate::cmd::util::emit_json;

/// Convert a geometry file and emit it.
pub fn run(file: &HbinFile, out: Option<&Path>) -> Result<()> {
	GeoHeader::parse(file.bytes())?;
	let payload = geo_json(&file.geo());
	tracing::debug!(points = payload.npnt, triangles = payload.ntri, polygons = payload.npol, "converted geometry");
	emit_json(&payload, out)
}

/// Build the JSON payload for a valid document.
pub(crate) fn geo_json(doc: &GeoDoc<'_>) -> GeoJson {
	let attrs = doc.point_attrs();
	let npnt = doc.stored_point_count();
	let ntri = doc.count_triangles();
	let npol = doc.count_polygons();
	let ncapt_nodes = doc.capture_node_count();
	let max_capts = doc.max_captures_per_point();

	let pnt_attr_names = attr_names(&attrs, |_| true);
	let pnt_vec_attr_names = attr_names(&attrs, |attr| attr.is_vector());
	let pnt_str_attr_names = attr_names(&attrs, |attr| attr.is_string());

	let pnts = (0..npnt).flat_map(|id| doc.point_position(id)).collect();
	let pnts_vec_data = pnt_vec_attr_names
		.iter()
		.flat_map(|name| (0..npnt).flat_map(move |id| doc.point_vector_attr(name, id)))
		.collect();
	let pnts_str_data = pnt_str_attr_names
		.iter()
		.flat_map(|name| (0..npnt).map(move |id| doc.point_string_attr(name, id).map(|value| value.to_string()).unwrap_or_default()))
		.collect();

	let mut pnts_capt_nodes = Vec::with_capacity(npnt * max_capts);
	let mut pnts_capt_weights = Vec::with_capacity(npnt * max_capts);
	for id in 0..npnt {
		for slot in 0..max_capts {
			let capture = doc.point_capture(id, slot);
			pnts_capt_nodes.push(capture.node);
			pnts_capt_weights.push(capture.weight);
		}
	}

	let mut pol_idx = Vec::new();
	let mut pols = Vec::new();
	if npol > 0 && npol != ntri {
		doc.for_each_primitive(|prim| {
			if prim.is_polygon() {
				pols.extend([pol_idx.len(), prim.vertex_count()]);
				pol_idx.extend(prim.vertices().iter());
			}
			ControlFlow::Continue(())
		});
	}

	GeoJson {
		data_type: "geo",
		npnt,
		ntri,
		npol,
		nmtl: doc.material_count(),
		npnt_attrs: doc.point_attr_count(),
		npnt_vec_attrs: pnt_vec_attr_names.len(),
		npnt_str_attrs: pnt_str_attr_names.len(),
		nprim_attrs: doc.prim_attr_count(),
		ncapt_nodes,
		max_capts_per_pnt: max_capts,
		capt_nodes: (0..ncapt_nodes)
			.map(|id| doc.capture_node_path(id).map(|path| path.to_string()).unwrap_or_default())
			.collect(),
		pnt_attr_names,
		pnt_vec_attr_names,
		pnt_str_attr_names,
		pnts,
		pnts_vec_data,
		pnts_str_data,
		pnts_capt_nodes,
		pnts_capt_weights,
		tri_idx: doc.triangles().indices_u32(),
		pol_idx,
		pols,
		eof: true,
	}
}

fn attr_names(attrs: &[AttrDesc<'_>], keep: impl Fn(&AttrDesc<'_>) -> bool) -> Vec<String> {
	attrs.iter().filter(|attr| keep(attr)).map(|attr| attr.name.to_string()).collect()
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeoJson {
	pub data_type: &'static str,
	pub npnt: usize,
	pub ntri: usize,
	pub npol: usize,
	pub nmtl: usize,
	pub npnt_attrs: usize,
	pub npnt_vec_attrs: usize,
	pub npnt_str_attrs: usize,
	pub nprim_attrs: usize,
	pub ncapt_nodes: usize,
	pub max_capts_per_pnt: usize,
	pub pnt_attr_names: Vec<String>,
	pub pnt_vec_attr_names: Vec<String>,
	pub pnt_str_attr_names: Vec<String>,
	pub capt_nodes: Vec<String>,
	pub pnts: Vec<f32>,
	pub pnts_vec_data: Vec<f32>,
	pub pnts_str_data: Vec<String>,
	pub pnts_capt_nodes: Vec<i32>,
	pub pnts_capt_weights: Vec<f32>,
	pub tri_idx: Vec<u32>,
	pub pol_idx: Vec<u32>,
	pub pols: Vec<usize>,
	#[serde(rename = "_EOF_")]
	pub eof: bool,
}
