use hbin_testkit::{AttrSpec, be_f32s};

use crate::format::{AttrDescIter, AttrKind, AttrTable, HbinError};

fn encode(specs: &[AttrSpec]) -> Vec<u8> {
	let mut out = Vec::new();
	for spec in specs {
		spec.write(&mut out);
	}
	out
}

#[test]
fn vector_attribute_resolves_twelve_bytes() {
	let bytes = encode(&[AttrSpec::vector("N")]);
	let table = AttrTable::resolve(&bytes, 1, 0, 16).expect("table resolves");
	let attr = table.get(0).expect("one attribute");
	assert_eq!(attr.kind, AttrKind::Vector3);
	assert_eq!(attr.value_size, 12);
	assert_eq!(attr.value_offset, 16);
	assert_eq!(table.record_size(), 28);
	assert_eq!(table.end, bytes.len());
}

#[test]
fn value_offsets_are_running_prefix_sums() {
	let bytes = encode(&[
		AttrSpec::float("pscale", 1),
		AttrSpec::strings("name", &["a", "b"]),
		AttrSpec::int("id", 2),
		AttrSpec::vector("Cd"),
	]);
	let table = AttrTable::resolve(&bytes, 4, 0, 16).expect("table resolves");
	let offsets: Vec<_> = table.iter().map(|attr| (attr.value_offset, attr.value_size)).collect();
	assert_eq!(offsets, vec![(16, 4), (20, 4), (24, 8), (32, 12)]);
	assert_eq!(table.record_size(), 44);
}

#[test]
fn oversized_vector_count_still_reads_three_components() {
	let spec = AttrSpec::raw("v", 4, 5, 12);
	let mut bytes = encode(&[spec]);
	let record_start = bytes.len();
	bytes.extend_from_slice(&be_f32s(&[1.0, 2.0, 3.0]));

	let table = AttrTable::resolve(&bytes, 1, 0, 0).expect("table resolves");
	let attr = table.get(0).expect("attribute");
	assert_eq!(attr.element_count, 4);
	assert_eq!(attr.value_size, 12);
	assert_eq!(attr.read_vector(&bytes, record_start).expect("vector reads"), [1.0, 2.0, 3.0]);
}

#[test]
fn int_components_convert_to_float() {
	let mut bytes = encode(&[AttrSpec::int("ids", 2)]);
	let record_start = bytes.len();
	bytes.extend_from_slice(&7_i32.to_be_bytes());
	bytes.extend_from_slice(&(-3_i32).to_be_bytes());

	let table = AttrTable::resolve(&bytes, 1, 0, 0).expect("table resolves");
	let attr = table.get(0).expect("attribute");
	assert_eq!(attr.read_vector(&bytes, record_start).expect("vector reads"), [7.0, -3.0, 0.0]);
}

#[test]
fn string_table_is_kept_in_descriptor_region() {
	let bytes = encode(&[AttrSpec::strings("shop_materialpath", &["/mat/a", "/mat/bb"])]);
	let table = AttrTable::resolve(&bytes, 1, 0, 0).expect("table resolves");
	let attr = table.get(0).expect("attribute");
	assert_eq!(attr.value_size, 4);
	let strings = attr.strings().expect("index attribute has strings");
	assert_eq!(strings.len(), 2);
	assert_eq!(strings.get(1).expect("entry"), "/mat/bb");
	assert!(attr.is_string());
}

#[test]
fn capture_flag_selects_capture_kind() {
	let bytes = encode(&[AttrSpec::capture("pCapt", 2)]);
	let table = AttrTable::resolve(&bytes, 1, 0, 16).expect("table resolves");
	let attr = table.get(0).expect("attribute");
	assert_eq!(attr.kind, AttrKind::CaptureWeights);
	assert_eq!(attr.element_count, 4);
	assert_eq!(attr.value_size, 16);
	assert!(!attr.is_vector());
}

#[test]
fn only_the_exact_capture_tag_selects_capture_kind() {
	assert_eq!(AttrKind::from_tag(0x10000), AttrKind::CaptureWeights);
	assert_eq!(AttrKind::from_tag(0x30000), AttrKind::Float);
	assert_eq!(AttrKind::from_tag(0x10001), AttrKind::Int);

	let bytes = encode(&[AttrSpec::raw("pCapt", 4, 0x30000, 16)]);
	let table = AttrTable::resolve(&bytes, 1, 0, 16).expect("table resolves");
	assert_eq!(table.get(0).map(|attr| attr.kind), Some(AttrKind::Float));
}

#[test]
fn unsupported_kind_fails_whole_table() {
	let bytes = encode(&[AttrSpec::float("ok", 1), AttrSpec::raw("bad", 1, 7, 0), AttrSpec::float("after", 1)]);
	let err = AttrTable::resolve(&bytes, 3, 0, 16).expect_err("zero size aborts");
	assert!(matches!(err, HbinError::ZeroSizeAttribute { tag: 7, .. }));

	let lookup = AttrTable::lookup(&bytes, 3, 0, 16, b"after");
	assert!(lookup.is_err(), "lookup past a bad descriptor fails");
	let early = AttrTable::lookup(&bytes, 3, 0, 16, b"ok").expect("scan stops before bad descriptor");
	assert_eq!(early.expect("found").value_offset, 16);
}

#[test]
fn zero_element_float_fails() {
	let bytes = encode(&[AttrSpec::float("empty", 0)]);
	assert!(AttrTable::resolve(&bytes, 1, 0, 0).is_err());
}

#[test]
fn lookup_is_case_sensitive_and_reports_missing() {
	let bytes = encode(&[AttrSpec::vector("N"), AttrSpec::vector("Cd")]);
	let found = AttrTable::lookup(&bytes, 2, 0, 16, b"Cd").expect("scan ok").expect("found");
	assert_eq!(found.index, 1);
	assert_eq!(found.value_offset, 28);
	assert!(AttrTable::lookup(&bytes, 2, 0, 16, b"cd").expect("scan ok").is_none());
	assert!(AttrTable::lookup(&bytes, 2, 0, 16, b"uv").expect("scan ok").is_none());
}

#[test]
fn truncated_descriptor_region_reports_eof() {
	let mut bytes = encode(&[AttrSpec::vector("N")]);
	bytes.truncate(bytes.len() - 2);
	let err = AttrTable::resolve(&bytes, 1, 0, 16).expect_err("truncated default fails");
	assert!(matches!(err, HbinError::UnexpectedEof { .. }));
}

#[test]
fn scanner_stops_after_first_error() {
	let bytes = encode(&[AttrSpec::raw("bad", 1, 9, 0), AttrSpec::float("x", 1)]);
	let results: Vec<_> = AttrDescIter::new(&bytes, 2, 0, 0).collect();
	assert_eq!(results.len(), 1);
	assert!(results[0].is_err());
}

#[test]
fn long_names_use_escaped_length() {
	let long = "n".repeat(0x8001);
	let bytes = encode(&[AttrSpec::float(&long, 1)]);
	let table = AttrTable::resolve(&bytes, 1, 0, 0).expect("table resolves");
	assert_eq!(table.get(0).expect("attribute").name.len(), 0x8001);
}
