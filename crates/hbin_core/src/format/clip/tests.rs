use hbin_testkit::{BclipBuilder, TrackSpec};

use crate::format::{ClipDoc, HbinError, PacketIter};

fn two_tracks(wide: bool) -> Vec<u8> {
	BclipBuilder::new()
		.version(3)
		.info_f64(wide)
		.sample_rate(48.0)
		.start_index(12.0)
		.track_length(3)
		.track_f64(wide)
		.tracks(&[TrackSpec::new("tx", &[0.0, 0.5, 1.0]), TrackSpec::new("ty", &[2.0, 3.0, 4.0])])
		.build()
}

#[test]
fn sample_rate_in_both_widths() {
	for wide in [false, true] {
		let bytes = two_tracks(wide);
		let doc = ClipDoc::new(&bytes);
		assert!(doc.is_valid());
		assert_eq!(doc.sample_rate(), 48.0, "wide = {wide}");
		assert_eq!(doc.start_index(), 12.0, "wide = {wide}");
	}
}

#[test]
fn scalar_queries() {
	let bytes = two_tracks(false);
	let doc = ClipDoc::new(&bytes);
	assert_eq!(doc.version(), 3);
	assert_eq!(doc.track_length(), 3);
	assert_eq!(doc.track_count(), 2);
}

#[test]
fn tracks_decode_names_and_samples() {
	for wide in [false, true] {
		let bytes = two_tracks(wide);
		let tracks = ClipDoc::new(&bytes).tracks();
		assert_eq!(tracks.len(), 2);
		assert_eq!(tracks[0].name.expect("named track"), "tx");
		assert_eq!(tracks[0].samples, [0.0, 0.5, 1.0]);
		assert_eq!(tracks[1].name.expect("named track"), "ty");
		assert_eq!(tracks[1].samples, [2.0, 3.0, 4.0]);
	}
}

#[test]
fn unnamed_track_keeps_samples() {
	let bytes = BclipBuilder::new()
		.track_length(2)
		.tracks(&[TrackSpec {
			name: None,
			samples: vec![7.0, 8.0],
		}])
		.build();
	let tracks = ClipDoc::new(&bytes).tracks();
	assert_eq!(tracks.len(), 1);
	assert!(tracks[0].name.is_none());
	assert_eq!(tracks[0].samples, [7.0, 8.0]);
}

#[test]
fn invalid_signature_reads_zero() {
	let mut bytes = two_tracks(false);
	bytes[0] = b'B';
	let doc = ClipDoc::new(&bytes);
	assert!(!doc.is_valid());
	assert_eq!(doc.version(), 0);
	assert_eq!(doc.sample_rate(), 0.0);
	assert_eq!(doc.track_count(), 0);
	assert!(doc.tracks().is_empty());
	assert_eq!(doc.packets().count(), 0);
}

#[test]
fn scan_stops_at_end_packet() {
	let bytes = BclipBuilder::new().version(1).build();
	let mut with_trailer = bytes.clone();
	with_trailer.extend_from_slice(&BclipBuilder::new().track_length(9).build()[4..]);
	let doc = ClipDoc::new(&with_trailer);
	assert_eq!(doc.version(), 1);
	assert_eq!(doc.track_length(), 0);
	assert_eq!(doc.packets().count(), 2);
}

#[test]
fn foreign_class_aborts_scan() {
	let bytes = BclipBuilder::new().packet_with_class(0x3, 7, &[]).version(2).build();
	let doc = ClipDoc::new(&bytes);
	assert_eq!(doc.version(), 0);
	let err = doc.packets().next().expect("one item").expect_err("class is foreign");
	assert!(matches!(err, HbinError::BadPacketClass { expected: 0xF, got: 0x3, .. }));
}

#[test]
fn non_positive_size_aborts_scan() {
	let mut bytes = b"bclp".to_vec();
	bytes.extend_from_slice(&0_i32.to_be_bytes());
	bytes.extend_from_slice(&[0, 0xF, 0, 9]);
	let mut iter = PacketIter::new(&bytes, 4, 0xF);
	assert!(matches!(iter.next(), Some(Err(HbinError::BadPacketSize { size: 0, .. }))));
	assert!(iter.next().is_none());
}

#[test]
fn missing_end_packet_falls_back() {
	let bytes = BclipBuilder::new().version(4).build_unterminated();
	let doc = ClipDoc::new(&bytes);
	assert_eq!(doc.version(), 4);
	assert_eq!(doc.track_length(), 0);
}

#[test]
fn malformed_nested_packet_pads_remaining_tracks() {
	let mut payload = 2_i32.to_be_bytes().to_vec();
	payload.extend_from_slice(&12_i32.to_be_bytes());
	payload.extend_from_slice(&[0, 0x10, 0, 2]);
	payload.extend_from_slice(&1.5_f32.to_be_bytes());
	payload.extend_from_slice(&8_i32.to_be_bytes());
	payload.extend_from_slice(&[0, 0x10, 0, 0]);
	payload.extend_from_slice(&8_i32.to_be_bytes());
	payload.extend_from_slice(&[0, 0x11, 0, 1]);
	let bytes = BclipBuilder::new().track_length(1).packet(5, &payload).build();

	let tracks = ClipDoc::new(&bytes).tracks();
	assert_eq!(tracks.len(), 2);
	assert_eq!(tracks[0].samples, [1.5]);
	assert!(tracks[1].name.is_none());
	assert_eq!(tracks[1].samples, [0.0]);
}

#[test]
fn oversized_track_count_is_clamped() {
	let bytes = BclipBuilder::new().track_length(1).packet(5, &i32::MAX.to_be_bytes()).build();
	let tracks = ClipDoc::new(&bytes).tracks();
	assert!(tracks.len() <= bytes.len() / 8);
}

#[test]
fn oversized_track_length_stays_within_list_packet() {
	let mut payload = 2048_i32.to_be_bytes().to_vec();
	payload.resize(4 + 2048 * 8, 0);
	let bytes = BclipBuilder::new().track_length(1 << 30).packet(5, &payload).build();

	let tracks = ClipDoc::new(&bytes).tracks();
	assert_eq!(tracks.len(), 2048);
	let samples: usize = tracks.iter().map(|track| track.samples.len()).sum();
	assert!(samples * 4 <= payload.len() + 8, "{samples} samples for {} bytes", bytes.len());
}
