//! Shared test helpers: synthetic `.bgeo`/`.bclip` buffer builders.

mod bclip;
mod bgeo;

pub use bclip::{BclipBuilder, TrackSpec};
pub use bgeo::{AttrSpec, BgeoBuilder, PolySpec, PrimSpec};

/// Encode floats as big-endian bytes.
pub fn be_f32s(values: &[f32]) -> Vec<u8> {
	values.iter().flat_map(|value| value.to_be_bytes()).collect()
}

/// Encode signed integers as big-endian bytes.
pub fn be_i32s(values: &[i32]) -> Vec<u8> {
	values.iter().flat_map(|value| value.to_be_bytes()).collect()
}

/// Encode a length with the signed 16-bit / 32-bit escape.
pub fn push_len(out: &mut Vec<u8>, len: usize) {
	if len < 0x8000 {
		out.extend_from_slice(&(len as i16).to_be_bytes());
	} else {
		out.extend_from_slice(&(-1_i16).to_be_bytes());
		out.extend_from_slice(&(len as i32).to_be_bytes());
	}
}

/// Encode a length-prefixed string.
pub fn push_str(out: &mut Vec<u8>, value: &str) {
	push_len(out, value.len());
	out.extend_from_slice(value.as_bytes());
}
