//! Fixed-width big-endian scalar decoders.
//!
//! Every decoder takes an exact-size byte array, so bounds are settled by the caller
//! (normally [`Cursor`](crate::format::Cursor)) before any value is interpreted.

/// Decode a big-endian `u16`.
pub fn be_u16(raw: [u8; 2]) -> u16 {
	u16::from_be_bytes(raw)
}

/// Decode a big-endian `i16`.
pub fn be_i16(raw: [u8; 2]) -> i16 {
	i16::from_be_bytes(raw)
}

/// Decode a big-endian `u32`.
pub fn be_u32(raw: [u8; 4]) -> u32 {
	u32::from_be_bytes(raw)
}

/// Decode a big-endian `i32`.
pub fn be_i32(raw: [u8; 4]) -> i32 {
	i32::from_be_bytes(raw)
}

/// Decode a big-endian IEEE-754 `f32`.
pub fn be_f32(raw: [u8; 4]) -> f32 {
	f32::from_bits(be_u32(raw))
}

/// Decode a stored 64-bit float.
///
/// The probe writes `1.0` into scratch storage and inspects its first byte: a zero byte means
/// the process is little-endian and the stored bytes are reversed before reinterpretation.
/// The stored layout is therefore big-endian on every host.
pub fn stored_f64(raw: [u8; 8]) -> f64 {
	let probe = 1.0_f64.to_ne_bytes();
	let mut bytes = raw;
	if probe[0] == 0 {
		bytes.reverse();
	}
	f64::from_ne_bytes(bytes)
}
