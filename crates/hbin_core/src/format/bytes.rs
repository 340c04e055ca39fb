use crate::format::scalar::{be_f32, be_i16, be_i32, be_u16, be_u32, stored_f64};
use crate::format::{BinStr, HbinError, Result};

/// Bounded big-endian cursor over an immutable byte slice.
///
/// Positions are absolute offsets into the slice the cursor was created from, which is
/// always the whole loaded file, so offsets reported in errors match file offsets.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
	bytes: &'a [u8],
	pos: usize,
}

impl<'a> Cursor<'a> {
	/// Create a cursor at position 0.
	pub fn new(bytes: &'a [u8]) -> Self {
		Self { bytes, pos: 0 }
	}

	/// Create a cursor at absolute position `pos`.
	///
	/// A position past the end is allowed; the first read from it fails.
	pub fn at(bytes: &'a [u8], pos: usize) -> Self {
		Self { bytes, pos }
	}

	/// Return current byte offset.
	pub fn pos(&self) -> usize {
		self.pos
	}

	/// Return remaining unread bytes.
	pub fn remaining(&self) -> usize {
		self.bytes.len().saturating_sub(self.pos)
	}

	/// Return the underlying buffer.
	pub fn bytes(&self) -> &'a [u8] {
		self.bytes
	}

	/// Read exactly `n` bytes and advance cursor.
	pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8]> {
		if n > self.remaining() {
			return Err(HbinError::UnexpectedEof {
				at: self.pos,
				need: n,
				rem: self.remaining(),
			});
		}

		let start = self.pos;
		self.pos += n;
		Ok(&self.bytes[start..self.pos])
	}

	/// Advance by `n` bytes without interpreting them.
	pub fn skip(&mut self, n: usize) -> Result<()> {
		let _ = self.read_exact(n)?;
		Ok(())
	}

	/// Read a fixed-size byte array.
	pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
		let raw = self.read_exact(N)?;
		let mut out = [0_u8; N];
		out.copy_from_slice(raw);
		Ok(out)
	}

	/// Read one byte.
	pub fn read_u8(&mut self) -> Result<u8> {
		Ok(self.read_array::<1>()?[0])
	}

	/// Read a big-endian `u16`.
	pub fn read_u16(&mut self) -> Result<u16> {
		Ok(be_u16(self.read_array()?))
	}

	/// Read a big-endian `i16`.
	pub fn read_i16(&mut self) -> Result<i16> {
		Ok(be_i16(self.read_array()?))
	}

	/// Read a big-endian `u32`.
	pub fn read_u32(&mut self) -> Result<u32> {
		Ok(be_u32(self.read_array()?))
	}

	/// Read a big-endian `i32`.
	pub fn read_i32(&mut self) -> Result<i32> {
		Ok(be_i32(self.read_array()?))
	}

	/// Read a big-endian `f32`.
	pub fn read_f32(&mut self) -> Result<f32> {
		Ok(be_f32(self.read_array()?))
	}

	/// Read a stored 64-bit float.
	pub fn read_f64(&mut self) -> Result<f64> {
		Ok(stored_f64(self.read_array()?))
	}

	/// Read a big-endian `i32` that must not be negative.
	pub fn read_count(&mut self) -> Result<usize> {
		let at = self.pos;
		let value = self.read_i32()?;
		usize::try_from(value).map_err(|_| HbinError::NegativeLength { at, len: i64::from(value) })
	}

	/// Read a 16-bit length with the 32-bit escape.
	///
	/// A negative 16-bit value means the real length follows as a 32-bit integer.
	pub fn read_len(&mut self) -> Result<usize> {
		let short = self.read_i16()?;
		if short >= 0 {
			return Ok(short as usize);
		}
		self.read_count()
	}

	/// Read a length-prefixed byte string.
	pub fn read_str(&mut self) -> Result<BinStr<'a>> {
		let len = self.read_len()?;
		let offset = self.pos;
		let bytes = self.read_exact(len)?;
		Ok(BinStr::new(bytes, offset))
	}
}
