use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, HbinError>;

/// Errors produced while loading and decoding `.bgeo`/`.bclip` data.
#[derive(Debug, Error)]
pub enum HbinError {
	/// Filesystem or stream IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// Not enough bytes remained for a requested read.
	#[error("unexpected eof at offset {at}, need {need} bytes, remaining {rem}")]
	UnexpectedEof {
		/// Byte offset where the read was attempted.
		at: usize,
		/// Requested bytes.
		need: usize,
		/// Bytes still available.
		rem: usize,
	},
	/// Leading signature bytes did not match the expected format.
	#[error("bad signature: expected {expected:?}, got {got:?}")]
	BadSignature {
		/// Expected signature bytes.
		expected: &'static [u8],
		/// First bytes actually present.
		got: Vec<u8>,
	},
	/// A length or count field decoded to a negative value.
	#[error("negative length {len} at offset {at}")]
	NegativeLength {
		/// Offset of the length field.
		at: usize,
		/// Decoded signed value.
		len: i64,
	},
	/// Attribute descriptor declared an empty name.
	#[error("attribute at offset {at} has an empty name")]
	EmptyAttributeName {
		/// Offset of the attribute descriptor.
		at: usize,
	},
	/// Attribute descriptor resolved to a zero per-record value size.
	#[error("attribute at offset {at} has zero value size (type tag 0x{tag:08x})")]
	ZeroSizeAttribute {
		/// Offset of the attribute descriptor.
		at: usize,
		/// Raw 32-bit type tag.
		tag: u32,
	},
	/// Packet class marker did not match the expected stream class.
	#[error("packet at offset {at} has class 0x{got:x}, expected 0x{expected:x}")]
	BadPacketClass {
		/// Packet start offset.
		at: usize,
		/// Required class tag.
		expected: u16,
		/// Class tag found.
		got: u16,
	},
	/// Packet declared a non-positive size.
	#[error("packet at offset {at} has invalid size {size}")]
	BadPacketSize {
		/// Packet start offset.
		at: usize,
		/// Declared size.
		size: i32,
	},
	/// File extension does not select a known decoder.
	#[error("unsupported file type: {path}")]
	UnsupportedExtension {
		/// Offending path as given.
		path: String,
	},
	/// Vertex buffer field does not fit in the requested stride.
	#[error("vertex field {field} at offset {offset} (size {size}) exceeds stride {stride}")]
	VertexFieldOutOfStride {
		/// Field label.
		field: &'static str,
		/// Requested byte offset.
		offset: usize,
		/// Field byte size.
		size: usize,
		/// Vertex stride.
		stride: usize,
	},
}

/// Collapse a failed query into its documented default, logging why.
pub(crate) fn recover<T>(query: &'static str, result: Result<T>, fallback: T) -> T {
	match result {
		Ok(value) => value,
		Err(err) => {
			tracing::debug!(query, %err, "query fell back to default");
			fallback
		}
	}
}
