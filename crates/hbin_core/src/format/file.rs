use std::fs;
use std::path::Path;

use crate::format::clip::CLIP_SIGNATURE;
use crate::format::geo::GEO_SIGNATURE;
use crate::format::{ClipDoc, GeoDoc, HbinError, Result};

/// Container format of a loaded buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
	/// `.bgeo` / `.bhclassic` geometry.
	Geo,
	/// `.bclip` animation clip.
	Clip,
}

impl FileKind {
	/// Select a kind from the file extension (ASCII case-insensitive).
	pub fn from_path(path: &Path) -> Option<Self> {
		let ext = path.extension()?.to_str()?.to_ascii_lowercase();
		match ext.as_str() {
			"bgeo" | "bhclassic" => Some(Self::Geo),
			"bclip" => Some(Self::Clip),
			_ => None,
		}
	}

	/// Select a kind from the leading signature bytes.
	pub fn sniff(bytes: &[u8]) -> Option<Self> {
		if bytes.starts_with(GEO_SIGNATURE) {
			Some(Self::Geo)
		} else if bytes.starts_with(CLIP_SIGNATURE) {
			Some(Self::Clip)
		} else {
			None
		}
	}

	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Geo => "geo",
			Self::Clip => "clip",
		}
	}

	fn signature(self) -> &'static [u8] {
		match self {
			Self::Geo => b"BgeoV",
			Self::Clip => CLIP_SIGNATURE,
		}
	}
}

/// Owned byte buffer of one geometry or clip file.
///
/// The buffer is never mutated after load; [`geo`](Self::geo) and [`clip`](Self::clip) hand out
/// borrowing views.
#[derive(Debug, Clone)]
pub struct HbinFile {
	/// Detected or requested format.
	pub kind: FileKind,
	bytes: Vec<u8>,
}

impl HbinFile {
	/// Read a file, choosing the kind by extension and then by signature.
	pub fn open(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let bytes = fs::read(path)?;
		let kind = FileKind::from_path(path)
			.or_else(|| FileKind::sniff(&bytes))
			.ok_or_else(|| HbinError::UnsupportedExtension {
				path: path.display().to_string(),
			})?;
		tracing::debug!(path = %path.display(), len = bytes.len(), kind = kind.as_str(), "opened file");
		Self::new(kind, bytes)
	}

	/// Read a file as `kind`, ignoring its extension.
	pub fn open_as(path: impl AsRef<Path>, kind: FileKind) -> Result<Self> {
		let path = path.as_ref();
		let bytes = fs::read(path)?;
		tracing::debug!(path = %path.display(), len = bytes.len(), kind = kind.as_str(), "opened file");
		Self::new(kind, bytes)
	}

	/// Wrap an in-memory buffer, detecting the kind from its signature.
	pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
		match FileKind::sniff(&bytes) {
			Some(kind) => Self::new(kind, bytes),
			None => Err(HbinError::BadSignature {
				expected: GEO_SIGNATURE,
				got: bytes.iter().take(5).copied().collect(),
			}),
		}
	}

	/// Wrap `bytes` as `kind`, rejecting a mismatched signature.
	pub fn new(kind: FileKind, bytes: Vec<u8>) -> Result<Self> {
		let expected = kind.signature();
		if !bytes.starts_with(expected) {
			return Err(HbinError::BadSignature {
				expected,
				got: bytes.iter().take(expected.len()).copied().collect(),
			});
		}
		Ok(Self { kind, bytes })
	}

	/// Raw bytes.
	pub fn bytes(&self) -> &[u8] {
		&self.bytes
	}

	/// Geometry view over the buffer.
	pub fn geo(&self) -> GeoDoc<'_> {
		GeoDoc::new(&self.bytes)
	}

	/// Clip view over the buffer.
	pub fn clip(&self) -> ClipDoc<'_> {
		ClipDoc::new(&self.bytes)
	}
}
