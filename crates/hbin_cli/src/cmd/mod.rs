use std::path::PathBuf;

use hbin::format::{FileKind, HbinError, HbinFile, Result};

/// Clip to JSON conversion.
pub mod clip;
/// Geometry to JSON conversion.
pub mod geo;
pub(crate) mod util;

/// Resolved command-line request.
pub struct Args {
	/// Input file.
	pub path: PathBuf,
	/// Output file; stdout when `None`.
	pub out: Option<PathBuf>,
	/// Forced input kind.
	pub kind: Option<FileKind>,
	/// Clip conversion options.
	pub clip: clip::ClipJsonOptions,
}

/// Load the input and emit its JSON rendering.
pub fn run(args: Args) -> Result<()> {
	let Args { path, out, kind, clip } = args;

	let kind = match kind.or_else(|| FileKind::from_path(&path)) {
		Some(kind) => kind,
		None => {
			return Err(HbinError::UnsupportedExtension {
				path: path.display().to_string(),
			});
		}
	};
	let file = HbinFile::open_as(&path, kind)?;

	match file.kind {
		FileKind::Geo => geo::run(&file, out.as_deref()),
		FileKind::Clip => clip::run(&file, &clip, out.as_deref()),
	}
}
