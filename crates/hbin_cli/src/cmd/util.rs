use std::fs;
use std::io::Write;
use std::path::Path;

use hbin::format::Result;

/// Pretty-print `payload` to `out`, or to stdout when `out` is `None`.
pub(crate) fn emit_json<T: serde::Serialize>(payload: &T, out: Option<&Path>) -> Result<()> {
	let mut text = serde_json::to_string_pretty(payload).map_err(std::io::Error::other)?;
	text.push('\n');

	match out {
		Some(path) => fs::write(path, text)?,
		None => std::io::stdout().lock().write_all(text.as_bytes())?,
	}
	Ok(())
}
