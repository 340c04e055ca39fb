use std::path::Path;

use hbin::format::{ClipDoc, HbinFile, Result};

use crate::cmd::util::emit_json;

/// Clip conversion switches.
#[derive(Debug, Clone, Copy)]
pub struct ClipJsonOptions {
	/// Emit the `names` array.
	pub names: bool,
	/// Emit samples as bytes clamped to `0..=255`.
	pub quantize: bool,
}

impl Default for ClipJsonOptions {
	fn default() -> Self {
		Self { names: true, quantize: false }
	}
}

/// Convert a clip file and emit it.
pub fn run(file: &HbinFile, options: &ClipJsonOptions, out: Option<&Path>) -> Result<()> {
	let payload = clip_json(&file.clip(), options);
	tracing::debug!(tracks = payload.tracks, frames = payload.frames, "converted clip");
	emit_json(&payload, out)
}

/// Build the JSON payload for a valid clip.
pub(crate) fn clip_json(doc: &ClipDoc<'_>, options: &ClipJsonOptions) -> ClipJson {
	let tracks = doc.tracks();
	let frames = doc.track_length();
	let samples = tracks.iter().flat_map(|track| track.samples.iter().copied());
	let samples = if options.quantize {
		Samples::Quantized(samples.map(|value| value.clamp(0.0, 255.0) as u8).collect())
	} else {
		Samples::Float(samples.collect())
	};

	ClipJson {
		data_type: "clip",
		fps: doc.sample_rate() as f32,
		start: doc.start_index() as i32,
		frames: tracks.first().map_or(frames, |track| track.samples.len()),
		tracks: tracks.len(),
		names: options.names.then(|| {
			tracks
				.iter()
				.map(|track| track.name.map(|name| name.to_string()).unwrap_or_default())
				.collect()
		}),
		samples,
		eof: true,
	}
}

#[derive(serde::Serialize)]
#[serde(untagged)]
pub(crate) enum Samples {
	Float(Vec<f32>),
	Quantized(Vec<u8>),
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ClipJson {
	pub data_type: &'static str,
	pub fps: f32,
	pub start: i32,
	pub frames: usize,
	pub tracks: usize,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub names: Option<Vec<String>>,
	pub samples: Samples,
	#[serde(rename = "_EOF_")]
	pub eof: bool,
}

#[cfg(test)]
mod tests {
	use hbin::format::ClipDoc;
	use hbin_testkit::{BclipBuilder, TrackSpec};

	use super::{ClipJsonOptions, clip_json};

	fn clip() -> Vec<u8> {
		BclipBuilder::new()
			.sample_rate(30.0)
			.start_index(1.75)
			.track_length(2)
			.tracks(&[TrackSpec::new("rx", &[-4.0, 0.5]), TrackSpec::new("ry", &[128.0, 300.0])])
			.build()
	}

	#[test]
	fn default_options_emit_names_and_floats() {
		let bytes = clip();
		let json = serde_json::to_value(clip_json(&ClipDoc::new(&bytes), &ClipJsonOptions::default())).expect("payload serializes");

		assert_eq!(json["dataType"], "clip");
		assert_eq!(json["fps"], 30.0);
		assert_eq!(json["start"], 1);
		assert_eq!(json["frames"], 2);
		assert_eq!(json["tracks"], 2);
		assert_eq!(json["names"], serde_json::json!(["rx", "ry"]));
		assert_eq!(json["samples"], serde_json::json!([-4.0, 0.5, 128.0, 300.0]));
		assert_eq!(json["_EOF_"], true);
	}

	#[test]
	fn quantized_without_names() {
		let bytes = clip();
		let options = ClipJsonOptions { names: false, quantize: true };
		let json = serde_json::to_value(clip_json(&ClipDoc::new(&bytes), &options)).expect("payload serializes");

		assert!(json.get("names").is_none());
		assert_eq!(json["samples"], serde_json::json!([0, 0, 128, 255]));
	}
}
