use crate::push_str;

const TOP_CLASS: u16 = 0xF;
const TRACK_CLASS: u16 = 0x10;

/// One track to encode inside the track-list packet.
#[derive(Debug, Clone, Default)]
pub struct TrackSpec {
	/// Channel name; omitted from the stream when `None`.
	pub name: Option<String>,
	/// Sample values.
	pub samples: Vec<f64>,
}

impl TrackSpec {
	/// Named track.
	pub fn new(name: &str, samples: &[f64]) -> Self {
		Self {
			name: Some(name.to_owned()),
			samples: samples.to_vec(),
		}
	}
}

/// Builder for synthetic `.bclip` buffers.
///
/// Packets are emitted in call order; `build` appends the end packet.
#[derive(Debug, Clone, Default)]
pub struct BclipBuilder {
	body: Vec<u8>,
	info_f64: bool,
	track_f64: bool,
}

impl BclipBuilder {
	/// Empty clip.
	pub fn new() -> Self {
		Self::default()
	}

	/// Raw top-level packet.
	pub fn packet(mut self, tag: u16, payload: &[u8]) -> Self {
		write_packet(&mut self.body, TOP_CLASS, tag, payload);
		self
	}

	/// Raw packet with an arbitrary class tag.
	pub fn packet_with_class(mut self, class: u16, tag: u16, payload: &[u8]) -> Self {
		write_packet(&mut self.body, class, tag, payload);
		self
	}

	/// Version packet (tag 9).
	pub fn version(self, version: i32) -> Self {
		self.packet(9, &version.to_be_bytes())
	}

	/// Info value width flag (tag 0xA); later rate/start packets follow it.
	pub fn info_f64(mut self, wide: bool) -> Self {
		self.info_f64 = wide;
		self.packet(0xA, &[u8::from(wide)])
	}

	/// Track sample width flag (tag 8); later track packets follow it.
	pub fn track_f64(mut self, wide: bool) -> Self {
		self.track_f64 = wide;
		self.packet(8, &[u8::from(wide)])
	}

	/// Sample rate packet (tag 1).
	pub fn sample_rate(self, rate: f64) -> Self {
		let payload = info_value(self.info_f64, rate);
		self.packet(1, &payload)
	}

	/// Start index packet (tag 2).
	pub fn start_index(self, start: f64) -> Self {
		let payload = info_value(self.info_f64, start);
		self.packet(2, &payload)
	}

	/// Track length packet (tag 3).
	pub fn track_length(self, len: i32) -> Self {
		self.packet(3, &len.to_be_bytes())
	}

	/// Track list packet (tag 5) with nested per-track packets.
	pub fn tracks(self, tracks: &[TrackSpec]) -> Self {
		let mut payload = (tracks.len() as i32).to_be_bytes().to_vec();
		for track in tracks {
			if let Some(name) = &track.name {
				let mut name_payload = Vec::new();
				push_str(&mut name_payload, name);
				write_packet(&mut payload, TRACK_CLASS, 1, &name_payload);
			}
			let mut samples = Vec::new();
			for sample in &track.samples {
				if self.track_f64 {
					samples.extend_from_slice(&sample.to_be_bytes());
				} else {
					samples.extend_from_slice(&(*sample as f32).to_be_bytes());
				}
			}
			write_packet(&mut payload, TRACK_CLASS, 2, &samples);
			write_packet(&mut payload, TRACK_CLASS, 0, &[]);
		}
		self.packet(5, &payload)
	}

	/// Encode with signature and end packet.
	pub fn build(&self) -> Vec<u8> {
		let mut out = b"bclp".to_vec();
		out.extend_from_slice(&self.body);
		write_packet(&mut out, TOP_CLASS, 0, &[]);
		out
	}

	/// Encode with signature but without the end packet.
	pub fn build_unterminated(&self) -> Vec<u8> {
		let mut out = b"bclp".to_vec();
		out.extend_from_slice(&self.body);
		out
	}
}

fn info_value(wide: bool, value: f64) -> Vec<u8> {
	if wide { value.to_be_bytes().to_vec() } else { (value as f32).to_be_bytes().to_vec() }
}

fn write_packet(out: &mut Vec<u8>, class: u16, tag: u16, payload: &[u8]) {
	out.extend_from_slice(&((payload.len() + 8) as i32).to_be_bytes());
	out.extend_from_slice(&class.to_be_bytes());
	out.extend_from_slice(&tag.to_be_bytes());
	out.extend_from_slice(payload);
}
