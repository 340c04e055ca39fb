use crate::format::bytes::Cursor;
use crate::format::error::recover;
use crate::format::{BinStr, HbinError, Result};

/// Leading signature bytes.
pub const CLIP_SIGNATURE: &[u8; 4] = b"bclp";
/// Class marker of top-level packets.
pub const TOP_CLASS: u16 = 0xF;
/// Class marker of packets nested inside the track list.
pub const TRACK_CLASS: u16 = 0x10;
/// Packet header size: `i32` size, `u16` class, `u16` tag.
pub const PACKET_HEADER_SIZE: usize = 8;

const END_TAG: u16 = 0;
const SAMPLE_RATE_TAG: u16 = 1;
const START_INDEX_TAG: u16 = 2;
const TRACK_LENGTH_TAG: u16 = 3;
const TRACKS_TAG: u16 = 5;
const TRACK_F64_TAG: u16 = 8;
const VERSION_TAG: u16 = 9;
const INFO_F64_TAG: u16 = 0xA;

const TRACK_NAME_TAG: u16 = 1;
const TRACK_SAMPLES_TAG: u16 = 2;

/// Header of one tagged packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
	/// Absolute offset of the packet header.
	pub offset: usize,
	/// Declared size, header included.
	pub size: usize,
	/// Class marker.
	pub class: u16,
	/// Content tag.
	pub tag: u16,
}

impl Packet {
	/// Absolute offset of the payload.
	pub fn payload_offset(&self) -> usize {
		self.offset + PACKET_HEADER_SIZE
	}

	/// Return true for the end sentinel.
	pub fn is_end(&self) -> bool {
		self.tag == END_TAG
	}
}

/// Scanner over a packet stream of one class.
///
/// Stops after the end packet. A non-positive size or a foreign class yields one error and
/// ends the scan.
pub struct PacketIter<'a> {
	cursor: Cursor<'a>,
	class: u16,
	done: bool,
}

impl<'a> PacketIter<'a> {
	/// Scan packets of `class` starting at `start`.
	pub fn new(bytes: &'a [u8], start: usize, class: u16) -> Self {
		Self {
			cursor: Cursor::at(bytes, start),
			class,
			done: false,
		}
	}

	fn parse_one(&mut self) -> Result<Packet> {
		let offset = self.cursor.pos();
		let size = self.cursor.read_i32()?;
		if size <= 0 {
			return Err(HbinError::BadPacketSize { at: offset, size });
		}
		let class = self.cursor.read_u16()?;
		if class != self.class {
			return Err(HbinError::BadPacketClass {
				at: offset,
				expected: self.class,
				got: class,
			});
		}
		let tag = self.cursor.read_u16()?;

		let size = size as usize;
		self.cursor = Cursor::at(self.cursor.bytes(), offset.saturating_add(size));
		Ok(Packet { offset, size, class, tag })
	}
}

impl Iterator for PacketIter<'_> {
	type Item = Result<Packet>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.done {
			return None;
		}

		match self.parse_one() {
			Ok(packet) => {
				self.done = packet.is_end();
				Some(Ok(packet))
			}
			Err(err) => {
				self.done = true;
				Some(Err(err))
			}
		}
	}
}

/// One decoded animation track.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track<'a> {
	/// Channel name, when the stream carries one.
	pub name: Option<BinStr<'a>>,
	/// `track_length` samples widened or narrowed to `f32`.
	pub samples: Vec<f32>,
}

/// Read-only view over a `.bclip` buffer.
///
/// Every scalar query rescans the top-level packets; queries on an invalid buffer return zero.
#[derive(Debug, Clone, Copy)]
pub struct ClipDoc<'a> {
	bytes: &'a [u8],
}

impl<'a> ClipDoc<'a> {
	/// Wrap a buffer.
	pub fn new(bytes: &'a [u8]) -> Self {
		Self { bytes }
	}

	/// Return true when the buffer starts with `bclp`.
	pub fn is_valid(&self) -> bool {
		self.bytes.starts_with(CLIP_SIGNATURE)
	}

	/// Underlying buffer.
	pub fn bytes(&self) -> &'a [u8] {
		self.bytes
	}

	/// Top-level packets; empty for an invalid buffer.
	pub fn packets(&self) -> PacketIter<'a> {
		let mut iter = PacketIter::new(self.bytes, CLIP_SIGNATURE.len(), TOP_CLASS);
		iter.done = !self.is_valid();
		iter
	}

	/// First top-level packet tagged `tag`.
	pub fn find_packet(&self, tag: u16) -> Option<Packet> {
		for packet in self.packets() {
			match packet {
				Ok(packet) if packet.tag == tag => return Some(packet),
				Ok(_) => {}
				Err(err) => {
					tracing::trace!(tag, %err, "packet scan stopped");
					return None;
				}
			}
		}
		None
	}

	fn payload(&self, tag: u16) -> Option<Cursor<'a>> {
		self.find_packet(tag).map(|packet| Cursor::at(self.bytes, packet.payload_offset()))
	}

	fn read_payload<T>(&self, query: &'static str, tag: u16, read: impl FnOnce(&mut Cursor<'a>) -> Result<T>) -> Option<T> {
		let mut cursor = self.payload(tag)?;
		recover(query, read(&mut cursor).map(Some), None)
	}

	fn flag(&self, tag: u16) -> bool {
		self.read_payload("flag", tag, Cursor::read_u8).is_some_and(|flag| flag != 0)
	}

	fn read_info(&self, query: &'static str, tag: u16) -> f64 {
		let wide = self.flag(INFO_F64_TAG);
		let value = self.read_payload(query, tag, |cursor| if wide { cursor.read_f64() } else { cursor.read_f32().map(f64::from) });
		value.unwrap_or(0.0)
	}

	/// Format version (tag 9).
	pub fn version(&self) -> i32 {
		self.read_payload("version", VERSION_TAG, Cursor::read_i32).unwrap_or(0)
	}

	/// Samples per second (tag 1).
	pub fn sample_rate(&self) -> f64 {
		self.read_info("sample_rate", SAMPLE_RATE_TAG)
	}

	/// Index of the first sample (tag 2).
	pub fn start_index(&self) -> f64 {
		self.read_info("start_index", START_INDEX_TAG)
	}

	/// Samples per track (tag 3); negative values read as zero.
	pub fn track_length(&self) -> usize {
		let len = self.read_payload("track_length", TRACK_LENGTH_TAG, Cursor::read_i32).unwrap_or(0);
		usize::try_from(len).unwrap_or(0)
	}

	/// Number of tracks (tag 5); negative values read as zero.
	pub fn track_count(&self) -> usize {
		let count = self.read_payload("track_count", TRACKS_TAG, Cursor::read_i32).unwrap_or(0);
		usize::try_from(count).unwrap_or(0)
	}

	/// Decode every track.
	///
	/// Always returns `track_count` tracks of `track_length` samples, both clamped so that
	/// every sample fits inside the track list packet. Tracks past a malformed nested packet
	/// keep no name and zeroed samples.
	pub fn tracks(&self) -> Vec<Track<'a>> {
		let Some(list) = self.find_packet(TRACKS_TAG) else {
			return Vec::new();
		};

		// Every track and sample sits inside the list packet: each track needs at least its end
		// packet and each sample at least 4 bytes.
		let room = list.size.min(self.bytes.len().saturating_sub(list.offset));
		let count = self.track_count().min(room / PACKET_HEADER_SIZE);
		let len = self.track_length().min(room / 4 / count.max(1));
		let mut tracks = vec![
			Track {
				name: None,
				samples: vec![0.0; len],
			};
			count
		];

		let wide = self.flag(TRACK_F64_TAG);
		if let Err(err) = self.decode_tracks(list.payload_offset() + 4, wide, &mut tracks) {
			tracing::debug!(query = "tracks", %err, "track decoding stopped early");
		}
		tracks
	}

	fn decode_tracks(&self, start: usize, wide: bool, tracks: &mut [Track<'a>]) -> Result<()> {
		let mut pos = start;
		for track in tracks.iter_mut() {
			loop {
				let mut cursor = Cursor::at(self.bytes, pos);
				let size = cursor.read_i32()?;
				let class = cursor.read_u16()?;
				if class != TRACK_CLASS {
					return Err(HbinError::BadPacketClass {
						at: pos,
						expected: TRACK_CLASS,
						got: class,
					});
				}
				let tag = cursor.read_u16()?;
				if size <= 0 && tag != END_TAG {
					return Err(HbinError::BadPacketSize { at: pos, size });
				}

				match tag {
					TRACK_NAME_TAG => track.name = Some(cursor.read_str()?),
					TRACK_SAMPLES_TAG => {
						for sample in track.samples.iter_mut() {
							*sample = if wide { cursor.read_f64()? as f32 } else { cursor.read_f32()? };
						}
					}
					_ => {}
				}

				pos = pos.saturating_add(usize::try_from(size).unwrap_or(0));
				if tag == END_TAG {
					break;
				}
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests;
