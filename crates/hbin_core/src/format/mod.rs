mod attr;
mod bytes;
mod clip;
mod detail;
mod error;
mod file;
mod geo;
mod prim;
mod scalar;
mod string;
mod vertex;

/// Attribute descriptor resolution.
pub use attr::{AttrDesc, AttrDescIter, AttrKind, AttrTable, CAPTURE_WEIGHTS_FLAG};
/// Bounded big-endian cursor.
pub use bytes::Cursor;
/// Clip document, packet scanning, and track decoding.
pub use clip::{ClipDoc, Packet, PacketIter, Track};
/// Capture and skeleton query types.
pub use detail::Capture;
/// Error and result aliases.
pub use error::{HbinError, Result};
/// File loading and kind detection.
pub use file::{FileKind, HbinFile};
/// Geometry document and header.
pub use geo::{GeoDoc, GeoHeader, GeoLayout, TriangleList};
/// Primitive stream walking.
pub use prim::{IndexWidth, PrimWalker, Primitive, VertexRefs};
/// Scalar decoders.
pub use scalar::{be_f32, be_i16, be_i32, be_u16, be_u32, stored_f64};
/// Borrowed strings and inline string tables.
pub use string::{BinStr, StrTable, StrTableIter};
/// Vertex buffer baking.
pub use vertex::{VertexBuffer, VertexLayout};
