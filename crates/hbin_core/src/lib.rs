//! Public library API for decoding classic binary geometry (`.bgeo`) and clip (`.bclip`) files.

/// Buffer views, attribute tables, primitive walking, and packet scanning.
pub mod format;
