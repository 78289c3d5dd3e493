//! Timestamp re-timing: the correction factor, the `HH:MM:SS.mmm` codec and
//! the line-oriented rescaler built on both.

pub mod factor;
pub mod rescale;
pub mod timestamp;

pub use factor::RationalFactor;
pub use rescale::{rescale_line, rescale_stream, rescale_text, rescale_timestamp, RescaledText, Rescaler};
pub use timestamp::{Timestamp, TimestampMatch};
