//! Stamp document model and encoders.
//!
//! A stamp is plain text, one comma-separated record per line. Sizes and
//! coordinates are written in tenths (`x · 0.1`, one decimal place):
//!
//! ```text
//! 0.4,0.4,img          header: width, height, kind
//! 0.0,0.3,1            point: x, y, palette number
//! ```
//!
//! Animated stamps put `width,height,gif,frame_count,uniform_delay` in the
//! header and ship their frame deltas separately (see [`animation`]).

pub mod animation;
pub mod static_encoder;

use std::fmt;

pub use animation::{encode_animation, uniform_delay, AnimatedStamp, DeltaBlock, FrameMap};
pub use static_encoder::encode_static;

/// Write `value · 0.1` with exactly one decimal place.
fn write_tenths(f: &mut fmt::Formatter<'_>, value: u32) -> fmt::Result {
    write!(f, "{}.{}", value / 10, value % 10)
}

/// First line of a stamp file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StampHeader {
    Static {
        width: u32,
        height: u32,
    },
    Animated {
        width: u32,
        height: u32,
        frame_count: usize,
        /// Common frame delay in ms, or -1 when delays differ.
        uniform_delay: i64,
    },
}

impl fmt::Display for StampHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            StampHeader::Static { width, height } => {
                write_tenths(f, width)?;
                f.write_str(",")?;
                write_tenths(f, height)?;
                f.write_str(",img")
            }
            StampHeader::Animated {
                width,
                height,
                frame_count,
                uniform_delay,
            } => {
                write_tenths(f, width)?;
                f.write_str(",")?;
                write_tenths(f, height)?;
                write!(f, ",gif,{frame_count},{uniform_delay}")
            }
        }
    }
}

/// One colored pixel in stamp coordinates (already flipped where needed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StampPoint {
    pub x: u32,
    pub y: u32,
    pub number: i32,
}

impl StampPoint {
    pub fn new(x: u32, y: u32, number: i32) -> Self {
        Self { x, y, number }
    }
}

impl fmt::Display for StampPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tenths(f, self.x)?;
        f.write_str(",")?;
        write_tenths(f, self.y)?;
        write!(f, ",{}", self.number)
    }
}

/// Contents of `stamp.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampDocument {
    pub header: StampHeader,
    pub points: Vec<StampPoint>,
}

impl fmt::Display for StampDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header)?;
        for point in &self.points {
            writeln!(f, "{point}")?;
        }
        Ok(())
    }
}
