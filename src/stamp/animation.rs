//! Animated stamps as a baseline frame plus per-frame deltas.
//!
//! `stamp.txt` holds the header and frame 1, scanned top to bottom without
//! flipping y. `frames.txt` holds one block per later frame listing only the
//! pixels that differ from the previous frame (`-1` for pixels that became
//! transparent), followed by a closing block that turns the last frame back
//! into frame 1 so the animation loops:
//!
//! ```text
//! frame,1          delta frame 1 -> 2
//! 0.3,0.0,2
//! frame,2          delta frame 2 -> 3
//! frame,3          closing delta frame 3 -> 1
//! 0.3,0.0,-1
//! ```
//!
//! When frame delays differ the header carries `-1` as uniform delay and each
//! block header gets the delay of its frame: `frame,<k>,<ms>`.

use std::fmt;

use chalk_dither::{closest_colors, ColorSpaceMode, Palette, OPAQUE_ALPHA};
use image::RgbaImage;
use rayon::prelude::*;

use super::{StampDocument, StampHeader, StampPoint};
use crate::error::StampError;

/// Map value for transparent pixels.
pub const TRANSPARENT: i32 = -1;

/// Palette number per pixel of one frame, `-1` where transparent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameMap {
    width: u32,
    height: u32,
    cells: Vec<i32>,
}

impl FrameMap {
    pub fn from_image(image: &RgbaImage, palette: &Palette, mode: ColorSpaceMode) -> Self {
        let numbers = closest_colors(image, palette, mode);
        let cells = image
            .pixels()
            .zip(numbers)
            .map(|(px, number)| if px[3] <= OPAQUE_ALPHA { TRANSPARENT } else { number })
            .collect();
        Self {
            width: image.width(),
            height: image.height(),
            cells,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn get(&self, x: u32, y: u32) -> Option<i32> {
        if x < self.width && y < self.height {
            Some(self.cells[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    /// Pixels whose value differs in `next`, in row-major order.
    pub fn diff(&self, next: &FrameMap) -> Result<Vec<StampPoint>, StampError> {
        if self.dimensions() != next.dimensions() {
            return Err(StampError::processing(
                "frame diff",
                format!(
                    "frame size {}x{} differs from {}x{}",
                    next.width, next.height, self.width, self.height
                ),
            ));
        }
        let width = self.width as usize;
        Ok(self
            .cells
            .iter()
            .zip(&next.cells)
            .enumerate()
            .filter(|(_, (prev, cur))| prev != cur)
            .map(|(i, (_, &cur))| StampPoint::new((i % width) as u32, (i / width) as u32, cur))
            .collect())
    }

    /// Replay a delta block onto this map.
    pub fn apply(&mut self, block: &DeltaBlock) -> Result<(), StampError> {
        for point in &block.changes {
            if point.x >= self.width || point.y >= self.height {
                return Err(StampError::processing_at(
                    "replay delta",
                    format!("point outside {}x{} frame", self.width, self.height),
                    point.x,
                    point.y,
                ));
            }
            self.cells[(point.y * self.width + point.x) as usize] = point.number;
        }
        Ok(())
    }
}

/// Changes from one frame to the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaBlock {
    /// 1 for the frame 1 -> 2 delta, counting up; the closing block is N.
    pub index: usize,
    /// Delay of the target frame, present only when delays are not uniform.
    pub delay: Option<u32>,
    pub changes: Vec<StampPoint>,
}

impl fmt::Display for DeltaBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.delay {
            Some(delay) => writeln!(f, "frame,{},{}", self.index, delay)?,
            None => writeln!(f, "frame,{}", self.index)?,
        }
        for point in &self.changes {
            writeln!(f, "{point}")?;
        }
        Ok(())
    }
}

/// Encoded animation: `stamp.txt` document plus `frames.txt` blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimatedStamp {
    pub document: StampDocument,
    pub blocks: Vec<DeltaBlock>,
}

impl AnimatedStamp {
    pub fn stamp_text(&self) -> String {
        self.document.to_string()
    }

    pub fn frames_text(&self) -> String {
        self.blocks.iter().map(ToString::to_string).collect()
    }
}

/// The shared delay of all frames, or -1 when they differ.
pub fn uniform_delay(delays: &[u32]) -> i64 {
    match delays.split_first() {
        Some((&first, rest)) if rest.iter().all(|&d| d == first) => i64::from(first),
        Some(_) => -1,
        None => 0,
    }
}

/// Encode dithered frames with their delays in milliseconds.
///
/// Frames are mapped to palette numbers in parallel; deltas are computed in
/// frame order.
pub fn encode_animation(
    frames: &[RgbaImage],
    delays: &[u32],
    palette: &Palette,
    mode: ColorSpaceMode,
) -> Result<AnimatedStamp, StampError> {
    let Some(first) = frames.first() else {
        return Err(StampError::Validation("animation has no frames".into()));
    };
    if delays.len() != frames.len() {
        return Err(StampError::Validation(format!(
            "{} delays for {} frames",
            delays.len(),
            frames.len()
        )));
    }
    let (width, height) = first.dimensions();

    let maps: Vec<FrameMap> = frames
        .par_iter()
        .map(|frame| FrameMap::from_image(frame, palette, mode))
        .collect();

    let uniform = uniform_delay(delays);
    let delay_for = |frame: usize| (uniform == -1).then(|| delays[frame]);

    // Frame 1: top to bottom, y not flipped.
    let baseline = &maps[0];
    let mut points = Vec::new();
    for y in 0..height {
        for x in 0..width {
            if first.get_pixel(x, y)[3] > OPAQUE_ALPHA {
                points.push(StampPoint::new(x, y, baseline.cells[(y * width + x) as usize]));
            }
        }
    }

    let mut blocks = Vec::with_capacity(frames.len());
    for (k, pair) in maps.windows(2).enumerate() {
        blocks.push(DeltaBlock {
            index: k + 1,
            delay: delay_for(k + 1),
            changes: pair[0].diff(&pair[1])?,
        });
    }
    let last = &maps[maps.len() - 1];
    blocks.push(DeltaBlock {
        index: frames.len(),
        delay: delay_for(0),
        changes: last.diff(baseline)?,
    });

    tracing::debug!(
        frames = frames.len(),
        uniform_delay = uniform,
        baseline_points = points.len(),
        delta_points = blocks.iter().map(|b| b.changes.len()).sum::<usize>(),
        "Encoded animated stamp"
    );

    Ok(AnimatedStamp {
        document: StampDocument {
            header: StampHeader::Animated {
                width,
                height,
                frame_count: frames.len(),
                uniform_delay: uniform,
            },
            points,
        },
        blocks,
    })
}
