use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use chalk_dither::{ColorSpaceMode, Ditherer, Palette, OPAQUE_ALPHA};
use image::{imageops, Rgba, RgbaImage};
use rayon::prelude::*;
use serde::Serialize;

use super::background::{remove_background, BackgroundRemover, NoBackgroundRemover};
use super::decode::{decode_path, AnimationFrame, DecodedImage};
use super::progress::{CancelToken, Progress};
use super::writer::{remove_stale, StagedOutput};
use crate::error::StampError;
use crate::models::ProcessConfig;
use crate::rendering::{render_animated_preview, render_static_preview};
use crate::stamp::{encode_animation, encode_static, AnimatedStamp, StampDocument};

pub const STAMP_FILE: &str = "stamp.txt";
pub const FRAMES_FILE: &str = "frames.txt";
pub const STATIC_PREVIEW_FILE: &str = "preview.png";
pub const ANIMATED_PREVIEW_FILE: &str = "preview.gif";

/// Animation frames keep pixels with at least this alpha after dithering.
pub const FRAME_ALPHA_CUTOFF: u8 = 204;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StampKind {
    Static,
    Animated,
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StampOutput {
    pub kind: StampKind,
    pub width: u32,
    pub height: u32,
    pub frame_count: usize,
    pub points: usize,
    pub stamp_path: PathBuf,
    pub frames_path: Option<PathBuf>,
    pub preview_path: PathBuf,
}

/// In-memory result of processing, before anything touches the disk
#[derive(Debug, Clone)]
pub enum RenderedStamp {
    Static {
        image: RgbaImage,
        document: StampDocument,
    },
    Animated {
        frames: Vec<RgbaImage>,
        delays: Vec<u32>,
        stamp: AnimatedStamp,
    },
}

/// Image to stamp pipeline: background removal, resize, tone, dither,
/// transparency cleanup, encoding and artifact writing
pub struct StampPipeline {
    config: ProcessConfig,
    ditherer: Ditherer,
    remover: Box<dyn BackgroundRemover>,
}

impl StampPipeline {
    pub fn new(config: ProcessConfig) -> Result<Self, StampError> {
        config.validate()?;
        let ditherer = config.ditherer()?;
        tracing::debug!(
            algorithm = %ditherer.selected_algorithm(),
            colors = ditherer.palette().len(),
            mode = ?config.mode(),
            "Pipeline ready"
        );
        Ok(Self {
            config,
            ditherer,
            remover: Box::new(NoBackgroundRemover),
        })
    }

    pub fn with_background_remover(mut self, remover: impl BackgroundRemover + 'static) -> Self {
        self.remover = Box::new(remover);
        self
    }

    pub fn config(&self) -> &ProcessConfig {
        &self.config
    }

    pub fn palette(&self) -> &Palette {
        self.ditherer.palette()
    }

    fn mode(&self) -> ColorSpaceMode {
        self.config.mode()
    }

    /// Decode `input`, process it and write the artifacts to the configured
    /// output directory.
    pub fn run(&self, input: &Path, progress: &Progress, cancel: &CancelToken) -> Result<StampOutput, StampError> {
        self.run_to(input, &self.config.output_dir, progress, cancel)
    }

    pub fn run_to(
        &self,
        input: &Path,
        out_dir: &Path,
        progress: &Progress,
        cancel: &CancelToken,
    ) -> Result<StampOutput, StampError> {
        let decoded = decode_path(input)?;
        progress.report(5.0);
        let rendered = self.render(decoded, progress, cancel)?;
        cancel.check()?;
        let output = self.write(&rendered, out_dir)?;
        progress.report(100.0);
        tracing::info!(
            kind = ?output.kind,
            width = output.width,
            height = output.height,
            frames = output.frame_count,
            points = output.points,
            path = %output.stamp_path.display(),
            "Stamp written"
        );
        Ok(output)
    }

    /// Process a decoded input in memory.
    pub fn render(
        &self,
        input: DecodedImage,
        progress: &Progress,
        cancel: &CancelToken,
    ) -> Result<RenderedStamp, StampError> {
        match input {
            DecodedImage::Static(image) => self.render_static(&image, progress, cancel),
            DecodedImage::Animated(frames) => self.render_animation(frames, progress, cancel),
        }
    }

    fn dither_one(&self, image: &RgbaImage, cancel: &CancelToken) -> Result<RgbaImage, StampError> {
        let prepared;
        let mut current = image;
        if self.config.remove_bg {
            prepared = remove_background(image, self.remover.as_ref(), self.config.bg_threshold);
            current = &prepared;
        }
        Ok(self.ditherer.dither_until(current, &|| cancel.is_cancelled())?)
    }

    fn render_static(
        &self,
        image: &RgbaImage,
        progress: &Progress,
        cancel: &CancelToken,
    ) -> Result<RenderedStamp, StampError> {
        cancel.check()?;
        let mut dithered = self.dither_one(image, cancel)?;
        progress.report(70.0);
        cancel.check()?;

        clear_below_alpha(&mut dithered, OPAQUE_ALPHA + 1);
        let image = crop_to_solid_area(&dithered);
        let document = encode_static(&image, self.palette(), self.mode());
        progress.report(90.0);
        tracing::info!(
            width = image.width(),
            height = image.height(),
            points = document.points.len(),
            "Processed static image"
        );
        Ok(RenderedStamp::Static { image, document })
    }

    fn render_animation(
        &self,
        frames: Vec<AnimationFrame>,
        progress: &Progress,
        cancel: &CancelToken,
    ) -> Result<RenderedStamp, StampError> {
        let total = frames.len();
        let done = AtomicUsize::new(0);
        let delays: Vec<u32> = frames.iter().map(|f| f.delay_ms).collect();

        let images = frames
            .par_iter()
            .map(|frame| {
                cancel.check()?;
                let mut dithered = self.dither_one(&frame.image, cancel)?;
                clear_below_alpha(&mut dithered, FRAME_ALPHA_CUTOFF);
                let finished = done.fetch_add(1, Ordering::AcqRel) + 1;
                progress.report(5.0 + 75.0 * finished as f32 / total as f32);
                Ok(dithered)
            })
            .collect::<Result<Vec<RgbaImage>, StampError>>()?;
        cancel.check()?;

        let stamp = encode_animation(&images, &delays, self.palette(), self.mode())?;
        progress.report(90.0);
        tracing::info!(frames = total, header = %stamp.document.header, "Processed animation");
        Ok(RenderedStamp::Animated {
            frames: images,
            delays,
            stamp,
        })
    }

    /// Write the artifacts of a rendered stamp to `out_dir`, all or nothing.
    pub fn write(&self, rendered: &RenderedStamp, out_dir: &Path) -> Result<StampOutput, StampError> {
        let mut staged = StagedOutput::new(out_dir)?;
        // stamp.txt goes last: once it is in place, its companions are too.
        let output = match rendered {
            RenderedStamp::Static { image, document } => {
                let preview_path = staged.stage(STATIC_PREVIEW_FILE, &render_static_preview(image)?)?;
                let stamp_path = staged.stage(STAMP_FILE, document.to_string().as_bytes())?;
                StampOutput {
                    kind: StampKind::Static,
                    width: image.width(),
                    height: image.height(),
                    frame_count: 1,
                    points: document.points.len(),
                    stamp_path,
                    frames_path: None,
                    preview_path,
                }
            }
            RenderedStamp::Animated {
                frames,
                delays,
                stamp,
            } => {
                let (width, height) = frames.first().map(|f| f.dimensions()).unwrap_or((0, 0));
                let preview_path =
                    staged.stage(ANIMATED_PREVIEW_FILE, &render_animated_preview(frames, delays)?)?;
                let frames_path = staged.stage(FRAMES_FILE, stamp.frames_text().as_bytes())?;
                let stamp_path = staged.stage(STAMP_FILE, stamp.stamp_text().as_bytes())?;
                StampOutput {
                    kind: StampKind::Animated,
                    width,
                    height,
                    frame_count: frames.len(),
                    points: stamp.document.points.len(),
                    stamp_path,
                    frames_path: Some(frames_path),
                    preview_path,
                }
            }
        };
        staged.commit()?;

        match output.kind {
            StampKind::Static => {
                remove_stale(&out_dir.join(FRAMES_FILE))?;
                remove_stale(&out_dir.join(ANIMATED_PREVIEW_FILE))?;
            }
            StampKind::Animated => {
                remove_stale(&out_dir.join(STATIC_PREVIEW_FILE))?;
            }
        }
        Ok(output)
    }
}

/// Make every pixel with alpha below `min_alpha` fully transparent black.
pub fn clear_below_alpha(image: &mut RgbaImage, min_alpha: u8) {
    for px in image.pixels_mut() {
        if px[3] < min_alpha {
            *px = Rgba([0, 0, 0, 0]);
        }
    }
}

/// Crop to the bounding box of pixels with non-zero alpha; a fully
/// transparent image becomes a single transparent pixel.
pub fn crop_to_solid_area(image: &RgbaImage) -> RgbaImage {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, px) in image.enumerate_pixels() {
        if px[3] == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    match bounds {
        Some((x0, y0, x1, y1)) => imageops::crop_imm(image, x0, y0, x1 - x0 + 1, y1 - y0 + 1).to_image(),
        None => RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 0])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MaskMap;

    fn pipeline(config: ProcessConfig) -> StampPipeline {
        StampPipeline::new(config).unwrap()
    }

    #[test]
    fn test_clear_below_alpha() {
        let mut image = RgbaImage::from_fn(3, 1, |x, _| Rgba([9, 9, 9, [191, 192, 255][x as usize]]));
        clear_below_alpha(&mut image, OPAQUE_ALPHA + 1);
        assert_eq!(*image.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
        assert_eq!(*image.get_pixel(1, 0), Rgba([9, 9, 9, 192]));

        let mut image = RgbaImage::from_pixel(1, 1, Rgba([9, 9, 9, 203]));
        clear_below_alpha(&mut image, FRAME_ALPHA_CUTOFF);
        assert_eq!(*image.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_crop_to_solid_area() {
        let mut image = RgbaImage::new(6, 5);
        image.put_pixel(2, 1, Rgba([1, 1, 1, 255]));
        image.put_pixel(4, 3, Rgba([2, 2, 2, 255]));
        let cropped = crop_to_solid_area(&image);
        assert_eq!(cropped.dimensions(), (3, 3));
        assert_eq!(*cropped.get_pixel(0, 0), Rgba([1, 1, 1, 255]));
        assert_eq!(*cropped.get_pixel(2, 2), Rgba([2, 2, 2, 255]));
    }

    #[test]
    fn test_crop_fully_transparent() {
        let cropped = crop_to_solid_area(&RgbaImage::new(4, 4));
        assert_eq!(cropped, RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 0])));
    }

    #[test]
    fn test_render_static_crops_and_encodes() {
        let mut image = RgbaImage::new(6, 6);
        for y in 2..4 {
            for x in 1..4 {
                image.put_pixel(x, y, Rgba([255, 231, 197, 255]));
            }
        }
        let p = pipeline(ProcessConfig::default());
        let rendered = p
            .render(DecodedImage::Static(image), &Progress::none(), &CancelToken::new())
            .unwrap();
        let RenderedStamp::Static { image, document } = rendered else {
            panic!("Expected static stamp");
        };
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(document.points.len(), 6);
        assert!(document.points.iter().all(|p| p.number == 0));
    }

    #[test]
    fn test_render_animation_applies_cutoff() {
        let frames = vec![
            AnimationFrame {
                image: RgbaImage::from_pixel(2, 2, Rgba([42, 56, 68, 255])),
                delay_ms: 100,
            },
            AnimationFrame {
                image: RgbaImage::from_pixel(2, 2, Rgba([42, 56, 68, 203])),
                delay_ms: 100,
            },
        ];
        let p = pipeline(ProcessConfig::default());
        let rendered = p
            .render(DecodedImage::Animated(frames), &Progress::none(), &CancelToken::new())
            .unwrap();
        let RenderedStamp::Animated { frames, stamp, .. } = rendered else {
            panic!("Expected animation");
        };
        assert!(frames[1].pixels().all(|px| px[3] == 0));
        assert_eq!(stamp.blocks[0].changes.len(), 4);
        assert!(stamp.blocks[0].changes.iter().all(|c| c.number == -1));
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let p = pipeline(ProcessConfig::default());
        let result = p.render(
            DecodedImage::Static(RgbaImage::new(2, 2)),
            &Progress::none(),
            &cancel,
        );
        assert!(matches!(result, Err(StampError::Cancelled)));
    }

    #[test]
    fn test_background_remover_is_used() {
        let config = ProcessConfig {
            remove_bg: true,
            bg_threshold: Some(0.5),
            ..Default::default()
        };
        let remover = |img: &RgbaImage| {
            let values = (0..img.width() * img.height())
                .map(|i| if i % img.width() == 0 { 1.0 } else { 0.0 })
                .collect();
            MaskMap::new(img.width(), img.height(), values)
        };
        let p = pipeline(config).with_background_remover(remover);
        let image = RgbaImage::from_pixel(4, 3, Rgba([42, 56, 68, 255]));
        let rendered = p
            .render(DecodedImage::Static(image), &Progress::none(), &CancelToken::new())
            .unwrap();
        let RenderedStamp::Static { image, .. } = rendered else {
            panic!("Expected static stamp");
        };
        assert_eq!(image.dimensions(), (1, 3));
    }

    #[test]
    fn test_cancel_during_static_dither_stops_before_encoding() {
        let config = ProcessConfig {
            remove_bg: true,
            bg_threshold: Some(0.5),
            ..Default::default()
        };
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let remover = move |img: &RgbaImage| {
            trigger.cancel();
            MaskMap::new(img.width(), img.height(), vec![1.0; (img.width() * img.height()) as usize])
        };
        let p = pipeline(config).with_background_remover(remover);
        let progress = Progress::none();
        let result = p.render(
            DecodedImage::Static(RgbaImage::from_pixel(64, 64, Rgba([120, 80, 40, 255]))),
            &progress,
            &cancel,
        );
        assert!(matches!(result, Err(StampError::Cancelled)));
        assert!(progress.current() < 70.0);
    }

    #[test]
    fn test_progress_reaches_ninety_in_render() {
        let p = pipeline(ProcessConfig::default());
        let progress = Progress::none();
        p.render(
            DecodedImage::Static(RgbaImage::from_pixel(3, 3, Rgba([1, 2, 3, 255]))),
            &progress,
            &CancelToken::new(),
        )
        .unwrap();
        assert_eq!(progress.current(), 90.0);
    }
}
