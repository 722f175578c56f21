pub mod background;
pub mod decode;
pub mod pipeline;
pub mod progress;
pub mod writer;

pub use background::{dynamic_threshold, remove_background, BackgroundRemover, MaskMap, NoBackgroundRemover};
pub use decode::{decode_bytes, decode_path, AnimationFrame, DecodedImage, DEFAULT_FRAME_DELAY_MS};
pub use pipeline::{
    clear_below_alpha, crop_to_solid_area, RenderedStamp, StampKind, StampOutput, StampPipeline,
    FRAME_ALPHA_CUTOFF,
};
pub use progress::{CancelToken, Progress};
pub use writer::{remove_stale, StagedOutput};
