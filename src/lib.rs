//! Pawcessor - image to chalk stamp converter
//!
//! Turns still images and animations into stamp files: every opaque pixel
//! becomes one chalk color number. Color work happens in the `chalk-dither`
//! crate; this crate decodes inputs, drives the pipeline and writes
//! `stamp.txt`, `frames.txt` and a preview.

pub mod error;
pub mod models;
pub mod rendering;
pub mod services;
pub mod stamp;

pub use error::StampError;
pub use models::ProcessConfig;
pub use services::{CancelToken, Progress, StampOutput, StampPipeline};
