pub mod preview;

pub use preview::{render_animated_preview, render_static_preview};
