pub mod config;

pub use config::{ColorSpace, PaletteEntryConfig, PaletteRole, ProcessConfig};
