use chalk_dither::{
    ColorSpaceMode, DitherAlgorithm, DitherOptions, Ditherer, Palette, PaletteEntry, ToneOptions,
    BoostMode, BLANK_NUMBER, DEFAULT_BOOST, DEFAULT_CLUSTERS, DYNAMIC_NUMBER,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::StampError;

/// Processing configuration loaded from a YAML file
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ProcessConfig {
    /// Chalk colors available to the stamp
    pub palette: Vec<PaletteEntryConfig>,

    /// Dithering method, by display name or id
    pub algorithm: String,

    /// Method strength (method default when unset)
    pub strength: Option<f32>,

    /// Cluster count for k-means mapping
    pub clusters: usize,

    /// Seed for random dithering (entropy when unset)
    pub seed: Option<u64>,

    /// Color space used for matching and preprocessing
    pub color_space: ColorSpace,

    /// Run the tone preprocessor before dithering
    pub preprocess: bool,

    /// Brightness adjustment in [0, 1] (automatic when unset)
    pub brightness: Option<f32>,

    /// Derive saturation boost from image statistics
    pub auto_boost: bool,

    /// Target size of the longer side
    pub resize: Option<u32>,

    /// Apply the background remover before anything else
    pub remove_bg: bool,

    /// Fixed mask threshold for background removal (dynamic when unset)
    pub bg_threshold: Option<f32>,

    /// Directory receiving stamp.txt, frames.txt and the preview
    pub output_dir: PathBuf,
}

/// One chalk color
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PaletteEntryConfig {
    /// Hex color (`#rrggbb`, `rrggbb` or `#rgb`)
    pub hex: String,

    /// Number written to the stamp file
    pub number: i32,

    #[serde(default = "default_boost")]
    pub boost: f32,

    /// Boost mask threshold (color space default when unset)
    #[serde(default)]
    pub threshold: Option<f32>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Relabels the entry with a reserved number
    #[serde(default)]
    pub role: Option<PaletteRole>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaletteRole {
    /// Animated "RGB" chalk
    Dynamic,
    /// Pixels to leave out of the stamp
    Blank,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    #[default]
    Rgb,
    Lab,
}

fn default_boost() -> f32 {
    DEFAULT_BOOST
}

fn default_enabled() -> bool {
    true
}

const CHALK_COLORS: [(i32, &str); 6] = [
    (0, "ffe7c5"),
    (1, "2a3844"),
    (2, "d70b5d"),
    (3, "0db39e"),
    (4, "f4c009"),
    (6, "bac357"),
];

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            palette: CHALK_COLORS
                .iter()
                .map(|&(number, hex)| PaletteEntryConfig {
                    hex: hex.to_string(),
                    number,
                    boost: DEFAULT_BOOST,
                    threshold: Some(20.0),
                    enabled: true,
                    role: None,
                })
                .collect(),
            algorithm: DitherAlgorithm::default().name().to_string(),
            strength: None,
            clusters: DEFAULT_CLUSTERS,
            seed: None,
            color_space: ColorSpace::Rgb,
            preprocess: false,
            brightness: None,
            auto_boost: false,
            resize: None,
            remove_bg: false,
            bg_threshold: None,
            output_dir: PathBuf::from("."),
        }
    }
}

impl From<ColorSpace> for ColorSpaceMode {
    fn from(space: ColorSpace) -> Self {
        match space {
            ColorSpace::Rgb => ColorSpaceMode::Rgb,
            ColorSpace::Lab => ColorSpaceMode::Lab,
        }
    }
}

impl PaletteEntryConfig {
    /// Stamp number after applying the role
    pub fn effective_number(&self) -> i32 {
        match self.role {
            Some(PaletteRole::Dynamic) => DYNAMIC_NUMBER,
            Some(PaletteRole::Blank) => BLANK_NUMBER,
            None => self.number,
        }
    }
}

impl ProcessConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self, StampError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StampError::Validation(format!("cannot read config {}: {e}", path.display()))
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, StampError> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| StampError::Validation(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the given file, or use the defaults when no file is named.
    ///
    /// A named file that is missing or invalid is an error, never a silent
    /// fallback.
    pub fn resolve(path: Option<&Path>) -> Result<Self, StampError> {
        let Some(path) = path else {
            tracing::debug!("No config file given, using defaults");
            return Ok(Self::default());
        };
        let config = Self::load(path)?;
        tracing::info!(
            path = %path.display(),
            colors = config.palette.len(),
            algorithm = %config.algorithm,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Check everything that can be checked without an image
    pub fn validate(&self) -> Result<(), StampError> {
        self.to_palette()?;
        self.dither_algorithm()?;
        if let Some(strength) = self.strength {
            if !strength.is_finite() {
                return Err(StampError::Validation(format!("invalid strength {strength}")));
            }
        }
        if self.clusters == 0 {
            return Err(StampError::Validation("clusters must be at least 1".into()));
        }
        if self.resize == Some(0) {
            return Err(StampError::Validation("resize target must be at least 1".into()));
        }
        Ok(())
    }

    pub fn mode(&self) -> ColorSpaceMode {
        self.color_space.into()
    }

    /// Build the validated palette from the enabled entries
    pub fn to_palette(&self) -> Result<Palette, StampError> {
        let defaults = ToneOptions::new(self.mode());
        let entries = self
            .palette
            .iter()
            .filter(|entry| entry.enabled)
            .map(|entry| {
                let threshold = entry.threshold.unwrap_or_else(|| defaults.default_threshold());
                PaletteEntry::from_hex(entry.effective_number(), &entry.hex)
                    .map(|e| e.with_boost(entry.boost).with_threshold(threshold))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Palette::new(entries)?)
    }

    pub fn dither_algorithm(&self) -> Result<DitherAlgorithm, StampError> {
        Ok(self.algorithm.parse::<DitherAlgorithm>()?)
    }

    pub fn dither_options(&self) -> Result<DitherOptions, StampError> {
        let algorithm = self.dither_algorithm()?;
        let mut options = algorithm
            .default_options()
            .mode(self.mode())
            .clusters(self.clusters);
        if let Some(strength) = self.strength {
            options = options.strength(strength);
        }
        if let Some(seed) = self.seed {
            options = options.seed(seed);
        }
        Ok(options)
    }

    pub fn tone_options(&self) -> Option<ToneOptions> {
        if !self.preprocess {
            return None;
        }
        let mut tone = ToneOptions::new(self.mode()).boost_mode(if self.auto_boost {
            BoostMode::Adaptive
        } else {
            BoostMode::Manual
        });
        if let Some(brightness) = self.brightness {
            tone = tone.brightness(brightness);
        }
        Some(tone)
    }

    /// Engine builder for this configuration
    pub fn ditherer(&self) -> Result<Ditherer, StampError> {
        let options = self.dither_options()?;
        let mut ditherer = Ditherer::new(self.to_palette()?)
            .mode(options.mode)
            .algorithm(self.dither_algorithm()?)
            .strength(options.strength)
            .clusters(options.clusters);
        if let Some(seed) = options.seed {
            ditherer = ditherer.seed(seed);
        }
        if let Some(tone) = self.tone_options() {
            ditherer = ditherer.tone(tone);
        }
        if let Some(target) = self.resize {
            ditherer = ditherer.resize(target);
        }
        Ok(ditherer)
    }
}
