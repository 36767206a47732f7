//! Dataset generation configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::dataset::{GridLayout, SampleSettings};

/// Configuration for a dataset generation run.
///
/// Loaded from JSON; missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatasetConfig {
    /// Seed for the tree generator
    pub seed: u64,
    /// Trees to generate per run
    pub tree_count: u32,
    /// Root of the dataset directory tree
    pub output_dir: PathBuf,
    /// Class directories are named `<prefix>_NN`
    pub class_dir_prefix: String,
    /// Remove `output_dir` before writing
    pub clean_output: bool,
    /// Render target width
    pub render_width: u32,
    /// Render target height
    pub render_height: u32,
    /// Side of the square raster renders are resized to before grid cutting
    pub grid_size: u32,
    /// Patches per side of the grid
    pub grid_divisions: u32,
    /// Grid stride = patch side / stride_divisor
    pub stride_divisor: u32,
    /// Regeneration attempts before giving up on a tree
    pub max_attempts: u32,
    /// White border around renders before node sampling
    pub sample_padding: u32,
    /// Node sample crop window side, in render pixels
    pub crop_size: u32,
    /// Stored node sample side
    pub sample_size: u32,
    /// Binarization threshold
    pub binarize_threshold: u8,
    /// Minimum foreground fraction for a non-background patch
    pub foreground_ratio: f32,
    /// Successive sizes a reconstruction render is reduced through
    pub recovered_sizes: Vec<u32>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            seed: 2,
            tree_count: 300,
            output_dir: PathBuf::from("dataset"),
            class_dir_prefix: "patches".to_string(),
            clean_output: false,
            render_width: 512,
            render_height: 512,
            grid_size: 2560,
            grid_divisions: 10,
            stride_divisor: 3,
            max_attempts: 100,
            sample_padding: 300,
            crop_size: 64,
            sample_size: 128,
            binarize_threshold: 200,
            foreground_ratio: 0.01,
            recovered_sizes: vec![512, 256, 128],
        }
    }
}

impl DatasetConfig {
    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Save as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject settings that cannot produce output
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("render_width", self.render_width),
            ("render_height", self.render_height),
            ("grid_size", self.grid_size),
            ("grid_divisions", self.grid_divisions),
            ("stride_divisor", self.stride_divisor),
            ("max_attempts", self.max_attempts),
            ("crop_size", self.crop_size),
            ("sample_size", self.sample_size),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(Error::InvalidConfig(format!("{} must be positive", name)));
        }
        if !(0.0..=1.0).contains(&self.foreground_ratio) {
            return Err(Error::InvalidConfig(format!(
                "foreground_ratio {} outside [0, 1]",
                self.foreground_ratio
            )));
        }
        if self.recovered_sizes.contains(&0) {
            return Err(Error::InvalidConfig("recovered_sizes must be positive".into()));
        }
        Ok(())
    }

    pub fn grid_layout(&self) -> GridLayout {
        GridLayout {
            divisions: self.grid_divisions,
            stride_divisor: self.stride_divisor,
        }
    }

    pub fn sample_settings(&self) -> SampleSettings {
        SampleSettings {
            padding: self.sample_padding,
            crop_size: self.crop_size,
            sample_size: self.sample_size,
            threshold: self.binarize_threshold,
        }
    }
}
