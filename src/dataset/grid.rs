//! Strided grid of labeled patches over a pair of renders

use image::{GenericImageView, RgbaImage};

use crate::core::{Error, Result};

use super::classify::{classify_patch, PatchClass};

/// Grid layout of patches over a square raster
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridLayout {
    /// Patches per side (patch side = raster side / divisions)
    pub divisions: u32,
    /// Stride as a fraction of the patch side (stride = side / stride_divisor)
    pub stride_divisor: u32,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            divisions: 10,
            stride_divisor: 3,
        }
    }
}

impl GridLayout {
    /// Top-left corners and size of every patch in a `width` x `height` raster
    pub fn windows(&self, width: u32, height: u32) -> (Vec<(u32, u32)>, (u32, u32)) {
        let patch_w = width / self.divisions.max(1);
        let patch_h = height / self.divisions.max(1);
        let stride = (patch_w / self.stride_divisor.max(1)).max(1) as usize;

        let mut corners = Vec::new();
        if patch_w == 0 || patch_h == 0 {
            return (corners, (patch_w, patch_h));
        }
        for r in (0..height - patch_h).step_by(stride) {
            for c in (0..width - patch_w).step_by(stride) {
                corners.push((c, r));
            }
        }
        (corners, (patch_w, patch_h))
    }
}

/// Cut patches from `stored` at every grid window, each labeled by
/// classifying the same window of `colored`.
pub fn cut_labeled_patches(
    colored: &RgbaImage,
    stored: &RgbaImage,
    layout: &GridLayout,
    foreground_ratio: f32,
) -> Result<Vec<(PatchClass, RgbaImage)>> {
    if colored.dimensions() != stored.dimensions() {
        return Err(Error::Render(format!(
            "render sizes differ: {:?} vs {:?}",
            colored.dimensions(),
            stored.dimensions()
        )));
    }

    let (width, height) = colored.dimensions();
    let (corners, (pw, ph)) = layout.windows(width, height);
    Ok(corners
        .into_iter()
        .map(|(x, y)| {
            let class = classify_patch(&*colored.view(x, y, pw, ph), foreground_ratio);
            (class, stored.view(x, y, pw, ph).to_image())
        })
        .collect())
}
