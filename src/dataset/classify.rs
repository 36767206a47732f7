//! Patch class assignment by dominant colour channel

use image::{GenericImageView, Rgba};
use serde::{Deserialize, Serialize};

/// Channel value at or above which all three channels mark a background pixel
const BACKGROUND_LEVEL: u8 = 240;

/// Class of an image patch, numbered as written to disk
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PatchClass {
    Background = 0,
    Trunk = 1,
    Branch = 2,
    Leaf = 3,
}

impl PatchClass {
    pub const ALL: [PatchClass; 4] = [Self::Background, Self::Trunk, Self::Branch, Self::Leaf];

    pub fn id(self) -> usize {
        self as usize
    }
}

/// Foreground pixel counts per dominant channel
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChannelCounts {
    pub trunk: usize,
    pub branch: usize,
    pub leaf: usize,
}

impl ChannelCounts {
    pub fn foreground(&self) -> usize {
        self.trunk + self.branch + self.leaf
    }
}

/// Count pixels whose red, green or blue channel strictly dominates.
/// Background pixels and ties are ignored.
pub fn count_channels<I>(patch: &I) -> ChannelCounts
where
    I: GenericImageView<Pixel = Rgba<u8>>,
{
    let mut counts = ChannelCounts::default();
    for (_, _, Rgba([r, g, b, _])) in patch.pixels() {
        if r >= BACKGROUND_LEVEL && g >= BACKGROUND_LEVEL && b >= BACKGROUND_LEVEL {
            continue;
        }
        if r > g && r > b {
            counts.trunk += 1;
        } else if g > r && g > b {
            counts.branch += 1;
        } else if b > g && b > r {
            counts.leaf += 1;
        }
    }
    counts
}

/// Classify a colour-rendered patch.
///
/// Patches whose foreground covers less than `foreground_ratio` of their area
/// are background regardless of which channel dominates.
pub fn classify_patch<I>(patch: &I, foreground_ratio: f32) -> PatchClass
where
    I: GenericImageView<Pixel = Rgba<u8>>,
{
    let counts = count_channels(patch);
    let (w, h) = patch.dimensions();
    let threshold = ((w * h) as f32 * foreground_ratio) as usize;

    if counts.foreground() < threshold || counts.foreground() == 0 {
        PatchClass::Background
    } else if counts.trunk > counts.branch && counts.trunk > counts.leaf {
        PatchClass::Trunk
    } else if counts.branch > counts.leaf {
        PatchClass::Branch
    } else {
        PatchClass::Leaf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    const RATIO: f32 = 0.01;

    #[test]
    fn test_white_patch_is_background() {
        let patch = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));
        assert_eq!(classify_patch(&patch, RATIO), PatchClass::Background);
    }

    #[test]
    fn test_near_white_patch_is_background() {
        let patch = RgbaImage::from_pixel(3, 3, Rgba([250, 240, 240, 255]));
        assert_eq!(classify_patch(&patch, RATIO), PatchClass::Background);
    }

    #[test]
    fn test_sparse_foreground_is_background() {
        // 99 red pixels in a 100x100 patch stay under the 1% threshold
        let mut patch = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));
        for x in 0..99 {
            patch.put_pixel(x, 50, Rgba([200, 0, 0, 255]));
        }
        assert_eq!(classify_patch(&patch, RATIO), PatchClass::Background);

        patch.put_pixel(99, 50, Rgba([200, 0, 0, 255]));
        assert_eq!(classify_patch(&patch, RATIO), PatchClass::Trunk);
    }

    #[test]
    fn test_red_majority_is_trunk() {
        let patch = RgbaImage::from_fn(10, 10, |x, _| {
            if x < 6 {
                Rgba([180, 20, 20, 255])
            } else {
                Rgba([20, 180, 20, 255])
            }
        });
        assert_eq!(classify_patch(&patch, RATIO), PatchClass::Trunk);
    }

    #[test]
    fn test_green_and_blue() {
        let green = RgbaImage::from_pixel(8, 8, Rgba([10, 200, 10, 255]));
        assert_eq!(classify_patch(&green, RATIO), PatchClass::Branch);
        let blue = RgbaImage::from_pixel(8, 8, Rgba([10, 10, 200, 255]));
        assert_eq!(classify_patch(&blue, RATIO), PatchClass::Leaf);
    }

    #[test]
    fn test_classify_sub_view() {
        let mut image = RgbaImage::from_pixel(20, 10, Rgba([255, 255, 255, 255]));
        for y in 0..10 {
            for x in 10..20 {
                image.put_pixel(x, y, Rgba([0, 150, 0, 255]));
            }
        }
        assert_eq!(classify_patch(&image.view(0, 0, 10, 10).to_image(), RATIO), PatchClass::Background);
        assert_eq!(classify_patch(&image.view(10, 0, 10, 10).to_image(), RATIO), PatchClass::Branch);
    }

    #[test]
    fn test_class_ids() {
        let ids: Vec<usize> = PatchClass::ALL.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }
}
