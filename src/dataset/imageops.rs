//! Raster operations used to cut training patches

use glam::Vec2;
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbaImage};

use crate::core::{Error, Result};

/// Grayscale copy of an RGBA raster
pub fn to_gray(image: &RgbaImage) -> GrayImage {
    imageops::grayscale(image)
}

/// Surround `image` with a `padding`-pixel border of `fill`
pub fn pad(image: &GrayImage, padding: u32, fill: u8) -> GrayImage {
    let mut padded = GrayImage::from_pixel(
        image.width() + padding * 2,
        image.height() + padding * 2,
        Luma([fill]),
    );
    imageops::replace(&mut padded, image, padding as i64, padding as i64);
    padded
}

/// Bilinear resize
pub fn resize(image: &GrayImage, width: u32, height: u32) -> GrayImage {
    imageops::resize(image, width, height, FilterType::Triangle)
}

/// Pixels above `threshold` become 255, the rest 0
pub fn binarize(image: &GrayImage, threshold: u8) -> GrayImage {
    let mut out = image.clone();
    for p in out.pixels_mut() {
        p[0] = if p[0] > threshold { 255 } else { 0 };
    }
    out
}

/// Resize through each of `sizes` in turn, binarizing after every step
pub fn downscale_binarized(image: &GrayImage, sizes: &[u32], threshold: u8) -> GrayImage {
    sizes.iter().fold(image.clone(), |img, &size| {
        binarize(&resize(&img, size, size), threshold)
    })
}

/// Window of `image` rotated by `degrees` about `center`.
///
/// Positive angles rotate counter-clockwise as displayed (Y down). Only the
/// `width` x `height` window at (`x`, `y`) of the rotated image is computed;
/// the window must lie inside the image bounds. Samples falling outside the
/// source read as `fill`.
pub fn rotated_crop(
    image: &GrayImage,
    center: Vec2,
    degrees: f32,
    (x, y): (i64, i64),
    (width, height): (u32, u32),
    fill: u8,
) -> Result<GrayImage> {
    if x < 0
        || y < 0
        || x + width as i64 > image.width() as i64
        || y + height as i64 > image.height() as i64
    {
        return Err(Error::DegenerateSample(format!(
            "{}x{} window at ({}, {}) leaves the {}x{} image",
            width,
            height,
            x,
            y,
            image.width(),
            image.height()
        )));
    }

    let (sin, cos) = degrees.to_radians().sin_cos();
    Ok(GrayImage::from_fn(width, height, |cx, cy| {
        let d = Vec2::new((x + cx as i64) as f32, (y + cy as i64) as f32) - center;
        let src = Vec2::new(cos * d.x - sin * d.y, sin * d.x + cos * d.y) + center;
        Luma([sample_bilinear(image, src, fill)])
    }))
}

fn sample_bilinear(image: &GrayImage, p: Vec2, fill: u8) -> u8 {
    let x0 = p.x.floor();
    let y0 = p.y.floor();
    let fx = p.x - x0;
    let fy = p.y - y0;

    let texel = |x: f32, y: f32| -> f32 {
        if x < 0.0 || y < 0.0 || x >= image.width() as f32 || y >= image.height() as f32 {
            fill as f32
        } else {
            image.get_pixel(x as u32, y as u32)[0] as f32
        }
    };

    let top = texel(x0, y0) * (1.0 - fx) + texel(x0 + 1.0, y0) * fx;
    let bottom = texel(x0, y0 + 1.0) * (1.0 - fx) + texel(x0 + 1.0, y0 + 1.0) * fx;
    (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8
}
