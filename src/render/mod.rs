//! Rendering surface interface
//!
//! Tree geometry is handed to a [`RenderSurface`] as named vertex buffers and
//! read back as an RGBA raster. [`SoftwareSurface`] is a CPU implementation
//! covering the modes needed for dataset generation.

pub mod software;

use image::RgbaImage;

use crate::core::{Camera, Result};
use crate::geometry::Vertex;

pub use software::SoftwareSurface;

/// Shading mode for a render request
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Lambert-shaded vertex colours on a white background
    #[default]
    Basic,
    /// Black outlines on a white background
    Line,
    /// Outlines with hatched shading
    Hatching,
    /// Basic shading composited with screen-space ambient occlusion
    AmbientOcclusion,
}

/// Target that renders submitted triangle lists to a raster
pub trait RenderSurface {
    /// Remove all submitted geometry
    fn clear(&mut self);

    /// Submit a triangle list under `name`, replacing any buffer with that name
    fn submit_geometry(&mut self, name: &str, vertices: Vec<Vertex>);

    /// Render all submitted geometry
    fn render(&mut self, mode: RenderMode) -> Result<RgbaImage>;

    /// Camera used for rendering
    fn camera(&self) -> &Camera;

    /// Output raster size (width, height)
    fn size(&self) -> (u32, u32);
}
