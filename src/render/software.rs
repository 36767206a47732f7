//! CPU triangle rasterizer

use glam::{Vec2, Vec3, Vec4};
use image::{Rgba, RgbaImage};

use crate::core::{Camera, Error, Result};
use crate::geometry::Vertex;

use super::{RenderMode, RenderSurface};

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const LINE_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Minimum ambient term so back-lit faces keep their hue
const AMBIENT: f32 = 0.35;

/// View-distance jump between neighbouring pixels that counts as an edge
const DEPTH_EDGE: f32 = 0.05;

/// Projected triangle corner
#[derive(Clone, Copy)]
struct ScreenVertex {
    position: Vec2,
    depth: f32,
}

/// Software rendering surface with a depth buffer
pub struct SoftwareSurface {
    width: u32,
    height: u32,
    camera: Camera,
    /// Direction light travels in (towards the scene)
    light_dir: Vec3,
    objects: Vec<(String, Vec<Vertex>)>,
}

impl SoftwareSurface {
    /// Create a surface with a camera framing a tree at the origin
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_camera(width, height, Camera::tree_view(width, height))
    }

    pub fn with_camera(width: u32, height: u32, camera: Camera) -> Self {
        Self {
            width,
            height,
            camera,
            light_dir: Vec3::new(-4.0, -5.0, -8.0).normalize(),
            objects: Vec::new(),
        }
    }

    /// Number of submitted vertices across all buffers
    pub fn vertex_count(&self) -> usize {
        self.objects.iter().map(|(_, v)| v.len()).sum()
    }

    fn project(&self, vertex: &Vertex) -> Option<ScreenVertex> {
        let clip = self.camera.view_projection() * vertex.position().extend(1.0);
        if clip.w <= self.camera.near {
            return None;
        }
        let position = self
            .camera
            .project_to_screen(vertex.position(), self.width, self.height)?;
        Some(ScreenVertex {
            position,
            depth: clip.w,
        })
    }

    fn shade(&self, vertices: &[Vertex]) -> Rgba<u8> {
        let normal = vertices
            .iter()
            .map(Vertex::normal)
            .sum::<Vec3>()
            .normalize_or_zero();
        let diffuse = normal.dot(-self.light_dir).abs();
        let intensity = AMBIENT + (1.0 - AMBIENT) * diffuse;

        let color = vertices.iter().map(Vertex::color).sum::<Vec4>() / vertices.len() as f32;
        let rgb = (color.truncate() * intensity).clamp(Vec3::ZERO, Vec3::ONE) * 255.0;
        Rgba([rgb.x as u8, rgb.y as u8, rgb.z as u8, 255])
    }

    /// Rasterize every triangle into the colour and depth buffers
    fn rasterize(&self, color: &mut RgbaImage, depth: &mut [f32]) {
        for (_, vertices) in &self.objects {
            for tri in vertices.chunks_exact(3) {
                let (Some(a), Some(b), Some(c)) =
                    (self.project(&tri[0]), self.project(&tri[1]), self.project(&tri[2]))
                else {
                    continue;
                };
                let fill = self.shade(tri);
                self.fill_triangle([a, b, c], fill, color, depth);
            }
        }
    }

    fn fill_triangle(&self, tri: [ScreenVertex; 3], fill: Rgba<u8>, color: &mut RgbaImage, depth: &mut [f32]) {
        let [a, b, c] = tri;
        let area = edge(a.position, b.position, c.position);
        if area.abs() < 1e-8 {
            return;
        }

        let min = a.position.min(b.position).min(c.position).floor().max(Vec2::ZERO);
        let max = a
            .position
            .max(b.position)
            .max(c.position)
            .ceil()
            .min(Vec2::new(self.width as f32, self.height as f32));
        if min.x >= max.x || min.y >= max.y {
            return;
        }

        for y in min.y as u32..max.y as u32 {
            for x in min.x as u32..max.x as u32 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(b.position, c.position, p) / area;
                let w1 = edge(c.position, a.position, p) / area;
                let w2 = edge(a.position, b.position, p) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let z = w0 * a.depth + w1 * b.depth + w2 * c.depth;
                let slot = (y * self.width + x) as usize;
                if z < depth[slot] {
                    depth[slot] = z;
                    color.put_pixel(x, y, fill);
                }
            }
        }
    }

    /// Outline pass: silhouette and depth discontinuities in black
    fn outline(&self, depth: &[f32]) -> RgbaImage {
        let (w, h) = (self.width, self.height);
        let at = |x: u32, y: u32| depth[(y * w + x) as usize];

        RgbaImage::from_fn(w, h, |x, y| {
            let d = at(x, y);
            if !d.is_finite() {
                return BACKGROUND;
            }
            let neighbours = [
                (x.wrapping_sub(1), y),
                (x + 1, y),
                (x, y.wrapping_sub(1)),
                (x, y + 1),
            ];
            let is_edge = neighbours.iter().any(|&(nx, ny)| {
                if nx >= w || ny >= h {
                    return true;
                }
                let n = at(nx, ny);
                !n.is_finite() || (n - d).abs() > DEPTH_EDGE
            });
            if is_edge { LINE_COLOR } else { BACKGROUND }
        })
    }
}

/// Signed doubled area of (a, b, p)
fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

impl RenderSurface for SoftwareSurface {
    fn clear(&mut self) {
        self.objects.clear();
    }

    fn submit_geometry(&mut self, name: &str, vertices: Vec<Vertex>) {
        match self.objects.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = vertices,
            None => self.objects.push((name.to_string(), vertices)),
        }
    }

    fn render(&mut self, mode: RenderMode) -> Result<RgbaImage> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::Render(format!(
                "render target is {}x{}",
                self.width, self.height
            )));
        }
        if matches!(mode, RenderMode::Hatching | RenderMode::AmbientOcclusion) {
            return Err(Error::Render(format!(
                "{:?} mode is not available on the software surface",
                mode
            )));
        }

        let mut color = RgbaImage::from_pixel(self.width, self.height, BACKGROUND);
        let mut depth = vec![f32::INFINITY; (self.width * self.height) as usize];
        self.rasterize(&mut color, &mut depth);

        Ok(match mode {
            RenderMode::Line => self.outline(&depth),
            _ => color,
        })
    }

    fn camera(&self) -> &Camera {
        &self.camera
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{GeometryEmitter, MeshBuilder};
    use glam::Mat4;

    fn trunk_surface() -> SoftwareSurface {
        let mut mesh = MeshBuilder::new();
        mesh.emit_segment(&Mat4::IDENTITY, 0.5, 0.5, 10.0, Vec4::new(1.0, 0.0, 0.0, 1.0));
        let mut surface = SoftwareSurface::new(128, 128);
        surface.submit_geometry("tree", mesh.into_vertices());
        surface
    }

    #[test]
    fn test_empty_render_is_white() {
        let mut surface = SoftwareSurface::new(32, 32);
        let image = surface.render(RenderMode::Basic).unwrap();
        assert!(image.pixels().all(|p| *p == BACKGROUND));
    }

    #[test]
    fn test_basic_render_keeps_hue() {
        let mut surface = trunk_surface();
        let image = surface.render(RenderMode::Basic).unwrap();
        let red = image
            .pixels()
            .filter(|p| p[0] > p[1] && p[0] > p[2])
            .count();
        assert!(red > 50, "expected red trunk pixels, got {}", red);
        // Trunk is centred horizontally
        let centre = image.get_pixel(64, 64);
        assert!(centre[0] > centre[1]);
    }

    #[test]
    fn test_line_render_is_black_and_white() {
        let mut surface = trunk_surface();
        let image = surface.render(RenderMode::Line).unwrap();
        assert!(image.pixels().all(|p| *p == BACKGROUND || *p == LINE_COLOR));
        assert!(image.pixels().any(|p| *p == LINE_COLOR));
    }

    #[test]
    fn test_submit_replaces_named_buffer() {
        let mut surface = trunk_surface();
        let before = surface.vertex_count();
        surface.submit_geometry("tree", Vec::new());
        assert_eq!(surface.vertex_count(), 0);
        surface.submit_geometry("other", vec![Vertex::default(); 3]);
        assert_eq!(surface.vertex_count(), 3);
        assert!(before > 0);
        surface.clear();
        assert_eq!(surface.vertex_count(), 0);
    }

    #[test]
    fn test_unsupported_modes_fail() {
        let mut surface = trunk_surface();
        assert!(matches!(surface.render(RenderMode::Hatching), Err(Error::Render(_))));
        assert!(matches!(
            surface.render(RenderMode::AmbientOcclusion),
            Err(Error::Render(_))
        ));
    }

    #[test]
    fn test_zero_sized_target_fails() {
        let mut surface = SoftwareSurface::new(0, 16);
        assert!(surface.render(RenderMode::Basic).is_err());
    }
}
