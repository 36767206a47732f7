//! Per-node training samples.
//!
//! For each visited node, the rendered tree is rotated about the node's
//! projected end point so its segment stands upright, a window above the
//! point is cut out, resized and binarized. The patch is paired with a label
//! describing the branching decision at that node.

use glam::{Mat4, Vec2, Vec3};
use image::GrayImage;

use crate::core::{Camera, Error, Result};
use crate::geometry::node_frame;
use crate::procgen::{NodeId, Tree};

use super::imageops::{binarize, pad, resize, rotated_crop};

/// Label of a node without the corresponding child: (exists, curvature)
const ABSENT_CHILD: (f32, f32) = (0.0, 0.5);

/// Shortest on-screen segment, in pixels, that still gets a sample
const MIN_PROJECTED_LENGTH: f32 = 1e-3;

/// Sampling parameters
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleSettings {
    /// White border added around the render so crops near the edge stay valid
    pub padding: u32,
    /// Side of the cropped window in render pixels
    pub crop_size: u32,
    /// Side of the stored patch
    pub sample_size: u32,
    pub threshold: u8,
}

impl Default for SampleSettings {
    fn default() -> Self {
        Self {
            padding: 300,
            crop_size: 64,
            sample_size: 128,
            threshold: 200,
        }
    }
}

/// A binarized patch around one node and its branching label
#[derive(Clone, Debug)]
pub struct TrainingSample {
    pub node: NodeId,
    pub image: GrayImage,
    /// `[has_continuation, continuation_curve, has_branch, branch_curve]`,
    /// curvatures mapped onto [0, 1]
    pub label: [f32; 4],
}

/// Branching label for `id`: existence flag and normalized curvature of
/// both child slots
pub fn branching_label(tree: &Tree, id: NodeId) -> [f32; 4] {
    let node = tree.node(id);
    let slot = |child: Option<NodeId>| {
        child.map_or(ABSENT_CHILD, |c| (1.0, tree.node(c).normalized_curve_v()))
    };
    let (a, b) = slot(node.continuation());
    let (c, d) = slot(node.branch());
    [a, b, c, d]
}

/// Result of a sampling pass
#[derive(Debug, Default)]
pub struct SampleSet {
    pub samples: Vec<TrainingSample>,
    /// Nodes whose window could not be cut
    pub skipped: usize,
}

struct Frame {
    id: NodeId,
    transform: Mat4,
    length: f32,
}

/// Cut one sample per visited node out of `image`, a render of `tree` seen
/// through `camera`.
///
/// Every continuation is followed; side branches are followed only from the
/// trunk and first-order branches.
pub fn extract_samples(tree: &Tree, image: &GrayImage, camera: &Camera, settings: &SampleSettings) -> SampleSet {
    let (width, height) = image.dimensions();
    let padded = pad(image, settings.padding, 255);
    let offset = Vec2::splat(settings.padding as f32);

    let mut set = SampleSet::default();
    let mut stack = vec![Frame {
        id: tree.root(),
        transform: Mat4::IDENTITY,
        length: Tree::trunk_segment_length(),
    }];

    while let Some(frame) = stack.pop() {
        let node = tree.node(frame.id);
        let transform = node_frame(&frame.transform, node);

        let sample = project_segment(camera, &transform, frame.length, (width, height))
            .ok_or_else(|| Error::DegenerateSample(format!("node {} has no visible extent", frame.id.0)))
            .and_then(|end| cut_patch(&padded, end + offset, tilt_degrees(&transform), settings));

        match sample {
            Ok(patch) => set.samples.push(TrainingSample {
                node: frame.id,
                image: patch,
                label: branching_label(tree, frame.id),
            }),
            Err(e) => {
                log::debug!("Skipping sample: {}", e);
                set.skipped += 1;
            }
        }

        let next = transform * Mat4::from_translation(Vec3::Y * frame.length);
        if node.level <= 1 {
            if let Some(branch) = node.branch() {
                stack.push(Frame {
                    id: branch,
                    transform: next,
                    length: frame.length * tree.node(branch).attenuation_factor,
                });
            }
        }
        if let Some(child) = node.continuation() {
            stack.push(Frame {
                id: child,
                transform: next,
                length: frame.length,
            });
        }
    }

    set
}

/// Screen position of a segment's end point.
///
/// `None` when either end falls behind the camera or the segment collapses
/// to a point on screen.
fn project_segment(camera: &Camera, transform: &Mat4, length: f32, (width, height): (u32, u32)) -> Option<Vec2> {
    let start = camera.project_to_screen(transform.transform_point3(Vec3::ZERO), width, height)?;
    let end = camera.project_to_screen(transform.transform_point3(Vec3::Y * length), width, height)?;
    (start.distance(end) > MIN_PROJECTED_LENGTH).then_some(end)
}

/// In-plane tilt of a frame's growth direction, in degrees
fn tilt_degrees(transform: &Mat4) -> f32 {
    transform.x_axis.y.clamp(-1.0, 1.0).asin().to_degrees()
}

/// Rotate so the segment stands upright, then cut the window above `anchor`
fn cut_patch(padded: &GrayImage, anchor: Vec2, tilt: f32, settings: &SampleSettings) -> Result<GrayImage> {
    let size = settings.crop_size;
    let origin = (
        (anchor.x - size as f32 / 2.0).round() as i64,
        (anchor.y - size as f32).round() as i64,
    );
    let window = rotated_crop(padded, anchor, -tilt, origin, (size, size), 255)?;
    let resized = resize(&window, settings.sample_size, settings.sample_size);
    Ok(binarize(&resized, settings.threshold))
}
