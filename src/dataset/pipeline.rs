//! Batch dataset generation driving a render surface

use std::io::BufRead;
use std::path::Path;
use std::time::Instant;

use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};

use crate::config::DatasetConfig;
use crate::core::{Error, Result};
use crate::geometry::{build_mesh, measure, WidthMode};
use crate::procgen::{parse_param_line, NodeRecord, Tree, TreeRng};
use crate::render::{RenderMode, RenderSurface, SoftwareSurface};

use super::export::{image_filename, DatasetWriter, ExportReport};
use super::grid::cut_labeled_patches;
use super::imageops::{downscale_binarized, to_gray};
use super::samples::extract_samples;

/// Name of the vertex buffer holding the current tree
const TREE_BUFFER: &str = "tree";

/// Trees between progress messages
const PROGRESS_INTERVAL: u32 = 10;

/// Generates trees, renders them and writes the resulting training data
pub struct DatasetPipeline<S: RenderSurface> {
    surface: S,
    config: DatasetConfig,
    rng: TreeRng,
}

impl DatasetPipeline<SoftwareSurface> {
    /// Pipeline rendering on the CPU at the configured resolution
    pub fn from_config(config: DatasetConfig) -> Result<Self> {
        config.validate()?;
        let surface = SoftwareSurface::new(config.render_width, config.render_height);
        Ok(Self::new(surface, config))
    }
}

impl<S: RenderSurface> DatasetPipeline<S> {
    pub fn new(surface: S, config: DatasetConfig) -> Self {
        let rng = TreeRng::new(config.seed);
        Self { surface, config, rng }
    }

    /// Next tree that stays above the ground plane
    pub fn next_tree(&mut self) -> Result<Tree> {
        Tree::generate_until(&mut self.rng, self.config.max_attempts, |tree| {
            !measure(tree).underground
        })
    }

    /// Clear the surface, submit `tree` and render it in `mode`
    fn render_tree(&mut self, tree: &Tree, width: WidthMode, mode: RenderMode) -> Result<RgbaImage> {
        let (vertices, stats) = build_mesh(tree, width);
        log::trace!(
            "Tree mesh: {} segments, {} leaves, {} vertices",
            stats.segments,
            stats.leaves,
            vertices.len()
        );
        self.surface.clear();
        self.surface.submit_geometry(TREE_BUFFER, vertices);
        self.surface.render(mode)
    }

    /// Render `tree_count` trees and store a strided grid of patches from
    /// each, sorted into class directories.
    ///
    /// Patches are labeled on the shaded render and stored from the line
    /// render. Trees whose retry budget runs out are skipped.
    pub fn generate_grid_dataset(&mut self) -> Result<ExportReport> {
        let mut writer = DatasetWriter::create(
            &self.config.output_dir,
            &self.config.class_dir_prefix,
            self.config.clean_output,
        )?;
        let layout = self.config.grid_layout();
        let size = self.config.grid_size;
        let start = Instant::now();
        let mut report = ExportReport::default();

        for i in 0..self.config.tree_count {
            let tree = match self.next_tree() {
                Ok(tree) => tree,
                Err(Error::RetryBudgetExhausted { attempts }) => {
                    log::warn!("Tree {}: no acceptable tree after {} attempts, skipping", i, attempts);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let shaded = self.render_tree(&tree, WidthMode::Tapered, RenderMode::Basic)?;
            let lines = self.surface.render(RenderMode::Line)?;

            let shaded = image::imageops::resize(&shaded, size, size, FilterType::Triangle);
            let lines = image::imageops::resize(&lines, size, size, FilterType::Triangle);
            let patches = cut_labeled_patches(&shaded, &lines, &layout, self.config.foreground_ratio)?;
            report += writer.write_patches(patches);

            if (i + 1) % PROGRESS_INTERVAL == 0 {
                log::info!(
                    "Generated {}/{} trees ({} patches) in {:.1}s",
                    i + 1,
                    self.config.tree_count,
                    report.written,
                    start.elapsed().as_secs_f32()
                );
            }
        }

        log::info!(
            "Grid dataset: {} patches written, {} failed, in {:.1}s",
            report.written,
            report.failed,
            start.elapsed().as_secs_f32()
        );
        Ok(report)
    }

    /// Render `tree_count` fixed-width trees and store one labeled sample
    /// per visited node.
    pub fn generate_node_samples(&mut self) -> Result<ExportReport> {
        let mut writer = DatasetWriter::create(
            &self.config.output_dir,
            &self.config.class_dir_prefix,
            self.config.clean_output,
        )?;
        let settings = self.config.sample_settings();
        let mut report = ExportReport::default();

        for i in 0..self.config.tree_count {
            let tree = match self.next_tree() {
                Ok(tree) => tree,
                Err(Error::RetryBudgetExhausted { attempts }) => {
                    log::warn!("Tree {}: no acceptable tree after {} attempts, skipping", i, attempts);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let render = to_gray(&self.render_tree(&tree, WidthMode::Fixed, RenderMode::Basic)?);
            let set = extract_samples(&tree, &render, self.surface.camera(), &settings);
            if set.skipped > 0 {
                log::debug!("Tree {}: {} nodes fell outside the padded render", i, set.skipped);
            }
            report += writer.write_samples(set.samples);

            if (i + 1) % PROGRESS_INTERVAL == 0 {
                log::info!("Sampled {}/{} trees ({} samples)", i + 1, self.config.tree_count, report.written);
            }
        }

        if let Err(e) = writer.save_manifest() {
            log::warn!("Failed to write sample manifest: {}", e);
        }
        Ok(report)
    }

    /// Rebuild one tree per line of `reader` from its node records and write
    /// a downscaled binary render of each into `out_dir`.
    ///
    /// Lines that are not UTF-8 or fail to parse or rebuild are logged and
    /// counted as failed.
    pub fn render_recovered<R: BufRead>(&mut self, mut reader: R, out_dir: &Path) -> Result<ExportReport> {
        std::fs::create_dir_all(out_dir)?;
        let mut report = ExportReport::default();
        let mut buf = Vec::new();
        let mut line_no = 0;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            line_no += 1;

            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line.trim(),
                Err(e) => {
                    log::warn!("Line {}: {}", line_no, e);
                    report.failed += 1;
                    continue;
                }
            };
            if line.is_empty() {
                continue;
            }

            let tree = match parse_param_line(line, NodeRecord::WIDTH).and_then(|groups| Tree::recover(&groups)) {
                Ok(tree) => tree,
                Err(e) => {
                    log::warn!("Line {}: {}", line_no, e);
                    report.failed += 1;
                    continue;
                }
            };

            let render = to_gray(&self.render_tree(&tree, WidthMode::Tapered, RenderMode::Basic)?);
            let image = downscale_binarized(&render, &self.config.recovered_sizes, self.config.binarize_threshold);
            let path = out_dir.join(image_filename(report.written));
            match DynamicImage::ImageLuma8(image).save(&path) {
                Ok(()) => report.written += 1,
                Err(e) => {
                    log::warn!("Failed to write {}: {}", path.display(), e);
                    report.failed += 1;
                }
            }
        }

        log::info!("Recovered {} trees, {} failed", report.written, report.failed);
        Ok(report)
    }
}
