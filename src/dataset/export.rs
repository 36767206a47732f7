//! Dataset directory layout and image output

use std::fs;
use std::ops::AddAssign;
use std::path::PathBuf;

use image::{DynamicImage, RgbaImage};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::Result;

use super::classify::PatchClass;
use super::samples::TrainingSample;

/// Subdirectory holding per-node training samples
pub const SAMPLES_DIR: &str = "samples";

/// Label manifest written next to the samples
pub const MANIFEST_FILENAME: &str = "labels.json";

/// Outcome counts of a batch of writes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub written: usize,
    pub failed: usize,
}

impl AddAssign for ExportReport {
    fn add_assign(&mut self, other: Self) {
        self.written += other.written;
        self.failed += other.failed;
    }
}

/// One line of the sample manifest
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SampleEntry {
    pub file: String,
    pub node: usize,
    pub label: [f32; 4],
}

/// Writes numbered images into class directories under one root
pub struct DatasetWriter {
    root: PathBuf,
    prefix: String,
    class_counts: [usize; 4],
    sample_count: usize,
    manifest: Vec<SampleEntry>,
}

impl DatasetWriter {
    /// Open a writer rooted at `root`, creating the directory if needed.
    ///
    /// With `clean`, any existing content of `root` is removed first.
    pub fn create(root: impl Into<PathBuf>, prefix: impl Into<String>, clean: bool) -> Result<Self> {
        let root = root.into();
        if clean && root.exists() {
            log::info!("Removing previous dataset at {}", root.display());
            fs::remove_dir_all(&root)?;
        }
        fs::create_dir_all(&root)?;

        Ok(Self {
            root,
            prefix: prefix.into(),
            class_counts: [0; 4],
            sample_count: 0,
            manifest: Vec::new(),
        })
    }

    /// Directory for patches of `class`
    pub fn class_dir(&self, class: PatchClass) -> PathBuf {
        self.root.join(format!("{}_{:02}", self.prefix, class.id()))
    }

    /// Number of patches assigned to `class` so far
    pub fn class_count(&self, class: PatchClass) -> usize {
        self.class_counts[class.id()]
    }

    /// Write labeled patches.
    ///
    /// File numbers are assigned in input order before any file is written,
    /// so numbering is stable regardless of write order. A patch that fails
    /// to write is logged and counted, and does not stop the batch.
    pub fn write_patches(&mut self, patches: Vec<(PatchClass, RgbaImage)>) -> ExportReport {
        let mut report = ExportReport::default();
        let mut jobs = Vec::with_capacity(patches.len());
        let mut dir_ok = [None::<bool>; 4];

        for (class, patch) in patches {
            let dir = self.class_dir(class);
            let ok = *dir_ok[class.id()].get_or_insert_with(|| match fs::create_dir_all(&dir) {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("Cannot create {}: {}", dir.display(), e);
                    false
                }
            });

            let number = self.class_counts[class.id()];
            self.class_counts[class.id()] += 1;
            if ok {
                jobs.push((dir.join(image_filename(number)), DynamicImage::ImageRgba8(patch)));
            } else {
                report.failed += 1;
            }
        }

        report += save_all(jobs);
        report
    }

    /// Write node samples under [`SAMPLES_DIR`] and record them in the
    /// label manifest.
    ///
    /// Failures are logged and counted per sample. The manifest itself is
    /// only written by [`Self::save_manifest`].
    pub fn write_samples(&mut self, samples: Vec<TrainingSample>) -> ExportReport {
        let dir = self.root.join(SAMPLES_DIR);
        if let Err(e) = fs::create_dir_all(&dir) {
            log::warn!("Cannot create {}: {}", dir.display(), e);
            return ExportReport {
                written: 0,
                failed: samples.len(),
            };
        }

        let mut jobs = Vec::with_capacity(samples.len());
        let mut entries = Vec::with_capacity(samples.len());
        for sample in samples {
            let file = image_filename(self.sample_count);
            self.sample_count += 1;
            entries.push(SampleEntry {
                file: file.clone(),
                node: sample.node.0,
                label: sample.label,
            });
            jobs.push((dir.join(file), DynamicImage::ImageLuma8(sample.image)));
        }

        let results = save_each(jobs);
        let mut report = ExportReport::default();
        for (entry, ok) in entries.into_iter().zip(results) {
            if ok {
                self.manifest.push(entry);
                report.written += 1;
            } else {
                report.failed += 1;
            }
        }
        report
    }

    /// Write the label manifest of every sample recorded so far as JSON
    pub fn save_manifest(&self) -> Result<()> {
        let dir = self.root.join(SAMPLES_DIR);
        fs::create_dir_all(&dir)?;
        let json = serde_json::to_string_pretty(&self.manifest)?;
        fs::write(dir.join(MANIFEST_FILENAME), json)?;
        Ok(())
    }
}

/// `image_NNNNNN.png`
pub fn image_filename(number: usize) -> String {
    format!("image_{:06}.png", number)
}

/// Save images in parallel, returning per-job success in input order
fn save_each(jobs: Vec<(PathBuf, DynamicImage)>) -> Vec<bool> {
    jobs.into_par_iter()
        .map(|(path, image)| match image.save(&path) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to write {}: {}", path.display(), e);
                false
            }
        })
        .collect()
}

fn save_all(jobs: Vec<(PathBuf, DynamicImage)>) -> ExportReport {
    let results = save_each(jobs);
    let written = results.iter().filter(|ok| **ok).count();
    ExportReport {
        written,
        failed: results.len() - written,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procgen::NodeId;
    use image::{GrayImage, Luma, Rgba};
    use tempfile::TempDir;

    fn patch() -> RgbaImage {
        RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]))
    }

    #[test]
    fn test_patches_numbered_per_class() {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let mut writer = DatasetWriter::create(temp_dir.path(), "patches", false).unwrap();

        let report = writer.write_patches(vec![
            (PatchClass::Trunk, patch()),
            (PatchClass::Background, patch()),
            (PatchClass::Trunk, patch()),
        ]);
        assert_eq!(report, ExportReport { written: 3, failed: 0 });

        let trunk = writer.class_dir(PatchClass::Trunk);
        assert!(trunk.ends_with("patches_01"));
        assert!(trunk.join("image_000000.png").exists());
        assert!(trunk.join("image_000001.png").exists());
        assert!(writer.class_dir(PatchClass::Background).join("image_000000.png").exists());
        assert!(!writer.class_dir(PatchClass::Leaf).exists());
        assert_eq!(writer.class_count(PatchClass::Trunk), 2);
    }

    #[test]
    fn test_numbering_continues_across_batches() {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let mut writer = DatasetWriter::create(temp_dir.path(), "p", false).unwrap();
        writer.write_patches(vec![(PatchClass::Leaf, patch())]);
        writer.write_patches(vec![(PatchClass::Leaf, patch())]);
        assert!(writer.class_dir(PatchClass::Leaf).join("image_000001.png").exists());
    }

    #[test]
    fn test_blocked_class_dir_fails_only_that_class() {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let mut writer = DatasetWriter::create(temp_dir.path(), "p", false).unwrap();
        // A plain file where the branch directory should go
        fs::write(writer.class_dir(PatchClass::Branch), b"x").unwrap();

        let report = writer.write_patches(vec![
            (PatchClass::Branch, patch()),
            (PatchClass::Trunk, patch()),
        ]);
        assert_eq!(report, ExportReport { written: 1, failed: 1 });
    }

    #[test]
    fn test_clean_removes_previous_output() {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let root = temp_dir.path().join("out");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("stale.txt"), b"old").unwrap();

        DatasetWriter::create(&root, "p", true).unwrap();
        assert!(root.exists());
        assert!(!root.join("stale.txt").exists());
    }

    #[test]
    fn test_samples_and_manifest() {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let mut writer = DatasetWriter::create(temp_dir.path(), "p", false).unwrap();
        let samples = vec![
            TrainingSample {
                node: NodeId(0),
                image: GrayImage::from_pixel(8, 8, Luma([255])),
                label: [1.0, 0.5, 0.0, 0.5],
            },
            TrainingSample {
                node: NodeId(4),
                image: GrayImage::from_pixel(8, 8, Luma([0])),
                label: [1.0, 0.25, 1.0, 0.75],
            },
        ];

        let report = writer.write_samples(samples);
        assert_eq!(report.written, 2);
        writer.save_manifest().unwrap();

        let dir = temp_dir.path().join(SAMPLES_DIR);
        assert!(dir.join("image_000001.png").exists());
        let json = fs::read_to_string(dir.join(MANIFEST_FILENAME)).unwrap();
        let manifest: Vec<SampleEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest[1].node, 4);
        assert_eq!(manifest[1].label, [1.0, 0.25, 1.0, 0.75]);
    }

    #[test]
    fn test_blocked_samples_dir_counts_failures() {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let mut writer = DatasetWriter::create(temp_dir.path(), "p", false).unwrap();
        fs::write(temp_dir.path().join(SAMPLES_DIR), b"x").unwrap();

        let samples = (0..3)
            .map(|i| TrainingSample {
                node: NodeId(i),
                image: GrayImage::from_pixel(8, 8, Luma([255])),
                label: [0.0, 0.5, 0.0, 0.5],
            })
            .collect();
        let report = writer.write_samples(samples);
        assert_eq!(report, ExportReport { written: 0, failed: 3 });
        assert!(writer.save_manifest().is_err());
    }
}
