//! Training data extraction and export
//!
//! Renders are cut into labeled patches (`grid`, `classify`) or per-node
//! samples (`samples`), then written to disk by `export`. `pipeline` ties
//! generation, rendering and output together.

pub mod classify;
pub mod export;
pub mod grid;
pub mod imageops;
pub mod pipeline;
pub mod samples;

pub use classify::{classify_patch, count_channels, ChannelCounts, PatchClass};
pub use export::{DatasetWriter, ExportReport, SampleEntry};
pub use grid::{cut_labeled_patches, GridLayout};
pub use pipeline::DatasetPipeline;
pub use samples::{branching_label, extract_samples, SampleSet, SampleSettings, TrainingSample};
