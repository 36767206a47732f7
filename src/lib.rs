//! Sylva - procedural branching trees rendered into labeled training images

pub mod core;
pub mod config;
pub mod procgen;
pub mod geometry;
pub mod render;
pub mod dataset;
