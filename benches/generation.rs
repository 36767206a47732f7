use criterion::{criterion_group, criterion_main, Criterion, black_box};

use image::{GrayImage, Luma};

use sylva::core::Camera;
use sylva::dataset::{extract_samples, SampleSettings};
use sylva::geometry::{build_mesh, WidthMode};
use sylva::procgen::{Tree, TreeRng};
use sylva::render::{RenderMode, RenderSurface, SoftwareSurface};

fn bench_generate_random(c: &mut Criterion) {
    let mut rng = TreeRng::new(2);

    c.bench_function("tree_generate_random", |b| {
        b.iter(|| Tree::generate_random(black_box(&mut rng)));
    });
}

fn bench_build_mesh(c: &mut Criterion) {
    let tree = Tree::generate_random(&mut TreeRng::new(2));

    c.bench_function("tree_build_mesh_tapered", |b| {
        b.iter(|| build_mesh(black_box(&tree), WidthMode::Tapered));
    });
}

fn bench_software_render(c: &mut Criterion) {
    let tree = Tree::generate_random(&mut TreeRng::new(2));
    let (vertices, _) = build_mesh(&tree, WidthMode::Tapered);
    let mut surface = SoftwareSurface::new(256, 256);
    surface.submit_geometry("tree", vertices);

    c.bench_function("software_render_basic_256", |b| {
        b.iter(|| surface.render(black_box(RenderMode::Basic)));
    });
}

fn bench_extract_samples(c: &mut Criterion) {
    let tree = Tree::generate_random(&mut TreeRng::new(2));
    let render = GrayImage::from_pixel(512, 512, Luma([255]));
    let camera = Camera::tree_view(512, 512);
    let settings = SampleSettings::default();

    c.bench_function("extract_samples_512", |b| {
        b.iter(|| extract_samples(black_box(&tree), &render, &camera, &settings));
    });
}

criterion_group!(
    benches,
    bench_generate_random,
    bench_build_mesh,
    bench_software_render,
    bench_extract_samples,
);
criterion_main!(benches);
