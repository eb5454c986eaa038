use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::{hint::black_box, time::Duration};
use vecraster::*;

const SQUIRREL: &str = "
M12 1C9.79 1 8 2.31 8 3.92c0 1.94.5 3.03 0 6.08 0-4.5-2.77-6.34-4-6.34.05-.5-.48
-.66-.48-.66s-.22.11-.3.34c-.27-.31-.56-.27-.56-.27l-.13.58S.7 4.29 .68 6.87c.2.33
1.53.6 2.47.43.89.05.67.79.47.99C2.78 9.13 2 8 1 8S0 9 1 9s1 1 3 1c-3.09 1.2 0 4 0 4
H3c-1 0-1 1-1 1h6c3 0 5-1 5-3.47 0-.85-.43-1.79 -1-2.53-1.11-1.46.23-2.68 1-2
.77.68 3 1 3-2 0-2.21-1.79-4-4-4zM2.5 6 c-.28 0-.5-.22-.5-.5s.22-.5.5-.5.5.22.5.5
-.22.5-.5.5z
";

fn curve_benchmark(c: &mut Criterion) {
    let cubic = Cubic::new((158.0, 70.0), (210.0, 250.0), (25.0, 190.0), (219.0, 89.0));
    let mut group = c.benchmark_group("cubic");
    group
        .throughput(Throughput::Elements(1))
        .bench_function("bbox", |b| b.iter(|| black_box(cubic).bbox(None)))
        .bench_function("flatten", |b| {
            b.iter(|| {
                black_box(cubic)
                    .flatten(Transform::identity(), DEFAULT_FLATNESS)
                    .count()
            })
        });
    group.finish();
}

fn squirrel_benchmark(c: &mut Criterion) {
    let path: Path = SQUIRREL.parse().expect("failed to parse path");
    let tr = Transform::new_scale(32.0, 32.0);
    let style = StrokeStyle {
        width: 1.0,
        line_join: LineJoin::Round,
        line_cap: LineCap::Round,
    };
    let stroke = path.stroke(style, DEFAULT_FLATNESS / 32.0);

    let mut group = c.benchmark_group("squirrel");
    group
        .throughput(Throughput::Elements(path.segments_count() as u64))
        .bench_function("parse", |b| b.iter_with_large_drop(|| SQUIRREL.parse::<Path>()))
        .bench_function("stroke", |b| {
            b.iter_with_large_drop(|| path.stroke(style, DEFAULT_FLATNESS / 32.0))
        })
        .bench_function("mask", |b| {
            b.iter_with_large_drop(|| path.mask(tr, FillRule::EvenOdd))
        })
        .bench_function("mask stroked", |b| {
            b.iter_with_large_drop(|| stroke.mask(tr, FillRule::NonZero))
        });
    group.finish()
}

fn scene_benchmark(c: &mut Criterion) {
    let path: Path = SQUIRREL.parse().expect("failed to parse path");
    let grad = LinearGradient::new(
        (0.0, 0.0),
        (16.0, 16.0),
        vec![
            GradStop::new(0.0, RGBA::new(255, 0, 0, 255)),
            GradStop::new(1.0, RGBA::new(0, 0, 255, 255)),
        ],
    );
    let mut scene = Scene::new(16.0, 16.0);
    scene.push(
        Shape::new(path)
            .with_fill(grad)
            .with_stroke(RGBA::new(0, 0, 0, 255), StrokeStyle::default()),
    );

    let mut group = c.benchmark_group("scene");
    group.bench_function("render 512", |b| {
        b.iter_with_large_drop(|| rasterize(&scene, 512, 512, 32.0, 32.0))
    });
    group.finish()
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(10).warm_up_time(Duration::new(1, 0));
    targets = curve_benchmark, squirrel_benchmark, scene_benchmark
);
criterion_main!(benches);
