//! Benchmarks for inkdoc reconstruction performance.
//!
//! Run with: cargo bench
//!
//! These benchmarks use synthetic OCR pages: prose lines, a small table and
//! page furniture, repeated to the requested size.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use inkdoc::render::{self, RenderOptions};
use inkdoc::{OcrDetection, OcrPage, Reconstructor};

const PAGE_WIDTH: f32 = 1240.0;

/// Creates a synthetic page with roughly `lines` text lines.
fn create_test_page(lines: usize) -> OcrPage {
    let mut detections = Vec::new();
    detections.push(OcrDetection::new(
        "AGREEMENT OF LEASE",
        0.97,
        [500.0, 40.0, 740.0, 70.0],
    ));

    for i in 0..lines {
        let y = 120.0 + i as f32 * 28.0;
        if i % 10 < 3 {
            // table block
            for (col, x) in [80.0, 480.0, 880.0].iter().enumerate() {
                detections.push(OcrDetection::new(
                    format!("cell{}{}", i, col),
                    0.9,
                    [*x, y, *x + 120.0, y + 16.0],
                ));
            }
        } else {
            let text = if i % 2 == 0 {
                format!("Clause {} The tenant shall", i)
            } else {
                "pay the agreed rent on time".to_string()
            };
            detections.push(OcrDetection::new(text, 0.92, [80.0, y, 900.0, y + 16.0]));
        }
    }

    let y = 120.0 + lines as f32 * 28.0 + 60.0;
    detections.push(OcrDetection::new("...2", 0.95, [1100.0, y, 1150.0, y + 16.0]));
    OcrPage::new(PAGE_WIDTH, detections)
}

/// Benchmark full reconstruction at different page sizes.
fn bench_reconstruct(c: &mut Criterion) {
    let reconstructor = Reconstructor::new();
    let mut group = c.benchmark_group("reconstruct");

    for lines in [20, 100, 500] {
        let page = create_test_page(lines);
        group.bench_with_input(BenchmarkId::from_parameter(lines), &page, |b, page| {
            b.iter(|| reconstructor.reconstruct_page(black_box(page)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark rendering of an already classified page.
fn bench_render(c: &mut Criterion) {
    let doc = Reconstructor::new()
        .reconstruct_page(&create_test_page(100))
        .unwrap();
    let options = RenderOptions::default();

    c.bench_function("render_html", |b| {
        b.iter(|| render::to_html(black_box(&doc), &options));
    });

    c.bench_function("render_doc_tree", |b| {
        b.iter(|| render::to_doc_tree(black_box(&doc), &options).unwrap());
    });
}

/// Benchmark parallel batch processing.
fn bench_batch(c: &mut Criterion) {
    let reconstructor = Reconstructor::new();
    let pages: Vec<OcrPage> = (0..16).map(|_| create_test_page(60)).collect();

    c.bench_function("reconstruct_batch_16", |b| {
        b.iter(|| reconstructor.reconstruct_batch(black_box(&pages)));
    });
}

criterion_group!(benches, bench_reconstruct, bench_render, bench_batch);
criterion_main!(benches);
