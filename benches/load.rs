use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use dxfdoc::factory::GraphicAttribs;
use dxfdoc::layouts::EntitySpaceMut;
use dxfdoc::{Document, DxfVersion, Vector3};

/// DXF text of a drawing with `lines` LINE entities on a few layers.
fn drawing(version: DxfVersion, lines: usize) -> Vec<u8> {
    let mut doc = Document::new(version).unwrap();
    for layer in ["A", "B", "C"] {
        doc.new_layer(layer).unwrap();
    }
    let layers = [
        GraphicAttribs::on_layer("A"),
        GraphicAttribs::on_layer("B"),
        GraphicAttribs::on_layer("C"),
    ];
    let mut msp = doc.modelspace_mut();
    for i in 0..lines {
        let x = i as f64;
        msp.add_line(Vector3::new(x, 0.0, 0.0), Vector3::new(x, 10.0, 0.0), &layers[i % 3])
            .unwrap();
    }
    let mut buffer = Vec::new();
    doc.write(&mut buffer).unwrap();
    buffer
}

fn bench_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("read");
    for version in [DxfVersion::AC1009, DxfVersion::AC1015] {
        let data = drawing(version, 10_000);
        group.bench_with_input(BenchmarkId::from_parameter(version), &data, |b, data| {
            b.iter(|| Document::read(black_box(data.as_slice())).unwrap())
        });
    }
    group.finish();
}

fn bench_write(c: &mut Criterion) {
    let data = drawing(DxfVersion::AC1015, 10_000);
    let mut doc = Document::read(data.as_slice()).unwrap();
    c.bench_function("write/AC1015", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(data.len());
            doc.write(&mut out).unwrap();
            black_box(out)
        })
    });
}

fn bench_merge(c: &mut Criterion) {
    let source = Document::read(drawing(DxfVersion::AC1015, 2_000).as_slice()).unwrap();
    c.bench_function("merge/flat", |b| {
        b.iter(|| {
            let mut target = Document::new(DxfVersion::AC1015).unwrap();
            target.merge(&source, &dxfdoc::MergeMode::Flat).unwrap()
        })
    });
}

criterion_group!(benches, bench_read, bench_write, bench_merge);
criterion_main!(benches);
