use criterion::{black_box, criterion_group, criterion_main, Criterion};
use qr_geometry::{
    render, Connectivity, MergeStrategy, ModuleMatrix, RenderConfig, ShapeRegistry, SymbolVersion,
};

/// Deterministic pseudo-random fill of a version `v` symbol.
fn build_symbol(version: u8) -> ModuleMatrix {
    let size = 17 + 4 * version as usize;
    let mut state: u32 = 0x2545_f491;
    let cells = (0..size * size)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state & 1 == 1
        })
        .collect();
    ModuleMatrix::from_flat(size, cells).expect("square matrix")
}

fn bench_render(c: &mut Criterion) {
    let registry = ShapeRegistry::global();
    for version in [10u8, 40] {
        let matrix = build_symbol(version);
        for merge in [MergeStrategy::None, MergeStrategy::Soft, MergeStrategy::Aggressive] {
            let config = RenderConfig::default()
                .with_merge(merge)
                .with_connectivity(Connectivity::Eight);
            let name = format!("render_v{version}_{merge:?}").to_lowercase();
            c.bench_function(&name, |b| {
                b.iter(|| {
                    let out = render(
                        black_box(&matrix),
                        SymbolVersion::Qr(version),
                        black_box(&config),
                        registry,
                    )
                    .expect("render");
                    black_box(out.primitives.len());
                });
            });
        }
    }
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
