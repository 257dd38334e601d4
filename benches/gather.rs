use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::Rng;
use seqfeat::layers::FeatureEmbedder;
use seqfeat::tensor::IndexTensor;

fn bench_embedder_forward(c: &mut Criterion) {
    let cardinalities = [100, 100, 100];
    let embedding_dims = [16, 32, 64];
    let embedder = FeatureEmbedder::new(&cardinalities, &embedding_dims).unwrap();

    let batch = 256;
    let time = 64;
    let f = cardinalities.len();
    let mut rng = rand::thread_rng();
    let data: Vec<usize> = (0..batch * time * f)
        .map(|i| rng.gen_range(0..cardinalities[i % f]))
        .collect();
    let x = IndexTensor::new(data, vec![batch, time, f]);

    c.bench_function("feature_embedder_forward", |bencher| {
        bencher.iter(|| {
            let out = embedder.forward(black_box(&x)).unwrap();
            black_box(out);
        });
    });
}

criterion_group!(benches, bench_embedder_forward);
criterion_main!(benches);
