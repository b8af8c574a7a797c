//! Criterion benchmarks for shoplens-rf: training, prediction, evaluation.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use shoplens_rf::{RandomForestConfig, TrainTestSplit, evaluate};

fn make_purchases(n_samples: usize, seed: u64) -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut features = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for _ in 0..n_samples {
        let row: Vec<f64> = (0..8).map(|_| rng.r#gen::<f64>()).collect();
        labels.push(usize::from(row[0] + row[1] > 1.0));
        features.push(row);
    }
    let names = (0..8).map(|f| format!("f{f}")).collect();
    (features, labels, names)
}

fn bench_rf_train(c: &mut Criterion) {
    let (features, labels, names) = make_purchases(1000, 42);
    let cfg = RandomForestConfig::new(100).unwrap().with_seed(42);

    c.bench_function("rf_train_1000x8_binary_100trees", |b| {
        b.iter(|| cfg.fit(&features, &labels, &names).unwrap());
    });
}

fn bench_rf_predict_batch(c: &mut Criterion) {
    let (features, labels, names) = make_purchases(1000, 42);
    let cfg = RandomForestConfig::new(100).unwrap().with_seed(42);
    let forest = cfg.fit(&features, &labels, &names).unwrap().into_forest();

    c.bench_function("rf_predict_batch_1000x8_100trees", |b| {
        b.iter(|| forest.predict_batch(&features).unwrap());
    });
}

fn bench_holdout_evaluate(c: &mut Criterion) {
    let (features, labels, names) = make_purchases(1000, 42);
    let partition = TrainTestSplit::new(0.2).unwrap().split(features.len());
    let holdout_x: Vec<Vec<f64>> = partition.holdout.iter().map(|&i| features[i].clone()).collect();
    let holdout_y: Vec<usize> = partition.holdout.iter().map(|&i| labels[i]).collect();
    let cfg = RandomForestConfig::new(100).unwrap().with_seed(42);
    let model = cfg.fit(&features, &labels, &names).unwrap();

    c.bench_function("rf_holdout_evaluate_200rows", |b| {
        b.iter(|| evaluate(&cfg, &model, &holdout_x, &holdout_y).unwrap());
    });
}

criterion_group!(benches, bench_rf_train, bench_rf_predict_batch, bench_holdout_evaluate);
criterion_main!(benches);
