use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array2;
use rand::Rng;

use apriori::{apriori_dense, rules_dense, ItemBase, Miner, MinerConfig, TransactionBag};

/// Random 0/1 matrix with roughly `avg_size` items per row, skewed so that
/// low column indices are more frequent.
fn generate_transactions(num_transactions: usize, num_items: usize, avg_size: usize) -> Array2<i32> {
    let mut rng = rand::thread_rng();
    let mut data = Array2::<i32>::zeros((num_transactions, num_items));
    for mut row in data.rows_mut() {
        let factor: f64 = rng.gen();
        let size = ((avg_size as f64 * (0.5 + factor)).round() as usize).min(num_items);
        for _ in 0..size {
            let skew: f64 = rng.gen();
            let item = ((skew * skew) * num_items as f64) as usize;
            row[item.min(num_items - 1)] = 1;
        }
    }
    data
}

fn to_bag(matrix: &Array2<i32>) -> (ItemBase, TransactionBag) {
    let mut base = ItemBase::new();
    let mut bag = TransactionBag::new();
    for row in matrix.rows() {
        let names: Vec<String> = row
            .iter()
            .enumerate()
            .filter(|(_, value)| **value != 0)
            .map(|(column, _)| format!("i{column}"))
            .collect();
        bag.push(base.register(&names, 1));
    }
    (base, bag)
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("apriori_scaling");
    let configs = [
        ("small_100tx", 100, 20, 5),
        ("medium_500tx", 500, 50, 10),
        ("large_2000tx", 2000, 100, 12),
    ];
    let config = MinerConfig {
        min_support: 0.1,
        ..MinerConfig::default()
    };
    for (name, num_tx, num_items, avg_size) in configs {
        let transactions = generate_transactions(num_tx, num_items, avg_size);
        group.bench_with_input(BenchmarkId::from_parameter(name), &transactions, |b, tx| {
            b.iter(|| apriori_dense(black_box(tx.view()), black_box(&config)))
        });
    }
    group.finish();
}

fn bench_min_support(c: &mut Criterion) {
    let mut group = c.benchmark_group("apriori_min_support");
    let transactions = generate_transactions(1000, 50, 10);
    for min_support in [0.05, 0.1, 0.2, 0.4] {
        let config = MinerConfig {
            min_support,
            ..MinerConfig::default()
        };
        group.bench_with_input(
            BenchmarkId::from_parameter(min_support),
            &transactions,
            |b, tx| b.iter(|| apriori_dense(black_box(tx.view()), black_box(&config))),
        );
    }
    group.finish();
}

/// Counting through the transaction tree against counting the flat bag.
fn bench_counting(c: &mut Criterion) {
    let mut group = c.benchmark_group("apriori_counting");
    let transactions = generate_transactions(2000, 60, 12);
    for use_tree in [true, false] {
        let miner = Miner::new(MinerConfig {
            min_support: 0.05,
            use_tree,
            ..MinerConfig::default()
        })
        .unwrap();
        let label = if use_tree { "tree" } else { "bag" };
        group.bench_function(label, |b| {
            b.iter(|| {
                let (base, bag) = to_bag(&transactions);
                miner.run(base, bag, std::io::sink())
            })
        });
    }
    group.finish();
}

fn bench_rules(c: &mut Criterion) {
    let transactions = generate_transactions(1000, 40, 8);
    let config = MinerConfig {
        min_support: 0.05,
        min_confidence: 0.6,
        ..MinerConfig::default()
    };
    c.bench_function("apriori_rules", |b| {
        b.iter(|| rules_dense(black_box(transactions.view()), black_box(&config)))
    });
}

criterion_group!(benches, bench_scaling, bench_min_support, bench_counting, bench_rules);
criterion_main!(benches);
