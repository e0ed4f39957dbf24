//! Benchmarks for seat allocation and the coalition search.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use seat_compare::elections::pr::dhondt_seats;
use seat_compare::elections::CoalitionFinder;
use seat_compare::model::SeatResult;

fn parties(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("party{}", i)).collect()
}

fn bench_dhondt(c: &mut Criterion) {
    let mut group = c.benchmark_group("dhondt_seats");

    for seats in [59usize, 650, 6500].iter() {
        let names = parties(12);
        let totals: Vec<f64> = (0..names.len())
            .map(|i| 1_000_000.0 / (i as f64 + 1.0))
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(seats), seats, |b, &seats| {
            b.iter(|| dhondt_seats(black_box(&names), black_box(&totals), seats));
        });
    }

    group.finish();
}

fn bench_coalitions(c: &mut Criterion) {
    let mut group = c.benchmark_group("coalition_search");

    // Fragmented parliament: nobody near a majority alone.
    let results: SeatResult = parties(20)
        .into_iter()
        .enumerate()
        .map(|(i, party)| (party, 20 + (i as u32 % 7) * 3))
        .collect();

    for size in [2usize, 3, 4].iter() {
        let finder = CoalitionFinder::new(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| finder.find(black_box(&results)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_dhondt, bench_coalitions);
criterion_main!(benches);
