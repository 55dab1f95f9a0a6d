//! Normalizer throughput bench — the per-row hot path of every run.

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use animalitos_core::normalize::Normalizer;
use animalitos_core::{MismatchPolicy, RawRow};

fn bench_normalize(c: &mut Criterion) {
    let normalizer = Normalizer::new(MismatchPolicy::Flag);
    let stamp = NaiveDate::from_ymd_opt(2025, 1, 20)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();

    let spanish = RawRow {
        date: "miércoles, 15 de enero de 2025".to_string(),
        number: "5".to_string(),
        animal: "León".to_string(),
        time: Some("2:30 PM".to_string()),
        row_index: 1,
    };
    let iso = RawRow {
        date: "2025-01-15".to_string(),
        number: "05".to_string(),
        animal: "LEON".to_string(),
        time: Some("14:30:00".to_string()),
        row_index: 1,
    };

    c.bench_function("normalize_spanish_row", |b| {
        b.iter(|| normalizer.normalize(black_box(&spanish), stamp))
    });
    c.bench_function("normalize_iso_row", |b| {
        b.iter(|| normalizer.normalize(black_box(&iso), stamp))
    });
}

criterion_group!(benches, bench_normalize);
criterion_main!(benches);
