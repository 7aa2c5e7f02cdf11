use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::HashMap;
use std::time::Duration;

use foodgram_rs::models::{CartEntry, IngredientLine, ShoppingListAggregator};
use foodgram_rs::services::render_pdf;

const DISTINCT_INGREDIENTS: usize = 200;

/// `recipes` recipes of 12 lines each drawn from a shared ingredient pool
fn build_catalog(recipes: usize) -> HashMap<String, Vec<IngredientLine>> {
    (0..recipes)
        .map(|r| {
            let lines = (0..12)
                .map(|i| {
                    let ingredient = (r * 7 + i * 13) % DISTINCT_INGREDIENTS;
                    IngredientLine::new(format!("Ingredient {}", ingredient), "g", (i as u32 + 1) * 10)
                })
                .collect();
            (format!("R{}", r), lines)
        })
        .collect()
}

fn build_cart(recipes: usize) -> Vec<CartEntry> {
    (0..recipes).map(|r| CartEntry::new(format!("R{}", r))).collect()
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("shopping_list_aggregate");
    group.sample_size(50);
    group.measurement_time(Duration::from_secs(5));

    for cart_size in [10, 100, 1000].iter() {
        let catalog = build_catalog(*cart_size);
        let cart = build_cart(*cart_size);

        group.bench_with_input(BenchmarkId::new("cart_size", cart_size), cart_size, |b, _| {
            b.iter(|| black_box(ShoppingListAggregator::aggregate(&cart, &catalog).unwrap()))
        });
    }
    group.finish();
}

fn bench_render_pdf(c: &mut Criterion) {
    let mut group = c.benchmark_group("shopping_list_render_pdf");
    group.sample_size(20);

    let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    for cart_size in [10, 100].iter() {
        let list =
            ShoppingListAggregator::aggregate(&build_cart(*cart_size), &build_catalog(*cart_size))
                .unwrap();

        group.bench_with_input(BenchmarkId::new("cart_size", cart_size), cart_size, |b, _| {
            b.iter(|| black_box(render_pdf(&list, date).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_aggregate, bench_render_pdf);
criterion_main!(benches);
