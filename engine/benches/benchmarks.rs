//! Performance benchmarks for stockroom-engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use stockroom_engine::{AdminGate, MemoryStore, Product, Shop, ShopConfig, Variant};
use tokio::runtime::Runtime;

const NOW: u64 = 1_706_745_600_000;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn shop(rt: &Runtime, products: usize) -> Shop {
    let shop = Shop::new(Arc::new(MemoryStore::new()), ShopConfig::default());
    let grant = AdminGate::trusted(NOW);
    rt.block_on(async {
        for i in 0..products {
            shop.catalog()
                .upsert_product(&grant, Product::new(
                    format!("pod-{i}"),
                    format!("Pod {i}"),
                    1500,
                    "pods",
                    vec![Variant::new("Mint", 1_000_000), Variant::new("Menthol", 1_000_000)],
                ))
                .await
                .unwrap();
        }
    });
    shop
}

fn bench_reservations(c: &mut Criterion) {
    let mut group = c.benchmark_group("reservations");
    let rt = runtime();

    group.bench_function("add_then_remove", |b| {
        let shop = shop(&rt, 1);
        let reservations = shop.reservations();

        b.iter(|| {
            rt.block_on(async {
                reservations
                    .add_line(black_box(1), "pod-0", "Mint", 1, NOW)
                    .await
                    .unwrap();
                reservations
                    .remove_line(black_box(1), "pod-0", Some("Mint"))
                    .await
                    .unwrap();
            })
        })
    });

    group.bench_function("add_two_lines_then_clear", |b| {
        let shop = shop(&rt, 1);
        let reservations = shop.reservations();

        b.iter(|| {
            rt.block_on(async {
                reservations.add_line(1, "pod-0", "Mint", 1, NOW).await.unwrap();
                reservations.add_line(1, "pod-0", "Menthol", 1, NOW).await.unwrap();
                reservations.clear_cart(black_box(1)).await.unwrap();
            })
        })
    });

    group.finish();
}

fn bench_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep");
    let rt = runtime();

    for carts in [10i64, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("expired_carts", carts), &carts, |b, &carts| {
            let shop = shop(&rt, 1);
            let ttl = shop.config().cart_ttl_ms;

            b.iter(|| {
                rt.block_on(async {
                    for customer in 0..carts {
                        shop.reservations()
                            .add_line(customer, "pod-0", "Mint", 1, NOW)
                            .await
                            .unwrap();
                    }
                    shop.sweeper().sweep(black_box(NOW + ttl + 1)).await.unwrap()
                })
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_reservations, bench_sweep);
criterion_main!(benches);
