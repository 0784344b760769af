//! # Vehicle Registry Benchmarks
//!
//! | Operation | Cost driver | Target |
//! |-----------|-------------|--------|
//! | confirm | numberplate uniqueness scan over all cars | < 10ms at 5k cars |
//! | sell | two balance writes plus a four-step transfer | < 1ms |
//! | readCar | single owner lookup and decode | < 100µs |

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use std::time::Duration;
use vl_registry::{
    Car, Caller, Certificate, CertificationApi, InMemoryKVStore, KeyValueStore, OwnershipApi,
    RegistryConfig, User,
};
use vl_tests::harness::{service_with, TEST_NOW};

const OWNER: &str = "amag";
const PENDING_VIN: &str = "PENDING";

/// Ledger with `size` confirmed cars plus one insured car awaiting a plate.
fn populated_store(size: usize) -> InMemoryKVStore {
    let mut service = service_with(InMemoryKVStore::new(), RegistryConfig::default());
    let repo = service.repository_mut();
    let mut owner = User::new(OWNER, 100);

    for i in 0..=size {
        let vin = if i == size {
            PENDING_VIN.to_string()
        } else {
            format!("VIN{i:06}")
        };
        let mut cert = Certificate::issue(OWNER, vin.as_str());
        cert.insurer = Some("axa".into());
        if i != size {
            cert.numberplate = Some(format!("ZH {i}"));
        }
        let car = Car {
            vin: vin.clone(),
            created_ts: TEST_NOW,
            certificate: Some(cert),
        };
        repo.save_car(&car).expect("seed car");
        repo.set_car_owner(&vin, OWNER).expect("seed index");
        owner.cars.insert(vin);
    }
    repo.save_user(&owner).expect("seed owner");
    service.into_store()
}

fn bench_confirm(c: &mut Criterion) {
    let mut group = c.benchmark_group("certification-confirm");
    group.measurement_time(Duration::from_secs(10));
    let dot = Caller::dot(OWNER);

    for size in [100, 1_000, 5_000] {
        let store = populated_store(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("confirm_unique_plate", size), &store, |b, store| {
            b.iter_batched(
                || service_with(store.clone(), RegistryConfig::default()),
                |mut service| {
                    black_box(
                        service
                            .confirm_car(&dot, PENDING_VIN, "BE 1")
                            .expect("confirm"),
                    )
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

fn bench_sell(c: &mut Criterion) {
    let mut group = c.benchmark_group("ownership-sell");
    let store = populated_store(100);
    let seller = Caller::garage(OWNER);

    group.bench_function("sell_to_new_buyer", |b| {
        b.iter_batched(
            || service_with(store.clone(), RegistryConfig::default()),
            |mut service| black_box(service.sell(&seller, 10, PENDING_VIN, "bobby").expect("sell")),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn bench_read_car(c: &mut Criterion) {
    let mut group = c.benchmark_group("certification-read");
    let service = service_with(populated_store(1_000), RegistryConfig::default());
    let owner = Caller::user(OWNER);

    group.bench_function("read_car", |b| {
        b.iter(|| black_box(service.read_car(&owner, "VIN000500").expect("read")))
    });
    group.bench_function("raw_get", |b| {
        let store = service.repository().store();
        b.iter(|| black_box(store.get("car:VIN000500").expect("get")))
    });

    group.finish();
}

criterion_group!(benches, bench_confirm, bench_sell, bench_read_car);
criterion_main!(benches);
