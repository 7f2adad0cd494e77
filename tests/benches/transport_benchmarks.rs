//! # Transport Benchmarks
//!
//! | Path | Measured |
//! |------|----------|
//! | da-01 service | token → device resolution on in-memory stores |
//! | shared-types codec | request envelope encode + decode |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use da_01_token_validation::{
    InMemoryCredentialsStore, InMemoryDeviceStore, TokenValidationApi, TokenValidationService,
};
use shared_types::{
    codec, Device, DeviceCredentials, DeviceId, Envelope, TenantId, TransportApiRequest,
};
use std::sync::Arc;
use std::time::Duration;

fn seeded_service(
    devices: usize,
) -> TokenValidationService<InMemoryCredentialsStore, InMemoryDeviceStore> {
    let credentials = Arc::new(InMemoryCredentialsStore::new());
    let directory = Arc::new(InMemoryDeviceStore::new());
    let tenant = TenantId::random();
    for i in 0..devices {
        let device = Device::new(tenant, DeviceId::random(), format!("sensor-{i}"), "thermostat")
            .with_additional_info(serde_json::json!({"fw": "1.2", "slot": i}));
        credentials.insert(DeviceCredentials::access_token(device.id, format!("token-{i}")));
        directory.insert(device);
    }
    TokenValidationService::new(credentials, directory)
}

fn bench_token_resolution(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime");

    let mut group = c.benchmark_group("da-01-token-validation");
    group.measurement_time(Duration::from_secs(5));

    for size in [100, 10_000] {
        let service = seeded_service(size);
        let hit = TransportApiRequest::validate_token(format!("token-{}", size / 2));
        let miss = TransportApiRequest::validate_token("absent");

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("found", size), &hit, |b, request| {
            b.iter(|| runtime.block_on(service.handle(black_box(request.clone()))))
        });
        group.bench_with_input(BenchmarkId::new("unknown_token", size), &miss, |b, request| {
            b.iter(|| runtime.block_on(service.handle(black_box(request.clone()))))
        });
    }

    group.finish();
}

fn bench_envelope_codec(c: &mut Criterion) {
    let envelope = Envelope::request(
        TransportApiRequest::validate_token("abc123"),
        "tb.transport.api.responses.node-1",
    );

    c.bench_function("envelope_round_trip", |b| {
        b.iter(|| {
            let bytes = codec::encode(black_box(&envelope)).expect("encode");
            let decoded: Envelope<TransportApiRequest> = codec::decode(&bytes).expect("decode");
            black_box(decoded)
        })
    });
}

criterion_group!(benches, bench_token_resolution, bench_envelope_codec);
criterion_main!(benches);
