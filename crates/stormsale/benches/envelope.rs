//! Envelope creation and audit grant throughput.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tokio::runtime::Runtime;

use stormsale::core::SalePayload;
use stormsale::envelope::{AccessGrantProtocol, EnvelopeBuilder, KeyHolder, MemoryDirectory, Wallet};

fn parties() -> (MemoryDirectory, Wallet, Wallet, Wallet) {
    let directory = MemoryDirectory::new();
    let advertiser = Wallet::generate().unwrap();
    let affiliate = Wallet::generate().unwrap();
    let auditor = Wallet::generate().unwrap();
    for wallet in [&advertiser, &affiliate, &auditor] {
        directory.register(wallet.registration().unwrap()).unwrap();
    }
    (directory, advertiser, affiliate, auditor)
}

fn bench_envelope(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let (directory, advertiser, affiliate, auditor) = parties();
    let payload = SalePayload::new("Digital Product", 100_500, 1736870400000)
        .with_customer("alice@example.com")
        .with_metadata("campaign 7, spring promotion");

    c.bench_function("create_envelope", |b| {
        b.iter(|| {
            rt.block_on(
                EnvelopeBuilder::new(&directory).create_envelope(
                    black_box(&payload),
                    &advertiser.address(),
                    &affiliate.address(),
                ),
            )
            .unwrap()
        })
    });

    let envelope = rt
        .block_on(EnvelopeBuilder::new(&directory).create_envelope(
            &payload,
            &advertiser.address(),
            &affiliate.address(),
        ))
        .unwrap();

    c.bench_function("grant_access", |b| {
        b.iter(|| {
            rt.block_on(AccessGrantProtocol::new(&directory).grant_as(
                black_box(&envelope),
                &advertiser,
                &auditor.address(),
            ))
            .unwrap()
        })
    });

    c.bench_function("open_envelope", |b| {
        b.iter(|| envelope.open::<SalePayload, _>(black_box(&affiliate)).unwrap())
    });
}

criterion_group!(benches, bench_envelope);
criterion_main!(benches);
