//! # Splice Benchmarks
//!
//! | Path | Work per call |
//! |------|---------------|
//! | fiat conversion | one 512-bit multiply and divide |
//! | signer recovery | keccak digest plus secp256k1 recovery |
//! | reference decoding | hex or decimal parse |
//! | reconciliation | lookup plus conditional update in the memory store |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use primitive_types::U256;
use shared_types::{Address, PaymentRequestId};
use sp_02_payment_reconciler::{
    decode_payment_reference, min_amount_for_cents, to_cents, PaymentReconcilerApi,
    DEFAULT_NATIVE_CENTS_PER_UNIT, NATIVE_DECIMALS,
};
use sp_03_download_auth::{download_digest, recover_signer};
use splice_tests::fixtures::{EventBuilder, Storefront, Wallet, SHINING_KEY, SHINING_QUOTE_WEI};
use std::time::Duration;

// ============================================================================
// Pricing
// ============================================================================

fn bench_pricing(c: &mut Criterion) {
    let mut group = c.benchmark_group("pricing");

    let amount = U256::from(SHINING_QUOTE_WEI);
    group.bench_function("to_cents_native", |b| {
        b.iter(|| {
            black_box(to_cents(
                black_box(amount),
                NATIVE_DECIMALS,
                DEFAULT_NATIVE_CENTS_PER_UNIT,
            ))
        })
    });

    group.bench_function("min_amount_for_cents_native", |b| {
        b.iter(|| {
            black_box(min_amount_for_cents(
                black_box(999),
                NATIVE_DECIMALS,
                DEFAULT_NATIVE_CENTS_PER_UNIT,
            ))
        })
    });

    // Whale-sized amounts must not overflow.
    group.bench_function("to_cents_max_amount", |b| {
        b.iter(|| black_box(to_cents(black_box(U256::MAX), 6, 100)))
    });

    for reference in ["42", "0x000000000000000000000000000000000000000000000000000000000000002a"] {
        group.bench_with_input(
            BenchmarkId::new("decode_reference", reference.len()),
            &reference,
            |b, reference| b.iter(|| black_box(decode_payment_reference(reference))),
        );
    }

    group.finish();
}

// ============================================================================
// Download signatures
// ============================================================================

fn bench_signer_recovery(c: &mut Criterion) {
    let mut group = c.benchmark_group("download-signature");
    group.measurement_time(Duration::from_secs(10));

    let wallet = Wallet::random();
    let request = wallet.sign_download(SHINING_KEY, "bench-nonce");
    let signature = sp_03_download_auth::RecoverableSignature::parse_hex(&request.signature)
        .expect("signature");

    group.bench_function("download_digest", |b| {
        b.iter(|| black_box(download_digest(&request.address, SHINING_KEY, "bench-nonce")))
    });

    let digest = download_digest(&request.address, SHINING_KEY, "bench-nonce");
    group.bench_function("recover_signer", |b| {
        b.iter(|| black_box(recover_signer(&digest, &signature)))
    });

    group.finish();
}

// ============================================================================
// Reconciliation
// ============================================================================

fn bench_reconcile(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("runtime");
    let mut group = c.benchmark_group("reconcile");

    let payer = Address([0xb1; 20]);
    for batch in [1usize, 10, 100] {
        group.throughput(Throughput::Elements(batch as u64));
        group.bench_with_input(BenchmarkId::new("fulfill_fresh", batch), &batch, |b, &batch| {
            b.iter_batched(
                || {
                    runtime.block_on(async {
                        let shop = Storefront::new().await;
                        let mut events = Vec::with_capacity(batch);
                        for _ in 0..batch {
                            let request = shop.order(SHINING_KEY, &payer).await;
                            events.push(
                                EventBuilder::native(request.id, payer, U256::from(SHINING_QUOTE_WEI))
                                    .build(),
                            );
                        }
                        (shop, events)
                    })
                },
                |(shop, events)| {
                    runtime.block_on(async {
                        for event in &events {
                            black_box(shop.reconciler.reconcile(event).await.ok());
                        }
                    })
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }

    // Redelivery of an already settled payment.
    let (shop, event) = runtime.block_on(async {
        let shop = Storefront::new().await;
        let request = shop.order(SHINING_KEY, &payer).await;
        let event = EventBuilder::native(request.id, payer, U256::from(SHINING_QUOTE_WEI)).build();
        shop.reconciler.reconcile(&event).await.expect("fulfill");
        (shop, event)
    });
    group.bench_function("replay", |b| {
        b.iter(|| runtime.block_on(async { black_box(shop.reconciler.reconcile(&event).await.ok()) }))
    });

    let unknown = EventBuilder::native(PaymentRequestId(u64::MAX), payer, U256::one()).build();
    group.bench_function("unknown_reference", |b| {
        b.iter(|| runtime.block_on(async { black_box(shop.reconciler.reconcile(&unknown).await.err()) }))
    });

    group.finish();
}

criterion_group!(benches, bench_pricing, bench_signer_recovery, bench_reconcile);

criterion_main!(benches);
