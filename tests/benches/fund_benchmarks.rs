//! # FundLedger Benchmarks
//!
//! | Group | Operation | Scales with |
//! |-------|-----------|-------------|
//! | shares | buy, redeem in kind | fund record size |
//! | valuation | GAV | tracked assets |
//! | state | fund record snapshot and JSON | holders |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fl_05_fund_deployer::FundModules;
use fl_tests::fixtures::{one_percent_investment, TestProtocol, ALICE, DENOM, INVESTMENT};
use shared_types::math::ether;
use shared_types::{Address, U256};
use std::time::Duration;

fn holder(index: u32) -> Address {
    let mut bytes = [0x70; 20];
    bytes[16..].copy_from_slice(&index.to_be_bytes());
    Address::new(bytes)
}

/// Fund with the investment fee and `holders` distinct investors.
fn seeded_fund(holders: u32) -> (TestProtocol, Address) {
    let protocol = TestProtocol::new();
    let modules = FundModules::default().with_fee(INVESTMENT, one_percent_investment());
    let (vault, _) = protocol.create_fund(&modules);
    for index in 0..holders {
        let _ = protocol.buy(vault, holder(index), ether(1));
    }
    (protocol, vault)
}

// ============================================================================
// SHARES
// ============================================================================

fn bench_shares(c: &mut Criterion) {
    let mut group = c.benchmark_group("shares");
    group.measurement_time(Duration::from_secs(5));

    for holders in [10u32, 100, 1_000] {
        let (protocol, vault) = seeded_fund(holders);
        let fund = protocol.fund(vault);
        let comptroller = protocol.engine.comptroller().clone();

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("buy_then_redeem", holders), &holders, |b, _| {
            b.iter(|| {
                protocol.custody.mint(DENOM, ALICE, ether(1));
                let shares = comptroller
                    .buy_shares(&fund, ALICE, ether(1), U256::zero(), None)
                    .ok();
                let payouts = comptroller
                    .redeem_shares_detailed(&fund, ALICE, U256::zero(), &[], &[])
                    .ok();
                black_box((shares, payouts))
            })
        });
    }

    group.finish();
}

// ============================================================================
// VALUATION
// ============================================================================

fn bench_valuation(c: &mut Criterion) {
    let mut group = c.benchmark_group("valuation");
    group.measurement_time(Duration::from_secs(5));

    let (protocol, vault) = seeded_fund(100);
    let fund = protocol.fund(vault);
    let comptroller = protocol.engine.comptroller().clone();

    group.bench_function("calc_gav", |b| b.iter(|| black_box(comptroller.calc_gav(&fund).ok())));
    group.bench_function("calc_gross_share_value", |b| {
        b.iter(|| black_box(comptroller.calc_gross_share_value(&fund).ok()))
    });

    group.finish();
}

// ============================================================================
// STATE
// ============================================================================

fn bench_state(c: &mut Criterion) {
    let mut group = c.benchmark_group("state");

    for holders in [10u32, 1_000] {
        let (protocol, vault) = seeded_fund(holders);
        let fund = protocol.fund(vault);

        group.bench_with_input(BenchmarkId::new("snapshot", holders), &holders, |b, _| {
            b.iter(|| black_box(fund.snapshot()))
        });
        group.bench_with_input(BenchmarkId::new("to_json", holders), &holders, |b, _| {
            b.iter(|| black_box(fund.read(|state| state.to_json().ok())))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_shares, bench_valuation, bench_state);
criterion_main!(benches);
