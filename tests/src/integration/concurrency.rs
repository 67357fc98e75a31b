//! # Concurrency
//!
//! Many callers on a multi-threaded runtime. Calls on one vault serialize
//! on its fund cell; calls on different vaults proceed independently. In
//! both cases the end state equals some serial order of the calls.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use fl_01_vault::{invariant_supply_matches_balances, AssetCustody};
    use fl_05_fund_deployer::{FundApi, FundModules, NewFund};
    use fund_telemetry::{SHARES_BOUGHT, SHARES_REDEEMED};
    use shared_types::math::ether;
    use shared_types::{Address, U256};
    use std::sync::Arc;

    const INVESTORS: u8 = 16;

    fn investor(index: u8) -> Address {
        Address::repeat_byte(0x20 + index)
    }

    fn new_fund() -> NewFund {
        NewFund {
            owner: MANAGER,
            name: "Parallel".into(),
            denomination_asset: DENOM,
            shares_action_timelock: 0,
            modules: FundModules::default(),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_buys_on_one_vault_serialize() {
        let protocol = Arc::new(TestProtocol::new());
        let (vault, _) = protocol.service.create_new_fund(new_fund()).await.unwrap();
        let bought_before = SHARES_BOUGHT.get();

        let mut handles = Vec::new();
        for index in 0..INVESTORS {
            let protocol = protocol.clone();
            handles.push(tokio::spawn(async move {
                let buyer = investor(index);
                protocol.custody.mint(DENOM, buyer, ether(1));
                protocol
                    .service
                    .buy_shares(vault, buyer, ether(1), U256::zero(), None)
                    .await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), ether(1));
        }
        assert!(SHARES_BOUGHT.get() >= bought_before + f64::from(INVESTORS));

        let fund = protocol.fund(vault);
        fund.read(|state| {
            assert_eq!(state.vault.total_supply(), ether(u64::from(INVESTORS)));
            assert!(invariant_supply_matches_balances(&state.vault));
        });
        assert_eq!(
            protocol.custody.balance_of(DENOM, vault),
            ether(u64::from(INVESTORS))
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_vaults_progress_independently() {
        let protocol = Arc::new(TestProtocol::new());
        let mut vaults = Vec::new();
        for _ in 0..4 {
            let (vault, _) = protocol.service.create_new_fund(new_fund()).await.unwrap();
            vaults.push(vault);
        }

        let mut handles = Vec::new();
        for (slot, vault) in vaults.iter().copied().enumerate() {
            for round in 0..4u8 {
                let protocol = protocol.clone();
                let buyer = investor(slot as u8 * 4 + round);
                handles.push(tokio::spawn(async move {
                    protocol.custody.mint(DENOM, buyer, ether(2));
                    let api = &protocol.service;
                    api.buy_shares(vault, buyer, ether(2), U256::zero(), None)
                        .await?;
                    api.redeem_shares(vault, buyer, ether(1)).await
                }));
            }
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), vec![(DENOM, ether(1))]);
        }

        for vault in vaults {
            assert_eq!(protocol.service.calc_gav(vault).await.unwrap(), ether(4));
            assert_eq!(
                protocol.service.calc_gross_share_value(vault).await.unwrap(),
                ether(1)
            );
            protocol
                .fund(vault)
                .read(|state| assert!(invariant_supply_matches_balances(&state.vault)));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_full_redemptions_pay_each_holder_once() {
        let protocol = Arc::new(TestProtocol::new());
        let (vault, _) = protocol.service.create_new_fund(new_fund()).await.unwrap();
        protocol.buy(vault, ALICE, ether(3)).unwrap();
        let redeemed_before = SHARES_REDEEMED.with_label_values(&["in_kind"]).get();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let protocol = protocol.clone();
            handles.push(tokio::spawn(async move {
                protocol.service.redeem_shares(vault, ALICE, U256::zero()).await
            }));
        }
        let mut paid = 0;
        for handle in handles {
            if let Ok(payouts) = handle.await.unwrap() {
                assert_eq!(payouts, vec![(DENOM, ether(3))]);
                paid += 1;
            }
        }

        assert_eq!(paid, 1);
        assert!(SHARES_REDEEMED.with_label_values(&["in_kind"]).get() >= redeemed_before + 1.0);
        assert_eq!(protocol.custody.balance_of(DENOM, ALICE), ether(3));
    }
}
