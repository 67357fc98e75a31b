//! # Fee Flows
//!
//! Fees settled through the full stack: the service facade, the
//! comptroller's staged execution and the fee manager.
//!
//! 1. **Management fee**: a year of accrual at 1% dilutes holders by the
//!    owner's cut, settled through the fee manager extension.
//! 2. **Investment fee**: part of every purchase is swapped into the
//!    investment token and locked until shares are redeemed.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use fl_01_vault::AssetCustody;
    use fl_02_fee_engine::{FeeEvent, FeeHook};
    use fl_04_comptroller::FundEvent;
    use fl_05_fund_deployer::{FundApi, FundModules, NewFund};
    use shared_types::math::{self, ether, from_dec, SECONDS_PER_YEAR};
    use shared_types::U256;

    fn new_fund(modules: FundModules) -> NewFund {
        NewFund {
            owner: MANAGER,
            name: "Fee Fund".into(),
            denomination_asset: DENOM,
            shares_action_timelock: 0,
            modules,
        }
    }

    // =========================================================================
    // MANAGEMENT FEE
    // =========================================================================

    #[tokio::test]
    async fn test_one_year_of_management_fee_through_extension() {
        let protocol = TestProtocol::new();
        let api = &protocol.service;
        let modules = FundModules::default().with_fee(MANAGEMENT, one_percent_management());
        let (vault, _) = api.create_new_fund(new_fund(modules)).await.unwrap();

        protocol.custody.mint(DENOM, ALICE, ether(1));
        let shares = api
            .buy_shares(vault, ALICE, ether(1), U256::zero(), None)
            .await
            .unwrap();
        assert_eq!(shares, ether(1));

        protocol.clock.advance(SECONDS_PER_YEAR);
        let fee_manager = protocol.engine.comptroller().extensions().fee_manager;
        api.call_on_extension(vault, STRANGER, fee_manager, 0, b"[]".to_vec())
            .await
            .unwrap();

        let (owner_shares, supply) = protocol
            .fund(vault)
            .read(|state| (state.vault.balance_of(MANAGER), state.vault.total_supply()));
        let ratio = math::mul_div(owner_shares, ether(1), supply).unwrap();
        let expected = from_dec("5025125628140703").unwrap();
        let diff = if ratio > expected {
            ratio - expected
        } else {
            expected - ratio
        };
        assert!(diff < U256::from(10), "owner ratio {ratio}");

        let history = api.history(vault).await.unwrap();
        assert!(history.iter().any(|recorded| matches!(
            recorded.event,
            FundEvent::Fee(FeeEvent::Settled {
                hook: FeeHook::Continuous,
                ..
            })
        )));
    }

    #[tokio::test]
    async fn test_continuous_hook_without_time_passing_mints_nothing() {
        let protocol = TestProtocol::new();
        let api = &protocol.service;
        let modules = FundModules::default().with_fee(MANAGEMENT, one_percent_management());
        let (vault, _) = api.create_new_fund(new_fund(modules)).await.unwrap();
        protocol.custody.mint(DENOM, ALICE, ether(3));
        api.buy_shares(vault, ALICE, ether(3), U256::zero(), None)
            .await
            .unwrap();

        let fee_manager = protocol.engine.comptroller().extensions().fee_manager;
        api.call_on_extension(vault, ALICE, fee_manager, 0, b"[]".to_vec())
            .await
            .unwrap();

        protocol.fund(vault).read(|state| {
            assert_eq!(state.vault.total_supply(), ether(3));
            assert!(state.vault.balance_of(MANAGER).is_zero());
        });
    }

    // =========================================================================
    // INVESTMENT FEE
    // =========================================================================

    #[test]
    fn test_investment_fee_is_locked_and_released_on_redeem() {
        let protocol = TestProtocol::new();
        let modules = FundModules::default().with_fee(INVESTMENT, one_percent_investment());
        let (vault, _) = protocol.create_fund(&modules);
        let fund = protocol.fund(vault);
        let comptroller = protocol.engine.comptroller();

        let shares = protocol.buy(vault, ALICE, ether(100)).unwrap();
        assert_eq!(shares, ether(100));
        assert_eq!(comptroller.locked_balance(&fund, INV), ether(1));
        assert_eq!(protocol.custody.balance_of(INV, vault), ether(1));
        assert_eq!(protocol.custody.balance_of(DENOM, vault), ether(99));
        assert_eq!(comptroller.calc_gav(&fund).unwrap(), ether(100));
        fund.read(|state| assert!(state.vault.tracked_assets().contains(&INV)));

        let payouts = protocol.redeem(vault, ALICE, ether(50)).unwrap();
        assert!(payouts.contains(&(INV, ether(1) / 2)));
        assert!(payouts.contains(&(DENOM, ether(99) / 2)));
        assert_eq!(comptroller.locked_balance(&fund, INV), ether(1) / 2);
    }

    #[test]
    fn test_skipping_investment_token_keeps_it_locked() {
        let protocol = TestProtocol::new();
        let modules = FundModules::default().with_fee(INVESTMENT, one_percent_investment());
        let (vault, _) = protocol.create_fund(&modules);
        let fund = protocol.fund(vault);
        let comptroller = protocol.engine.comptroller();
        protocol.buy(vault, ALICE, ether(100)).unwrap();
        protocol.buy(vault, BOB, ether(100)).unwrap();
        assert_eq!(comptroller.locked_balance(&fund, INV), ether(2));

        let payouts = comptroller
            .redeem_shares_detailed(&fund, ALICE, U256::zero(), &[], &[INV])
            .unwrap();
        assert_eq!(payouts, vec![(DENOM, ether(99))]);
        assert_eq!(protocol.custody.balance_of(INV, vault), ether(2));
        assert_eq!(comptroller.locked_balance(&fund, INV), ether(2));
        assert!(comptroller.locked_balance(&fund, INV) <= protocol.custody.balance_of(INV, vault));

        let payouts = protocol.redeem(vault, BOB, U256::zero()).unwrap();
        assert!(payouts.contains(&(INV, ether(2))));
        assert!(comptroller.locked_balance(&fund, INV).is_zero());
    }

    #[test]
    fn test_investment_fee_rate_outside_range_is_rejected() {
        let protocol = TestProtocol::new();
        protocol
            .engine
            .controller()
            .set_fee_configuration(OWNER, INVESTMENT, vec![U256::zero()], vec![ether(1) / 1_000])
            .unwrap();

        let modules = FundModules::default().with_fee(INVESTMENT, one_percent_investment());
        let result = protocol
            .engine
            .controller()
            .create_new_fund(MANAGER, "Fund", DENOM, 0, &modules);
        assert!(result.is_err());
        assert!(protocol.engine.dispatcher().vaults().is_empty());
    }
}
