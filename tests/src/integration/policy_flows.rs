//! # Policy Flows
//!
//! Policies enforced by the comptroller, including settings updates on a
//! live fund and the redemption time frame.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use fl_01_vault::AssetCustody;
    use fl_03_policy_engine::{MinMaxSettings, PolicyState, WhitelistState};
    use fl_05_fund_deployer::{DeployerError, FundApi, FundModules, NewFund};
    use shared_types::math::ether;
    use shared_types::{ErrorKind, U256};
    use std::collections::BTreeSet;

    fn min_max(min: u64, max: u64) -> Vec<u8> {
        serde_json::to_vec(&MinMaxSettings {
            min_investment_amount: ether(min),
            max_investment_amount: ether(max),
        })
        .unwrap()
    }

    // =========================================================================
    // INVESTOR WHITELIST
    // =========================================================================

    #[test]
    fn test_whitelist_update_swaps_members() {
        let protocol = TestProtocol::new();
        let modules = FundModules::default().with_policy(WHITELIST, whitelist(&[ALICE], &[]));
        let (vault, _) = protocol.create_fund(&modules);
        let fund = protocol.fund(vault);
        let comptroller = protocol.engine.comptroller();

        assert!(protocol.buy(vault, ALICE, ether(1)).is_ok());
        assert_eq!(
            protocol.buy(vault, BOB, ether(1)).unwrap_err().kind(),
            ErrorKind::PolicyViolation
        );

        comptroller
            .update_policy_settings(&fund, MANAGER, WHITELIST, &whitelist(&[BOB], &[ALICE]))
            .unwrap();

        let err = protocol.buy(vault, ALICE, ether(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PolicyViolation);
        assert_eq!(protocol.custody.balance_of(DENOM, ALICE), ether(1), "rejected buy moved nothing");
        assert_eq!(protocol.buy(vault, BOB, ether(1)).unwrap(), ether(1));

        assert_eq!(
            comptroller.policy_state(&fund, WHITELIST),
            Some(PolicyState::Whitelist(WhitelistState {
                members: BTreeSet::from([BOB]),
            }))
        );
    }

    #[test]
    fn test_policy_settings_are_owner_only() {
        let protocol = TestProtocol::new();
        let modules = FundModules::default().with_policy(WHITELIST, whitelist(&[ALICE], &[]));
        let (vault, _) = protocol.create_fund(&modules);
        let fund = protocol.fund(vault);

        let err = protocol
            .engine
            .comptroller()
            .update_policy_settings(&fund, STRANGER, WHITELIST, &whitelist(&[STRANGER], &[]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert!(protocol.buy(vault, STRANGER, ether(1)).is_err());
    }

    // =========================================================================
    // MIN / MAX INVESTMENT
    // =========================================================================

    // =========================================================================
    // SHARES ACTION TIME FRAME
    // =========================================================================

    const DAY: u64 = 86_400;

    #[test]
    fn test_time_frame_blocks_redemption_until_next_cycle() {
        let protocol = TestProtocol::new();
        let modules =
            FundModules::default().with_policy(TIME_FRAME, time_frame(5 * DAY, 20 * DAY, false));
        let (vault, _) = protocol.create_fund(&modules);
        let fund = protocol.fund(vault);

        assert_eq!(protocol.buy(vault, ALICE, ether(2)).unwrap(), ether(2));

        protocol.clock.advance(6 * DAY);
        assert_eq!(protocol.buy(vault, BOB, ether(1)).unwrap(), ether(1));
        let before = fund.read(|state| state.to_json().unwrap());
        let err = protocol.redeem(vault, ALICE, ether(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PolicyViolation);
        assert_eq!(fund.read(|state| state.to_json().unwrap()), before);
        assert!(protocol.custody.balance_of(DENOM, ALICE).is_zero());

        protocol.clock.advance(19 * DAY);
        let payouts = protocol.redeem(vault, ALICE, ether(1)).unwrap();
        assert_eq!(payouts, vec![(DENOM, ether(1))]);

        protocol.clock.advance(5 * DAY);
        assert_eq!(
            protocol.redeem(vault, ALICE, U256::zero()).unwrap_err().kind(),
            ErrorKind::PolicyViolation
        );
    }

    #[test]
    fn test_time_frame_with_blocked_buys() {
        let protocol = TestProtocol::new();
        let modules =
            FundModules::default().with_policy(TIME_FRAME, time_frame(5 * DAY, 20 * DAY, true));
        let (vault, _) = protocol.create_fund(&modules);

        assert!(protocol.buy(vault, ALICE, ether(1)).is_ok());
        protocol.clock.advance(5 * DAY);
        assert_eq!(
            protocol.buy(vault, BOB, ether(1)).unwrap_err().kind(),
            ErrorKind::PolicyViolation
        );
        protocol.clock.advance(20 * DAY);
        assert!(protocol.buy(vault, BOB, ether(1)).is_ok());
    }

    #[tokio::test]
    async fn test_min_max_bounds_through_service() {
        let protocol = TestProtocol::new();
        let api = &protocol.service;
        let (vault, _) = api
            .create_new_fund(NewFund {
                owner: MANAGER,
                name: "Bounded".into(),
                denomination_asset: DENOM,
                shares_action_timelock: 0,
                modules: FundModules::default().with_policy(MIN_MAX, min_max(1, 10)),
            })
            .await
            .unwrap();
        protocol.custody.mint(DENOM, ALICE, ether(20));

        for amount in [ether(1) / 2, ether(11)] {
            let err = api
                .buy_shares(vault, ALICE, amount, U256::zero(), None)
                .await
                .unwrap_err();
            assert!(matches!(err, DeployerError::Comptroller(_)));
            assert_eq!(err.kind(), ErrorKind::PolicyViolation);
        }
        assert_eq!(
            api.buy_shares(vault, ALICE, ether(10), U256::zero(), None)
                .await
                .unwrap(),
            ether(10)
        );
    }
}
