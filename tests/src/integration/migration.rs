//! # Migration Scenarios
//!
//! A fund moves onto a newer release generation: the vault keeps its
//! shares, assets and locked investment-fee balance while its accessor
//! switches to the comptroller configured on the target generation.
//!
//! ```text
//!   gen 1 (Live) ── signal ──→ pending ── timelock ──→ execute ──→ gen 2 accessor
//! ```

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use fl_01_vault::AssetCustody;
    use fl_04_comptroller::ComptrollerStatus;
    use fl_05_fund_deployer::{DeployerError, FundApi, FundModules, ProtocolEvent};
    use shared_types::math::ether;

    const TIMELOCK: u64 = 3_600;

    fn investment_modules() -> FundModules {
        FundModules::default().with_fee(INVESTMENT, one_percent_investment())
    }

    #[tokio::test]
    async fn test_migration_keeps_locked_balance_bit_identical() {
        let protocol = TestProtocol::with_timelock(TIMELOCK);
        let api = &protocol.service;
        let (vault, old_comptroller) = protocol.create_fund(&investment_modules());
        protocol.buy(vault, ALICE, ether(100)).unwrap();
        protocol.buy(vault, BOB, ether(50)).unwrap();

        let fund = protocol.fund(vault);
        let before = fund.snapshot();
        assert_eq!(before.locked.locked(INV), ether(3) / 2);

        let next = TestProtocol::launch_generation(&protocol.engine);
        let new_comptroller = api
            .create_migrated_fund_config(next.address(), MANAGER, DENOM, 0, investment_modules())
            .await
            .unwrap();
        let executable_at = api
            .signal_migration(next.address(), MANAGER, vault, new_comptroller)
            .await
            .unwrap();
        assert_eq!(executable_at, GENESIS + TIMELOCK);

        assert!(matches!(
            api.execute_migration(next.address(), MANAGER, vault, false).await,
            Err(DeployerError::TimelockNotElapsed { .. })
        ));
        protocol.clock.advance(TIMELOCK);
        api.execute_migration(next.address(), MANAGER, vault, false)
            .await
            .unwrap();

        let after = fund.snapshot();
        assert_eq!(after.locked, before.locked);
        assert_eq!(
            serde_json::to_vec(&after.locked).unwrap(),
            serde_json::to_vec(&before.locked).unwrap()
        );
        assert_eq!(after.vault.total_supply(), before.vault.total_supply());
        assert_eq!(after.vault.balance_of(ALICE), before.vault.balance_of(ALICE));
        assert_eq!(after.vault.balance_of(BOB), before.vault.balance_of(BOB));
        assert_eq!(after.vault.accessor(), new_comptroller);
        assert!(after.migration.is_none());
        assert_eq!(protocol.custody.balance_of(INV, vault), ether(3) / 2);

        let comptroller = protocol.engine.comptroller();
        assert_eq!(
            comptroller.status(&fund, new_comptroller).unwrap(),
            ComptrollerStatus::Active
        );
        assert_eq!(
            comptroller.status(&fund, old_comptroller).unwrap(),
            ComptrollerStatus::Destructed
        );
        assert_eq!(
            protocol.engine.dispatcher().get_fund_deployer_for_vault(vault).unwrap(),
            next.address()
        );
        assert!(protocol.engine.log().events().iter().any(|recorded| matches!(
            recorded.event,
            ProtocolEvent::MigrationExecuted { vault: migrated, emergency: false, .. }
                if migrated == vault
        )));
    }

    #[test]
    fn test_fund_keeps_working_after_migration() {
        let protocol = TestProtocol::new();
        let (vault, _) = protocol.create_fund(&investment_modules());
        protocol.buy(vault, ALICE, ether(100)).unwrap();

        let next = TestProtocol::launch_generation(&protocol.engine);
        let comptroller = next
            .create_migrated_fund_config(MANAGER, DENOM, 0, &investment_modules())
            .unwrap();
        next.signal_migration(MANAGER, vault, comptroller).unwrap();
        next.execute_migration(MANAGER, vault, false).unwrap();

        assert_eq!(protocol.buy(vault, BOB, ether(100)).unwrap(), ether(100));
        let fund = protocol.fund(vault);
        assert_eq!(
            protocol.engine.comptroller().locked_balance(&fund, INV),
            ether(2)
        );

        let payouts = protocol.redeem(vault, ALICE, ether(100)).unwrap();
        assert!(payouts.iter().any(|(asset, _)| *asset == DENOM));
        assert_eq!(
            protocol.engine.comptroller().locked_balance(&fund, INV),
            ether(1)
        );
    }

    #[test]
    fn test_buys_wait_while_migration_is_pending() {
        let protocol = TestProtocol::with_timelock(TIMELOCK);
        let (vault, _) = protocol.create_fund(&FundModules::default());
        protocol.buy(vault, ALICE, ether(10)).unwrap();

        let next = TestProtocol::launch_generation(&protocol.engine);
        let comptroller = next
            .create_migrated_fund_config(MANAGER, DENOM, 0, &FundModules::default())
            .unwrap();
        next.signal_migration(MANAGER, vault, comptroller).unwrap();

        assert!(protocol.buy(vault, BOB, ether(1)).is_err());
        assert_eq!(
            protocol.redeem(vault, ALICE, ether(4)).unwrap(),
            vec![(DENOM, ether(4))],
            "holders can leave while a migration is pending"
        );

        next.cancel_migration(MANAGER, vault, false).unwrap();
        assert!(protocol.fund(vault).read(|state| state.migration.is_none()));
        assert_eq!(protocol.buy(vault, BOB, ether(1)).unwrap(), ether(1));
    }
}
