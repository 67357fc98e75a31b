//! # Atomicity and Re-entrance
//!
//! Every fund operation either commits in full or leaves the fund record
//! and custody exactly as they were. Token callbacks may call into other
//! funds but never back into the fund whose call is in flight.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use fl_01_vault::AssetCustody;
    use fl_04_comptroller::ComptrollerError;
    use fl_05_fund_deployer::FundModules;
    use shared_types::math::ether;
    use shared_types::{Address, ErrorKind, U256};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Installs a one-shot DENOM hook that buys `vault` shares for `buyer`.
    fn reenter_once(protocol: &TestProtocol, vault: Address, buyer: Address) -> Arc<AtomicBool> {
        let fired = Arc::new(AtomicBool::new(false));
        let service = Arc::downgrade(protocol.engine.comptroller());
        let fund = protocol.fund(vault);
        let flag = fired.clone();
        protocol.custody.set_hook(
            DENOM,
            Arc::new(move |_: Address, _: Address, _: U256| {
                if flag.swap(true, Ordering::SeqCst) {
                    return Ok(());
                }
                let Some(service) = service.upgrade() else {
                    return Ok(());
                };
                service
                    .buy_shares(&fund, buyer, ether(1), U256::zero(), None)
                    .map(|_| ())
                    .map_err(ComptrollerError::into_callback_error)
            }),
        );
        fired
    }

    fn fingerprint(protocol: &TestProtocol, vault: Address) -> Vec<u8> {
        protocol.fund(vault).read(|state| state.to_json().unwrap())
    }

    // =========================================================================
    // RE-ENTRANCE
    // =========================================================================

    #[test]
    fn test_same_vault_reentry_is_rejected_and_rolled_back() {
        let protocol = TestProtocol::new();
        let (vault, _) = protocol.create_fund(&FundModules::default());
        protocol.custody.mint(DENOM, BOB, ether(1));
        let before = fingerprint(&protocol, vault);

        let fired = reenter_once(&protocol, vault, BOB);
        let err = protocol.buy(vault, ALICE, ether(5)).unwrap_err();
        protocol.custody.clear_hook(DENOM);

        assert!(fired.load(Ordering::SeqCst));
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert!(err.to_string().contains("re-entrance"));
        assert_eq!(fingerprint(&protocol, vault), before);
        assert_eq!(protocol.custody.balance_of(DENOM, ALICE), ether(5));
        assert_eq!(protocol.custody.balance_of(DENOM, BOB), ether(1));
        assert!(protocol.custody.balance_of(DENOM, vault).is_zero());
    }

    #[test]
    fn test_cross_vault_reentry_is_allowed() {
        let protocol = TestProtocol::new();
        let (first, _) = protocol.create_fund(&FundModules::default());
        let (second, _) = protocol.create_fund(&FundModules::default());
        protocol.custody.mint(DENOM, BOB, ether(1));

        reenter_once(&protocol, second, BOB);
        assert_eq!(protocol.buy(first, ALICE, ether(5)).unwrap(), ether(5));
        protocol.custody.clear_hook(DENOM);

        assert_eq!(protocol.custody.balance_of(DENOM, first), ether(5));
        assert_eq!(protocol.custody.balance_of(DENOM, second), ether(1));
        protocol
            .fund(second)
            .read(|state| assert_eq!(state.vault.balance_of(BOB), ether(1)));
    }

    // =========================================================================
    // ROLLBACK
    // =========================================================================

    #[test]
    fn test_failed_redeem_leaves_state_byte_identical() {
        let protocol = TestProtocol::new();
        let modules = FundModules::default().with_fee(INVESTMENT, one_percent_investment());
        let (vault, _) = protocol.create_fund(&modules);
        protocol.buy(vault, ALICE, ether(100)).unwrap();
        protocol.buy(vault, BOB, ether(100)).unwrap();

        let before = fingerprint(&protocol, vault);
        let denom_held = protocol.custody.balance_of(DENOM, vault);
        let inv_held = protocol.custody.balance_of(INV, vault);

        // DENOM pays out first, then the INV transfer fails.
        protocol.custody.pause(INV);
        assert!(protocol.redeem(vault, ALICE, U256::zero()).is_err());
        protocol.custody.unpause(INV);

        protocol.custody.block_recipient(BOB);
        assert!(protocol.redeem(vault, BOB, ether(10)).is_err());
        protocol.custody.unblock_recipient(BOB);

        assert_eq!(fingerprint(&protocol, vault), before);
        assert_eq!(protocol.custody.balance_of(DENOM, vault), denom_held);
        assert_eq!(protocol.custody.balance_of(INV, vault), inv_held);
        assert!(protocol.custody.balance_of(DENOM, ALICE).is_zero());

        let payouts = protocol.redeem(vault, ALICE, U256::zero()).unwrap();
        assert_eq!(payouts.len(), 2);
    }

    #[test]
    fn test_slippage_failure_reverses_the_deposit() {
        let protocol = TestProtocol::new();
        let (vault, _) = protocol.create_fund(&FundModules::default());
        let before = fingerprint(&protocol, vault);
        protocol.custody.mint(DENOM, ALICE, ether(2));

        let err = protocol
            .engine
            .comptroller()
            .buy_shares(&protocol.fund(vault), ALICE, ether(2), ether(3), None)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SlippageExceeded);
        assert_eq!(fingerprint(&protocol, vault), before);
        assert_eq!(protocol.custody.balance_of(DENOM, ALICE), ether(2));
        protocol
            .fund(vault)
            .read(|state| assert!(state.vault.total_supply().is_zero()));
    }
}
