//! # Fee Distribution
//!
//! Fee shares owed to the staking pool and the DAO are never minted. They
//! are redeemed "virtually": the recipient is paid what `q` freshly minted
//! shares would redeem for, `balance * q / (supply + q)` of every tracked
//! asset, and supply stays unchanged.
//!
//! If any transfer to the recipient fails, its payouts are undone and `q`
//! real shares are minted to it instead.

use crate::domain::{FeeContext, SplitShares};
use crate::errors::FeeError;
use crate::events::FeeEvent;
use shared_types::{math, Address, U256};
use tracing::warn;

/// Mints the owner portion and virtually redeems the staking and DAO
/// portions, in that order, then drops emptied tracked assets.
///
/// # Errors
///
/// Vault and arithmetic failures other than recipient transfer failures.
pub fn distribute(ctx: &mut FeeContext<'_, '_>, split: &SplitShares) -> Result<(), FeeError> {
    let owner = ctx.vault.owner();
    ctx.vault.mint_shares(ctx.comptroller, owner, split.owner)?;
    let (staking_pool, dao) = (ctx.env.staking_pool, ctx.env.dao);
    redeem_virtual_shares(ctx, staking_pool, split.staking)?;
    redeem_virtual_shares(ctx, dao, split.dao)?;
    ctx.vault.prune_empty_assets(ctx.comptroller, &*ctx.custody)?;
    Ok(())
}

/// Pays `recipient` the assets `quantity` virtual shares redeem for.
///
/// # Errors
///
/// Vault and arithmetic failures other than recipient transfer failures.
pub fn redeem_virtual_shares(
    ctx: &mut FeeContext<'_, '_>,
    recipient: Address,
    quantity: U256,
) -> Result<(), FeeError> {
    if quantity.is_zero() {
        return Ok(());
    }
    let savepoint = ctx.custody.savepoint();
    let vault_snapshot = ctx.vault.clone();
    let locked_snapshot = ctx.locked.clone();
    let events_len = ctx.events.len();

    match pay_out(ctx, recipient, quantity) {
        Ok(payouts) => {
            ctx.emit(FeeEvent::VirtualSharesRedeemed {
                recipient,
                shares: quantity,
                payouts,
            });
            Ok(())
        }
        Err(err) if err.is_transfer_failure() => {
            ctx.custody.rollback_to(savepoint);
            *ctx.vault = vault_snapshot;
            *ctx.locked = locked_snapshot;
            ctx.events.truncate(events_len);
            warn!(
                ?recipient,
                shares = %quantity,
                error = %err,
                "Fee payout transfer failed, minting shares instead"
            );
            ctx.vault.mint_shares(ctx.comptroller, recipient, quantity)?;
            ctx.emit(FeeEvent::FallbackSharesMinted {
                recipient,
                shares: quantity,
                reason: err.to_string(),
            });
            Ok(())
        }
        Err(err) => Err(err),
    }
}

fn pay_out(
    ctx: &mut FeeContext<'_, '_>,
    recipient: Address,
    quantity: U256,
) -> Result<Vec<(Address, U256)>, FeeError> {
    let denominator = math::add(ctx.vault.total_supply(), quantity)?;
    let assets = ctx.vault.tracked_assets().to_vec();
    let mut payouts = Vec::with_capacity(assets.len());

    for asset in assets {
        let amount = ctx
            .vault
            .proportional_balance(&*ctx.custody, asset, quantity, denominator)?;
        if amount.is_zero() {
            continue;
        }
        ctx.vault
            .withdraw_asset_to(ctx.comptroller, ctx.custody, asset, recipient, amount)?;
        let released = ctx
            .locked
            .release_proportional(asset, quantity, denominator)?;
        if !released.is_zero() {
            ctx.emit(FeeEvent::LockedBalanceReleased {
                token: asset,
                amount: released,
            });
        }
        payouts.push((asset, amount));
    }
    Ok(payouts)
}
