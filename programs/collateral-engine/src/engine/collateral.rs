use solana_program::{msg, pubkey::Pubkey};

use crate::{
    engine::settlement::{TokenEffect, UnitOfWork},
    error::EngineError,
    state::{EngineConfig, EngineEvent},
};

/// Credit `amount` of `asset` to `user` and queue the pull into custody.
pub fn deposit(
    work: &mut UnitOfWork<'_>,
    config: &EngineConfig,
    user: &Pubkey,
    asset: &Pubkey,
    amount: u128,
) -> Result<(), EngineError> {
    if amount == 0 {
        return Err(EngineError::ZeroAmount);
    }
    if !config.registry.contains(asset) {
        return Err(EngineError::UnsupportedAsset);
    }

    work.ledger.credit_collateral(user, asset, amount)?;
    work.emit(EngineEvent::CollateralDeposited {
        user: *user,
        asset: *asset,
        amount,
    });
    work.effect(TokenEffect::PullCollateral {
        asset: *asset,
        from: *user,
        amount,
    });

    msg!("Deposit staged: {} of {} for {}", amount, asset, user);
    Ok(())
}

/// Debit `amount` of `asset` from `from` and queue the push to `to`.
///
/// No solvency check happens here; callers re-check `from` afterwards. This
/// is also the seizure path, where `to` is a liquidator acting without the
/// owner's authorization.
pub fn redeem(
    work: &mut UnitOfWork<'_>,
    config: &EngineConfig,
    asset: &Pubkey,
    amount: u128,
    from: &Pubkey,
    to: &Pubkey,
) -> Result<(), EngineError> {
    if !config.registry.contains(asset) {
        return Err(EngineError::UnsupportedAsset);
    }

    work.ledger.debit_collateral(from, asset, amount)?;
    work.emit(EngineEvent::CollateralRedeemed {
        from: *from,
        to: *to,
        asset: *asset,
        amount,
    });
    work.effect(TokenEffect::PushCollateral {
        asset: *asset,
        to: *to,
        amount,
    });

    msg!("Redeem staged: {} of {} from {} to {}", amount, asset, from, to);
    Ok(())
}
