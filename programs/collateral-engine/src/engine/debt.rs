use solana_program::{msg, pubkey::Pubkey};

use crate::{
    engine::{
        risk::RiskCalculator,
        settlement::{TokenEffect, UnitOfWork},
    },
    error::EngineError,
    oracle::PriceFeed,
};

/// Add `amount` to `user`'s debt, require the post-mint position to be
/// solvent, then queue the token mint.
pub fn mint<O: PriceFeed>(
    work: &mut UnitOfWork<'_>,
    risk: &RiskCalculator<'_, O>,
    user: &Pubkey,
    amount: u128,
) -> Result<(), EngineError> {
    if amount == 0 {
        return Err(EngineError::ZeroAmount);
    }

    // The check must see the post-mint debt
    work.ledger.add_debt(user, amount)?;
    let health_factor = risk.ensure_healthy(&work.ledger, user)?;

    work.effect(TokenEffect::MintDebt { to: *user, amount });

    msg!("Mint staged: {} for {}, health factor {}", amount, user, health_factor);
    Ok(())
}

/// Reduce `on_behalf_of`'s debt by `amount`, paid for by `payer`. The paid
/// tokens are pulled into custody and destroyed.
pub fn burn(
    work: &mut UnitOfWork<'_>,
    amount: u128,
    on_behalf_of: &Pubkey,
    payer: &Pubkey,
) -> Result<(), EngineError> {
    if amount == 0 {
        return Err(EngineError::ZeroAmount);
    }

    work.ledger.remove_debt(on_behalf_of, amount)?;
    work.effect(TokenEffect::PullDebt { from: *payer, amount });
    work.effect(TokenEffect::BurnDebt { amount });

    msg!("Burn staged: {} for {} paid by {}", amount, on_behalf_of, payer);
    Ok(())
}
