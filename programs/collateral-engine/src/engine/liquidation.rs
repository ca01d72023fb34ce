use solana_program::{msg, pubkey::Pubkey};

use crate::{
    engine::{collateral, debt, risk::RiskCalculator, settlement::UnitOfWork},
    error::EngineError,
    math::percent_of,
    oracle::PriceFeed,
    state::EngineConfig,
};

/// What a successful liquidation moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidationOutcome {
    /// Debt repaid on the target's behalf, 18 decimals
    pub debt_repaid: u128,
    /// Collateral equal in value to `debt_repaid`
    pub base_collateral: u128,
    /// Premium paid to the liquidator on top of `base_collateral`
    pub bonus_collateral: u128,
    pub starting_health_factor: u128,
    pub ending_health_factor: u128,
}

impl LiquidationOutcome {
    pub fn collateral_seized(&self) -> u128 {
        self.base_collateral + self.bonus_collateral
    }
}

/// Forced partial close of `target`'s position by `liquidator`.
///
/// The liquidator repays `debt_to_cover` of the target's debt from their own
/// debt tokens and receives the equivalent amount of `asset` plus the bonus.
/// The seizure is not clamped to the target's balance; an oversized
/// `debt_to_cover` fails with `InsufficientCollateral`.
///
/// When a position's collateral is worth less than its debt plus bonus the
/// seizure can no longer raise the ratio and every attempt fails with
/// `HealthFactorNotImproved`. Such bad debt stays on the ledger.
pub fn liquidate<O: PriceFeed>(
    work: &mut UnitOfWork<'_>,
    config: &EngineConfig,
    risk: &RiskCalculator<'_, O>,
    liquidator: &Pubkey,
    asset: &Pubkey,
    target: &Pubkey,
    debt_to_cover: u128,
) -> Result<LiquidationOutcome, EngineError> {
    if debt_to_cover == 0 {
        return Err(EngineError::ZeroAmount);
    }
    if !config.registry.contains(asset) {
        return Err(EngineError::UnsupportedAsset);
    }

    let starting_health_factor = risk.health_factor(&work.ledger, target)?;
    if starting_health_factor >= config.risk.min_health_factor {
        return Err(EngineError::HealthFactorOk);
    }

    let base_collateral = risk.token_amount_for_usd(asset, debt_to_cover)?;
    let bonus_collateral = percent_of(base_collateral, config.risk.liquidation_bonus as u128)?;
    let total_seized = base_collateral
        .checked_add(bonus_collateral)
        .ok_or(EngineError::ArithmeticOverflow)?;

    msg!(
        "Liquidating {}: cover {}, seize {} (+{} bonus) of {}",
        target,
        debt_to_cover,
        base_collateral,
        bonus_collateral,
        asset
    );

    collateral::redeem(work, config, asset, total_seized, target, liquidator)?;
    debt::burn(work, debt_to_cover, target, liquidator)?;

    let ending_health_factor = risk.health_factor(&work.ledger, target)?;
    if ending_health_factor <= starting_health_factor {
        msg!(
            "Health factor of {} not improved: {} -> {}",
            target,
            starting_health_factor,
            ending_health_factor
        );
        return Err(EngineError::HealthFactorNotImproved);
    }

    // Re-checks the target, not the liquidator
    risk.ensure_healthy(&work.ledger, target)?;

    Ok(LiquidationOutcome {
        debt_repaid: debt_to_cover,
        base_collateral,
        bonus_collateral,
        starting_health_factor,
        ending_health_factor,
    })
}
