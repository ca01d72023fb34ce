use primitive_types::U256;
use solana_program::{clock::Clock, msg, pubkey::Pubkey};

use crate::{
    error::EngineError,
    math::{checked_div, checked_mul, narrow, positive_price, saturating_narrow, wide, PERCENT, PRECISION},
    oracle::{OracleAdapter, PriceFeed},
    state::{CollateralEntry, EngineConfig, LedgerRead, RiskParameters},
};

/// Health factor of a position, 18 decimals.
///
/// Zero debt is unconstrained and reads as `u128::MAX`; otherwise
/// `(collateral_usd * threshold / 100) * PRECISION / debt`, saturating.
pub fn calculate_health_factor(risk: &RiskParameters, total_minted: u128, collateral_usd: u128) -> u128 {
    if total_minted == 0 {
        return u128::MAX;
    }

    let adjusted = wide(collateral_usd) * wide(risk.liquidation_threshold as u128) / wide(PERCENT);
    saturating_narrow(adjusted * wide(PRECISION) / wide(total_minted))
}

/// Valuation and solvency math over a ledger view. Prices are read from the
/// feeds on every call and never kept.
pub struct RiskCalculator<'a, O: PriceFeed> {
    config: &'a EngineConfig,
    oracle: OracleAdapter<'a, O>,
    clock: &'a Clock,
}

impl<'a, O: PriceFeed> RiskCalculator<'a, O> {
    pub fn new(config: &'a EngineConfig, feeds: &'a O, clock: &'a Clock) -> Self {
        Self {
            config,
            oracle: OracleAdapter::new(feeds, config.risk.max_price_age),
            clock,
        }
    }

    /// Feed answer and registry entry for `asset`.
    fn quote(&self, asset: &Pubkey) -> Result<(U256, &'a CollateralEntry), EngineError> {
        let entry = self.config.registry.entry(asset)?;
        let (price, _) = self.oracle.latest_price(&entry.feed, self.clock)?;
        Ok((positive_price(price)?, entry))
    }

    /// USD value (18 decimals) of `amount` native units of `asset`,
    /// truncated: `amount * answer * PRECISION / (10^asset_dec * 10^feed_dec)`.
    pub fn usd_value(&self, asset: &Pubkey, amount: u128) -> Result<u128, EngineError> {
        let (price, entry) = self.quote(asset)?;
        let value = checked_mul(checked_mul(wide(amount), price)?, wide(PRECISION))?;
        narrow(checked_div(value, entry.scale()?)?)
    }

    /// Native units of `asset` worth `usd_amount`, truncated. Inverse of
    /// [`Self::usd_value`] up to one unit.
    pub fn token_amount_for_usd(&self, asset: &Pubkey, usd_amount: u128) -> Result<u128, EngineError> {
        let (price, entry) = self.quote(asset)?;
        let scaled = checked_mul(wide(usd_amount), entry.scale()?)?;
        narrow(checked_div(scaled, checked_mul(price, wide(PRECISION))?)?)
    }

    /// Sum of every registered asset's deposited value for `user`. Every
    /// registered feed is read, held or not, so one stale feed fails the sum.
    pub fn account_collateral_value<L: LedgerRead>(&self, ledger: &L, user: &Pubkey) -> Result<u128, EngineError> {
        let mut total = U256::zero();
        for asset in self.config.registry.assets() {
            let value = self.usd_value(asset, ledger.deposited(user, asset))?;
            total = total
                .checked_add(wide(value))
                .ok_or(EngineError::ArithmeticOverflow)?;
        }
        narrow(total)
    }

    /// `(minted debt, collateral value)` for `user`.
    pub fn account_information<L: LedgerRead>(&self, ledger: &L, user: &Pubkey) -> Result<(u128, u128), EngineError> {
        let minted = ledger.minted(user);
        let collateral_value = self.account_collateral_value(ledger, user)?;
        Ok((minted, collateral_value))
    }

    pub fn health_factor<L: LedgerRead>(&self, ledger: &L, user: &Pubkey) -> Result<u128, EngineError> {
        // Debt-free positions are safe whatever the feeds say
        if ledger.minted(user) == 0 {
            return Ok(u128::MAX);
        }

        let (minted, collateral_value) = self.account_information(ledger, user)?;
        Ok(calculate_health_factor(&self.config.risk, minted, collateral_value))
    }

    /// Fails with `BreaksHealthFactor` when `user` sits below the minimum.
    pub fn ensure_healthy<L: LedgerRead>(&self, ledger: &L, user: &Pubkey) -> Result<u128, EngineError> {
        let health_factor = self.health_factor(ledger, user)?;
        if health_factor < self.config.risk.min_health_factor {
            msg!("Health factor of {} broken: {}", user, health_factor);
            return Err(EngineError::BreaksHealthFactor(health_factor));
        }
        Ok(health_factor)
    }
}
