//! The collateral engine: position bookkeeping, solvency checks and the
//! liquidation protocol.
//!
//! Every mutating call runs as one unit. Balances are staged, every check
//! runs against the staged balances, queued token calls are settled, and
//! only then is the ledger committed and the events published. A failure at
//! any step leaves the ledger exactly as it was.

pub mod collateral;
pub mod debt;
pub mod guard;
pub mod liquidation;
pub mod risk;
pub mod settlement;

use std::cell::RefCell;

use solana_program::{clock::Clock, msg, pubkey::Pubkey};

use crate::{
    error::EngineError,
    math::{ADDITIONAL_FEED_PRECISION, PERCENT, PRECISION},
    oracle::PriceFeed,
    state::{EngineConfig, EngineEvent, LedgerRead, Position, PositionLedger},
    token::{CollateralToken, DebtToken},
};

pub use guard::ReentrancyGuard;
pub use liquidation::LiquidationOutcome;
pub use risk::{calculate_health_factor, RiskCalculator};
pub use settlement::{TokenEffect, UnitOfWork};

pub struct CollateralEngine<D: DebtToken, C: CollateralToken, O: PriceFeed> {
    config: EngineConfig,
    debt_token: D,
    collateral_token: C,
    price_feed: O,
    ledger: RefCell<PositionLedger>,
    events: RefCell<Vec<EngineEvent>>,
    guard: ReentrancyGuard,
}

impl<D: DebtToken, C: CollateralToken, O: PriceFeed> CollateralEngine<D, C, O> {
    pub fn new(
        config: EngineConfig,
        debt_token: D,
        collateral_token: C,
        price_feed: O,
    ) -> Result<Self, EngineError> {
        Self::restore(config, PositionLedger::new(), debt_token, collateral_token, price_feed)
    }

    /// Resume from a previously persisted ledger.
    pub fn restore(
        config: EngineConfig,
        ledger: PositionLedger,
        debt_token: D,
        collateral_token: C,
        price_feed: O,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        msg!(
            "Collateral engine ready: {} assets, debt mint {}",
            config.registry.len(),
            config.debt_mint
        );

        Ok(Self {
            config,
            debt_token,
            collateral_token,
            price_feed,
            ledger: RefCell::new(ledger),
            events: RefCell::new(Vec::new()),
            guard: ReentrancyGuard::new(),
        })
    }

    fn risk<'a>(&'a self, clock: &'a Clock) -> RiskCalculator<'a, O> {
        RiskCalculator::new(&self.config, &self.price_feed, clock)
    }

    /// Runs `op` as a single atomic unit under the re-entrancy guard.
    fn execute<R, F>(&self, op: F) -> Result<R, EngineError>
    where
        F: FnOnce(&mut UnitOfWork<'_>) -> Result<R, EngineError>,
    {
        let _entered = self.guard.enter()?;

        let (prepared, effects, events, result) = {
            let ledger = self.ledger.borrow();
            let mut work = UnitOfWork::new(ledger.stage());
            let result = op(&mut work)?;
            let (changes, effects, events) = work.into_parts();
            (ledger.prepare(changes)?, effects, events, result)
        };

        settlement::settle(
            &self.config.custody,
            &self.debt_token,
            &self.collateral_token,
            effects,
        )?;

        self.ledger.borrow_mut().commit(prepared);

        let mut published = self.events.borrow_mut();
        for event in events {
            event.log();
            published.push(event);
        }

        Ok(result)
    }

    pub fn deposit_collateral(&self, user: &Pubkey, asset: &Pubkey, amount: u128) -> Result<(), EngineError> {
        self.execute(|work| collateral::deposit(work, &self.config, user, asset, amount))
    }

    /// Deposit and mint in one unit; the mint check sees the new collateral.
    pub fn deposit_collateral_and_mint(
        &self,
        user: &Pubkey,
        clock: &Clock,
        asset: &Pubkey,
        amount: u128,
        mint_amount: u128,
    ) -> Result<(), EngineError> {
        let risk = self.risk(clock);
        self.execute(|work| {
            collateral::deposit(work, &self.config, user, asset, amount)?;
            debt::mint(work, &risk, user, mint_amount)
        })
    }

    pub fn redeem_collateral(
        &self,
        user: &Pubkey,
        clock: &Clock,
        asset: &Pubkey,
        amount: u128,
    ) -> Result<(), EngineError> {
        let risk = self.risk(clock);
        self.execute(|work| {
            if amount == 0 {
                return Err(EngineError::ZeroAmount);
            }
            collateral::redeem(work, &self.config, asset, amount, user, user)?;
            risk.ensure_healthy(&work.ledger, user)?;
            Ok(())
        })
    }

    /// Burn `burn_amount` of debt, then withdraw `amount` of collateral.
    pub fn redeem_collateral_for_debt(
        &self,
        user: &Pubkey,
        clock: &Clock,
        asset: &Pubkey,
        amount: u128,
        burn_amount: u128,
    ) -> Result<(), EngineError> {
        let risk = self.risk(clock);
        self.execute(|work| {
            if amount == 0 {
                return Err(EngineError::ZeroAmount);
            }
            if !self.config.registry.contains(asset) {
                return Err(EngineError::UnsupportedAsset);
            }
            debt::burn(work, burn_amount, user, user)?;
            collateral::redeem(work, &self.config, asset, amount, user, user)?;
            risk.ensure_healthy(&work.ledger, user)?;
            Ok(())
        })
    }

    pub fn mint_debt(&self, user: &Pubkey, clock: &Clock, amount: u128) -> Result<(), EngineError> {
        let risk = self.risk(clock);
        self.execute(|work| debt::mint(work, &risk, user, amount))
    }

    /// Repay own debt. Lowering debt cannot break solvency, so no price is read.
    pub fn burn_debt(&self, user: &Pubkey, amount: u128) -> Result<(), EngineError> {
        self.execute(|work| debt::burn(work, amount, user, user))
    }

    pub fn liquidate(
        &self,
        liquidator: &Pubkey,
        clock: &Clock,
        asset: &Pubkey,
        target: &Pubkey,
        debt_to_cover: u128,
    ) -> Result<LiquidationOutcome, EngineError> {
        let risk = self.risk(clock);
        self.execute(|work| {
            liquidation::liquidate(work, &self.config, &risk, liquidator, asset, target, debt_to_cover)
        })
    }

    pub fn account_collateral_value(&self, user: &Pubkey, clock: &Clock) -> Result<u128, EngineError> {
        self.risk(clock)
            .account_collateral_value(&*self.ledger.borrow(), user)
    }

    /// `(minted debt, collateral value)` for `user`.
    pub fn account_information(&self, user: &Pubkey, clock: &Clock) -> Result<(u128, u128), EngineError> {
        self.risk(clock).account_information(&*self.ledger.borrow(), user)
    }

    pub fn collateral_balance_of(&self, user: &Pubkey, asset: &Pubkey) -> u128 {
        self.ledger.borrow().deposited(user, asset)
    }

    pub fn position(&self, user: &Pubkey) -> Position {
        self.ledger
            .borrow()
            .position(user, self.config.registry.assets())
    }

    pub fn usd_value(&self, asset: &Pubkey, amount: u128, clock: &Clock) -> Result<u128, EngineError> {
        self.risk(clock).usd_value(asset, amount)
    }

    pub fn token_amount_from_usd(&self, asset: &Pubkey, usd_amount: u128, clock: &Clock) -> Result<u128, EngineError> {
        self.risk(clock).token_amount_for_usd(asset, usd_amount)
    }

    /// Health factor of a hypothetical `(debt, collateral value)` pair.
    pub fn calculate_health_factor(&self, total_minted: u128, collateral_usd: u128) -> u128 {
        calculate_health_factor(&self.config.risk, total_minted, collateral_usd)
    }

    pub fn health_factor(&self, user: &Pubkey, clock: &Clock) -> Result<u128, EngineError> {
        self.risk(clock).health_factor(&*self.ledger.borrow(), user)
    }

    pub fn collateral_tokens(&self) -> Vec<Pubkey> {
        self.config.registry.assets().copied().collect()
    }

    pub fn collateral_price_feed(&self, asset: &Pubkey) -> Result<Pubkey, EngineError> {
        self.config.registry.feed_for(asset).copied()
    }

    pub fn total_debt(&self) -> u128 {
        self.ledger.borrow().total_minted()
    }

    pub fn total_collateral(&self, asset: &Pubkey) -> u128 {
        self.ledger.borrow().total_deposited(asset)
    }

    pub fn liquidation_threshold(&self) -> u8 {
        self.config.risk.liquidation_threshold
    }

    pub fn liquidation_bonus(&self) -> u8 {
        self.config.risk.liquidation_bonus
    }

    pub fn liquidation_precision(&self) -> u128 {
        PERCENT
    }

    pub fn min_health_factor(&self) -> u128 {
        self.config.risk.min_health_factor
    }

    pub fn precision(&self) -> u128 {
        PRECISION
    }

    pub fn additional_feed_precision(&self) -> u128 {
        ADDITIONAL_FEED_PRECISION
    }

    pub fn debt_token_mint(&self) -> Pubkey {
        self.config.debt_mint
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Copy of the committed ledger, for persisting.
    pub fn ledger_snapshot(&self) -> PositionLedger {
        self.ledger.borrow().clone()
    }

    /// Events published since the last drain, oldest first.
    pub fn drain_events(&self) -> Vec<EngineEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}
