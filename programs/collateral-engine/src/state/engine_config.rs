use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{clock::UnixTimestamp, pubkey::Pubkey};

use primitive_types::U256;

use crate::{
    error::EngineError,
    math::{checked_mul, pow10, DEFAULT_ASSET_DECIMALS, DEFAULT_FEED_DECIMALS, MAX_DECIMALS, PRECISION},
};

/// Engine configuration. Set once at construction and never mutated.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Account discriminator
    pub discriminator: [u8; 8],

    /// Account holding collateral and debt tokens in engine custody
    pub custody: Pubkey,

    /// Mint of the debt token issued against collateral
    pub debt_mint: Pubkey,

    /// Allow-listed collateral assets and their price feeds
    pub registry: CollateralRegistry,

    /// Solvency and liquidation parameters
    pub risk: RiskParameters,
}

/// Ordered asset -> feed mapping.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct CollateralRegistry {
    pub entries: Vec<CollateralEntry>,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollateralEntry {
    /// Collateral token mint
    pub asset: Pubkey,

    /// Price feed quoting one whole unit of the asset in USD
    pub feed: Pubkey,

    /// Decimals of the asset's native amounts
    pub asset_decimals: u8,

    /// Decimals of the feed's answers
    pub feed_decimals: u8,
}

impl CollateralEntry {
    /// An 18-decimal asset quoted by an 8-decimal feed.
    pub fn new(asset: Pubkey, feed: Pubkey) -> Self {
        Self::with_decimals(asset, feed, DEFAULT_ASSET_DECIMALS, DEFAULT_FEED_DECIMALS)
    }

    pub fn with_decimals(asset: Pubkey, feed: Pubkey, asset_decimals: u8, feed_decimals: u8) -> Self {
        Self {
            asset,
            feed,
            asset_decimals,
            feed_decimals,
        }
    }

    /// `10^asset_decimals * 10^feed_decimals`: divides `amount * answer`
    /// down to whole USD.
    pub fn scale(&self) -> Result<U256, EngineError> {
        checked_mul(pow10(self.asset_decimals), pow10(self.feed_decimals))
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.asset_decimals > MAX_DECIMALS || self.feed_decimals > MAX_DECIMALS {
            return Err(EngineError::InvalidParameters);
        }
        Ok(())
    }
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskParameters {
    /// Share of collateral value counted toward solvency, in percent (default: 50)
    pub liquidation_threshold: u8,

    /// Liquidator premium paid in seized collateral, in percent (default: 10)
    pub liquidation_bonus: u8,

    /// Solvency threshold, 18 decimals (default: 1.0)
    pub min_health_factor: u128,

    /// Maximum accepted age of a price quote in seconds (default: 3 hours)
    pub max_price_age: UnixTimestamp,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            liquidation_threshold: 50,
            liquidation_bonus: 10,
            min_health_factor: PRECISION,
            max_price_age: 3 * 60 * 60,
        }
    }
}

impl RiskParameters {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.liquidation_threshold == 0 || self.liquidation_threshold > 100 {
            return Err(EngineError::InvalidParameters);
        }

        if self.liquidation_bonus > 100 {
            return Err(EngineError::InvalidParameters);
        }

        if self.min_health_factor == 0 || self.max_price_age <= 0 {
            return Err(EngineError::InvalidParameters);
        }

        Ok(())
    }
}

impl CollateralRegistry {
    /// Pairs assets with feeds positionally, at default precisions.
    pub fn new(assets: Vec<Pubkey>, feeds: Vec<Pubkey>) -> Result<Self, EngineError> {
        if assets.len() != feeds.len() {
            return Err(EngineError::RegistryLengthMismatch);
        }

        Self::from_entries(
            assets
                .into_iter()
                .zip(feeds)
                .map(|(asset, feed)| CollateralEntry::new(asset, feed))
                .collect(),
        )
    }

    pub fn from_entries(entries: Vec<CollateralEntry>) -> Result<Self, EngineError> {
        let registry = Self { entries };
        registry.validate()?;
        Ok(registry)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        for (i, entry) in self.entries.iter().enumerate() {
            entry.validate()?;
            if self.entries[..i].iter().any(|seen| seen.asset == entry.asset) {
                return Err(EngineError::DuplicateAsset);
            }
        }
        Ok(())
    }

    pub fn entry(&self, asset: &Pubkey) -> Result<&CollateralEntry, EngineError> {
        self.entries
            .iter()
            .find(|entry| entry.asset == *asset)
            .ok_or(EngineError::UnsupportedAsset)
    }

    pub fn feed_for(&self, asset: &Pubkey) -> Result<&Pubkey, EngineError> {
        self.entry(asset).map(|entry| &entry.feed)
    }

    pub fn contains(&self, asset: &Pubkey) -> bool {
        self.entries.iter().any(|entry| entry.asset == *asset)
    }

    pub fn assets(&self) -> impl Iterator<Item = &Pubkey> + '_ {
        self.entries.iter().map(|entry| &entry.asset)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl EngineConfig {
    pub const DISCRIMINATOR: [u8; 8] = [67, 68, 80, 95, 67, 79, 78, 70]; // "CDP_CONF"

    /// Build a configuration with default risk parameters.
    pub fn new(
        custody: Pubkey,
        debt_mint: Pubkey,
        assets: Vec<Pubkey>,
        feeds: Vec<Pubkey>,
    ) -> Result<Self, EngineError> {
        Self::with_risk(custody, debt_mint, assets, feeds, RiskParameters::default())
    }

    pub fn with_risk(
        custody: Pubkey,
        debt_mint: Pubkey,
        assets: Vec<Pubkey>,
        feeds: Vec<Pubkey>,
        risk: RiskParameters,
    ) -> Result<Self, EngineError> {
        Self::with_registry(custody, debt_mint, CollateralRegistry::new(assets, feeds)?, risk)
    }

    /// Build from an explicit registry, e.g. one with per-asset decimals.
    pub fn with_registry(
        custody: Pubkey,
        debt_mint: Pubkey,
        registry: CollateralRegistry,
        risk: RiskParameters,
    ) -> Result<Self, EngineError> {
        let config = Self {
            discriminator: Self::DISCRIMINATOR,
            custody,
            debt_mint,
            registry,
            risk,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.discriminator != Self::DISCRIMINATOR {
            return Err(EngineError::InvalidParameters);
        }

        self.registry.validate()?;
        self.risk.validate()
    }
}
