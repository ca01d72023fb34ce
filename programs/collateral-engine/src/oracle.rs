use std::rc::Rc;

use solana_program::{clock::Clock, clock::UnixTimestamp, msg, pubkey::Pubkey};

use crate::error::EngineError;

/// One answer from a price feed, USD per whole asset unit at 8 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoundData {
    pub round_id: u64,
    pub answer: i128,
    pub started_at: UnixTimestamp,
    pub updated_at: UnixTimestamp,
    pub answered_in_round: u64,
}

/// Read side of an external price feed.
pub trait PriceFeed {
    fn latest_round_data(&self, feed: &Pubkey) -> RoundData;
}

impl<T: PriceFeed + ?Sized> PriceFeed for &T {
    fn latest_round_data(&self, feed: &Pubkey) -> RoundData {
        (**self).latest_round_data(feed)
    }
}

impl<T: PriceFeed + ?Sized> PriceFeed for Rc<T> {
    fn latest_round_data(&self, feed: &Pubkey) -> RoundData {
        (**self).latest_round_data(feed)
    }
}

/// Wraps a feed with a staleness guard. A quote older than `max_age`
/// aborts the caller; there is no fallback feed and no retry.
pub struct OracleAdapter<'a, O: PriceFeed> {
    feed_source: &'a O,
    max_age: UnixTimestamp,
}

impl<'a, O: PriceFeed> OracleAdapter<'a, O> {
    pub fn new(feed_source: &'a O, max_age: UnixTimestamp) -> Self {
        Self { feed_source, max_age }
    }

    /// Latest round, rejected when older than the configured age.
    pub fn stale_checked_round(&self, feed: &Pubkey, clock: &Clock) -> Result<RoundData, EngineError> {
        let round = self.feed_source.latest_round_data(feed);

        // A timestamp ahead of the clock counts as fresh.
        let age = clock.unix_timestamp.saturating_sub(round.updated_at).max(0);
        if age > self.max_age {
            msg!("Stale price on feed {}: {}s old", feed, age);
            return Err(EngineError::StalePrice);
        }

        Ok(round)
    }

    /// `(price, as_of)` for a feed. Non-positive answers are rejected.
    pub fn latest_price(&self, feed: &Pubkey, clock: &Clock) -> Result<(i128, UnixTimestamp), EngineError> {
        let round = self.stale_checked_round(feed, clock)?;
        if round.answer <= 0 {
            return Err(EngineError::InvalidPrice);
        }
        Ok((round.answer, round.updated_at))
    }
}
