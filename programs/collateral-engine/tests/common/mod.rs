#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::Rc,
};

use collateral_engine::{
    engine::CollateralEngine,
    oracle::{PriceFeed, RoundData},
    state::{CollateralEntry, CollateralRegistry, EngineConfig, RiskParameters},
    token::{CollateralToken, DebtToken},
};
use solana_program::{clock::Clock, clock::UnixTimestamp, pubkey::Pubkey};

pub const PRECISION: u128 = 1_000_000_000_000_000_000;
pub const ONE_TOKEN: u128 = 1_000_000_000_000_000_000;
pub const ONE_BTC: u128 = 100_000_000;
pub const ETH_USD_PRICE: i128 = 2_000_00000000;
pub const BTC_USD_PRICE: i128 = 1_000_00000000;
pub const START_TIME: UnixTimestamp = 1_700_000_000;
pub const THREE_HOURS: UnixTimestamp = 3 * 60 * 60;

pub fn usd(dollars: u128) -> u128 {
    dollars * PRECISION
}

/// Whole units of an 18-decimal asset.
pub fn tokens(whole: u128) -> u128 {
    whole * ONE_TOKEN
}

/// Whole units of WBTC, which has 8 decimals.
pub fn btc(whole: u128) -> u128 {
    whole * ONE_BTC
}

/// Debt token with plain balances and switchable failures.
#[derive(Default)]
pub struct MockDebtToken {
    balances: RefCell<HashMap<Pubkey, u128>>,
    supply: Cell<u128>,
    pub fail_mint: Cell<bool>,
    pub fail_transfer_from: Cell<bool>,
}

impl MockDebtToken {
    pub fn balance_of(&self, owner: &Pubkey) -> u128 {
        self.balances.borrow().get(owner).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> u128 {
        self.supply.get()
    }

    /// Credit tokens out of thin air, as if bought on a market.
    pub fn airdrop(&self, owner: &Pubkey, amount: u128) {
        *self.balances.borrow_mut().entry(*owner).or_insert(0) += amount;
        self.supply.set(self.supply.get() + amount);
    }

    fn move_tokens(&self, from: &Pubkey, to: &Pubkey, amount: u128) -> bool {
        let mut balances = self.balances.borrow_mut();
        let available = balances.get(from).copied().unwrap_or(0);
        if available < amount {
            return false;
        }
        balances.insert(*from, available - amount);
        *balances.entry(*to).or_insert(0) += amount;
        true
    }
}

impl DebtToken for MockDebtToken {
    fn mint(&self, to: &Pubkey, amount: u128) -> bool {
        if self.fail_mint.get() {
            return false;
        }
        self.airdrop(to, amount);
        true
    }

    fn burn(&self, holder: &Pubkey, amount: u128) {
        let mut balances = self.balances.borrow_mut();
        let balance = balances.get(holder).copied().unwrap_or(0);
        balances.insert(*holder, balance.checked_sub(amount).expect("burn exceeds balance"));
        self.supply.set(self.supply.get() - amount);
    }

    fn transfer_from(&self, from: &Pubkey, to: &Pubkey, amount: u128) -> bool {
        if self.fail_transfer_from.get() {
            return false;
        }
        self.move_tokens(from, to, amount)
    }

    fn transfer(&self, from: &Pubkey, to: &Pubkey, amount: u128) -> bool {
        self.move_tokens(from, to, amount)
    }
}

/// Every collateral mint in one token program.
#[derive(Default)]
pub struct MockCollateralToken {
    balances: RefCell<HashMap<(Pubkey, Pubkey), u128>>,
    pub fail_transfer: Cell<bool>,
    /// Runs at the start of every `transfer_from`
    pub on_transfer_from: RefCell<Option<Box<dyn Fn()>>>,
}

impl MockCollateralToken {
    pub fn balance_of(&self, asset: &Pubkey, owner: &Pubkey) -> u128 {
        self.balances.borrow().get(&(*asset, *owner)).copied().unwrap_or(0)
    }

    pub fn fund(&self, asset: &Pubkey, owner: &Pubkey, amount: u128) {
        *self.balances.borrow_mut().entry((*asset, *owner)).or_insert(0) += amount;
    }

    fn move_tokens(&self, asset: &Pubkey, from: &Pubkey, to: &Pubkey, amount: u128) -> bool {
        let mut balances = self.balances.borrow_mut();
        let available = balances.get(&(*asset, *from)).copied().unwrap_or(0);
        if available < amount {
            return false;
        }
        balances.insert((*asset, *from), available - amount);
        *balances.entry((*asset, *to)).or_insert(0) += amount;
        true
    }
}

impl CollateralToken for MockCollateralToken {
    fn transfer_from(&self, asset: &Pubkey, from: &Pubkey, to: &Pubkey, amount: u128) -> bool {
        if let Some(hook) = self.on_transfer_from.borrow().as_ref() {
            hook();
        }
        self.move_tokens(asset, from, to, amount)
    }

    fn transfer(&self, asset: &Pubkey, from: &Pubkey, to: &Pubkey, amount: u128) -> bool {
        if self.fail_transfer.get() {
            return false;
        }
        self.move_tokens(asset, from, to, amount)
    }
}

#[derive(Default)]
pub struct MockPriceFeed {
    rounds: RefCell<HashMap<Pubkey, RoundData>>,
}

impl MockPriceFeed {
    pub fn set_price(&self, feed: &Pubkey, answer: i128, updated_at: UnixTimestamp) {
        let mut rounds = self.rounds.borrow_mut();
        let round_id = rounds.get(feed).map(|r| r.round_id + 1).unwrap_or(1);
        rounds.insert(
            *feed,
            RoundData {
                round_id,
                answer,
                started_at: updated_at,
                updated_at,
                answered_in_round: round_id,
            },
        );
    }
}

impl PriceFeed for MockPriceFeed {
    fn latest_round_data(&self, feed: &Pubkey) -> RoundData {
        self.rounds.borrow().get(feed).copied().unwrap_or_default()
    }
}

pub type TestEngine = CollateralEngine<Rc<MockDebtToken>, Rc<MockCollateralToken>, Rc<MockPriceFeed>>;

pub struct Harness {
    pub engine: Rc<TestEngine>,
    pub debt: Rc<MockDebtToken>,
    pub collateral: Rc<MockCollateralToken>,
    pub feeds: Rc<MockPriceFeed>,
    pub custody: Pubkey,
    pub debt_mint: Pubkey,
    pub weth: Pubkey,
    pub wbtc: Pubkey,
    pub eth_feed: Pubkey,
    pub btc_feed: Pubkey,
    pub clock: Clock,
}

impl Harness {
    /// WETH (18 decimals) at $2000 and WBTC (8 decimals) at $1000, both
    /// freshly quoted by 8-decimal feeds.
    pub fn new() -> Self {
        let (custody, _bump) = collateral_engine::custody_address();
        let debt_mint = Pubkey::new_unique();
        let weth = Pubkey::new_unique();
        let wbtc = Pubkey::new_unique();
        let eth_feed = Pubkey::new_unique();
        let btc_feed = Pubkey::new_unique();

        let debt = Rc::new(MockDebtToken::default());
        let collateral = Rc::new(MockCollateralToken::default());
        let feeds = Rc::new(MockPriceFeed::default());
        feeds.set_price(&eth_feed, ETH_USD_PRICE, START_TIME);
        feeds.set_price(&btc_feed, BTC_USD_PRICE, START_TIME);

        let registry = CollateralRegistry::from_entries(vec![
            CollateralEntry::new(weth, eth_feed),
            CollateralEntry::with_decimals(wbtc, btc_feed, 8, 8),
        ])
        .expect("valid registry");
        let config = EngineConfig::with_registry(custody, debt_mint, registry, RiskParameters::default())
            .expect("valid config");
        let engine = CollateralEngine::new(config, debt.clone(), collateral.clone(), feeds.clone())
            .expect("engine");

        Self {
            engine: Rc::new(engine),
            debt,
            collateral,
            feeds,
            custody,
            debt_mint,
            weth,
            wbtc,
            eth_feed,
            btc_feed,
            clock: Clock {
                unix_timestamp: START_TIME,
                ..Clock::default()
            },
        }
    }

    pub fn set_eth_price(&self, answer: i128) {
        self.feeds.set_price(&self.eth_feed, answer, self.clock.unix_timestamp);
    }

    pub fn set_btc_price(&self, answer: i128) {
        self.feeds.set_price(&self.btc_feed, answer, self.clock.unix_timestamp);
    }

    pub fn advance(&mut self, seconds: UnixTimestamp) {
        self.clock.unix_timestamp += seconds;
        self.clock.slot += (seconds as u64) * 2;
    }

    /// A user holding `amount` of WETH in their wallet.
    pub fn funded_user(&self, amount: u128) -> Pubkey {
        let user = Pubkey::new_unique();
        self.collateral.fund(&self.weth, &user, amount);
        user
    }

    /// 10 WETH deposited and `debt` minted against it at $2000.
    pub fn borrower(&self, debt: u128) -> Pubkey {
        let user = self.funded_user(tokens(10));
        self.engine
            .deposit_collateral_and_mint(&user, &self.clock, &self.weth, tokens(10), debt)
            .expect("open position");
        user
    }
}
