use solana_program::{msg, pubkey::Pubkey};

use crate::{
    error::EngineError,
    state::{EngineEvent, LedgerChanges, StagedLedger},
    token::{CollateralToken, DebtToken},
};

/// An external token call queued by an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenEffect {
    /// Collateral from a user into custody
    PullCollateral {
        asset: Pubkey,
        from: Pubkey,
        amount: u128,
    },

    /// Debt tokens from a payer into custody
    PullDebt { from: Pubkey, amount: u128 },

    /// Collateral from custody to a recipient
    PushCollateral {
        asset: Pubkey,
        to: Pubkey,
        amount: u128,
    },

    /// Destroy debt tokens held in custody
    BurnDebt { amount: u128 },

    /// Issue new debt tokens
    MintDebt { to: Pubkey, amount: u128 },
}

impl TokenEffect {
    // Pulls settle first: they are the calls most likely to be refused and
    // the only ones that can be handed back.
    fn phase(&self) -> u8 {
        match self {
            TokenEffect::PullCollateral { .. } | TokenEffect::PullDebt { .. } => 0,
            TokenEffect::PushCollateral { .. } => 1,
            TokenEffect::BurnDebt { .. } => 2,
            TokenEffect::MintDebt { .. } => 3,
        }
    }
}

/// Everything one operation wants to change, held back until every check
/// has passed.
pub struct UnitOfWork<'a> {
    pub ledger: StagedLedger<'a>,
    effects: Vec<TokenEffect>,
    events: Vec<EngineEvent>,
}

impl<'a> UnitOfWork<'a> {
    pub fn new(ledger: StagedLedger<'a>) -> Self {
        Self {
            ledger,
            effects: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn effect(&mut self, effect: TokenEffect) {
        self.effects.push(effect);
    }

    pub fn emit(&mut self, event: EngineEvent) {
        self.events.push(event);
    }

    pub fn into_parts(self) -> (LedgerChanges, Vec<TokenEffect>, Vec<EngineEvent>) {
        (self.ledger.into_changes(), self.effects, self.events)
    }
}

/// Runs queued token calls against the collaborators.
///
/// On the first refused call every pull already settled is returned to its
/// sender and the error is surfaced. Pushes, burns and mints are final, which
/// is why no operation queues a fallible call after one of them.
pub fn settle<D: DebtToken, C: CollateralToken>(
    custody: &Pubkey,
    debt_token: &D,
    collateral_token: &C,
    mut effects: Vec<TokenEffect>,
) -> Result<(), EngineError> {
    effects.sort_by_key(TokenEffect::phase);

    let mut settled: Vec<TokenEffect> = Vec::with_capacity(effects.len());
    for effect in effects {
        if let Err(err) = apply(custody, debt_token, collateral_token, &effect) {
            msg!("Settlement failed at {:?}: {}", effect, err);
            refund(custody, debt_token, collateral_token, &settled);
            return Err(err);
        }
        settled.push(effect);
    }

    Ok(())
}

fn apply<D: DebtToken, C: CollateralToken>(
    custody: &Pubkey,
    debt_token: &D,
    collateral_token: &C,
    effect: &TokenEffect,
) -> Result<(), EngineError> {
    match *effect {
        TokenEffect::PullCollateral { asset, from, amount } => {
            if !collateral_token.transfer_from(&asset, &from, custody, amount) {
                return Err(EngineError::TransferFailed);
            }
        }
        TokenEffect::PullDebt { from, amount } => {
            if !debt_token.transfer_from(&from, custody, amount) {
                return Err(EngineError::TransferFailed);
            }
        }
        TokenEffect::PushCollateral { asset, to, amount } => {
            if !collateral_token.transfer(&asset, custody, &to, amount) {
                return Err(EngineError::TransferFailed);
            }
        }
        TokenEffect::BurnDebt { amount } => {
            debt_token.burn(custody, amount);
        }
        TokenEffect::MintDebt { to, amount } => {
            if !debt_token.mint(&to, amount) {
                return Err(EngineError::MintFailed);
            }
        }
    }
    Ok(())
}

fn refund<D: DebtToken, C: CollateralToken>(
    custody: &Pubkey,
    debt_token: &D,
    collateral_token: &C,
    settled: &[TokenEffect],
) {
    for effect in settled.iter().rev() {
        let returned = match *effect {
            TokenEffect::PullCollateral { asset, from, amount } => {
                collateral_token.transfer(&asset, custody, &from, amount)
            }
            TokenEffect::PullDebt { from, amount } => debt_token.transfer(custody, &from, amount),
            _ => continue,
        };

        if !returned {
            msg!("Refund failed for {:?}", effect);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Records every call and refuses the ones listed in `refuse`.
    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<&'static str>>,
        refuse: Vec<&'static str>,
    }

    impl Recorder {
        fn call(&self, name: &'static str) -> bool {
            self.calls.borrow_mut().push(name);
            !self.refuse.contains(&name)
        }
    }

    impl DebtToken for Recorder {
        fn mint(&self, _to: &Pubkey, _amount: u128) -> bool {
            self.call("mint")
        }
        fn burn(&self, _holder: &Pubkey, _amount: u128) {
            self.call("burn");
        }
        fn transfer_from(&self, _from: &Pubkey, _to: &Pubkey, _amount: u128) -> bool {
            self.call("pull_debt")
        }
        fn transfer(&self, _from: &Pubkey, _to: &Pubkey, _amount: u128) -> bool {
            self.call("refund_debt")
        }
    }

    impl CollateralToken for Recorder {
        fn transfer_from(&self, _asset: &Pubkey, _from: &Pubkey, _to: &Pubkey, _amount: u128) -> bool {
            self.call("pull_collateral")
        }
        fn transfer(&self, _asset: &Pubkey, from: &Pubkey, _to: &Pubkey, _amount: u128) -> bool {
            if *from == custody() {
                self.call("push_or_refund_collateral")
            } else {
                self.call("unexpected")
            }
        }
    }

    fn custody() -> Pubkey {
        Pubkey::new_from_array([7; 32])
    }

    fn liquidation_effects() -> Vec<TokenEffect> {
        let asset = Pubkey::new_unique();
        let user = Pubkey::new_unique();
        vec![
            TokenEffect::PushCollateral { asset, to: user, amount: 3 },
            TokenEffect::PullDebt { from: user, amount: 2 },
            TokenEffect::BurnDebt { amount: 2 },
        ]
    }

    #[test]
    fn test_pulls_settle_before_pushes() {
        let recorder = Recorder::default();
        settle(&custody(), &recorder, &recorder, liquidation_effects()).unwrap();

        assert_eq!(
            *recorder.calls.borrow(),
            vec!["pull_debt", "push_or_refund_collateral", "burn"]
        );
    }

    #[test]
    fn test_refused_push_refunds_pull() {
        let recorder = Recorder {
            refuse: vec!["push_or_refund_collateral"],
            ..Recorder::default()
        };

        let result = settle(&custody(), &recorder, &recorder, liquidation_effects());

        assert_eq!(result, Err(EngineError::TransferFailed));
        assert_eq!(
            *recorder.calls.borrow(),
            vec!["pull_debt", "push_or_refund_collateral", "refund_debt"]
        );
    }

    #[test]
    fn test_refused_mint() {
        let recorder = Recorder {
            refuse: vec!["mint"],
            ..Recorder::default()
        };
        let effects = vec![
            TokenEffect::MintDebt { to: Pubkey::new_unique(), amount: 1 },
            TokenEffect::PullCollateral {
                asset: Pubkey::new_unique(),
                from: Pubkey::new_unique(),
                amount: 1,
            },
        ];

        let result = settle(&custody(), &recorder, &recorder, effects);

        assert_eq!(result, Err(EngineError::MintFailed));
        assert_eq!(
            *recorder.calls.borrow(),
            vec!["pull_collateral", "mint", "push_or_refund_collateral"]
        );
    }
}
