use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{log::sol_log_data, msg, pubkey::Pubkey};

/// Events published after an operation commits. Off-chain indexers decode
/// these from the `Program data:` log lines.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    CollateralDeposited {
        user: Pubkey,
        asset: Pubkey,
        amount: u128,
    },

    CollateralRedeemed {
        from: Pubkey,
        to: Pubkey,
        asset: Pubkey,
        amount: u128,
    },
}

impl EngineEvent {
    /// Publish as a `Program data:` line. Runs after commit, so an encoding
    /// failure is reported rather than returned.
    pub fn log(&self) {
        match self.try_to_vec() {
            Ok(data) => sol_log_data(&[&data]),
            Err(err) => msg!("Failed to encode event {:?}: {}", self, err),
        }
    }
}
