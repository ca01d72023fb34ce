// Collateralized debt engine
// Native Solana implementation - NO ANCHOR

use solana_program::pubkey::Pubkey;

pub mod engine;
pub mod error;
pub mod instruction;
pub mod math;
pub mod oracle;
pub mod processor;
pub mod state;
pub mod token;

pub use engine::{CollateralEngine, LiquidationOutcome};
pub use error::{EngineError, EngineErrorCode};

// Declare program ID
solana_program::declare_id!("CoLLateraLEngine111111111111111111111111111");

/// Seed of the PDA that holds collateral and debt tokens in custody.
pub const CUSTODY_SEED: &[u8] = b"custody";

/// Custody PDA and bump for this program.
pub fn custody_address() -> (Pubkey, u8) {
    Pubkey::find_program_address(&[CUSTODY_SEED], &id())
}
