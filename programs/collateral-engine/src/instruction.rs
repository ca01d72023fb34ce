use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::error::EngineError;

/// Mutating operations, Borsh-encoded. The signer of the instruction is
/// the acting user (depositor, borrower or liquidator).
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum EngineInstruction {
    /// Lock collateral
    DepositCollateral { asset: Pubkey, amount: u128 },

    /// Lock collateral and mint debt against it
    DepositCollateralAndMint {
        asset: Pubkey,
        amount: u128,
        mint_amount: u128,
    },

    /// Withdraw collateral, keeping the position solvent
    RedeemCollateral { asset: Pubkey, amount: u128 },

    /// Burn debt, then withdraw collateral
    RedeemCollateralForDebt {
        asset: Pubkey,
        amount: u128,
        burn_amount: u128,
    },

    /// Mint debt against existing collateral
    MintDebt { amount: u128 },

    /// Repay own debt
    BurnDebt { amount: u128 },

    /// Repay `debt_to_cover` of an unsafe position and seize its collateral
    Liquidate {
        asset: Pubkey,
        target: Pubkey,
        debt_to_cover: u128,
    },
}

impl EngineInstruction {
    pub fn pack(&self) -> Result<Vec<u8>, EngineError> {
        self.try_to_vec().map_err(|_| EngineError::InvalidInstruction)
    }

    pub fn unpack(input: &[u8]) -> Result<Self, EngineError> {
        Self::try_from_slice(input).map_err(|_| EngineError::InvalidInstruction)
    }

    pub fn name(&self) -> &'static str {
        match self {
            EngineInstruction::DepositCollateral { .. } => "DepositCollateral",
            EngineInstruction::DepositCollateralAndMint { .. } => "DepositCollateralAndMint",
            EngineInstruction::RedeemCollateral { .. } => "RedeemCollateral",
            EngineInstruction::RedeemCollateralForDebt { .. } => "RedeemCollateralForDebt",
            EngineInstruction::MintDebt { .. } => "MintDebt",
            EngineInstruction::BurnDebt { .. } => "BurnDebt",
            EngineInstruction::Liquidate { .. } => "Liquidate",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_layout() {
        let data = EngineInstruction::MintDebt { amount: 5 }.pack().unwrap();
        // variant index then little-endian u128
        assert_eq!(data[0], 4);
        assert_eq!(data.len(), 17);
        assert_eq!(data[1], 5);
    }

    #[test]
    fn test_unpack_liquidate() {
        let asset = Pubkey::new_unique();
        let target = Pubkey::new_unique();
        let ix = EngineInstruction::Liquidate {
            asset,
            target,
            debt_to_cover: 1_000,
        };

        let decoded = EngineInstruction::unpack(&ix.pack().unwrap()).unwrap();
        assert_eq!(decoded, ix);
        assert_eq!(decoded.name(), "Liquidate");
    }

    #[test]
    fn test_unpack_rejects_garbage() {
        assert_eq!(EngineInstruction::unpack(&[]), Err(EngineError::InvalidInstruction));
        assert_eq!(EngineInstruction::unpack(&[99]), Err(EngineError::InvalidInstruction));

        // Trailing bytes are not accepted either
        let mut data = EngineInstruction::BurnDebt { amount: 1 }.pack().unwrap();
        data.push(0);
        assert_eq!(EngineInstruction::unpack(&data), Err(EngineError::InvalidInstruction));
    }
}
