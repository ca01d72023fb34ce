use solana_program::{clock::Clock, entrypoint::ProgramResult, msg, pubkey::Pubkey};

use crate::{
    engine::CollateralEngine,
    instruction::EngineInstruction,
    oracle::PriceFeed,
    token::{CollateralToken, DebtToken},
};

pub struct Processor;

impl Processor {
    /// Decode one instruction signed by `signer` and run it against the
    /// engine. Engine failures surface as `ProgramError::Custom` codes.
    pub fn process<D: DebtToken, C: CollateralToken, O: PriceFeed>(
        engine: &CollateralEngine<D, C, O>,
        signer: &Pubkey,
        clock: &Clock,
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = EngineInstruction::unpack(instruction_data)?;
        msg!("Instruction: {}", instruction.name());

        match instruction {
            EngineInstruction::DepositCollateral { asset, amount } => {
                engine.deposit_collateral(signer, &asset, amount)?;
            }

            EngineInstruction::DepositCollateralAndMint {
                asset,
                amount,
                mint_amount,
            } => {
                engine.deposit_collateral_and_mint(signer, clock, &asset, amount, mint_amount)?;
            }

            EngineInstruction::RedeemCollateral { asset, amount } => {
                engine.redeem_collateral(signer, clock, &asset, amount)?;
            }

            EngineInstruction::RedeemCollateralForDebt {
                asset,
                amount,
                burn_amount,
            } => {
                engine.redeem_collateral_for_debt(signer, clock, &asset, amount, burn_amount)?;
            }

            EngineInstruction::MintDebt { amount } => {
                engine.mint_debt(signer, clock, amount)?;
            }

            EngineInstruction::BurnDebt { amount } => {
                engine.burn_debt(signer, amount)?;
            }

            EngineInstruction::Liquidate {
                asset,
                target,
                debt_to_cover,
            } => {
                let outcome = engine.liquidate(signer, clock, &asset, &target, debt_to_cover)?;
                msg!(
                    "Liquidated {}: repaid {}, seized {}, health factor {} -> {}",
                    target,
                    outcome.debt_repaid,
                    outcome.collateral_seized(),
                    outcome.starting_health_factor,
                    outcome.ending_health_factor
                );
            }
        }

        Ok(())
    }
}
