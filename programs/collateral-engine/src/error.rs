use num_derive::FromPrimitive;
use solana_program::{
    decode_error::DecodeError,
    msg,
    program_error::{PrintProgramError, ProgramError},
};
use thiserror::Error;

/// Every failure the engine can surface. All of them abort the whole
/// operation; nothing is retried or downgraded.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Collateral asset is not registered")]
    UnsupportedAsset,

    #[error("Collateral assets and price feeds must have the same length")]
    RegistryLengthMismatch,

    #[error("Collateral asset registered twice")]
    DuplicateAsset,

    #[error("Token transfer failed")]
    TransferFailed,

    #[error("Debt token mint failed")]
    MintFailed,

    #[error("Insufficient deposited collateral")]
    InsufficientCollateral,

    #[error("Health factor broken: {0}")]
    BreaksHealthFactor(u128),

    #[error("Health factor is ok")]
    HealthFactorOk,

    #[error("Health factor not improved")]
    HealthFactorNotImproved,

    #[error("Price data stale")]
    StalePrice,

    #[error("Invalid oracle price")]
    InvalidPrice,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    #[error("Re-entrant call rejected")]
    ReentrantCall,

    #[error("Invalid instruction")]
    InvalidInstruction,

    #[error("Invalid risk parameters")]
    InvalidParameters,
}

/// Stable numeric codes, used as `ProgramError::Custom` payloads.
#[derive(Error, Debug, Copy, Clone, FromPrimitive, PartialEq, Eq)]
pub enum EngineErrorCode {
    #[error("Zero amount")]
    ZeroAmount = 0,

    #[error("Unsupported asset")]
    UnsupportedAsset = 1,

    #[error("Registry length mismatch")]
    RegistryLengthMismatch = 2,

    #[error("Duplicate asset")]
    DuplicateAsset = 3,

    #[error("Transfer failed")]
    TransferFailed = 4,

    #[error("Mint failed")]
    MintFailed = 5,

    #[error("Insufficient collateral")]
    InsufficientCollateral = 6,

    #[error("Breaks health factor")]
    BreaksHealthFactor = 7,

    #[error("Health factor ok")]
    HealthFactorOk = 8,

    #[error("Health factor not improved")]
    HealthFactorNotImproved = 9,

    #[error("Stale price")]
    StalePrice = 10,

    #[error("Invalid price")]
    InvalidPrice = 11,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow = 12,

    #[error("Re-entrant call")]
    ReentrantCall = 13,

    #[error("Invalid instruction")]
    InvalidInstruction = 14,

    #[error("Invalid parameters")]
    InvalidParameters = 15,
}

impl EngineError {
    pub fn code(&self) -> EngineErrorCode {
        match self {
            EngineError::ZeroAmount => EngineErrorCode::ZeroAmount,
            EngineError::UnsupportedAsset => EngineErrorCode::UnsupportedAsset,
            EngineError::RegistryLengthMismatch => EngineErrorCode::RegistryLengthMismatch,
            EngineError::DuplicateAsset => EngineErrorCode::DuplicateAsset,
            EngineError::TransferFailed => EngineErrorCode::TransferFailed,
            EngineError::MintFailed => EngineErrorCode::MintFailed,
            EngineError::InsufficientCollateral => EngineErrorCode::InsufficientCollateral,
            EngineError::BreaksHealthFactor(_) => EngineErrorCode::BreaksHealthFactor,
            EngineError::HealthFactorOk => EngineErrorCode::HealthFactorOk,
            EngineError::HealthFactorNotImproved => EngineErrorCode::HealthFactorNotImproved,
            EngineError::StalePrice => EngineErrorCode::StalePrice,
            EngineError::InvalidPrice => EngineErrorCode::InvalidPrice,
            EngineError::ArithmeticOverflow => EngineErrorCode::ArithmeticOverflow,
            EngineError::ReentrantCall => EngineErrorCode::ReentrantCall,
            EngineError::InvalidInstruction => EngineErrorCode::InvalidInstruction,
            EngineError::InvalidParameters => EngineErrorCode::InvalidParameters,
        }
    }
}

impl PrintProgramError for EngineErrorCode {
    fn print<E>(&self) {
        msg!("EngineError: {}", self);
    }
}

impl From<EngineErrorCode> for ProgramError {
    fn from(e: EngineErrorCode) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl From<EngineError> for ProgramError {
    fn from(e: EngineError) -> Self {
        if let EngineError::BreaksHealthFactor(ratio) = e {
            msg!("Health factor at failure: {}", ratio);
        }
        e.code().into()
    }
}

impl<T> DecodeError<T> for EngineErrorCode {
    fn type_of() -> &'static str {
        "EngineError"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::FromPrimitive;

    #[test]
    fn test_custom_codes_decode_back() {
        let err: ProgramError = EngineError::BreaksHealthFactor(42).into();
        match err {
            ProgramError::Custom(code) => {
                assert_eq!(
                    EngineErrorCode::from_u32(code),
                    Some(EngineErrorCode::BreaksHealthFactor)
                );
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let err: ProgramError = EngineError::StalePrice.into();
        assert_eq!(err, ProgramError::Custom(10));
    }

    #[test]
    fn test_breaks_health_factor_carries_ratio() {
        let err = EngineError::BreaksHealthFactor(999_999_999_999_999_999);
        assert_eq!(err.to_string(), "Health factor broken: 999999999999999999");
    }
}
