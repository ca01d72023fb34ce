use std::rc::Rc;

use solana_program::pubkey::Pubkey;

/// The debt token program. Mint and burn authority belongs to the engine.
///
/// `false` from any call means the token program refused the request.
pub trait DebtToken {
    fn mint(&self, to: &Pubkey, amount: u128) -> bool;

    /// Destroy tokens held by `holder` (always the engine's custody).
    fn burn(&self, holder: &Pubkey, amount: u128);

    /// Move tokens on behalf of `from`, who must have approved the engine.
    fn transfer_from(&self, from: &Pubkey, to: &Pubkey, amount: u128) -> bool;

    /// Move tokens out of an account the engine signs for.
    fn transfer(&self, from: &Pubkey, to: &Pubkey, amount: u128) -> bool;
}

/// Token program for every registered collateral asset, addressed by mint.
pub trait CollateralToken {
    fn transfer_from(&self, asset: &Pubkey, from: &Pubkey, to: &Pubkey, amount: u128) -> bool;

    fn transfer(&self, asset: &Pubkey, from: &Pubkey, to: &Pubkey, amount: u128) -> bool;
}

impl<T: DebtToken + ?Sized> DebtToken for &T {
    fn mint(&self, to: &Pubkey, amount: u128) -> bool {
        (**self).mint(to, amount)
    }

    fn burn(&self, holder: &Pubkey, amount: u128) {
        (**self).burn(holder, amount)
    }

    fn transfer_from(&self, from: &Pubkey, to: &Pubkey, amount: u128) -> bool {
        (**self).transfer_from(from, to, amount)
    }

    fn transfer(&self, from: &Pubkey, to: &Pubkey, amount: u128) -> bool {
        (**self).transfer(from, to, amount)
    }
}

impl<T: DebtToken + ?Sized> DebtToken for Rc<T> {
    fn mint(&self, to: &Pubkey, amount: u128) -> bool {
        (**self).mint(to, amount)
    }

    fn burn(&self, holder: &Pubkey, amount: u128) {
        (**self).burn(holder, amount)
    }

    fn transfer_from(&self, from: &Pubkey, to: &Pubkey, amount: u128) -> bool {
        (**self).transfer_from(from, to, amount)
    }

    fn transfer(&self, from: &Pubkey, to: &Pubkey, amount: u128) -> bool {
        (**self).transfer(from, to, amount)
    }
}

impl<T: CollateralToken + ?Sized> CollateralToken for &T {
    fn transfer_from(&self, asset: &Pubkey, from: &Pubkey, to: &Pubkey, amount: u128) -> bool {
        (**self).transfer_from(asset, from, to, amount)
    }

    fn transfer(&self, asset: &Pubkey, from: &Pubkey, to: &Pubkey, amount: u128) -> bool {
        (**self).transfer(asset, from, to, amount)
    }
}

impl<T: CollateralToken + ?Sized> CollateralToken for Rc<T> {
    fn transfer_from(&self, asset: &Pubkey, from: &Pubkey, to: &Pubkey, amount: u128) -> bool {
        (**self).transfer_from(asset, from, to, amount)
    }

    fn transfer(&self, asset: &Pubkey, from: &Pubkey, to: &Pubkey, amount: u128) -> bool {
        (**self).transfer(asset, from, to, amount)
    }
}
