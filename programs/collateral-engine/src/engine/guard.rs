use std::cell::Cell;

use crate::error::EngineError;

/// Rejects a mutating call made while another one is still in progress,
/// e.g. from inside a token transfer.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    entered: Cell<bool>,
}

/// Held for the duration of one operation; dropping it releases the guard
/// on every exit path.
#[must_use]
pub struct GuardToken<'a> {
    guard: &'a ReentrancyGuard,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self) -> Result<GuardToken<'_>, EngineError> {
        if self.entered.replace(true) {
            return Err(EngineError::ReentrantCall);
        }
        Ok(GuardToken { guard: self })
    }

    pub fn is_entered(&self) -> bool {
        self.entered.get()
    }
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        self.guard.entered.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_entry_rejected() {
        let guard = ReentrancyGuard::new();
        let token = guard.enter().unwrap();
        assert!(guard.is_entered());
        assert_eq!(guard.enter().err(), Some(EngineError::ReentrantCall));
        // The failed attempt must not release the outer hold
        assert!(guard.is_entered());
        drop(token);
        assert!(!guard.is_entered());
    }

    #[test]
    fn test_released_on_error_path() {
        fn failing(guard: &ReentrancyGuard) -> Result<(), EngineError> {
            let _token = guard.enter()?;
            Err(EngineError::ZeroAmount)
        }

        let guard = ReentrancyGuard::new();
        assert_eq!(failing(&guard), Err(EngineError::ZeroAmount));
        assert!(!guard.is_entered());
        assert!(guard.enter().is_ok());
    }
}
