use crate::storage::{has_state, is_locked, set_locked};
use dex_types::Error;
use soroban_sdk::Env;

/// Reentrancy guard held for the duration of a mutating operation
///
/// Released on drop, so early returns through `?` unlock as well.
pub struct PoolLock<'a> {
    env: &'a Env,
}

impl<'a> PoolLock<'a> {
    /// Lock an initialized pool
    pub fn acquire(env: &'a Env) -> Result<Self, Error> {
        if !has_state(env) {
            return Err(Error::NotInitialized);
        }
        Self::acquire_uninitialized(env)
    }

    /// Lock without requiring pool state, used by `initialize`
    pub fn acquire_uninitialized(env: &'a Env) -> Result<Self, Error> {
        if is_locked(env) {
            return Err(Error::LockedReentrant);
        }
        set_locked(env, true);
        Ok(Self { env })
    }
}

impl Drop for PoolLock<'_> {
    fn drop(&mut self) {
        set_locked(self.env, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::with_contract;

    #[test]
    fn test_acquire_requires_initialized_pool() {
        let env = Env::default();
        with_contract(&env, || {
            assert_eq!(
                PoolLock::acquire(&env).err(),
                Some(Error::NotInitialized)
            );
        });
    }

    #[test]
    fn test_lock_released_on_drop() {
        let env = Env::default();
        with_contract(&env, || {
            {
                let _guard = PoolLock::acquire_uninitialized(&env).unwrap();
                assert!(is_locked(&env));
                assert_eq!(
                    PoolLock::acquire_uninitialized(&env).err(),
                    Some(Error::LockedReentrant)
                );
            }
            assert!(!is_locked(&env));
        });
    }
}
