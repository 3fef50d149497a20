//! Payout sink.
//!
//! The exit game never holds value itself: every release (exit amounts,
//! returned and forfeited bonds) goes through a [`Vault`]. Releases happen
//! after the game state has been committed and the game lock released.

use std::collections::HashMap;

use parking_lot::Mutex;
use plasma_types::{AssetId, OwnerAddress, PlasmaError, Result};

/// Releases value out of the root chain custody.
pub trait Vault: Send + Sync {
    /// Transfer `amount` of `asset` to `recipient`.
    ///
    /// # Errors
    /// [`PlasmaError::PayoutFailed`] if the transfer can't be made.
    fn release(&self, recipient: OwnerAddress, asset: AssetId, amount: u128) -> Result<()>;
}

/// One completed release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Release {
    pub recipient: OwnerAddress,
    pub asset: AssetId,
    pub amount: u128,
}

#[derive(Debug, Default)]
struct VaultLedger {
    /// Funds still held in custody per asset.
    reserves: HashMap<AssetId, u128>,
    /// Funds paid out per (recipient, asset).
    paid: HashMap<(OwnerAddress, AssetId), u128>,
    releases: Vec<Release>,
}

/// Reserve-backed in-memory vault. Funding models deposits and bonds
/// arriving in custody; a release beyond the reserve fails.
#[derive(Debug, Default)]
pub struct InMemoryVault {
    ledger: Mutex<VaultLedger>,
}

impl InMemoryVault {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` of `asset` to custody.
    pub fn fund(&self, asset: AssetId, amount: u128) {
        let mut ledger = self.ledger.lock();
        let reserve = ledger.reserves.entry(asset).or_insert(0);
        *reserve = reserve.saturating_add(amount);
    }

    #[must_use]
    pub fn reserve(&self, asset: AssetId) -> u128 {
        self.ledger.lock().reserves.get(&asset).copied().unwrap_or(0)
    }

    /// Total paid to `recipient` in `asset` so far.
    #[must_use]
    pub fn paid_to(&self, recipient: OwnerAddress, asset: AssetId) -> u128 {
        self.ledger
            .lock()
            .paid
            .get(&(recipient, asset))
            .copied()
            .unwrap_or(0)
    }

    /// Every release, in order.
    #[must_use]
    pub fn releases(&self) -> Vec<Release> {
        self.ledger.lock().releases.clone()
    }
}

impl Vault for InMemoryVault {
    fn release(&self, recipient: OwnerAddress, asset: AssetId, amount: u128) -> Result<()> {
        let mut ledger = self.ledger.lock();
        let available = ledger.reserves.get(&asset).copied().unwrap_or(0);
        let Some(remaining) = available.checked_sub(amount) else {
            return Err(PlasmaError::PayoutFailed {
                asset,
                amount,
                reason: format!("reserve holds only {available}"),
            });
        };
        ledger.reserves.insert(asset, remaining);
        let paid = ledger.paid.entry((recipient, asset)).or_insert(0);
        *paid = paid.saturating_add(amount);
        ledger.releases.push(Release {
            recipient,
            asset,
            amount,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_draws_from_reserve() {
        let vault = InMemoryVault::new();
        let alice = OwnerAddress([1u8; 32]);
        vault.fund(AssetId::NATIVE, 100);
        vault.release(alice, AssetId::NATIVE, 60).unwrap();
        assert_eq!(vault.reserve(AssetId::NATIVE), 40);
        assert_eq!(vault.paid_to(alice, AssetId::NATIVE), 60);
        assert_eq!(vault.releases().len(), 1);
    }

    #[test]
    fn overdraw_fails_without_side_effects() {
        let vault = InMemoryVault::new();
        let alice = OwnerAddress([1u8; 32]);
        vault.fund(AssetId::NATIVE, 10);
        let err = vault.release(alice, AssetId::NATIVE, 11).unwrap_err();
        assert!(matches!(err, PlasmaError::PayoutFailed { amount: 11, .. }));
        assert_eq!(vault.reserve(AssetId::NATIVE), 10);
        assert_eq!(vault.paid_to(alice, AssetId::NATIVE), 0);
        assert!(vault.releases().is_empty());
    }

    #[test]
    fn reserves_are_per_asset() {
        let vault = InMemoryVault::new();
        let token = AssetId([5u8; 20]);
        vault.fund(AssetId::NATIVE, 10);
        assert!(vault.release(OwnerAddress([1u8; 32]), token, 1).is_err());
    }
}
