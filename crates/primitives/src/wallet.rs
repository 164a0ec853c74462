use alloy_primitives::{Address, U256};

use crate::SafeError;

/// Snapshot of a threshold wallet's owner configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SafeWallet {
    address: Address,
    owners: Vec<Address>,
    threshold: usize,
    nonce: U256,
}

impl SafeWallet {
    /// Validates `1 <= threshold <= owners.len()` and owner uniqueness.
    pub fn new(
        address: Address,
        owners: Vec<Address>,
        threshold: usize,
        nonce: U256,
    ) -> Result<Self, SafeError> {
        if threshold == 0 || threshold > owners.len() {
            return Err(SafeError::invalid_payload(
                "threshold",
                format!("must be between 1 and {}, got {threshold}", owners.len()),
            ));
        }
        for (i, owner) in owners.iter().enumerate() {
            if *owner == Address::ZERO {
                return Err(SafeError::invalid_payload("owners", "zero address owner"));
            }
            if owners[..i].contains(owner) {
                return Err(SafeError::invalid_payload(
                    "owners",
                    format!("duplicate owner {owner}"),
                ));
            }
        }

        Ok(Self {
            address,
            owners,
            threshold,
            nonce,
        })
    }

    pub const fn address(&self) -> Address {
        self.address
    }

    pub fn owners(&self) -> &[Address] {
        &self.owners
    }

    pub const fn threshold(&self) -> usize {
        self.threshold
    }

    /// Nonce the next transaction must use.
    pub const fn nonce(&self) -> U256 {
        self.nonce
    }

    pub fn is_owner(&self, address: &Address) -> bool {
        self.owners.contains(address)
    }

    /// Advances the nonce after a transaction with the current nonce was executed.
    pub fn record_execution(&mut self) {
        self.nonce += U256::from(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owners(n: u8) -> Vec<Address> {
        (1..=n).map(Address::repeat_byte).collect()
    }

    #[test]
    fn test_threshold_bounds() {
        let wallet = Address::repeat_byte(0xaa);
        assert!(SafeWallet::new(wallet, owners(3), 0, U256::ZERO).is_err());
        assert!(SafeWallet::new(wallet, owners(3), 4, U256::ZERO).is_err());
        assert!(SafeWallet::new(wallet, owners(3), 3, U256::ZERO).is_ok());
        assert!(SafeWallet::new(wallet, vec![], 1, U256::ZERO).is_err());
    }

    #[test]
    fn test_duplicate_owner_rejected() {
        let mut list = owners(2);
        list.push(Address::repeat_byte(1));
        let err = SafeWallet::new(Address::repeat_byte(0xaa), list, 1, U256::ZERO).unwrap_err();
        assert!(matches!(err, SafeError::InvalidPayload { field: "owners", .. }));
    }

    #[test]
    fn test_nonce_advances() {
        let mut wallet =
            SafeWallet::new(Address::repeat_byte(0xaa), owners(1), 1, U256::from(41)).unwrap();
        wallet.record_execution();
        assert_eq!(wallet.nonce(), U256::from(42));
        assert!(wallet.is_owner(&Address::repeat_byte(1)));
    }
}
