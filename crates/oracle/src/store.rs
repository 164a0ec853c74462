//! Pending-transaction store boundary and the transaction-service data model.

use std::str::FromStr;

use alloy_primitives::{Address, B256, Bytes, U256};
use safe_primitives::{Operation, ProofSet, SafeError, SafeTransaction};
use serde::{Deserialize, Deserializer, Serialize};

/// Errors raised by a pending-transaction store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("store responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("undecodable store response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Read-only access to transactions proposed for a wallet but not yet executed.
#[async_trait::async_trait]
pub trait PendingStore: Send + Sync {
    /// Unexecuted transactions of `wallet`, optionally only those with a nonce of at least
    /// `nonce_from`.
    async fn pending_transactions(
        &self,
        wallet: Address,
        nonce_from: Option<U256>,
    ) -> Result<PendingPage, StoreError>;
}

#[async_trait::async_trait]
impl<T: PendingStore + ?Sized> PendingStore for std::sync::Arc<T> {
    async fn pending_transactions(
        &self,
        wallet: Address,
        nonce_from: Option<U256>,
    ) -> Result<PendingPage, StoreError> {
        (**self).pending_transactions(wallet, nonce_from).await
    }
}

/// One page (or the concatenation of all pages) of pending transactions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPage {
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default)]
    pub results: Vec<PendingTransaction>,
}

/// A proposed multisig transaction as the transaction service reports it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTransaction {
    pub safe: Address,
    pub to: Address,
    #[serde(deserialize_with = "lenient_u256")]
    pub value: U256,
    #[serde(default)]
    pub data: Option<Bytes>,
    pub operation: u8,
    #[serde(default, deserialize_with = "lenient_u256")]
    pub safe_tx_gas: U256,
    #[serde(default, deserialize_with = "lenient_u256")]
    pub base_gas: U256,
    #[serde(default, deserialize_with = "lenient_u256")]
    pub gas_price: U256,
    #[serde(default, deserialize_with = "lenient_address")]
    pub gas_token: Address,
    #[serde(default, deserialize_with = "lenient_address")]
    pub refund_receiver: Address,
    #[serde(deserialize_with = "lenient_u256")]
    pub nonce: U256,
    #[serde(default)]
    pub safe_tx_hash: Option<B256>,
    #[serde(default)]
    pub data_decoded: Option<DataDecoded>,
    #[serde(default)]
    pub confirmations: Vec<Confirmation>,
    #[serde(default)]
    pub confirmations_required: Option<usize>,
}

impl PendingTransaction {
    pub fn to_safe_transaction(&self) -> Result<SafeTransaction, SafeError> {
        Ok(SafeTransaction {
            to: self.to,
            value: self.value,
            data: self.data.clone().unwrap_or_default(),
            operation: Operation::try_from(self.operation)?,
            safe_tx_gas: self.safe_tx_gas,
            base_gas: self.base_gas,
            gas_price: self.gas_price,
            gas_token: self.gas_token,
            refund_receiver: self.refund_receiver,
            nonce: self.nonce,
        })
    }

    /// Argument of a `signMessage(bytes)` call, if that is what this transaction does.
    pub fn signed_message(&self) -> Option<Bytes> {
        let decoded = self.data_decoded.as_ref()?;
        if decoded.method != "signMessage" {
            return None;
        }
        decoded
            .parameters
            .first()?
            .value
            .as_str()
            .and_then(|value| Bytes::from_str(value).ok())
    }

    pub fn confirmation_owners(&self) -> Vec<Address> {
        self.confirmations.iter().map(|c| c.owner).collect()
    }

    /// Decodes the stored confirmation signatures against `safe_tx_hash`.
    ///
    /// Confirmations without a signature (on-chain approvals awaiting indexing) are skipped.
    pub fn proofs(&self, safe_tx_hash: B256) -> Result<ProofSet, SafeError> {
        let mut proofs = ProofSet::new(safe_tx_hash);
        for confirmation in &self.confirmations {
            if let Some(signature) = confirmation.signature.as_ref().filter(|s| !s.is_empty()) {
                proofs.extend_from_bytes(signature)?;
            }
        }
        Ok(proofs)
    }
}

/// Decoded call the service attaches to a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataDecoded {
    pub method: String,
    #[serde(default)]
    pub parameters: Vec<DecodedParameter>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedParameter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    pub value: serde_json::Value,
}

/// An owner's confirmation of a pending transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub owner: Address,
    #[serde(default)]
    pub signature: Option<Bytes>,
    #[serde(default)]
    pub signature_type: Option<String>,
}

/// Numbers arrive as JSON numbers or as decimal / hex strings.
fn lenient_u256<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(U256::from(n)),
        NumberOrString::String(s) => U256::from_str(&s).map_err(serde::de::Error::custom),
    }
}

/// `null` addresses mean the zero address.
fn lenient_address<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
    Ok(Option::<Address>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"{
        "count": 1,
        "next": null,
        "previous": null,
        "results": [{
            "safe": "0x5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a",
            "to": "0xd53cd0ab83d845ac265be939c57f53ad838012c9",
            "value": "0",
            "data": "0x85a5affe",
            "operation": 1,
            "gasToken": "0x0000000000000000000000000000000000000000",
            "safeTxGas": 0,
            "baseGas": "0",
            "gasPrice": "0",
            "refundReceiver": null,
            "nonce": "7",
            "safeTxHash": "0x0000000000000000000000000000000000000000000000000000000000000001",
            "dataDecoded": {
                "method": "signMessage",
                "parameters": [{
                    "name": "_data",
                    "type": "bytes",
                    "value": "0x0101010101010101010101010101010101010101010101010101010101010101"
                }]
            },
            "confirmations": [{
                "owner": "0x0101010101010101010101010101010101010101",
                "signature": null,
                "signatureType": "APPROVED_HASH"
            }],
            "confirmationsRequired": 2
        }]
    }"#;

    #[test]
    fn test_decode_service_page() {
        let page: PendingPage = serde_json::from_str(PAGE).unwrap();
        assert_eq!(page.count, 1);
        let tx = &page.results[0];
        assert_eq!(tx.nonce, U256::from(7));
        assert_eq!(tx.refund_receiver, Address::ZERO);
        assert_eq!(tx.confirmations_required, Some(2));
        assert_eq!(tx.confirmation_owners(), vec![Address::repeat_byte(1)]);
        assert_eq!(
            tx.signed_message(),
            Some(Bytes::copy_from_slice(&[1u8; 32]))
        );

        let safe_tx = tx.to_safe_transaction().unwrap();
        assert_eq!(safe_tx.operation, Operation::DelegateCall);
        assert!(tx.proofs(B256::ZERO).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_operation_is_invalid() {
        let mut page: PendingPage = serde_json::from_str(PAGE).unwrap();
        page.results[0].operation = 2;
        assert!(page.results[0].to_safe_transaction().is_err());
    }
}
