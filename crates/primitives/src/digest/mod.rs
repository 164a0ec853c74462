//! Canonical digests signers sign and verifiers check.
//!
//! Transaction digests are signed as-is. Message flows go through
//! [`eip191_message_hash`] first; the two paths are kept as separate functions so a
//! transaction digest is never prefixed by accident.

mod operation;

pub use operation::{EntryPointVersion, SafeOperation};

use alloy_primitives::{Address, B256, Bytes, U256, eip191_hash_message, keccak256};
use alloy_sol_types::{Eip712Domain, SolCall, SolStruct};
use safe_contracts::{IMultiSend, MULTI_SEND_CALL_ONLY_ADDRESS, MultiSendCall, encode_multi_send};

use crate::SafeError;

alloy_sol_types::sol! {
    /// EIP-712 struct signed for a Safe transaction
    #[derive(Debug, PartialEq, Eq)]
    struct SafeTx {
        address to;
        uint256 value;
        bytes data;
        uint8 operation;
        uint256 safeTxGas;
        uint256 baseGas;
        uint256 gasPrice;
        address gasToken;
        address refundReceiver;
        uint256 nonce;
    }

    /// EIP-712 struct signed for an off-chain Safe message
    #[derive(Debug, PartialEq, Eq)]
    struct SafeMessage {
        bytes message;
    }
}

/// How the Safe executes the call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Operation {
    #[default]
    Call = 0,
    DelegateCall = 1,
}

impl TryFrom<u8> for Operation {
    type Error = SafeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Call),
            1 => Ok(Self::DelegateCall),
            other => Err(SafeError::invalid_payload(
                "operation",
                format!("expected 0 (call) or 1 (delegate call), got {other}"),
            )),
        }
    }
}

/// A single `(to, value, data)` call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Call {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

/// Batched-call transaction executed through `execTransaction`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SafeTransaction {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub operation: Operation,
    pub safe_tx_gas: U256,
    pub base_gas: U256,
    pub gas_price: U256,
    pub gas_token: Address,
    pub refund_receiver: Address,
    pub nonce: U256,
}

impl SafeTransaction {
    /// Builds a transaction for `calls`.
    ///
    /// One call is executed directly; several are packed and delegate-called through
    /// MultiSendCallOnly.
    pub fn batch(calls: &[Call], nonce: U256) -> Result<Self, SafeError> {
        let (to, value, data, operation) = pack_calls(calls)?;
        Ok(Self {
            to,
            value,
            data,
            operation,
            nonce,
            ..Default::default()
        })
    }

    /// EIP-712 `SafeTx` digest for `safe` on `chain_id`.
    pub fn digest(&self, safe: Address, chain_id: u64) -> B256 {
        safe_tx_digest(safe, chain_id, self)
    }

    /// Bytes hashed into [`Self::digest`] (`encodeTransactionData`).
    pub fn preimage(&self, safe: Address, chain_id: u64) -> Bytes {
        safe_tx_preimage(safe, chain_id, self)
    }

    fn to_struct(&self) -> SafeTx {
        SafeTx {
            to: self.to,
            value: self.value,
            data: self.data.clone(),
            operation: self.operation as u8,
            safeTxGas: self.safe_tx_gas,
            baseGas: self.base_gas,
            gasPrice: self.gas_price,
            gasToken: self.gas_token,
            refundReceiver: self.refund_receiver,
            nonce: self.nonce,
        }
    }
}

/// Resolves `calls` into a single `(to, value, data, operation)` quadruple.
pub(crate) fn pack_calls(calls: &[Call]) -> Result<(Address, U256, Bytes, Operation), SafeError> {
    match calls {
        [] => Err(SafeError::invalid_payload("calls", "at least one call is required")),
        [call] => Ok((call.to, call.value, call.data.clone(), Operation::Call)),
        calls => {
            let packed: Vec<MultiSendCall> = calls
                .iter()
                .map(|call| MultiSendCall {
                    operation: Operation::Call as u8,
                    to: call.to,
                    value: call.value,
                    data: call.data.clone(),
                })
                .collect();
            let data = IMultiSend::multiSendCall {
                transactions: encode_multi_send(&packed),
            }
            .abi_encode();
            Ok((
                MULTI_SEND_CALL_ONLY_ADDRESS,
                U256::ZERO,
                data.into(),
                Operation::DelegateCall,
            ))
        }
    }
}

/// EIP-712 domain of a Safe: `EIP712Domain(uint256 chainId,address verifyingContract)`.
pub fn safe_domain(verifying_contract: Address, chain_id: u64) -> Eip712Domain {
    Eip712Domain::new(
        None,
        None,
        Some(U256::from(chain_id)),
        Some(verifying_contract),
        None,
    )
}

/// `0x19 ‖ 0x01 ‖ domainSeparator ‖ structHash`, the 66 bytes an EIP-712 digest hashes.
fn eip712_preimage(domain: &Eip712Domain, struct_hash: B256) -> Bytes {
    let mut preimage = Vec::with_capacity(66);
    preimage.extend_from_slice(&[0x19, 0x01]);
    preimage.extend_from_slice(domain.separator().as_slice());
    preimage.extend_from_slice(struct_hash.as_slice());
    preimage.into()
}

/// Transaction digest (`getTransactionHash`). Signed without any prefix.
pub fn safe_tx_digest(safe: Address, chain_id: u64, tx: &SafeTransaction) -> B256 {
    tx.to_struct().eip712_signing_hash(&safe_domain(safe, chain_id))
}

/// Preimage of [`safe_tx_digest`] (`encodeTransactionData`).
///
/// Safe 1.3.0 and 1.4.1 hand these bytes, not the digest, to the `isValidSignature(bytes,bytes)`
/// of contract owners.
pub fn safe_tx_preimage(safe: Address, chain_id: u64, tx: &SafeTransaction) -> Bytes {
    eip712_preimage(&safe_domain(safe, chain_id), tx.to_struct().eip712_hash_struct())
}

/// EIP-712 `SafeOp` digest of a user operation on `chain_id`.
pub fn safe_operation_digest(chain_id: u64, operation: &SafeOperation) -> Result<B256, SafeError> {
    operation.digest(chain_id)
}

/// `"\x19Ethereum Signed Message:\n" ‖ len ‖ message` hash (ethers' `hashMessage`).
pub fn eip191_message_hash(message: impl AsRef<[u8]>) -> B256 {
    eip191_hash_message(message)
}

/// EIP-712 `SafeMessage` digest (`getMessageHashForSafe`).
pub fn safe_message_digest(safe: Address, chain_id: u64, message: &[u8]) -> B256 {
    SafeMessage {
        message: Bytes::copy_from_slice(message),
    }
    .eip712_signing_hash(&safe_domain(safe, chain_id))
}

/// Preimage of [`safe_message_digest`] (`encodeMessageDataForSafe`).
pub fn safe_message_preimage(safe: Address, chain_id: u64, message: &[u8]) -> Bytes {
    let struct_hash = SafeMessage {
        message: Bytes::copy_from_slice(message),
    }
    .eip712_hash_struct();
    eip712_preimage(&safe_domain(safe, chain_id), struct_hash)
}

/// How a Safe asks its contract owners to validate a signature.
///
/// Safe 1.5 calls `isValidSignature(bytes32,bytes)` with the digest. Safe 1.3.0 and
/// 1.4.1 call the legacy `isValidSignature(bytes,bytes)` with the digest's preimage, and
/// the owner's fallback handler checks its own signatures over the `SafeMessage` of that
/// preimage, forwarding its own preimage one level further down.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ContractSignatureScheme {
    #[default]
    Hash,
    Legacy { data: Bytes },
}

impl ContractSignatureScheme {
    /// Legacy validation of a transaction of `safe`.
    pub fn legacy_transaction(safe: Address, chain_id: u64, tx: &SafeTransaction) -> Self {
        Self::Legacy {
            data: safe_tx_preimage(safe, chain_id, tx),
        }
    }

    /// Legacy validation of a `SafeMessage` of `safe`.
    pub fn legacy_message(safe: Address, chain_id: u64, message: &[u8]) -> Self {
        Self::Legacy {
            data: safe_message_preimage(safe, chain_id, message),
        }
    }

    /// Digest `delegate` signs to validate `parent_digest`, and the scheme its own contract
    /// owners are asked with.
    ///
    /// In legacy mode the digest is derived from the forwarded data alone; `parent_digest`
    /// is its hash and is not used.
    pub fn nest(&self, delegate: Address, chain_id: u64, parent_digest: B256) -> (B256, Self) {
        match self {
            Self::Hash => (nested_wallet_digest(delegate, chain_id, parent_digest), Self::Hash),
            Self::Legacy { data } => {
                let data = safe_message_preimage(delegate, chain_id, data);
                (keccak256(&data), Self::Legacy { data })
            }
        }
    }

    pub const fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy { .. })
    }
}

/// Digest a nested wallet signs so that `isValidSignature(parent_digest, sig)` accepts.
///
/// The fallback handler wraps `abi.encode(parent_digest)` in a `SafeMessage` for the
/// delegate wallet.
pub fn nested_wallet_digest(delegate: Address, chain_id: u64, parent_digest: B256) -> B256 {
    safe_message_digest(delegate, chain_id, parent_digest.as_slice())
}
