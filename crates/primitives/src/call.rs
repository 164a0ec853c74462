use std::sync::Arc;

use alloy_primitives::{Address, Bytes};

/// A failed static call. `revert_data` is empty when the failure carried none (transport
/// errors, out-of-gas, plain `revert()`).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("call failed: {reason}")]
pub struct CallFailure {
    pub reason: String,
    pub revert_data: Bytes,
}

impl CallFailure {
    pub fn new(reason: impl Into<String>, revert_data: Bytes) -> Self {
        Self {
            reason: reason.into(),
            revert_data,
        }
    }

    /// Failure that never reached the contract.
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::new(reason, Bytes::new())
    }
}

/// Read-only access to contracts on one chain.
///
/// Implementations must be idempotent: the same call may be issued again on retry.
#[async_trait::async_trait]
pub trait ChainCaller: Send + Sync {
    /// Executes `data` against `to` without a transaction and returns the raw output.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, CallFailure>;
}

#[async_trait::async_trait]
impl<T: ChainCaller + ?Sized> ChainCaller for Arc<T> {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, CallFailure> {
        (**self).call(to, data).await
    }
}

#[async_trait::async_trait]
impl<T: ChainCaller + ?Sized> ChainCaller for &T {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, CallFailure> {
        (**self).call(to, data).await
    }
}
