//! MultiSend batching.

use alloy_primitives::{Address, Bytes, U256};

crate::sol! {
    /// MultiSend / MultiSendCallOnly batching library
    #[derive(Debug, PartialEq, Eq)]
    #[sol(abi)]
    interface IMultiSend {
        /// @param transactions Packed encoding of transactions:
        ///        operation (1 byte) | to (20 bytes) | value (32 bytes) | data length (32 bytes) | data
        function multiSend(bytes memory transactions) external payable;
    }
}

/// One call inside a MultiSend batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultiSendCall {
    /// 0 = call, 1 = delegate call
    pub operation: u8,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

/// Packs `calls` into the MultiSend `transactions` argument.
///
/// Entries are packed back to back with no padding between them.
pub fn encode_multi_send(calls: &[MultiSendCall]) -> Bytes {
    let capacity = calls.iter().map(|call| 1 + 20 + 32 + 32 + call.data.len()).sum();
    let mut buf = Vec::with_capacity(capacity);
    for call in calls {
        buf.push(call.operation);
        buf.extend_from_slice(call.to.as_slice());
        buf.extend_from_slice(&call.value.to_be_bytes::<32>());
        buf.extend_from_slice(&U256::from(call.data.len()).to_be_bytes::<32>());
        buf.extend_from_slice(&call.data);
    }
    buf.into()
}
