use alloy_primitives::{Address, Bytes};
use alloy_provider::Provider;
use alloy_rpc_types_eth::{TransactionInput, TransactionRequest};
use alloy_transport::TransportError;
use safe_primitives::{CallFailure, ChainCaller};
use tracing::trace;

/// [`ChainCaller`] over an alloy provider, using `eth_call` at the latest block.
#[derive(Clone, Debug)]
pub struct RpcCaller<P> {
    provider: P,
}

impl<P> RpcCaller<P> {
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }

    pub const fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait::async_trait]
impl<P: Provider> ChainCaller for RpcCaller<P> {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, CallFailure> {
        let request = TransactionRequest::default()
            .to(to)
            .input(TransactionInput::new(data));
        let result = self.provider.call(request).await;
        trace!(%to, ok = result.is_ok(), "eth_call");
        result.map_err(call_failure)
    }
}

/// Keeps the revert data of JSON-RPC execution errors; anything else is a transport failure.
fn call_failure(err: TransportError) -> CallFailure {
    let revert_data = err
        .as_error_resp()
        .and_then(|payload| payload.as_revert_data())
        .unwrap_or_default();
    CallFailure::new(err.to_string(), revert_data)
}
