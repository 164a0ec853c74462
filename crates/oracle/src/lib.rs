//! Authorization checks for Safe digests.
//!
//! [`AuthorizationOracle`] asks the wallet's ERC-1271 handler through a [`ChainCaller`] and
//! looks for a matching proposal in a [`PendingStore`]. [`RpcCaller`] and
//! [`TransactionServiceClient`] are the network implementations of those two boundaries.
//!
//! [`ChainCaller`]: safe_primitives::ChainCaller
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod metrics;
mod oracle;
mod rpc;
mod service;
mod store;
mod verdict;

pub use metrics::OracleMetrics;
pub use oracle::{AuthorizationOracle, AuthorizationStatus, PendingMatch};
pub use rpc::RpcCaller;
pub use service::TransactionServiceClient;
pub use store::{
    Confirmation, DataDecoded, DecodedParameter, PendingPage, PendingStore, PendingTransaction,
    StoreError,
};
pub use verdict::CallVerdict;
