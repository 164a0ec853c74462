//! Authorization status of a digest for a Safe.
//!
//! Three sources are consulted: proofs the caller already holds, the wallet's ERC-1271
//! handler on chain, and the queue of proposed transactions in a pending store.

use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::{SolCall, SolValue};
use safe_contracts::{ISafe, ISignatureValidator};
use safe_primitives::{CallFailure, ChainCaller, ProofSet, SafeWallet};
use tracing::{debug, trace, warn};

use crate::{CallVerdict, OracleMetrics, PendingStore, PendingTransaction, StoreError};

/// A pending transaction whose digest is the one asked about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingMatch {
    /// Digest of the matched transaction as recomputed locally, or as the store reports it
    /// when the transaction does not decode.
    pub safe_tx_hash: B256,
    pub transaction: PendingTransaction,
    /// Owners that already confirmed the transaction.
    pub confirmations: Vec<Address>,
}

/// Where a digest stands for a wallet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthorizationStatus {
    /// The locally held proofs already reach the threshold.
    Collected { signers: Vec<Address> },
    /// The wallet accepts the digest on chain.
    OnChain,
    /// A proposed transaction for the digest is waiting for confirmations.
    Pending {
        safe_tx_hash: B256,
        confirmations: Vec<Address>,
        required: usize,
    },
    Unauthorized,
}

impl AuthorizationStatus {
    pub const fn is_authorized(&self) -> bool {
        matches!(self, Self::Collected { .. } | Self::OnChain)
    }
}

/// Answers whether a digest is authorized for a wallet.
#[derive(Debug)]
pub struct AuthorizationOracle<C, S> {
    caller: C,
    store: S,
    chain_id: u64,
    metrics: OracleMetrics,
}

impl<C: ChainCaller, S: PendingStore> AuthorizationOracle<C, S> {
    pub fn new(caller: C, store: S, chain_id: u64) -> Self {
        Self {
            caller,
            store,
            chain_id,
            metrics: OracleMetrics::default(),
        }
    }

    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub const fn caller(&self) -> &C {
        &self.caller
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Asks `verifier` whether `signature` is valid for `digest`.
    pub async fn is_valid_signature(
        &self,
        verifier: Address,
        digest: B256,
        signature: Bytes,
    ) -> CallVerdict {
        let data = ISignatureValidator::isValidSignatureCall {
            _hash: digest,
            _signature: signature,
        }
        .abi_encode();
        let result = self.caller.call(verifier, data.into()).await;
        let verdict = CallVerdict::from_result(&result);

        if let Err(failure) = &result {
            trace!(%verifier, %digest, reason = %failure.reason, revert_data = %failure.revert_data, "isValidSignature failed");
        }
        debug!(%verifier, %digest, verdict = verdict.as_str(), "isValidSignature");
        self.metrics.record_verdict(verdict);

        verdict
    }

    /// Whether `wallet` accepts `digest` without a signature, i.e. the digest was signed
    /// on chain through `signMessage`.
    pub async fn is_authorized(&self, wallet: Address, digest: B256) -> bool {
        self.is_valid_signature(wallet, digest, Bytes::new())
            .await
            .is_authorized()
    }

    /// Reads the `approvedHashes` mapping of `wallet`.
    pub async fn is_hash_approved(
        &self,
        wallet: Address,
        owner: Address,
        digest: B256,
    ) -> Result<bool, CallFailure> {
        let data = ISafe::approvedHashesCall { owner, hash: digest }.abi_encode();
        let output = self.caller.call(wallet, data.into()).await?;
        let approved = U256::abi_decode(&output).map_err(|err| {
            CallFailure::new(format!("undecodable approvedHashes output: {err}"), output)
        })?;
        Ok(!approved.is_zero())
    }

    /// First unexecuted transaction of `wallet` whose digest is `digest`.
    ///
    /// A candidate matches when it is a `signMessage` call over the digest, or when its
    /// `SafeTx` digest recomputes to the digest.
    pub async fn pending_match(
        &self,
        wallet: Address,
        digest: B256,
    ) -> Result<Option<PendingMatch>, StoreError> {
        let page = self.store.pending_transactions(wallet, None).await?;
        debug!(%wallet, %digest, candidates = page.results.len(), "checking pending transactions");

        let found = page
            .results
            .into_iter()
            .find_map(|candidate| self.matches(wallet, digest, candidate));
        self.metrics.record_pending_lookup(found.is_some());

        Ok(found)
    }

    pub async fn is_pending(&self, wallet: Address, digest: B256) -> Result<bool, StoreError> {
        Ok(self.pending_match(wallet, digest).await?.is_some())
    }

    fn matches(
        &self,
        wallet: Address,
        digest: B256,
        candidate: PendingTransaction,
    ) -> Option<PendingMatch> {
        let computed = match candidate.to_safe_transaction() {
            Ok(tx) => Some(tx.digest(wallet, self.chain_id)),
            Err(err) => {
                warn!(%wallet, nonce = %candidate.nonce, %err, "pending transaction does not decode as a SafeTx");
                None
            }
        };
        if let (Some(reported), Some(computed)) = (candidate.safe_tx_hash, computed)
            && reported != computed
        {
            warn!(%wallet, %reported, %computed, "pending store reports a different safeTxHash");
        }

        // a signMessage over the digest matches whatever the rest of the transaction holds
        let signs_digest = candidate
            .signed_message()
            .is_some_and(|message| message.as_ref() == digest.as_slice());
        if !signs_digest && computed != Some(digest) {
            return None;
        }

        let safe_tx_hash = computed.or(candidate.safe_tx_hash).unwrap_or(digest);
        Some(PendingMatch {
            safe_tx_hash,
            confirmations: candidate.confirmation_owners(),
            transaction: candidate,
        })
    }

    /// Reconciles local proofs, on-chain state and the pending store, in that order.
    ///
    /// Only local proofs from current owners count towards the threshold.
    pub async fn status(
        &self,
        wallet: &SafeWallet,
        digest: B256,
        local: &ProofSet,
    ) -> Result<AuthorizationStatus, StoreError> {
        if local.digest() == digest {
            let signers: Vec<Address> = local
                .signers()
                .filter(|signer| wallet.is_owner(signer))
                .copied()
                .collect();
            if signers.len() < local.len() {
                debug!(
                    wallet = %wallet.address(),
                    ignored = local.len() - signers.len(),
                    "ignoring local proofs from non-owners"
                );
            }
            if signers.len() >= wallet.threshold() {
                return Ok(AuthorizationStatus::Collected { signers });
            }
        }

        if self.is_authorized(wallet.address(), digest).await {
            return Ok(AuthorizationStatus::OnChain);
        }

        Ok(match self.pending_match(wallet.address(), digest).await? {
            Some(found) => AuthorizationStatus::Pending {
                safe_tx_hash: found.safe_tx_hash,
                required: found
                    .transaction
                    .confirmations_required
                    .unwrap_or(wallet.threshold()),
                confirmations: found.confirmations,
            },
            None => AuthorizationStatus::Unauthorized,
        })
    }
}
