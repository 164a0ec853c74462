use std::sync::Arc;

use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_sol_types::SolCall;
use clap::Parser;
use eyre::{Result, WrapErr};
use safe_contracts::ISafe;
use safe_oracle::{
    AuthorizationOracle, AuthorizationStatus, PendingPage, PendingStore, RpcCaller, StoreError,
    TransactionServiceClient,
};
use safe_primitives::{ChainCaller, ProofSet, SafeWallet, SignerKinds};
use safe_signer::shared::read_slot;
use tracing::{debug, info};

use crate::{config::ConnectionArgs, retry::with_retry};

#[derive(Parser, Debug)]
pub(crate) struct StatusArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Safe address
    #[arg(long)]
    safe: Address,

    /// Digest to check
    #[arg(long)]
    digest: B256,

    /// Signatures already collected for the digest
    #[arg(long)]
    signatures: Option<Bytes>,

    /// Owner whose on-chain `approveHash` to check; repeat for several owners
    #[arg(long = "owner")]
    owners: Vec<Address>,
}

/// Stands in for the transaction service when none is configured.
struct NoPendingStore;

#[async_trait::async_trait]
impl PendingStore for NoPendingStore {
    async fn pending_transactions(
        &self,
        wallet: Address,
        _nonce_from: Option<U256>,
    ) -> Result<PendingPage, StoreError> {
        debug!(%wallet, "no transaction service configured, skipping pending lookup");
        Ok(PendingPage::default())
    }
}

impl StatusArgs {
    pub(crate) async fn run(self) -> Result<()> {
        let endpoints = self.connection.resolve()?;
        let provider = ProviderBuilder::new()
            .connect(&endpoints.rpc_url)
            .await
            .wrap_err_with(|| format!("failed to connect to {}", endpoints.rpc_url))?;

        let chain_id = match endpoints.chain_id {
            Some(chain_id) => chain_id,
            None => {
                let provider = &provider;
                with_retry("eth_chainId", || async move {
                    Ok(provider.get_chain_id().await?)
                })
                .await?
            }
        };
        let caller = Arc::new(RpcCaller::new(provider));

        let wallet = load_wallet(caller.as_ref(), self.safe).await?;
        info!(
            safe = %wallet.address(),
            chain_id,
            owners = wallet.owners().len(),
            threshold = wallet.threshold(),
            nonce = %wallet.nonce(),
            "loaded Safe"
        );

        let kinds = SignerKinds::new().with_shared(endpoints.shared_signer);
        let mut local = ProofSet::with_kinds(self.digest, kinds);
        if let Some(signatures) = &self.signatures {
            local
                .extend_from_bytes(signatures)
                .wrap_err("--signatures do not decode for this digest")?;
        }

        let status = match &endpoints.tx_service_url {
            Some(url) => {
                let oracle =
                    AuthorizationOracle::new(caller.clone(), TransactionServiceClient::new(url), chain_id);
                check(&oracle, &wallet, self.digest, &local).await?
            }
            None => {
                let oracle = AuthorizationOracle::new(caller.clone(), NoPendingStore, chain_id);
                check(&oracle, &wallet, self.digest, &local).await?
            }
        };

        println!("Safe {} on chain {chain_id}", wallet.address());
        println!("  threshold: {}/{}", wallet.threshold(), wallet.owners().len());
        println!("  digest:    {}", self.digest);
        match status {
            AuthorizationStatus::Collected { signers } => {
                println!("  status:    signatures collected ({} signers)", signers.len());
            }
            AuthorizationStatus::OnChain => println!("  status:    authorized on chain"),
            AuthorizationStatus::Pending {
                safe_tx_hash,
                confirmations,
                required,
            } => {
                println!("  status:    pending ({}/{required} confirmations)", confirmations.len());
                println!("  safeTxHash {safe_tx_hash}");
                for owner in confirmations {
                    println!("    confirmed by {owner}");
                }
            }
            AuthorizationStatus::Unauthorized => println!("  status:    not authorized"),
        }

        if !self.owners.is_empty() {
            let oracle = AuthorizationOracle::new(caller.clone(), NoPendingStore, chain_id);
            for owner in &self.owners {
                let (oracle, owner, digest, safe) = (&oracle, *owner, self.digest, wallet.address());
                let approved = with_retry("approvedHashes", || async move {
                    Ok(oracle.is_hash_approved(safe, owner, digest).await?)
                })
                .await?;
                println!("  approveHash by {owner}: {approved}");
            }
        }

        if wallet.is_owner(&endpoints.shared_signer) {
            let (caller, shared, safe) = (caller.as_ref(), endpoints.shared_signer, wallet.address());
            let slot = with_retry("getConfiguration", || async move {
                Ok(read_slot(caller, shared, safe).await?)
            })
            .await?;
            println!("  shared signer {shared}:");
            println!("    x:         {}", slot.x);
            println!("    y:         {}", slot.y);
            println!("    verifiers: {:#x}", slot.verifiers);
        }

        Ok(())
    }
}

async fn check<C: ChainCaller, S: PendingStore>(
    oracle: &AuthorizationOracle<C, S>,
    wallet: &SafeWallet,
    digest: B256,
    local: &ProofSet,
) -> Result<AuthorizationStatus> {
    with_retry("authorization status", || async move {
        Ok(oracle.status(wallet, digest, local).await?)
    })
    .await
}

/// Reads owners, threshold and nonce of `safe`.
async fn load_wallet(caller: &dyn ChainCaller, safe: Address) -> Result<SafeWallet> {
    let owners = view(caller, safe, ISafe::getOwnersCall {}).await?;
    let threshold = view(caller, safe, ISafe::getThresholdCall {}).await?;
    let nonce = view(caller, safe, ISafe::nonceCall {}).await?;

    let threshold = u64::try_from(threshold).wrap_err("threshold out of range")?;
    Ok(SafeWallet::new(safe, owners, threshold as usize, nonce)?)
}

async fn view<C: SolCall>(caller: &dyn ChainCaller, safe: Address, call: C) -> Result<C::Return> {
    let data: Bytes = call.abi_encode().into();
    let output = with_retry(C::SIGNATURE, || {
        let data = data.clone();
        async move { Ok(caller.call(safe, data).await?) }
    })
    .await?;
    C::abi_decode_returns(&output).wrap_err_with(|| format!("undecodable {} output", C::SIGNATURE))
}
