use alloy_primitives::{B256, Bytes};
use alloy_signer_local::PrivateKeySigner;
use clap::{Parser, ValueEnum};
use eyre::{Result, WrapErr};
use safe_primitives::ProofSet;
use safe_signer::{EoaSigner, SigningMethod};
use tracing::info;

#[derive(Parser, Debug)]
pub(crate) struct SignArgs {
    /// Digest to sign, as printed by `tx-hash` or `message-hash`
    #[arg(long)]
    digest: B256,

    /// Owner private key
    #[arg(long, env = "SAFE_PRIVATE_KEY", hide_env_values = true)]
    private_key: PrivateKeySigner,

    #[arg(long, value_enum, default_value_t = Method::Digest)]
    method: Method,

    /// Composite signature collected so far; the new signature is merged into it
    #[arg(long)]
    merge: Option<Bytes>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Method {
    /// Sign the digest as is (transaction hashes)
    Digest,
    /// Sign with the Ethereum signed message prefix
    EthSign,
}

impl From<Method> for SigningMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Digest => Self::Digest,
            Method::EthSign => Self::EthSign,
        }
    }
}

impl SignArgs {
    pub(crate) async fn run(self) -> Result<()> {
        let signer = EoaSigner::new(self.private_key).with_method(self.method.into());
        let proof = signer.sign(self.digest).await?;
        info!(signer = %signer.address(), digest = %self.digest, "signed");

        let Some(existing) = &self.merge else {
            println!("{}", proof.to_bytes());
            return Ok(());
        };

        let mut proofs = ProofSet::new(self.digest);
        proofs
            .extend_from_bytes(existing)
            .wrap_err("existing signatures do not decode for this digest")?;
        proofs.insert(proof)?;
        let composite = proofs.aggregate(proofs.len())?;
        println!("{}", composite.as_bytes());
        Ok(())
    }
}
