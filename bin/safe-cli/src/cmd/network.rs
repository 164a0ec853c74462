use clap::Parser;
use eyre::Result;
use safe_primitives::{NetworkInfo, chain::NETWORKS, chain_id_to_network};

#[derive(Parser, Debug)]
pub(crate) struct NetworkArgs {
    /// Chain id to look up; lists every supported chain when omitted
    chain_id: Option<u64>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table")]
    format: String,
}

impl NetworkArgs {
    pub(crate) fn run(self) -> Result<()> {
        let rows: Vec<&NetworkInfo> = match self.chain_id {
            Some(chain_id) => vec![chain_id_to_network(chain_id)?],
            None => NETWORKS.iter().collect(),
        };

        if self.format == "json" {
            let data: Vec<_> = rows
                .iter()
                .map(|info| {
                    serde_json::json!({
                        "chain_id": info.chain_id,
                        "chain": info.chain,
                        "network": info.network,
                        "default_p256_verifier": info.default_p256_verifier,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&data)?);
            return Ok(());
        }

        println!("{:<10} {:<9} {:<8} P-256 verifier", "chain id", "chain", "network");
        for info in rows {
            println!(
                "{:<10} {:<9} {:<8} {}",
                info.chain_id,
                info.chain.to_string(),
                info.network.to_string(),
                info.default_p256_verifier
            );
        }
        Ok(())
    }
}
