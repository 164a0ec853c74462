use alloy_primitives::{Address, B256, Bytes};
use clap::Parser;
use eyre::{Result, WrapErr};
use safe_primitives::{
    eip191_message_hash, nested_wallet_digest, safe_message_digest, safe_message_preimage,
};

#[derive(Parser, Debug)]
pub(crate) struct MessageHashArgs {
    /// Safe address (EIP-712 verifying contract)
    #[arg(long)]
    safe: Address,

    #[arg(long)]
    chain_id: u64,

    /// Message to hash, UTF-8 unless --hex is set
    #[arg(required_unless_present_any = ["parent", "parent_data"], conflicts_with_all = ["parent", "parent_data"])]
    message: Option<String>,

    /// Treat the message as 0x-prefixed hex bytes
    #[arg(long)]
    hex: bool,

    /// Hash a parent Safe's digest the way this Safe signs it as an owner
    #[arg(long, conflicts_with = "parent_data")]
    parent: Option<B256>,

    /// Same, for a Safe 1.3.0 / 1.4.1 parent that passes the preimage of its digest
    #[arg(long)]
    parent_data: Option<Bytes>,
}

impl MessageHashArgs {
    fn message_bytes(&self) -> Result<Option<Bytes>> {
        let Some(message) = &self.message else {
            return Ok(None);
        };
        if self.hex {
            let bytes = message
                .parse::<Bytes>()
                .wrap_err("message is not valid hex")?;
            return Ok(Some(bytes));
        }
        Ok(Some(Bytes::copy_from_slice(message.as_bytes())))
    }

    pub(crate) fn run(self) -> Result<()> {
        if let Some(parent) = self.parent {
            println!("{}", nested_wallet_digest(self.safe, self.chain_id, parent));
            return Ok(());
        }
        if let Some(data) = &self.parent_data {
            println!("{}", safe_message_digest(self.safe, self.chain_id, data));
            println!("forwarded data: {}", safe_message_preimage(self.safe, self.chain_id, data));
            return Ok(());
        }

        if let Some(message) = self.message_bytes()? {
            println!("Safe message hash: {}", safe_message_digest(self.safe, self.chain_id, &message));
            println!("EIP-191 hash:      {}", eip191_message_hash(&message));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_forms_are_exclusive() {
        let safe = "0x1111111111111111111111111111111111111111";
        let data = format!("0x1901{}", "ab".repeat(64));
        let args = MessageHashArgs::try_parse_from([
            "message-hash",
            "--safe",
            safe,
            "--chain-id",
            "1",
            "--parent-data",
            &data,
        ])
        .unwrap();
        assert_eq!(args.parent_data.map(|data| data.len()), Some(66));

        let both = MessageHashArgs::try_parse_from([
            "message-hash",
            "--safe",
            safe,
            "--chain-id",
            "1",
            "--parent",
            "0x0000000000000000000000000000000000000000000000000000000000000001",
            "--parent-data",
            &data,
        ]);
        assert!(both.is_err());
    }
}
