use std::str::FromStr;

use alloy_primitives::{Address, Bytes, U256};
use clap::Parser;
use eyre::{Result, bail};
use safe_primitives::{Call, Operation, SafeTransaction, chain_id_to_network, safe_tx_digest};
use tracing::warn;

#[derive(Parser, Debug)]
pub(crate) struct TxHashArgs {
    /// Safe address (EIP-712 verifying contract)
    #[arg(long)]
    safe: Address,

    #[arg(long)]
    chain_id: u64,

    /// Call target; conflicts with --call
    #[arg(long, conflicts_with = "calls")]
    to: Option<Address>,

    /// Wei sent with the call
    #[arg(long, default_value = "0", requires = "to")]
    value: U256,

    /// Call data
    #[arg(long, default_value = "0x", requires = "to")]
    data: Bytes,

    /// Execute the call with DELEGATECALL
    #[arg(long, requires = "to")]
    delegate_call: bool,

    /// One call of a MultiSend batch as `to[,value[,data]]`; repeat for each call
    #[arg(long = "call", value_name = "CALL")]
    calls: Vec<CallArg>,

    #[arg(long)]
    nonce: U256,

    #[arg(long, default_value = "0")]
    safe_tx_gas: U256,

    #[arg(long, default_value = "0")]
    base_gas: U256,

    #[arg(long, default_value = "0")]
    gas_price: U256,

    #[arg(long, default_value_t = Address::ZERO)]
    gas_token: Address,

    #[arg(long, default_value_t = Address::ZERO)]
    refund_receiver: Address,

    /// Also print the transaction as JSON
    #[arg(short, long)]
    verbose: bool,
}

/// A batch entry given on the command line.
#[derive(Clone, Debug)]
struct CallArg(Call);

impl FromStr for CallArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',');
        let to = parts
            .next()
            .unwrap_or_default()
            .parse::<Address>()
            .map_err(|err| format!("invalid call target: {err}"))?;
        let value = match parts.next() {
            Some(value) => value
                .parse::<U256>()
                .map_err(|err| format!("invalid call value: {err}"))?,
            None => U256::ZERO,
        };
        let data = match parts.next() {
            Some(data) => data
                .parse::<Bytes>()
                .map_err(|err| format!("invalid call data: {err}"))?,
            None => Bytes::new(),
        };
        if parts.next().is_some() {
            return Err(format!("expected to[,value[,data]], got {s}"));
        }
        Ok(Self(Call { to, value, data }))
    }
}

impl TxHashArgs {
    fn transaction(&self) -> Result<SafeTransaction> {
        let mut tx = match self.to {
            Some(to) => SafeTransaction {
                to,
                value: self.value,
                data: self.data.clone(),
                operation: if self.delegate_call {
                    Operation::DelegateCall
                } else {
                    Operation::Call
                },
                nonce: self.nonce,
                ..Default::default()
            },
            None if self.calls.is_empty() => bail!("pass --to or at least one --call"),
            None => {
                let calls: Vec<Call> = self.calls.iter().map(|call| call.0.clone()).collect();
                SafeTransaction::batch(&calls, self.nonce)?
            }
        };
        tx.safe_tx_gas = self.safe_tx_gas;
        tx.base_gas = self.base_gas;
        tx.gas_price = self.gas_price;
        tx.gas_token = self.gas_token;
        tx.refund_receiver = self.refund_receiver;
        Ok(tx)
    }

    pub(crate) fn run(self) -> Result<()> {
        if let Err(err) = chain_id_to_network(self.chain_id) {
            warn!(%err, "hashing for a chain outside the network table");
        }

        let tx = self.transaction()?;
        if self.verbose {
            println!("{}", serde_json::to_string_pretty(&tx)?);
        }
        println!("{}", safe_tx_digest(self.safe, self.chain_id, &tx));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: TxHashArgs,
    }

    fn parse(args: &[&str]) -> TxHashArgs {
        let mut argv = vec![
            "tx-hash",
            "--safe",
            "0x5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a",
            "--chain-id",
            "100",
            "--nonce",
            "3",
        ];
        argv.extend_from_slice(args);
        Wrapper::try_parse_from(argv).unwrap().args
    }

    #[test]
    fn test_single_call() {
        let args = parse(&[
            "--to",
            "0x1111111111111111111111111111111111111111",
            "--value",
            "5",
            "--delegate-call",
        ]);
        let tx = args.transaction().unwrap();
        assert_eq!(tx.to, Address::repeat_byte(0x11));
        assert_eq!(tx.value, U256::from(5));
        assert_eq!(tx.operation, Operation::DelegateCall);
        assert_eq!(tx.nonce, U256::from(3));
    }

    #[test]
    fn test_batch_matches_library() {
        let args = parse(&[
            "--call",
            "0x1111111111111111111111111111111111111111,1",
            "--call",
            "0x2222222222222222222222222222222222222222,0,0xa9059cbb",
        ]);
        let expected = SafeTransaction::batch(
            &[
                Call {
                    to: Address::repeat_byte(0x11),
                    value: U256::from(1),
                    data: Bytes::new(),
                },
                Call {
                    to: Address::repeat_byte(0x22),
                    value: U256::ZERO,
                    data: Bytes::from_static(&[0xa9, 0x05, 0x9c, 0xbb]),
                },
            ],
            U256::from(3),
        )
        .unwrap();
        assert_eq!(args.transaction().unwrap(), expected);
    }

    #[test]
    fn test_call_syntax() {
        assert!("0x11".parse::<CallArg>().is_err());
        assert!(
            "0x1111111111111111111111111111111111111111,1,0x,extra"
                .parse::<CallArg>()
                .is_err()
        );
        assert!(parse(&[]).transaction().is_err());
    }
}
