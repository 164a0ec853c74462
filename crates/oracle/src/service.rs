//! Transaction-service client.
//!
//! Reads the multisig queue of a Safe from the transaction service REST API.

use alloy_primitives::{Address, U256};
use tracing::{debug, warn};

use crate::{PendingPage, PendingStore, StoreError};

/// Upper bound on followed `next` links for one query.
const MAX_PAGES: usize = 20;

/// Client for the transaction service of one chain.
#[derive(Clone, Debug)]
pub struct TransactionServiceClient {
    base_url: String,
    client: reqwest::Client,
}

impl TransactionServiceClient {
    /// `base_url` is the service root, e.g. `https://safe-transaction-gnosis-chain.safe.global`.
    pub fn new(base_url: &str) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// First page URL of the unexecuted multisig transactions of `wallet`.
    pub fn pending_url(&self, wallet: Address, nonce_from: Option<U256>) -> String {
        let mut url = format!(
            "{}/api/v1/safes/{}/multisig-transactions/?executed=false",
            self.base_url,
            wallet.to_checksum(None)
        );
        if let Some(nonce) = nonce_from {
            url.push_str(&format!("&nonce__gte={nonce}"));
        }
        url
    }

    async fn fetch(&self, url: &str) -> Result<PendingPage, StoreError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait::async_trait]
impl PendingStore for TransactionServiceClient {
    async fn pending_transactions(
        &self,
        wallet: Address,
        nonce_from: Option<U256>,
    ) -> Result<PendingPage, StoreError> {
        let mut page = self.fetch(&self.pending_url(wallet, nonce_from)).await?;

        let mut pages = 1;
        while let Some(next) = page.next.take() {
            if pages == MAX_PAGES {
                warn!(%wallet, pages, "pending queue truncated");
                break;
            }
            let more = self.fetch(&next).await?;
            page.results.extend(more.results);
            page.next = more.next;
            pages += 1;
        }
        debug!(%wallet, count = page.count, fetched = page.results.len(), "fetched pending transactions");

        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_pending_url() {
        let client = TransactionServiceClient::new("https://safe-transaction-sepolia.safe.global/");
        let wallet = address!("0xd53cd0aB83D845Ac265BE939c57F53AD838012c9");
        assert_eq!(
            client.pending_url(wallet, None),
            format!(
                "https://safe-transaction-sepolia.safe.global/api/v1/safes/{}/multisig-transactions/?executed=false",
                wallet.to_checksum(None)
            )
        );
        assert!(
            client
                .pending_url(wallet, Some(U256::from(12)))
                .ends_with("?executed=false&nonce__gte=12")
        );
    }
}
