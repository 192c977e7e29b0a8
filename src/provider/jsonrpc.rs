use super::{ChainProvider, FeeData};
use crate::chain::Chain;
use crate::config::HexlinkConfig;
use crate::error::{HexlinkError, HexlinkResult};
use async_trait::async_trait;
use ethers_core::types::{Address, Bytes, U256};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};

/// Priority fee reported alongside the block base fee (1.5 gwei)
const DEFAULT_PRIORITY_FEE: u64 = 1_500_000_000;

/// HTTP JSON-RPC provider
pub struct JsonRpcProvider {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl JsonRpcProvider {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Provider for `chain` using the configured endpoint
    pub fn for_chain(config: &HexlinkConfig, chain: &Chain) -> HexlinkResult<Self> {
        Ok(Self::new(config.rpc_url(chain)?))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> HexlinkResult<T> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
        });

        tracing::debug!(method, "rpc request");
        let resp = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        if let Some(err) = resp.get("error") {
            let message = err["message"].as_str().unwrap_or("unknown error");
            return Err(HexlinkError::upstream(format!("{} failed: {}", method, message))
                .with_details(err.to_string()));
        }

        let result = resp
            .get("result")
            .cloned()
            .ok_or_else(|| HexlinkError::upstream(format!("{}: response has no result", method)))?;
        serde_json::from_value(result)
            .map_err(|e| HexlinkError::upstream(format!("{}: malformed result: {}", method, e)))
    }
}

/// `2 * base + priority`, clamped so a bogus base fee cannot overflow
fn max_fee_for(base: U256, priority: U256) -> U256 {
    base.saturating_mul(U256::from(2)).saturating_add(priority)
}

#[async_trait]
impl ChainProvider for JsonRpcProvider {
    async fn chain_id(&self) -> HexlinkResult<u64> {
        let id: U256 = self.request("eth_chainId", json!([])).await?;
        u64::try_from(id).map_err(|_| HexlinkError::upstream(format!("chain id out of range: {}", id)))
    }

    async fn transaction_count(&self, address: Address) -> HexlinkResult<U256> {
        self.request("eth_getTransactionCount", json!([address, "latest"])).await
    }

    async fn fee_data(&self) -> HexlinkResult<FeeData> {
        let block: Value = self.request("eth_getBlockByNumber", json!(["latest", false])).await?;

        // Pre-London chains report no base fee; leave the EIP-1559 fields empty
        let base_fee = block
            .get("baseFeePerGas")
            .and_then(|v| serde_json::from_value::<U256>(v.clone()).ok());

        let (max_fee_per_gas, max_priority_fee_per_gas) = match base_fee {
            Some(base) => {
                let priority = U256::from(DEFAULT_PRIORITY_FEE);
                (Some(max_fee_for(base, priority)), Some(priority))
            }
            None => (None, None),
        };

        Ok(FeeData {
            max_fee_per_gas,
            max_priority_fee_per_gas,
        })
    }

    async fn call(&self, to: Address, data: Bytes) -> HexlinkResult<Bytes> {
        self.request("eth_call", json!([{ "to": to, "data": data }, "latest"])).await
    }

    async fn estimate_gas(&self, from: Option<Address>, to: Address, value: U256, data: Bytes) -> HexlinkResult<U256> {
        let mut tx = json!({ "to": to, "value": value, "data": data });
        if let Some(from) = from {
            tx["from"] = json!(from);
        }
        self.request("eth_estimateGas", json!([tx])).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_new_provider() {
        let provider = JsonRpcProvider::new("http://127.0.0.1:8545");
        assert_eq!(provider.url(), "http://127.0.0.1:8545");
    }

    #[test]
    fn test_max_fee_saturates() {
        let priority = U256::from(DEFAULT_PRIORITY_FEE);
        assert_eq!(max_fee_for(U256::from(10), priority), U256::from(1_500_000_020u64));
        assert_eq!(max_fee_for(U256::MAX, priority), U256::MAX);
        assert_eq!(max_fee_for(U256::MAX / 2, priority), U256::MAX);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_upstream_error() {
        // Port 9 (discard) on localhost is closed in test environments
        let provider = JsonRpcProvider::new("http://127.0.0.1:9");
        let err = provider.chain_id().await.unwrap_err();
        assert!(matches!(err.code, ErrorCode::UpstreamUnavailable | ErrorCode::Timeout));
    }
}
