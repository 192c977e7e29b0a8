//! Chain access
//!
//! `ChainProvider` is the read side of a chain as the core needs it: network
//! id, nonces, fee data, view calls and gas estimates. `JsonRpcProvider` is the
//! reference implementation over HTTP JSON-RPC.

mod jsonrpc;

pub use jsonrpc::JsonRpcProvider;

use crate::error::HexlinkResult;
use async_trait::async_trait;
use ethers_core::types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// EIP-1559 fee data as reported by the provider. Fields the node cannot
/// supply stay `None`; callers pick the fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeData {
    pub max_fee_per_gas: Option<U256>,
    pub max_priority_fee_per_gas: Option<U256>,
}

impl FeeData {
    /// `max_fee - priority`, or zero when either is missing
    pub fn base_fee_per_gas(&self) -> U256 {
        match self.max_fee_per_gas {
            Some(max) => max.saturating_sub(self.max_priority_fee_per_gas.unwrap_or_default()),
            None => U256::zero(),
        }
    }
}

#[async_trait]
pub trait ChainProvider: Send + Sync {
    async fn chain_id(&self) -> HexlinkResult<u64>;

    async fn transaction_count(&self, address: Address) -> HexlinkResult<U256>;

    async fn fee_data(&self) -> HexlinkResult<FeeData>;

    /// `eth_call` against the latest block
    async fn call(&self, to: Address, data: Bytes) -> HexlinkResult<Bytes>;

    async fn estimate_gas(&self, from: Option<Address>, to: Address, value: U256, data: Bytes) -> HexlinkResult<U256>;
}
