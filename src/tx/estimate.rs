//! Transfer cost estimates

use crate::error::HexlinkResult;
use crate::provider::{ChainProvider, FeeData};
use crate::types::{u256_dec, OpInput};
use crate::utils::CallPolicy;
use ethers_core::types::U256;
use serde::{Deserialize, Serialize};

/// Fixed gas charged for a native transfer estimate
pub const ETH_TRANSFER_GAS: u64 = 23_000;

/// Cost at the current base fee and at the max fee, in wei
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferCost {
    #[serde(with = "u256_dec")]
    pub base_cost: U256,
    #[serde(with = "u256_dec")]
    pub max_cost: U256,
}

impl TransferCost {
    pub fn new(gas: U256, fee: &FeeData) -> Self {
        Self {
            base_cost: gas.saturating_mul(fee.base_fee_per_gas()),
            max_cost: gas.saturating_mul(fee.max_fee_per_gas.unwrap_or_default()),
        }
    }
}

pub async fn estimate_eth_transfer(provider: &dyn ChainProvider, policy: &CallPolicy) -> HexlinkResult<TransferCost> {
    let fee = policy.run("getFeeData", provider.fee_data()).await?;
    Ok(TransferCost::new(U256::from(ETH_TRANSFER_GAS), &fee))
}

/// Estimate `input` (an ERC-20 transfer executed by the wallet) against the chain
pub async fn estimate_erc20_transfer(
    provider: &dyn ChainProvider,
    policy: &CallPolicy,
    input: &OpInput,
) -> HexlinkResult<TransferCost> {
    let fee = policy.run("getFeeData", provider.fee_data()).await?;
    let gas = policy
        .run(
            "estimateGas",
            provider.estimate_gas(None, input.to, input.value, input.call_data.clone()),
        )
        .await?;
    Ok(TransferCost::new(gas, &fee))
}
