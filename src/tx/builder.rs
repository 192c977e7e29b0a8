//! Transaction Builder
//!
//! Fills in the network-dependent fields of an EIP-1559 transaction.

use crate::chain::Chain;
use crate::error::HexlinkResult;
use crate::provider::ChainProvider;
use crate::types::OpInput;
use crate::utils::CallPolicy;
use ethers_core::types::{Address, Eip1559TransactionRequest};

/// Unsigned transaction for an operation input. A zero gas limit is left
/// unset so the sender estimates it.
pub fn tx_from_input(input: &OpInput) -> Eip1559TransactionRequest {
    let tx = Eip1559TransactionRequest::new()
        .to(input.to)
        .value(input.value)
        .data(input.call_data.clone());
    if input.call_gas_limit.is_zero() {
        tx
    } else {
        tx.gas(input.call_gas_limit)
    }
}

/// Populate chain id, sender, nonce and fees.
///
/// Fees are passed through from the provider. A missing priority fee becomes
/// zero and a missing max fee falls back to the chain's configured default.
pub async fn build_tx(
    provider: &dyn ChainProvider,
    policy: &CallPolicy,
    chain: &Chain,
    unsigned: Eip1559TransactionRequest,
    from: Address,
) -> HexlinkResult<Eip1559TransactionRequest> {
    let chain_id = policy.run("getNetwork", provider.chain_id()).await?;
    if chain_id != chain.id() {
        tracing::warn!(expected = chain.id(), reported = chain_id, "provider is on a different chain");
    }
    let nonce = policy.run("getTransactionCount", provider.transaction_count(from)).await?;
    let fee = policy.run("getFeeData", provider.fee_data()).await?;

    let max_priority_fee = fee.max_priority_fee_per_gas.unwrap_or_default();
    let max_fee = fee.max_fee_per_gas.unwrap_or_else(|| chain.default_max_fee());

    tracing::debug!(chain = chain.name, chain_id, %nonce, %max_fee, %max_priority_fee, "populated transaction");

    Ok(unsigned
        .chain_id(chain_id)
        .from(from)
        .nonce(nonce)
        .max_priority_fee_per_gas(max_priority_fee)
        .max_fee_per_gas(max_fee))
}
