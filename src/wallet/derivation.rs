//! Deterministic wallet addressing
//!
//! Every email maps to one wallet. The wallet is a clone of a single
//! implementation contract, deployed by the admin contract with CREATE2 under
//! `salt = keccak256("mailto:" + email)`. Because the admin decides the clone
//! address, the prediction is always read from the admin contract and never
//! recomputed locally.

use crate::abi::{decode_address, FunctionCall};
use crate::config::HexlinkConfig;
use crate::error::HexlinkResult;
use crate::provider::ChainProvider;
use crate::utils::logging::{redact_address, redact_email};
use crate::utils::{checksum, keccak256, keccak256_h256, parse_address, CallPolicy};
use ethers_core::types::{Address, H256};
use ethers_core::utils::get_create2_address_from_hash;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Canonical form of an email before hashing: surrounding whitespace removed,
/// ASCII letters lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// `keccak256("mailto:" + normalize_email(email))`
pub fn derive_salt(email: &str) -> H256 {
    keccak256_h256(format!("mailto:{}", normalize_email(email)).as_bytes())
}

/// CREATE2 address of the wallet implementation deployed by `admin` with a
/// zero salt
pub fn wallet_implementation_address(admin: Address, bytecode: &[u8]) -> Address {
    get_create2_address_from_hash(admin, H256::zero(), keccak256(bytecode))
}

/// Ask the admin contract where the clone for `salt` lives
pub async fn predict_wallet_address(
    provider: &dyn ChainProvider,
    policy: &CallPolicy,
    admin: Address,
    implementation: Address,
    salt: H256,
) -> HexlinkResult<Address> {
    let data = FunctionCall::admin_predict_wallet_address(implementation, salt);
    let output = policy.run("predictWalletAddress", provider.call(admin, data)).await?;
    decode_address(&output)
}

/// Everything derived from an email. Never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletIdentity {
    pub email: String,
    pub salt: H256,
    pub implementation_address: Address,
    pub predicted_address: Address,
}

/// Wallet addressing bound to one admin deployment and one chain provider
pub struct WalletDeriver {
    admin: Address,
    implementation: Address,
    provider: Arc<dyn ChainProvider>,
    policy: CallPolicy,
}

impl WalletDeriver {
    pub fn new(config: &HexlinkConfig, provider: Arc<dyn ChainProvider>) -> Self {
        Self {
            admin: config.admin,
            implementation: wallet_implementation_address(config.admin, &config.wallet_bytecode),
            provider,
            policy: config.call_policy,
        }
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn implementation_address(&self) -> Address {
        self.implementation
    }

    pub async fn wallet_address(&self, email: &str) -> HexlinkResult<Address> {
        let salt = derive_salt(email);
        let predicted =
            predict_wallet_address(self.provider.as_ref(), &self.policy, self.admin, self.implementation, salt).await?;
        tracing::debug!(
            email = %redact_email(email),
            wallet = %redact_address(checksum(&predicted)),
            "predicted wallet address"
        );
        Ok(predicted)
    }

    pub async fn identity(&self, email: &str) -> HexlinkResult<WalletIdentity> {
        let predicted_address = self.wallet_address(email).await?;
        Ok(WalletIdentity {
            email: normalize_email(email),
            salt: derive_salt(email),
            implementation_address: self.implementation,
            predicted_address,
        })
    }

    /// A well-formed address is returned as-is; anything else is treated as
    /// an email and resolved to its wallet
    pub async fn resolve_destination(&self, email_or_address: &str) -> HexlinkResult<Address> {
        match parse_address(email_or_address.trim()) {
            Some(address) => Ok(address),
            None => self.wallet_address(email_or_address).await,
        }
    }
}
