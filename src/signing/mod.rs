//! Validator signatures
//!
//! Claims are authorized by the red packet's validator: a signature over a
//! 32-byte message that the red packet contract checks with EIP-191 recovery.
//! The backend holds exactly two validator authorities, a local hot wallet
//! and a role-scoped key in a managed key service. A validator address that
//! matches neither is rejected before anything is signed.

mod authorities;

pub use authorities::*;

use crate::error::{HexlinkError, HexlinkResult};
use crate::utils::checksum;
use crate::utils::logging::redact_address;
use async_trait::async_trait;
use ethers_core::types::{Address, Signature, H256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Logical key held by the key service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyRole {
    Validator,
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyRole::Validator => f.write_str("validator"),
        }
    }
}

/// Managed key service: signs raw digests with the key bound to a role
#[async_trait]
pub trait KeyService: Send + Sync {
    fn public_address(&self, role: KeyRole) -> HexlinkResult<Address>;

    async fn sign_digest(&self, role: KeyRole, digest: H256) -> HexlinkResult<Signature>;
}

/// Something that produces an EIP-191 signature over a 32-byte message
#[async_trait]
pub trait MessageSigner: Send + Sync {
    fn address(&self) -> Address;

    async fn sign_message(&self, message: H256) -> HexlinkResult<Signature>;
}

/// Maps a validator address to the signer allowed to act for it
pub trait SignerResolver: Send + Sync {
    fn resolve_signer(&self, address: Address) -> Option<Arc<dyn MessageSigner>>;
}

/// Sign `message` as `signer`, or fail with `InvalidValidator` if no
/// authority is registered for that address
pub async fn sign_as(resolver: &dyn SignerResolver, signer: Address, message: H256) -> HexlinkResult<Signature> {
    let Some(authority) = resolver.resolve_signer(signer) else {
        tracing::warn!(validator = %redact_address(checksum(&signer)), "no signing authority for validator");
        return Err(HexlinkError::invalid_validator(signer));
    };
    authority.sign_message(message).await
}
