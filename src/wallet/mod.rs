//! Wallet Module
//!
//! Email-addressed smart wallets: salt derivation, CREATE2 implementation
//! address, wallet address prediction through the admin contract, and amount
//! normalization for transfers out of a wallet.

mod amount;
mod derivation;

pub use amount::*;
pub use derivation::*;
