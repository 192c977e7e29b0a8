//! Hexlink Core Library
//!
//! Off-chain core of an email-addressable smart-contract wallet.
//!
//! # Architecture
//!
//! This crate provides:
//! - **wallet**: email salts, CREATE2 wallet addressing, amount scaling
//! - **redpacket**: red packet parameters and deterministic ids
//! - **tx**: operation intents, EIP-1559 population, transfer estimates
//! - **events**: locating and decoding awaited events in receipts
//! - **reconcile**: idempotent datastore updates from mined operations
//! - **service**: callable entry points answering `{code, message}`
//!
//! Collaborators owned by the host (datastore, operation queue, request
//! preprocessor, key service, chain provider) are traits; `testing` ships
//! in-memory versions of each.
//!
//! # Example
//!
//! ```rust,ignore
//! use hexlink_core::wallet::derive_salt;
//!
//! let salt = derive_salt("Alice@Example.com");
//! println!("salt: {:?}", salt);
//! ```

pub mod abi;
pub mod chain;
pub mod config;
pub mod error;
pub mod events;
pub mod provider;
pub mod reconcile;
pub mod redpacket;
pub mod service;
pub mod signing;
pub mod store;
pub mod testing;
pub mod tx;
pub mod types;
pub mod utils;
pub mod wallet;

// Re-export key types for convenience
pub use chain::{Chain, ChainRef};
pub use config::HexlinkConfig;
pub use error::{ErrorCode, HexlinkError, HexlinkResult};
pub use types::*;

pub use events::EventLookup;
pub use reconcile::{ActionOutcome, ActionReport, Reconciler};
pub use redpacket::{redpacket_erc721_id, redpacket_id, RedPacket, RedPacketErc721};
pub use service::HexlinkService;
pub use tx::{build_tx, IntentBuilder};
pub use wallet::{derive_salt, normalize_amount_to_send, wallet_implementation_address, WalletDeriver};
