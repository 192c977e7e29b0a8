//! Contract ABI surface
//!
//! Calldata encoders for the wallet, admin, red packet and token contracts,
//! plus the event definitions the receipt parser matches against. Encoding
//! and decoding go through `ethers_core::abi`.

mod calls;
mod events;

pub use calls::*;
pub use events::*;
