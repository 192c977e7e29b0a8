//! Transaction Module
//!
//! Operation intents (the account call an operation asks the queue to make),
//! EIP-1559 transaction population, and transfer cost estimates.

mod builder;
mod estimate;
mod intents;

pub use builder::*;
pub use estimate::*;
pub use intents::*;
