//! Host collaborators
//!
//! The datastore, the operation queue and the request preprocessor live
//! outside this crate. These traits are the whole contract the core relies
//! on, and the records are the shapes it reads and writes.

mod memory;

pub use memory::InMemoryDatastore;

use crate::chain::Chain;
use crate::error::HexlinkResult;
use crate::types::{u256_dec, Account, AuthContext, OpInput, OperationRequest, Rejection, RequestData, SubmitReceipt};
use async_trait::async_trait;
use ethers_core::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Records
// =============================================================================

/// Audit row written before an operation is submitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub to: Address,
    pub args: Value,
}

/// On-chain facts about a red packet, as recorded after its creation lands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "metadata", rename_all = "lowercase")]
pub enum RedPacketMetadata {
    #[serde(rename_all = "camelCase")]
    Erc20 {
        token: Address,
        salt: H256,
        /// Decimal string on the wire
        #[serde(with = "u256_dec")]
        balance: U256,
        split: u32,
        validator: Address,
        mode: u8,
        creator: Address,
        contract: Address,
    },
    #[serde(rename_all = "camelCase")]
    Erc721 {
        token: Address,
        salt: H256,
        creator: Address,
        name: String,
        symbol: String,
        #[serde(with = "u256_dec")]
        max_supply: U256,
        validator: Address,
        transferrable: bool,
    },
}

impl RedPacketMetadata {
    pub fn validator(&self) -> Address {
        match self {
            RedPacketMetadata::Erc20 { validator, .. } | RedPacketMetadata::Erc721 { validator, .. } => *validator,
        }
    }

    pub fn creator(&self) -> Address {
        match self {
            RedPacketMetadata::Erc20 { creator, .. } | RedPacketMetadata::Erc721 { creator, .. } => *creator,
        }
    }
}

/// Refund deposit made alongside creation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRecord {
    pub receipt: Option<Address>,
    pub token: Option<Address>,
    /// Decimal string
    pub amount: Option<String>,
    pub price_info: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedPacketRecord {
    pub id: H256,
    pub user_id: String,
    pub creator: Value,
    #[serde(flatten)]
    pub metadata: RedPacketMetadata,
    pub op_id: i64,
    pub deposit: DepositRecord,
}

/// What the chain says was claimed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimedRecord {
    pub claimer: Address,
    #[serde(with = "u256_dec")]
    pub amount: U256,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedPacketClaimRecord {
    pub red_packet_id: H256,
    pub creator_id: String,
    pub claimer_id: String,
    pub claimer: Value,
    pub claimed: ClaimedRecord,
    pub op_id: i64,
}

impl RedPacketClaimRecord {
    /// Natural key
    pub fn key(&self) -> (H256, String) {
        (self.red_packet_id, self.claimer_id.clone())
    }
}

// =============================================================================
// Collaborators
// =============================================================================

/// Persistent store. Upserts are keyed by natural id, so replaying a write is
/// harmless.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Returns the new request id
    async fn insert_request(&self, user_id: &str, request: RequestRecord) -> HexlinkResult<i64>;

    async fn get_red_packet(&self, id: H256) -> HexlinkResult<Option<RedPacketRecord>>;

    async fn upsert_red_packet(&self, record: RedPacketRecord) -> HexlinkResult<()>;

    /// Keyed by `(red_packet_id, claimer_id)`
    async fn upsert_red_packet_claim(&self, record: RedPacketClaimRecord) -> HexlinkResult<()>;

    /// Set the operation's error note, replacing any earlier one
    async fn update_operation(&self, op_id: i64, note: &str) -> HexlinkResult<()>;
}

/// Operation queue; signing and broadcasting happen behind it
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, chain: &Chain, operation: OperationRequest) -> HexlinkResult<SubmitReceipt>;
}

/// Authentication and account resolution for incoming calls
#[async_trait]
pub trait RequestPreprocessor: Send + Sync {
    async fn preprocess(&self, payload: &Value, auth: &AuthContext) -> Result<RequestData, Rejection>;

    /// Validate a client-built user operation and turn it into an account call
    async fn validate_user_op(&self, chain: &Chain, account: &Account, request: &Value) -> HexlinkResult<OpInput>;
}
