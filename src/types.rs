//! Shared types for Hexlink Core
//!
//! Data structures that cross module boundaries: operation inputs, the
//! operation/action model handed to the submission queue and reconciler, and
//! the `{code, message}` envelope returned by callable entry points.

use crate::chain::ChainRef;
use crate::error::HexlinkError;
use ethers_core::types::{Address, Bytes, H256, U256};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Request context
// =============================================================================

/// Identity attached to an incoming call by the auth layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthContext {
    pub uid: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Smart account of the calling user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: Address,
}

/// Output of a successful preprocess step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestData {
    pub uid: String,
    pub account: Account,
    pub chain: ChainRef,
}

/// Preprocess refusal, passed back to the caller unchanged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub code: u16,
    pub message: String,
}

impl Rejection {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(401, "Unauthorized")
    }

    pub fn email_not_set() -> Self {
        Self::new(400, "Email not set")
    }
}

impl From<Rejection> for CallResult {
    fn from(r: Rejection) -> Self {
        CallResult::fail(r.code, r.message)
    }
}

// =============================================================================
// Operations
// =============================================================================

/// Call to be executed by the user's account. A zero `call_gas_limit` asks the
/// submission layer to estimate gas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpInput {
    pub to: Address,
    pub value: U256,
    pub call_data: Bytes,
    pub call_gas_limit: U256,
}

/// Kind of logical unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    CreateRedpacket,
    CreateRedpacketErc721,
    ClaimRedpacket,
    DeployWallet,
    SendEth,
    SendErc20,
    Execute,
}

/// Datastore follow-up attached to an operation, settled once its receipt lands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "params", rename_all = "snake_case")]
pub enum Action {
    #[serde(rename_all = "camelCase")]
    InsertRedpacket {
        user_id: String,
        red_packet_id: H256,
        creator: Value,
        refunder: Address,
        #[serde(default)]
        price_info: Option<Value>,
    },
    #[serde(rename_all = "camelCase")]
    InsertRedpacketErc721 {
        user_id: String,
        red_packet_id: H256,
        salt: H256,
        creator: Value,
        refunder: Address,
        #[serde(default)]
        price_info: Option<Value>,
    },
    #[serde(rename_all = "camelCase")]
    InsertRedpacketClaim {
        red_packet_id: H256,
        creator_id: String,
        claimer_id: String,
        #[serde(default)]
        claimer: Value,
    },
}

impl Action {
    pub fn red_packet_id(&self) -> H256 {
        match self {
            Action::InsertRedpacket { red_packet_id, .. }
            | Action::InsertRedpacketErc721 { red_packet_id, .. }
            | Action::InsertRedpacketClaim { red_packet_id, .. } => *red_packet_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Action::InsertRedpacket { .. } => "insert_redpacket",
            Action::InsertRedpacketErc721 { .. } => "insert_redpacket_erc721",
            Action::InsertRedpacketClaim { .. } => "insert_redpacket_claim",
        }
    }
}

/// Payload handed to the submission queue. Exactly one of `input` (to be
/// signed and sent) or `tx` (already broadcast by the client) is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRequest {
    #[serde(rename = "type")]
    pub kind: OperationType,
    pub user_id: String,
    pub account: Address,
    pub actions: Vec<Action>,
    pub request_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<OpInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx: Option<H256>,
}

/// Operation as stored by the queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: i64,
    #[serde(flatten)]
    pub request: OperationRequest,
}

impl Operation {
    pub fn account(&self) -> Address {
        self.request.account
    }

    pub fn user_id(&self) -> &str {
        &self.request.user_id
    }

    pub fn actions(&self) -> &[Action] {
        &self.request.actions
    }
}

/// Acknowledgement from the submission queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub id: i64,
}

// =============================================================================
// Callable responses
// =============================================================================

/// `{code, message}` envelope returned by every callable entry point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallResult {
    pub code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl CallResult {
    pub fn ok(data: impl Serialize) -> Self {
        let data = match serde_json::to_value(data) {
            Ok(Value::Object(map)) => map,
            Ok(Value::Null) => Map::new(),
            Ok(other) => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
            Err(e) => return Self::fail(500, format!("Serialization failed: {}", e)),
        };
        Self {
            code: 200,
            message: None,
            data,
        }
    }

    pub fn fail(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
            data: Map::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == 200
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

impl From<HexlinkError> for CallResult {
    fn from(e: HexlinkError) -> Self {
        CallResult::fail(e.status(), e.message)
    }
}

// =============================================================================
// Serde helpers
// =============================================================================

/// U256 carried as a decimal string; accepts decimal, `0x` hex or JSON numbers
pub mod u256_dec {
    use ethers_core::types::U256;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => parse(&s).map_err(D::Error::custom),
            Value::Number(n) => n
                .as_u64()
                .map(U256::from)
                .ok_or_else(|| D::Error::custom(format!("not an unsigned integer: {}", n))),
            other => Err(D::Error::custom(format!("invalid uint256: {}", other))),
        }
    }

    pub fn parse(s: &str) -> Result<U256, String> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            U256::from_str_radix(hex, 16).map_err(|e| format!("invalid hex uint256 {}: {}", s, e))
        } else {
            U256::from_dec_str(s).map_err(|e| format!("invalid uint256 {}: {}", s, e))
        }
    }
}
