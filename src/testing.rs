//! In-process collaborators for tests and local tooling
//!
//! Everything here is deterministic and keeps state in memory: a provider
//! answering from fixed tables, a key service backed by a local key, a
//! submitter that records what it was given, and helpers to build receipts.

use crate::abi::HexlinkEvent;
use crate::chain::Chain;
use crate::error::{HexlinkError, HexlinkResult};
use crate::provider::{ChainProvider, FeeData};
use crate::signing::{KeyRole, KeyService};
use crate::store::RequestPreprocessor;
use crate::types::{Account, AuthContext, OpInput, OperationRequest, Rejection, RequestData, SubmitReceipt};
use async_trait::async_trait;
use ethers_core::abi::{self, Token};
use ethers_core::types::{Address, Bytes, Log, Signature, TransactionReceipt, H256, U256};
use ethers_signers::{LocalWallet, Signer};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

pub use crate::store::InMemoryDatastore;

/// Provider answering from fixed tables. Unknown `eth_call`s fail as an
/// upstream revert.
#[derive(Debug, Clone)]
pub struct StaticProvider {
    chain_id: u64,
    nonce: U256,
    fee_data: FeeData,
    gas_estimate: U256,
    calls: HashMap<(Address, Vec<u8>), Bytes>,
}

impl StaticProvider {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            nonce: U256::zero(),
            fee_data: FeeData::default(),
            gas_estimate: U256::from(21_000),
            calls: HashMap::new(),
        }
    }

    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = U256::from(nonce);
        self
    }

    pub fn with_fee_data(mut self, fee_data: FeeData) -> Self {
        self.fee_data = fee_data;
        self
    }

    pub fn with_gas_estimate(mut self, gas: u64) -> Self {
        self.gas_estimate = U256::from(gas);
        self
    }

    /// Answer `eth_call(to, data)` with `output`
    pub fn with_call(mut self, to: Address, data: impl AsRef<[u8]>, output: impl Into<Bytes>) -> Self {
        self.calls.insert((to, data.as_ref().to_vec()), output.into());
        self
    }
}

#[async_trait]
impl ChainProvider for StaticProvider {
    async fn chain_id(&self) -> HexlinkResult<u64> {
        Ok(self.chain_id)
    }

    async fn transaction_count(&self, _address: Address) -> HexlinkResult<U256> {
        Ok(self.nonce)
    }

    async fn fee_data(&self) -> HexlinkResult<FeeData> {
        Ok(self.fee_data.clone())
    }

    async fn call(&self, to: Address, data: Bytes) -> HexlinkResult<Bytes> {
        self.calls
            .get(&(to, data.to_vec()))
            .cloned()
            .ok_or_else(|| HexlinkError::upstream("execution reverted"))
    }

    async fn estimate_gas(&self, _from: Option<Address>, _to: Address, _value: U256, _data: Bytes) -> HexlinkResult<U256> {
        Ok(self.gas_estimate)
    }
}

/// Key service holding one local key for every role
pub struct StaticKeyService {
    wallet: LocalWallet,
}

impl StaticKeyService {
    pub fn new(wallet: LocalWallet) -> Self {
        Self { wallet }
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }
}

#[async_trait]
impl KeyService for StaticKeyService {
    fn public_address(&self, _role: KeyRole) -> HexlinkResult<Address> {
        Ok(self.wallet.address())
    }

    async fn sign_digest(&self, _role: KeyRole, digest: H256) -> HexlinkResult<Signature> {
        Ok(self.wallet.sign_hash(digest)?)
    }
}

/// Submitter that keeps every operation it is handed
#[derive(Default)]
pub struct RecordingSubmitter {
    submitted: Mutex<Vec<(u64, OperationRequest)>>,
    next_id: AtomicI64,
}

impl RecordingSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(chain id, operation)` pairs in submission order
    pub fn submitted(&self) -> Vec<(u64, OperationRequest)> {
        self.submitted.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl crate::store::Submitter for RecordingSubmitter {
    async fn submit(&self, chain: &Chain, operation: OperationRequest) -> HexlinkResult<SubmitReceipt> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.submitted
            .lock()
            .map_err(|_| HexlinkError::internal("submitter lock poisoned"))?
            .push((chain.id(), operation));
        Ok(SubmitReceipt { id })
    }
}

/// Preprocessor with a fixed outcome
pub struct StaticPreprocessor {
    outcome: Result<RequestData, Rejection>,
    user_op: Option<OpInput>,
}

impl StaticPreprocessor {
    pub fn accept(data: RequestData) -> Self {
        Self {
            outcome: Ok(data),
            user_op: None,
        }
    }

    pub fn reject(rejection: Rejection) -> Self {
        Self {
            outcome: Err(rejection),
            user_op: None,
        }
    }

    /// Result of `validate_user_op`; without one the request is invalid
    pub fn with_user_op(mut self, input: OpInput) -> Self {
        self.user_op = Some(input);
        self
    }
}

#[async_trait]
impl RequestPreprocessor for StaticPreprocessor {
    async fn preprocess(&self, _payload: &Value, _auth: &AuthContext) -> Result<RequestData, Rejection> {
        self.outcome.clone()
    }

    async fn validate_user_op(&self, _chain: &Chain, _account: &Account, _request: &Value) -> HexlinkResult<OpInput> {
        self.user_op
            .clone()
            .ok_or_else(|| HexlinkError::invalid_input("invalid user operation"))
    }
}

/// Log for `event` emitted by `contract`. `indexed` must be static types.
pub fn event_log(contract: Address, event: HexlinkEvent, indexed: &[Token], data: &[Token]) -> Log {
    let mut topics = vec![event.topic()];
    topics.extend(indexed.iter().map(|t| H256::from_slice(&abi::encode(&[t.clone()]))));
    Log {
        address: contract,
        topics,
        data: Bytes::from(abi::encode(data)),
        ..Default::default()
    }
}

/// Receipt carrying `logs` with log indexes assigned in order
pub fn receipt(logs: Vec<Log>) -> TransactionReceipt {
    let logs = logs
        .into_iter()
        .enumerate()
        .map(|(i, mut log)| {
            log.log_index = Some(U256::from(i));
            log
        })
        .collect();
    TransactionReceipt {
        transaction_hash: H256::repeat_byte(0xee),
        status: Some(1u64.into()),
        logs,
        ..Default::default()
    }
}
