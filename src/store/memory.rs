use super::{Datastore, RedPacketClaimRecord, RedPacketRecord, RequestRecord};
use crate::error::{HexlinkError, HexlinkResult};
use async_trait::async_trait;
use ethers_core::types::H256;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct State {
    requests: Vec<(String, RequestRecord)>,
    red_packets: HashMap<H256, RedPacketRecord>,
    claims: HashMap<(H256, String), RedPacketClaimRecord>,
    notes: BTreeMap<i64, String>,
    inserts: usize,
}

/// Process-local datastore with the same upsert semantics a real backend
/// must provide
#[derive(Default)]
pub struct InMemoryDatastore {
    state: Mutex<State>,
}

impl InMemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> HexlinkResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| HexlinkError::internal("datastore lock poisoned"))
    }

    pub fn red_packets(&self) -> Vec<RedPacketRecord> {
        self.lock().map(|s| s.red_packets.values().cloned().collect()).unwrap_or_default()
    }

    pub fn claims(&self) -> Vec<RedPacketClaimRecord> {
        self.lock().map(|s| s.claims.values().cloned().collect()).unwrap_or_default()
    }

    pub fn requests(&self) -> Vec<(String, RequestRecord)> {
        self.lock().map(|s| s.requests.clone()).unwrap_or_default()
    }

    /// Current note of every noted operation, by operation id
    pub fn operation_notes(&self) -> Vec<(i64, String)> {
        self.lock()
            .map(|s| s.notes.iter().map(|(id, note)| (*id, note.clone())).collect())
            .unwrap_or_default()
    }

    /// Number of writes that created a new row (as opposed to replacing one)
    pub fn insert_count(&self) -> usize {
        self.lock().map(|s| s.inserts).unwrap_or_default()
    }
}

#[async_trait]
impl Datastore for InMemoryDatastore {
    async fn insert_request(&self, user_id: &str, request: RequestRecord) -> HexlinkResult<i64> {
        let mut state = self.lock()?;
        state.requests.push((user_id.to_string(), request));
        Ok(state.requests.len() as i64)
    }

    async fn get_red_packet(&self, id: H256) -> HexlinkResult<Option<RedPacketRecord>> {
        Ok(self.lock()?.red_packets.get(&id).cloned())
    }

    async fn upsert_red_packet(&self, record: RedPacketRecord) -> HexlinkResult<()> {
        let mut state = self.lock()?;
        if state.red_packets.insert(record.id, record).is_none() {
            state.inserts += 1;
        }
        Ok(())
    }

    async fn upsert_red_packet_claim(&self, record: RedPacketClaimRecord) -> HexlinkResult<()> {
        let mut state = self.lock()?;
        if state.claims.insert(record.key(), record).is_none() {
            state.inserts += 1;
        }
        Ok(())
    }

    async fn update_operation(&self, op_id: i64, note: &str) -> HexlinkResult<()> {
        self.lock()?.notes.insert(op_id, note.to_string());
        Ok(())
    }
}
