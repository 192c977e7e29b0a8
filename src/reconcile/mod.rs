//! Operation reconciliation
//!
//! Once an operation's transaction is mined, every action attached to it is
//! settled against the receipt. Actions run concurrently and independently:
//! one action failing or finding nothing never affects its siblings. Writes
//! are upserts by natural key, so reconciling the same receipt twice leaves
//! the store unchanged.

use crate::chain::Chain;
use crate::config::HexlinkConfig;
use crate::error::HexlinkResult;
use crate::events::{parse_claimed, parse_cloned, parse_created, parse_deployed, parse_deposit, Deposit, EventLookup};
use crate::provider::ChainProvider;
use crate::redpacket::read_erc721_metadata;
use crate::store::{
    ClaimedRecord, Datastore, DepositRecord, RedPacketClaimRecord, RedPacketMetadata, RedPacketRecord,
};
use crate::types::{Action, Operation, OperationType};
use crate::utils::logging::{redact_address, short_hash};
use crate::utils::checksum;
use ethers_core::types::TransactionReceipt;
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;

pub const CLAIM_NOT_FOUND: &str = "claim event not found";
pub const RED_PACKET_NOT_FOUND: &str = "redpacket event not found";
pub const ERC721_NOT_FOUND: &str = "erc721 deploy event not found";

/// How one action ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The record was written
    Settled,
    /// The awaited event was absent; the operation carries this note
    NotFound(&'static str),
}

#[derive(Debug)]
pub struct ActionReport {
    pub index: usize,
    pub kind: &'static str,
    pub outcome: HexlinkResult<ActionOutcome>,
}

impl ActionReport {
    pub fn is_settled(&self) -> bool {
        matches!(self.outcome, Ok(ActionOutcome::Settled))
    }
}

pub struct Reconciler {
    config: Arc<HexlinkConfig>,
    store: Arc<dyn Datastore>,
    provider: Arc<dyn ChainProvider>,
}

impl Reconciler {
    /// `provider` must serve the chain whose receipts will be reconciled
    pub fn new(config: Arc<HexlinkConfig>, store: Arc<dyn Datastore>, provider: Arc<dyn ChainProvider>) -> Self {
        Self { config, store, provider }
    }

    /// Whether the admin cloned a wallet at the operation's account in this receipt
    pub fn confirm_wallet_clone(&self, op: &Operation, receipt: &TransactionReceipt) -> HexlinkResult<bool> {
        Ok(match parse_cloned(receipt, self.config.admin)? {
            EventLookup::Found(clone) => clone.cloned == op.account(),
            EventLookup::NotFound => false,
        })
    }

    /// Settle every action of `op`, one report per action in action order
    pub async fn process_actions(
        &self,
        chain: &Chain,
        op: &Operation,
        receipt: &TransactionReceipt,
    ) -> Vec<ActionReport> {
        if op.request.kind == OperationType::DeployWallet {
            let wallet = redact_address(checksum(&op.account()));
            match self.confirm_wallet_clone(op, receipt) {
                Ok(true) => tracing::info!(op_id = op.id, %wallet, "wallet deployment confirmed"),
                Ok(false) => tracing::warn!(op_id = op.id, %wallet, "deploy receipt has no clone of the wallet"),
                Err(e) => tracing::warn!(op_id = op.id, error = %e, "clone event undecodable"),
            }
        }

        let tasks = op.actions().iter().enumerate().map(|(index, action)| async move {
            let outcome = self.process_action(chain, op, action, receipt).await;
            match &outcome {
                Ok(ActionOutcome::Settled) => tracing::info!(
                    op_id = op.id,
                    action = action.kind(),
                    red_packet = %short_hash(format!("{:?}", action.red_packet_id())),
                    "action settled"
                ),
                Ok(ActionOutcome::NotFound(note)) => tracing::warn!(
                    op_id = op.id,
                    action = action.kind(),
                    red_packet = %short_hash(format!("{:?}", action.red_packet_id())),
                    note,
                    "awaited event missing from receipt"
                ),
                Err(e) => tracing::error!(op_id = op.id, action = action.kind(), error = %e, "action failed"),
            }
            ActionReport {
                index,
                kind: action.kind(),
                outcome,
            }
        });
        join_all(tasks).await
    }

    async fn process_action(
        &self,
        chain: &Chain,
        op: &Operation,
        action: &Action,
        receipt: &TransactionReceipt,
    ) -> HexlinkResult<ActionOutcome> {
        match action {
            Action::InsertRedpacketClaim {
                red_packet_id,
                creator_id,
                claimer_id,
                claimer,
            } => {
                let contract = self.config.red_packet_address(chain)?;
                match parse_claimed(receipt, contract, *red_packet_id, op.account())? {
                    EventLookup::Found(claimed) => {
                        let record = RedPacketClaimRecord {
                            red_packet_id: *red_packet_id,
                            creator_id: creator_id.clone(),
                            claimer_id: claimer_id.clone(),
                            claimer: claimer.clone(),
                            claimed: ClaimedRecord {
                                claimer: claimed.claimer,
                                amount: claimed.amount,
                            },
                            op_id: op.id,
                        };
                        self.write("upsertRedPacketClaim", self.store.upsert_red_packet_claim(record))
                            .await?;
                        Ok(ActionOutcome::Settled)
                    }
                    EventLookup::NotFound => self.note(op, CLAIM_NOT_FOUND).await,
                }
            }

            Action::InsertRedpacket {
                user_id,
                red_packet_id,
                creator,
                refunder,
                price_info,
            } => {
                let contract = self.config.red_packet_address(chain)?;
                match parse_created(receipt, contract, *red_packet_id)? {
                    EventLookup::Found(created) => {
                        let deposit = parse_deposit(receipt, op.account(), *red_packet_id, *refunder)?.found();
                        let packet = created.packet;
                        let record = RedPacketRecord {
                            id: *red_packet_id,
                            user_id: user_id.clone(),
                            creator: creator.clone(),
                            metadata: RedPacketMetadata::Erc20 {
                                token: packet.token,
                                salt: packet.salt,
                                balance: packet.balance,
                                split: packet.split,
                                validator: packet.validator,
                                mode: packet.mode,
                                creator: created.creator,
                                contract,
                            },
                            op_id: op.id,
                            deposit: deposit_record(deposit, price_info),
                        };
                        self.write("upsertRedPacket", self.store.upsert_red_packet(record)).await?;
                        Ok(ActionOutcome::Settled)
                    }
                    EventLookup::NotFound => self.note(op, RED_PACKET_NOT_FOUND).await,
                }
            }

            Action::InsertRedpacketErc721 {
                user_id,
                red_packet_id,
                salt,
                creator,
                refunder,
                price_info,
            } => {
                let factory = self.config.token_factory_address(chain)?;
                match parse_deployed(receipt, factory, op.account(), *salt)? {
                    EventLookup::Found(deployed) => {
                        let deposit = parse_deposit(receipt, op.account(), *red_packet_id, *refunder)?.found();
                        let meta =
                            read_erc721_metadata(self.provider.as_ref(), &self.config.call_policy, deployed.deployed)
                                .await?;
                        let record = RedPacketRecord {
                            id: *red_packet_id,
                            user_id: user_id.clone(),
                            creator: creator.clone(),
                            metadata: RedPacketMetadata::Erc721 {
                                token: deployed.deployed,
                                salt: deployed.salt,
                                creator: deployed.creator,
                                name: meta.name,
                                symbol: meta.symbol,
                                max_supply: meta.max_supply,
                                validator: meta.validator,
                                transferrable: meta.transferrable,
                            },
                            op_id: op.id,
                            deposit: deposit_record(deposit, price_info),
                        };
                        self.write("upsertRedPacket", self.store.upsert_red_packet(record)).await?;
                        Ok(ActionOutcome::Settled)
                    }
                    EventLookup::NotFound => self.note(op, ERC721_NOT_FOUND).await,
                }
            }
        }
    }

    async fn note(&self, op: &Operation, note: &'static str) -> HexlinkResult<ActionOutcome> {
        self.write("updateOperation", self.store.update_operation(op.id, note)).await?;
        Ok(ActionOutcome::NotFound(note))
    }

    async fn write<F>(&self, label: &'static str, fut: F) -> HexlinkResult<()>
    where
        F: std::future::Future<Output = HexlinkResult<()>>,
    {
        self.config.call_policy.run(label, fut).await
    }
}

fn deposit_record(deposit: Option<Deposit>, price_info: &Option<Value>) -> DepositRecord {
    DepositRecord {
        receipt: deposit.as_ref().map(|d| d.receipt),
        token: deposit.as_ref().map(|d| d.token),
        amount: deposit.as_ref().map(|d| d.amount.to_string()),
        price_info: price_info.clone(),
    }
}
