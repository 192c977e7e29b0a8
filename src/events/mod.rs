//! Receipt parsing
//!
//! Finds the one event an operation is waiting for in a mined receipt. A log
//! is a candidate when it was emitted by the expected contract and its topic0
//! equals the event signature hash; the candidate must then decode and carry
//! the identifying fields (packet id, claimer, creator, salt). The first such
//! log in receipt order wins. A missing event is a normal outcome reported as
//! [`EventLookup::NotFound`], while a candidate that fails to decode is an
//! error.

use crate::abi::HexlinkEvent;
use crate::error::{HexlinkError, HexlinkResult};
use crate::redpacket::RedPacket;
use crate::utils::checksum;
use crate::utils::logging::short_hash;
use ethers_core::abi::{Log as DecodedLog, RawLog, Token};
use ethers_core::types::{Address, Log, TransactionReceipt, H256, U256};
use serde::Serialize;

/// Result of looking for an event in a receipt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventLookup<T> {
    Found(T),
    NotFound,
}

impl<T> EventLookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            EventLookup::Found(v) => Some(v),
            EventLookup::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, EventLookup::Found(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cloned {
    pub source: Address,
    pub cloned: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployed {
    pub deployed: Address,
    pub creator: Address,
    pub salt: H256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Created {
    pub packet_id: H256,
    pub creator: Address,
    pub packet: RedPacket,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Claimed {
    pub packet_id: H256,
    pub claimer: Address,
    pub amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deposit {
    pub reference: H256,
    pub receipt: Address,
    pub token: Address,
    pub amount: U256,
}

/// Any decoded event the crate understands
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ParsedEvent {
    Cloned(Cloned),
    Deployed(Deployed),
    Created(Created),
    Claimed(Claimed),
    Deposit(Deposit),
}

/// Decode `log` as `event`. The caller has already matched topic0.
pub fn decode_log(event: HexlinkEvent, log: &Log) -> HexlinkResult<ParsedEvent> {
    let decoded = event
        .abi()
        .parse_log(RawLog {
            topics: log.topics.clone(),
            data: log.data.to_vec(),
        })
        .map_err(|e| decode_failure(event, log, e.to_string()))?;

    let mut fields = Fields { log, event, decoded };
    let parsed = match event {
        HexlinkEvent::CloneWallet => ParsedEvent::Cloned(Cloned {
            source: fields.address("source")?,
            cloned: fields.address("cloned")?,
        }),
        HexlinkEvent::Deployed => ParsedEvent::Deployed(Deployed {
            deployed: fields.address("deployed")?,
            creator: fields.address("creator")?,
            salt: fields.bytes32("salt")?,
        }),
        HexlinkEvent::Created => ParsedEvent::Created(Created {
            packet_id: fields.bytes32("packetId")?,
            creator: fields.address("creator")?,
            packet: RedPacket::from_token(fields.take("packet")?)
                .map_err(|e| decode_failure(event, log, e.message))?,
        }),
        HexlinkEvent::Claimed => ParsedEvent::Claimed(Claimed {
            packet_id: fields.bytes32("packetId")?,
            claimer: fields.address("claimer")?,
            amount: fields.uint("amount")?,
        }),
        HexlinkEvent::Deposit => ParsedEvent::Deposit(Deposit {
            reference: fields.bytes32("ref")?,
            receipt: fields.address("receipt")?,
            token: fields.address("token")?,
            amount: fields.uint("amount")?,
        }),
    };
    Ok(parsed)
}

struct Fields<'a> {
    log: &'a Log,
    event: HexlinkEvent,
    decoded: DecodedLog,
}

impl Fields<'_> {
    fn take(&mut self, name: &str) -> HexlinkResult<Token> {
        let idx = self
            .decoded
            .params
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| decode_failure(self.event, self.log, format!("missing field {}", name)))?;
        Ok(self.decoded.params.swap_remove(idx).value)
    }

    fn address(&mut self, name: &str) -> HexlinkResult<Address> {
        let (event, log) = (self.event, self.log);
        self.take(name)?
            .into_address()
            .ok_or_else(|| decode_failure(event, log, format!("{} is not an address", name)))
    }

    fn bytes32(&mut self, name: &str) -> HexlinkResult<H256> {
        let (event, log) = (self.event, self.log);
        self.take(name)?
            .into_fixed_bytes()
            .filter(|b| b.len() == 32)
            .map(|b| H256::from_slice(&b))
            .ok_or_else(|| decode_failure(event, log, format!("{} is not bytes32", name)))
    }

    fn uint(&mut self, name: &str) -> HexlinkResult<U256> {
        let (event, log) = (self.event, self.log);
        self.take(name)?
            .into_uint()
            .ok_or_else(|| decode_failure(event, log, format!("{} is not a uint", name)))
    }
}

fn decode_failure(event: HexlinkEvent, log: &Log, reason: String) -> HexlinkError {
    HexlinkError::decode_error(format!("failed to decode {} event", event)).with_details(format!(
        "contract={} event={} logIndex={} reason={}",
        checksum(&log.address),
        event,
        log.log_index.map(|i| i.to_string()).unwrap_or_else(|| "?".to_string()),
        reason
    ))
}

/// Scan `receipt` for `event` from `contract`, keeping the first decoded log
/// that `select` accepts
fn find_event<T>(
    receipt: &TransactionReceipt,
    contract: Address,
    event: HexlinkEvent,
    mut select: impl FnMut(ParsedEvent) -> Option<T>,
) -> HexlinkResult<EventLookup<T>> {
    let topic = event.topic();
    let mut found = None;
    let mut duplicates = 0usize;

    for log in &receipt.logs {
        if log.address != contract || log.topics.first() != Some(&topic) {
            continue;
        }
        if let Some(value) = select(decode_log(event, log)?) {
            if found.is_none() {
                found = Some(value);
            } else {
                duplicates += 1;
            }
        }
    }

    if duplicates > 0 {
        tracing::warn!(
            tx = %short_hash(format!("{:?}", receipt.transaction_hash)),
            event = %event,
            duplicates,
            "multiple matching events in receipt, using the first"
        );
    }

    Ok(match found {
        Some(value) => EventLookup::Found(value),
        None => EventLookup::NotFound,
    })
}

/// Wallet clone emitted by the admin contract
pub fn parse_cloned(receipt: &TransactionReceipt, admin: Address) -> HexlinkResult<EventLookup<Cloned>> {
    find_event(receipt, admin, HexlinkEvent::CloneWallet, |e| match e {
        ParsedEvent::Cloned(c) => Some(c),
        _ => None,
    })
}

/// ERC-721 drop deployed by `creator` with `salt`
pub fn parse_deployed(
    receipt: &TransactionReceipt,
    token_factory: Address,
    creator: Address,
    salt: H256,
) -> HexlinkResult<EventLookup<Deployed>> {
    find_event(receipt, token_factory, HexlinkEvent::Deployed, |e| match e {
        ParsedEvent::Deployed(d) if d.creator == creator && d.salt == salt => Some(d),
        _ => None,
    })
}

pub fn parse_created(
    receipt: &TransactionReceipt,
    red_packet: Address,
    packet_id: H256,
) -> HexlinkResult<EventLookup<Created>> {
    find_event(receipt, red_packet, HexlinkEvent::Created, |e| match e {
        ParsedEvent::Created(c) if c.packet_id == packet_id => Some(c),
        _ => None,
    })
}

pub fn parse_claimed(
    receipt: &TransactionReceipt,
    red_packet: Address,
    packet_id: H256,
    claimer: Address,
) -> HexlinkResult<EventLookup<Claimed>> {
    find_event(receipt, red_packet, HexlinkEvent::Claimed, |e| match e {
        ParsedEvent::Claimed(c) if c.packet_id == packet_id && c.claimer == claimer => Some(c),
        _ => None,
    })
}

/// Deposit made by `account` for `reference` into `refunder`
pub fn parse_deposit(
    receipt: &TransactionReceipt,
    account: Address,
    reference: H256,
    refunder: Address,
) -> HexlinkResult<EventLookup<Deposit>> {
    find_event(receipt, account, HexlinkEvent::Deposit, |e| match e {
        ParsedEvent::Deposit(d) if d.reference == reference && d.receipt == refunder => Some(d),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::testing::{event_log, receipt};
    use ethers_core::types::Bytes;

    fn red_packet() -> Address {
        Address::repeat_byte(0x10)
    }

    fn packet() -> RedPacket {
        RedPacket {
            token: Address::repeat_byte(0xaa),
            salt: H256::repeat_byte(0xbb),
            balance: U256::exp10(18),
            validator: Address::repeat_byte(0xcc),
            split: 5,
            mode: 0,
        }
    }

    fn created_log(contract: Address, id: H256) -> Log {
        event_log(
            contract,
            HexlinkEvent::Created,
            &[Token::FixedBytes(id.as_bytes().to_vec()), Token::Address(Address::repeat_byte(0x02))],
            &[packet().to_token()],
        )
    }

    fn claimed_log(id: H256, claimer: Address, amount: u64) -> Log {
        event_log(
            red_packet(),
            HexlinkEvent::Claimed,
            &[Token::FixedBytes(id.as_bytes().to_vec()), Token::Address(claimer)],
            &[Token::Uint(U256::from(amount))],
        )
    }

    #[test]
    fn test_empty_receipt_is_not_found() {
        let r = receipt(vec![]);
        assert_eq!(parse_created(&r, red_packet(), H256::zero()).unwrap(), EventLookup::NotFound);
        assert_eq!(
            parse_claimed(&r, red_packet(), H256::zero(), Address::zero()).unwrap(),
            EventLookup::NotFound
        );
        assert_eq!(parse_cloned(&r, Address::zero()).unwrap(), EventLookup::NotFound);
    }

    #[test]
    fn test_parse_created() {
        let id = H256::repeat_byte(0x42);
        let r = receipt(vec![created_log(red_packet(), id)]);
        let created = parse_created(&r, red_packet(), id).unwrap().found().unwrap();
        assert_eq!(created.packet_id, id);
        assert_eq!(created.creator, Address::repeat_byte(0x02));
        assert_eq!(created.packet, packet());
    }

    #[test]
    fn test_other_contract_is_ignored() {
        let id = H256::repeat_byte(0x42);
        let r = receipt(vec![created_log(Address::repeat_byte(0x66), id)]);
        assert!(!parse_created(&r, red_packet(), id).unwrap().is_found());
    }

    #[test]
    fn test_claimed_matches_claimer() {
        let id = H256::repeat_byte(0x42);
        let alice = Address::repeat_byte(0x0a);
        let bob = Address::repeat_byte(0x0b);
        let r = receipt(vec![claimed_log(id, alice, 1), claimed_log(id, bob, 2)]);

        let claimed = parse_claimed(&r, red_packet(), id, bob).unwrap().found().unwrap();
        assert_eq!(claimed.amount, U256::from(2));
        assert!(!parse_claimed(&r, red_packet(), H256::zero(), bob).unwrap().is_found());
    }

    #[test]
    fn test_first_match_wins() {
        let id = H256::repeat_byte(0x42);
        let alice = Address::repeat_byte(0x0a);
        let r = receipt(vec![claimed_log(id, alice, 1), claimed_log(id, alice, 2)]);
        let claimed = parse_claimed(&r, red_packet(), id, alice).unwrap().found().unwrap();
        assert_eq!(claimed.amount, U256::one());
    }

    #[test]
    fn test_malformed_log_is_decode_error() {
        let mut log = claimed_log(H256::repeat_byte(0x42), Address::zero(), 1);
        log.data = Bytes::from(vec![0u8; 3]);
        let r = receipt(vec![log]);
        let err = parse_claimed(&r, red_packet(), H256::repeat_byte(0x42), Address::zero()).unwrap_err();
        assert_eq!(err.code, ErrorCode::DecodeError);
        let details = err.details.unwrap();
        assert!(details.contains("event=Claimed"));
        assert!(details.contains("logIndex=0"));
    }

    #[test]
    fn test_parse_deployed_and_deposit() {
        let factory = Address::repeat_byte(0x20);
        let account = Address::repeat_byte(0x30);
        let refunder = Address::repeat_byte(0x40);
        let salt = H256::repeat_byte(0x07);
        let reference = H256::repeat_byte(0x08);
        let r = receipt(vec![
            event_log(
                factory,
                HexlinkEvent::Deployed,
                &[Token::Address(Address::repeat_byte(0x50)), Token::Address(account)],
                &[Token::FixedBytes(salt.as_bytes().to_vec())],
            ),
            event_log(
                account,
                HexlinkEvent::Deposit,
                &[
                    Token::FixedBytes(reference.as_bytes().to_vec()),
                    Token::Address(refunder),
                    Token::Address(Address::zero()),
                ],
                &[Token::Uint(U256::from(500))],
            ),
        ]);

        let deployed = parse_deployed(&r, factory, account, salt).unwrap().found().unwrap();
        assert_eq!(deployed.deployed, Address::repeat_byte(0x50));
        assert!(!parse_deployed(&r, factory, account, H256::zero()).unwrap().is_found());

        let deposit = parse_deposit(&r, account, reference, refunder).unwrap().found().unwrap();
        assert_eq!(deposit.amount, U256::from(500));
        assert!(!parse_deposit(&r, account, reference, Address::zero()).unwrap().is_found());
    }

    #[test]
    fn test_parse_cloned() {
        let admin = Address::repeat_byte(0xad);
        let r = receipt(vec![event_log(
            admin,
            HexlinkEvent::CloneWallet,
            &[Token::Address(Address::repeat_byte(0x01)), Token::Address(Address::repeat_byte(0x02))],
            &[],
        )]);
        let cloned = parse_cloned(&r, admin).unwrap().found().unwrap();
        assert_eq!(cloned.cloned, Address::repeat_byte(0x02));
    }
}
