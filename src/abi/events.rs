//! Event definitions emitted by the wallet admin, red packet, drop factory and
//! account contracts

use crate::redpacket::RedPacket;
use ethers_core::abi::{Event, EventParam, ParamType};
use ethers_core::types::H256;
use std::fmt;

/// Every event the receipt parser knows how to find
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HexlinkEvent {
    /// Wallet admin: `CloneWallet(address indexed source, address indexed cloned)`
    CloneWallet,
    /// Drop factory: `Deployed(address indexed deployed, address indexed creator, bytes32 salt)`
    Deployed,
    /// Red packet: `Created(bytes32 indexed packetId, address indexed creator, RedPacket packet)`
    Created,
    /// Red packet: `Claimed(bytes32 indexed packetId, address indexed claimer, uint256 amount)`
    Claimed,
    /// Account: `Deposit(bytes32 indexed ref, address indexed receipt, address indexed token, uint256 amount)`
    Deposit,
}

impl HexlinkEvent {
    pub fn name(&self) -> &'static str {
        match self {
            HexlinkEvent::CloneWallet => "CloneWallet",
            HexlinkEvent::Deployed => "Deployed",
            HexlinkEvent::Created => "Created",
            HexlinkEvent::Claimed => "Claimed",
            HexlinkEvent::Deposit => "Deposit",
        }
    }

    /// ABI description used to decode matching logs
    pub fn abi(&self) -> Event {
        let inputs = match self {
            HexlinkEvent::CloneWallet => vec![
                param("source", ParamType::Address, true),
                param("cloned", ParamType::Address, true),
            ],
            HexlinkEvent::Deployed => vec![
                param("deployed", ParamType::Address, true),
                param("creator", ParamType::Address, true),
                param("salt", ParamType::FixedBytes(32), false),
            ],
            HexlinkEvent::Created => vec![
                param("packetId", ParamType::FixedBytes(32), true),
                param("creator", ParamType::Address, true),
                param("packet", RedPacket::param_type(), false),
            ],
            HexlinkEvent::Claimed => vec![
                param("packetId", ParamType::FixedBytes(32), true),
                param("claimer", ParamType::Address, true),
                param("amount", ParamType::Uint(256), false),
            ],
            HexlinkEvent::Deposit => vec![
                param("ref", ParamType::FixedBytes(32), true),
                param("receipt", ParamType::Address, true),
                param("token", ParamType::Address, true),
                param("amount", ParamType::Uint(256), false),
            ],
        };
        Event {
            name: self.name().to_string(),
            inputs,
            anonymous: false,
        }
    }

    /// topic0: keccak256 of the canonical signature
    pub fn topic(&self) -> H256 {
        self.abi().signature()
    }
}

impl fmt::Display for HexlinkEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn param(name: &str, kind: ParamType, indexed: bool) -> EventParam {
    EventParam {
        name: name.to_string(),
        kind,
        indexed,
    }
}
