//! Red packets
//!
//! A red packet is an on-chain pot of ERC-20 (or native) value split among
//! claimers, or an ERC-721 drop minted by a per-packet token contract. Both
//! are identified by an id that off-chain code recomputes from the creation
//! parameters, so the id is known before the creation transaction lands.

mod erc721;
mod id;

pub use erc721::*;
pub use id::*;

use crate::error::{HexlinkError, HexlinkResult};
use crate::types::u256_dec;
use ethers_core::abi::{ParamType, Token};
use ethers_core::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

/// Creation parameters of an ERC-20/native red packet, as the contract sees them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedPacket {
    /// Zero address for the native token
    pub token: Address,
    pub salt: H256,
    #[serde(with = "u256_dec")]
    pub balance: U256,
    pub validator: Address,
    pub split: u32,
    pub mode: u8,
}

impl RedPacket {
    /// `(address,bytes32,uint256,address,uint32,uint8)`
    pub fn param_type() -> ParamType {
        ParamType::Tuple(vec![
            ParamType::Address,
            ParamType::FixedBytes(32),
            ParamType::Uint(256),
            ParamType::Address,
            ParamType::Uint(32),
            ParamType::Uint(8),
        ])
    }

    pub fn to_token(&self) -> Token {
        Token::Tuple(vec![
            Token::Address(self.token),
            Token::FixedBytes(self.salt.as_bytes().to_vec()),
            Token::Uint(self.balance),
            Token::Address(self.validator),
            Token::Uint(U256::from(self.split)),
            Token::Uint(U256::from(self.mode)),
        ])
    }

    pub fn from_token(token: Token) -> HexlinkResult<Self> {
        let fields = match token {
            Token::Tuple(fields) if fields.len() == 6 => fields,
            other => {
                return Err(HexlinkError::decode_error(format!("expected red packet tuple, got {:?}", other)))
            }
        };
        let mut it = fields.into_iter();
        let mut next = || it.next().ok_or_else(|| HexlinkError::decode_error("truncated red packet tuple"));

        let token = next()?.into_address().ok_or_else(|| field_error("token"))?;
        let salt = next()?.into_fixed_bytes().filter(|b| b.len() == 32).ok_or_else(|| field_error("salt"))?;
        let balance = next()?.into_uint().ok_or_else(|| field_error("balance"))?;
        let validator = next()?.into_address().ok_or_else(|| field_error("validator"))?;
        let split = next()?.into_uint().ok_or_else(|| field_error("split"))?;
        let mode = next()?.into_uint().ok_or_else(|| field_error("mode"))?;

        Ok(RedPacket {
            token,
            salt: H256::from_slice(&salt),
            balance,
            validator,
            split: u32::try_from(split).map_err(|_| field_error("split"))?,
            mode: u8::try_from(mode).map_err(|_| field_error("mode"))?,
        })
    }
}

fn field_error(field: &str) -> HexlinkError {
    HexlinkError::decode_error(format!("red packet field {} has the wrong type", field))
}

/// Creation parameters of an ERC-721 drop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedPacketErc721 {
    pub name: String,
    pub symbol: String,
    #[serde(rename = "tokenURI")]
    pub token_uri: String,
    pub salt: H256,
    #[serde(with = "u256_dec")]
    pub max_supply: U256,
    pub validator: Address,
    #[serde(default)]
    pub transferrable: bool,
}

impl RedPacketErc721 {
    pub fn to_token(&self) -> Token {
        Token::Tuple(vec![
            Token::String(self.name.clone()),
            Token::String(self.symbol.clone()),
            Token::String(self.token_uri.clone()),
            Token::FixedBytes(self.salt.as_bytes().to_vec()),
            Token::Uint(self.max_supply),
            Token::Address(self.validator),
            Token::Bool(self.transferrable),
        ])
    }
}
