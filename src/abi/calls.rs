//! Function calldata encoding and return-data decoding

use crate::error::{HexlinkError, HexlinkResult};
use crate::redpacket::RedPacket;
use crate::utils::keccak256;
use ethers_core::abi::{self, ParamType, Token};
use ethers_core::types::{Address, Bytes, H256, U256};

/// Signatures of every function the crate calls
pub struct Signatures;

impl Signatures {
    // ERC-20
    pub const ERC20_TRANSFER: &'static str = "transfer(address,uint256)";
    // Wallet
    pub const WALLET_EXECUTE: &'static str = "execute(address,uint256,uint256,bytes)";
    // Wallet admin
    pub const ADMIN_CLONE: &'static str = "clone(address,bytes32)";
    pub const ADMIN_PREDICT_WALLET_ADDRESS: &'static str = "predictWalletAddress(address,bytes32)";
    // Red packet
    pub const RED_PACKET_CLAIM: &'static str =
        "claim((address,(address,bytes32,uint256,address,uint32,uint8),address,bytes))";
    // ERC-721 drop
    pub const ERC721_NAME: &'static str = "name()";
    pub const ERC721_SYMBOL: &'static str = "symbol()";
    pub const ERC721_MAX_SUPPLY: &'static str = "maxSupply()";
    pub const ERC721_VALIDATOR: &'static str = "validator()";
    pub const ERC721_TRANSFERRABLE: &'static str = "transferrable()";
}

/// First 4 bytes of keccak256(signature)
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// `selector ++ abi.encode(args)`
pub fn encode_call(signature: &str, args: &[Token]) -> Bytes {
    let mut data = selector(signature).to_vec();
    data.extend_from_slice(&abi::encode(args));
    Bytes::from(data)
}

/// Calldata builders
pub struct FunctionCall;

impl FunctionCall {
    pub fn erc20_transfer(to: Address, amount: U256) -> Bytes {
        encode_call(Signatures::ERC20_TRANSFER, &[Token::Address(to), Token::Uint(amount)])
    }

    /// Wallet-level call forwarding `value` and `data` to `to` with a gas cap
    pub fn wallet_execute(to: Address, value: U256, tx_gas: U256, data: &[u8]) -> Bytes {
        encode_call(
            Signatures::WALLET_EXECUTE,
            &[
                Token::Address(to),
                Token::Uint(value),
                Token::Uint(tx_gas),
                Token::Bytes(data.to_vec()),
            ],
        )
    }

    pub fn admin_clone(implementation: Address, salt: H256) -> Bytes {
        encode_call(
            Signatures::ADMIN_CLONE,
            &[Token::Address(implementation), Token::FixedBytes(salt.as_bytes().to_vec())],
        )
    }

    pub fn admin_predict_wallet_address(implementation: Address, salt: H256) -> Bytes {
        encode_call(
            Signatures::ADMIN_PREDICT_WALLET_ADDRESS,
            &[Token::Address(implementation), Token::FixedBytes(salt.as_bytes().to_vec())],
        )
    }

    /// `claim({creator, packet, claimer, signature})`
    pub fn red_packet_claim(creator: Address, packet: &RedPacket, claimer: Address, signature: &[u8]) -> Bytes {
        encode_call(
            Signatures::RED_PACKET_CLAIM,
            &[Token::Tuple(vec![
                Token::Address(creator),
                packet.to_token(),
                Token::Address(claimer),
                Token::Bytes(signature.to_vec()),
            ])],
        )
    }

    /// Zero-argument view call
    pub fn getter(signature: &str) -> Bytes {
        encode_call(signature, &[])
    }
}

/// Decode a single return value of type `kind`
pub fn decode_output(kind: ParamType, output: &[u8]) -> HexlinkResult<Token> {
    let label = kind.to_string();
    abi::decode(&[kind], output)?
        .into_iter()
        .next()
        .ok_or_else(|| HexlinkError::decode_error(format!("empty {} return data", label)))
}

pub fn decode_address(output: &[u8]) -> HexlinkResult<Address> {
    decode_output(ParamType::Address, output)?
        .into_address()
        .ok_or_else(|| HexlinkError::decode_error("expected address return data"))
}

pub fn decode_uint(output: &[u8]) -> HexlinkResult<U256> {
    decode_output(ParamType::Uint(256), output)?
        .into_uint()
        .ok_or_else(|| HexlinkError::decode_error("expected uint256 return data"))
}

pub fn decode_string(output: &[u8]) -> HexlinkResult<String> {
    decode_output(ParamType::String, output)?
        .into_string()
        .ok_or_else(|| HexlinkError::decode_error("expected string return data"))
}

pub fn decode_bool(output: &[u8]) -> HexlinkResult<bool> {
    decode_output(ParamType::Bool, output)?
        .into_bool()
        .ok_or_else(|| HexlinkError::decode_error("expected bool return data"))
}
