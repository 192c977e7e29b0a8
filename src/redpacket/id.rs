//! Deterministic red packet ids

use super::{RedPacket, RedPacketErc721};
use crate::chain::Chain;
use crate::utils::keccak256_h256;
use ethers_core::abi::{self, Token};
use ethers_core::types::{Address, H256};

/// `keccak256(abi.encode(uint256 chainId, address contract, address creator, packet))`
pub fn redpacket_id(chain: &Chain, contract: Address, creator: Address, packet: &RedPacket) -> H256 {
    keccak256_h256(&abi::encode(&[
        Token::Uint(chain.id_u256()),
        Token::Address(contract),
        Token::Address(creator),
        packet.to_token(),
    ]))
}

/// Same construction as [`redpacket_id`], keyed on the drop factory and the
/// ERC-721 creation parameters
pub fn redpacket_erc721_id(
    chain: &Chain,
    factory: Address,
    creator: Address,
    erc721: &RedPacketErc721,
) -> H256 {
    keccak256_h256(&abi::encode(&[
        Token::Uint(chain.id_u256()),
        Token::Address(factory),
        Token::Address(creator),
        erc721.to_token(),
    ]))
}
