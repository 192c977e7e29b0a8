//! Operation intents
//!
//! Each builder returns the [`OpInput`] an operation asks the queue to send.
//! Only the claim intent needs a signature; the rest are pure encodings.

use crate::abi::FunctionCall;
use crate::chain::Chain;
use crate::config::HexlinkConfig;
use crate::error::{HexlinkError, HexlinkResult};
use crate::signing::{sign_as, SignerResolver};
use crate::store::{RedPacketMetadata, RedPacketRecord};
use crate::redpacket::RedPacket;
use crate::types::OpInput;
use crate::utils::logging::short_hash;
use crate::utils::keccak256_h256;
use crate::wallet::{derive_salt, wallet_implementation_address};
use ethers_core::abi::{self, Token};
use ethers_core::types::{Address, Bytes, H256, U256};
use std::sync::Arc;

/// Gas forwarded by the wallet for a native transfer
pub const SEND_ETH_TX_GAS: u64 = 50_000;
/// Gas forwarded by the wallet for an ERC-20 transfer
pub const SEND_ERC20_TX_GAS: u64 = 65_000;

/// `keccak256(abi.encode(bytes32 id, address claimer))`, the message a
/// validator signs to authorize one claim
pub fn claim_message(red_packet_id: H256, claimer: Address) -> H256 {
    keccak256_h256(&abi::encode(&[
        Token::FixedBytes(red_packet_id.as_bytes().to_vec()),
        Token::Address(claimer),
    ]))
}

pub struct IntentBuilder {
    config: Arc<HexlinkConfig>,
    signers: Arc<dyn SignerResolver>,
}

impl IntentBuilder {
    pub fn new(config: Arc<HexlinkConfig>, signers: Arc<dyn SignerResolver>) -> Self {
        Self { config, signers }
    }

    /// Red packet `claim` call carrying the validator's signature
    pub async fn build_claim_op(
        &self,
        chain: &Chain,
        red_packet: &RedPacketRecord,
        claimer: Address,
    ) -> HexlinkResult<OpInput> {
        let RedPacketMetadata::Erc20 {
            token,
            salt,
            balance,
            split,
            validator,
            mode,
            creator,
            ..
        } = &red_packet.metadata
        else {
            return Err(HexlinkError::invalid_input("red packet is not claimable with a validator signature")
                .with_details(format!("id={:?}", red_packet.id)));
        };
        let to = self.config.red_packet_address(chain)?;

        let message = claim_message(red_packet.id, claimer);
        let signature = self
            .config
            .call_policy
            .run("signMessage", sign_as(self.signers.as_ref(), *validator, message))
            .await?;

        let packet = RedPacket {
            token: *token,
            salt: *salt,
            balance: *balance,
            validator: *validator,
            split: *split,
            mode: *mode,
        };
        tracing::info!(
            chain = chain.name,
            red_packet = %short_hash(format!("{:?}", red_packet.id)),
            "built claim operation"
        );

        Ok(OpInput {
            to,
            value: U256::zero(),
            call_data: FunctionCall::red_packet_claim(*creator, &packet, claimer, &signature.to_vec()),
            call_gas_limit: U256::zero(),
        })
    }

    /// Admin `clone(implementation, salt(email))`
    pub fn deploy_wallet_op(&self, email: &str) -> OpInput {
        let implementation = wallet_implementation_address(self.config.admin, &self.config.wallet_bytecode);
        OpInput {
            to: self.config.admin,
            value: U256::zero(),
            call_data: FunctionCall::admin_clone(implementation, derive_salt(email)),
            call_gas_limit: U256::zero(),
        }
    }

    /// Native transfer out of `wallet`
    pub fn send_eth_op(&self, wallet: Address, receiver: Address, amount: U256) -> OpInput {
        self.execute_op(wallet, receiver, amount, U256::from(SEND_ETH_TX_GAS), Bytes::default())
    }

    /// ERC-20 `transfer` executed by `wallet`
    pub fn send_erc20_op(&self, wallet: Address, token: Address, receiver: Address, amount: U256) -> OpInput {
        self.execute_op(
            wallet,
            token,
            U256::zero(),
            U256::from(SEND_ERC20_TX_GAS),
            FunctionCall::erc20_transfer(receiver, amount),
        )
    }

    /// Arbitrary call executed by `wallet`
    pub fn execute_op(&self, wallet: Address, contract: Address, amount: U256, tx_gas: U256, tx_data: Bytes) -> OpInput {
        OpInput {
            to: wallet,
            value: U256::zero(),
            call_data: FunctionCall::wallet_execute(contract, amount, tx_gas, &tx_data),
            call_gas_limit: U256::zero(),
        }
    }
}
