use crate::abi::{decode_address, decode_bool, decode_string, decode_uint, FunctionCall, Signatures};
use crate::error::HexlinkResult;
use crate::provider::ChainProvider;
use crate::utils::CallPolicy;
use ethers_core::types::{Address, Bytes, U256};

/// Metadata of a deployed ERC-721 drop, read from the token contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Erc721Metadata {
    pub name: String,
    pub symbol: String,
    pub max_supply: U256,
    pub validator: Address,
    pub transferrable: bool,
}

async fn view(
    provider: &dyn ChainProvider,
    policy: &CallPolicy,
    token: Address,
    signature: &'static str,
) -> HexlinkResult<Bytes> {
    policy.run(signature, provider.call(token, FunctionCall::getter(signature))).await
}

/// Read all drop fields concurrently
pub async fn read_erc721_metadata(
    provider: &dyn ChainProvider,
    policy: &CallPolicy,
    token: Address,
) -> HexlinkResult<Erc721Metadata> {
    let (name, symbol, max_supply, validator, transferrable) = futures::try_join!(
        view(provider, policy, token, Signatures::ERC721_NAME),
        view(provider, policy, token, Signatures::ERC721_SYMBOL),
        view(provider, policy, token, Signatures::ERC721_MAX_SUPPLY),
        view(provider, policy, token, Signatures::ERC721_VALIDATOR),
        view(provider, policy, token, Signatures::ERC721_TRANSFERRABLE),
    )?;

    Ok(Erc721Metadata {
        name: decode_string(&name)?,
        symbol: decode_string(&symbol)?,
        max_supply: decode_uint(&max_supply)?,
        validator: decode_address(&validator)?,
        transferrable: decode_bool(&transferrable)?,
    })
}
