use super::{respond, HexlinkService};
use crate::chain::{Chain, ChainRef};
use crate::error::HexlinkResult;
use crate::store::RequestRecord;
use crate::tx::{estimate_erc20_transfer, estimate_eth_transfer, TransferCost};
use crate::types::{u256_dec, Account, AuthContext, CallResult, OpInput, OperationType, Rejection, RequestData};
use crate::utils::logging::redact_email;
use crate::wallet::{derive_salt, normalize_amount_to_send, parse_amount, WalletDeriver};
use ethers_core::types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use serde_json::{json, Number, Value};

/// Caller identity for the wallet callables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedUser {
    pub uid: String,
    pub email: String,
}

/// Wallet callables need both a uid and an email on the auth context
pub fn validate_user(auth: &AuthContext) -> Result<VerifiedUser, Rejection> {
    let uid = auth
        .uid
        .clone()
        .filter(|uid| !uid.is_empty())
        .ok_or_else(Rejection::unauthorized)?;
    let email = auth
        .email
        .clone()
        .filter(|email| !email.trim().is_empty())
        .ok_or_else(Rejection::email_not_set)?;
    Ok(VerifiedUser { uid, email })
}

#[derive(Debug, Deserialize)]
struct ChainRequest {
    chain: ChainRef,
}

/// Ether amount as the client sends it, `"0.05"` or `0.05`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DecimalAmount {
    Text(String),
    Number(Number),
}

impl DecimalAmount {
    fn to_wei(&self) -> HexlinkResult<U256> {
        match self {
            DecimalAmount::Text(s) => parse_amount(s, 18),
            DecimalAmount::Number(n) => parse_amount(&n.to_string(), 18),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SendEthRequest {
    chain: ChainRef,
    receiver: String,
    amount: DecimalAmount,
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    contract: Address,
    decimals: u8,
}

#[derive(Debug, Deserialize)]
struct SendErc20Request {
    chain: ChainRef,
    receiver: String,
    /// Whole tokens, scaled by `token.decimals`
    amount: u64,
    token: TokenInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteRequest {
    chain: ChainRef,
    contract: Address,
    #[serde(with = "u256_dec")]
    amount: U256,
    #[serde(with = "u256_dec")]
    tx_gas: U256,
    #[serde(default)]
    tx_data: Bytes,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletMetadata {
    pub admin: Address,
    pub wallet_impl: Address,
    pub wallet: Address,
}

/// Everything a wallet callable needs once the caller is known
struct WalletContext {
    user: VerifiedUser,
    chain: &'static Chain,
    deriver: WalletDeriver,
    wallet: Address,
}

impl WalletContext {
    fn request_data(&self) -> RequestData {
        RequestData {
            uid: self.user.uid.clone(),
            account: Account { address: self.wallet },
            chain: ChainRef(self.chain),
        }
    }
}

macro_rules! wallet_callable {
    ($(#[$doc:meta])* $name:ident, $label:literal, $body:ident) => {
        $(#[$doc])*
        pub async fn $name(&self, payload: &Value, auth: &AuthContext) -> CallResult {
            let user = match validate_user(auth) {
                Ok(user) => user,
                Err(rejection) => return rejection.into(),
            };
            respond($label, self.$body(user, payload)).await
        }
    };
}

impl HexlinkService {
    wallet_callable!(
        /// Admin, implementation and wallet addresses of the caller
        metadata, "metadata", metadata_for);
    wallet_callable!(
        /// Queue the clone of the caller's wallet
        deploy_wallet, "deployWallet", deploy_wallet_for);
    wallet_callable!(send_eth, "sendETH", send_eth_for);
    wallet_callable!(send_erc20, "sendERC20", send_erc20_for);
    wallet_callable!(
        /// Arbitrary call made by the caller's wallet
        execute_tx, "executeTx", execute_tx_for);
    wallet_callable!(estimate_eth_transfer, "estimateETHTransfer", estimate_eth_for);
    wallet_callable!(estimate_erc20_transfer, "estimateERC20Transfer", estimate_erc20_for);

    async fn wallet_context(&self, user: VerifiedUser, chain: ChainRef) -> HexlinkResult<WalletContext> {
        let chain = chain.chain();
        let deriver = WalletDeriver::new(&self.config, self.provider(chain)?);
        let wallet = deriver.wallet_address(&user.email).await?;
        Ok(WalletContext {
            user,
            chain,
            deriver,
            wallet,
        })
    }

    async fn submit_wallet_op(
        &self,
        ctx: &WalletContext,
        kind: OperationType,
        input: OpInput,
        args: Value,
    ) -> HexlinkResult<Value> {
        let record = RequestRecord { to: input.to, args };
        let id = self
            .enqueue(&ctx.request_data(), kind, vec![], record, Some(input), None)
            .await?;
        Ok(json!({ "id": id }))
    }

    async fn metadata_for(&self, user: VerifiedUser, payload: &Value) -> HexlinkResult<WalletMetadata> {
        let ChainRequest { chain } = serde_json::from_value(payload.clone())?;
        let ctx = self.wallet_context(user, chain).await?;
        Ok(WalletMetadata {
            admin: ctx.deriver.admin(),
            wallet_impl: ctx.deriver.implementation_address(),
            wallet: ctx.wallet,
        })
    }

    async fn deploy_wallet_for(&self, user: VerifiedUser, payload: &Value) -> HexlinkResult<Value> {
        let ChainRequest { chain } = serde_json::from_value(payload.clone())?;
        let ctx = self.wallet_context(user, chain).await?;
        tracing::info!(chain = ctx.chain.name, email = %redact_email(&ctx.user.email), "deploying wallet");
        let input = self.intents.deploy_wallet_op(&ctx.user.email);
        let args = json!({ "salt": derive_salt(&ctx.user.email), "wallet": ctx.wallet });
        self.submit_wallet_op(&ctx, OperationType::DeployWallet, input, args).await
    }

    async fn send_eth_for(&self, user: VerifiedUser, payload: &Value) -> HexlinkResult<Value> {
        let data: SendEthRequest = serde_json::from_value(payload.clone())?;
        let amount = data.amount.to_wei()?;
        let ctx = self.wallet_context(user, data.chain).await?;
        let receiver = ctx.deriver.resolve_destination(&data.receiver).await?;

        let input = self.intents.send_eth_op(ctx.wallet, receiver, amount);
        let args = json!({ "receiver": receiver, "amount": amount.to_string() });
        self.submit_wallet_op(&ctx, OperationType::SendEth, input, args).await
    }

    async fn send_erc20_for(&self, user: VerifiedUser, payload: &Value) -> HexlinkResult<Value> {
        let data: SendErc20Request = serde_json::from_value(payload.clone())?;
        let amount = normalize_amount_to_send(data.amount, data.token.decimals)?;
        let ctx = self.wallet_context(user, data.chain).await?;
        let receiver = ctx.deriver.resolve_destination(&data.receiver).await?;

        let input = self
            .intents
            .send_erc20_op(ctx.wallet, data.token.contract, receiver, amount);
        let args = json!({
            "token": data.token.contract,
            "receiver": receiver,
            "amount": amount.to_string(),
        });
        self.submit_wallet_op(&ctx, OperationType::SendErc20, input, args).await
    }

    async fn execute_tx_for(&self, user: VerifiedUser, payload: &Value) -> HexlinkResult<Value> {
        let data: ExecuteRequest = serde_json::from_value(payload.clone())?;
        let ctx = self.wallet_context(user, data.chain).await?;
        let input = self
            .intents
            .execute_op(ctx.wallet, data.contract, data.amount, data.tx_gas, data.tx_data.clone());
        let args = json!({
            "contract": data.contract,
            "amount": data.amount.to_string(),
            "txGas": data.tx_gas.to_string(),
            "txData": data.tx_data,
        });
        self.submit_wallet_op(&ctx, OperationType::Execute, input, args).await
    }

    async fn estimate_eth_for(&self, _user: VerifiedUser, payload: &Value) -> HexlinkResult<TransferCost> {
        let ChainRequest { chain } = serde_json::from_value(payload.clone())?;
        let provider = self.provider(chain.chain())?;
        estimate_eth_transfer(provider.as_ref(), &self.config.call_policy).await
    }

    async fn estimate_erc20_for(&self, user: VerifiedUser, payload: &Value) -> HexlinkResult<TransferCost> {
        let data: SendErc20Request = serde_json::from_value(payload.clone())?;
        let amount = normalize_amount_to_send(data.amount, data.token.decimals)?;
        let ctx = self.wallet_context(user, data.chain).await?;
        let receiver = ctx.deriver.resolve_destination(&data.receiver).await?;
        let input = self
            .intents
            .send_erc20_op(ctx.wallet, data.token.contract, receiver, amount);
        let provider = self.provider(ctx.chain)?;
        estimate_erc20_transfer(provider.as_ref(), &self.config.call_policy, &input).await
    }
}
