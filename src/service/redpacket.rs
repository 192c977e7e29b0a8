use super::{respond, HexlinkService};
use crate::error::{HexlinkError, HexlinkResult};
use crate::redpacket::{redpacket_erc721_id, redpacket_id, RedPacket, RedPacketErc721};
use crate::store::RequestRecord;
use crate::types::{Action, AuthContext, CallResult, OpInput, OperationRequest, OperationType, RequestData};
use crate::utils::logging::{redact_address, short_hash};
use crate::utils::checksum;
use ethers_core::types::H256;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClaimRequest {
    red_packet_id: H256,
    #[serde(default)]
    claimer: Value,
}

/// `redPacket` payload: creation parameters plus pricing shown to the claimer
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RedPacketInput {
    #[serde(flatten)]
    packet: RedPacket,
    #[serde(default)]
    price_info: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequest {
    red_packet: Value,
    #[serde(default)]
    creator: Value,
    #[serde(default)]
    tx_hash: Option<H256>,
    #[serde(default)]
    request: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateErc721Request {
    erc721: Value,
    #[serde(default)]
    creator: Value,
    #[serde(default)]
    price_info: Option<Value>,
    #[serde(default)]
    tx_hash: Option<H256>,
    #[serde(default)]
    request: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponse {
    pub id: i64,
    pub red_packet_id: H256,
}

impl HexlinkService {
    /// Claim a share of a red packet for the calling account
    pub async fn claim_red_packet(&self, payload: &Value, auth: &AuthContext) -> CallResult {
        let request = match self.preprocess(payload, auth).await {
            Ok(request) => request,
            Err(result) => return result,
        };
        respond("claimRedPacket", self.claim(request, payload)).await
    }

    /// Record a pending ERC-20/native red packet and queue its creation
    pub async fn create_red_packet(&self, payload: &Value, auth: &AuthContext) -> CallResult {
        let request = match self.preprocess(payload, auth).await {
            Ok(request) => request,
            Err(result) => return result,
        };
        respond("createRedPacket", self.create(request, payload)).await
    }

    /// Record a pending ERC-721 drop and queue its deployment
    pub async fn create_red_packet_erc721(&self, payload: &Value, auth: &AuthContext) -> CallResult {
        let request = match self.preprocess(payload, auth).await {
            Ok(request) => request,
            Err(result) => return result,
        };
        respond("createRedPacketErc721", self.create_erc721(request, payload)).await
    }

    async fn preprocess(&self, payload: &Value, auth: &AuthContext) -> Result<RequestData, CallResult> {
        let outcome = self
            .config
            .call_policy
            .run("preprocess", async { Ok(self.preprocessor.preprocess(payload, auth).await) })
            .await;
        match outcome {
            Ok(Ok(request)) => Ok(request),
            Ok(Err(rejection)) => {
                tracing::info!(code = rejection.code, reason = %rejection.message, "request rejected");
                Err(rejection.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn claim(&self, request: RequestData, payload: &Value) -> HexlinkResult<Value> {
        let chain = request.chain.chain();
        let data: ClaimRequest = serde_json::from_value(payload.clone())?;

        let red_packet = self
            .config
            .call_policy
            .run("getRedPacket", self.store.get_red_packet(data.red_packet_id))
            .await?
            .ok_or_else(|| {
                HexlinkError::invalid_input("Failed to load redpacket")
                    .with_details(format!("id={:?}", data.red_packet_id))
            })?;

        let input = self
            .intents
            .build_claim_op(chain, &red_packet, request.account.address)
            .await?;
        let action = Action::InsertRedpacketClaim {
            red_packet_id: red_packet.id,
            creator_id: red_packet.user_id.clone(),
            claimer_id: request.uid.clone(),
            claimer: data.claimer,
        };
        let record = RequestRecord {
            to: input.to,
            args: json!({ "redPacketId": red_packet.id }),
        };

        let id = self
            .enqueue(&request, OperationType::ClaimRedpacket, vec![action], record, Some(input), None)
            .await?;
        Ok(json!({ "id": id }))
    }

    async fn create(&self, request: RequestData, payload: &Value) -> HexlinkResult<CreateResponse> {
        let chain = request.chain.chain();
        let data: CreateRequest = serde_json::from_value(payload.clone())?;
        let RedPacketInput { packet, price_info } = serde_json::from_value(data.red_packet.clone())?;

        let contract = self.config.red_packet_address(chain)?;
        let red_packet_id = redpacket_id(chain, contract, request.account.address, &packet);
        let action = Action::InsertRedpacket {
            user_id: request.uid.clone(),
            red_packet_id,
            creator: data.creator,
            refunder: self.config.refunder(chain)?,
            price_info,
        };
        let record = RequestRecord {
            to: contract,
            args: json!({ "redPacketId": red_packet_id, "metadata": data.red_packet }),
        };

        let (input, tx) = self.creation_tx(&request, data.tx_hash, data.request.as_ref()).await?;
        let id = self
            .enqueue(&request, OperationType::CreateRedpacket, vec![action], record, input, tx)
            .await?;
        Ok(CreateResponse { id, red_packet_id })
    }

    async fn create_erc721(&self, request: RequestData, payload: &Value) -> HexlinkResult<CreateResponse> {
        let chain = request.chain.chain();
        let data: CreateErc721Request = serde_json::from_value(payload.clone())?;
        let erc721: RedPacketErc721 = serde_json::from_value(data.erc721.clone())?;

        let factory = self.config.token_factory_address(chain)?;
        let red_packet_id = redpacket_erc721_id(chain, factory, request.account.address, &erc721);
        let action = Action::InsertRedpacketErc721 {
            user_id: request.uid.clone(),
            red_packet_id,
            salt: erc721.salt,
            creator: data.creator,
            refunder: self.config.refunder(chain)?,
            price_info: data.price_info,
        };
        let record = RequestRecord {
            to: factory,
            args: data.erc721,
        };

        let (input, tx) = self.creation_tx(&request, data.tx_hash, data.request.as_ref()).await?;
        let id = self
            .enqueue(&request, OperationType::CreateRedpacketErc721, vec![action], record, input, tx)
            .await?;
        Ok(CreateResponse { id, red_packet_id })
    }

    /// A client-broadcast hash wins; otherwise the client's user operation
    /// is validated into an account call
    async fn creation_tx(
        &self,
        request: &RequestData,
        tx_hash: Option<H256>,
        user_op: Option<&Value>,
    ) -> HexlinkResult<(Option<OpInput>, Option<H256>)> {
        if let Some(hash) = tx_hash {
            return Ok((None, Some(hash)));
        }
        let user_op = user_op.ok_or_else(|| HexlinkError::invalid_input("either txHash or request is required"))?;
        let input = self
            .config
            .call_policy
            .run(
                "validateUserOp",
                self.preprocessor
                    .validate_user_op(request.chain.chain(), &request.account, user_op),
            )
            .await?;
        Ok((Some(input), None))
    }

    /// Write the audit row, then hand the operation to the queue
    pub(super) async fn enqueue(
        &self,
        request: &RequestData,
        kind: OperationType,
        actions: Vec<Action>,
        record: RequestRecord,
        input: Option<OpInput>,
        tx: Option<H256>,
    ) -> HexlinkResult<i64> {
        let chain = request.chain.chain();
        let request_id = self
            .config
            .call_policy
            .run("insertRequest", self.store.insert_request(&request.uid, record))
            .await?;

        let operation = OperationRequest {
            kind,
            user_id: request.uid.clone(),
            account: request.account.address,
            actions,
            request_id,
            input,
            tx,
        };
        let receipt = self
            .config
            .call_policy
            .run("submit", self.submitter.submit(chain, operation))
            .await?;

        tracing::info!(
            chain = chain.name,
            op_id = receipt.id,
            request_id,
            kind = ?kind,
            account = %redact_address(checksum(&request.account.address)),
            tx = ?tx.map(|h| short_hash(format!("{:?}", h))),
            "operation submitted"
        );
        Ok(receipt.id)
    }
}
