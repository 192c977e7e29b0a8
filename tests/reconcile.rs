use ethers_core::abi::{self, Token};
use ethers_core::types::{Address, Bytes, Log, TransactionReceipt, H256, U256};
use hexlink_core::abi::{FunctionCall, HexlinkEvent, Signatures};
use hexlink_core::chain::GOERLI;
use hexlink_core::reconcile::{ActionOutcome, Reconciler, CLAIM_NOT_FOUND, ERC721_NOT_FOUND, RED_PACKET_NOT_FOUND};
use hexlink_core::store::RedPacketMetadata;
use hexlink_core::testing::{event_log, receipt, InMemoryDatastore, StaticProvider};
use hexlink_core::{
    redpacket_id, Action, ErrorCode, HexlinkConfig, Operation, OperationRequest, OperationType, RedPacket,
};
use serde_json::json;
use std::sync::Arc;

fn config() -> Arc<HexlinkConfig> {
    Arc::new(
        HexlinkConfig::from_json_str(
            r#"{
                "admin": "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
                "walletBytecode": "0x600a600c600039600a6000f3602a60005260206000f3",
                "deployments": {
                    "goerli": {
                        "redPacket": "0x1111111111111111111111111111111111111111",
                        "tokenFactory": "0x2222222222222222222222222222222222222222",
                        "refunder": "0x3333333333333333333333333333333333333333"
                    }
                }
            }"#,
        )
        .expect("test config is valid"),
    )
}

fn red_packet_contract() -> Address {
    Address::repeat_byte(0x11)
}

fn token_factory() -> Address {
    Address::repeat_byte(0x22)
}

fn refunder() -> Address {
    Address::repeat_byte(0x33)
}

fn account() -> Address {
    Address::repeat_byte(0x0a)
}

fn packet() -> RedPacket {
    RedPacket {
        token: Address::repeat_byte(0xaa),
        salt: H256::repeat_byte(0xbb),
        balance: U256::from_dec_str("1000000000000000000").unwrap(),
        validator: Address::repeat_byte(0xcc),
        split: 5,
        mode: 0,
    }
}

fn packet_id() -> H256 {
    redpacket_id(&GOERLI, red_packet_contract(), account(), &packet())
}

fn created_log() -> Log {
    event_log(
        red_packet_contract(),
        HexlinkEvent::Created,
        &[Token::FixedBytes(packet_id().as_bytes().to_vec()), Token::Address(account())],
        &[packet().to_token()],
    )
}

fn deposit_log(amount: u64) -> Log {
    event_log(
        account(),
        HexlinkEvent::Deposit,
        &[
            Token::FixedBytes(packet_id().as_bytes().to_vec()),
            Token::Address(refunder()),
            Token::Address(Address::zero()),
        ],
        &[Token::Uint(U256::from(amount))],
    )
}

fn insert_red_packet() -> Action {
    Action::InsertRedpacket {
        user_id: "alice-uid".to_string(),
        red_packet_id: packet_id(),
        creator: json!({"handle": "alice@example.com"}),
        refunder: refunder(),
        price_info: Some(json!({"gasPrice": "1000000000"})),
    }
}

fn insert_claim() -> Action {
    Action::InsertRedpacketClaim {
        red_packet_id: packet_id(),
        creator_id: "creator-uid".to_string(),
        claimer_id: "alice-uid".to_string(),
        claimer: json!({"handle": "alice@example.com"}),
    }
}

fn operation(kind: OperationType, actions: Vec<Action>) -> Operation {
    Operation {
        id: 7,
        request: OperationRequest {
            kind,
            user_id: "alice-uid".to_string(),
            account: account(),
            actions,
            request_id: 1,
            input: None,
            tx: Some(H256::repeat_byte(0xee)),
        },
    }
}

fn reconciler(store: &Arc<InMemoryDatastore>, provider: StaticProvider) -> Reconciler {
    Reconciler::new(config(), store.clone(), Arc::new(provider))
}

fn mined(logs: Vec<Log>) -> TransactionReceipt {
    receipt(logs)
}

#[tokio::test]
async fn created_event_settles_red_packet() {
    let store = Arc::new(InMemoryDatastore::new());
    let reconciler = reconciler(&store, StaticProvider::new(5));
    let op = operation(OperationType::CreateRedpacket, vec![insert_red_packet()]);

    let reports = reconciler
        .process_actions(&GOERLI, &op, &mined(vec![created_log(), deposit_log(2_000)]))
        .await;
    assert_eq!(reports.len(), 1);
    assert!(reports[0].is_settled(), "{:?}", reports[0].outcome);

    let stored = store.red_packets();
    assert_eq!(stored.len(), 1);
    assert_eq!(store.insert_count(), 1);

    let record = &stored[0];
    assert_eq!(record.id, packet_id());
    assert_eq!(record.op_id, 7);
    assert_eq!(record.user_id, "alice-uid");
    match &record.metadata {
        RedPacketMetadata::Erc20 {
            token,
            split,
            validator,
            creator,
            contract,
            ..
        } => {
            assert_eq!(*token, Address::repeat_byte(0xaa));
            assert_eq!(*split, 5);
            assert_eq!(*validator, Address::repeat_byte(0xcc));
            assert_eq!(*creator, account());
            assert_eq!(*contract, red_packet_contract());
        }
        other => panic!("unexpected metadata {:?}", other),
    }

    let value = serde_json::to_value(record).unwrap();
    assert_eq!(value["metadata"]["balance"], "1000000000000000000");
    assert_eq!(record.deposit.amount.as_deref(), Some("2000"));
    assert_eq!(record.deposit.receipt, Some(refunder()));
    assert_eq!(record.deposit.price_info, Some(json!({"gasPrice": "1000000000"})));
}

#[tokio::test]
async fn reconciling_twice_changes_nothing() {
    let store = Arc::new(InMemoryDatastore::new());
    let reconciler = reconciler(&store, StaticProvider::new(5));
    let op = operation(OperationType::CreateRedpacket, vec![insert_red_packet()]);
    let receipt = mined(vec![created_log(), deposit_log(2_000)]);

    reconciler.process_actions(&GOERLI, &op, &receipt).await;
    let first = store.red_packets();
    reconciler.process_actions(&GOERLI, &op, &receipt).await;

    assert_eq!(store.insert_count(), 1);
    assert_eq!(store.red_packets(), first);
    assert!(store.operation_notes().is_empty());
}

#[tokio::test]
async fn missing_deposit_still_settles() {
    let store = Arc::new(InMemoryDatastore::new());
    let reconciler = reconciler(&store, StaticProvider::new(5));
    let op = operation(OperationType::CreateRedpacket, vec![insert_red_packet()]);

    let reports = reconciler.process_actions(&GOERLI, &op, &mined(vec![created_log()])).await;
    assert!(reports[0].is_settled());
    let record = &store.red_packets()[0];
    assert!(record.deposit.amount.is_none());
    assert!(record.deposit.price_info.is_some());
}

#[tokio::test]
async fn empty_receipt_notes_every_action() {
    let store = Arc::new(InMemoryDatastore::new());
    let reconciler = reconciler(&store, StaticProvider::new(5));
    let erc721 = Action::InsertRedpacketErc721 {
        user_id: "alice-uid".to_string(),
        red_packet_id: H256::repeat_byte(0x72),
        salt: H256::repeat_byte(0x01),
        creator: json!({}),
        refunder: refunder(),
        price_info: None,
    };
    let op = operation(OperationType::CreateRedpacket, vec![insert_red_packet(), insert_claim(), erc721]);

    let reports = reconciler.process_actions(&GOERLI, &op, &mined(vec![])).await;
    let outcomes: Vec<_> = reports.iter().map(|r| r.outcome.clone().unwrap()).collect();
    assert_eq!(
        outcomes,
        vec![
            ActionOutcome::NotFound(RED_PACKET_NOT_FOUND),
            ActionOutcome::NotFound(CLAIM_NOT_FOUND),
            ActionOutcome::NotFound(ERC721_NOT_FOUND),
        ]
    );

    assert!(store.red_packets().is_empty());
    assert!(store.claims().is_empty());
    // One note per operation; whichever action wrote last
    let notes = store.operation_notes();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].0, 7);
    assert!([CLAIM_NOT_FOUND, ERC721_NOT_FOUND, RED_PACKET_NOT_FOUND].contains(&notes[0].1.as_str()));
}

#[tokio::test]
async fn absent_claim_does_not_block_present_red_packet() {
    let store = Arc::new(InMemoryDatastore::new());
    let reconciler = reconciler(&store, StaticProvider::new(5));
    let op = operation(OperationType::CreateRedpacket, vec![insert_red_packet(), insert_claim()]);

    let reports = reconciler
        .process_actions(&GOERLI, &op, &mined(vec![created_log(), deposit_log(250)]))
        .await;

    assert!(reports[0].is_settled());
    assert_eq!(reports[1].outcome.as_ref().unwrap(), &ActionOutcome::NotFound(CLAIM_NOT_FOUND));
    assert_eq!(store.red_packets().len(), 1);
    assert!(store.claims().is_empty());
    assert_eq!(store.operation_notes(), vec![(op.id, CLAIM_NOT_FOUND.to_string())]);
}

#[tokio::test]
async fn replaying_a_missing_event_keeps_one_note() {
    let store = Arc::new(InMemoryDatastore::new());
    let reconciler = reconciler(&store, StaticProvider::new(5));
    let op = operation(OperationType::ClaimRedpacket, vec![insert_claim()]);

    for _ in 0..2 {
        let reports = reconciler.process_actions(&GOERLI, &op, &mined(vec![])).await;
        assert_eq!(reports[0].outcome.as_ref().unwrap(), &ActionOutcome::NotFound(CLAIM_NOT_FOUND));
    }
    assert_eq!(store.operation_notes(), vec![(op.id, CLAIM_NOT_FOUND.to_string())]);
}

#[tokio::test]
async fn deploy_receipt_confirms_wallet_clone() {
    let store = Arc::new(InMemoryDatastore::new());
    let reconciler = reconciler(&store, StaticProvider::new(5));
    let op = operation(OperationType::DeployWallet, vec![]);
    let clone_of = |wallet: Address| {
        event_log(
            config().admin,
            HexlinkEvent::CloneWallet,
            &[Token::Address(Address::repeat_byte(0x5e)), Token::Address(wallet)],
            &[],
        )
    };

    let confirmed = mined(vec![clone_of(account())]);
    assert!(reconciler.confirm_wallet_clone(&op, &confirmed).unwrap());
    assert!(reconciler.process_actions(&GOERLI, &op, &confirmed).await.is_empty());

    assert!(!reconciler.confirm_wallet_clone(&op, &mined(vec![clone_of(Address::repeat_byte(0x0b))])).unwrap());
    assert!(!reconciler.confirm_wallet_clone(&op, &mined(vec![])).unwrap());
    assert!(store.operation_notes().is_empty());
}

#[tokio::test]
async fn one_failing_action_does_not_block_another() {
    let store = Arc::new(InMemoryDatastore::new());
    let reconciler = reconciler(&store, StaticProvider::new(5));
    let op = operation(OperationType::CreateRedpacket, vec![insert_red_packet(), insert_claim()]);

    // Right topic and contract, truncated body
    let broken_claim = Log {
        address: red_packet_contract(),
        topics: vec![HexlinkEvent::Claimed.topic()],
        data: Bytes::from(vec![0x01, 0x02, 0x03]),
        ..Default::default()
    };
    let reports = reconciler
        .process_actions(&GOERLI, &op, &mined(vec![created_log(), broken_claim]))
        .await;

    assert!(reports[0].is_settled());
    let err = reports[1].outcome.as_ref().unwrap_err();
    assert_eq!(err.code, ErrorCode::DecodeError);
    let details = err.details.as_deref().unwrap_or_default();
    assert!(details.contains("event=Claimed"), "{}", details);
    assert!(details.contains("logIndex=1"), "{}", details);

    assert_eq!(store.red_packets().len(), 1);
    assert!(store.claims().is_empty());
}

#[tokio::test]
async fn claimed_event_settles_claim() {
    let store = Arc::new(InMemoryDatastore::new());
    let reconciler = reconciler(&store, StaticProvider::new(5));
    let op = operation(OperationType::ClaimRedpacket, vec![insert_claim()]);

    let claimed = |claimer: Address, amount: u64| {
        event_log(
            red_packet_contract(),
            HexlinkEvent::Claimed,
            &[Token::FixedBytes(packet_id().as_bytes().to_vec()), Token::Address(claimer)],
            &[Token::Uint(U256::from(amount))],
        )
    };
    let receipt = mined(vec![claimed(Address::repeat_byte(0x99), 1), claimed(account(), 200)]);

    for _ in 0..2 {
        let reports = reconciler.process_actions(&GOERLI, &op, &receipt).await;
        assert!(reports[0].is_settled());
    }

    let claims = store.claims();
    assert_eq!(claims.len(), 1);
    assert_eq!(store.insert_count(), 1);
    assert_eq!(claims[0].claimed.claimer, account());
    assert_eq!(claims[0].claimed.amount, U256::from(200));
    assert_eq!(claims[0].key(), (packet_id(), "alice-uid".to_string()));
}

#[tokio::test]
async fn deployed_drop_reads_token_metadata() {
    let store = Arc::new(InMemoryDatastore::new());
    let drop_token = Address::repeat_byte(0x50);
    let salt = H256::repeat_byte(0x01);
    let getter = |signature: &'static str| FunctionCall::getter(signature);
    let provider = StaticProvider::new(5)
        .with_call(drop_token, getter(Signatures::ERC721_NAME), abi::encode(&[Token::String("Drop".into())]))
        .with_call(drop_token, getter(Signatures::ERC721_SYMBOL), abi::encode(&[Token::String("DRP".into())]))
        .with_call(drop_token, getter(Signatures::ERC721_MAX_SUPPLY), abi::encode(&[Token::Uint(U256::from(100))]))
        .with_call(
            drop_token,
            getter(Signatures::ERC721_VALIDATOR),
            abi::encode(&[Token::Address(Address::repeat_byte(0xcc))]),
        )
        .with_call(drop_token, getter(Signatures::ERC721_TRANSFERRABLE), abi::encode(&[Token::Bool(false)]));
    let reconciler = reconciler(&store, provider);

    let action = Action::InsertRedpacketErc721 {
        user_id: "alice-uid".to_string(),
        red_packet_id: H256::repeat_byte(0x72),
        salt,
        creator: json!({}),
        refunder: refunder(),
        price_info: None,
    };
    let op = operation(OperationType::CreateRedpacketErc721, vec![action]);
    let deployed = event_log(
        token_factory(),
        HexlinkEvent::Deployed,
        &[Token::Address(drop_token), Token::Address(account())],
        &[Token::FixedBytes(salt.as_bytes().to_vec())],
    );

    let reports = reconciler.process_actions(&GOERLI, &op, &mined(vec![deployed])).await;
    assert!(reports[0].is_settled(), "{:?}", reports[0].outcome);

    let record = &store.red_packets()[0];
    assert_eq!(record.id, H256::repeat_byte(0x72));
    assert_eq!(
        record.metadata,
        RedPacketMetadata::Erc721 {
            token: drop_token,
            salt,
            creator: account(),
            name: "Drop".to_string(),
            symbol: "DRP".to_string(),
            max_supply: U256::from(100),
            validator: Address::repeat_byte(0xcc),
            transferrable: false,
        }
    );
}
