use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde_json::{json, Map, Value};
use shared::{
    domain::{Address, ConnectorKind, ProposalId, ProposalStage, TokenAmount, TokenId, VoteType},
    error::{ErrorCode, GatewayException},
};
use tokio::{net::TcpListener, sync::Mutex};

use crate::{
    controller::{BallotForm, ControllerOptions, MembershipController},
    gateway::HttpModuleGateway,
    page::PageState,
    wallet::JsonRpcWallet,
    DropModule, ModuleClients, TokenModule, VoteModule, WalletProvider,
};

const MEMBER_A: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const MEMBER_B: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
const DROP: &str = "0xc3107a142ee45118dae15962a990a31fc03728c2";
const TOKEN: &str = "0xfe459be9d474a45a0fe839fbaeea7b90531bca2c";
const VOTE: &str = "0x3697c5592cb205225fe6f354e1ae78c48be493c9";

#[derive(Clone, Default)]
struct GatewayState {
    calls: Arc<Mutex<Vec<(String, String, Value)>>>,
    reject_method: Arc<Mutex<Option<String>>>,
    accounts: Arc<Mutex<Vec<String>>>,
}

fn proposal_json(id: &str, state: u8) -> Value {
    json!({
        "proposal_id": id,
        "description": format!("proposal {id}"),
        "state": state,
        "votes": [
            {"type": 0, "label": "Against"},
            {"type": 1, "label": "For"},
            {"type": 2, "label": "Abstain"}
        ]
    })
}

async fn handle_module_call(
    State(state): State<GatewayState>,
    Path((module, method)): Path<(String, String)>,
    Json(params): Json<Value>,
) -> Json<Value> {
    state
        .calls
        .lock()
        .await
        .push((module, method.clone(), params.clone()));

    if state.reject_method.lock().await.as_deref() == Some(method.as_str()) {
        return Json(json!({
            "error": {"code": "reverted", "message": "execution reverted"}
        }));
    }

    let result = match method.as_str() {
        "balance_of" => {
            if params["address"] == MEMBER_A {
                json!("1")
            } else {
                json!("0")
            }
        }
        "claimer_addresses" => json!([MEMBER_A, MEMBER_B]),
        "holder_balances" => {
            let mut balances = Map::new();
            balances.insert(MEMBER_A.to_string(), json!("2000000000000000000"));
            Value::Object(balances)
        }
        "proposals" => json!([proposal_json("1", 1)]),
        "proposal" => proposal_json(params["proposal_id"].as_str().unwrap_or("1"), 1),
        "has_voted" => json!(false),
        "delegation_of" => json!(Address::ZERO_STR),
        "claim" | "delegate_to" | "vote" | "execute" => Value::Null,
        other => {
            return Json(json!({
                "error": {"code": "not_found", "message": format!("unknown method {other}")}
            }))
        }
    };
    Json(json!({ "result": result }))
}

async fn handle_wallet_rpc(
    State(state): State<GatewayState>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let id = body["id"].clone();
    let result = match body["method"].as_str() {
        Some("eth_requestAccounts") => json!(state.accounts.lock().await.clone()),
        Some("eth_chainId") => json!("0x4"),
        _ => {
            return Json(json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": {"code": -32601, "message": "method not found"}
            }))
        }
    };
    Json(json!({"jsonrpc": "2.0", "id": id, "result": result}))
}

async fn spawn_gateway() -> Result<(String, GatewayState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = GatewayState::default();
    *state.accounts.lock().await = vec![MEMBER_A.to_string()];
    let app = Router::new()
        .route("/modules/:module/:method", post(handle_module_call))
        .route("/rpc", post(handle_wallet_rpc))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

fn addr(raw: &str) -> Address {
    Address::parse(raw).expect("address")
}

#[tokio::test]
async fn balance_of_posts_owner_and_token() {
    let (base, state) = spawn_gateway().await.expect("gateway");
    let drop = HttpModuleGateway::new(&base, addr(DROP)).expect("client");

    let balance = drop
        .balance_of(&addr(MEMBER_A), &TokenId::membership())
        .await
        .expect("balance");
    assert_eq!(balance, TokenAmount(1));

    let calls = state.calls.lock().await;
    let (module, method, params) = &calls[0];
    assert_eq!(module, DROP);
    assert_eq!(method, "balance_of");
    assert_eq!(params["address"], MEMBER_A);
    assert_eq!(params["token_id"], "0");
}

#[tokio::test]
async fn error_envelope_surfaces_gateway_exception() {
    let (base, state) = spawn_gateway().await.expect("gateway");
    *state.reject_method.lock().await = Some("claim".to_string());
    let drop = HttpModuleGateway::new(&base, addr(DROP)).expect("client");

    let err = drop
        .claim(&TokenId::membership(), 1)
        .await
        .expect_err("claim rejected");
    let gateway_err = err
        .downcast_ref::<GatewayException>()
        .expect("gateway exception");
    assert_eq!(gateway_err.code, ErrorCode::Reverted);
}

#[tokio::test]
async fn token_and_vote_reads_decode() {
    let (base, _state) = spawn_gateway().await.expect("gateway");
    let token = HttpModuleGateway::new(&base, addr(TOKEN)).expect("client");
    let vote = token.for_module(addr(VOTE));

    let balances = token.all_holder_balances().await.expect("balances");
    assert_eq!(
        balances.get(&addr(MEMBER_A)),
        Some(&TokenAmount(2_000_000_000_000_000_000))
    );
    assert!(token
        .delegation_of(&addr(MEMBER_A))
        .await
        .expect("delegation")
        .is_zero());

    let proposal = vote.get(&ProposalId::new("9")).await.expect("proposal");
    assert_eq!(proposal.proposal_id, ProposalId::new("9"));
    assert_eq!(proposal.stage, ProposalStage::Active);
    vote.vote(&ProposalId::new("9"), VoteType::For)
        .await
        .expect("vote");
}

#[tokio::test]
async fn wallet_connect_reads_account_and_chain() {
    let (base, _state) = spawn_gateway().await.expect("gateway");
    let wallet = JsonRpcWallet::new(&format!("{base}/rpc")).expect("wallet");

    let session = wallet
        .connect(ConnectorKind::Injected)
        .await
        .expect("session");
    assert_eq!(session.address, addr(MEMBER_A));
    assert_eq!(session.chain_id.0, 4);
}

#[tokio::test]
async fn wallet_without_accounts_fails_to_connect() {
    let (base, state) = spawn_gateway().await.expect("gateway");
    state.accounts.lock().await.clear();
    let wallet = JsonRpcWallet::new(&format!("{base}/rpc")).expect("wallet");

    let err = wallet
        .connect(ConnectorKind::Injected)
        .await
        .expect_err("no accounts");
    assert!(err.to_string().contains("no accounts"));
}

#[tokio::test]
async fn controller_runs_member_flow_over_http() {
    let (base, state) = spawn_gateway().await.expect("gateway");
    let gateway = HttpModuleGateway::new(&base, addr(DROP)).expect("client");
    let clients = ModuleClients::new(
        Arc::new(JsonRpcWallet::new(&format!("{base}/rpc")).expect("wallet")),
        Arc::new(gateway.clone()),
        Arc::new(gateway.for_module(addr(TOKEN))),
        Arc::new(gateway.for_module(addr(VOTE))),
    );
    let mut controller = MembershipController::new(clients, ControllerOptions::default());

    controller.connect_wallet().await.expect("connect");
    let page = controller.model().member_page().expect("member page");
    let records = page.member_records(18).expect("records");
    assert_eq!(records[0].token_amount, "2.0");
    assert_eq!(records[1].token_amount, "0.0");

    let report = controller
        .submit_votes(&BallotForm::new())
        .await
        .expect("submit");
    assert!(report.delegated);
    assert_eq!(report.voted, vec![ProposalId::new("1")]);
    assert!(controller.model().has_voted());
    assert!(matches!(controller.model().state, PageState::Member(_)));

    let calls = state.calls.lock().await;
    let vote_call = calls
        .iter()
        .find(|(_, method, _)| method == "vote")
        .expect("vote call");
    assert_eq!(vote_call.0, VOTE);
    assert_eq!(vote_call.2["vote"], 2);
}
