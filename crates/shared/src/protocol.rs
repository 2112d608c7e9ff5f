use serde::{Deserialize, Serialize};

use crate::{
    domain::{Address, ProposalId, TokenAmount, TokenId, VoteType},
    error::GatewayError,
};

/// Calls understood by the module gateway, addressed as
/// `POST {gateway}/modules/{module_address}/{method}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleMethod {
    BalanceOf,
    Claim,
    ClaimerAddresses,
    CreateBatch,
    Metadata,
    HolderBalances,
    DelegationOf,
    DelegateTo,
    Mint,
    TotalSupply,
    TransferBatch,
    Proposals,
    Proposal,
    HasVoted,
    Vote,
    Execute,
    DeployBundleDrop,
    DeployToken,
    DeployVote,
}

impl ModuleMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            ModuleMethod::BalanceOf => "balance_of",
            ModuleMethod::Claim => "claim",
            ModuleMethod::ClaimerAddresses => "claimer_addresses",
            ModuleMethod::CreateBatch => "create_batch",
            ModuleMethod::Metadata => "metadata",
            ModuleMethod::HolderBalances => "holder_balances",
            ModuleMethod::DelegationOf => "delegation_of",
            ModuleMethod::DelegateTo => "delegate_to",
            ModuleMethod::Mint => "mint",
            ModuleMethod::TotalSupply => "total_supply",
            ModuleMethod::TransferBatch => "transfer_batch",
            ModuleMethod::Proposals => "proposals",
            ModuleMethod::Proposal => "proposal",
            ModuleMethod::HasVoted => "has_voted",
            ModuleMethod::Vote => "vote",
            ModuleMethod::Execute => "execute",
            ModuleMethod::DeployBundleDrop => "deploy_bundle_drop",
            ModuleMethod::DeployToken => "deploy_token",
            ModuleMethod::DeployVote => "deploy_vote",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayResponse<T> {
    Result(T),
    Error(GatewayError),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoParams {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceOfParams {
    pub address: Address,
    pub token_id: TokenId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimParams {
    pub token_id: TokenId,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenParams {
    pub token_id: TokenId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountParams {
    pub address: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegateToParams {
    pub delegatee: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalParams {
    pub proposal_id: ProposalId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HasVotedParams {
    pub proposal_id: ProposalId,
    pub address: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteParams {
    pub proposal_id: ProposalId,
    pub vote: VoteType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployBundleDropRequest {
    pub name: String,
    pub description: String,
    pub image_b64: String,
    pub primary_sale_recipient: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployTokenRequest {
    pub name: String,
    pub symbol: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployVoteRequest {
    pub name: String,
    pub voting_token_address: Address,
    pub proposal_start_wait_secs: u64,
    pub proposal_voting_secs: u64,
    pub voting_quorum_fraction: u8,
    pub min_tokens_to_propose: TokenAmount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NftMetadataInput {
    pub name: String,
    pub description: String,
    pub image_b64: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBatchRequest {
    pub items: Vec<NftMetadataInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintRequest {
    pub amount: TokenAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTarget {
    pub address: Address,
    pub amount: TokenAmount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferBatchRequest {
    pub targets: Vec<TransferTarget>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedModule {
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleMetadata {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    pub params: Vec<serde_json::Value>,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            method: method.into(),
            params: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcErrorBody {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<JsonRpcErrorBody>,
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn gateway_response_is_tagged_by_outcome() {
        let ok: GatewayResponse<bool> = serde_json::from_str(r#"{"result":true}"#).expect("ok");
        assert!(matches!(ok, GatewayResponse::Result(true)));

        let err: GatewayResponse<bool> =
            serde_json::from_str(r#"{"error":{"code":"user_rejected","message":"denied"}}"#)
                .expect("err");
        match err {
            GatewayResponse::Error(e) => assert_eq!(e.code, ErrorCode::UserRejected),
            GatewayResponse::Result(_) => panic!("expected error envelope"),
        }
    }

    #[test]
    fn holder_balances_decode_into_address_keyed_map() {
        let raw = r#"{"0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA":"2000000000000000000"}"#;
        let balances: HashMap<Address, TokenAmount> = serde_json::from_str(raw).expect("map");
        let key = Address::parse("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa").expect("addr");
        assert_eq!(balances.get(&key), Some(&TokenAmount(2_000_000_000_000_000_000)));
    }
}
