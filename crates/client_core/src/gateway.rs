//! HTTP client for the module gateway fronting the on-chain modules.

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{Address, Proposal, ProposalId, TokenAmount, TokenId, VoteType},
    error::GatewayException,
    protocol::{
        AccountParams, BalanceOfParams, ClaimParams, CreateBatchRequest, DelegateToParams,
        DeployBundleDropRequest, DeployTokenRequest, DeployVoteRequest, DeployedModule,
        GatewayResponse, HasVotedParams, MintRequest, ModuleMetadata, ModuleMethod, NoParams,
        NftMetadataInput, ProposalParams, TokenParams, TransferBatchRequest, TransferTarget,
        VoteParams,
    },
};
use tracing::debug;
use url::Url;

use crate::{
    provision::{AppModule, DropAdmin, TokenAdmin},
    DropModule, TokenModule, VoteModule,
};

/// One handle per module address; handles created with [`Self::for_module`]
/// share the underlying HTTP client.
#[derive(Clone)]
pub struct HttpModuleGateway {
    http: Client,
    base: Url,
    module: Address,
}

impl HttpModuleGateway {
    pub fn new(gateway_url: &str, module: Address) -> Result<Self> {
        let base = normalize_base(gateway_url)?;
        Ok(Self {
            http: Client::new(),
            base,
            module,
        })
    }

    pub fn for_module(&self, module: Address) -> Self {
        Self {
            http: self.http.clone(),
            base: self.base.clone(),
            module,
        }
    }

    pub fn module(&self) -> &Address {
        &self.module
    }

    fn method_url(&self, method: ModuleMethod) -> Result<Url> {
        self.base
            .join(&format!("modules/{}/{}", self.module, method.as_str()))
            .with_context(|| format!("invalid gateway url for method {}", method.as_str()))
    }

    async fn call<P, T>(&self, method: ModuleMethod, params: &P) -> Result<T>
    where
        P: Serialize + Sync + ?Sized,
        T: DeserializeOwned + Send,
    {
        let url = self.method_url(method)?;
        debug!(module = %self.module, method = method.as_str(), "module gateway call");
        let res = self
            .http
            .post(url.clone())
            .json(params)
            .send()
            .await
            .with_context(|| format!("failed to reach module gateway at {url}"))?;
        let status = res.status();
        let body: GatewayResponse<T> = res.json().await.with_context(|| {
            format!(
                "malformed gateway response for {} (status {status})",
                method.as_str()
            )
        })?;
        match body {
            GatewayResponse::Result(value) => Ok(value),
            GatewayResponse::Error(err) => Err(GatewayException::from(err)).with_context(|| {
                format!("{} on module {} rejected", method.as_str(), self.module)
            }),
        }
    }
}

fn normalize_base(gateway_url: &str) -> Result<Url> {
    let trimmed = gateway_url.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Url::parse(&with_slash).with_context(|| format!("invalid gateway url '{gateway_url}'"))
}

#[async_trait]
impl DropModule for HttpModuleGateway {
    fn address(&self) -> &Address {
        &self.module
    }

    async fn balance_of(&self, owner: &Address, token_id: &TokenId) -> Result<TokenAmount> {
        self.call(
            ModuleMethod::BalanceOf,
            &BalanceOfParams {
                address: owner.clone(),
                token_id: token_id.clone(),
            },
        )
        .await
    }

    async fn claim(&self, token_id: &TokenId, quantity: u32) -> Result<()> {
        self.call(
            ModuleMethod::Claim,
            &ClaimParams {
                token_id: token_id.clone(),
                quantity,
            },
        )
        .await
    }

    async fn all_claimer_addresses(&self, token_id: &TokenId) -> Result<Vec<Address>> {
        self.call(
            ModuleMethod::ClaimerAddresses,
            &TokenParams {
                token_id: token_id.clone(),
            },
        )
        .await
    }
}

#[async_trait]
impl TokenModule for HttpModuleGateway {
    async fn all_holder_balances(&self) -> Result<HashMap<Address, TokenAmount>> {
        self.call(ModuleMethod::HolderBalances, &NoParams {}).await
    }

    async fn delegation_of(&self, owner: &Address) -> Result<Address> {
        self.call(
            ModuleMethod::DelegationOf,
            &AccountParams {
                address: owner.clone(),
            },
        )
        .await
    }

    async fn delegate_to(&self, delegatee: &Address) -> Result<()> {
        self.call(
            ModuleMethod::DelegateTo,
            &DelegateToParams {
                delegatee: delegatee.clone(),
            },
        )
        .await
    }
}

#[async_trait]
impl VoteModule for HttpModuleGateway {
    async fn all(&self) -> Result<Vec<Proposal>> {
        self.call(ModuleMethod::Proposals, &NoParams {}).await
    }

    async fn has_voted(&self, proposal_id: &ProposalId, voter: &Address) -> Result<bool> {
        self.call(
            ModuleMethod::HasVoted,
            &HasVotedParams {
                proposal_id: proposal_id.clone(),
                address: voter.clone(),
            },
        )
        .await
    }

    async fn get(&self, proposal_id: &ProposalId) -> Result<Proposal> {
        self.call(
            ModuleMethod::Proposal,
            &ProposalParams {
                proposal_id: proposal_id.clone(),
            },
        )
        .await
    }

    async fn vote(&self, proposal_id: &ProposalId, vote: VoteType) -> Result<()> {
        self.call(
            ModuleMethod::Vote,
            &VoteParams {
                proposal_id: proposal_id.clone(),
                vote,
            },
        )
        .await
    }

    async fn execute(&self, proposal_id: &ProposalId) -> Result<()> {
        self.call(
            ModuleMethod::Execute,
            &ProposalParams {
                proposal_id: proposal_id.clone(),
            },
        )
        .await
    }
}

#[async_trait]
impl AppModule for HttpModuleGateway {
    async fn deploy_bundle_drop(&self, request: DeployBundleDropRequest) -> Result<Address> {
        let deployed: DeployedModule = self.call(ModuleMethod::DeployBundleDrop, &request).await?;
        Ok(deployed.address)
    }

    async fn deploy_token(&self, request: DeployTokenRequest) -> Result<Address> {
        let deployed: DeployedModule = self.call(ModuleMethod::DeployToken, &request).await?;
        Ok(deployed.address)
    }

    async fn deploy_vote(&self, request: DeployVoteRequest) -> Result<Address> {
        let deployed: DeployedModule = self.call(ModuleMethod::DeployVote, &request).await?;
        Ok(deployed.address)
    }
}

#[async_trait]
impl DropAdmin for HttpModuleGateway {
    async fn create_batch(&self, items: Vec<NftMetadataInput>) -> Result<()> {
        self.call(ModuleMethod::CreateBatch, &CreateBatchRequest { items })
            .await
    }

    async fn metadata(&self) -> Result<ModuleMetadata> {
        self.call(ModuleMethod::Metadata, &NoParams {}).await
    }
}

#[async_trait]
impl TokenAdmin for HttpModuleGateway {
    async fn mint(&self, amount: TokenAmount) -> Result<()> {
        self.call(ModuleMethod::Mint, &MintRequest { amount }).await
    }

    async fn total_supply(&self) -> Result<TokenAmount> {
        self.call(ModuleMethod::TotalSupply, &NoParams {}).await
    }

    async fn transfer_batch(&self, targets: Vec<TransferTarget>) -> Result<()> {
        self.call(ModuleMethod::TransferBatch, &TransferBatchRequest { targets })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_urls_keep_gateway_path_prefix() {
        let module = Address::parse("0xc3107a142ee45118dae15962a990a31fc03728c2").expect("addr");
        let gateway = HttpModuleGateway::new("http://localhost:8545/api", module).expect("gateway");
        let url = gateway.method_url(ModuleMethod::BalanceOf).expect("url");
        assert_eq!(
            url.as_str(),
            "http://localhost:8545/api/modules/0xc3107a142ee45118dae15962a990a31fc03728c2/balance_of"
        );
    }

    #[test]
    fn rejects_unparseable_gateway_url() {
        assert!(HttpModuleGateway::new("not a url", Address::zero()).is_err());
    }
}
