//! One-shot provisioning of the membership drop, governance token and vote
//! module.

use std::ops::RangeInclusive;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::Rng;
use shared::{
    domain::{Address, TokenAmount, TokenId},
    protocol::{
        DeployBundleDropRequest, DeployTokenRequest, DeployVoteRequest, ModuleMetadata,
        NftMetadataInput, TransferTarget,
    },
};
use tracing::info;

use crate::DropModule;

const DEFAULT_VOTING_SECS: u64 = 24 * 60 * 60;

/// Deployment entry point of the application contract.
#[async_trait]
pub trait AppModule: Send + Sync {
    async fn deploy_bundle_drop(&self, request: DeployBundleDropRequest) -> Result<Address>;
    async fn deploy_token(&self, request: DeployTokenRequest) -> Result<Address>;
    async fn deploy_vote(&self, request: DeployVoteRequest) -> Result<Address>;
}

#[async_trait]
pub trait DropAdmin: Send + Sync {
    async fn create_batch(&self, items: Vec<NftMetadataInput>) -> Result<()>;
    async fn metadata(&self) -> Result<ModuleMetadata>;
}

#[async_trait]
pub trait TokenAdmin: Send + Sync {
    async fn mint(&self, amount: TokenAmount) -> Result<()>;
    async fn total_supply(&self) -> Result<TokenAmount>;
    async fn transfer_batch(&self, targets: Vec<TransferTarget>) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct NftSpec {
    pub name: String,
    pub description: String,
    pub image: Vec<u8>,
}

impl NftSpec {
    fn image_b64(&self) -> String {
        STANDARD.encode(&self.image)
    }
}

#[derive(Debug, Clone)]
pub struct VoteModuleConfig {
    pub name: String,
    pub voting_token: Address,
    pub proposal_start_wait_secs: u64,
    pub proposal_voting_secs: u64,
    /// Percentage of supply that must vote, 0..=100.
    pub voting_quorum_fraction: u8,
    pub min_tokens_to_propose: TokenAmount,
}

impl VoteModuleConfig {
    pub fn new(name: impl Into<String>, voting_token: Address) -> Self {
        Self {
            name: name.into(),
            voting_token,
            proposal_start_wait_secs: 0,
            proposal_voting_secs: DEFAULT_VOTING_SECS,
            voting_quorum_fraction: 0,
            min_tokens_to_propose: TokenAmount::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AirdropOutcome {
    NoClaimers,
    Sent(Vec<TransferTarget>),
}

/// Deploys the edition drop; primary sales go to the zero address.
pub async fn deploy_membership_drop(app: &dyn AppModule, spec: &NftSpec) -> Result<Address> {
    let address = app
        .deploy_bundle_drop(DeployBundleDropRequest {
            name: spec.name.clone(),
            description: spec.description.clone(),
            image_b64: spec.image_b64(),
            primary_sale_recipient: Address::zero(),
        })
        .await
        .context("failed to deploy bundle drop module")?;
    info!(address = %address, name = %spec.name, "deployed bundle drop module");
    Ok(address)
}

pub async fn create_membership_nft(drop: &dyn DropAdmin, spec: &NftSpec) -> Result<()> {
    drop.create_batch(vec![NftMetadataInput {
        name: spec.name.clone(),
        description: spec.description.clone(),
        image_b64: spec.image_b64(),
    }])
    .await
    .context("failed to create the membership NFT")?;
    info!(name = %spec.name, "created membership NFT in the drop");
    Ok(())
}

pub async fn deploy_governance_token(app: &dyn AppModule, name: &str, symbol: &str) -> Result<Address> {
    let address = app
        .deploy_token(DeployTokenRequest {
            name: name.to_string(),
            symbol: symbol.to_string(),
        })
        .await
        .context("failed to deploy token module")?;
    info!(address = %address, symbol, "deployed token module");
    Ok(address)
}

/// Mints `amount` base units and returns the resulting total supply.
pub async fn mint_supply(token: &dyn TokenAdmin, amount: TokenAmount) -> Result<TokenAmount> {
    if amount.is_zero() {
        bail!("refusing to mint a zero amount");
    }
    token.mint(amount).await.context("failed to mint tokens")?;
    let supply = token
        .total_supply()
        .await
        .context("failed to read total supply")?;
    info!(minted = %amount, total_supply = %supply, "minted governance tokens");
    Ok(supply)
}

/// Picks a whole-token amount in `range` for every claimer.
pub fn plan_airdrop<R: Rng>(
    claimers: &[Address],
    range: RangeInclusive<u64>,
    decimals: u32,
    rng: &mut R,
) -> Result<Vec<TransferTarget>> {
    if range.is_empty() {
        bail!(
            "invalid airdrop range {}..={}",
            range.start(),
            range.end()
        );
    }
    let scale = 10u128
        .checked_pow(decimals)
        .context("token decimals out of range")?;

    claimers
        .iter()
        .map(|address| {
            let whole = rng.gen_range(range.clone());
            let amount = u128::from(whole)
                .checked_mul(scale)
                .context("airdrop amount overflows")?;
            info!(address = %address, amount = whole, "planned airdrop");
            Ok(TransferTarget {
                address: address.clone(),
                amount: TokenAmount(amount),
            })
        })
        .collect()
}

/// Sends every holder of the membership NFT a random amount of the
/// governance token in one batch.
pub async fn airdrop<R: Rng>(
    drop: &dyn DropModule,
    token: &dyn TokenAdmin,
    range: RangeInclusive<u64>,
    decimals: u32,
    rng: &mut R,
) -> Result<AirdropOutcome> {
    let claimers = drop
        .all_claimer_addresses(&TokenId::membership())
        .await
        .context("failed to list NFT claimers")?;
    if claimers.is_empty() {
        info!("no NFTs have been claimed yet");
        return Ok(AirdropOutcome::NoClaimers);
    }

    let targets = plan_airdrop(&claimers, range, decimals, rng)?;
    token
        .transfer_batch(targets.clone())
        .await
        .context("failed to airdrop tokens")?;
    info!(recipients = targets.len(), "airdropped tokens to all NFT holders");
    Ok(AirdropOutcome::Sent(targets))
}

pub async fn deploy_vote_module(app: &dyn AppModule, config: &VoteModuleConfig) -> Result<Address> {
    if config.voting_quorum_fraction > 100 {
        bail!(
            "quorum fraction must be a percentage, got {}",
            config.voting_quorum_fraction
        );
    }
    let address = app
        .deploy_vote(DeployVoteRequest {
            name: config.name.clone(),
            voting_token_address: config.voting_token.clone(),
            proposal_start_wait_secs: config.proposal_start_wait_secs,
            proposal_voting_secs: config.proposal_voting_secs,
            voting_quorum_fraction: config.voting_quorum_fraction,
            min_tokens_to_propose: config.min_tokens_to_propose,
        })
        .await
        .context("failed to deploy vote module")?;
    info!(address = %address, name = %config.name, "deployed vote module");
    Ok(address)
}
