use std::{collections::HashMap, sync::Arc};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::domain::{
    Address, ConnectorKind, Proposal, ProposalId, Session, TokenAmount, TokenId, VoteType,
};

pub mod config;
pub mod controller;
pub mod error;
pub mod gateway;
pub mod page;
pub mod provision;
pub mod view;
pub mod wallet;

pub use controller::{BallotForm, MembershipController, SubmissionReport};
pub use error::ControllerError;
pub use gateway::HttpModuleGateway;
pub use page::{BallotPhase, MemberPage, PageEvent, PageModel, PageState};
pub use wallet::JsonRpcWallet;

/// Browser-wallet style connection capability.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn connect(&self, connector: ConnectorKind) -> Result<Session>;
    async fn disconnect(&self) -> Result<()>;
}

/// Edition drop holding the gating membership NFT.
#[async_trait]
pub trait DropModule: Send + Sync {
    fn address(&self) -> &Address;
    async fn balance_of(&self, owner: &Address, token_id: &TokenId) -> Result<TokenAmount>;
    async fn claim(&self, token_id: &TokenId, quantity: u32) -> Result<()>;
    async fn all_claimer_addresses(&self, token_id: &TokenId) -> Result<Vec<Address>>;
}

/// Governance token with vote delegation.
#[async_trait]
pub trait TokenModule: Send + Sync {
    async fn all_holder_balances(&self) -> Result<HashMap<Address, TokenAmount>>;
    async fn delegation_of(&self, owner: &Address) -> Result<Address>;
    async fn delegate_to(&self, delegatee: &Address) -> Result<()>;
}

#[async_trait]
pub trait VoteModule: Send + Sync {
    async fn all(&self) -> Result<Vec<Proposal>>;
    async fn has_voted(&self, proposal_id: &ProposalId, voter: &Address) -> Result<bool>;
    async fn get(&self, proposal_id: &ProposalId) -> Result<Proposal>;
    async fn vote(&self, proposal_id: &ProposalId, vote: VoteType) -> Result<()>;
    async fn execute(&self, proposal_id: &ProposalId) -> Result<()>;
}

/// Injected module handles the controller talks to.
#[derive(Clone)]
pub struct ModuleClients {
    pub wallet: Arc<dyn WalletProvider>,
    pub drop: Arc<dyn DropModule>,
    pub token: Arc<dyn TokenModule>,
    pub vote: Arc<dyn VoteModule>,
}

impl ModuleClients {
    pub fn new(
        wallet: Arc<dyn WalletProvider>,
        drop: Arc<dyn DropModule>,
        token: Arc<dyn TokenModule>,
        vote: Arc<dyn VoteModule>,
    ) -> Self {
        Self {
            wallet,
            drop,
            token,
            vote,
        }
    }

    /// Every handle unavailable; useful as a base when only some modules are wired.
    pub fn missing() -> Self {
        Self {
            wallet: Arc::new(MissingWallet),
            drop: Arc::new(MissingDropModule::default()),
            token: Arc::new(MissingTokenModule),
            vote: Arc::new(MissingVoteModule),
        }
    }
}

pub struct MissingWallet;

#[async_trait]
impl WalletProvider for MissingWallet {
    async fn connect(&self, connector: ConnectorKind) -> Result<Session> {
        Err(anyhow!("no wallet available for connector {connector:?}"))
    }

    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }
}

pub struct MissingDropModule {
    address: Address,
}

impl Default for MissingDropModule {
    fn default() -> Self {
        Self {
            address: Address::zero(),
        }
    }
}

#[async_trait]
impl DropModule for MissingDropModule {
    fn address(&self) -> &Address {
        &self.address
    }

    async fn balance_of(&self, _owner: &Address, token_id: &TokenId) -> Result<TokenAmount> {
        Err(anyhow!("drop module unavailable for token {token_id}"))
    }

    async fn claim(&self, token_id: &TokenId, _quantity: u32) -> Result<()> {
        Err(anyhow!("drop module unavailable for token {token_id}"))
    }

    async fn all_claimer_addresses(&self, token_id: &TokenId) -> Result<Vec<Address>> {
        Err(anyhow!("drop module unavailable for token {token_id}"))
    }
}

pub struct MissingTokenModule;

#[async_trait]
impl TokenModule for MissingTokenModule {
    async fn all_holder_balances(&self) -> Result<HashMap<Address, TokenAmount>> {
        Err(anyhow!("token module unavailable"))
    }

    async fn delegation_of(&self, owner: &Address) -> Result<Address> {
        Err(anyhow!("token module unavailable for {owner}"))
    }

    async fn delegate_to(&self, delegatee: &Address) -> Result<()> {
        Err(anyhow!("token module unavailable for {delegatee}"))
    }
}

pub struct MissingVoteModule;

#[async_trait]
impl VoteModule for MissingVoteModule {
    async fn all(&self) -> Result<Vec<Proposal>> {
        Err(anyhow!("vote module unavailable"))
    }

    async fn has_voted(&self, proposal_id: &ProposalId, _voter: &Address) -> Result<bool> {
        Err(anyhow!("vote module unavailable for proposal {proposal_id}"))
    }

    async fn get(&self, proposal_id: &ProposalId) -> Result<Proposal> {
        Err(anyhow!("vote module unavailable for proposal {proposal_id}"))
    }

    async fn vote(&self, proposal_id: &ProposalId, _vote: VoteType) -> Result<()> {
        Err(anyhow!("vote module unavailable for proposal {proposal_id}"))
    }

    async fn execute(&self, proposal_id: &ProposalId) -> Result<()> {
        Err(anyhow!("vote module unavailable for proposal {proposal_id}"))
    }
}

#[cfg(test)]
#[path = "tests/fakes.rs"]
mod fakes;

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod controller_tests;

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod gateway_tests;
