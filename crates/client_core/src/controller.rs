//! Drives the member page: issues module calls and feeds their outcomes
//! through [`reduce`].

use std::collections::HashMap;

use futures::future::join_all;
use shared::domain::{
    Address, ChainId, ConnectorKind, Proposal, ProposalId, TokenId, VoteType,
};
use tracing::{debug, error, info, warn};

use crate::{
    error::{ControllerError, ReadQuery},
    page::{reduce, BallotPhase, PageEvent, PageModel, PageState},
    ModuleClients, TokenModule, VoteModule,
};

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub supported_chain: ChainId,
    pub membership_token: TokenId,
    pub token_decimals: u32,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            supported_chain: ChainId::RINKEBY,
            membership_token: TokenId::membership(),
            token_decimals: 18,
        }
    }
}

/// Ballot selections keyed by proposal. Proposals left unselected vote
/// [`VoteType::DEFAULT`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BallotForm {
    selections: HashMap<ProposalId, VoteType>,
}

impl BallotForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, proposal_id: ProposalId, vote: VoteType) -> &mut Self {
        self.selections.insert(proposal_id, vote);
        self
    }

    pub fn choice_for(&self, proposal_id: &ProposalId) -> VoteType {
        self.selections
            .get(proposal_id)
            .copied()
            .unwrap_or(VoteType::DEFAULT)
    }
}

/// One ballot entry per displayed proposal, fixed at submit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteSubmission {
    pub votes: Vec<(ProposalId, VoteType)>,
}

impl VoteSubmission {
    pub fn from_form(proposals: &[Proposal], form: &BallotForm) -> Self {
        Self {
            votes: proposals
                .iter()
                .map(|p| (p.proposal_id.clone(), form.choice_for(&p.proposal_id)))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionReport {
    pub delegated: bool,
    pub voted: Vec<ProposalId>,
    pub executed: Vec<ProposalId>,
    pub failures: Vec<ControllerError>,
}

impl SubmissionReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

enum StepOutcome {
    Applied(ProposalId),
    Skipped,
}

pub struct MembershipController {
    clients: ModuleClients,
    options: ControllerOptions,
    model: PageModel,
}

impl MembershipController {
    pub fn new(clients: ModuleClients, options: ControllerOptions) -> Self {
        let model = PageModel::new(options.supported_chain);
        Self {
            clients,
            options,
            model,
        }
    }

    pub fn model(&self) -> &PageModel {
        &self.model
    }

    pub fn options(&self) -> &ControllerOptions {
        &self.options
    }

    pub fn dispatch(&mut self, event: PageEvent) {
        let next = reduce(&self.model, event);
        if next.state.name() != self.model.state.name() {
            debug!(
                from = self.model.state.name(),
                to = next.state.name(),
                "page state transition"
            );
        }
        self.model = next;
    }

    pub async fn connect_wallet(&mut self) -> Result<(), ControllerError> {
        match self.clients.wallet.connect(ConnectorKind::Injected).await {
            Ok(session) => {
                info!(
                    address = %session.address,
                    chain_id = session.chain_id.0,
                    "wallet connected"
                );
                self.dispatch(PageEvent::WalletConnected(session));
            }
            Err(err) => {
                error!(error = %format!("{err:#}"), "failed to connect wallet");
                self.dispatch(PageEvent::WalletConnectFailed(format!("{err:#}")));
                return Err(ControllerError::Connection(format!("{err:#}")));
            }
        }

        if let PageState::UnsupportedNetwork = self.model.state {
            warn!(
                supported_chain = self.options.supported_chain.0,
                "wallet connected on unsupported network"
            );
            return Err(self.unsupported_network_error());
        }

        if let Err(err) = self.refresh_membership().await {
            debug!(error = %err, "membership check after connect failed");
        }
        Ok(())
    }

    pub async fn disconnect(&mut self) {
        if let Err(err) = self.clients.wallet.disconnect().await {
            warn!(error = %format!("{err:#}"), "wallet disconnect reported an error");
        }
        self.dispatch(PageEvent::WalletDisconnected);
    }

    pub async fn on_chain_changed(&mut self, chain: ChainId) {
        self.dispatch(PageEvent::ChainChanged(chain));
        if self.model.state == PageState::NotClaimed {
            let _ = self.refresh_membership().await;
        }
    }

    pub async fn on_account_changed(&mut self, address: Address) {
        self.dispatch(PageEvent::AccountChanged(address));
        if self.model.state == PageState::NotClaimed {
            let _ = self.refresh_membership().await;
        }
    }

    /// Re-derives membership from the drop balance of the session address.
    pub async fn refresh_membership(&mut self) -> Result<bool, ControllerError> {
        if self.model.state == PageState::UnsupportedNetwork {
            return Err(self.unsupported_network_error());
        }
        let Some(address) = self.model.address().cloned() else {
            return Err(ControllerError::NotConnected);
        };

        let balance = self
            .clients
            .drop
            .balance_of(&address, &self.options.membership_token)
            .await;
        match balance {
            Ok(balance) => {
                let claimed = !balance.is_zero();
                if claimed {
                    info!(address = %address, "wallet holds the membership NFT");
                } else {
                    info!(address = %address, "wallet has no membership NFT yet");
                }
                self.dispatch(PageEvent::MembershipChecked { address, claimed });
                if self.model.member_page().is_some() {
                    self.load_member_data().await;
                }
                Ok(claimed)
            }
            Err(err) => {
                error!(address = %address, error = %format!("{err:#}"), "failed to read nft balance");
                let failure = ControllerError::read(ReadQuery::Membership, &err);
                self.dispatch(PageEvent::MembershipCheckFailed {
                    address,
                    reason: format!("{err:#}"),
                });
                Err(failure)
            }
        }
    }

    pub async fn claim(&mut self) -> Result<(), ControllerError> {
        if !self.model.claim_enabled() {
            return Err(match &self.model.state {
                PageState::UnsupportedNetwork => self.unsupported_network_error(),
                PageState::Disconnected => ControllerError::NotConnected,
                _ => ControllerError::ClaimUnavailable,
            });
        }

        self.dispatch(PageEvent::ClaimStarted);
        let claimed = self
            .clients
            .drop
            .claim(&self.options.membership_token, 1)
            .await;
        match claimed {
            Ok(()) => {
                info!(
                    drop = %self.clients.drop.address(),
                    token_id = %self.options.membership_token,
                    "membership NFT minted"
                );
                self.dispatch(PageEvent::ClaimSucceeded);
                self.load_member_data().await;
                Ok(())
            }
            Err(err) => {
                error!(error = %format!("{err:#}"), "failed to claim");
                let reason = format!("{err:#}");
                self.dispatch(PageEvent::ClaimFailed(reason.clone()));
                Err(ControllerError::Claim(reason))
            }
        }
    }

    /// Roster, balances and proposals are read concurrently; each failure is
    /// logged and leaves its field unset.
    pub async fn load_member_data(&mut self) {
        if self.model.member_page().is_none() {
            return;
        }

        let (roster, balances, proposals) = futures::join!(
            self.clients
                .drop
                .all_claimer_addresses(&self.options.membership_token),
            self.clients.token.all_holder_balances(),
            self.clients.vote.all(),
        );

        match roster {
            Ok(roster) => {
                debug!(members = roster.len(), "loaded member list");
                self.dispatch(PageEvent::RosterLoaded(roster));
            }
            Err(err) => self.record_read_failure(ReadQuery::Roster, &err),
        }
        match balances {
            Ok(balances) => {
                debug!(holders = balances.len(), "loaded token amounts");
                self.dispatch(PageEvent::BalancesLoaded(balances));
            }
            Err(err) => self.record_read_failure(ReadQuery::Balances, &err),
        }
        let first_proposal = match proposals {
            Ok(proposals) => {
                debug!(proposals = proposals.len(), "loaded proposals");
                let first = proposals.first().map(|p| p.proposal_id.clone());
                self.dispatch(PageEvent::ProposalsLoaded(proposals));
                first
            }
            Err(err) => {
                self.record_read_failure(ReadQuery::Proposals, &err);
                None
            }
        };

        if let Some(proposal_id) = first_proposal {
            self.check_prior_vote(&proposal_id).await;
        }
    }

    async fn check_prior_vote(&mut self, proposal_id: &ProposalId) {
        let Some(address) = self.model.address().cloned() else {
            return;
        };
        match self.clients.vote.has_voted(proposal_id, &address).await {
            Ok(true) => {
                info!(address = %address, "user has already voted");
                self.dispatch(PageEvent::PriorVoteDetected);
            }
            Ok(false) => info!(address = %address, "user has not voted yet"),
            Err(err) => self.record_read_failure(ReadQuery::VoteStatus, &err),
        }
    }

    /// Delegates if needed, then casts every active vote and, once that pass
    /// has settled, executes every succeeded proposal.
    pub async fn submit_votes(
        &mut self,
        form: &BallotForm,
    ) -> Result<SubmissionReport, ControllerError> {
        let Some(page) = self.model.member_page() else {
            return Err(match self.model.state {
                PageState::UnsupportedNetwork => self.unsupported_network_error(),
                PageState::Disconnected => ControllerError::NotConnected,
                _ => ControllerError::NotMember,
            });
        };
        match page.ballot {
            BallotPhase::Voted => return Err(ControllerError::AlreadyVoted),
            BallotPhase::Submitting => return Err(ControllerError::SubmissionInFlight),
            BallotPhase::Voting => {}
        }
        let Some(voter) = self.model.address().cloned() else {
            return Err(ControllerError::NotConnected);
        };

        let proposals = page.proposals.clone().unwrap_or_default();
        let submission = VoteSubmission::from_form(&proposals, form);
        self.dispatch(PageEvent::SubmissionStarted);

        let mut report = SubmissionReport::default();
        match ensure_delegation(self.clients.token.as_ref(), &voter).await {
            Ok(delegated) => report.delegated = delegated,
            Err(err) => {
                error!(error = %err, "failed to delegate tokens");
                self.dispatch(PageEvent::SubmissionFailed(err.clone()));
                return Err(err);
            }
        }

        let vote = self.clients.vote.as_ref();
        let vote_pass = join_all(
            submission
                .votes
                .iter()
                .map(|(proposal_id, choice)| cast_vote(vote, proposal_id, *choice)),
        )
        .await;
        for outcome in vote_pass {
            match outcome {
                Ok(StepOutcome::Applied(id)) => report.voted.push(id),
                Ok(StepOutcome::Skipped) => {}
                Err(err) => {
                    error!(error = %err, "failed to vote");
                    report.failures.push(err);
                }
            }
        }

        let execute_pass = join_all(
            submission
                .votes
                .iter()
                .map(|(proposal_id, _)| execute_if_ready(vote, proposal_id)),
        )
        .await;
        for outcome in execute_pass {
            match outcome {
                Ok(StepOutcome::Applied(id)) => report.executed.push(id),
                Ok(StepOutcome::Skipped) => {}
                Err(err) => {
                    error!(error = %err, "failed to execute");
                    report.failures.push(err);
                }
            }
        }

        info!(
            voted = report.voted.len(),
            executed = report.executed.len(),
            failures = report.failures.len(),
            "vote submission finished"
        );
        match report.failures.first() {
            None => self.dispatch(PageEvent::SubmissionCompleted),
            Some(first) => {
                warn!(
                    failures = report.failures.len(),
                    "vote submission incomplete; ballot reopened"
                );
                self.dispatch(PageEvent::SubmissionFailed(first.clone()));
            }
        }
        Ok(report)
    }

    fn record_read_failure(&mut self, query: ReadQuery, err: &anyhow::Error) {
        error!(query = query.as_str(), error = %format!("{err:#}"), "read failed");
        self.dispatch(PageEvent::ReadFailed {
            query,
            reason: format!("{err:#}"),
        });
    }

    fn unsupported_network_error(&self) -> ControllerError {
        ControllerError::UnsupportedNetwork {
            expected: self.options.supported_chain,
            actual: self.model.chain.unwrap_or(self.options.supported_chain),
        }
    }
}

/// Returns whether a new delegation was made.
async fn ensure_delegation(token: &dyn TokenModule, voter: &Address) -> Result<bool, ControllerError> {
    let delegation = token
        .delegation_of(voter)
        .await
        .map_err(|err| ControllerError::Delegation(format!("{err:#}")))?;
    if !delegation.is_zero() {
        debug!(voter = %voter, delegatee = %delegation, "delegation already set");
        return Ok(false);
    }

    token
        .delegate_to(voter)
        .await
        .map_err(|err| ControllerError::Delegation(format!("{err:#}")))?;
    info!(voter = %voter, "delegated voting power to self");
    Ok(true)
}

async fn cast_vote(
    vote: &dyn VoteModule,
    proposal_id: &ProposalId,
    choice: VoteType,
) -> Result<StepOutcome, ControllerError> {
    let vote_err = |err: anyhow::Error| ControllerError::Vote {
        proposal_id: proposal_id.clone(),
        reason: format!("{err:#}"),
    };
    let proposal = vote.get(proposal_id).await.map_err(vote_err)?;
    if !proposal.stage.accepts_votes() {
        debug!(proposal_id = %proposal_id, stage = ?proposal.stage, "proposal not open for voting");
        return Ok(StepOutcome::Skipped);
    }
    vote.vote(proposal_id, choice).await.map_err(vote_err)?;
    info!(proposal_id = %proposal_id, vote = ?choice, "vote cast");
    Ok(StepOutcome::Applied(proposal_id.clone()))
}

async fn execute_if_ready(
    vote: &dyn VoteModule,
    proposal_id: &ProposalId,
) -> Result<StepOutcome, ControllerError> {
    let execute_err = |err: anyhow::Error| ControllerError::Execute {
        proposal_id: proposal_id.clone(),
        reason: format!("{err:#}"),
    };
    let proposal = vote.get(proposal_id).await.map_err(execute_err)?;
    if !proposal.stage.ready_to_execute() {
        return Ok(StepOutcome::Skipped);
    }
    vote.execute(proposal_id).await.map_err(execute_err)?;
    info!(proposal_id = %proposal_id, "proposal executed");
    Ok(StepOutcome::Applied(proposal_id.clone()))
}
