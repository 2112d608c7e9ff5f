//! Member page model and the reducer that drives its state transitions.

use std::collections::HashMap;

use shared::domain::{Address, ChainId, MemberRecord, Proposal, Session, TokenAmount};

use crate::error::{ControllerError, ReadQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BallotPhase {
    #[default]
    Voting,
    Submitting,
    Voted,
}

/// Data shown once the session holds the membership token. Each field stays
/// `None` until its read resolves.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemberPage {
    pub roster: Option<Vec<Address>>,
    pub balances: Option<HashMap<Address, TokenAmount>>,
    pub proposals: Option<Vec<Proposal>>,
    pub ballot: BallotPhase,
}

impl MemberPage {
    /// Roster joined with balances. `None` until both reads have resolved.
    pub fn member_records(&self, decimals: u32) -> Option<Vec<MemberRecord>> {
        let roster = self.roster.as_ref()?;
        let balances = self.balances.as_ref()?;
        Some(
            roster
                .iter()
                .map(|address| MemberRecord {
                    address: address.clone(),
                    token_amount: balances
                        .get(address)
                        .copied()
                        .unwrap_or_default()
                        .format_units(decimals),
                })
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageState {
    UnsupportedNetwork,
    Disconnected,
    NotClaimed,
    Claiming,
    Member(MemberPage),
}

impl PageState {
    pub fn name(&self) -> &'static str {
        match self {
            PageState::UnsupportedNetwork => "unsupported_network",
            PageState::Disconnected => "disconnected",
            PageState::NotClaimed => "not_claimed",
            PageState::Claiming => "claiming",
            PageState::Member(page) => match page.ballot {
                BallotPhase::Voted => "member_voted",
                _ => "member_voting",
            },
        }
    }
}

#[derive(Debug, Clone)]
pub enum PageEvent {
    WalletConnected(Session),
    WalletConnectFailed(String),
    WalletDisconnected,
    ChainChanged(ChainId),
    AccountChanged(Address),
    MembershipChecked { address: Address, claimed: bool },
    MembershipCheckFailed { address: Address, reason: String },
    ClaimStarted,
    ClaimSucceeded,
    ClaimFailed(String),
    RosterLoaded(Vec<Address>),
    BalancesLoaded(HashMap<Address, TokenAmount>),
    ProposalsLoaded(Vec<Proposal>),
    ReadFailed { query: ReadQuery, reason: String },
    PriorVoteDetected,
    SubmissionStarted,
    SubmissionCompleted,
    SubmissionFailed(ControllerError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageModel {
    pub supported_chain: ChainId,
    /// Last chain the provider reported, with or without a connected account.
    pub chain: Option<ChainId>,
    pub session: Option<Session>,
    pub state: PageState,
    pub last_error: Option<ControllerError>,
}

impl PageModel {
    pub fn new(supported_chain: ChainId) -> Self {
        Self {
            supported_chain,
            chain: None,
            session: None,
            state: PageState::Disconnected,
            last_error: None,
        }
    }

    pub fn address(&self) -> Option<&Address> {
        self.session.as_ref().map(|s| &s.address)
    }

    pub fn member_page(&self) -> Option<&MemberPage> {
        match &self.state {
            PageState::Member(page) => Some(page),
            _ => None,
        }
    }

    pub fn claim_enabled(&self) -> bool {
        self.state == PageState::NotClaimed
    }

    pub fn submit_enabled(&self) -> bool {
        matches!(self.member_page(), Some(page) if page.ballot == BallotPhase::Voting)
    }

    pub fn has_voted(&self) -> bool {
        matches!(self.member_page(), Some(page) if page.ballot == BallotPhase::Voted)
    }

    fn chain_supported(&self) -> bool {
        self.chain.map_or(true, |chain| chain == self.supported_chain)
    }

    fn member_page_mut(&mut self) -> Option<&mut MemberPage> {
        match &mut self.state {
            PageState::Member(page) => Some(page),
            _ => None,
        }
    }

    fn is_current_address(&self, address: &Address) -> bool {
        self.address() == Some(address)
    }

    /// Unsupported network first, then missing session; a supported session
    /// sitting in either of those states falls back to `NotClaimed`.
    fn enforce_precedence(&mut self) {
        if !self.chain_supported() {
            self.state = PageState::UnsupportedNetwork;
            if let Some(actual) = self.chain {
                self.last_error = Some(ControllerError::UnsupportedNetwork {
                    expected: self.supported_chain,
                    actual,
                });
            }
            return;
        }

        if matches!(
            self.last_error,
            Some(ControllerError::UnsupportedNetwork { .. })
        ) {
            self.last_error = None;
        }
        if self.session.is_none() {
            self.state = PageState::Disconnected;
        } else if matches!(
            self.state,
            PageState::UnsupportedNetwork | PageState::Disconnected
        ) {
            self.state = PageState::NotClaimed;
        }
    }
}

/// Applies one event to the model. Pure: all external calls live in the
/// controller, which feeds their outcomes back in as events.
pub fn reduce(model: &PageModel, event: PageEvent) -> PageModel {
    let mut next = model.clone();

    match event {
        PageEvent::WalletConnected(session) => {
            let address_changed = !next.is_current_address(&session.address);
            next.chain = Some(session.chain_id);
            next.session = Some(session);
            next.last_error = None;
            if address_changed {
                next.state = PageState::NotClaimed;
            }
        }
        PageEvent::WalletConnectFailed(reason) => {
            next.session = None;
            next.last_error = Some(ControllerError::Connection(reason));
        }
        PageEvent::WalletDisconnected => {
            next.session = None;
            next.state = PageState::Disconnected;
            next.last_error = None;
        }
        PageEvent::ChainChanged(chain) => {
            next.chain = Some(chain);
            if let Some(session) = next.session.as_mut() {
                session.chain_id = chain;
            }
        }
        PageEvent::AccountChanged(address) => {
            if let Some(session) = next.session.as_mut() {
                if session.address != address {
                    session.address = address;
                    next.state = PageState::NotClaimed;
                }
            }
        }
        PageEvent::MembershipChecked { address, claimed } => {
            if next.is_current_address(&address) {
                match (&next.state, claimed) {
                    (PageState::NotClaimed, true) => {
                        next.state = PageState::Member(MemberPage::default());
                    }
                    (PageState::Member(_), false) => next.state = PageState::NotClaimed,
                    _ => {}
                }
            }
        }
        PageEvent::MembershipCheckFailed { address, reason } => {
            if next.is_current_address(&address) {
                if matches!(next.state, PageState::Member(_)) {
                    next.state = PageState::NotClaimed;
                }
                next.last_error = Some(ControllerError::Read {
                    query: ReadQuery::Membership,
                    reason,
                });
            }
        }
        PageEvent::ClaimStarted => {
            if next.state == PageState::NotClaimed {
                next.state = PageState::Claiming;
                next.last_error = None;
            }
        }
        PageEvent::ClaimSucceeded => {
            if next.state == PageState::Claiming {
                next.state = PageState::Member(MemberPage::default());
            }
        }
        PageEvent::ClaimFailed(reason) => {
            if next.state == PageState::Claiming {
                next.state = PageState::NotClaimed;
                next.last_error = Some(ControllerError::Claim(reason));
            }
        }
        PageEvent::RosterLoaded(roster) => {
            if let Some(page) = next.member_page_mut() {
                page.roster = Some(roster);
            }
        }
        PageEvent::BalancesLoaded(balances) => {
            if let Some(page) = next.member_page_mut() {
                page.balances = Some(balances);
            }
        }
        PageEvent::ProposalsLoaded(proposals) => {
            if let Some(page) = next.member_page_mut() {
                page.proposals = Some(proposals);
            }
        }
        PageEvent::ReadFailed { query, reason } => {
            if next.member_page().is_some() {
                next.last_error = Some(ControllerError::Read { query, reason });
            }
        }
        PageEvent::PriorVoteDetected => {
            if let Some(page) = next.member_page_mut() {
                page.ballot = BallotPhase::Voted;
            }
        }
        PageEvent::SubmissionStarted => {
            if let Some(page) = next.member_page_mut() {
                if page.ballot == BallotPhase::Voting {
                    page.ballot = BallotPhase::Submitting;
                    next.last_error = None;
                }
            }
        }
        PageEvent::SubmissionCompleted => {
            if let Some(page) = next.member_page_mut() {
                if page.ballot == BallotPhase::Submitting {
                    page.ballot = BallotPhase::Voted;
                }
            }
        }
        PageEvent::SubmissionFailed(err) => {
            let mut reverted = false;
            if let Some(page) = next.member_page_mut() {
                if page.ballot == BallotPhase::Submitting {
                    page.ballot = BallotPhase::Voting;
                    reverted = true;
                }
            }
            if reverted {
                next.last_error = Some(err);
            }
        }
    }

    next.enforce_precedence();
    next
}
