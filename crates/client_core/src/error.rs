use shared::domain::{ChainId, ProposalId};
use thiserror::Error;

/// Which external read failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadQuery {
    Membership,
    Roster,
    Balances,
    Proposals,
    VoteStatus,
}

impl ReadQuery {
    pub fn as_str(self) -> &'static str {
        match self {
            ReadQuery::Membership => "membership balance",
            ReadQuery::Roster => "member list",
            ReadQuery::Balances => "token amounts",
            ReadQuery::Proposals => "proposals",
            ReadQuery::VoteStatus => "vote status",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("failed to connect wallet: {0}")]
    Connection(String),
    #[error("unsupported network {actual}; switch to chain {expected}")]
    UnsupportedNetwork { expected: ChainId, actual: ChainId },
    #[error("failed to read {}: {reason}", query.as_str())]
    Read { query: ReadQuery, reason: String },
    #[error("failed to claim membership: {0}")]
    Claim(String),
    #[error("failed to delegate tokens: {0}")]
    Delegation(String),
    #[error("failed to vote on proposal {proposal_id}: {reason}")]
    Vote {
        proposal_id: ProposalId,
        reason: String,
    },
    #[error("failed to execute proposal {proposal_id}: {reason}")]
    Execute {
        proposal_id: ProposalId,
        reason: String,
    },
    #[error("no wallet connected")]
    NotConnected,
    #[error("wallet does not hold the membership token")]
    NotMember,
    #[error("claim is only available before membership")]
    ClaimUnavailable,
    #[error("votes already submitted for this session")]
    AlreadyVoted,
    #[error("a vote submission is already in progress")]
    SubmissionInFlight,
}

impl ControllerError {
    pub fn read(query: ReadQuery, err: &anyhow::Error) -> Self {
        ControllerError::Read {
            query,
            reason: format!("{err:#}"),
        }
    }
}
