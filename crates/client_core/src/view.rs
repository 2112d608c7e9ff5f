//! Plain-text rendering of the member page.

use std::fmt::Write as _;

use shared::domain::{ChainId, Proposal, VoteType};

use crate::page::{BallotPhase, MemberPage, PageModel, PageState};

pub fn network_name(chain: ChainId) -> String {
    match chain.0 {
        1 => "Ethereum Mainnet".to_string(),
        4 => "Rinkeby".to_string(),
        5 => "Goerli".to_string(),
        11155111 => "Sepolia".to_string(),
        other => format!("chain {other}"),
    }
}

pub fn submit_label(ballot: BallotPhase) -> &'static str {
    match ballot {
        BallotPhase::Voting => "Submit Votes",
        BallotPhase::Submitting => "Voting...",
        BallotPhase::Voted => "You Already Voted",
    }
}

pub fn render_text(model: &PageModel, dao_name: &str, decimals: u32) -> String {
    let mut out = String::new();
    match &model.state {
        PageState::UnsupportedNetwork => {
            let network = network_name(model.supported_chain);
            let _ = writeln!(out, "Please connect to {network}");
            let _ = writeln!(
                out,
                "This dapp only works on the {network} network, please switch networks in your connected wallet."
            );
        }
        PageState::Disconnected => {
            let _ = writeln!(out, "Welcome to {dao_name}");
            let _ = writeln!(out, "[ Connect your wallet ]");
        }
        PageState::NotClaimed => {
            let _ = writeln!(out, "Mint your free {dao_name} Membership NFT");
            let _ = writeln!(out, "[ Mint your nft (FREE) ]");
        }
        PageState::Claiming => {
            let _ = writeln!(out, "Mint your free {dao_name} Membership NFT");
            let _ = writeln!(out, "[ Minting... ]");
        }
        PageState::Member(page) => render_member_page(&mut out, page, dao_name, decimals),
    }

    if let Some(err) = &model.last_error {
        let _ = writeln!(out, "error: {err}");
    }
    out
}

fn render_member_page(out: &mut String, page: &MemberPage, dao_name: &str, decimals: u32) {
    let _ = writeln!(out, "{dao_name} member page");
    let _ = writeln!(out);
    let _ = writeln!(out, "Member List");
    match page.member_records(decimals) {
        Some(records) => {
            let _ = writeln!(out, "{:<16} {}", "Address", "Token Amount");
            for record in records {
                let _ = writeln!(out, "{:<16} {}", record.address.short(), record.token_amount);
            }
        }
        None => {
            let _ = writeln!(out, "(loading)");
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Active Proposals");
    match &page.proposals {
        Some(proposals) => {
            for proposal in proposals {
                render_proposal(out, proposal);
            }
        }
        None => {
            let _ = writeln!(out, "(unavailable)");
        }
    }
    let _ = writeln!(out, "[ {} ]", submit_label(page.ballot));
}

fn render_proposal(out: &mut String, proposal: &Proposal) {
    let _ = writeln!(out, "{} ({})", proposal.description, proposal.proposal_id);
    let options: Vec<String> = proposal
        .votes
        .iter()
        .map(|option| {
            let marker = if option.vote_type == VoteType::DEFAULT {
                "(*)"
            } else {
                "( )"
            };
            format!("{marker} {}", option.label)
        })
        .collect();
    let _ = writeln!(out, "  {}", options.join("  "));
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use shared::domain::{Address, ProposalId, ProposalStage, Session, TokenAmount, VoteOption};

    use super::*;
    use crate::page::{reduce, PageEvent};

    fn addr(byte: char) -> Address {
        Address::parse(&format!("0x{}", byte.to_string().repeat(40))).expect("address")
    }

    fn connected() -> PageModel {
        reduce(
            &PageModel::new(ChainId::RINKEBY),
            PageEvent::WalletConnected(Session {
                address: addr('a'),
                chain_id: ChainId::RINKEBY,
                can_sign: true,
            }),
        )
    }

    #[test]
    fn renders_connect_prompt_when_disconnected() {
        let text = render_text(&PageModel::new(ChainId::RINKEBY), "SurfDAO", 18);
        assert!(text.contains("Welcome to SurfDAO"));
        assert!(text.contains("Connect your wallet"));
    }

    #[test]
    fn renders_network_hint() {
        let model = reduce(&connected(), PageEvent::ChainChanged(ChainId(1)));
        let text = render_text(&model, "SurfDAO", 18);
        assert!(text.starts_with("Please connect to Rinkeby"));
    }

    #[test]
    fn renders_member_table_and_ballot() {
        let model = reduce(
            &connected(),
            PageEvent::MembershipChecked {
                address: addr('a'),
                claimed: true,
            },
        );
        let model = reduce(&model, PageEvent::RosterLoaded(vec![addr('a'), addr('b')]));
        let mut balances = HashMap::new();
        balances.insert(addr('a'), TokenAmount(2_000_000_000_000_000_000));
        let model = reduce(&model, PageEvent::BalancesLoaded(balances));
        let model = reduce(
            &model,
            PageEvent::ProposalsLoaded(vec![Proposal {
                proposal_id: ProposalId::new("1"),
                description: "Should the DAO buy a board?".into(),
                stage: ProposalStage::Active,
                votes: vec![
                    VoteOption {
                        vote_type: VoteType::Against,
                        label: "Against".into(),
                    },
                    VoteOption {
                        vote_type: VoteType::For,
                        label: "For".into(),
                    },
                    VoteOption {
                        vote_type: VoteType::Abstain,
                        label: "Abstain".into(),
                    },
                ],
            }]),
        );

        let text = render_text(&model, "SurfDAO", 18);
        assert!(text.contains("0xaaaa...aaaa    2.0"));
        assert!(text.contains("0xbbbb...bbbb    0.0"));
        assert!(text.contains("( ) Against  ( ) For  (*) Abstain"));
        assert!(text.contains("[ Submit Votes ]"));
    }
}
