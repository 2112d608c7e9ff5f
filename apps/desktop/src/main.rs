use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use client_core::{
    config::{load_settings, load_settings_from},
    view::render_text,
    BallotForm, HttpModuleGateway, JsonRpcWallet, MembershipController, ModuleClients,
};
use shared::domain::{ProposalId, VoteType};
use tracing::warn;

#[derive(Parser, Debug)]
#[command(about = "Membership page for the DAO")]
struct Cli {
    /// Settings file; defaults to ./dao.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect and show the page for the current wallet.
    Status,
    /// Mint the free membership NFT.
    Claim,
    /// Submit the ballot; unselected proposals vote abstain.
    Vote {
        /// `<proposal_id>=<for|against|abstain>`, repeatable.
        #[arg(long = "choice", value_parser = parse_choice)]
        choices: Vec<(ProposalId, VoteType)>,
    },
}

fn parse_choice(raw: &str) -> Result<(ProposalId, VoteType), String> {
    let (id, vote) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected <proposal_id>=<vote>, got '{raw}'"))?;
    let vote = vote.parse::<VoteType>().map_err(|err| err.to_string())?;
    Ok((ProposalId::new(id.trim()), vote))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => load_settings_from(path)?,
        None => load_settings(),
    };
    settings.validate()?;

    // Token and vote modules may not be deployed yet; claiming only needs the drop.
    let gateway = HttpModuleGateway::new(&settings.gateway_url, settings.require("drop_address")?)?;
    let mut clients = ModuleClients::missing();
    clients.wallet = Arc::new(JsonRpcWallet::new(&settings.wallet_rpc_url)?);
    clients.drop = Arc::new(gateway.clone());
    if let Some(token) = settings.token_address.clone() {
        clients.token = Arc::new(gateway.for_module(token));
    }
    if let Some(vote) = settings.vote_address.clone() {
        clients.vote = Arc::new(gateway.for_module(vote));
    }
    let mut controller = MembershipController::new(clients, settings.controller_options());

    let decimals = controller.options().token_decimals;
    if let Err(err) = controller.connect_wallet().await {
        print!("{}", render_text(controller.model(), &settings.dao_name, decimals));
        return Err(anyhow!(err));
    }

    match cli.command.unwrap_or(Command::Status) {
        Command::Status => {}
        Command::Claim => controller.claim().await?,
        Command::Vote { choices } => {
            let mut form = BallotForm::new();
            for (proposal_id, vote) in choices {
                form.select(proposal_id, vote);
            }
            let report = controller.submit_votes(&form).await?;
            println!(
                "voted on {} proposal(s), executed {}",
                report.voted.len(),
                report.executed.len()
            );
            for failure in &report.failures {
                warn!(error = %failure, "ballot step failed");
            }
        }
    }

    print!(
        "{}",
        render_text(controller.model(), &settings.dao_name, decimals)
    );
    Ok(())
}
