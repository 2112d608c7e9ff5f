use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{
    config::{load_settings, load_settings_from, Settings},
    provision::{
        airdrop, create_membership_nft, deploy_governance_token, deploy_membership_drop,
        deploy_vote_module, mint_supply, AirdropOutcome, DropAdmin, NftSpec, VoteModuleConfig,
    },
    HttpModuleGateway,
};
use shared::domain::{Address, TokenAmount};

#[derive(Parser, Debug)]
#[command(about = "Deploys and seeds the DAO modules")]
struct Cli {
    /// Settings file; defaults to ./dao.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides `gateway_url` from settings.
    #[arg(long)]
    gateway_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct NftArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    description: String,
    #[arg(long)]
    image: PathBuf,
}

impl NftArgs {
    fn load(&self) -> Result<NftSpec> {
        let image = fs::read(&self.image)
            .with_context(|| format!("failed to read image '{}'", self.image.display()))?;
        Ok(NftSpec {
            name: self.name.clone(),
            description: self.description.clone(),
            image,
        })
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    DeployDrop {
        #[command(flatten)]
        nft: NftArgs,
    },
    CreateNft {
        #[arg(long)]
        drop: Option<Address>,
        #[command(flatten)]
        nft: NftArgs,
    },
    DeployToken {
        #[arg(long)]
        name: String,
        #[arg(long)]
        symbol: String,
    },
    Mint {
        #[arg(long)]
        token: Option<Address>,
        /// Whole tokens.
        #[arg(long, default_value = "1000000")]
        amount: String,
    },
    Airdrop {
        #[arg(long)]
        drop: Option<Address>,
        #[arg(long)]
        token: Option<Address>,
        #[arg(long, default_value_t = 1000)]
        min: u64,
        #[arg(long, default_value_t = 10000)]
        max: u64,
    },
    DeployVote {
        #[arg(long)]
        name: String,
        #[arg(long)]
        voting_token: Option<Address>,
        #[arg(long, default_value_t = 0)]
        start_wait_secs: u64,
        #[arg(long, default_value_t = 86_400)]
        voting_secs: u64,
        #[arg(long, default_value_t = 0)]
        quorum_fraction: u8,
        /// Whole tokens.
        #[arg(long, default_value = "0")]
        min_proposal_tokens: String,
    },
}

fn pick(explicit: Option<Address>, settings: &Settings, key: &str) -> Result<Address> {
    match explicit {
        Some(address) => Ok(address),
        None => settings.require(key),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => load_settings_from(path)?,
        None => load_settings(),
    };
    if let Some(url) = cli.gateway_url {
        settings.gateway_url = url;
    }
    settings.validate()?;
    let decimals = settings.token_decimals;

    match cli.command {
        Command::DeployDrop { nft } => {
            let spec = nft.load()?;
            let app = HttpModuleGateway::new(&settings.gateway_url, settings.require("app_address")?)?;
            let address = deploy_membership_drop(&app, &spec).await?;
            println!("deployed bundle drop module, address: {address}");
            let metadata = app.for_module(address).metadata().await?;
            println!(
                "bundle drop metadata: name={} description={}",
                metadata.name, metadata.description
            );
        }
        Command::CreateNft { drop, nft } => {
            let spec = nft.load()?;
            let drop = pick(drop, &settings, "drop_address")?;
            let gateway = HttpModuleGateway::new(&settings.gateway_url, drop)?;
            create_membership_nft(&gateway, &spec).await?;
            println!("created membership NFT '{}'", spec.name);
        }
        Command::DeployToken { name, symbol } => {
            let app = HttpModuleGateway::new(&settings.gateway_url, settings.require("app_address")?)?;
            let address = deploy_governance_token(&app, &name, &symbol).await?;
            println!("deployed token module, address: {address}");
        }
        Command::Mint { token, amount } => {
            let token = pick(token, &settings, "token_address")?;
            let amount = TokenAmount::parse_units(&amount, decimals)?;
            let gateway = HttpModuleGateway::new(&settings.gateway_url, token)?;
            let supply = mint_supply(&gateway, amount).await?;
            println!(
                "there now is {} tokens in circulation",
                supply.format_units(decimals)
            );
        }
        Command::Airdrop {
            drop,
            token,
            min,
            max,
        } => {
            let drop = HttpModuleGateway::new(
                &settings.gateway_url,
                pick(drop, &settings, "drop_address")?,
            )?;
            let token = drop.for_module(pick(token, &settings, "token_address")?);
            let mut rng = rand::thread_rng();
            match airdrop(&drop, &token, min..=max, decimals, &mut rng).await? {
                AirdropOutcome::NoClaimers => {
                    println!("no NFTs have been claimed yet, get some friends to claim your free NFTs!");
                }
                AirdropOutcome::Sent(targets) => {
                    for target in &targets {
                        println!(
                            "sent {} tokens to {}",
                            target.amount.format_units(decimals),
                            target.address
                        );
                    }
                    println!("airdropped tokens to {} NFT holders", targets.len());
                }
            }
        }
        Command::DeployVote {
            name,
            voting_token,
            start_wait_secs,
            voting_secs,
            quorum_fraction,
            min_proposal_tokens,
        } => {
            let voting_token = pick(voting_token, &settings, "token_address")?;
            let mut config = VoteModuleConfig::new(name, voting_token);
            config.proposal_start_wait_secs = start_wait_secs;
            config.proposal_voting_secs = voting_secs;
            config.voting_quorum_fraction = quorum_fraction;
            config.min_tokens_to_propose = TokenAmount::parse_units(&min_proposal_tokens, decimals)?;

            let app = HttpModuleGateway::new(&settings.gateway_url, settings.require("app_address")?)?;
            let address = deploy_vote_module(&app, &config).await?;
            println!("deployed vote module, address: {address}");
        }
    }

    Ok(())
}
