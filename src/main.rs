use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;

use snapshot_vote::config::Config;
use snapshot_vote::hub::HubClient;
use snapshot_vote::telemetry::{init_telemetry, DEFAULT_FILTER};
use snapshot_vote::wallet::{Eip1193Provider, HttpWalletProvider, WalletConnection};
use snapshot_vote::widget::{CardAction, ProgressLine, Widget, WidgetSettings, SUBMITTED_TEXT};

#[derive(Debug, Parser)]
#[command(name = "snapshot-vote", about = "Vote on Snapshot proposals from the terminal")]
pub struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Space to read proposals from (overrides SNAPSHOT_SPACE)
    #[arg(long, global = true)]
    space: Option<String>,

    /// Hub base URL (overrides SNAPSHOT_HUB)
    #[arg(long, short = 'u', global = true)]
    hub: Option<String>,

    /// Wallet bridge JSON-RPC endpoint (overrides WALLET_RPC_URL)
    #[arg(long, global = true)]
    wallet_rpc: Option<String>,
}

#[derive(Debug, Parser)]
pub enum Command {
    /// List active proposals
    List,

    /// Cast a single-choice vote
    Vote(VoteArgs),

    /// Show, connect or disconnect the wallet
    Wallet(WalletArgs),
}

#[derive(Debug, Parser)]
pub struct VoteArgs {
    pub proposal: String,

    /// 1-based choice
    pub choice: u32,

    #[arg(long)]
    pub app: Option<String>,

    /// Raw metadata JSON attached to the vote
    #[arg(long)]
    pub metadata: Option<String>,
}

#[derive(Debug, Parser)]
pub struct WalletArgs {
    #[arg(long, conflicts_with = "disconnect")]
    pub connect: bool,

    #[arg(long)]
    pub disconnect: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::from_env()?;
    if let Some(space) = &cli.space {
        config.space = space.clone();
    }
    if let Some(hub) = &cli.hub {
        config.hub = hub.clone();
    }
    if let Some(url) = &cli.wallet_rpc {
        config.wallet.rpc_url = Some(url.clone());
    }

    // Initialize telemetry
    init_telemetry(config.rust_log.as_deref().unwrap_or(DEFAULT_FILTER));

    let provider = config.wallet.rpc_url.as_deref().map(|url| {
        let provider = Arc::new(HttpWalletProvider::new(url));
        provider.spawn_polling(Duration::from_millis(config.wallet.poll_interval_ms));
        provider
    });
    let candidates: Vec<Arc<dyn Eip1193Provider>> = provider
        .into_iter()
        .map(|p| p as Arc<dyn Eip1193Provider>)
        .collect();
    let connection = Arc::new(WalletConnection::from_candidates(&candidates));

    let mut settings = WidgetSettings::from(&config);
    if let Command::Vote(args) = &cli.command {
        if args.app.is_some() {
            settings.app = args.app.clone();
        }
        settings.metadata = args.metadata.clone();
    }

    tracing::info!(hub = config.hub, space = config.space, "Starting snapshot-vote");
    let mut widget = Widget::boot(settings, HubClient::new(&config.hub), connection).await;

    match cli.command {
        Command::List => print_list(&widget),
        Command::Vote(args) => {
            if let Err(e) = widget.select(&args.proposal, args.choice) {
                bail!(e.status_text());
            }
            if let Some(label) = widget.ballot(&args.proposal).and_then(|b| b.selected_label()) {
                eprintln!("Voting \"{}\" on {}", label, args.proposal);
            }

            let mut states = widget.flow().watch();
            let progress = tokio::spawn(async move {
                let mut line = ProgressLine::default();
                while states.changed().await.is_ok() {
                    let state = *states.borrow();
                    if let Some(text) = line.update(state) {
                        eprintln!("{}", text);
                    }
                }
            });

            let status = widget.submit(&args.proposal).await;
            progress.abort();
            println!("{}", status);
            if status != SUBMITTED_TEXT {
                bail!("vote was not submitted");
            }
        }
        Command::Wallet(args) => {
            let status = if args.connect {
                match widget.connect().await {
                    Ok(status) => status,
                    Err(alert) => bail!(alert),
                }
            } else if args.disconnect {
                widget.disconnect().await
            } else {
                widget.wallet_status().await
            };
            println!("{}", status.line.as_deref().unwrap_or("Not connected"));
            println!("[{}]", status.button_label);
        }
    }

    Ok(())
}

fn print_list(widget: &Widget) {
    if let Some(note) = widget.network_note() {
        println!("{}", note);
    }
    if let Some(placeholder) = widget.list().placeholder() {
        println!("{}", placeholder);
        return;
    }

    for card in widget.list().cards() {
        println!("{} [{}]", card.title, card.badge);
        println!("  {}  {} → {}", card.id, card.start, card.end);
        match &card.action {
            CardAction::Ballot(ballot) => {
                for (i, choice) in ballot.choices.iter().enumerate() {
                    println!("  {}. {}", i + 1, choice);
                }
            }
            CardAction::ExternalLink => println!("  Vote on Snapshot: {}", card.link),
        }
    }
}
