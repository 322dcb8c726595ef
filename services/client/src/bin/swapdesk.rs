//! SwapDesk command line
//!
//! Connects a wallet to the configured Uniswap V2 deployment and exposes the
//! reader, submitter, history and verification flows as subcommands.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ethers::types::Address;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use swapdesk_client::units::{format_amount, format_gwei, parse_amount};
use swapdesk_client::{
    ActionStatus, AddLiquidityRequest, HistorySource, LinkCheck, SwapDesk, WalletConnector,
};
use swapdesk_config::{network, ClientSettings, ContractAddresses, SUPPORTED_NETWORKS};

#[derive(Parser, Debug)]
#[command(name = "swapdesk")]
#[command(about = "Wallet, swaps and liquidity for a Uniswap V2 deployment")]
struct Args {
    /// Settings file (defaults to config/swapdesk.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the JSON-RPC endpoint
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Node-managed account index
    #[arg(long, global = true)]
    account: Option<usize>,

    /// Use the canonical addresses of a known network and require that chain
    #[arg(long, global = true)]
    network: Option<u64>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// ETH, WETH and DAI balances
    Balances {
        /// Account to inspect (defaults to the connected one)
        #[arg(long)]
        address: Option<String>,
    },
    /// WETH/DAI pool reserves
    Pool,
    /// Largest wrappable amount after deposit gas
    MaxWrap,
    /// Largest sendable amount after transfer gas
    MaxTransact,
    /// Quote a WETH -> DAI swap without submitting it
    Quote { amount: String },
    /// Wrap ETH into WETH
    Wrap { amount: String },
    /// Unwrap WETH into ETH
    Unwrap { amount: String },
    /// Swap WETH for DAI
    Swap { amount: String },
    /// Add WETH/DAI liquidity
    AddLiquidity {
        eth: String,
        dai: String,
        /// Use the existing DAI balance instead of minting
        #[arg(long)]
        no_mint: bool,
    },
    /// Recent swaps of the connected account
    History,
    /// Check deployed bytecode and router linkage
    Verify,
    /// List supported networks
    Networks,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("swapdesk_client=info".parse()?),
        )
        .init();

    if let Command::Networks = args.command {
        return print_networks(args.json);
    }

    let settings = load_settings(&args)?;
    let addresses = resolve_addresses(args.network)?;

    let desk = SwapDesk::new(addresses, settings.clone())?;
    let connector = WalletConnector::new(settings);
    let account = connector
        .connect(&desk.session)
        .await
        .context("Failed to connect wallet")?;
    info!("👛 Using account {:?}", account);

    run(&desk, account, args.command, args.json).await
}

fn load_settings(args: &Args) -> Result<ClientSettings> {
    let mut settings = ClientSettings::load(args.config.as_deref())?;
    if let Some(url) = &args.rpc_url {
        settings.rpc_url = url.clone();
    }
    if let Some(index) = args.account {
        settings.account_index = index;
    }
    if let Some(chain_id) = args.network {
        settings.expected_chain_id = Some(chain_id);
    }
    settings.validate()?;
    Ok(settings)
}

fn resolve_addresses(chain_id: Option<u64>) -> Result<ContractAddresses> {
    let mut addresses = ContractAddresses::from_env();
    if let Some(chain_id) = chain_id {
        let info = network(chain_id)
            .with_context(|| format!("Chain {} is not a supported network", chain_id))?;
        if info.overlay(&mut addresses) {
            info!("📍 Using {} contract addresses", info.name);
        }
    }
    Ok(addresses)
}

async fn run(desk: &SwapDesk, account: Address, command: Command, json: bool) -> Result<()> {
    match command {
        Command::Balances { address } => {
            let owner = match address {
                Some(raw) => raw
                    .parse::<Address>()
                    .with_context(|| format!("Invalid address: {}", raw))?,
                None => account,
            };
            let balances = desk.reader.balances(owner).await?;
            emit(json, &balances, || {
                println!("Account: {:?}", owner);
                println!("ETH:  {}", format_amount(balances.eth));
                println!("WETH: {}", format_amount(balances.weth));
                println!("DAI:  {}", format_amount(balances.dai));
            })
        }
        Command::Pool => {
            let pool = desk.reader.pool_snapshot().await?;
            emit(json, &pool, || {
                println!("Pair: {:?}", pool.pair);
                println!("WETH reserve: {}", format_amount(pool.reserve_weth));
                println!("DAI reserve:  {}", format_amount(pool.reserve_dai));
            })
        }
        Command::MaxWrap => {
            let quote = desk.reader.wrap_quote(account).await?;
            emit(json, &quote, || {
                println!("ETH balance:  {}", format_amount(quote.eth_balance));
                println!("WETH balance: {}", format_amount(quote.weth_balance));
                println!(
                    "Gas: {} units at {} gwei = {} ETH",
                    quote.gas_limit,
                    format_gwei(quote.gas_price),
                    format_amount(quote.gas_cost)
                );
                println!("Max wrap: {} ETH", format_amount(quote.max_amount));
            })
        }
        Command::MaxTransact => {
            let quote = desk.reader.max_transact(account).await?;
            emit(json, &quote, || {
                println!("ETH balance: {}", format_amount(quote.eth_balance));
                println!("Gas price:   {} gwei", format_gwei(quote.gas_price));
                println!("Max amount:  {} ETH", format_amount(quote.max_amount));
            })
        }
        Command::Quote { amount } => {
            let preview = desk.reader.swap_preview(parse_amount(&amount)?).await?;
            emit(json, &preview, || {
                println!("Expected: {} DAI", format_amount(preview.expected_out));
                println!("Minimum:  {} DAI", format_amount(preview.min_out));
                println!("Price impact: {:.4}%", preview.price_impact);
            })
        }
        Command::Wrap { amount } => {
            let amount = parse_amount(&amount)?;
            let outcome = submit(desk, desk.submitter.wrap(amount)).await?;
            emit(json, &outcome, || println!("Transaction: {:#x}", outcome.hash))
        }
        Command::Unwrap { amount } => {
            let amount = parse_amount(&amount)?;
            let outcome = submit(desk, desk.submitter.unwrap(amount)).await?;
            emit(json, &outcome, || println!("Transaction: {:#x}", outcome.hash))
        }
        Command::Swap { amount } => {
            let amount = parse_amount(&amount)?;
            let receipt = submit(desk, desk.submitter.swap(amount)).await?;
            emit(json, &receipt, || {
                println!("Transaction: {:#x}", receipt.outcome.hash);
                println!(
                    "Quoted {} DAI (minimum {})",
                    format_amount(receipt.expected_out),
                    format_amount(receipt.min_out)
                );
            })
        }
        Command::AddLiquidity { eth, dai, no_mint } => {
            let request = AddLiquidityRequest {
                eth_amount: parse_amount(&eth)?,
                dai_amount: parse_amount(&dai)?,
                mint_dai: !no_mint,
            };
            let report = submit(desk, desk.submitter.add_liquidity(request)).await?;
            emit(json, &report, || {
                println!("Transaction: {:#x}", report.outcome.hash);
                println!("Pair: {:?}", report.pair);
                println!(
                    "Reserves: {} WETH / {} DAI",
                    format_amount(report.reserve_weth),
                    format_amount(report.reserve_dai)
                );
            })
        }
        Command::History => {
            let history = desk.history.load().await?;
            emit(json, &history, || {
                if let Some(notice) = &history.notice {
                    println!("{}", notice);
                }
                if history.source == HistorySource::Example {
                    println!("(example data)");
                }
                println!(
                    "{:<68} {:>12} {:>12} {:>12} {:<8} {:<20} {:>10} {:>6}",
                    "Hash", "In (WETH)", "Out (DAI)", "Gas (ETH)", "Status", "Time", "Block", "Nonce"
                );
                for entry in &history.entries {
                    println!(
                        "{:<68} {:>12} {:>12} {:>12} {:<8} {:<20} {:>10} {:>6}",
                        entry.hash,
                        entry.input_amount,
                        entry.output_amount,
                        entry.gas_cost,
                        entry.status,
                        entry.time_display(),
                        entry.block_number,
                        entry.nonce
                    );
                }
            })
        }
        Command::Verify => {
            let report = desk.verifier.verify().await?;
            emit(json, &report, || {
                for check in &report.contracts {
                    println!(
                        "{:<14} {:?} code={} bytes contract={}",
                        check.label, check.address, check.code_size, check.is_contract
                    );
                }
                println!("Router factory: {}", describe_link(&report.router_factory));
                println!("Router WETH:    {}", describe_link(&report.router_weth));
            })?;
            if !report.is_healthy() {
                anyhow::bail!("Deployment verification failed");
            }
            Ok(())
        }
        Command::Networks => print_networks(json),
    }
}

/// Run a submitter flow while echoing its status lines to stderr
async fn submit<T>(
    desk: &SwapDesk,
    flow: impl std::future::Future<Output = swapdesk_client::Result<T>>,
) -> Result<T> {
    let mut status = desk.submitter.subscribe_status();
    let printer = tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let line = status.borrow_and_update().to_string();
            if !line.is_empty() {
                eprintln!("{}", line);
            }
        }
    });

    let result = flow.await;
    printer.abort();

    match result {
        Ok(value) => {
            eprintln!("{}", desk.submitter.status());
            Ok(value)
        }
        Err(_) => match desk.submitter.status() {
            ActionStatus::Failed(message) => anyhow::bail!(message),
            other => anyhow::bail!("{}", other),
        },
    }
}

fn describe_link(check: &LinkCheck) -> String {
    match check {
        LinkCheck::Matches => "matches".to_string(),
        LinkCheck::Mismatch { expected, actual } => {
            format!("MISMATCH (expected {:?}, router has {:?})", expected, actual)
        }
        LinkCheck::Unreadable(reason) => format!("unreadable: {}", reason),
    }
}

fn print_networks(json: bool) -> Result<()> {
    #[derive(Serialize)]
    struct Row {
        chain_id: u64,
        name: &'static str,
        known_addresses: bool,
    }

    let rows: Vec<Row> = SUPPORTED_NETWORKS
        .iter()
        .map(|n| Row {
            chain_id: n.chain_id,
            name: n.name,
            known_addresses: n.addresses.is_some(),
        })
        .collect();

    emit(json, &rows, || {
        for row in &rows {
            println!(
                "{:>10}  {:<10} {}",
                row.chain_id,
                row.name,
                if row.known_addresses { "canonical addresses" } else { "" }
            );
        }
    })
}

fn emit<T: Serialize>(json: bool, value: &T, human: impl FnOnce()) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        human();
    }
    Ok(())
}
