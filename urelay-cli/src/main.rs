//! Gasless relay purchase client.
//!
//! # Usage
//!
//! ```bash
//! # Buy a token on Polygon, paying 50 USDC through the relay
//! urelay purchase --network eip155:137 --token 0x.. --amount 50000000
//!
//! # Current relay nonce of a user
//! urelay nonce --network eip155:137 --user 0x..
//!
//! # Configured chains
//! urelay chains
//!
//! # Typed-data digest of a request, for checking against a relay contract
//! urelay digest --network eip155:137 --user 0x.. --token 0x.. --amount 1 --nonce 0 --deadline 1700000000
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to TOML configuration file (default: `urelay.toml`)
//! - `USER_PRIVATE_KEY` - Private key of the paying user
//! - `OPERATOR_PRIVATE_KEY` - Operator key, read only while signing (name configurable)
//! - `RUST_LOG` - Log level filter (default: `info`)

use std::io::Write;
use std::path::PathBuf;

use alloy_network::EthereumWallet;
use alloy_primitives::{Address, U256};
use alloy_provider::ProviderBuilder;
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::SolStruct;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use urelay::chain::{ChainId, caip2, parse_caip2};
use urelay::networks::known_network;
use urelay::timestamp::UnixTimestamp;
use urelay_evm::{
    Eip155RelayNetwork, EnvOperatorKey, GaslessPurchase, OperatorSigner, PurchaseOrder,
    RelayRequest, fetch_nonce, relay_digest, relay_domain,
};

use urelay_cli::config::{CliConfig, DEFAULT_CONFIG_PATH};
use urelay_cli::connect::ensure_chain;
use urelay_cli::error::CliError;

/// Gasless token purchases through a relay contract.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, env = "CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Buy a token, paying with the chain's payment token through the relay.
    Purchase(PurchaseArgs),
    /// Print a user's current relay nonce.
    Nonce(NonceArgs),
    /// List configured chains.
    Chains,
    /// Print the EIP-712 digest of a relay request without signing it.
    Digest(DigestArgs),
}

#[derive(Debug, Args)]
struct NetworkArg {
    /// CAIP-2 network identifier, e.g. `eip155:137`.
    #[arg(long, value_parser = parse_network)]
    network: ChainId,
}

#[derive(Debug, Args)]
struct PurchaseArgs {
    #[command(flatten)]
    network: NetworkArg,

    /// Token to buy.
    #[arg(long)]
    token: Address,

    /// Contract receiving the purchase (default: the token itself).
    #[arg(long)]
    target_contract: Option<Address>,

    /// Payment amount in the payment token's smallest unit.
    #[arg(long, value_parser = parse_amount)]
    amount: U256,

    /// Private key of the paying user.
    #[arg(long, env = "USER_PRIVATE_KEY", hide_env_values = true)]
    user_key: String,
}

#[derive(Debug, Args)]
struct NonceArgs {
    #[command(flatten)]
    network: NetworkArg,

    /// User whose nonce to read.
    #[arg(long)]
    user: Address,
}

#[derive(Debug, Args)]
struct DigestArgs {
    #[command(flatten)]
    network: NetworkArg,

    /// Paying user.
    #[arg(long)]
    user: Address,

    /// Token to buy.
    #[arg(long)]
    token: Address,

    /// Contract receiving the purchase (default: the token itself).
    #[arg(long)]
    target_contract: Option<Address>,

    /// Payment amount in the payment token's smallest unit.
    #[arg(long, value_parser = parse_amount)]
    amount: U256,

    /// Relay nonce.
    #[arg(long, value_parser = parse_amount)]
    nonce: U256,

    /// Deadline as Unix seconds.
    #[arg(long)]
    deadline: u64,
}

fn parse_network(s: &str) -> Result<ChainId, String> {
    parse_caip2(s).ok_or_else(|| format!("expected eip155:<chain id>, got {s}"))
}

fn parse_amount(s: &str) -> Result<U256, String> {
    s.parse::<U256>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        if let CliError::Purchase(failure) = &e {
            tracing::error!(
                step = %failure.step,
                chain_id = ?failure.chain_id,
                retry = ?failure.retry_hint(),
                "{failure}"
            );
        } else {
            tracing::error!("{e}");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = CliConfig::load_from(&cli.config)?;
    let registry = config.relay.registry()?;
    tracing::debug!(
        path = %cli.config.display(),
        chains = registry.len(),
        "loaded configuration"
    );

    let mut out = std::io::stdout();
    match cli.command {
        Command::Purchase(args) => purchase(&config, args, &mut out).await,
        Command::Nonce(args) => {
            let chain_id = args.network.network;
            let relay = registry.resolve(chain_id)?.relay_address;
            let provider = ProviderBuilder::new().connect_http(config.rpc_url(chain_id)?.clone());
            let network = Eip155RelayNetwork::new(provider);
            ensure_chain(&network, chain_id).await?;
            let nonce = fetch_nonce(&network, relay, args.user).await?;
            writeln!(out, "{nonce}").map_err(CliError::Output)
        }
        Command::Chains => {
            for chain_id in registry.chain_ids() {
                let profile = registry.resolve(chain_id)?;
                let name = known_network(chain_id).map_or("unknown", |n| n.name);
                let rpc = config
                    .rpc_urls
                    .get(&chain_id)
                    .map_or_else(|| "-".to_owned(), ToString::to_string);
                writeln!(
                    out,
                    "{}\t{name}\trelay={}\tpayment_token={}\trpc={rpc}",
                    caip2(chain_id),
                    profile.relay_address,
                    profile.payment_token_address,
                )
                .map_err(CliError::Output)?;
            }
            Ok(())
        }
        Command::Digest(args) => {
            let profile = registry.resolve(args.network.network)?;
            let request = RelayRequest {
                user: args.user,
                targetContract: args.target_contract.unwrap_or(args.token),
                targetToken: args.token,
                paymentToken: profile.payment_token_address,
                amount: args.amount,
                nonce: args.nonce,
                deadline: UnixTimestamp::from_secs(args.deadline).into(),
            };
            let domain = relay_domain(profile);
            writeln!(out, "domain_separator\t{}", domain.separator()).map_err(CliError::Output)?;
            writeln!(out, "type_hash\t{}", request.eip712_type_hash()).map_err(CliError::Output)?;
            writeln!(out, "digest\t{}", relay_digest(&domain, &request)).map_err(CliError::Output)
        }
    }
}

async fn purchase(
    config: &CliConfig,
    args: PurchaseArgs,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let chain_id = args.network.network;
    let user: PrivateKeySigner = args
        .user_key
        .trim()
        .parse()
        .map_err(|_| CliError::InvalidUserKey)?;
    let user_address = user.address();

    let provider = ProviderBuilder::new()
        .wallet(EthereumWallet::from(user.clone()))
        .connect_http(config.rpc_url(chain_id)?.clone());
    let network = Eip155RelayNetwork::new(provider)
        .with_confirmations(config.relay.confirmations)
        .with_receipt_timeout(config.relay.receipt_timeout());
    ensure_chain(&network, chain_id).await?;
    let purchaser = GaslessPurchase::from_config(network, user, &config.relay)?;

    let operator = OperatorSigner::new(EnvOperatorKey::new(config.relay.operator_key_env.clone()))
        .with_encoding(config.relay.operator_digest);

    let mut order = PurchaseOrder::new(args.token, args.amount);
    if let Some(target_contract) = args.target_contract {
        order = order.with_target_contract(target_contract);
    }

    tracing::info!(
        network = %caip2(chain_id),
        user = %user_address,
        token = %order.target_token,
        amount = %order.amount,
        "starting purchase"
    );
    let receipt = purchaser.purchase(&operator, order).await?;

    if let Some(approval) = receipt.approval {
        writeln!(out, "approval\t{approval}").map_err(CliError::Output)?;
    }
    writeln!(out, "nonce\t{}", receipt.request.nonce).map_err(CliError::Output)?;
    writeln!(out, "digest\t{}", receipt.digest).map_err(CliError::Output)?;
    writeln!(out, "tx_hash\t{}", receipt.tx_hash).map_err(CliError::Output)
}
