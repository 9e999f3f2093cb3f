use alloy::primitives::B256;
use alloy::signers::local::PrivateKeySigner;
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use gtx_config::ConfigLoader;
use gtx_lifecycle::{
	OrderRequest, OrderResult, OrderWatcher, PollOptions, PollOutcome, WatchHandle,
};
use gtx_types::{GtxConfig, OnchainOrder, OrderAction};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod service;

#[derive(Parser)]
#[command(name = "gtx")]
#[command(about = "GTX cross-chain order client", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	#[arg(short, long, value_name = "FILE", default_value = "config/example.toml")]
	config: PathBuf,

	/// Overrides `logging.level` from the configuration
	#[arg(long)]
	log_level: Option<String>,

	/// Network orders originate on
	#[arg(short, long, env = "GTX_NETWORK", default_value = "espresso")]
	network: String,

	#[arg(long, env = "GTX_PRIVATE_KEY", hide_env_values = true)]
	private_key: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
	/// Create and submit an order
	Create(CreateArgs),
	/// Show the status of an order
	Status {
		/// Order id or the hash of the transaction that opened it
		key: B256,
	},
	/// Poll an order until it settles, is refunded or polling times out
	Watch {
		key: B256,
		#[arg(long)]
		interval_secs: Option<u64>,
		#[arg(long)]
		max_secs: Option<u64>,
	},
	/// Settle opened orders
	Settle {
		/// Domain the settlement message is sent to
		#[arg(long)]
		domain: u32,
		#[arg(required = true)]
		order_ids: Vec<B256>,
	},
	/// Refund orders from a JSON file written by `create`
	Refund {
		#[arg(long)]
		domain: u32,
		#[arg(long, value_name = "FILE")]
		orders: PathBuf,
	},
	/// Print the owner of the origin router
	Owner,
	/// Validate the configuration file
	Validate,
}

#[derive(Args)]
struct CreateArgs {
	/// Destination network
	#[arg(long)]
	to: String,
	/// Optional onward network past the destination
	#[arg(long)]
	target: Option<String>,
	#[arg(long, default_value = "WETH")]
	input_token: String,
	#[arg(long, default_value = "WETH")]
	output_token: String,
	#[arg(long)]
	amount_in: String,
	/// Minimum accepted on the destination, defaults to amount_in
	#[arg(long)]
	amount_out: Option<String>,
	#[arg(long)]
	recipient: Option<String>,
	/// Mark the order as a swap instead of a transfer
	#[arg(long)]
	swap: bool,
}

impl From<CreateArgs> for OrderRequest {
	fn from(args: CreateArgs) -> Self {
		Self {
			destination: args.to,
			target: args.target,
			amount_out: args.amount_out.unwrap_or_else(|| args.amount_in.clone()),
			input_token: args.input_token,
			output_token: args.output_token,
			amount_in: args.amount_in,
			recipient: args.recipient,
			action: if args.swap {
				OrderAction::Swap
			} else {
				OrderAction::Transfer
			},
		}
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	let config = ConfigLoader::new()
		.with_file(&cli.config)
		.load()
		.await
		.context("Failed to load configuration")?;

	let log_level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
	setup_tracing(log_level)?;

	let signer = cli
		.private_key
		.as_deref()
		.map(|key| key.parse::<PrivateKeySigner>())
		.transpose()
		.context("Invalid private key")?;

	match cli.command {
		Commands::Validate => validate_config(&cli.config, &config),
		Commands::Create(args) => {
			let signer = signer.context("GTX_PRIVATE_KEY is required to create orders")?;
			let client = service::build_client(&config, &cli.network, Some(signer))?;
			info!(origin = %cli.network, sender = %client.sender(), "Creating order");
			report(client.create_order(&args.into()).await)
		}
		Commands::Status { key } => {
			let client = service::build_client(&config, &cli.network, signer)?;
			let status = client.get_order_status(key).await;
			println!("{}", status);
			Ok(())
		}
		Commands::Watch {
			key,
			interval_secs,
			max_secs,
		} => {
			let client = service::build_client(&config, &cli.network, signer)?;
			let defaults = PollOptions::from(client.settings());
			let options = PollOptions {
				interval: interval_secs.map(Duration::from_secs).unwrap_or(defaults.interval),
				max_duration: max_secs.map(Duration::from_secs).unwrap_or(defaults.max_duration),
			};
			watch(OrderWatcher::spawn(client, key, options)).await
		}
		Commands::Settle { domain, order_ids } => {
			let signer = signer.context("GTX_PRIVATE_KEY is required to settle orders")?;
			let client = service::build_client(&config, &cli.network, Some(signer))?;
			report(client.settle_orders(&order_ids, domain).await)
		}
		Commands::Refund { domain, orders } => {
			let signer = signer.context("GTX_PRIVATE_KEY is required to refund orders")?;
			let orders = read_orders(&orders)?;
			let client = service::build_client(&config, &cli.network, Some(signer))?;
			report(client.refund_orders(&orders, domain).await)
		}
		Commands::Owner => {
			let client = service::build_client(&config, &cli.network, signer)?;
			let owner = client
				.router_owner()
				.await
				.context("Failed to read router owner")?;
			println!("{}", owner);
			Ok(())
		}
	}
}

/// Prints the result as JSON; a failed operation exits non-zero.
fn report(result: OrderResult) -> Result<()> {
	println!("{}", serde_json::to_string_pretty(&result)?);

	for warning in &result.warnings {
		tracing::warn!("{}", warning.user_message());
	}

	match result.message() {
		Some(message) if !result.success => bail!(message),
		Some(message) => {
			tracing::warn!("{}", message);
			Ok(())
		}
		None => Ok(()),
	}
}

async fn watch(handle: WatchHandle) -> Result<()> {
	let mut updates = handle.subscribe();
	let shutdown = setup_shutdown_signal();
	tokio::pin!(shutdown);

	loop {
		tokio::select! {
			_ = &mut shutdown => {
				info!("Shutdown signal received, stopping watcher");
				handle.cancel();
				break;
			}
			changed = updates.changed() => {
				if changed.is_err() {
					break;
				}
				println!("{}", *updates.borrow());
			}
		}
	}

	match handle.finished().await {
		PollOutcome::Terminal(status) => println!("Final status: {}", status),
		PollOutcome::DeadlineReached(status) => {
			println!("Stopped polling at {}; check the order manually", status)
		}
		PollOutcome::Cancelled(status) => println!("Cancelled at {}", status),
	}
	Ok(())
}

fn read_orders(path: &Path) -> Result<Vec<OnchainOrder>> {
	let content = std::fs::read_to_string(path)
		.with_context(|| format!("Failed to read {}", path.display()))?;

	// Accept either a list of orders or a single `create` result.
	if let Ok(orders) = serde_json::from_str::<Vec<OnchainOrder>>(&content) {
		return Ok(orders);
	}
	let value: serde_json::Value = serde_json::from_str(&content).context("Invalid JSON")?;
	let order: OnchainOrder = serde_json::from_value(value["order"].clone())
		.context("Expected a list of orders or a create result with an order")?;
	Ok(vec![order])
}

fn validate_config(path: &Path, config: &GtxConfig) -> Result<()> {
	info!("Configuration is valid: {:?}", path);

	let mut networks: Vec<_> = config.chains.networks.iter().collect();
	networks.sort_by_key(|(name, _)| name.as_str());
	for (name, network) in networks {
		info!(
			"  Network: {} (domain {}, router {}, accessor {:?})",
			name, network.domain, network.router, network.domain_accessor
		);
	}

	let mut tokens: Vec<_> = config.chains.tokens.keys().collect();
	tokens.sort();
	for symbol in tokens {
		info!("  Token: {}", symbol);
	}

	Ok(())
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();

	Ok(())
}

async fn setup_shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = signal::ctrl_c().await {
			tracing::error!("Failed to listen for Ctrl+C: {}", e);
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match signal::unix::signal(signal::unix::SignalKind::terminate()) {
			Ok(mut sigterm) => {
				sigterm.recv().await;
			}
			Err(e) => {
				tracing::error!("Failed to install SIGTERM handler: {}", e);
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
}
