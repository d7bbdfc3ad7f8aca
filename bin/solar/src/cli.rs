use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use url::Url;

#[derive(Parser)]
#[command(name = "solar")]
#[command(
    author,
    version,
    about = "Deploy smart contracts and track their addresses per environment"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "SOLAR_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// URL of a UTXO-chain JSON-RPC endpoint (createcontract-style node).
    ///
    /// Exactly one of --utxo-rpc and --eth-rpc must be set.
    #[arg(long, env = "SOLAR_UTXO_RPC")]
    pub utxo_rpc: Option<Url>,

    /// Sender address funding UTXO-chain creation transactions.
    ///
    /// Required with --utxo-rpc; the account chain uses the node's first
    /// unlocked account instead.
    #[arg(long, env = "SOLAR_UTXO_SENDER")]
    pub utxo_sender: Option<String>,

    /// URL of an account-chain (Ethereum-style) JSON-RPC endpoint.
    #[arg(long, env = "SOLAR_ETH_RPC")]
    pub eth_rpc: Option<Url>,

    /// The deployment environment. Selects which contracts repository file
    /// is read and written.
    #[arg(short, long, env = "SOLAR_ENV", default_value = "development")]
    pub env: String,

    /// Path to the contracts repository file.
    ///
    /// If not provided, the repository lives at ./solar.<env>.json.
    #[arg(long, env = "SOLAR_REPO")]
    pub repo: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Deploy a compiled contract artifact.
    Deploy(DeployArgs),
    /// Show the contents of the contracts repository.
    Status,
}

#[derive(Args)]
pub struct DeployArgs {
    /// Path to the compiled artifact (JSON with name, abi and bin).
    pub artifact: PathBuf,

    /// JSON array of constructor arguments.
    ///
    /// `$Name` and `${Name}` expand to the address of a previously deployed
    /// contract from the repository.
    #[arg(default_value = "[]")]
    pub params: String,

    /// Name to record the deployment under. Defaults to the contract name
    /// from the artifact.
    #[arg(long, env = "SOLAR_DEPLOY_NAME", default_value = "")]
    pub name: String,

    /// Deploy as a library. Constructor arguments are not encoded.
    #[arg(long)]
    pub lib: bool,

    /// Replace an existing confirmed deployment of the same name.
    #[arg(long, visible_alias = "overwrite")]
    pub force: bool,

    /// Gas price in the chain's smallest unit (satoshi or wei).
    ///
    /// Defaults to the backend's minimum.
    #[arg(long, env = "SOLAR_GAS_PRICE")]
    pub gas_price: Option<u128>,

    /// Gas limit for the creation transaction.
    #[arg(long, env = "SOLAR_GAS_LIMIT", default_value_t = 3_000_000)]
    pub gas_limit: u64,

    /// Seconds to wait for the creation transaction to confirm.
    ///
    /// 0 disables the deadline and polls until interrupted.
    #[arg(long, env = "SOLAR_CONFIRM_TIMEOUT", default_value_t = 600)]
    pub confirm_timeout: u64,
}
