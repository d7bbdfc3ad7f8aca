//! solar is a CLI tool that deploys compiled smart contracts to a UTXO or
//! account chain and records the resulting addresses per environment.

mod cli;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::{Table, presets::UTF8_FULL};

use cli::{Cli, Command, DeployArgs};
use solar_deploy::{
    CompiledContract, ContractsRepository, DeployOptions, EventChannel, Orchestrator, RpcTarget,
    TracingSink, U256, repository_path,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    let repo_path = cli
        .repo
        .clone()
        .unwrap_or_else(|| PathBuf::from(repository_path(&cli.env)));
    let repository = ContractsRepository::open(&repo_path).with_context(|| {
        format!(
            "failed to open contracts repository {}",
            repo_path.display()
        )
    })?;

    match cli.command {
        Command::Deploy(ref args) => {
            let target = RpcTarget::from_endpoints(
                cli.utxo_rpc.clone(),
                cli.utxo_sender.clone(),
                cli.eth_rpc.clone(),
            )?;
            deploy(target, repository, args).await
        }
        Command::Status => {
            status(&repository);
            Ok(())
        }
    }
}

async fn deploy(target: RpcTarget, repository: ContractsRepository, args: &DeployArgs) -> Result<()> {
    let compiled = CompiledContract::load(&args.artifact)
        .with_context(|| format!("failed to load artifact {}", args.artifact.display()))?;

    let gas_price = match args.gas_price {
        Some(price) => U256::from(price),
        None => target.default_gas_price(),
    };
    let mut opts = DeployOptions::new(args.name.clone(), gas_price, args.gas_limit);
    opts.as_lib = args.lib;
    opts.overwrite = args.force;

    let format = target.address_format();
    let mut orchestrator = Orchestrator::new(
        repository,
        target.deployer()?,
        EventChannel::new(TracingSink),
    );
    if args.confirm_timeout > 0 {
        orchestrator =
            orchestrator.with_confirm_timeout(Duration::from_secs(args.confirm_timeout));
    }

    let deployed = orchestrator.deploy(&compiled, &args.params, opts).await?;

    if let Some(address) = &deployed.address {
        println!("{}\t{}", deployed.name, format.format(address));
    }

    orchestrator.close().await;
    Ok(())
}

fn status(repository: &ContractsRepository) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["NAME", "STATUS", "ADDRESS", "TXID", "BLOCK"]);

    for (name, contract) in repository.iter() {
        table.add_row(vec![
            name.clone(),
            contract.status.to_string(),
            contract.address.clone().unwrap_or_default(),
            contract.transaction_id.clone(),
            contract
                .block_number
                .map(|n| n.to_string())
                .unwrap_or_default(),
        ]);
    }

    println!("{table}");
}
