//! solar-deploy - Smart contract deployment management.
//!
//! This crate drives deployment of compiled Solidity artifacts to one of two
//! chain backends (a UTXO chain or an account chain) and tracks deployed
//! contract addresses per environment in a contracts repository.

mod abi;
mod contract;
mod deployer;
mod error;
mod events;
mod expand;
mod orchestrator;
mod repository;
mod rpc;

pub use contract::{
    AbiEntry, AbiParam, AddressFormat, CompiledContract, ConfirmationStatus, DeployedContract,
};
pub use deployer::{AccountDeployer, DeployOptions, Deployer, RpcTarget, UtxoDeployer};
pub use error::{Error, Result};
pub use events::{DeployEvent, EventChannel, EventSink, TracingSink};
pub use expand::expand;
pub use orchestrator::Orchestrator;
pub use repository::ContractsRepository;

pub use alloy_core::primitives::U256;

/// Repository file name for an environment, by convention
/// `solar.<env>.json`.
pub fn repository_path(env: &str) -> String {
    format!("solar.{env}.json")
}
