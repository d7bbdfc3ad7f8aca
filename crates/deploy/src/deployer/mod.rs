//! The chain-agnostic deployment capability and backend selection.

mod account;
mod utxo;

use alloy_core::primitives::U256;
use async_trait::async_trait;
use url::Url;

pub use account::AccountDeployer;
pub use utxo::UtxoDeployer;

use crate::contract::{AddressFormat, CompiledContract, DeployedContract};
use crate::error::{Error, Result};

/// Per-deployment options. Passed by value into every create call and never
/// mutated by a backend.
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Deploy as a library (no constructor arguments).
    pub as_lib: bool,
    /// Name to register the contract under; empty means the artifact name.
    pub name: String,
    /// Replace an existing confirmed record of the same name.
    pub overwrite: bool,
    /// Gas price in the target chain's smallest unit.
    pub gas_price: U256,
    pub gas_limit: u64,
}

impl DeployOptions {
    pub fn new(name: impl Into<String>, gas_price: U256, gas_limit: u64) -> Self {
        Self {
            as_lib: false,
            name: name.into(),
            overwrite: false,
            gas_price,
            gas_limit,
        }
    }
}

/// The configured chain backend. Exactly one of the two endpoints must be
/// set; both or neither is a configuration error, never resolved by
/// precedence.
#[derive(Debug, Clone)]
pub enum RpcTarget {
    /// UTXO chain: needs a sender address to fund the creation transaction.
    Utxo { url: Url, sender: String },
    /// Account chain: the node's first unlocked account is the sender.
    Account { url: Url },
}

impl RpcTarget {
    /// Resolve the target from the two endpoint settings.
    pub fn from_endpoints(
        utxo_rpc: Option<Url>,
        utxo_sender: Option<String>,
        account_rpc: Option<Url>,
    ) -> Result<Self> {
        match (utxo_rpc, account_rpc) {
            (Some(_), Some(_)) => Err(Error::Config(
                "both UTXO and account endpoints are set; pick exactly one".to_string(),
            )),
            (None, None) => Err(Error::Config(
                "no RPC endpoint configured; set SOLAR_UTXO_RPC or SOLAR_ETH_RPC".to_string(),
            )),
            (Some(url), None) => {
                let sender = utxo_sender.filter(|s| !s.is_empty()).ok_or_else(|| {
                    Error::Config(
                        "the UTXO backend needs a sender address (SOLAR_UTXO_SENDER)".to_string(),
                    )
                })?;
                Ok(RpcTarget::Utxo { url, sender })
            }
            (None, Some(url)) => Ok(RpcTarget::Account { url }),
        }
    }

    /// Output encoding for addresses on this chain family.
    pub fn address_format(&self) -> AddressFormat {
        match self {
            RpcTarget::Utxo { .. } => AddressFormat::Bare,
            RpcTarget::Account { .. } => AddressFormat::Prefixed,
        }
    }

    /// Default gas price for this chain, in its smallest unit.
    pub fn default_gas_price(&self) -> U256 {
        match self {
            RpcTarget::Utxo { .. } => U256::from(utxo::MIN_GAS_PRICE),
            RpcTarget::Account { .. } => U256::from(account::DEFAULT_GAS_PRICE),
        }
    }

    /// Construct the deployer for this target.
    pub fn deployer(&self) -> Result<Box<dyn Deployer>> {
        Ok(match self {
            RpcTarget::Utxo { url, sender } => {
                Box::new(UtxoDeployer::new(url.clone(), sender.clone())?)
            }
            RpcTarget::Account { url } => Box::new(AccountDeployer::new(url.clone())?),
        })
    }
}

/// The capability set every chain backend implements.
///
/// A deployer is a stateless protocol adapter: it owns an HTTP client and the
/// endpoint, never the repository. All repository writes stay with the
/// orchestrator.
#[async_trait]
pub trait Deployer: Send + Sync {
    /// Submit a contract-creation transaction.
    ///
    /// `params` is the JSON constructor-argument array with all placeholders
    /// already expanded; no expansion happens here. Returns the pending
    /// record carrying the backend's transaction identifier.
    async fn create_contract(
        &self,
        compiled: &CompiledContract,
        params: &str,
        opts: &DeployOptions,
    ) -> Result<DeployedContract>;

    /// Poll until the chain reports the creation transaction as included,
    /// then mark the record `Confirmed` (with its block reference) or
    /// `Failed`.
    ///
    /// Idempotent: confirming an already-confirmed record is a no-op
    /// success. May block for a chain-dependent duration; callers supply
    /// their own deadline.
    async fn confirm_contract(&self, deployed: &mut DeployedContract) -> Result<()>;

    /// Produce a block, on backends where block production is manual.
    /// A no-op success everywhere else.
    async fn mine(&self) -> Result<()>;
}
