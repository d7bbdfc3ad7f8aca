//! Deployer backend for the UTXO chain.
//!
//! Speaks the bitcoind-style contract RPC: `createcontract` to submit,
//! `gettransactionreceipt` to poll for inclusion, and `generate` for manual
//! block production on development nodes.

use std::time::Duration;

use alloy_core::primitives::U256;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::{DeployOptions, Deployer};
use crate::abi;
use crate::contract::{CompiledContract, DeployedContract};
use crate::error::{Error, Result};
use crate::rpc;

/// Chain minimum gas price, in satoshi per gas.
pub(super) const MIN_GAS_PRICE: u64 = 40;
/// Chain minimum gas limit for a contract creation.
const MIN_GAS_LIMIT: u64 = 10_000;
/// Block gas ceiling; anything above can never be mined.
const BLOCK_GAS_LIMIT: u64 = 40_000_000;
/// Satoshi per coin, for the amount encoding the node expects.
const COIN: u64 = 100_000_000;

const POLL_INTERVAL: Duration = Duration::from_secs(2);

pub struct UtxoDeployer {
    client: reqwest::Client,
    url: Url,
    sender: String,
}

impl UtxoDeployer {
    pub fn new(url: Url, sender: String) -> Result<Self> {
        Ok(Self {
            client: rpc::create_client()?,
            url,
            sender,
        })
    }

    fn validate_gas(opts: &DeployOptions) -> Result<()> {
        if opts.gas_price < U256::from(MIN_GAS_PRICE) {
            return Err(Error::Options(format!(
                "gas price {} is below the chain minimum of {MIN_GAS_PRICE} satoshi",
                opts.gas_price
            )));
        }
        if opts.gas_limit < MIN_GAS_LIMIT {
            return Err(Error::Options(format!(
                "gas limit {} is below the chain minimum of {MIN_GAS_LIMIT}",
                opts.gas_limit
            )));
        }
        if opts.gas_limit > BLOCK_GAS_LIMIT {
            return Err(Error::Options(format!(
                "gas limit {} exceeds the block gas ceiling of {BLOCK_GAS_LIMIT}",
                opts.gas_limit
            )));
        }
        Ok(())
    }
}

/// Render a satoshi amount as the decimal coin string the node expects.
fn format_coin_amount(satoshi: U256) -> String {
    let coin = U256::from(COIN);
    let integer = satoshi / coin;
    let fraction = (satoshi % coin).to::<u64>();
    format!("{integer}.{fraction:08}")
}

#[derive(Debug, Deserialize)]
struct CreateContractResponse {
    txid: String,
    /// Contract address, known at create time on this chain.
    address: String,
}

fn excepted_none() -> String {
    "None".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionReceipt {
    block_number: u64,
    #[serde(default)]
    contract_address: Option<String>,
    /// "None" for a successful execution, otherwise the exception name.
    #[serde(default = "excepted_none")]
    excepted: String,
}

/// Settle a record against its receipt.
///
/// An exception in the receipt is a deterministic on-chain rejection, not a
/// transient RPC condition, so it maps to [`Error::Execution`].
fn apply_receipt(deployed: &mut DeployedContract, receipt: TransactionReceipt) -> Result<()> {
    if receipt.excepted != "None" {
        deployed.fail();
        return Err(Error::Execution {
            name: deployed.name.clone(),
            reason: format!("execution excepted: {}", receipt.excepted),
        });
    }

    if deployed.address.is_none() {
        deployed.address = receipt.contract_address;
    }
    deployed.confirm(receipt.block_number);
    Ok(())
}

#[async_trait]
impl Deployer for UtxoDeployer {
    async fn create_contract(
        &self,
        compiled: &CompiledContract,
        params: &str,
        opts: &DeployOptions,
    ) -> Result<DeployedContract> {
        Self::validate_gas(opts)?;

        if !compiled.link_references.is_empty() {
            return Err(Error::Options(format!(
                "bytecode of {} has unlinked library placeholders: {}",
                compiled.name,
                compiled.link_references.join(", ")
            )));
        }

        let args = if opts.as_lib {
            Vec::new()
        } else {
            abi::encode_constructor_args(compiled.constructor_inputs(), params)?
        };

        let mut bytecode = hex::encode(&compiled.bin);
        bytecode.push_str(&hex::encode(&args));

        let response: CreateContractResponse = rpc::json_rpc_call(
            &self.client,
            &self.url,
            "createcontract",
            vec![
                json!(bytecode),
                json!(opts.gas_limit),
                json!(format_coin_amount(opts.gas_price)),
                json!(self.sender),
            ],
        )
        .await?;

        tracing::debug!(
            name = %opts.name,
            txid = %response.txid,
            address = %response.address,
            "createcontract accepted"
        );

        let mut deployed = DeployedContract::pending(opts.name.clone(), response.txid);
        deployed.address = Some(response.address);
        Ok(deployed)
    }

    async fn confirm_contract(&self, deployed: &mut DeployedContract) -> Result<()> {
        if deployed.is_confirmed() {
            return Ok(());
        }

        loop {
            let receipts: Vec<TransactionReceipt> = rpc::json_rpc_call(
                &self.client,
                &self.url,
                "gettransactionreceipt",
                vec![json!(deployed.transaction_id)],
            )
            .await?;

            // The node answers with an empty array until the transaction is
            // included in a block.
            if let Some(receipt) = receipts.into_iter().next() {
                return apply_receipt(deployed, receipt);
            }

            tracing::trace!(txid = %deployed.transaction_id, "Transaction not yet mined");
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Ask a development node to produce a block.
    async fn mine(&self) -> Result<()> {
        let blocks: Vec<String> =
            rpc::json_rpc_call(&self.client, &self.url, "generate", vec![json!(1)]).await?;
        tracing::debug!(blocks = ?blocks, "Generated block");
        Ok(())
    }
}
