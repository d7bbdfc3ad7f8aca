//! Deployer backend for the account chain.
//!
//! Uses the standard Ethereum JSON-RPC surface: `eth_sendTransaction` from
//! the node's first unlocked account, `eth_getTransactionReceipt` to poll
//! for inclusion. Block production is automatic, so `mine` is a no-op.

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

/// Default gas price: 1 gwei, in wei.
pub(super) const DEFAULT_GAS_PRICE: u64 = 1_000_000_000;
/// Intrinsic transaction cost; nothing below this can ever be included.
const MIN_GAS_LIMIT: u64 = 21_000;

const POLL_INTERVAL: Duration = Duration::from_secs(2);

pub struct AccountDeployer {
    client: reqwest::Client,
    url: Url,
}

impl AccountDeployer {
    pub fn new(url: Url) -> Result<Self> {
        Ok(Self {
            client: rpc::create_client()?,
            url,
        })
    }

    fn validate_gas(opts: &DeployOptions) -> Result<()> {
        if opts.gas_price.is_zero() {
            return Err(Error::Options(
                "gas price must be at least 1 wei".to_string(),
            ));
        }
        if opts.gas_limit < MIN_GAS_LIMIT {
            return Err(Error::Options(format!(
                "gas limit {} is below the intrinsic transaction cost of {MIN_GAS_LIMIT}",
                opts.gas_limit
            )));
        }
        Ok(())
    }

    /// The sender for creation transactions: the node's first unlocked
    /// account.
    async fn sender_account(&self) -> Result<String> {
        let accounts: Vec<String> =
            rpc::json_rpc_call(&self.client, &self.url, "eth_accounts", vec![]).await?;

        accounts
            .into_iter()
            .next()
            .ok_or_else(|| Error::rpc("node has no unlocked accounts to send from"))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionReceipt {
    /// "0x1" for success, "0x0" for a reverted transaction.
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    contract_address: Option<String>,
    block_number: String,
}

/// Settle a record against its receipt.
///
/// A reverted creation is a deterministic on-chain rejection, not a
/// transient RPC condition, so it maps to [`Error::Execution`].
fn apply_receipt(deployed: &mut DeployedContract, receipt: TransactionReceipt) -> Result<()> {
    if receipt.status.as_deref() == Some("0x0") {
        deployed.fail();
        return Err(Error::Execution {
            name: deployed.name.clone(),
            reason: "creation reverted".to_string(),
        });
    }

    let block_number = rpc::parse_hex_u64(&receipt.block_number)?;
    if deployed.address.is_none() {
        deployed.address = receipt.contract_address;
    }
    deployed.confirm(block_number);
    Ok(())
}

#[async_trait]
impl Deployer for AccountDeployer {
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

        let from = self.sender_account().await?;
        let data = format!("0x{}{}", hex::encode(&compiled.bin), hex::encode(&args));

        let txid: String = rpc::json_rpc_call(
            &self.client,
            &self.url,
            "eth_sendTransaction",
            vec![json!({
                "from": from,
                "data": data,
                "gas": format!("0x{:x}", opts.gas_limit),
                "gasPrice": format!("0x{:x}", opts.gas_price),
            })],
        )
        .await?;

        tracing::debug!(name = %opts.name, txid = %txid, from = %from, "Creation transaction sent");

        Ok(DeployedContract::pending(opts.name.clone(), txid))
    }

    async fn confirm_contract(&self, deployed: &mut DeployedContract) -> Result<()> {
        if deployed.is_confirmed() {
            return Ok(());
        }

        loop {
            // null until the transaction is included.
            let receipt: Option<TransactionReceipt> = rpc::json_rpc_call(
                &self.client,
                &self.url,
                "eth_getTransactionReceipt",
                vec![json!(deployed.transaction_id)],
            )
            .await?;

            if let Some(receipt) = receipt {
                return apply_receipt(deployed, receipt);
            }

            tracing::trace!(txid = %deployed.transaction_id, "Transaction not yet mined");
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Block production is automatic on this chain.
    async fn mine(&self) -> Result<()> {
        Ok(())
    }
}
