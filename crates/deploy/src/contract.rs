//! Compiled and deployed contract records.

use std::path::Path;

use alloy_core::primitives::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single entry of a contract ABI (constructor, function, event, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiEntry {
    /// Entry kind as emitted by solc: "constructor", "function", "event", ...
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<AbiParam>,
}

/// A named, typed ABI parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParam {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// An immutable compiler artifact. Produced by the external Solidity
/// compiler; never mutated by the deployment core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledContract {
    pub name: String,
    pub abi: Vec<AbiEntry>,
    /// Raw deployment bytecode.
    pub bin: Bytes,
    /// Names of library-link placeholders left unresolved in the bytecode.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub link_references: Vec<String>,
}

impl CompiledContract {
    /// Read a compiled artifact from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| Error::File {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|err| Error::File {
            path: path.to_path_buf(),
            message: format!("invalid contract artifact: {err}"),
        })
    }

    /// The constructor input parameters, if the ABI declares a constructor.
    pub fn constructor_inputs(&self) -> &[AbiParam] {
        self.abi
            .iter()
            .find(|entry| entry.kind == "constructor")
            .map(|entry| entry.inputs.as_slice())
            .unwrap_or(&[])
    }
}

/// Confirmation lifecycle state of a deployed contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationStatus {
    Pending,
    Confirmed,
    Failed,
}

impl std::fmt::Display for ConfirmationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfirmationStatus::Pending => write!(f, "pending"),
            ConfirmationStatus::Confirmed => write!(f, "confirmed"),
            ConfirmationStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A contract deployment record as persisted in the repository.
///
/// Created by the orchestrator right after a successful create call, mutated
/// only by the confirmation step, and frozen once the status reaches
/// `Confirmed` or `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedContract {
    pub name: String,
    /// Chain address in the backend's own encoding. Known at create time on
    /// the UTXO chain, only after inclusion on the account chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub transaction_id: String,
    pub status: ConfirmationStatus,
    /// Block the creation transaction was included in, once confirmed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
}

impl DeployedContract {
    /// A fresh record for a just-submitted creation transaction.
    pub fn pending(name: impl Into<String>, transaction_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
            transaction_id: transaction_id.into(),
            status: ConfirmationStatus::Pending,
            block_number: None,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == ConfirmationStatus::Confirmed
    }

    /// Mark the record confirmed at the given block.
    pub fn confirm(&mut self, block_number: u64) {
        self.status = ConfirmationStatus::Confirmed;
        self.block_number = Some(block_number);
    }

    pub fn fail(&mut self) {
        self.status = ConfirmationStatus::Failed;
    }
}

/// How chain addresses and byte blobs are rendered for output.
///
/// Derived from the active RPC target: the account chain conventionally
/// shows `0x`-prefixed hex, the UTXO chain bare hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFormat {
    Prefixed,
    Bare,
}

impl AddressFormat {
    pub fn format(&self, address: &str) -> String {
        let bare = address.strip_prefix("0x").unwrap_or(address);
        match self {
            AddressFormat::Prefixed => format!("0x{bare}"),
            AddressFormat::Bare => bare.to_string(),
        }
    }
}
