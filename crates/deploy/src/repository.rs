//! Per-environment contracts repository.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::contract::DeployedContract;
use crate::error::{Error, Result};

/// The on-disk mapping from contract name to its deployment record for one
/// environment (by convention `solar.<env>.json`).
///
/// The repository is the single source of truth for address resolution. It is
/// process-local state with a single owner (the orchestrator); persistence is
/// atomic so a crash mid-save can never leave a truncated file behind.
#[derive(Debug)]
pub struct ContractsRepository {
    path: PathBuf,
    contracts: BTreeMap<String, DeployedContract>,
    dirty: bool,
}

impl ContractsRepository {
    /// Open the repository file at `path`.
    ///
    /// A missing file yields a valid empty repository (first run). A file
    /// that exists but does not parse is a hard error, never an empty
    /// default.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let contracts = match std::fs::read_to_string(&path) {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|err| Error::File {
                    path: path.clone(),
                    message: format!("malformed repository: {err}"),
                })?
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                return Err(Error::File {
                    path,
                    message: err.to_string(),
                });
            }
        };

        Ok(Self {
            path,
            contracts,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up a deployment record by contract name.
    pub fn get(&self, name: &str) -> Option<&DeployedContract> {
        self.contracts.get(name)
    }

    /// Insert or replace a deployment record.
    ///
    /// A name already bound to a confirmed record is never silently
    /// replaced; re-deploying requires `overwrite`. Unconfirmed (pending or
    /// failed) records may always be replaced.
    pub fn put(&mut self, name: &str, record: DeployedContract, overwrite: bool) -> Result<()> {
        if let Some(existing) = self.contracts.get(name) {
            if existing.is_confirmed() && !overwrite {
                return Err(Error::AlreadyExists {
                    name: name.to_string(),
                });
            }
        }

        self.contracts.insert(name.to_string(), record);
        self.dirty = true;
        Ok(())
    }

    /// Persist the full repository atomically.
    ///
    /// Writes to a temp file in the same directory and renames it over the
    /// target, so the file on disk is always either the previous complete
    /// version or the new complete version.
    pub fn save(&mut self) -> Result<()> {
        let content = serde_json::to_vec_pretty(&self.contracts).map_err(|err| Error::File {
            path: self.path.clone(),
            message: format!("serialize repository: {err}"),
        })?;

        let tmp_path = self.path.with_extension("json.tmp");
        let write_err = |err: std::io::Error| Error::File {
            path: self.path.clone(),
            message: err.to_string(),
        };

        std::fs::write(&tmp_path, &content).map_err(write_err)?;
        std::fs::rename(&tmp_path, &self.path).map_err(write_err)?;

        self.dirty = false;
        tracing::debug!(path = %self.path.display(), contracts = self.contracts.len(), "Repository saved");
        Ok(())
    }

    /// Whether the in-memory state has diverged from the file.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// Iterate over records in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &DeployedContract)> {
        self.contracts.iter()
    }
}
