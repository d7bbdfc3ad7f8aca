//! Deployment lifecycle orchestration.
//!
//! Drives a single deployment through
//! `Unstarted -> Created -> Confirming -> {Confirmed | Failed}` and commits
//! the outcome into the contracts repository. All collaborators are
//! constructed by the caller and passed in; the orchestrator owns the
//! repository for the life of the process.

use std::time::Duration;

use crate::contract::{CompiledContract, DeployedContract};
use crate::deployer::{DeployOptions, Deployer};
use crate::error::{Error, Result};
use crate::events::{DeployEvent, EventChannel};
use crate::expand::expand;
use crate::repository::ContractsRepository;

pub struct Orchestrator {
    repository: ContractsRepository,
    deployer: Box<dyn Deployer>,
    events: EventChannel,
    /// Deadline for the confirmation phase. `None` means poll forever.
    confirm_timeout: Option<Duration>,
}

impl Orchestrator {
    pub fn new(
        repository: ContractsRepository,
        deployer: Box<dyn Deployer>,
        events: EventChannel,
    ) -> Self {
        Self {
            repository,
            deployer,
            events,
            confirm_timeout: None,
        }
    }

    /// Bound the confirmation phase. Exceeding the deadline fails the
    /// deployment; the record is persisted as failed so the operator can
    /// retry.
    pub fn with_confirm_timeout(mut self, timeout: Duration) -> Self {
        self.confirm_timeout = Some(timeout);
        self
    }

    pub fn repository(&self) -> &ContractsRepository {
        &self.repository
    }

    /// Deploy one compiled contract.
    ///
    /// `params` is the raw JSON constructor-argument array; `$Name` and
    /// `${Name}` references are expanded against the repository before
    /// anything touches the chain. The repository is only written after the
    /// creation transaction has a transaction id: a failed create leaves the
    /// book exactly as it was.
    pub async fn deploy(
        &mut self,
        compiled: &CompiledContract,
        params: &str,
        mut opts: DeployOptions,
    ) -> Result<DeployedContract> {
        if opts.name.is_empty() {
            opts.name = compiled.name.clone();
        }
        let name = opts.name.clone();

        // Fail the collision before burning a transaction on it.
        if let Some(existing) = self.repository.get(&name) {
            if existing.is_confirmed() && !opts.overwrite {
                return Err(Error::AlreadyExists { name });
            }
        }

        let expanded = expand(params, |key| {
            self.repository.get(key).and_then(|c| c.address.clone())
        })?;

        let mut deployed = self
            .deployer
            .create_contract(compiled, &expanded, &opts)
            .await?;

        self.events.emit(DeployEvent::Created {
            name: name.clone(),
            transaction_id: deployed.transaction_id.clone(),
        });

        let outcome = self.confirm_and_mine(&mut deployed).await;

        match outcome {
            Ok(()) if deployed.is_confirmed() => {
                self.commit_confirmed(&name, &deployed, opts.overwrite)?;
                Ok(deployed)
            }
            Ok(()) => {
                let err = Error::Protocol(format!(
                    "backend reported success but {name} is still {}",
                    deployed.status
                ));
                self.record_failure(&name, deployed, &opts, &err);
                Err(err)
            }
            // Confirmed is terminal: the contract is live on chain even
            // though a later step (mining, or the deadline around it)
            // errored. Commit the record and surface the error unchanged.
            Err(err) if deployed.is_confirmed() => {
                self.commit_confirmed(&name, &deployed, opts.overwrite)?;
                Err(err)
            }
            Err(err) => {
                self.record_failure(&name, deployed, &opts, &err);
                Err(err)
            }
        }
    }

    /// Commit a confirmed record into the repository and report it.
    fn commit_confirmed(
        &mut self,
        name: &str,
        deployed: &DeployedContract,
        overwrite: bool,
    ) -> Result<()> {
        self.repository.put(name, deployed.clone(), overwrite)?;
        self.repository.save()?;

        self.events.emit(DeployEvent::Confirmed {
            name: name.to_string(),
            address: deployed.address.clone().unwrap_or_default(),
            block_number: deployed.block_number.unwrap_or_default(),
        });
        Ok(())
    }

    /// Run confirmation with mining requested alongside it, under the
    /// configured deadline.
    ///
    /// Mining is triggered after confirmation has been requested, never
    /// before; the backend decides whether it does anything.
    async fn confirm_and_mine(&self, deployed: &mut DeployedContract) -> Result<()> {
        let deployer = &self.deployer;
        let fut = async {
            let (confirmed, mined) = tokio::join!(
                deployer.confirm_contract(deployed),
                deployer.mine(),
            );
            confirmed?;
            mined
        };

        match self.confirm_timeout {
            Some(deadline) => match tokio::time::timeout(deadline, fut).await {
                Ok(result) => result,
                Err(_) => Err(Error::rpc(format!(
                    "confirmation deadline of {deadline:?} exceeded"
                ))),
            },
            None => fut.await,
        }
    }

    /// Persist the record as failed so the operator can see and retry, then
    /// report it. Never overwrites a confirmed record the caller did not opt
    /// to replace.
    fn record_failure(
        &mut self,
        name: &str,
        mut deployed: DeployedContract,
        opts: &DeployOptions,
        err: &Error,
    ) {
        deployed.fail();

        let persisted = self
            .repository
            .put(name, deployed, opts.overwrite)
            .and_then(|_| self.repository.save());
        if let Err(save_err) = persisted {
            tracing::error!(name = %name, error = %save_err, "Failed to record failed deployment");
        }

        self.events.emit(DeployEvent::Failed {
            name: name.to_string(),
            reason: err.to_string(),
        });
    }

    /// Shut down, draining any lifecycle events still in flight.
    pub async fn close(self) {
        self.events.close().await;
    }
}
