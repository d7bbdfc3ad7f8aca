//! Lifecycle tests for the deployment orchestrator.
//!
//! These run against a scripted in-process deployer, so no chain node is
//! required. They pin down the repository-consistency guarantees: a failed
//! create never touches the book, a failed confirmation is recorded as
//! failed, and confirmed records survive a round trip through the file.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_core::primitives::U256;
use async_trait::async_trait;
use tempdir::TempDir;

use solar_deploy::{
    CompiledContract, ConfirmationStatus, ContractsRepository, DeployEvent, DeployOptions,
    DeployedContract, Deployer, Error, EventChannel, Orchestrator, Result,
};

#[derive(Clone, Copy, PartialEq)]
enum Behavior {
    Succeed,
    Fail,
    /// Poll forever; only the orchestrator's deadline ends it.
    Hang,
}

struct MockDeployer {
    create: Behavior,
    confirm: Behavior,
    mine: Behavior,
    create_calls: Arc<AtomicUsize>,
    mine_calls: Arc<AtomicUsize>,
    last_params: Arc<Mutex<String>>,
}

impl MockDeployer {
    fn new(create: Behavior, confirm: Behavior) -> Self {
        Self {
            create,
            confirm,
            mine: Behavior::Succeed,
            create_calls: Arc::new(AtomicUsize::new(0)),
            mine_calls: Arc::new(AtomicUsize::new(0)),
            last_params: Arc::new(Mutex::new(String::new())),
        }
    }

    fn failing_mine(mut self) -> Self {
        self.mine = Behavior::Fail;
        self
    }
}

#[async_trait]
impl Deployer for MockDeployer {
    async fn create_contract(
        &self,
        _compiled: &CompiledContract,
        params: &str,
        opts: &DeployOptions,
    ) -> Result<DeployedContract> {
        let call = self.create_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_params.lock().unwrap() = params.to_string();

        if self.create == Behavior::Fail {
            return Err(Error::rpc("createcontract: connection refused"));
        }

        let mut deployed = DeployedContract::pending(opts.name.clone(), format!("txid-{call}"));
        deployed.address = Some(format!("aabbccddeeff00112233445566778899aabbcc{call:02}"));
        Ok(deployed)
    }

    async fn confirm_contract(&self, deployed: &mut DeployedContract) -> Result<()> {
        if deployed.is_confirmed() {
            return Ok(());
        }

        match self.confirm {
            Behavior::Succeed => {
                deployed.confirm(7);
                Ok(())
            }
            Behavior::Fail => Err(Error::rpc("gettransactionreceipt: connection reset")),
            Behavior::Hang => loop {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            },
        }
    }

    async fn mine(&self) -> Result<()> {
        self.mine_calls.fetch_add(1, Ordering::SeqCst);
        if self.mine == Behavior::Fail {
            return Err(Error::rpc("generate: method disabled on this node"));
        }
        Ok(())
    }
}

fn compiled(name: &str) -> CompiledContract {
    serde_json::from_value(serde_json::json!({
        "name": name,
        "abi": [],
        "bin": "0x6060604052",
    }))
    .unwrap()
}

fn opts(name: &str) -> DeployOptions {
    DeployOptions::new(name, U256::from(40u64), 250_000)
}

struct Setup {
    _dir: TempDir,
    repo_path: PathBuf,
    orchestrator: Orchestrator,
    events: Arc<Mutex<Vec<DeployEvent>>>,
}

fn setup(mock: MockDeployer) -> Setup {
    let dir = TempDir::new("solar-lifecycle").unwrap();
    let repo_path = dir.path().join("solar.development.json");
    let repository = ContractsRepository::open(&repo_path).unwrap();

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink_events = Arc::clone(&events);
    let channel = EventChannel::new(move |event: DeployEvent| {
        sink_events.lock().unwrap().push(event);
    });

    Setup {
        _dir: dir,
        repo_path,
        orchestrator: Orchestrator::new(repository, Box::new(mock), channel),
        events,
    }
}

#[tokio::test]
async fn test_create_failure_leaves_repository_untouched() {
    let mut s = setup(MockDeployer::new(Behavior::Fail, Behavior::Succeed));

    let err = s
        .orchestrator
        .deploy(&compiled("Token"), "", opts("Token"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Rpc { .. }));

    assert!(s.orchestrator.repository().get("Token").is_none());
    s.orchestrator.close().await;

    // No partial record on disk either.
    let reopened = ContractsRepository::open(&s.repo_path).unwrap();
    assert!(reopened.is_empty());
    assert!(s.events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_confirm_failure_records_failed_entry() {
    let mut s = setup(MockDeployer::new(Behavior::Succeed, Behavior::Fail));

    let err = s
        .orchestrator
        .deploy(&compiled("Token"), "", opts("Token"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Rpc { .. }));

    let record = s.orchestrator.repository().get("Token").unwrap();
    assert_eq!(record.status, ConfirmationStatus::Failed);
    s.orchestrator.close().await;

    // Visible on disk so the operator can see and retry.
    let reopened = ContractsRepository::open(&s.repo_path).unwrap();
    assert_eq!(
        reopened.get("Token").unwrap().status,
        ConfirmationStatus::Failed
    );

    let events = s.events.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], DeployEvent::Created { .. }));
    assert!(matches!(events[1], DeployEvent::Failed { .. }));
}

#[tokio::test]
async fn test_successful_deployment_confirms_and_persists() {
    let mock = MockDeployer::new(Behavior::Succeed, Behavior::Succeed);
    let mine_calls = Arc::clone(&mock.mine_calls);
    let mut s = setup(mock);

    let deployed = s
        .orchestrator
        .deploy(&compiled("Token"), "", opts("Token"))
        .await
        .unwrap();
    assert!(deployed.is_confirmed());
    assert_eq!(deployed.block_number, Some(7));
    assert_eq!(mine_calls.load(Ordering::SeqCst), 1);
    s.orchestrator.close().await;

    let reopened = ContractsRepository::open(&s.repo_path).unwrap();
    let record = reopened.get("Token").unwrap();
    assert!(record.is_confirmed());
    assert_eq!(record.address, deployed.address);

    let events = s.events.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], DeployEvent::Created { .. }));
    assert!(matches!(events[1], DeployEvent::Confirmed { .. }));
}

#[tokio::test]
async fn test_mine_failure_never_downgrades_a_confirmed_record() {
    let mock = MockDeployer::new(Behavior::Succeed, Behavior::Succeed).failing_mine();
    let mut s = setup(mock);

    // The mine error still propagates to the caller.
    let err = s
        .orchestrator
        .deploy(&compiled("Token"), "", opts("Token"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Rpc { .. }));

    // The contract is live on chain; the book must say Confirmed.
    let record = s.orchestrator.repository().get("Token").unwrap();
    assert!(record.is_confirmed());
    s.orchestrator.close().await;

    let reopened = ContractsRepository::open(&s.repo_path).unwrap();
    assert!(reopened.get("Token").unwrap().is_confirmed());

    let events = s.events.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[1], DeployEvent::Confirmed { .. }));
}

#[tokio::test]
async fn test_confirmed_name_requires_overwrite() {
    let mock = MockDeployer::new(Behavior::Succeed, Behavior::Succeed);
    let create_calls = Arc::clone(&mock.create_calls);
    let mut s = setup(mock);

    s.orchestrator
        .deploy(&compiled("Token"), "", opts("Token"))
        .await
        .unwrap();

    // Collision is rejected before any chain call is made.
    let err = s
        .orchestrator
        .deploy(&compiled("Token"), "", opts("Token"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyExists { name } if name == "Token"));
    assert_eq!(create_calls.load(Ordering::SeqCst), 1);

    let mut overwrite = opts("Token");
    overwrite.overwrite = true;
    let replaced = s
        .orchestrator
        .deploy(&compiled("Token"), "", overwrite)
        .await
        .unwrap();
    assert!(replaced.is_confirmed());
    assert_eq!(create_calls.load(Ordering::SeqCst), 2);
    s.orchestrator.close().await;
}

#[tokio::test]
async fn test_placeholders_expand_against_earlier_deployments() {
    let mock = MockDeployer::new(Behavior::Succeed, Behavior::Succeed);
    let last_params = Arc::clone(&mock.last_params);
    let mut s = setup(mock);

    let registry = s
        .orchestrator
        .deploy(&compiled("Registry"), "", opts("Registry"))
        .await
        .unwrap();
    let registry_address = registry.address.unwrap();

    s.orchestrator
        .deploy(&compiled("Token"), r#"["$Registry"]"#, opts("Token"))
        .await
        .unwrap();

    assert_eq!(
        *last_params.lock().unwrap(),
        format!("[\"{registry_address}\"]")
    );
    s.orchestrator.close().await;
}

#[tokio::test]
async fn test_dangling_reference_aborts_before_create() {
    let mock = MockDeployer::new(Behavior::Succeed, Behavior::Succeed);
    let create_calls = Arc::clone(&mock.create_calls);
    let mut s = setup(mock);

    let err = s
        .orchestrator
        .deploy(&compiled("Token"), r#"["$Missing"]"#, opts("Token"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnknownReference { name } if name == "Missing"));
    assert_eq!(create_calls.load(Ordering::SeqCst), 0);
    assert!(s.orchestrator.repository().get("Token").is_none());
    s.orchestrator.close().await;
}

#[tokio::test]
async fn test_confirmation_deadline_marks_deployment_failed() {
    let mut s = setup(MockDeployer::new(Behavior::Succeed, Behavior::Hang));
    s.orchestrator = s
        .orchestrator
        .with_confirm_timeout(Duration::from_millis(50));

    let err = s
        .orchestrator
        .deploy(&compiled("Token"), "", opts("Token"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Rpc { .. }));

    let record = s.orchestrator.repository().get("Token").unwrap();
    assert_eq!(record.status, ConfirmationStatus::Failed);
    s.orchestrator.close().await;
}

#[tokio::test]
async fn test_empty_options_name_falls_back_to_artifact_name() {
    let mut s = setup(MockDeployer::new(Behavior::Succeed, Behavior::Succeed));

    let deployed = s
        .orchestrator
        .deploy(&compiled("Token"), "", opts(""))
        .await
        .unwrap();
    assert_eq!(deployed.name, "Token");
    assert!(s.orchestrator.repository().get("Token").is_some());
    s.orchestrator.close().await;
}
