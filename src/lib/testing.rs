//! Recording fakes of the ports and sample fixtures shared by unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::lib::{
    accounts::{
        directory::MemoryUserDirectory,
        types::{User, UserId},
    },
    activity::{
        recorder::OperationRecorder,
        store::MemoryActivityStore,
        types::{ActivityRecord, ActivityStore, EXIT_CODE, OperationId, StoreError},
    },
    events::types::{Notification, NotificationDispatcher},
    monitor::{
        guard::DispatchGuard,
        monitor::ActivityMonitor,
        types::{GuardScope, MonitorContext},
    },
    remote::types::{CommandOutput, ExecutionError, RemoteExecutor},
    resources::types::{
        ContainerKind, ContainerStatus, Destination, Environment, Project, Server,
        ServerSettings, Service, ServiceContainer, Team,
    },
    teardown::types::CleanupQueue,
};

// ── Fixtures ──────────────────────────────────────────────────────────────────

pub fn sample_team() -> Team {
    Team {
        id: 42,
        name: "platform".to_string(),
    }
}

pub fn sample_server() -> Server {
    Server {
        id: 1,
        uuid: "srv-1".to_string(),
        name: "edge-1".to_string(),
        ip: "10.0.0.5".to_string(),
        user: "root".to_string(),
        port: 22,
        settings: ServerSettings::default(),
    }
}

pub fn sample_service() -> Service {
    Service {
        id: 9,
        uuid: "svc-1".to_string(),
        name: "blog".to_string(),
        environment: Environment {
            id: 3,
            name: "production".to_string(),
            project: Project {
                id: 2,
                name: "website".to_string(),
                team: sample_team(),
            },
        },
        destination: Some(Destination {
            id: 5,
            network: "harbor".to_string(),
            server: Some(sample_server()),
        }),
        containers: vec![
            ServiceContainer {
                name: "app".to_string(),
                kind: ContainerKind::Application,
                status: ContainerStatus::Running,
                keep_alive: false,
            },
            ServiceContainer {
                name: "postgres".to_string(),
                kind: ContainerKind::Database,
                status: ContainerStatus::Running,
                keep_alive: false,
            },
        ],
        networks: Vec::new(),
    }
}

pub fn sample_user() -> User {
    User {
        id: 1,
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        teams: vec![sample_team()],
        current_team_id: Some(42),
    }
}

pub fn recorder_with(executor: Arc<RecordingExecutor>) -> OperationRecorder {
    OperationRecorder::new(executor, Arc::new(MemoryActivityStore::new()))
}

// ── Mock: remote executor ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Exit(i32),
    Unreachable,
    /// Never completes.
    Hang,
}

/// Records every command; succeeds unless a failure matches its prefix.
#[derive(Default)]
pub struct RecordingExecutor {
    commands: Mutex<Vec<String>>,
    failures: Mutex<Vec<(String, Failure)>>,
}

impl RecordingExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_on(&self, prefix: &str, failure: Failure) {
        self.failures
            .lock()
            .expect("lock")
            .push((prefix.to_string(), failure));
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().expect("lock").clone()
    }
}

#[async_trait]
impl RemoteExecutor for RecordingExecutor {
    async fn run(&self, server: &Server, command: &str) -> Result<CommandOutput, ExecutionError> {
        self.commands.lock().expect("lock").push(command.to_string());
        let failure = self
            .failures
            .lock()
            .expect("lock")
            .iter()
            .find(|(prefix, _)| command.starts_with(prefix.as_str()))
            .map(|(_, failure)| *failure);

        match failure {
            None => Ok(CommandOutput {
                exit_code: 0,
                output: String::new(),
            }),
            Some(Failure::Exit(exit_code)) => Ok(CommandOutput {
                exit_code,
                output: format!("{command}: failed"),
            }),
            Some(Failure::Unreachable) => Err(ExecutionError::Connection {
                server: server.name.clone(),
                reason: "connection refused".to_string(),
            }),
            Some(Failure::Hang) => std::future::pending().await,
        }
    }
}

// ── Mock: notification dispatcher ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingDispatcher {
    dispatched: Mutex<Vec<Notification>>,
}

impl RecordingDispatcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn dispatched(&self) -> Vec<Notification> {
        self.dispatched.lock().expect("lock").clone()
    }
}

impl NotificationDispatcher for RecordingDispatcher {
    fn dispatch(&self, notification: Notification) {
        self.dispatched.lock().expect("lock").push(notification);
    }
}

// ── Mock: cleanup queue ───────────────────────────────────────────────────────

/// Hands out a fresh activity id per enqueue without running anything.
#[derive(Default)]
pub struct RecordingCleanupQueue {
    enqueued: Mutex<Vec<(String, bool, Option<UserId>)>>,
    activities: Mutex<Vec<OperationId>>,
}

impl RecordingCleanupQueue {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// `(server uuid, aggressive, actor)` per enqueue.
    pub fn enqueued(&self) -> Vec<(String, bool, Option<UserId>)> {
        self.enqueued.lock().expect("lock").clone()
    }

    pub fn last_activity(&self) -> Option<OperationId> {
        self.activities.lock().expect("lock").last().copied()
    }
}

#[async_trait]
impl CleanupQueue for RecordingCleanupQueue {
    async fn enqueue(
        &self,
        server: &Server,
        aggressive: bool,
        actor: Option<UserId>,
    ) -> Option<OperationId> {
        self.enqueued
            .lock()
            .expect("lock")
            .push((server.uuid.clone(), aggressive, actor));
        let id = OperationId::new();
        self.activities.lock().expect("lock").push(id);
        Some(id)
    }
}

// ── Mock: unavailable activity store ─────────────────────────────────────────

pub struct FailingActivityStore;

#[async_trait]
impl ActivityStore for FailingActivityStore {
    async fn find(&self, _: OperationId) -> Result<Option<ActivityRecord>, StoreError> {
        Err(StoreError::Unavailable("database is down".to_string()))
    }

    async fn create(
        &self,
        _: Option<UserId>,
        _: &str,
        _: Map<String, Value>,
    ) -> Result<OperationId, StoreError> {
        Err(StoreError::Unavailable("database is down".to_string()))
    }

    async fn update_properties(&self, _: OperationId, _: Map<String, Value>) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database is down".to_string()))
    }
}

// ── Monitor fixture ───────────────────────────────────────────────────────────

/// Monitor collaborators with one known user (id 1, current team 42).
pub struct Fixture {
    pub activities: Arc<dyn ActivityStore>,
    pub dispatcher: Arc<RecordingDispatcher>,
    pub guard: Arc<DispatchGuard>,
    users: Arc<MemoryUserDirectory>,
}

impl Fixture {
    pub fn new(scope: GuardScope) -> Self {
        Self::with_store(Arc::new(MemoryActivityStore::new()), scope)
    }

    pub fn with_store(activities: Arc<dyn ActivityStore>, scope: GuardScope) -> Self {
        Fixture {
            activities,
            dispatcher: RecordingDispatcher::new(),
            guard: Arc::new(DispatchGuard::new(scope)),
            users: Arc::new(MemoryUserDirectory::new(vec![sample_user()])),
        }
    }

    pub fn context(&self) -> MonitorContext {
        MonitorContext {
            activities: self.activities.clone(),
            users: self.users.clone(),
            dispatcher: self.dispatcher.clone(),
            guard: self.guard.clone(),
        }
    }

    pub fn monitor(&self) -> ActivityMonitor {
        ActivityMonitor::new(self.context())
    }

    pub async fn activity(&self, causer_id: Option<UserId>) -> OperationId {
        self.activities
            .create(causer_id, "docker cleanup", Map::new())
            .await
            .expect("create activity")
    }

    pub async fn finish(&self, id: OperationId, exit_code: i64) {
        let mut properties = Map::new();
        properties.insert(EXIT_CODE.to_string(), Value::from(exit_code));
        self.activities
            .update_properties(id, properties)
            .await
            .expect("finish activity");
    }
}
