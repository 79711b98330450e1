use std::{collections::HashMap, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::lib::{
    accounts::types::UserId,
    activity::types::OperationId,
    monitor::{
        poller::MonitorHandle,
        types::{MonitorContext, MonitorState, TargetSignal},
    },
    resources::registry::ServiceRegistry,
    teardown::stop_service::StopService,
};

pub struct HarborServer {
    pub services: Arc<ServiceRegistry>,
    pub stop_service: StopService,
    pub monitors: MonitorContext,
    pub poll_interval: Duration,
    pub sessions: Mutex<HashMap<Uuid, MonitorHandle>>,
    pub address: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct StopParams {
    pub user_id: Option<UserId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
    pub docker_cleanup: Option<bool>,
    pub user_id: Option<UserId>,
}

/// `message` is absent when the teardown fully succeeded. `cleanup_activity`
/// is the docker cleanup a delete queued, ready to be watched with
/// `POST /monitors`.
#[derive(Debug, Serialize)]
pub struct TeardownResponse {
    pub message: Option<String>,
    pub cleanup_activity: Option<OperationId>,
}

#[derive(Debug, Deserialize)]
pub struct StartMonitor {
    pub activity_id: OperationId,
    #[serde(default)]
    pub signal: Option<TargetSignal>,
}

#[derive(Debug, Serialize)]
pub struct MonitorStarted {
    pub id: Uuid,
    pub state: MonitorState,
}
