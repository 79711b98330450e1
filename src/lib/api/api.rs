use axum::{
    Json, Router,
    extract::{Path, Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use tracing::{info, warn};
use uuid::Uuid;

use super::types::{
    DeleteParams, HarborServer, MonitorStarted, StartMonitor, StopParams, TeardownResponse,
};
use crate::lib::{
    activity::types::OperationId,
    monitor::{monitor::ActivityMonitor, poller::spawn_polling},
    teardown::types::TeardownOptions,
};
use std::sync::Arc;
use tokio::net::TcpListener;

impl HarborServer {
    async fn teardown(&self, uuid: &str, options: TeardownOptions) -> Response {
        let Some(service) = self.services.get(uuid).await else {
            return (
                StatusCode::NOT_FOUND,
                format!("Service with uuid {} not found", uuid),
            )
                .into_response();
        };

        let response = match self.stop_service.handle(&service, options).await {
            Ok(report) => {
                if options.is_delete_operation {
                    self.services.remove(uuid).await;
                }
                TeardownResponse {
                    message: None,
                    cleanup_activity: report.cleanup_activity,
                }
            }
            Err(err) => TeardownResponse {
                message: Some(err.to_string()),
                cleanup_activity: None,
            },
        };
        Json(response).into_response()
    }

    async fn stop_service(
        AxumState(server): AxumState<Arc<HarborServer>>,
        Path(uuid): Path<String>,
        Query(params): Query<StopParams>,
    ) -> Response {
        info!(service = %uuid, user = ?params.user_id, "Stop requested");
        let options = TeardownOptions {
            actor: params.user_id,
            ..TeardownOptions::default()
        };
        server.teardown(&uuid, options).await
    }

    async fn delete_service(
        AxumState(server): AxumState<Arc<HarborServer>>,
        Path(uuid): Path<String>,
        Query(params): Query<DeleteParams>,
    ) -> Response {
        info!(service = %uuid, user = ?params.user_id, "Delete requested");
        let options = TeardownOptions {
            is_delete_operation: true,
            docker_cleanup: params.docker_cleanup.unwrap_or(true),
            actor: params.user_id,
        };
        server.teardown(&uuid, options).await
    }

    async fn get_activity(
        AxumState(server): AxumState<Arc<HarborServer>>,
        Path(id): Path<String>,
    ) -> Response {
        let Ok(id) = id.parse::<OperationId>() else {
            return (StatusCode::BAD_REQUEST, format!("Invalid activity id {}", id)).into_response();
        };

        match server.monitors.activities.find(id).await {
            Ok(Some(activity)) => Json(activity).into_response(),
            Ok(None) => (StatusCode::NOT_FOUND, format!("Activity {} not found", id)).into_response(),
            Err(err) => {
                warn!(activity = %id, error = %err, "Activity lookup failed");
                (StatusCode::SERVICE_UNAVAILABLE, err.to_string()).into_response()
            }
        }
    }

    async fn start_monitor(
        AxumState(server): AxumState<Arc<HarborServer>>,
        Json(request): Json<StartMonitor>,
    ) -> Response {
        let mut monitor = ActivityMonitor::new(server.monitors.clone());
        monitor
            .start(request.activity_id, Some(request.signal.unwrap_or_default()))
            .await;
        if monitor.activity().is_none() {
            return (
                StatusCode::NOT_FOUND,
                format!("Activity {} not found", request.activity_id),
            )
                .into_response();
        }

        let id = Uuid::new_v4();
        let state = monitor.state();
        let handle = spawn_polling(monitor, server.poll_interval);

        let mut sessions = server.sessions.lock().await;
        sessions.retain(|_, session| !session.is_finished());
        sessions.insert(id, handle);
        info!(monitor = %id, activity = %request.activity_id, "Monitor started");

        (StatusCode::CREATED, Json(MonitorStarted { id, state })).into_response()
    }

    async fn stop_monitor(
        AxumState(server): AxumState<Arc<HarborServer>>,
        Path(id): Path<Uuid>,
    ) -> StatusCode {
        if let Some(handle) = server.sessions.lock().await.remove(&id) {
            handle.stop();
            info!(monitor = %id, "Monitor stopped");
        }
        StatusCode::NO_CONTENT
    }

    pub fn router(self) -> Router {
        let shared = Arc::new(self);

        Router::new()
            .route("/services/{uuid}/stop", post(HarborServer::stop_service))
            .route("/services/{uuid}", delete(HarborServer::delete_service))
            .route("/activities/{id}", get(HarborServer::get_activity))
            .route("/monitors", post(HarborServer::start_monitor))
            .route("/monitors/{id}", delete(HarborServer::stop_monitor))
            .with_state(shared)
    }

    pub async fn start_server(self) -> std::io::Result<()> {
        let address = self.address.clone();
        let app = self.router();

        let listener = TcpListener::bind(&address).await?;
        info!(%address, "Listening");
        axum::serve(listener, app).await
    }
}
