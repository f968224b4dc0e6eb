use std::convert::Infallible;
use std::path::Path as FsPath;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive};
use axum::response::{IntoResponse, Sse};
use axum::routing::{get, put};
use axum::{Json, Router};
use crm_kanban_core::{
    BoardChanged, BoardSnapshot, ColumnId, GenericItem, ItemId, Lead, Opportunity, Permissions, ProjectTask,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::{broadcast, RwLock};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::store::{Store, StoreError, Stored};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct AppState {
    store: Arc<RwLock<Store>>,
    events: broadcast::Sender<BoardChanged>,
    permissions: Arc<Permissions>,
    fail_updates: bool,
}

impl AppState {
    pub fn new(store: Store, config: &ServerConfig) -> Self {
        let (events, _) = broadcast::channel(100);
        Self {
            store: Arc::new(RwLock::new(store)),
            events,
            permissions: Arc::new(config.permissions.clone()),
            fail_updates: config.fail_updates,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardChanged> {
        self.events.subscribe()
    }
}

pub fn build_router(state: AppState, dist: &FsPath) -> Router {
    let ui = ServeDir::new(dist).fallback(ServeFile::new(dist.join("index.html")));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/leads/board", get(board::<Lead>))
        .route("/api/opportunities/board", get(board::<Opportunity>))
        .route("/api/project-tasks/board", get(board::<ProjectTask>))
        .route("/api/items/board", get(board::<GenericItem>))
        .route("/leads/:id/status", put(update_status::<Lead>))
        .route("/opportunities/:id/stage", put(update_status::<Opportunity>))
        .route("/project-tasks/:id/status", put(update_status::<ProjectTask>))
        .route("/items/:id/status", put(update_status::<GenericItem>))
        .route("/api/events", get(sse_handler))
        .fallback_service(ui)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[derive(Debug, Default, Deserialize)]
struct BoardQuery {
    project: Option<u64>,
}

async fn board<T: Stored>(
    State(state): State<AppState>,
    Query(query): Query<BoardQuery>,
) -> Json<BoardSnapshot<T>> {
    let store = state.store.read().await;
    let snapshot = T::table(&store).snapshot(&state.permissions, |record| {
        query.project.map_or(true, |project| record.project_id() == Some(project))
    });
    tracing::debug!(entity = T::config().entity, project = ?query.project, "board snapshot");
    Json(snapshot)
}

/// Reads the destination status from the entity's own field name.
fn requested_status(body: &Map<String, Value>, field: &str) -> Result<ColumnId, ApiError> {
    let invalid = |message: String| ApiError::Validation {
        field: field.to_string(),
        message,
    };
    match body.get(field) {
        None | Some(Value::Null) => Err(invalid(format!("The {} field is required.", field.replace('_', " ")))),
        Some(raw) => serde_json::from_value::<ColumnId>(raw.clone())
            .map_err(|_| invalid(format!("The {} field must be an id.", field.replace('_', " ")))),
    }
}

async fn update_status<T: Stored>(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
    headers: HeaderMap,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<Value>, ApiError> {
    let config = T::config();
    if !state.permissions.can(config.edit_capability) {
        return Err(ApiError::Forbidden(config.edit_capability));
    }
    if state.fail_updates {
        tracing::warn!(entity = config.entity, id, "rejecting update, failures switched on");
        return Err(ApiError::UpdatesDisabled);
    }

    let status_id = requested_status(&body, config.status_field)?;
    let record = {
        let mut store = state.store.write().await;
        T::table_mut(&mut store)
            .set_status(id, &status_id)
            .map_err(|e| match e {
                StoreError::UnknownRecord(id) => ApiError::NotFound {
                    label: config.label,
                    id,
                },
                StoreError::UnknownStatus(_) => ApiError::Validation {
                    field: config.status_field.to_string(),
                    message: "The selected status is invalid.".to_string(),
                },
            })?
    };

    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    tracing::info!(entity = config.entity, id, status = %status_id, request_id = ?request_id, "status updated");

    // No subscribers is fine.
    let _ = state.events.send(BoardChanged {
        entity: config.entity.to_string(),
        item_id: id,
        status_id,
        project_id: record.project_id(),
        request_id,
    });

    let mut response = Map::new();
    response.insert(
        "message".to_string(),
        Value::String(format!("{} status updated.", config.label)),
    );
    let record = serde_json::to_value(&record).unwrap_or(Value::Null);
    response.insert(config.response_key.to_string(), record);
    Ok(Json(Value::Object(response)))
}

async fn sse_handler(State(state): State<AppState>) -> impl IntoResponse {
    tracing::debug!("SSE connection established");

    let mut receiver = state.events.subscribe();

    let stream = async_stream::stream! {
        yield Ok::<Event, Infallible>(Event::default().event("heartbeat").data("connected"));

        loop {
            match receiver.recv().await {
                Ok(change) => match Event::default().event(BoardChanged::EVENT).json_data(&change) {
                    Ok(event) => {
                        yield Ok(event);
                    }
                    Err(e) => tracing::warn!("unserializable change event: {e}"),
                },
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::debug!("SSE event channel closed");
                    break;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "SSE client lagging");
                    continue;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    fn config(permissions: &[&str], fail_updates: bool) -> ServerConfig {
        ServerConfig {
            addr: ServerConfig::DEFAULT_ADDR.parse().unwrap(),
            dist: PathBuf::from("dist"),
            permissions: Permissions::new(permissions.iter().copied()),
            fail_updates,
        }
    }

    fn app(state: &AppState) -> Router {
        build_router(state.clone(), FsPath::new("dist"))
    }

    async fn body_json(body: Body) -> Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn put_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("PUT")
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-request-id", "req-1")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_check() {
        let state = AppState::new(Store::demo(), &config(&[], false));
        let response = app(&state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn lead_board_snapshot() {
        let state = AppState::new(Store::demo(), &config(&["edit-leads"], false));
        let response = app(&state)
            .oneshot(Request::builder().uri("/api/leads/board").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let snapshot: BoardSnapshot<Lead> = serde_json::from_value(body_json(response.into_body()).await).unwrap();
        assert_eq!(snapshot.statuses.len(), 4);
        assert_eq!(snapshot.initial_data[&ColumnId::from(1)].items.len(), 2);
        assert!(snapshot.permissions.can("edit-leads"));
    }

    #[tokio::test]
    async fn project_board_is_scoped() {
        let state = AppState::new(Store::demo(), &config(&[], false));
        let response = app(&state)
            .oneshot(
                Request::builder()
                    .uri("/api/project-tasks/board?project=2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let snapshot: BoardSnapshot<ProjectTask> =
            serde_json::from_value(body_json(response.into_body()).await).unwrap();
        let ids: Vec<ItemId> = snapshot
            .initial_data
            .values()
            .flat_map(|column| column.items.iter().map(|task| task.id))
            .collect();
        assert_eq!(ids, vec![4]);
    }

    #[tokio::test]
    async fn update_returns_record_and_broadcasts() {
        let state = AppState::new(Store::demo(), &config(&["edit-leads"], false));
        let mut changes = state.subscribe();

        let response = app(&state)
            .oneshot(put_json("/leads/2/status", serde_json::json!({ "lead_status_id": "3" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response.into_body()).await;
        assert_eq!(body["message"], "Lead status updated.");
        assert_eq!(body["lead"]["lead_status"]["name"], "Qualified");

        let change = changes.try_recv().unwrap();
        assert_eq!(change.entity, "leads");
        assert_eq!(change.item_id, 2);
        assert_eq!(change.status_id, ColumnId::from(3));
        assert_eq!(change.request_id.as_deref(), Some("req-1"));
    }

    #[tokio::test]
    async fn opportunity_stage_uses_its_own_field() {
        let state = AppState::new(Store::demo(), &config(&["edit-opportunities"], false));
        let response = app(&state)
            .oneshot(put_json("/opportunities/1/stage", serde_json::json!({ "opportunity_stage_id": 4 })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response.into_body()).await;
        assert_eq!(body["opportunity"]["stage"]["name"], "Won");
    }

    #[tokio::test]
    async fn unknown_status_is_a_field_error() {
        let state = AppState::new(Store::demo(), &config(&["edit-leads"], false));
        let response = app(&state)
            .oneshot(put_json("/leads/1/status", serde_json::json!({ "lead_status_id": 42 })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response.into_body()).await;
        assert_eq!(body["errors"]["lead_status_id"][0], "The selected status is invalid.");

        let response = app(&state)
            .oneshot(put_json("/leads/1/status", serde_json::json!({ "status_id": 2 })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn unknown_record_is_not_found() {
        let state = AppState::new(Store::demo(), &config(&["edit-items"], false));
        let response = app(&state)
            .oneshot(put_json("/items/77/status", serde_json::json!({ "status_id": 1 })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_capability_is_forbidden() {
        let state = AppState::new(Store::demo(), &config(&["edit-leads"], false));
        let mut changes = state.subscribe();
        let response = app(&state)
            .oneshot(put_json("/project-tasks/1/status", serde_json::json!({ "task_status_id": 2 })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(changes.try_recv().is_err());
    }

    #[tokio::test]
    async fn failure_switch_rejects_updates() {
        let state = AppState::new(Store::demo(), &config(&["edit-leads"], true));
        let response = app(&state)
            .oneshot(put_json("/leads/1/status", serde_json::json!({ "lead_status_id": 2 })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response.into_body()).await;
        assert!(body.get("message").is_none());
    }
}
