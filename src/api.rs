//! HTTP surface: health, catalog event ingest and the integration log trail.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::IntegrationLog;
use crate::domain::events::CatalogEvent;
use crate::domain::value_objects::{EntityKind, LogStatus};
use crate::store::{CatalogStore, LogFilter};
use crate::sync::{Dispatch, DispatchGate};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CatalogStore>,
    pub gate: Arc<DispatchGate>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "catalog-sync"})) }))
        .route("/api/v1/catalog/events", post(ingest_event))
        .route("/api/v1/tenants/:tenant_id/integration-logs", get(list_logs))
        .with_state(state)
}

/// Always 202: the write that raised the event has already happened.
async fn ingest_event(State(s): State<AppState>, Json(event): Json<CatalogEvent>) -> impl IntoResponse {
    let dispatch = s.gate.dispatch(&event).await;
    let job = match &dispatch {
        Dispatch::Enqueued(job) | Dispatch::Dropped(job) => Some(job.clone()),
        Dispatch::Skipped => None,
    };
    (StatusCode::ACCEPTED, Json(serde_json::json!({ "decision": dispatch.as_str(), "job": job })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct LogParams {
    pub loggable_type: Option<String>,
    pub loggable_id: Option<Uuid>,
    pub status: Option<String>,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct LogPage {
    pub data: Vec<IntegrationLog>,
    pub page: u32,
    pub per_page: u32,
}

async fn list_logs(
    State(s): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    Query(p): Query<LogParams>,
) -> Result<Json<LogPage>, (StatusCode, String)> {
    p.validate().map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let loggable_type = p.loggable_type.as_deref().map(str::parse::<EntityKind>).transpose().map_err(bad_request)?;
    let status = p.status.as_deref().map(str::parse::<LogStatus>).transpose().map_err(bad_request)?;
    let page = p.page.unwrap_or(1);
    let per_page = p.per_page.unwrap_or(20);

    let filter = LogFilter {
        loggable_type,
        loggable_id: p.loggable_id,
        status,
        limit: i64::from(per_page),
        offset: i64::from(page - 1) * i64::from(per_page),
    };
    let data = s.store.query_logs(tenant_id, &filter).await.map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(LogPage { data, page, per_page }))
}

fn bad_request(e: impl std::fmt::Display) -> (StatusCode, String) { (StatusCode::BAD_REQUEST, e.to_string()) }

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::domain::aggregates::{Integration, IntegrationSettings};
    use crate::domain::value_objects::{EntityRef, PlatformType};
    use crate::store::MemoryStore;
    use crate::sync::testing::RecordingQueue;
    use crate::sync::{SyncJob, SyncSettings};

    fn app(store: Arc<MemoryStore>, queue: Arc<RecordingQueue>) -> Router {
        router(AppState { store, gate: Arc::new(DispatchGate::new(queue, SyncSettings::default())) })
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_event(body: serde_json::Value) -> Request<Body> {
        Request::post("/api/v1/catalog/events")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(Arc::new(MemoryStore::new()), Arc::new(RecordingQueue::default()));
        let response = app.oneshot(Request::get("/health").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ingest_enqueues_watched_update() {
        let queue = Arc::new(RecordingQueue::default());
        let app = app(Arc::new(MemoryStore::new()), queue.clone());
        let (tenant_id, base_id) = (Uuid::now_v7(), Uuid::now_v7());

        let response = app
            .oneshot(post_event(serde_json::json!({
                "entity": "base",
                "event": "updated",
                "tenant_id": tenant_id,
                "base_id": base_id,
                "changed": ["retail_price", "notes_nobody_watches"],
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = json(response).await;
        assert_eq!(body["decision"], "enqueued");
        assert_eq!(body["job"]["job"], "base_updated");
        assert_eq!(queue.jobs(), vec![SyncJob::BaseUpdated { tenant_id, base_id }]);
    }

    #[tokio::test]
    async fn test_ingest_skips_unwatched_update() {
        let queue = Arc::new(RecordingQueue::default());
        let app = app(Arc::new(MemoryStore::new()), queue.clone());
        let response = app
            .oneshot(post_event(serde_json::json!({
                "entity": "colorway",
                "event": "updated",
                "tenant_id": Uuid::now_v7(),
                "colorway_id": Uuid::now_v7(),
                "changed": ["recipe"],
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = json(response).await;
        assert_eq!(body["decision"], "skipped");
        assert!(body["job"].is_null());
        assert!(queue.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_logs_filtered_and_paged() {
        let store = Arc::new(MemoryStore::new());
        let integration = Integration::new(Uuid::now_v7(), PlatformType::Shopify, serde_json::json!({}), IntegrationSettings::default());
        let colorway = EntityRef::Colorway(Uuid::now_v7());
        for i in 0..3 {
            store.append_log(&IntegrationLog::success(integration.id, colorway, format!("sync {i}"), serde_json::json!({}))).await.unwrap();
        }
        store.append_log(&IntegrationLog::error(integration.id, EntityRef::Base(Uuid::now_v7()), "boom", serde_json::json!({}))).await.unwrap();
        let tenant_id = integration.tenant_id;
        store.put_integration(integration).await;
        let app = app(store, Arc::new(RecordingQueue::default()));

        let uri = format!("/api/v1/tenants/{tenant_id}/integration-logs?loggable_type=colorway&status=success&per_page=2");
        let response = app.clone().oneshot(Request::get(uri).body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
        assert_eq!(body["per_page"], 2);

        let uri = format!("/api/v1/tenants/{tenant_id}/integration-logs?status=error");
        let body = json(app.oneshot(Request::get(uri).body(Body::empty()).unwrap()).await.unwrap()).await;
        assert_eq!(body["data"][0]["message"], "boom");
    }

    #[tokio::test]
    async fn test_logs_reject_bad_params() {
        let app = app(Arc::new(MemoryStore::new()), Arc::new(RecordingQueue::default()));
        let tenant_id = Uuid::now_v7();
        for query in ["per_page=500", "page=0", "loggable_type=order", "status=pending"] {
            let uri = format!("/api/v1/tenants/{tenant_id}/integration-logs?{query}");
            let response = app.clone().oneshot(Request::get(uri).body(Body::empty()).unwrap()).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{query}");
        }
    }
}
