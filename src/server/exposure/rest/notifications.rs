//! Notification feed actions: mark one or all as read

use super::handlers::{ApiResponse, RecordState, parse_id};
use crate::core::Record;
use crate::core::error::CrmError;
use crate::entities::Notification;
use axum::extract::{Path, State};
use axum::routing::patch;
use axum::{Json, Router};
use serde_json::{Value, json};

pub async fn mark_read(
    State(state): State<RecordState<Notification>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Value>>, CrmError> {
    let id = parse_id(&id)?;
    let read = state.load(id).await?.merge(json!({ "isRead": true }))?;
    let doc = state.save(id, read).await?;
    Ok(Json(ApiResponse::ok("notification marked as read", doc)))
}

pub async fn mark_all_read(
    State(state): State<RecordState<Notification>>,
) -> Result<Json<ApiResponse<Value>>, CrmError> {
    let unread: Vec<Notification> = state
        .store
        .list()
        .await?
        .into_iter()
        .filter(|n| !n.is_read)
        .collect();

    let mut updated = 0;
    for notification in unread {
        let read = notification.merge(json!({ "isRead": true }))?;
        state.save(notification.id, read).await?;
        updated += 1;
    }

    tracing::debug!(updated, "notifications marked as read");
    Ok(Json(ApiResponse::ok(
        "all notifications marked as read",
        json!({ "updated": updated }),
    )))
}

pub fn routes(state: RecordState<Notification>) -> Router {
    Router::new()
        .route("/api/v1/notifications/read-all", patch(mark_all_read))
        .route("/api/v1/notifications/{id}/read", patch(mark_read))
        .with_state(state)
}
