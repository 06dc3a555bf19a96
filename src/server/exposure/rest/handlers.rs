//! Generic CRUD handlers shared by every collection

use crate::core::error::{CrmError, ValidationError};
use crate::core::events::{CrmEvent, EntityEvent, EventBus};
use crate::core::query::{PaginatedResponse, QueryParams};
use crate::core::{DataService, Entity, Record};
use crate::server::entity_registry::EntityDescriptor;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use uuid::Uuid;

/// Success envelope: `{ success, message, data }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

/// Store and event bus of one collection
pub struct RecordState<T: Record> {
    pub store: Arc<dyn DataService<T>>,
    pub event_bus: EventBus,
}

impl<T: Record> Clone for RecordState<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            event_bus: self.event_bus.clone(),
        }
    }
}

impl<T: Record> RecordState<T> {
    pub(crate) async fn load(&self, id: Uuid) -> Result<T, CrmError> {
        self.store
            .get(&id)
            .await?
            .ok_or_else(|| CrmError::not_found(T::resource_name_singular(), id))
    }

    /// Persist a merged record and announce the change.
    pub(crate) async fn save(&self, id: Uuid, record: T) -> Result<Value, CrmError> {
        let updated = self.store.update(&id, record).await?;
        let doc = updated.to_document()?;
        self.event_bus.publish(CrmEvent::Entity(EntityEvent::Updated {
            entity_type: T::resource_name_singular().to_string(),
            entity_id: id,
            data: doc.clone(),
        }));
        Ok(doc)
    }

    pub(crate) async fn documents(&self) -> Result<Vec<Value>, CrmError> {
        self.store
            .list()
            .await?
            .iter()
            .map(T::to_document)
            .collect()
    }
}

/// Parse a path id, answering 400 for anything that is not a UUID.
pub fn parse_id(raw: &str) -> Result<Uuid, CrmError> {
    Uuid::parse_str(raw.trim()).map_err(|_| {
        CrmError::Validation(ValidationError::InvalidId {
            value: raw.to_string(),
        })
    })
}

/// Unwrap a JSON body, turning extractor rejections into the error envelope.
pub fn payload(body: Result<Json<Value>, JsonRejection>) -> Result<Value, CrmError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        CrmError::Validation(ValidationError::InvalidPayload {
            message: rejection.body_text(),
        })
    })
}

pub async fn list_records<T: Record>(
    State(state): State<RecordState<T>>,
    Query(params): Query<QueryParams>,
) -> Result<Json<PaginatedResponse<Value>>, CrmError> {
    let docs = state.documents().await?;
    tracing::debug!(collection = T::resource_name(), total = docs.len(), "listing records");
    Ok(Json(
        params
            .apply(docs)
            .with_message(format!("{} fetched successfully", T::label())),
    ))
}

pub async fn create_record<T: Record>(
    State(state): State<RecordState<T>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Value>>), CrmError> {
    let record = T::from_payload(payload(body)?)?;
    let created = state.store.create(record).await?;
    let doc = created.to_document()?;

    tracing::debug!(
        entity_type = T::resource_name_singular(),
        id = %created.id(),
        "record created"
    );
    state.event_bus.publish(CrmEvent::Entity(EntityEvent::Created {
        entity_type: T::resource_name_singular().to_string(),
        entity_id: created.id(),
        data: doc.clone(),
    }));

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            format!("{} created successfully", T::resource_name_singular()),
            doc,
        )),
    ))
}

pub async fn get_record<T: Record>(
    State(state): State<RecordState<T>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Value>>, CrmError> {
    let record = state.load(parse_id(&id)?).await?;
    Ok(Json(ApiResponse::ok(
        format!("{} fetched successfully", T::resource_name_singular()),
        record.to_document()?,
    )))
}

/// Partial update: keys absent from the body keep their stored value.
pub async fn update_record<T: Record>(
    State(state): State<RecordState<T>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiResponse<Value>>, CrmError> {
    let id = parse_id(&id)?;
    let patch = payload(body)?;
    let merged = state.load(id).await?.merge(patch)?;
    let doc = state.save(id, merged).await?;
    Ok(Json(ApiResponse::ok(
        format!("{} updated successfully", T::resource_name_singular()),
        doc,
    )))
}

pub async fn delete_record<T: Record>(
    State(state): State<RecordState<T>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Value>>, CrmError> {
    let id = parse_id(&id)?;
    if !state.store.delete(&id).await? {
        return Err(CrmError::not_found(T::resource_name_singular(), id));
    }

    tracing::debug!(entity_type = T::resource_name_singular(), id = %id, "record deleted");
    state.event_bus.publish(CrmEvent::Entity(EntityEvent::Deleted {
        entity_type: T::resource_name_singular().to_string(),
        entity_id: id,
    }));

    Ok(Json(ApiResponse::ok(
        format!("{} deleted successfully", T::resource_name_singular()),
        json!({ "id": id }),
    )))
}

/// `PATCH .../{id}/status` with `{"status": ...}`
pub async fn update_record_status<T: Record>(
    State(state): State<RecordState<T>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiResponse<Value>>, CrmError> {
    let id = parse_id(&id)?;
    let status = payload(body)?
        .get("status")
        .cloned()
        .ok_or_else(|| CrmError::invalid("status", "status is required"))?;

    let current = state.load(id).await?;
    if current.to_document()?.get("status").is_none() {
        return Err(CrmError::invalid(
            "status",
            format!("{} has no status", T::resource_name_singular()),
        ));
    }

    let merged = current.merge(json!({ "status": status }))?;
    let doc = state.save(id, merged).await?;
    Ok(Json(ApiResponse::ok(
        format!("{} status updated successfully", T::resource_name_singular()),
        doc,
    )))
}

/// CRUD routes of one collection under `/api/v1/{plural}`
pub struct RecordDescriptor<T: Record> {
    state: RecordState<T>,
}

impl<T: Record> RecordDescriptor<T> {
    pub fn new(store: Arc<dyn DataService<T>>, event_bus: EventBus) -> Self {
        Self {
            state: RecordState { store, event_bus },
        }
    }
}

impl<T: Record> EntityDescriptor for RecordDescriptor<T> {
    fn entity_type(&self) -> &str {
        T::resource_name_singular()
    }

    fn plural(&self) -> &str {
        T::resource_name()
    }

    fn build_routes(&self) -> Router {
        let base = format!("/api/v1/{}", T::resource_name());
        Router::new()
            .route(&base, get(list_records::<T>).post(create_record::<T>))
            .route(
                &format!("{}/{{id}}", base),
                get(get_record::<T>)
                    .put(update_record::<T>)
                    .patch(update_record::<T>)
                    .delete(delete_record::<T>),
            )
            .route(
                &format!("{}/{{id}}/status", base),
                patch(update_record_status::<T>),
            )
            .with_state(self.state.clone())
    }
}
