//! Attribute routes.

use super::AppState;
use crate::attributes;
use crate::error::ApiError;
use crate::models::GroupedAttributeView;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

/// Body of `POST /attribute/:id/:name`.
#[derive(Debug, Deserialize)]
pub struct UpdateAttributeRequest {
    pub value: String,
}

pub async fn list_attributes(
    State(state): State<AppState>,
) -> Result<Json<GroupedAttributeView>, ApiError> {
    let view = attributes::aggregate(state.store.as_ref(), &state.indices).await?;
    Ok(Json(view))
}

pub async fn update_attribute(
    State(state): State<AppState>,
    Path((id, name)): Path<(String, String)>,
    body: Result<Json<UpdateAttributeRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        debug!("Rejected update body for {}/{}: {}", id, name, rejection);
        ApiError::BadRequest("Request body must contain the \"value\" attribute".to_string())
    })?;

    attributes::update_attribute(
        state.store.as_ref(),
        &state.indices,
        &id,
        &name,
        &request.value,
    )
    .await?;

    Ok(Json(json!({
        "statusCode": 200,
        "message": "Attribute updated",
    })))
}
