//! Template routes.

use super::AppState;
use crate::error::ApiError;
use crate::templates::Template;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

pub async fn list_templates(
    State(state): State<AppState>,
) -> Result<Json<Vec<Template>>, ApiError> {
    Ok(Json(state.templates().list().await?))
}

pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Template>, ApiError> {
    Ok(Json(state.templates().get(&id).await?))
}

pub async fn save_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Template>, JsonRejection>,
) -> Result<Json<Template>, ApiError> {
    let Json(template) =
        body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    Ok(Json(state.templates().save(&id, template).await?))
}

pub async fn copy_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Template>), ApiError> {
    let copy = state.templates().copy(&id).await?;
    Ok((StatusCode::CREATED, Json(copy)))
}

pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.templates().remove(&id).await?;

    Ok(Json(json!({
        "statusCode": 200,
        "message": "Template deleted",
    })))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{router, send};
    use crate::store::MemoryStore;
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use std::sync::Arc;

    const PING: &str = r#"{
        "title": "Ping gateway",
        "description": "ICMP reachability",
        "protocol": "icmp",
        "definition": { "host": "10.0.0.1", "count": 3 }
    }"#;

    #[tokio::test]
    async fn test_list_without_templates_is_empty() {
        let app = router(Arc::new(MemoryStore::new()));
        let (status, body) = send(&app, Method::GET, "/template", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_template_lifecycle() {
        let app = router(Arc::new(MemoryStore::new()));

        let (status, saved) = send(&app, Method::PUT, "/template/ping", Some(PING)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["id"], "ping");
        assert_eq!(saved["protocol"], "icmp");
        assert_eq!(saved["definition"]["count"], 3);

        let (status, fetched) = send(&app, Method::GET, "/template/ping", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, saved);

        let (status, copy) = send(&app, Method::POST, "/template/ping/copy", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_ne!(copy["id"], "ping");
        assert_eq!(copy["title"], "Ping gateway");

        let (_, list) = send(&app, Method::GET, "/template", None).await;
        assert_eq!(list.as_array().unwrap().len(), 2);

        let (status, body) = send(&app, Method::DELETE, "/template/ping", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Template deleted");

        let (status, _) = send(&app, Method::GET, "/template/ping", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, list) = send(&app, Method::GET, "/template", None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["id"], copy["id"]);
    }

    #[tokio::test]
    async fn test_path_id_overrides_body_id() {
        let app = router(Arc::new(MemoryStore::new()));
        let body = r#"{"id": "other", "title": "T", "protocol": "icmp", "definition": {"host": "h"}}"#;

        let (status, saved) = send(&app, Method::PUT, "/template/mine", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["id"], "mine");

        let (status, _) = send(&app, Method::GET, "/template/other", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_template_is_bad_request() {
        let app = router(Arc::new(MemoryStore::new()));
        let bodies = [
            r#"{"title": "T", "protocol": "gopher", "definition": {}}"#,
            r#"{"title": "T", "protocol": "icmp", "definition": {"host": "h", "ttl": 3}}"#,
            r#"{"title": "T", "protocol": "http", "definition": {"requests": []}}"#,
            r#"{"title": "T", "protocol": "icmp", "definition": {"host": "h"}, "bogus": 1}"#,
        ];

        for body in bodies {
            let (status, response) = send(&app, Method::PUT, "/template/t", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body {}", body);
            assert_eq!(response["statusCode"], 400);
        }

        let (_, list) = send(&app, Method::GET, "/template", None).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn test_missing_template_routes_are_not_found() {
        let app = router(Arc::new(MemoryStore::new()));

        let (status, _) = send(&app, Method::POST, "/template/nope/copy", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&app, Method::DELETE, "/template/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not Found");
    }
}
