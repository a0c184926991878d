//! HTTP surface of the console API.
//!
//! Routes:
//!   GET    /attribute                  grouped attribute view
//!   POST   /attribute/:id/:name        update one attribute value
//!   GET    /template                   list templates
//!   GET    /template/:id               fetch one template
//!   PUT    /template/:id               create or replace a template
//!   DELETE /template/:id               remove a template
//!   POST   /template/:id/copy          duplicate a template
//!   GET    /status                     liveness

mod attributes;
mod status;
mod templates;

use crate::config::IndexConfig;
use crate::store::DocumentStore;
use crate::templates::TemplateService;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared, read-only handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub indices: Arc<IndexConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, indices: IndexConfig) -> Self {
        Self {
            store,
            indices: Arc::new(indices),
        }
    }

    fn templates(&self) -> TemplateService {
        TemplateService::new(self.store.clone(), self.indices.templates.clone())
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/attribute", get(attributes::list_attributes))
        .route("/attribute/:id/:name", post(attributes::update_attribute))
        .route("/template", get(templates::list_templates))
        .route(
            "/template/:id",
            get(templates::get_template)
                .put(templates::save_template)
                .delete(templates::delete_template),
        )
        .route("/template/:id/copy", post(templates::copy_template))
        .route("/status", get(status::status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::store::MemoryStore;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    pub fn router(store: Arc<MemoryStore>) -> Router {
        router_with_store(store)
    }

    pub fn router_with_store(store: Arc<dyn DocumentStore>) -> Router {
        build_router(AppState::new(store, IndexConfig::default()))
    }

    pub async fn send(
        router: &Router,
        method: Method,
        uri: &str,
        body: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        let request = builder
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}
