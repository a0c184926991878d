//! Template persistence.
//!
//! Loads the template list from the templates index, applies an action
//! through [`reduce`], then runs the resulting effects against the store.

use super::model::Template;
use super::state::{reduce, Effect, TemplateAction};
use crate::error::{ApiError, StoreError};
use crate::models::Fields;
use crate::store::DocumentStore;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Template operations against one templates index.
#[derive(Clone)]
pub struct TemplateService {
    store: Arc<dyn DocumentStore>,
    index: String,
}

impl TemplateService {
    pub fn new(store: Arc<dyn DocumentStore>, index: impl Into<String>) -> Self {
        Self {
            store,
            index: index.into(),
        }
    }

    /// All stored templates, sorted by title then id.
    pub async fn list(&self) -> Result<Vec<Template>, ApiError> {
        let mut templates = self.load().await?;
        templates.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        Ok(templates)
    }

    pub async fn get(&self, id: &str) -> Result<Template, ApiError> {
        self.load()
            .await?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| template_not_found(id))
    }

    /// Create or replace the template stored under `id`.
    pub async fn save(&self, id: &str, mut template: Template) -> Result<Template, ApiError> {
        template.id = id.to_string();
        template.validate().map_err(ApiError::BadRequest)?;

        let state = self.load().await?;
        self.apply(&state, TemplateAction::Save(template.clone()))
            .await?;

        info!("Saved template {} ({})", template.id, template.protocol());
        Ok(template)
    }

    /// Duplicate the template stored under `id` with a fresh id.
    pub async fn copy(&self, id: &str) -> Result<Template, ApiError> {
        let state = self.load().await?;
        let source = state
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| template_not_found(id))?;

        let new_id = Uuid::new_v4().to_string();
        let templates = self
            .apply(
                &state,
                TemplateAction::Copy {
                    source,
                    new_id: new_id.clone(),
                },
            )
            .await?;

        info!("Copied template {} to {}", id, new_id);
        templates
            .into_iter()
            .find(|t| t.id == new_id)
            .ok_or_else(|| template_not_found(&new_id))
    }

    pub async fn remove(&self, id: &str) -> Result<(), ApiError> {
        let state = self.load().await?;
        let target = state
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| template_not_found(id))?;

        self.apply(&state, TemplateAction::Remove(target)).await?;
        info!("Removed template {}", id);
        Ok(())
    }

    /// Reduce, persist the effects, and return the new list.
    async fn apply(
        &self,
        state: &[Template],
        action: TemplateAction,
    ) -> Result<Vec<Template>, ApiError> {
        let transition = reduce(state, action);

        for effect in transition.effects {
            match effect {
                Effect::Put(template) => {
                    let fields = to_fields(&template)?;
                    self.store
                        .index_document(&self.index, &template.id, fields)
                        .await?;
                }
                Effect::Delete(id) => {
                    self.store.delete_document(&self.index, &id).await?;
                }
            }
        }

        Ok(transition.templates)
    }

    async fn load(&self) -> Result<Vec<Template>, ApiError> {
        let count = match self.store.count(&self.index).await {
            Ok(count) => count,
            Err(e) if e.is_not_found() => {
                debug!("Templates index {} does not exist yet", self.index);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        if count == 0 {
            return Ok(Vec::new());
        }

        let documents = self.store.search(&self.index, count).await?;
        let mut templates = Vec::with_capacity(documents.len());

        for doc in documents {
            let mut fields = doc.fields;
            fields.insert("id".to_string(), Value::String(doc.id.clone()));

            match serde_json::from_value::<Template>(Value::Object(fields)) {
                Ok(template) => templates.push(template),
                Err(e) => warn!("Ignoring malformed template {}: {}", doc.id, e),
            }
        }

        Ok(templates)
    }
}

fn to_fields(template: &Template) -> Result<Fields, ApiError> {
    match serde_json::to_value(template) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(StoreError::Decode("template did not serialize to an object".to_string()).into()),
        Err(e) => Err(StoreError::Decode(e.to_string()).into()),
    }
}

fn template_not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("Template \"{}\" does not exist", id))
}
