//! Point updates of a single attribute value.

use crate::config::IndexConfig;
use crate::error::{ApiError, StoreError};
use crate::models::{CheckRef, Fields};
use crate::store::DocumentStore;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Set `name` to `value` in the attribute document of `check_id`.
///
/// Candidate indices are the group's attribute indices in name order; the
/// first document that already has the attribute is updated and the scan
/// stops there. Nothing is created if no document has it.
pub async fn update_attribute(
    store: &dyn DocumentStore,
    indices: &IndexConfig,
    check_id: &str,
    name: &str,
    value: &str,
) -> Result<(), ApiError> {
    let check = CheckRef::parse(check_id, &indices.group_delimiter);

    let candidates = store
        .list_indices(&indices.group_attribute_pattern(&check.group))
        .await?;

    if candidates.is_empty() {
        return Err(ApiError::NotFound(format!(
            "Attributes for group \"{}\" either don't exist or you do not have access to them",
            check.group
        )));
    }

    let mut last_error: Option<StoreError> = None;

    for index in &candidates {
        let doc = match store.get_document(index, check_id).await {
            Ok(doc) => doc,
            Err(e) if e.is_not_found() => {
                debug!("No document {} in {}", check_id, index);
                continue;
            }
            Err(e) => {
                warn!("Failed to read {} from {}: {}", check_id, index, e);
                last_error = Some(e);
                continue;
            }
        };

        if doc.contains_key(name) {
            let mut update = Fields::new();
            update.insert(name.to_string(), Value::String(value.to_string()));
            match store.update_document(index, check_id, update).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {
                    warn!("{} vanished from {} before the update", check_id, index);
                    return Err(attribute_not_found(check_id, name));
                }
                Err(e) => return Err(e.into()),
            }

            info!("Updated attribute {} of {} in {}", name, check_id, index);
            return Ok(());
        }
    }

    // A failed read may have hidden the attribute, so don't claim it is missing
    if let Some(e) = last_error {
        return Err(e.into());
    }

    Err(attribute_not_found(check_id, name))
}

fn attribute_not_found(check_id: &str, name: &str) -> ApiError {
    ApiError::NotFound(format!(
        "Attribute \"{}\" for check ID \"{}\" either doesn't exist or you do not have access to it",
        name, check_id
    ))
}
