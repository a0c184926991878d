//! Attribute aggregation across attribute indices.
//!
//! Every attribute index is read in full, documents are grouped by the group
//! encoded in their id, and each check is labelled with the display name
//! from its descriptor in the checks index.

use crate::config::IndexConfig;
use crate::error::ApiError;
use crate::models::{CheckAttributes, CheckRef, GroupedAttributeView};
use crate::store::DocumentStore;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Build the grouped attribute view from every attribute index.
///
/// Indices are visited in name order and documents in search order; when
/// two documents of the same check set the same attribute, the later one
/// wins. Checks without a usable descriptor are left out of the view.
pub async fn aggregate(
    store: &dyn DocumentStore,
    indices: &IndexConfig,
) -> Result<GroupedAttributeView, ApiError> {
    let attribute_indices = store.list_indices(&indices.attribute_pattern()).await?;
    debug!("Found {} attribute indices", attribute_indices.len());

    let mut view = GroupedAttributeView::new();
    let mut skipped: HashSet<String> = HashSet::new();

    for index in &attribute_indices {
        let count = store.count(index).await?;
        if count == 0 {
            continue;
        }

        let documents = store.search(index, count).await?;
        debug!("Read {} documents from {}", documents.len(), index);

        for doc in documents {
            let check = CheckRef::parse(&doc.id, &indices.group_delimiter);
            if skipped.contains(&check.id) {
                continue;
            }

            let known = view
                .get(&check.group)
                .is_some_and(|checks| checks.contains_key(&check.id));

            if !known {
                match check_name(store, &indices.checks, &check).await? {
                    Some(name) => {
                        view.entry(check.group.clone())
                            .or_default()
                            .insert(check.id.clone(), CheckAttributes::named(name));
                    }
                    None => {
                        skipped.insert(check.id.clone());
                        continue;
                    }
                }
            }

            if let Some(entry) = view
                .get_mut(&check.group)
                .and_then(|checks| checks.get_mut(&check.id))
            {
                entry.merge_fields(&doc.fields);
            }
        }
    }

    if !skipped.is_empty() {
        warn!(
            "Skipped {} checks without a usable descriptor in {}",
            skipped.len(),
            indices.checks
        );
    }

    Ok(view)
}

/// Look up a check's display name. `None` means the check should be skipped.
async fn check_name(
    store: &dyn DocumentStore,
    checks_index: &str,
    check: &CheckRef,
) -> Result<Option<String>, ApiError> {
    match store.get_document(checks_index, &check.key).await {
        Ok(fields) => match fields.get("name").and_then(|v| v.as_str()) {
            Some(name) => Ok(Some(name.to_string())),
            None => {
                warn!("Descriptor for check {} has no name, skipping", check);
                Ok(None)
            }
        },
        Err(e) if e.is_not_found() => {
            warn!(
                "No descriptor '{}' in {} for check {}, skipping",
                check.key, checks_index, check
            );
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::models::Fields;
    use crate::store::failing::{shard_failure, unreachable, FailOn, FailingStore};
    use crate::store::MemoryStore;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    fn seeded_store() -> MemoryStore {
        MemoryStore::new()
            .with_document("attrib_x_team1", "team1-check1", fields(json!({"a": "1"})))
            .with_document("attrib_y_team1", "team1-check1", fields(json!({"b": "2"})))
            .with_document("checks", "check1", fields(json!({"name": "Check One"})))
    }

    #[tokio::test]
    async fn test_empty_store_gives_empty_view() {
        let store = MemoryStore::new();
        let view = aggregate(&store, &IndexConfig::default()).await.unwrap();
        assert!(view.is_empty());
    }

    #[tokio::test]
    async fn test_merges_documents_split_across_indices() {
        let store = seeded_store();
        let view = aggregate(&store, &IndexConfig::default()).await.unwrap();

        assert_eq!(view.len(), 1);
        let check = &view["team1"]["team1-check1"];
        assert_eq!(check.name, "Check One");
        assert_eq!(check.attributes.len(), 2);
        assert_eq!(check.attributes["a"], "1");
        assert_eq!(check.attributes["b"], "2");
    }

    #[tokio::test]
    async fn test_later_index_wins_on_collision() {
        let store = MemoryStore::new()
            .with_document("attrib_b_team1", "team1-web", fields(json!({"port": "443"})))
            .with_document("attrib_a_team1", "team1-web", fields(json!({"port": "80"})))
            .with_document("checks", "web", fields(json!({"name": "Web"})));

        let view = aggregate(&store, &IndexConfig::default()).await.unwrap();
        // attrib_b_team1 sorts after attrib_a_team1
        assert_eq!(view["team1"]["team1-web"].attributes["port"], "443");
    }

    #[tokio::test]
    async fn test_missing_descriptor_skips_only_that_check() {
        let store = seeded_store()
            .with_document("attrib_x_team2", "team2-ghost", fields(json!({"c": "3"})))
            .with_document("attrib_x_team2", "team2-check1", fields(json!({"d": "4"})));

        let view = aggregate(&store, &IndexConfig::default()).await.unwrap();

        assert!(view["team1"].contains_key("team1-check1"));
        assert!(!view["team2"].contains_key("team2-ghost"));
        assert_eq!(view["team2"]["team2-check1"].attributes["d"], "4");
    }

    #[tokio::test]
    async fn test_group_with_only_missing_descriptors_is_absent() {
        let store = MemoryStore::new()
            .with_document("attrib_x_team3", "team3-ghost", fields(json!({"c": "3"})))
            .with_index("checks");

        let view = aggregate(&store, &IndexConfig::default()).await.unwrap();
        assert!(!view.contains_key("team3"));
    }

    #[tokio::test]
    async fn test_descriptor_without_name_is_skipped() {
        let store = MemoryStore::new()
            .with_document("attrib_x_team1", "team1-dns", fields(json!({"fqdn": "a.b"})))
            .with_document("checks", "dns", fields(json!({"kind": "dns"})));

        let view = aggregate(&store, &IndexConfig::default()).await.unwrap();
        assert!(view.is_empty());
    }

    #[tokio::test]
    async fn test_non_attribute_indices_ignored() {
        let store = seeded_store().with_document("other", "team1-check1", fields(json!({"z": "9"})));

        let view = aggregate(&store, &IndexConfig::default()).await.unwrap();
        assert!(!view["team1"]["team1-check1"].attributes.contains_key("z"));
    }

    #[tokio::test]
    async fn test_store_failures_abort_aggregation() {
        for fail_on in [FailOn::ListIndices, FailOn::Count, FailOn::Search, FailOn::GetDocument] {
            let store = FailingStore::new(seeded_store(), fail_on, shard_failure);
            let err = aggregate(&store, &IndexConfig::default()).await.unwrap_err();

            assert!(
                matches!(err, ApiError::Store(StoreError::Api { status: 500, .. })),
                "{:?} gave {:?}",
                fail_on,
                err
            );
        }
    }

    #[tokio::test]
    async fn test_unreachable_descriptor_store_is_not_skipped() {
        let store = FailingStore::new(seeded_store(), FailOn::GetDocument, unreachable);
        let err = aggregate(&store, &IndexConfig::default()).await.unwrap_err();

        assert!(matches!(err, ApiError::Store(StoreError::Unavailable(_))));
    }
}
