//! One-shot migration of stored page JSON into the current document shape.
//!
//! Older documents stored components without a `variation` field; the type
//! was encoded in the component id (`hero-3-1700000000`). Migration recovers
//! the variation from such ids once, at load time, so nothing downstream ever
//! has to guess.

use serde_json::{Map, Value};

use crate::{ModelError, PageDocument, VariationRef, PLACEHOLDER_PREFIX};

/// What a migration changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Components whose variation was recovered from a legacy id.
    pub recovered: Vec<(String, VariationRef)>,
    /// Components whose variation could not be recovered.
    pub unresolved: Vec<String>,
    /// Components that had no `orderIndex` and were given their position.
    pub filled_order: usize,
    /// Components that had no id and were given a placeholder.
    pub assigned_ids: usize,
    /// Whether the legacy `trackingConfig` key was renamed.
    pub renamed_tracking: bool,
}

impl MigrationReport {
    /// Whether the input was already in the current shape.
    pub fn is_clean(&self) -> bool {
        self.recovered.is_empty()
            && self.unresolved.is_empty()
            && self.filled_order == 0
            && self.assigned_ids == 0
            && !self.renamed_tracking
    }
}

/// Recover a variation from a legacy component id.
///
/// Accepts `<type>-<n>`, `<type>_<n>` and `<type>-v<n>`, optionally followed
/// by further segments. The type must be lowercase ASCII letters, which keeps
/// UUIDs and numeric row ids from matching.
pub fn variation_from_legacy_id(id: &str) -> Option<VariationRef> {
    let mut parts = id.split(['-', '_']);
    let component_type = parts.next()?;
    if component_type.is_empty() || !component_type.chars().all(|c| c.is_ascii_lowercase()) {
        return None;
    }
    let number = parts.next()?;
    let number = number.strip_prefix('v').unwrap_or(number);
    let variation_number: u32 = number.parse().ok()?;
    if variation_number == 0 {
        return None;
    }
    Some(VariationRef::new(component_type, variation_number))
}

/// Migrate a stored page into a [`PageDocument`].
pub fn migrate_page_value(mut value: Value) -> Result<(PageDocument, MigrationReport), ModelError> {
    let mut report = MigrationReport::default();

    let page = value
        .as_object_mut()
        .ok_or_else(|| ModelError::Malformed("page is not a JSON object".to_string()))?;

    if !page.contains_key("tracking") {
        if let Some(tracking) = page.remove("trackingConfig") {
            page.insert("tracking".to_string(), tracking);
            report.renamed_tracking = true;
        }
    }

    if let Some(components) = page.get_mut("components") {
        let components = components
            .as_array_mut()
            .ok_or_else(|| ModelError::Malformed("components is not an array".to_string()))?;

        for (position, component) in components.iter_mut().enumerate() {
            let component = component.as_object_mut().ok_or_else(|| {
                ModelError::Malformed(format!("component {} is not an object", position))
            })?;
            migrate_component(component, position, &mut report);
        }
    }

    let document: PageDocument =
        serde_json::from_value(value).map_err(|e| ModelError::Malformed(e.to_string()))?;
    Ok((document, report))
}

/// Parse and migrate a stored page from JSON text.
pub fn migrate_page_str(json: &str) -> Result<(PageDocument, MigrationReport), ModelError> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| ModelError::Malformed(e.to_string()))?;
    migrate_page_value(value)
}

fn migrate_component(component: &mut Map<String, Value>, position: usize, report: &mut MigrationReport) {
    let id = match component.get("id").and_then(Value::as_str) {
        Some(id) if !id.trim().is_empty() => id.to_string(),
        _ => {
            let id = format!("{}legacy-{}", PLACEHOLDER_PREFIX, position);
            component.insert("id".to_string(), Value::String(id.clone()));
            report.assigned_ids += 1;
            id
        }
    };

    if !component.contains_key("variation") {
        let explicit = component
            .get("componentType")
            .and_then(Value::as_str)
            .map(|t| {
                let n = component
                    .get("variationNumber")
                    .and_then(Value::as_u64)
                    .unwrap_or(1) as u32;
                VariationRef::new(t, n)
            });

        let variation = match explicit {
            Some(v) => v,
            None => match variation_from_legacy_id(&id) {
                Some(v) => {
                    report.recovered.push((id.clone(), v.clone()));
                    v
                }
                None => {
                    report.unresolved.push(id.clone());
                    VariationRef::unknown()
                }
            },
        };

        component.remove("componentType");
        component.remove("variationNumber");
        // VariationRef serializes infallibly
        if let Ok(v) = serde_json::to_value(&variation) {
            component.insert("variation".to_string(), v);
        }
    }

    if !component.contains_key("orderIndex") {
        component.insert("orderIndex".to_string(), Value::from(position as i64));
        report.filled_order += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ComponentId, PageId};
    use serde_json::json;

    fn page_with(components: Value) -> Value {
        json!({
            "id": PageId::new().to_string(),
            "slug": "spring-sale",
            "components": components,
        })
    }

    // ===========================================
    // Legacy Id Tests
    // ===========================================

    #[test]
    fn legacy_id_shapes() {
        assert_eq!(
            variation_from_legacy_id("hero-3-1700000000"),
            Some(VariationRef::new("hero", 3))
        );
        assert_eq!(
            variation_from_legacy_id("pricing_2"),
            Some(VariationRef::new("pricing", 2))
        );
        assert_eq!(
            variation_from_legacy_id("faq-v1"),
            Some(VariationRef::new("faq", 1))
        );
    }

    #[test]
    fn uuid_and_numeric_ids_do_not_match() {
        assert_eq!(
            variation_from_legacy_id("550e8400-e29b-41d4-a716-446655440000"),
            None
        );
        assert_eq!(variation_from_legacy_id("42"), None);
        assert_eq!(variation_from_legacy_id("hero"), None);
        assert_eq!(variation_from_legacy_id("hero-0"), None);
    }

    // ===========================================
    // Page Migration Tests
    // ===========================================

    #[test]
    fn current_shape_is_clean() {
        let value = page_with(json!([{
            "id": "c-1",
            "variation": {"componentType": "hero", "variationNumber": 1},
            "orderIndex": 0
        }]));
        let (doc, report) = migrate_page_value(value).unwrap();
        assert!(report.is_clean());
        assert_eq!(doc.components.len(), 1);
    }

    #[test]
    fn recovers_variation_from_id() {
        let value = page_with(json!([
            {"id": "hero-2-1700000000", "content": {"headline": "Hi"}},
            {"id": "0b3f", "orderIndex": 7}
        ]));
        let (doc, report) = migrate_page_value(value).unwrap();

        assert_eq!(doc.components[0].variation, VariationRef::new("hero", 2));
        assert_eq!(doc.components[0].order_index, 0);
        assert_eq!(doc.components[1].variation, VariationRef::unknown());
        assert_eq!(doc.components[1].order_index, 7);
        assert_eq!(report.recovered.len(), 1);
        assert_eq!(report.unresolved, vec!["0b3f".to_string()]);
        assert_eq!(report.filled_order, 1);
    }

    #[test]
    fn flat_variation_fields_are_folded() {
        let value = page_with(json!([
            {"id": "c-1", "componentType": "cta", "variationNumber": 2, "orderIndex": 0}
        ]));
        let (doc, report) = migrate_page_value(value).unwrap();
        assert_eq!(doc.components[0].variation, VariationRef::new("cta", 2));
        assert!(report.recovered.is_empty());
    }

    #[test]
    fn missing_id_becomes_placeholder() {
        let value = page_with(json!([{"componentType": "faq"}]));
        let (doc, report) = migrate_page_value(value).unwrap();
        assert!(matches!(doc.components[0].id, ComponentId::Placeholder(_)));
        assert_eq!(report.assigned_ids, 1);
    }

    #[test]
    fn tracking_config_is_renamed() {
        let mut value = page_with(json!([]));
        value["trackingConfig"] = json!({"googleAnalyticsId": "G-1"});
        let (doc, report) = migrate_page_value(value).unwrap();
        assert!(report.renamed_tracking);
        assert_eq!(doc.tracking["googleAnalyticsId"], "G-1");
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert!(matches!(
            migrate_page_value(json!([1, 2])),
            Err(ModelError::Malformed(_))
        ));
        assert!(matches!(
            migrate_page_str("{not json"),
            Err(ModelError::Malformed(_))
        ));
        let value = page_with(json!("nope"));
        assert!(migrate_page_value(value).is_err());
    }
}
