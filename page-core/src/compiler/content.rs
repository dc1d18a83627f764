//! Content resolution: instance value → variation default → fallback literal.

use pagecraft_types::{ComponentInstance, ComponentVariationMetadata};
use serde_json::Value;

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

/// Render a scalar value as text. Structured values have no text form.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// The effective value of a content field, if any layer provides one.
pub fn resolve<'a>(
    component: &'a ComponentInstance,
    metadata: &'a ComponentVariationMetadata,
    key: &str,
) -> Option<&'a Value> {
    component
        .content
        .get(key)
        .filter(|v| is_present(v))
        .or_else(|| metadata.default_content.get(key).filter(|v| is_present(v)))
}

/// The effective text of a content field, or `fallback`.
pub fn resolve_text(
    component: &ComponentInstance,
    metadata: &ComponentVariationMetadata,
    key: &str,
    fallback: &str,
) -> String {
    resolve(component, metadata, key)
        .and_then(value_text)
        .unwrap_or_else(|| fallback.to_string())
}

/// The effective list value of a content field (empty if absent or not a list).
pub fn resolve_list<'a>(
    component: &'a ComponentInstance,
    metadata: &'a ComponentVariationMetadata,
    key: &str,
) -> &'a [Value] {
    match resolve(component, metadata, key) {
        Some(Value::Array(items)) => items,
        _ => &[],
    }
}

/// A text field of a list item (`{"title": "..."}`), empty when absent.
pub fn item_text(item: &Value, key: &str) -> String {
    item.get(key).and_then(value_text).unwrap_or_default()
}

/// A media URL: `media_urls[key]`, then a string content field, then the
/// variation default.
pub fn resolve_media(
    component: &ComponentInstance,
    metadata: &ComponentVariationMetadata,
    key: &str,
) -> Option<String> {
    component
        .media_urls
        .get(key)
        .filter(|url| !url.trim().is_empty())
        .cloned()
        .or_else(|| {
            resolve(component, metadata, key)
                .and_then(Value::as_str)
                .map(str::to_string)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_types::{ComponentId, ContentMap, VariationRef};
    use serde_json::json;

    fn metadata() -> ComponentVariationMetadata {
        let mut default_content = ContentMap::new();
        default_content.insert("headline".into(), json!("Default headline"));
        default_content.insert("items".into(), json!([{"title": "A"}]));
        ComponentVariationMetadata {
            component_type: "hero".into(),
            variation_number: 1,
            visibility_keys: vec![],
            default_content,
            required_images: vec![],
            supports_video: false,
        }
    }

    fn component() -> ComponentInstance {
        ComponentInstance::new(
            ComponentId::parse("c-1").unwrap(),
            VariationRef::new("hero", 1),
            0,
        )
    }

    #[test]
    fn instance_value_wins() {
        let c = component().with_content("headline", "Hello");
        assert_eq!(resolve_text(&c, &metadata(), "headline", "x"), "Hello");
    }

    #[test]
    fn empty_values_fall_through() {
        let meta = metadata();
        let c = component().with_content("headline", "   ");
        assert_eq!(resolve_text(&c, &meta, "headline", "x"), "Default headline");

        let c = component().with_content("headline", Value::Null);
        assert_eq!(resolve_text(&c, &meta, "headline", "x"), "Default headline");

        assert_eq!(resolve_text(&c, &meta, "tagline", "Fallback"), "Fallback");
    }

    #[test]
    fn numbers_render_as_text() {
        let c = component().with_content("price", 19);
        assert_eq!(resolve_text(&c, &metadata(), "price", ""), "19");
    }

    #[test]
    fn lists_fall_back_to_defaults() {
        let meta = metadata();
        let c = component().with_content("items", json!([]));
        assert_eq!(resolve_list(&c, &meta, "items").len(), 1);
        let c = component().with_content("items", "not a list");
        assert!(resolve_list(&c, &meta, "items").is_empty());
    }

    #[test]
    fn media_prefers_media_urls() {
        let c = component()
            .with_media("image", "https://cdn.example.com/a.png")
            .with_content("image", "https://old.example.com/b.png");
        assert_eq!(
            resolve_media(&c, &metadata(), "image").as_deref(),
            Some("https://cdn.example.com/a.png")
        );
        let c = component().with_content("image", "https://old.example.com/b.png");
        assert_eq!(
            resolve_media(&c, &metadata(), "image").as_deref(),
            Some("https://old.example.com/b.png")
        );
        assert_eq!(resolve_media(&component(), &metadata(), "image"), None);
    }
}
