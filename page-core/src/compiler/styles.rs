//! Inline style resolution.
//!
//! Layers, lowest priority first: theme → variation default → instance
//! override. An override value that is empty or transparent does not
//! replace the lower layer.

use pagecraft_types::{ComponentInstance, StyleMap, Theme};

use crate::shaker::sanitize_value;
use crate::vocabulary::tables::is_transparent;
use crate::vocabulary::{VariationSpec, ROOT_ELEMENT};
use crate::StyleError;

/// `backgroundColor` → `background-color`. Kebab-case input is unchanged.
pub fn camel_to_kebab(property: &str) -> String {
    let mut out = String::with_capacity(property.len() + 4);
    for c in property.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn validate_property(property: &str) -> Result<(), StyleError> {
    let valid = !property.is_empty()
        && property.chars().all(|c| c.is_ascii_alphabetic() || c == '-')
        && !property.ends_with('-');
    if valid {
        Ok(())
    } else {
        Err(StyleError::InvalidProperty {
            property: property.to_string(),
        })
    }
}

fn validate_value(property: &str, value: &str) -> Result<(), StyleError> {
    let lower = value.to_ascii_lowercase();
    let unsafe_chars = value
        .chars()
        .any(|c| matches!(c, ';' | '{' | '}' | '<' | '>' | '"' | '\\') || c.is_control());
    if unsafe_chars || lower.contains("expression(") || lower.contains("javascript:") {
        return Err(StyleError::InvalidValue {
            property: property.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Check every entry of a style map.
pub fn validate_style_map(styles: &StyleMap) -> Result<(), StyleError> {
    for (property, value) in styles {
        validate_property(property)?;
        validate_value(property, value)?;
    }
    Ok(())
}

/// Merge `incoming` into one element's existing overrides, or replace them.
///
/// In merge mode an empty incoming value removes that property. Nothing is
/// changed when any incoming entry is invalid.
pub fn merge_style_override(
    existing: &StyleMap,
    incoming: &StyleMap,
    replace: bool,
) -> Result<StyleMap, StyleError> {
    validate_style_map(incoming)?;
    if replace {
        return Ok(incoming
            .iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(k, v)| (k.clone(), v.trim().to_string()))
            .collect());
    }
    let mut merged = existing.clone();
    for (property, value) in incoming {
        if value.trim().is_empty() {
            merged.remove(property);
        } else {
            merged.insert(property.clone(), value.trim().to_string());
        }
    }
    Ok(merged)
}

/// The theme's contribution to an element. The root element sits on the
/// theme background unless its class map already sets a background.
pub fn theme_layer(theme: &Theme, spec: &VariationSpec, element: &str) -> StyleMap {
    let mut layer = StyleMap::new();
    if element != ROOT_ELEMENT {
        return layer;
    }
    let has_background_class = spec
        .class_map
        .get(ROOT_ELEMENT)
        .map(|classes| {
            classes
                .tokens()
                .iter()
                .any(|t| t.rsplit(':').next().is_some_and(|u| u.starts_with("bg-")))
        })
        .unwrap_or(false);
    let background = sanitize_value(&theme.background_color);
    if !has_background_class && !background.is_empty() {
        layer.insert("background-color".to_string(), background);
    }
    layer
}

/// Resolve an element's inline styles. Keys of the result are kebab-case.
///
/// Fails if the instance override for this element is invalid; the caller
/// decides whether to drop the override or surface the error.
pub fn resolve_element_style(
    theme: &Theme,
    spec: &VariationSpec,
    component: &ComponentInstance,
    element: &str,
) -> Result<StyleMap, StyleError> {
    let mut resolved = theme_layer(theme, spec, element);

    if let Some(defaults) = spec.default_styles.get(element) {
        for (property, value) in defaults {
            resolved.insert(camel_to_kebab(property), value.clone());
        }
    }

    if let Some(overrides) = component.style_overrides.get(element) {
        validate_style_map(overrides)?;
        for (property, value) in overrides {
            let value = value.trim();
            if value.is_empty() || is_transparent(value) {
                continue;
            }
            resolved.insert(camel_to_kebab(property), value.to_string());
        }
    }

    Ok(resolved)
}

/// Resolve with only the theme and default layers.
pub fn base_element_style(theme: &Theme, spec: &VariationSpec, element: &str) -> StyleMap {
    let mut resolved = theme_layer(theme, spec, element);
    if let Some(defaults) = spec.default_styles.get(element) {
        for (property, value) in defaults {
            resolved.insert(camel_to_kebab(property), value.clone());
        }
    }
    resolved
}

/// Serialize resolved styles as a `style` attribute value.
pub fn inline_style(styles: &StyleMap) -> String {
    styles
        .iter()
        .map(|(property, value)| format!("{}:{}", property, value))
        .collect::<Vec<_>>()
        .join(";")
}
