//! Component instances and variation reference data.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::ComponentId;

/// CSS property map for one element (camelCase property → value).
pub type StyleMap = BTreeMap<String, String>;

/// Content fields of a component (field key → arbitrary JSON value).
pub type ContentMap = BTreeMap<String, Value>;

/// Reference to a named visual template: component type plus variation number.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariationRef {
    /// Component type (`hero`, `features`, ...).
    pub component_type: String,
    /// Variation number within the type (1-based).
    pub variation_number: u32,
}

impl VariationRef {
    /// Create a new variation reference.
    pub fn new(component_type: &str, variation_number: u32) -> Self {
        Self {
            component_type: component_type.to_string(),
            variation_number,
        }
    }

    /// The reference used for components whose type could not be recovered.
    pub fn unknown() -> Self {
        Self::new("unknown", 0)
    }
}

impl fmt::Display for VariationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.component_type, self.variation_number)
    }
}

/// Behavior attached to a button or link element.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomAction {
    /// Action discriminator (`checkout`, `external_link`, ...). Kept as a
    /// string so unknown types survive a load/save cycle.
    pub action_type: String,
    /// Selector or element id (scroll_to, modal).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Destination URL (checkout, external_link).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Amount for checkout actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    /// ISO currency code for checkout actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Event name for track_event actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    /// Open external links in a new tab.
    #[serde(default)]
    pub new_tab: bool,
}

/// Known action types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Redirect to a payment page.
    Checkout,
    /// Navigate to an external URL.
    ExternalLink,
    /// Smooth-scroll to an element on the page.
    ScrollTo,
    /// Open a modal dialog.
    Modal,
    /// Send an analytics event.
    TrackEvent,
    /// Anything else; ignored at runtime.
    Unknown,
}

impl ActionKind {
    /// Wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Checkout => "checkout",
            Self::ExternalLink => "external_link",
            Self::ScrollTo => "scroll_to",
            Self::Modal => "modal",
            Self::TrackEvent => "track_event",
            Self::Unknown => "unknown",
        }
    }
}

impl CustomAction {
    /// Create an action of the given type with no parameters.
    pub fn new(action_type: &str) -> Self {
        Self {
            action_type: action_type.to_string(),
            ..Self::default()
        }
    }

    /// Classify the action type.
    pub fn kind(&self) -> ActionKind {
        match self.action_type.as_str() {
            "checkout" => ActionKind::Checkout,
            "external_link" => ActionKind::ExternalLink,
            "scroll_to" => ActionKind::ScrollTo,
            "modal" => ActionKind::Modal,
            "track_event" => ActionKind::TrackEvent,
            _ => ActionKind::Unknown,
        }
    }
}

/// One component placed on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInstance {
    /// Durable or placeholder identity.
    pub id: ComponentId,
    /// Which template renders this component.
    pub variation: VariationRef,
    /// Render position; unique within a document after normalization.
    pub order_index: i64,
    /// Content fields.
    #[serde(default)]
    pub content: ContentMap,
    /// Element key → visible flag (absent means visible).
    #[serde(default)]
    pub visibility: BTreeMap<String, bool>,
    /// Element key → style overrides.
    #[serde(default)]
    pub style_overrides: BTreeMap<String, StyleMap>,
    /// Field key → absolute media URL.
    #[serde(default)]
    pub media_urls: BTreeMap<String, String>,
    /// Action key → behavior.
    #[serde(default)]
    pub custom_actions: BTreeMap<String, CustomAction>,
}

impl ComponentInstance {
    /// Create an empty component.
    pub fn new(id: ComponentId, variation: VariationRef, order_index: i64) -> Self {
        Self {
            id,
            variation,
            order_index,
            content: ContentMap::new(),
            visibility: BTreeMap::new(),
            style_overrides: BTreeMap::new(),
            media_urls: BTreeMap::new(),
            custom_actions: BTreeMap::new(),
        }
    }

    /// Create a component seeded from a variation's default content.
    pub fn from_metadata(
        id: ComponentId,
        metadata: &ComponentVariationMetadata,
        order_index: i64,
    ) -> Self {
        let mut component = Self::new(id, metadata.variation(), order_index);
        component.content = metadata.default_content.clone();
        component
    }

    /// Set a content field.
    pub fn with_content(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.content.insert(key.to_string(), value.into());
        self
    }

    /// Set an element's visibility.
    pub fn with_visibility(mut self, key: &str, visible: bool) -> Self {
        self.visibility.insert(key.to_string(), visible);
        self
    }

    /// Set one style property on an element.
    pub fn with_style(mut self, element: &str, property: &str, value: &str) -> Self {
        self.style_overrides
            .entry(element.to_string())
            .or_default()
            .insert(property.to_string(), value.to_string());
        self
    }

    /// Attach an action to an element.
    pub fn with_action(mut self, key: &str, action: CustomAction) -> Self {
        self.custom_actions.insert(key.to_string(), action);
        self
    }

    /// Set a media URL.
    pub fn with_media(mut self, key: &str, url: &str) -> Self {
        self.media_urls.insert(key.to_string(), url.to_string());
        self
    }

    /// Whether an element renders. Elements are visible unless explicitly hidden.
    pub fn is_visible(&self, key: &str) -> bool {
        self.visibility.get(key).copied().unwrap_or(true)
    }
}

/// The per-component payload written to durable storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRecord {
    /// Which template renders this component.
    pub variation: VariationRef,
    /// Content fields.
    pub content: ContentMap,
    /// Visibility flags.
    pub visibility: BTreeMap<String, bool>,
    /// Style overrides.
    pub style_overrides: BTreeMap<String, StyleMap>,
    /// Media URLs.
    pub media_urls: BTreeMap<String, String>,
    /// Actions.
    pub custom_actions: BTreeMap<String, CustomAction>,
    /// Render position.
    pub order_index: i64,
}

impl From<&ComponentInstance> for ComponentRecord {
    fn from(component: &ComponentInstance) -> Self {
        Self {
            variation: component.variation.clone(),
            content: component.content.clone(),
            visibility: component.visibility.clone(),
            style_overrides: component.style_overrides.clone(),
            media_urls: component.media_urls.clone(),
            custom_actions: component.custom_actions.clone(),
            order_index: component.order_index,
        }
    }
}

/// An element that can be toggled in the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityKey {
    /// Element key.
    pub key: String,
    /// Human-readable label.
    pub label: String,
}

impl VisibilityKey {
    /// Create a new visibility key.
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
        }
    }
}

/// Read-only reference data describing a variation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentVariationMetadata {
    /// Component type.
    pub component_type: String,
    /// Variation number.
    pub variation_number: u32,
    /// Toggleable elements, in editor order.
    pub visibility_keys: Vec<VisibilityKey>,
    /// Content used to seed new instances and fill empty fields.
    pub default_content: ContentMap,
    /// Media fields that must be provided for the variation to look right.
    #[serde(default)]
    pub required_images: Vec<String>,
    /// Whether the variation can show a video.
    #[serde(default)]
    pub supports_video: bool,
}

impl ComponentVariationMetadata {
    /// The variation this metadata describes.
    pub fn variation(&self) -> VariationRef {
        VariationRef::new(&self.component_type, self.variation_number)
    }

    /// Whether the metadata declares an element key.
    pub fn declares(&self, key: &str) -> bool {
        self.visibility_keys.iter().any(|k| k.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hero() -> ComponentInstance {
        ComponentInstance::new(
            ComponentId::parse("c-1").unwrap(),
            VariationRef::new("hero", 1),
            1,
        )
    }

    #[test]
    fn visibility_defaults_to_true() {
        let component = hero().with_visibility("subheadline", false);
        assert!(component.is_visible("headline"));
        assert!(!component.is_visible("subheadline"));
    }

    #[test]
    fn action_kind_classification() {
        assert_eq!(CustomAction::new("checkout").kind(), ActionKind::Checkout);
        assert_eq!(CustomAction::new("scroll_to").kind(), ActionKind::ScrollTo);
        assert_eq!(CustomAction::new("teleport").kind(), ActionKind::Unknown);
    }

    #[test]
    fn unknown_action_type_survives_serde() {
        let component = hero().with_action("cta", CustomAction::new("teleport"));
        let json = serde_json::to_string(&component).unwrap();
        let back: ComponentInstance = serde_json::from_str(&json).unwrap();
        assert_eq!(back.custom_actions["cta"].action_type, "teleport");
    }

    #[test]
    fn component_json_is_camel_case() {
        let component = hero()
            .with_content("headline", "Hello")
            .with_style("container", "backgroundColor", "#000");
        let value = serde_json::to_value(&component).unwrap();
        assert_eq!(value["orderIndex"], json!(1));
        assert_eq!(value["variation"]["componentType"], json!("hero"));
        assert_eq!(
            value["styleOverrides"]["container"]["backgroundColor"],
            json!("#000")
        );
    }

    #[test]
    fn missing_maps_default_to_empty() {
        let json = r#"{"id":"c-9","variation":{"componentType":"cta","variationNumber":2},"orderIndex":4}"#;
        let component: ComponentInstance = serde_json::from_str(json).unwrap();
        assert!(component.content.is_empty());
        assert!(component.visibility.is_empty());
        assert!(component.custom_actions.is_empty());
    }

    #[test]
    fn record_copies_persisted_fields() {
        let component = hero().with_content("headline", "Hi").with_visibility("x", false);
        let record = ComponentRecord::from(&component);
        assert_eq!(record.order_index, 1);
        assert_eq!(record.content["headline"], json!("Hi"));
        assert_eq!(record.visibility["x"], false);
    }

    #[test]
    fn from_metadata_seeds_default_content() {
        let mut default_content = ContentMap::new();
        default_content.insert("headline".into(), json!("Default"));
        let metadata = ComponentVariationMetadata {
            component_type: "hero".into(),
            variation_number: 2,
            visibility_keys: vec![VisibilityKey::new("headline", "Headline")],
            default_content,
            required_images: vec![],
            supports_video: false,
        };
        let component = ComponentInstance::from_metadata(ComponentId::placeholder(), &metadata, 0);
        assert_eq!(component.variation, VariationRef::new("hero", 2));
        assert_eq!(component.content["headline"], json!("Default"));
        assert!(metadata.declares("headline"));
        assert!(!metadata.declares("image"));
    }
}
