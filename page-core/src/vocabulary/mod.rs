//! The closed utility-class vocabulary.
//!
//! A [`StyleVocabulary`] holds one [`VariationSpec`] per known variation:
//! its metadata, a [`ClassMap`] (element → viewport → tokens), the element
//! hierarchy used for visibility, and per-element default styles.
//!
//! Tokens are resolved to CSS through fixed lookup tables in [`tables`].

mod builtin;
pub mod tables;

use pagecraft_types::{ComponentInstance, ComponentVariationMetadata, StyleMap, VariationRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The element every variation renders as its outer wrapper. It is always
/// visible.
pub const ROOT_ELEMENT: &str = "container";

/// Responsive prefixes, in ascending width order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Breakpoint {
    /// `sm:` - 640px
    Sm,
    /// `md:` - 768px (tablet)
    Md,
    /// `lg:` - 1024px (desktop)
    Lg,
    /// `xl:` - 1280px
    Xl,
}

impl Breakpoint {
    /// All breakpoints, ascending.
    pub const ALL: [Breakpoint; 4] = [Self::Sm, Self::Md, Self::Lg, Self::Xl];

    /// Parse a responsive prefix (without the colon).
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "sm" => Some(Self::Sm),
            "md" => Some(Self::Md),
            "lg" => Some(Self::Lg),
            "xl" => Some(Self::Xl),
            _ => None,
        }
    }

    /// The prefix as written in class tokens.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Sm => "sm",
            Self::Md => "md",
            Self::Lg => "lg",
            Self::Xl => "xl",
        }
    }

    /// Minimum viewport width in pixels.
    pub fn min_width_px(&self) -> u32 {
        match self {
            Self::Sm => 640,
            Self::Md => 768,
            Self::Lg => 1024,
            Self::Xl => 1280,
        }
    }
}

/// Viewport bucket of a class map entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewport {
    /// Base styles.
    Mobile,
    /// Tablet and up.
    Tablet,
    /// Desktop and up.
    Desktop,
}

/// Utility tokens for one element, per viewport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementClasses {
    /// Mobile (base) tokens.
    #[serde(default)]
    pub mobile: String,
    /// Tablet tokens, usually `md:`-prefixed.
    #[serde(default)]
    pub tablet: String,
    /// Desktop tokens, usually `lg:`-prefixed.
    #[serde(default)]
    pub desktop: String,
}

impl ElementClasses {
    /// Build from the three viewport strings.
    pub fn new(mobile: &str, tablet: &str, desktop: &str) -> Self {
        Self {
            mobile: mobile.to_string(),
            tablet: tablet.to_string(),
            desktop: desktop.to_string(),
        }
    }

    /// Tokens for a single viewport.
    pub fn for_viewport(&self, viewport: Viewport) -> &str {
        match viewport {
            Viewport::Mobile => &self.mobile,
            Viewport::Tablet => &self.tablet,
            Viewport::Desktop => &self.desktop,
        }
    }

    /// Union of the tokens across all viewports, first occurrence order.
    pub fn tokens(&self) -> Vec<&str> {
        let mut tokens: Vec<&str> = Vec::new();
        for viewport in [Viewport::Mobile, Viewport::Tablet, Viewport::Desktop] {
            for token in self.for_viewport(viewport).split_whitespace() {
                if !tokens.contains(&token) {
                    tokens.push(token);
                }
            }
        }
        tokens
    }

    /// The `class` attribute value for this element.
    pub fn class_attr(&self) -> String {
        self.tokens().join(" ")
    }
}

/// Element name → per-viewport tokens.
pub type ClassMap = BTreeMap<String, ElementClasses>;

/// Everything the compiler needs to know about one variation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariationSpec {
    /// Reference data (visibility keys, default content).
    pub metadata: ComponentVariationMetadata,
    /// Utility tokens per element.
    pub class_map: ClassMap,
    /// Child element → parent element. A child renders only if its parent does.
    #[serde(default)]
    pub parents: BTreeMap<String, String>,
    /// Variation default inline styles per element.
    #[serde(default)]
    pub default_styles: BTreeMap<String, StyleMap>,
}

impl VariationSpec {
    /// Create a spec with no elements.
    pub fn new(metadata: ComponentVariationMetadata) -> Self {
        Self {
            metadata,
            class_map: ClassMap::new(),
            parents: BTreeMap::new(),
            default_styles: BTreeMap::new(),
        }
    }

    /// Add a top-level element.
    pub fn element(mut self, name: &str, mobile: &str, tablet: &str, desktop: &str) -> Self {
        self.class_map
            .insert(name.to_string(), ElementClasses::new(mobile, tablet, desktop));
        self
    }

    /// Add an element nested under `parent`.
    pub fn child(mut self, parent: &str, name: &str, mobile: &str, tablet: &str, desktop: &str) -> Self {
        self.parents.insert(name.to_string(), parent.to_string());
        self.element(name, mobile, tablet, desktop)
    }

    /// Set a default inline style on an element.
    pub fn default_style(mut self, element: &str, property: &str, value: &str) -> Self {
        self.default_styles
            .entry(element.to_string())
            .or_default()
            .insert(property.to_string(), value.to_string());
        self
    }

    /// The variation this spec describes.
    pub fn variation(&self) -> VariationRef {
        self.metadata.variation()
    }

    /// Whether `element` renders for `component`: the root always does,
    /// others unless they or an ancestor are hidden.
    pub fn element_visible(&self, component: &ComponentInstance, element: &str) -> bool {
        let mut current = element;
        // Bounded walk so a cyclic parent table cannot loop forever.
        for _ in 0..=self.parents.len() {
            if current == ROOT_ELEMENT {
                return true;
            }
            if !component.is_visible(current) {
                return false;
            }
            match self.parents.get(current) {
                Some(parent) => current = parent,
                None => return true,
            }
        }
        true
    }

    /// Elements of the class map that render for `component`.
    pub fn visible_elements<'a>(&'a self, component: &'a ComponentInstance) -> impl Iterator<Item = &'a str> + 'a {
        self.class_map
            .keys()
            .map(String::as_str)
            .filter(move |e| self.element_visible(component, e))
    }

    /// `class` attribute value for an element (empty if unknown).
    pub fn class_attr(&self, element: &str) -> String {
        self.class_map
            .get(element)
            .map(ElementClasses::class_attr)
            .unwrap_or_default()
    }
}

/// Catalogue of every variation the compiler can render.
#[derive(Debug, Clone, Default)]
pub struct StyleVocabulary {
    variations: BTreeMap<VariationRef, VariationSpec>,
}

impl StyleVocabulary {
    /// A vocabulary with no variations.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in component library.
    pub fn builtin() -> Self {
        let mut vocabulary = Self::empty();
        for spec in builtin::variations() {
            vocabulary.insert(spec);
        }
        vocabulary
    }

    /// Add or replace a variation.
    pub fn insert(&mut self, spec: VariationSpec) {
        self.variations.insert(spec.variation(), spec);
    }

    /// Look up a variation.
    pub fn get(&self, variation: &VariationRef) -> Option<&VariationSpec> {
        self.variations.get(variation)
    }

    /// Metadata for a variation.
    pub fn metadata(&self, variation: &VariationRef) -> Option<&ComponentVariationMetadata> {
        self.get(variation).map(|spec| &spec.metadata)
    }

    /// All variations, ordered by type then number.
    pub fn variations(&self) -> impl Iterator<Item = &VariationSpec> {
        self.variations.values()
    }

    /// Number of variations.
    pub fn len(&self) -> usize {
        self.variations.len()
    }

    /// Whether the vocabulary has no variations.
    pub fn is_empty(&self) -> bool {
        self.variations.is_empty()
    }
}

/// A class token resolved to a CSS rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRule {
    /// Breakpoint the rule is wrapped in, `None` for base rules.
    pub breakpoint: Option<Breakpoint>,
    /// The full CSS rule (`.md\:text-xl{font-size:...}`).
    pub rule: String,
}

/// Resolve one class token. Unknown utilities and unknown responsive
/// prefixes yield `None`.
pub fn resolve_token(token: &str) -> Option<TokenRule> {
    let (breakpoint, utility) = match token.split_once(':') {
        Some((prefix, utility)) => (Some(Breakpoint::from_prefix(prefix)?), utility),
        None => (None, token),
    };
    // Stacked variants (`md:hover:x`) are not part of the vocabulary.
    if utility.contains(':') {
        return None;
    }
    let declarations = tables::declarations(utility)?;
    Some(TokenRule {
        breakpoint,
        rule: format!(".{}{{{}}}", escape_selector(token), declarations),
    })
}

/// Escape a class token for use in a CSS selector.
pub fn escape_selector(token: &str) -> String {
    let mut out = String::with_capacity(token.len() + 2);
    for c in token.chars() {
        if matches!(c, ':' | '.' | '/' | '%' | '[' | ']') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
