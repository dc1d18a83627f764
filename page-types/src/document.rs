//! The page document and its page-level settings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{ComponentId, ComponentInstance, ModelError, PageId};

/// Publication status of a page.
///
/// Transitions: draft → publishing → published, publishing → draft on
/// failure, published → publishing for a re-publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    /// Editable, not live (or last publish failed).
    #[default]
    Draft,
    /// A deploy is in progress.
    Publishing,
    /// Live at the hosting provider.
    Published,
}

impl PageStatus {
    /// Whether moving to `next` is allowed.
    pub fn can_transition_to(self, next: PageStatus) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Publishing)
                | (Self::Published, Self::Publishing)
                | (Self::Publishing, Self::Published)
                | (Self::Publishing, Self::Draft)
        )
    }
}

impl fmt::Display for PageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "draft",
            Self::Publishing => "publishing",
            Self::Published => "published",
        };
        f.write_str(s)
    }
}

/// Text direction of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    /// Left to right.
    #[default]
    Ltr,
    /// Right to left.
    Rtl,
}

impl TextDirection {
    /// The `dir` attribute value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ltr => "ltr",
            Self::Rtl => "rtl",
        }
    }
}

/// Page-wide theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Theme {
    /// Brand color.
    pub primary_color: String,
    /// Accent color.
    pub secondary_color: String,
    /// Page background.
    pub background_color: String,
    /// CSS font-family stack.
    pub font_family: String,
    /// Text direction.
    pub direction: TextDirection,
    /// BCP 47 language tag.
    pub language: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_color: "#2563eb".to_string(),
            secondary_color: "#7c3aed".to_string(),
            background_color: "#ffffff".to_string(),
            font_family: "Inter, system-ui, sans-serif".to_string(),
            direction: TextDirection::Ltr,
            language: "en".to_string(),
        }
    }
}

/// Search and social metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Seo {
    /// Document title.
    pub title: String,
    /// Meta description.
    pub description: String,
    /// Meta keywords.
    pub keywords: Vec<String>,
    /// Canonical URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    /// Open Graph / Twitter card image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social_image: Option<String>,
}

/// A complete editable page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDocument {
    /// Page identity.
    pub id: PageId,
    /// URL-safe unique slug.
    pub slug: String,
    /// Theme.
    #[serde(default)]
    pub theme: Theme,
    /// SEO metadata.
    #[serde(default)]
    pub seo: Seo,
    /// Opaque analytics/pixel ids.
    #[serde(default)]
    pub tracking: BTreeMap<String, String>,
    /// Custom domain, if the user attached one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_domain: Option<String>,
    /// Hosting site, assigned on first deploy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosting_site_id: Option<String>,
    /// Publication status.
    #[serde(default)]
    pub status: PageStatus,
    /// Live URL after the last successful publish.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_url: Option<String>,
    /// Reason the last publish failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_publish_error: Option<String>,
    /// Components, ordered by `order_index`.
    #[serde(default)]
    pub components: Vec<ComponentInstance>,
}

impl PageDocument {
    /// Create an empty draft page.
    pub fn new(id: PageId, slug: &str) -> Self {
        Self {
            id,
            slug: slug.to_string(),
            theme: Theme::default(),
            seo: Seo::default(),
            tracking: BTreeMap::new(),
            custom_domain: None,
            hosting_site_id: None,
            status: PageStatus::Draft,
            published_url: None,
            last_publish_error: None,
            components: Vec::new(),
        }
    }

    /// Whether a slug is URL-safe: 1-63 chars of `[a-z0-9-]`, no leading or
    /// trailing hyphen.
    pub fn is_valid_slug(slug: &str) -> bool {
        !slug.is_empty()
            && slug.len() <= 63
            && !slug.starts_with('-')
            && !slug.ends_with('-')
            && slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }

    /// Change the slug.
    ///
    /// Refused once a hosting site exists, since the site name is derived
    /// from the slug.
    pub fn set_slug(&mut self, slug: &str) -> Result<(), ModelError> {
        if !Self::is_valid_slug(slug) {
            return Err(ModelError::InvalidSlug(slug.to_string()));
        }
        if slug == self.slug {
            return Ok(());
        }
        if let Some(site_id) = &self.hosting_site_id {
            return Err(ModelError::SlugLocked {
                site_id: site_id.clone(),
            });
        }
        self.slug = slug.to_string();
        Ok(())
    }

    /// Move to a new publication status.
    pub fn transition_status(&mut self, next: PageStatus) -> Result<(), ModelError> {
        if !self.status.can_transition_to(next) {
            return Err(ModelError::InvalidStatusTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Find a component by id.
    pub fn component(&self, id: &ComponentId) -> Option<&ComponentInstance> {
        self.components.iter().find(|c| &c.id == id)
    }

    /// Find a component by id, mutably.
    pub fn component_mut(&mut self, id: &ComponentId) -> Option<&mut ComponentInstance> {
        self.components.iter_mut().find(|c| &c.id == id)
    }

    /// Components in render order. Ties keep their list position.
    pub fn ordered_components(&self) -> Vec<&ComponentInstance> {
        let mut ordered: Vec<&ComponentInstance> = self.components.iter().collect();
        ordered.sort_by_key(|c| c.order_index);
        ordered
    }

    /// Snapshot of the publish-related fields.
    pub fn publish_record(&self) -> PublishRecord {
        PublishRecord {
            status: self.status,
            hosting_site_id: self.hosting_site_id.clone(),
            published_url: self.published_url.clone(),
            error: self.last_publish_error.clone(),
        }
    }
}

/// Publish-related page fields, persisted as one write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRecord {
    /// Publication status.
    pub status: PageStatus,
    /// Hosting site id.
    pub hosting_site_id: Option<String>,
    /// Live URL.
    pub published_url: Option<String>,
    /// Reason the last publish failed.
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VariationRef;

    fn page() -> PageDocument {
        PageDocument::new(PageId::new(), "launch-page")
    }

    // ===========================================
    // Status Tests
    // ===========================================

    #[test]
    fn status_happy_path() {
        let mut doc = page();
        doc.transition_status(PageStatus::Publishing).unwrap();
        doc.transition_status(PageStatus::Published).unwrap();
        assert_eq!(doc.status, PageStatus::Published);
    }

    #[test]
    fn status_failure_returns_to_draft() {
        let mut doc = page();
        doc.transition_status(PageStatus::Publishing).unwrap();
        doc.transition_status(PageStatus::Draft).unwrap();
        assert_eq!(doc.status, PageStatus::Draft);
    }

    #[test]
    fn status_cannot_skip_publishing() {
        let mut doc = page();
        let err = doc.transition_status(PageStatus::Published).unwrap_err();
        assert!(matches!(err, ModelError::InvalidStatusTransition { .. }));
        assert_eq!(doc.status, PageStatus::Draft);
    }

    #[test]
    fn published_cannot_fall_back_to_draft_directly() {
        assert!(!PageStatus::Published.can_transition_to(PageStatus::Draft));
        assert!(PageStatus::Published.can_transition_to(PageStatus::Publishing));
    }

    // ===========================================
    // Slug Tests
    // ===========================================

    #[test]
    fn slug_validation() {
        assert!(PageDocument::is_valid_slug("my-page-2"));
        assert!(!PageDocument::is_valid_slug("My Page"));
        assert!(!PageDocument::is_valid_slug("-leading"));
        assert!(!PageDocument::is_valid_slug("trailing-"));
        assert!(!PageDocument::is_valid_slug(""));
    }

    #[test]
    fn slug_locked_after_site_exists() {
        let mut doc = page();
        doc.set_slug("renamed").unwrap();
        doc.hosting_site_id = Some("site-123".into());

        let err = doc.set_slug("again").unwrap_err();
        assert!(matches!(err, ModelError::SlugLocked { .. }));
        assert_eq!(doc.slug, "renamed");

        // Setting the same slug is a no-op, not an error
        doc.set_slug("renamed").unwrap();
    }

    // ===========================================
    // Ordering / Serde Tests
    // ===========================================

    #[test]
    fn ordered_components_sorts_by_order_index() {
        let mut doc = page();
        for (id, order) in [("a", 3), ("b", 1), ("c", 2)] {
            doc.components.push(ComponentInstance::new(
                ComponentId::parse(id).unwrap(),
                VariationRef::new("cta", 1),
                order,
            ));
        }
        let ids: Vec<&str> = doc
            .ordered_components()
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn minimal_json_uses_defaults() {
        let id = PageId::new();
        let json = format!(r#"{{"id":"{}","slug":"x"}}"#, id);
        let doc: PageDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(doc.status, PageStatus::Draft);
        assert_eq!(doc.theme, Theme::default());
        assert!(doc.components.is_empty());
        assert!(doc.hosting_site_id.is_none());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&PageStatus::Publishing).unwrap();
        assert_eq!(json, "\"publishing\"");
    }
}
