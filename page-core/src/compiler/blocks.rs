//! Per-type markup renderers.

use pagecraft_types::{ActionKind, ComponentInstance, Theme};
use serde_json::Value;

use super::content::{item_text, resolve_list, resolve_media, resolve_text};
use super::markup::{dom_id, safe_url, Attrs, Html};
use super::styles::{base_element_style, inline_style, resolve_element_style};
use super::{CompileDegraded, DegradeReason};
use crate::vocabulary::{VariationSpec, ROOT_ELEMENT};

/// Rendering context for one resolvable component.
pub(super) struct Block<'a> {
    pub component: &'a ComponentInstance,
    pub spec: &'a VariationSpec,
    pub theme: &'a Theme,
    pub diagnostics: &'a mut Vec<CompileDegraded>,
    /// Modal dialogs to append after the section.
    modals: Vec<(String, String)>,
}

impl<'a> Block<'a> {
    pub fn new(
        component: &'a ComponentInstance,
        spec: &'a VariationSpec,
        theme: &'a Theme,
        diagnostics: &'a mut Vec<CompileDegraded>,
    ) -> Self {
        Self {
            component,
            spec,
            theme,
            diagnostics,
            modals: Vec::new(),
        }
    }

    /// Whether an element renders: visible, and known to the variation.
    fn has(&self, element: &str) -> bool {
        (self.spec.class_map.contains_key(element) || self.spec.metadata.declares(element))
            && self.spec.element_visible(self.component, element)
    }

    fn text(&self, key: &str, fallback: &str) -> String {
        resolve_text(self.component, &self.spec.metadata, key, fallback)
    }

    fn list(&self, key: &str) -> &'a [Value] {
        resolve_list(self.component, &self.spec.metadata, key)
    }

    fn section_id(&self) -> String {
        let anchor = self.text("anchor", "");
        if anchor.trim().is_empty() {
            format!("section-{}", dom_id(self.component.id.as_str()))
        } else {
            dom_id(anchor.trim())
        }
    }

    /// `class`, `style` and `data-element` for an element.
    fn attrs(&mut self, element: &str) -> Attrs {
        let styles = match resolve_element_style(self.theme, self.spec, self.component, element) {
            Ok(styles) => styles,
            Err(error) => {
                self.diagnostics.push(CompileDegraded {
                    component_id: self.component.id.clone(),
                    reason: DegradeReason::InvalidStyle {
                        element: element.to_string(),
                        error,
                    },
                });
                base_element_style(self.theme, self.spec, element)
            }
        };
        Attrs::new()
            .with("class", self.spec.class_attr(element))
            .with("style", inline_style(&styles))
            .with("data-element", element)
    }

    /// Attach `data-action*` attributes for the first action key present.
    fn action(&mut self, attrs: Attrs, keys: &[&str]) -> Attrs {
        let component = self.component;
        let Some((key, action)) = keys
            .iter()
            .find_map(|k| component.custom_actions.get(*k).map(|a| (*k, a)))
        else {
            return attrs;
        };
        let mut attrs = attrs.with("data-action", action.action_type.as_str());
        let mut target = action.target.clone().unwrap_or_default();
        if action.kind() == ActionKind::Modal && target.is_empty() {
            target = format!("modal-{}-{}", dom_id(self.component.id.as_str()), dom_id(key));
        }
        if action.kind() == ActionKind::Modal {
            self.register_modal(&target);
        }
        attrs.set("data-action-target", target);
        attrs.set("data-action-url", action.url.as_deref().map(safe_url).unwrap_or_default());
        if let Some(amount) = action.amount {
            attrs.set("data-action-amount", amount.to_string());
        }
        attrs.set("data-action-currency", action.currency.clone().unwrap_or_default());
        attrs.set("data-action-event", action.event_name.clone().unwrap_or_default());
        if action.new_tab {
            attrs.set("data-action-new-tab", "true");
        }
        attrs
    }

    fn register_modal(&mut self, target: &str) {
        let id = dom_id(target.trim_start_matches('#'));
        if self.modals.iter().any(|(existing, _)| *existing == id) {
            return;
        }
        let title = self.text("modalTitle", "Thanks for your interest");
        self.modals.push((id, title));
    }

    fn open_section(&mut self, html: &mut Html, tag: &str) {
        let attrs = self
            .attrs(ROOT_ELEMENT)
            .with("id", self.section_id())
            .with("data-component", self.spec.metadata.component_type.as_str())
            .with("data-variation", self.spec.metadata.variation_number.to_string());
        html.open(tag, &attrs);
    }

    fn close_section(&mut self, html: &mut Html, tag: &str) {
        html.close(tag);
        let body = self.text("modalBody", "");
        for (id, title) in std::mem::take(&mut self.modals) {
            let attrs = Attrs::new()
                .with("class", "pc-modal")
                .with("id", id)
                .with("role", "dialog")
                .with("aria-modal", "true")
                .flag("hidden");
            html.open("div", &attrs);
            html.open("div", &Attrs::new().with("class", "pc-modal-panel"));
            html.element("h2", &Attrs::new(), &title);
            if !body.is_empty() {
                html.element("p", &Attrs::new(), &body);
            }
            html.element("button", &Attrs::new().with("type", "button").flag("data-modal-close"), "Close");
            html.close("div");
            html.close("div");
        }
    }

    /// A text element, skipped if hidden or empty.
    fn text_element(&mut self, html: &mut Html, tag: &str, element: &str, fallback: &str) {
        if !self.has(element) {
            return;
        }
        let text = self.text(element, fallback);
        if text.is_empty() {
            return;
        }
        let attrs = self.attrs(element);
        html.element(tag, &attrs, &text);
    }

    /// A link-styled button with optional action.
    fn button(&mut self, html: &mut Html, element: &str, label_key: &str, fallback: &str) {
        if !self.has(element) {
            return;
        }
        let label = self.text(label_key, fallback);
        let href = safe_url(&self.text(&format!("{}Url", element), "#"));
        let attrs = self.attrs(element).with("href", href);
        let attrs = self.action(attrs, &[element]);
        html.element("a", &attrs, &label);
    }

    fn media(&mut self, html: &mut Html, element: &str, alt: &str) {
        if !self.has(element) {
            return;
        }
        let spec = self.spec;
        let metadata = &spec.metadata;
        if metadata.supports_video {
            if let Some(video) = resolve_media(self.component, metadata, "video") {
                let attrs = self
                    .attrs(element)
                    .with("src", safe_url(&video))
                    .flag("muted")
                    .flag("playsinline")
                    .flag("controls");
                html.open("video", &attrs);
                html.close("video");
                return;
            }
        }
        if let Some(src) = resolve_media(self.component, metadata, element) {
            let attrs = self
                .attrs(element)
                .with("src", safe_url(&src))
                .with("alt", alt)
                .with("loading", "lazy");
            html.void("img", &attrs);
        }
    }
}

fn hero(html: &mut Html, b: &mut Block) {
    b.open_section(html, "section");
    html.open("div", &Attrs::new());
    b.text_element(html, "h1", "headline", "Welcome");
    b.text_element(html, "p", "subheadline", "");
    b.button(html, "button", "buttonText", "Get started");
    html.close("div");
    let alt = b.text("headline", "");
    b.media(html, "image", &alt);
    b.close_section(html, "section");
}

fn features(html: &mut Html, b: &mut Block) {
    b.open_section(html, "section");
    b.text_element(html, "h2", "headline", "Features");
    b.text_element(html, "p", "subheadline", "");
    if b.has("items") {
        let items = b.list("items");
        if !items.is_empty() {
            let grid = b.attrs("items");
            html.open("div", &grid);
            for item in items {
                if !b.has("item") {
                    break;
                }
                let card = b.attrs("item");
                html.open("div", &card);
                if b.has("itemTitle") {
                    let title = b.attrs("itemTitle");
                    html.element("h3", &title, &item_text(item, "title"));
                }
                let description = item_text(item, "description");
                if !description.is_empty() && b.has("itemDescription") {
                    let attrs = b.attrs("itemDescription");
                    html.element("p", &attrs, &description);
                }
                html.close("div");
            }
            html.close("div");
        }
    }
    b.close_section(html, "section");
}

fn testimonials(html: &mut Html, b: &mut Block) {
    b.open_section(html, "section");
    b.text_element(html, "h2", "headline", "What people say");
    if b.has("items") {
        let items = b.list("items");
        if !items.is_empty() {
            let grid = b.attrs("items");
            html.open("div", &grid);
            for item in items {
                if !b.has("quote") {
                    break;
                }
                let card = b.attrs("quote");
                html.open("figure", &card);
                html.element("blockquote", &Attrs::new(), &item_text(item, "quote"));
                html.open("figcaption", &Attrs::new());
                if b.has("author") {
                    let author = b.attrs("author");
                    html.element("div", &author, &item_text(item, "author"));
                }
                let role = item_text(item, "role");
                if !role.is_empty() && b.has("role") {
                    let attrs = b.attrs("role");
                    html.element("div", &attrs, &role);
                }
                html.close("figcaption");
                html.close("figure");
            }
            html.close("div");
        }
    }
    b.close_section(html, "section");
}

fn pricing(html: &mut Html, b: &mut Block) {
    b.open_section(html, "section");
    b.text_element(html, "h2", "headline", "Pricing");
    b.text_element(html, "p", "subheadline", "");
    if b.has("plans") {
        let plans = b.list("plans");
        if !plans.is_empty() {
            let grid = b.attrs("plans");
            html.open("div", &grid);
            for (i, plan) in plans.iter().enumerate() {
                if !b.has("plan") {
                    break;
                }
                let card = b.attrs("plan");
                html.open("div", &card);
                html.element("h3", &Attrs::new(), &item_text(plan, "name"));
                if b.has("price") {
                    let price = b.attrs("price");
                    html.open("p", &price);
                    html.text(&item_text(plan, "price"));
                    let period = item_text(plan, "period");
                    if !period.is_empty() {
                        html.element("span", &Attrs::new(), &period);
                    }
                    html.close("p");
                }
                if let Some(Value::Array(features)) = plan.get("features") {
                    html.open("ul", &Attrs::new());
                    for feature in features {
                        html.element("li", &Attrs::new(), feature.as_str().unwrap_or_default());
                    }
                    html.close("ul");
                }
                if b.has("planButton") {
                    let url = item_text(plan, "url");
                    let href = safe_url(if url.is_empty() { "#" } else { &url });
                    let attrs = b.attrs("planButton").with("href", href);
                    let plan_key = format!("plan-{}", i);
                    let attrs = b.action(attrs, &[plan_key.as_str(), "planButton"]);
                    let mut label = item_text(plan, "buttonText");
                    if label.is_empty() {
                        label = "Choose plan".to_string();
                    }
                    html.element("a", &attrs, &label);
                }
                html.close("div");
            }
            html.close("div");
        }
    }
    b.close_section(html, "section");
}

fn faq(html: &mut Html, b: &mut Block) {
    b.open_section(html, "section");
    b.text_element(html, "h2", "headline", "Frequently asked questions");
    if b.has("items") {
        let items = b.list("items");
        if !items.is_empty() {
            let list = b.attrs("items");
            html.open("div", &list);
            let base_id = dom_id(b.component.id.as_str());
            for (i, item) in items.iter().enumerate() {
                let answer_id = format!("faq-{}-{}", base_id, i);
                html.open("div", &Attrs::new());
                let show_answer = b.has("answer");
                if b.has("question") {
                    let mut question = b.attrs("question").with("type", "button");
                    if show_answer {
                        question.set("aria-expanded", "false");
                        question.set("aria-controls", answer_id.as_str());
                        question = question.flag("data-faq-question");
                    }
                    html.element("button", &question, &item_text(item, "question"));
                }
                if show_answer {
                    let answer = b.attrs("answer").with("id", answer_id).flag("hidden");
                    html.element("div", &answer, &item_text(item, "answer"));
                }
                html.close("div");
            }
            html.close("div");
        }
    }
    b.close_section(html, "section");
}

fn cta(html: &mut Html, b: &mut Block) {
    b.open_section(html, "section");
    b.text_element(html, "h2", "headline", "Ready to get started?");
    b.text_element(html, "p", "subheadline", "");
    b.button(html, "button", "buttonText", "Get started");
    b.close_section(html, "section");
}

fn footer(html: &mut Html, b: &mut Block) {
    b.open_section(html, "footer");
    b.text_element(html, "div", "companyName", "");
    if b.has("links") {
        let links = b.list("links");
        if !links.is_empty() {
            let nav = b.attrs("links");
            html.open("nav", &nav);
            for link in links {
                let url = item_text(link, "url");
                let href = safe_url(if url.is_empty() { "#" } else { &url });
                html.element("a", &Attrs::new().with("href", href), &item_text(link, "label"));
            }
            html.close("nav");
        }
    }
    b.text_element(html, "p", "copyright", "");
    b.close_section(html, "footer");
}

/// Fallback for variations whose type has no dedicated renderer.
fn generic(html: &mut Html, b: &mut Block) {
    b.open_section(html, "section");
    for (tag, key) in [("h2", "headline"), ("p", "subheadline")] {
        if !b.spec.element_visible(b.component, key) {
            continue;
        }
        let text = b.text(key, "");
        if !text.is_empty() {
            let attrs = b.attrs(key);
            html.element(tag, &attrs, &text);
        }
    }
    b.close_section(html, "section");
}

/// Render a resolvable component.
pub(super) fn render(html: &mut Html, block: &mut Block) {
    match block.spec.metadata.component_type.as_str() {
        "hero" => hero(html, block),
        "features" => features(html, block),
        "testimonials" => testimonials(html, block),
        "pricing" => pricing(html, block),
        "faq" => faq(html, block),
        "cta" => cta(html, block),
        "footer" => footer(html, block),
        _ => generic(html, block),
    }
}

/// Visible stand-in for a component whose variation is not in the vocabulary.
pub(super) fn placeholder(html: &mut Html, component: &ComponentInstance) {
    let attrs = Attrs::new()
        .with("class", "pc-placeholder")
        .with("role", "alert")
        .with("data-missing-variation", component.variation.to_string());
    html.open("section", &attrs);
    html.element(
        "p",
        &Attrs::new(),
        &format!(
            "Component not found: {} (variation {})",
            component.variation.component_type, component.variation.variation_number
        ),
    );
    html.close("section");
}

/// Call-to-action shown when a page has no components.
pub(super) fn empty_page(html: &mut Html) {
    html.open("section", &Attrs::new().with("class", "pc-empty"));
    html.element("h1", &Attrs::new(), "This page has no content yet");
    html.element("p", &Attrs::new(), "Add a component in the editor to start building your page.");
    html.close("section");
}
