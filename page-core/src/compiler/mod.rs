//! Page compiler.
//!
//! `compile(document, vocabulary)` produces the three artifact files:
//!
//! - markup: one block per component in `order_index` order, with SEO head
//! - stylesheet: the tree-shaken CSS for the visible elements
//! - script: the action dispatcher plus analytics bootstrap
//!
//! A component whose variation cannot be resolved degrades to a visible
//! placeholder; compilation itself never fails. Identical input yields
//! byte-identical output.

mod blocks;
pub mod content;
pub mod markup;
pub mod script;
pub mod styles;

use pagecraft_types::{CompiledArtifact, ComponentId, PageDocument, VariationRef};
use thiserror::Error;

use crate::shaker::shake;
use crate::vocabulary::StyleVocabulary;
use crate::StyleError;
use blocks::Block;
use markup::{safe_url, Attrs, Html};

/// Why a component rendered in degraded form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DegradeReason {
    /// The variation is not in the vocabulary; a placeholder was emitted.
    #[error("variation {0} not found")]
    UnknownVariation(VariationRef),

    /// An element's style override was invalid and ignored.
    #[error("style override on {element} ignored: {error}")]
    InvalidStyle {
        /// Element whose override was dropped.
        element: String,
        /// What was wrong with it.
        error: StyleError,
    },
}

/// A non-fatal compile problem for one component.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("component {component_id} degraded: {reason}")]
pub struct CompileDegraded {
    /// The affected component.
    pub component_id: ComponentId,
    /// What went wrong.
    pub reason: DegradeReason,
}

/// Compiler output plus everything that was degraded along the way.
#[derive(Debug, Clone)]
pub struct Compilation {
    /// The compiled files.
    pub artifact: CompiledArtifact,
    /// Degraded components, in render order.
    pub diagnostics: Vec<CompileDegraded>,
}

/// Compile a document, discarding diagnostics.
pub fn compile(document: &PageDocument, vocabulary: &StyleVocabulary) -> CompiledArtifact {
    compile_with_diagnostics(document, vocabulary).artifact
}

/// Compile a document and report degraded components.
pub fn compile_with_diagnostics(document: &PageDocument, vocabulary: &StyleVocabulary) -> Compilation {
    let mut diagnostics = Vec::new();
    let markup = render_markup(document, vocabulary, &mut diagnostics);
    let stylesheet = shake(document, vocabulary);
    let script = script::build_script(document);
    Compilation {
        artifact: CompiledArtifact::new(markup, stylesheet, script),
        diagnostics,
    }
}

fn render_head(html: &mut Html, document: &PageDocument) {
    let seo = &document.seo;
    let title = if seo.title.trim().is_empty() {
        document.slug.as_str()
    } else {
        seo.title.trim()
    };

    html.raw("<head>");
    html.void("meta", &Attrs::new().with("charset", "utf-8"));
    html.void(
        "meta",
        &Attrs::new()
            .with("name", "viewport")
            .with("content", "width=device-width, initial-scale=1"),
    );
    html.element("title", &Attrs::new(), title);
    html.void(
        "meta",
        &Attrs::new().with("name", "description").with("content", seo.description.trim()),
    );
    let keywords: Vec<&str> = seo
        .keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .collect();
    if !keywords.is_empty() {
        html.void(
            "meta",
            &Attrs::new().with("name", "keywords").with("content", keywords.join(", ")),
        );
    }

    let canonical = match (&seo.canonical_url, &document.custom_domain) {
        (Some(url), _) if !url.trim().is_empty() => Some(safe_url(url)),
        (_, Some(domain)) if !domain.trim().is_empty() => Some(format!("https://{}/", domain.trim())),
        _ => None,
    };
    if let Some(canonical) = &canonical {
        html.void("link", &Attrs::new().with("rel", "canonical").with("href", canonical.as_str()));
        html.void("meta", &Attrs::new().with("property", "og:url").with("content", canonical.as_str()));
    }

    html.void("meta", &Attrs::new().with("property", "og:type").with("content", "website"));
    html.void("meta", &Attrs::new().with("property", "og:title").with("content", title));
    html.void(
        "meta",
        &Attrs::new().with("property", "og:description").with("content", seo.description.trim()),
    );
    match seo.social_image.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(image) => {
            html.void("meta", &Attrs::new().with("property", "og:image").with("content", safe_url(image)));
            html.void(
                "meta",
                &Attrs::new().with("name", "twitter:card").with("content", "summary_large_image"),
            );
            html.void("meta", &Attrs::new().with("name", "twitter:image").with("content", safe_url(image)));
        }
        None => {
            html.void("meta", &Attrs::new().with("name", "twitter:card").with("content", "summary"));
        }
    }
    html.void("link", &Attrs::new().with("rel", "stylesheet").with("href", "styles.css"));
    html.raw("</head>");
}

fn render_markup(
    document: &PageDocument,
    vocabulary: &StyleVocabulary,
    diagnostics: &mut Vec<CompileDegraded>,
) -> String {
    let mut html = Html::new();
    html.raw("<!DOCTYPE html>");
    html.newline();
    html.open(
        "html",
        &Attrs::new()
            .with("lang", document.theme.language.trim())
            .with("dir", document.theme.direction.as_str()),
    );
    render_head(&mut html, document);
    html.newline();
    html.raw("<body><main>");

    let components = document.ordered_components();
    if components.is_empty() {
        html.newline();
        blocks::empty_page(&mut html);
    }
    for component in components {
        html.newline();
        match vocabulary.get(&component.variation) {
            Some(spec) => {
                let mut block = Block::new(component, spec, &document.theme, diagnostics);
                blocks::render(&mut html, &mut block);
            }
            None => {
                diagnostics.push(CompileDegraded {
                    component_id: component.id.clone(),
                    reason: DegradeReason::UnknownVariation(component.variation.clone()),
                });
                blocks::placeholder(&mut html, component);
            }
        }
    }

    html.newline();
    html.raw("</main>");
    html.open("script", &Attrs::new().with("src", "app.js").flag("defer"));
    html.close("script");
    html.raw("</body></html>");
    html.newline();
    html.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::move_component;
    use crate::vocabulary::VariationSpec;
    use pagecraft_types::{
        ComponentInstance, ComponentVariationMetadata, CustomAction, PageId, TextDirection,
    };
    use serde_json::json;

    fn page() -> PageDocument {
        let mut doc = PageDocument::new(PageId::new(), "launch");
        doc.seo.title = "Launch".into();
        doc
    }

    fn component(id: &str, component_type: &str, variation: u32, order: i64) -> ComponentInstance {
        ComponentInstance::new(
            ComponentId::parse(id).unwrap(),
            VariationRef::new(component_type, variation),
            order,
        )
    }

    fn position(haystack: &str, needle: &str) -> usize {
        haystack
            .find(needle)
            .unwrap_or_else(|| panic!("{:?} not found", needle))
    }

    // ===========================================
    // End-to-End Tests
    // ===========================================

    #[test]
    fn hero_scenario() {
        let mut doc = page();
        doc.components.push(
            component("hero-1", "hero", 1, 1)
                .with_content("headline", "Hello")
                .with_visibility("subheadline", false),
        );
        let vocabulary = StyleVocabulary::builtin();
        let compilation = compile_with_diagnostics(&doc, &vocabulary);
        let artifact = &compilation.artifact;

        assert!(compilation.diagnostics.is_empty());
        assert!(artifact.markup().contains(">Hello</h1>"));
        assert!(!artifact.markup().contains("data-element=\"subheadline\""));
        assert!(!artifact.markup().contains("Launch your idea"));

        let css = artifact.stylesheet();
        let spec = vocabulary.get(&VariationRef::new("hero", 1)).unwrap();
        for element in ["container", "headline"] {
            for token in spec.class_map[element].tokens() {
                let selector = format!(".{}{{", crate::vocabulary::escape_selector(token));
                assert!(css.contains(&selector), "missing {}", selector);
            }
        }
        for token in ["mt-4", "text-lg", "text-gray-600", "md:text-xl"] {
            let selector = format!(".{}{{", crate::vocabulary::escape_selector(token));
            assert!(!css.contains(&selector), "unexpected {}", selector);
        }
    }

    #[test]
    fn compile_is_deterministic() {
        let mut doc = page();
        doc.components.push(component("a", "features", 1, 1));
        doc.components.push(component("b", "pricing", 1, 2));
        doc.components.push(component("c", "faq", 1, 3));
        doc.tracking.insert("googleAnalyticsId".into(), "G-1".into());
        let vocabulary = StyleVocabulary::builtin();
        assert_eq!(compile(&doc, &vocabulary), compile(&doc, &vocabulary));
    }

    #[test]
    fn every_builtin_variation_renders() {
        let vocabulary = StyleVocabulary::builtin();
        let mut doc = page();
        for (i, spec) in vocabulary.variations().enumerate() {
            let v = spec.variation();
            doc.components.push(component(
                &format!("c{}", i),
                &v.component_type,
                v.variation_number,
                i as i64,
            ));
        }
        let compilation = compile_with_diagnostics(&doc, &vocabulary);
        assert!(compilation.diagnostics.is_empty());
        let markup = compilation.artifact.markup();
        for spec in vocabulary.variations() {
            assert!(markup.contains(&format!(
                "data-component=\"{}\" data-variation=\"{}\"",
                spec.metadata.component_type, spec.metadata.variation_number
            )));
        }
        assert!(markup.contains("Everything you need"));
        assert!(markup.contains("Can I cancel anytime?"));
        assert!(markup.contains("<footer"));
    }

    // ===========================================
    // Degradation Tests
    // ===========================================

    #[test]
    fn unknown_variation_becomes_placeholder() {
        let mut doc = page();
        doc.components.push(component("ok", "cta", 1, 1));
        doc.components.push(component("bad", "carousel", 4, 2));
        doc.components.push(component("ok2", "footer", 1, 3));

        let compilation = compile_with_diagnostics(&doc, &StyleVocabulary::builtin());
        let markup = compilation.artifact.markup();

        assert!(markup.contains("Component not found: carousel (variation 4)"));
        assert!(markup.contains("data-component=\"footer\""));
        assert_eq!(compilation.diagnostics.len(), 1);
        assert_eq!(
            compilation.diagnostics[0].reason,
            DegradeReason::UnknownVariation(VariationRef::new("carousel", 4))
        );
    }

    #[test]
    fn migrated_unknown_variation_degrades() {
        let mut doc = page();
        doc.components.push(ComponentInstance::new(
            ComponentId::parse("0b3f").unwrap(),
            VariationRef::unknown(),
            0,
        ));
        let markup = compile(&doc, &StyleVocabulary::builtin()).markup().to_string();
        assert!(markup.contains("pc-placeholder"));
    }

    #[test]
    fn invalid_style_is_dropped_and_reported() {
        let mut doc = page();
        doc.components.push(
            component("h", "hero", 1, 0)
                .with_style("headline", "color", "red;}body{display:none")
                .with_style("container", "padding", "2rem"),
        );
        let compilation = compile_with_diagnostics(&doc, &StyleVocabulary::builtin());
        let markup = compilation.artifact.markup();
        assert!(!markup.contains("display:none"));
        assert!(markup.contains("padding:2rem"));
        assert!(matches!(
            compilation.diagnostics[0].reason,
            DegradeReason::InvalidStyle { ref element, .. } if element == "headline"
        ));
    }

    #[test]
    fn empty_document_has_call_to_action() {
        let artifact = compile(&page(), &StyleVocabulary::builtin());
        assert!(artifact.markup().starts_with("<!DOCTYPE html>"));
        assert!(artifact.markup().contains("Add a component"));
        assert!(artifact.markup().contains("</html>"));
        assert!(artifact.stylesheet().contains(".pc-empty{"));
    }

    // ===========================================
    // Rendering Rule Tests
    // ===========================================

    #[test]
    fn visibility_defaults_to_visible() {
        let mut doc = page();
        doc.components.push(component("h", "hero", 2, 0).with_media("image", "https://x/y.png"));
        let markup = compile(&doc, &StyleVocabulary::builtin()).markup().to_string();
        for element in ["headline", "subheadline", "button", "image"] {
            assert!(markup.contains(&format!("data-element=\"{}\"", element)), "{}", element);
        }
    }

    fn markup_classes(markup: &str) -> std::collections::BTreeSet<String> {
        markup
            .split("class=\"")
            .skip(1)
            .filter_map(|rest| rest.split('"').next())
            .flat_map(|value| value.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .collect()
    }

    #[test]
    fn hidden_card_children_are_not_rendered() {
        let mut doc = page();
        doc.components
            .push(component("f", "features", 1, 0).with_visibility("itemTitle", false));
        doc.components
            .push(component("t", "testimonials", 1, 1).with_visibility("author", false));
        doc.components
            .push(component("p", "pricing", 1, 2).with_visibility("planButton", false));
        doc.components.push(component("q", "faq", 1, 3).with_visibility("answer", false));
        let artifact = compile(&doc, &StyleVocabulary::builtin());
        let markup = artifact.markup();

        for element in ["itemTitle", "author", "planButton", "answer"] {
            assert!(!markup.contains(&format!("data-element=\"{}\"", element)), "{}", element);
        }
        assert!(markup.contains("data-element=\"item\""));
        assert!(markup.contains("data-element=\"itemDescription\""));
        assert!(markup.contains("data-element=\"question\""));
        assert!(!markup.contains("data-faq-question"));
        assert!(!artifact.stylesheet().contains(".text-xl{"));
    }

    #[test]
    fn hidden_card_hides_its_contents() {
        let mut doc = page();
        doc.components.push(component("p", "pricing", 1, 0).with_visibility("plan", false));
        let markup = compile(&doc, &StyleVocabulary::builtin()).markup().to_string();
        for element in ["plan", "price", "planButton"] {
            assert!(!markup.contains(&format!("data-element=\"{}\"", element)), "{}", element);
        }
        assert!(markup.contains("data-element=\"plans\""));
    }

    #[test]
    fn every_markup_class_has_a_rule() {
        let mut doc = page();
        doc.components.push(
            component("f", "features", 1, 0)
                .with_visibility("itemTitle", false)
                .with_visibility("itemDescription", false),
        );
        doc.components.push(
            component("t", "testimonials", 1, 1)
                .with_visibility("author", false)
                .with_visibility("role", false),
        );
        doc.components.push(component("p", "pricing", 1, 2).with_visibility("price", false));
        doc.components.push(component("q", "faq", 1, 3).with_visibility("question", false));
        let artifact = compile(&doc, &StyleVocabulary::builtin());
        let css = artifact.stylesheet();

        for token in markup_classes(artifact.markup()) {
            if token.starts_with("pc-") {
                continue;
            }
            let selector = format!(".{}{{", crate::vocabulary::escape_selector(&token));
            assert!(css.contains(&selector), "no rule for {}", token);
        }
    }

    #[test]
    fn style_precedence_override_wins() {
        let mut doc = page();
        doc.theme.background_color = "#fff".into();
        doc.components
            .push(component("h", "hero", 1, 0).with_style("container", "backgroundColor", "#000"));
        let markup = compile(&doc, &StyleVocabulary::builtin()).markup().to_string();
        assert!(markup.contains("style=\"background-color:#000\""));
        assert!(!markup.contains("background-color:#fff"));
    }

    #[test]
    fn reorder_changes_markup_order() {
        let mut doc = page();
        doc.components.push(component("one", "cta", 1, 1).with_content("headline", "First"));
        doc.components.push(component("two", "cta", 2, 2).with_content("headline", "Second"));
        doc.components.push(component("three", "footer", 1, 3));
        let vocabulary = StyleVocabulary::builtin();

        let before = compile(&doc, &vocabulary).markup().to_string();
        assert!(position(&before, "First") < position(&before, "Second"));

        move_component(&mut doc.components, 0, 1);
        let orders: Vec<i64> = doc.components.iter().map(|c| c.order_index).collect();
        assert_eq!(orders, vec![1, 2, 3]);
        assert_eq!(doc.components[0].id.as_str(), "two");

        let after = compile(&doc, &vocabulary).markup().to_string();
        assert!(position(&after, "Second") < position(&after, "First"));
    }

    #[test]
    fn actions_become_data_attributes() {
        let mut checkout = CustomAction::new("checkout");
        checkout.url = Some("https://pay.example.com/s/1".into());
        checkout.amount = Some(19.5);
        checkout.currency = Some("EUR".into());
        let mut doc = page();
        doc.components.push(component("c", "cta", 1, 0).with_action("button", checkout));
        doc.components.push(
            component("d", "cta", 2, 1).with_action("button", CustomAction::new("teleport")),
        );
        let markup = compile(&doc, &StyleVocabulary::builtin()).markup().to_string();
        assert!(markup.contains("data-action=\"checkout\""));
        assert!(markup.contains("data-action-url=\"https://pay.example.com/s/1\""));
        assert!(markup.contains("data-action-amount=\"19.5\""));
        assert!(markup.contains("data-action-currency=\"EUR\""));
        // Unknown types are emitted and left to the runtime to ignore.
        assert!(markup.contains("data-action=\"teleport\""));
    }

    #[test]
    fn modal_action_emits_dialog() {
        let mut doc = page();
        doc.components.push(
            component("c", "cta", 1, 0)
                .with_content("modalTitle", "Join the waitlist")
                .with_action("button", CustomAction::new("modal")),
        );
        let markup = compile(&doc, &StyleVocabulary::builtin()).markup().to_string();
        assert!(markup.contains("data-action-target=\"modal-c-button\""));
        assert!(markup.contains("id=\"modal-c-button\" role=\"dialog\""));
        assert!(markup.contains("Join the waitlist"));
    }

    #[test]
    fn content_is_escaped() {
        let mut doc = page();
        doc.components.push(
            component("h", "hero", 1, 0).with_content("headline", "<script>alert(1)</script>"),
        );
        let markup = compile(&doc, &StyleVocabulary::builtin()).markup().to_string();
        assert!(markup.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[test]
    fn head_carries_seo_and_direction() {
        let mut doc = page();
        doc.seo.description = "Best launch".into();
        doc.seo.keywords = vec!["launch".into(), "".into(), "product".into()];
        doc.seo.social_image = Some("https://cdn.example.com/og.png".into());
        doc.custom_domain = Some("launch.example.com".into());
        doc.theme.direction = TextDirection::Rtl;
        doc.theme.language = "ar".into();

        let markup = compile(&doc, &StyleVocabulary::builtin()).markup().to_string();
        assert!(markup.contains("<html lang=\"ar\" dir=\"rtl\">"));
        assert!(markup.contains("<title>Launch</title>"));
        assert!(markup.contains("content=\"launch, product\""));
        assert!(markup.contains("<link rel=\"canonical\" href=\"https://launch.example.com/\">"));
        assert!(markup.contains("summary_large_image"));
    }

    #[test]
    fn generic_renderer_for_custom_types() {
        let mut default_content = pagecraft_types::ContentMap::new();
        default_content.insert("headline".into(), json!("Numbers that matter"));
        let mut vocabulary = StyleVocabulary::builtin();
        vocabulary.insert(
            VariationSpec::new(ComponentVariationMetadata {
                component_type: "stats".into(),
                variation_number: 1,
                visibility_keys: vec![],
                default_content,
                required_images: vec![],
                supports_video: false,
            })
            .element("container", "py-16", "", ""),
        );
        let mut doc = page();
        doc.components.push(component("s", "stats", 1, 0).with_content("subheadline", "Up and to the right"));
        let compilation = compile_with_diagnostics(&doc, &vocabulary);
        let markup = compilation.artifact.markup();
        assert!(compilation.diagnostics.is_empty());
        assert!(markup.contains("Numbers that matter"));
        assert!(markup.contains("Up and to the right"));
    }
}
