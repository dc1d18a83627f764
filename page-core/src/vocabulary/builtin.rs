//! The built-in component library.

use pagecraft_types::{ComponentVariationMetadata, ContentMap, VisibilityKey};
use serde_json::{json, Value};

use super::VariationSpec;

fn metadata(
    component_type: &str,
    variation_number: u32,
    keys: &[(&str, &str)],
    defaults: Value,
) -> ComponentVariationMetadata {
    let default_content: ContentMap = match defaults {
        Value::Object(map) => map.into_iter().collect(),
        _ => ContentMap::new(),
    };
    ComponentVariationMetadata {
        component_type: component_type.to_string(),
        variation_number,
        visibility_keys: keys.iter().map(|(k, l)| VisibilityKey::new(k, l)).collect(),
        default_content,
        required_images: Vec::new(),
        supports_video: false,
    }
}

fn hero_centered() -> VariationSpec {
    VariationSpec::new(metadata(
        "hero",
        1,
        &[("headline", "Headline"), ("subheadline", "Subheadline")],
        json!({
            "headline": "Build something people want",
            "subheadline": "Launch your idea with a page that converts."
        }),
    ))
    .element("container", "px-4 py-16 text-center", "md:py-24", "")
    .element("headline", "text-4xl font-bold text-gray-900", "md:text-5xl", "lg:text-6xl")
    .element("subheadline", "mt-4 text-lg text-gray-600", "md:text-xl", "")
}

fn hero_split() -> VariationSpec {
    let mut meta = metadata(
        "hero",
        2,
        &[
            ("headline", "Headline"),
            ("subheadline", "Subheadline"),
            ("button", "Button"),
            ("image", "Image"),
        ],
        json!({
            "headline": "Your product, front and center",
            "subheadline": "Show it off next to the words that sell it.",
            "buttonText": "Get started"
        }),
    );
    meta.required_images = vec!["image".to_string()];
    meta.supports_video = true;

    VariationSpec::new(meta)
        .element("container", "px-4 py-16 grid grid-cols-1 gap-8 items-center", "md:grid-cols-2 md:py-24", "lg:px-8")
        .element("headline", "text-4xl font-extrabold tracking-tight", "md:text-5xl", "")
        .element("subheadline", "mt-4 text-lg text-gray-600", "", "lg:text-xl")
        .element("button", "mt-8 inline-block px-6 py-3 rounded-lg bg-primary text-white font-semibold", "", "")
        .element("image", "w-full rounded-xl shadow-lg", "", "")
}

fn features_grid() -> VariationSpec {
    VariationSpec::new(metadata(
        "features",
        1,
        &[("headline", "Headline"), ("subheadline", "Subheadline"), ("items", "Feature list")],
        json!({
            "headline": "Everything you need",
            "subheadline": "Features that help you ship faster.",
            "items": [
                {"title": "Fast", "description": "Pages load in the blink of an eye."},
                {"title": "Flexible", "description": "Mix and match sections freely."},
                {"title": "Friendly", "description": "No code required."}
            ]
        }),
    ))
    .element("container", "px-4 py-16", "md:py-24", "")
    .element("headline", "text-3xl font-bold text-center", "md:text-4xl", "")
    .element("subheadline", "mt-4 text-center text-gray-600", "", "")
    .element("items", "mt-12 grid grid-cols-1 gap-8", "md:grid-cols-2", "lg:grid-cols-3")
    .child("items", "item", "p-6 rounded-lg bg-white shadow", "", "")
    .child("item", "itemTitle", "text-xl font-semibold", "", "")
    .child("item", "itemDescription", "mt-2 text-gray-600", "", "")
}

fn testimonials_cards() -> VariationSpec {
    VariationSpec::new(metadata(
        "testimonials",
        1,
        &[("headline", "Headline"), ("items", "Testimonials")],
        json!({
            "headline": "Loved by our customers",
            "items": [
                {"quote": "It changed how we launch.", "author": "Alex", "role": "Founder"}
            ]
        }),
    ))
    .element("container", "px-4 py-16 bg-gray-50", "md:py-24", "")
    .element("headline", "text-3xl font-bold text-center", "md:text-4xl", "")
    .element("items", "mt-12 grid grid-cols-1 gap-8", "md:grid-cols-2", "lg:grid-cols-3")
    .child("items", "quote", "p-6 rounded-lg bg-white shadow italic", "", "")
    .child("quote", "author", "mt-4 font-semibold", "", "")
    .child("quote", "role", "text-sm text-gray-500", "", "")
}

fn pricing_tiers() -> VariationSpec {
    VariationSpec::new(metadata(
        "pricing",
        1,
        &[("headline", "Headline"), ("subheadline", "Subheadline"), ("plans", "Plans")],
        json!({
            "headline": "Simple pricing",
            "subheadline": "Pick the plan that fits.",
            "plans": [
                {"name": "Starter", "price": "$0", "period": "/month", "features": ["1 page"], "buttonText": "Start free"},
                {"name": "Pro", "price": "$19", "period": "/month", "features": ["Unlimited pages", "Custom domain"], "buttonText": "Go Pro"}
            ]
        }),
    ))
    .element("container", "px-4 py-16", "md:py-24", "")
    .element("headline", "text-3xl font-bold text-center", "md:text-4xl", "")
    .element("subheadline", "mt-4 text-center text-gray-600", "", "")
    .element("plans", "mt-12 grid grid-cols-1 gap-8", "md:grid-cols-3", "")
    .child("plans", "plan", "p-8 rounded-xl border border-gray-200 bg-white", "", "")
    .child("plan", "price", "mt-4 text-4xl font-bold", "", "")
    .child("plan", "planButton", "mt-8 block w-full px-6 py-3 rounded-lg bg-primary text-white font-semibold text-center", "", "")
}

fn faq_accordion() -> VariationSpec {
    VariationSpec::new(metadata(
        "faq",
        1,
        &[("headline", "Headline"), ("items", "Questions")],
        json!({
            "headline": "Frequently asked questions",
            "items": [
                {"question": "Can I cancel anytime?", "answer": "Yes, there are no contracts."}
            ]
        }),
    ))
    .element("container", "px-4 py-16 max-w-3xl mx-auto", "md:py-24", "")
    .element("headline", "text-3xl font-bold text-center", "md:text-4xl", "")
    .element("items", "mt-12", "", "")
    .child("items", "question", "w-full py-4 text-left font-semibold border-b border-gray-200", "", "")
    .child("items", "answer", "py-4 text-gray-600", "", "")
}

fn cta_banner() -> VariationSpec {
    VariationSpec::new(metadata(
        "cta",
        1,
        &[("headline", "Headline"), ("subheadline", "Subheadline"), ("button", "Button")],
        json!({
            "headline": "Ready to get started?",
            "subheadline": "Join thousands of happy customers.",
            "buttonText": "Sign up now"
        }),
    ))
    .element("container", "px-4 py-16 text-center bg-primary text-white", "md:py-24", "")
    .element("headline", "text-3xl font-bold", "md:text-4xl", "")
    .element("subheadline", "mt-4 text-lg", "", "")
    .element("button", "mt-8 inline-block px-8 py-4 rounded-lg bg-white text-primary font-semibold", "", "")
}

fn cta_inline() -> VariationSpec {
    VariationSpec::new(metadata(
        "cta",
        2,
        &[("headline", "Headline"), ("button", "Button")],
        json!({
            "headline": "Questions? We are here to help.",
            "buttonText": "Contact us"
        }),
    ))
    .element("container", "px-4 py-12 flex flex-col gap-6 items-center", "md:flex-row md:justify-between", "lg:px-16")
    .element("headline", "text-2xl font-bold", "md:text-3xl", "")
    .element("button", "px-6 py-3 rounded-lg bg-secondary text-white font-semibold", "", "")
    .default_style("container", "backgroundColor", "#f3f4f6")
}

fn footer_simple() -> VariationSpec {
    VariationSpec::new(metadata(
        "footer",
        1,
        &[("companyName", "Company name"), ("links", "Links"), ("copyright", "Copyright")],
        json!({
            "companyName": "Your Company",
            "links": [{"label": "Privacy", "url": "/privacy"}, {"label": "Terms", "url": "/terms"}],
            "copyright": "All rights reserved."
        }),
    ))
    .element("container", "px-4 py-8 bg-gray-900 text-gray-400 text-sm", "md:flex md:justify-between md:items-center", "")
    .element("companyName", "font-semibold text-white", "", "")
    .element("links", "mt-4 flex flex-wrap gap-4", "md:mt-0", "")
    .element("copyright", "mt-4", "md:mt-0", "")
}

/// Every built-in variation.
pub(super) fn variations() -> Vec<VariationSpec> {
    vec![
        hero_centered(),
        hero_split(),
        features_grid(),
        testimonials_cards(),
        pricing_tiers(),
        faq_accordion(),
        cta_banner(),
        cta_inline(),
        footer_simple(),
    ]
}
