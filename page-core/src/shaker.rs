//! Style tree-shaker.
//!
//! Walks a document, collects the class tokens of every visible element
//! across all viewports, and emits only the rules those tokens need:
//!
//! ```text
//! base reset + :root theme variables + base rules + @media blocks (ascending)
//! ```
//!
//! Rules inside each group are sorted by token, so the output depends only
//! on the set of tokens and the theme. Cannot fail.

use pagecraft_types::{PageDocument, Theme};
use std::collections::{BTreeMap, BTreeSet};

use crate::vocabulary::{resolve_token, Breakpoint, StyleVocabulary};

/// Structural rules every page needs, including the classes the compiler
/// emits for placeholders, the empty page, FAQ and modals.
const BASE_RESET: &str = r#"
/* reset */
*, ::before, ::after { box-sizing: border-box; margin: 0; padding: 0; border: 0 solid; }
html { line-height: 1.5; -webkit-text-size-adjust: 100%; }
body { font-family: var(--font-family); background-color: var(--color-background); color: #111827; }
img, video { display: block; max-width: 100%; height: auto; }
a { color: inherit; text-decoration: inherit; }
button { font: inherit; color: inherit; background: none; cursor: pointer; }
ul { list-style: none; }
[hidden] { display: none !important; }

/* compiler structural classes */
.pc-placeholder { padding: 2rem 1rem; margin: 1rem; border: 2px dashed #ef4444; color: #ef4444; text-align: center; }
.pc-empty { min-height: 60vh; display: flex; flex-direction: column; align-items: center; justify-content: center; gap: 1rem; text-align: center; padding: 2rem; }
.pc-modal { position: fixed; inset: 0; display: flex; align-items: center; justify-content: center; background-color: rgba(0, 0, 0, 0.5); }
.pc-modal-panel { background-color: #ffffff; padding: 2rem; border-radius: 0.5rem; max-width: 32rem; }
"#;

/// Collect every class token referenced by a visible element of a
/// resolvable component.
pub fn collect_tokens(document: &PageDocument, vocabulary: &StyleVocabulary) -> BTreeSet<String> {
    let mut tokens = BTreeSet::new();
    for component in &document.components {
        let Some(spec) = vocabulary.get(&component.variation) else {
            continue;
        };
        for element in spec.visible_elements(component) {
            if let Some(classes) = spec.class_map.get(element) {
                tokens.extend(classes.tokens().into_iter().map(str::to_string));
            }
        }
    }
    tokens
}

/// `:root` custom properties derived from the theme.
pub fn theme_variables(theme: &Theme) -> String {
    format!(
        ":root{{--color-primary:{};--color-secondary:{};--color-background:{};--font-family:{}}}",
        sanitize_value(&theme.primary_color),
        sanitize_value(&theme.secondary_color),
        sanitize_value(&theme.background_color),
        sanitize_value(&theme.font_family),
    )
}

/// Generated rules for a token set: base rules first, then one media block
/// per breakpoint in ascending width. Unknown tokens are dropped.
pub fn generate_rules<'a>(tokens: impl IntoIterator<Item = &'a str>) -> String {
    let mut base: BTreeMap<&str, String> = BTreeMap::new();
    let mut responsive: BTreeMap<Breakpoint, BTreeMap<&str, String>> = BTreeMap::new();

    for token in tokens {
        let Some(resolved) = resolve_token(token) else {
            continue;
        };
        match resolved.breakpoint {
            None => {
                base.insert(token, resolved.rule);
            }
            Some(bp) => {
                responsive.entry(bp).or_default().insert(token, resolved.rule);
            }
        }
    }

    let mut out: String = base.into_values().collect();
    for (bp, rules) in responsive {
        out.push_str(&format!("@media (min-width:{}px){{", bp.min_width_px()));
        out.extend(rules.into_values());
        out.push('}');
    }
    out
}

/// Emit the minimal stylesheet for a document.
pub fn shake(document: &PageDocument, vocabulary: &StyleVocabulary) -> String {
    let tokens = collect_tokens(document, vocabulary);
    let mut css = String::new();
    css.push_str(BASE_RESET);
    css.push_str(&theme_variables(&document.theme));
    css.push_str(&generate_rules(tokens.iter().map(String::as_str)));
    minify(&css)
}

/// Strip characters that could break out of a declaration.
pub(crate) fn sanitize_value(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, ';' | '{' | '}' | '<' | '>' | '"' | '\\'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Remove comments and insignificant whitespace.
pub fn minify(css: &str) -> String {
    let mut without_comments = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        without_comments.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => {
                rest = "";
                break;
            }
        }
    }
    without_comments.push_str(rest);

    let mut out = String::with_capacity(without_comments.len());
    let mut pending_space = false;
    for c in without_comments.chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            let prev = out.chars().last();
            let tight = |ch: char| matches!(ch, '{' | '}' | ';' | ':' | ',' | '>');
            if prev.is_some_and(|p| !tight(p)) && !tight(c) {
                out.push(' ');
            }
            pending_space = false;
        }
        if c == '}' && out.ends_with(';') {
            out.pop();
        }
        out.push(c);
    }
    out
}
