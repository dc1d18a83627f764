//! Validate a page file.

use std::path::Path;

use anyhow::Result;
use pagecraft_core::compiler::styles::validate_style_map;
use pagecraft_core::{normalize_order, StyleVocabulary};
use pagecraft_types::PageDocument;

use super::load_page;

/// Run the check command.
///
/// Load-time fixes (legacy migration, order re-sequencing) are reported as
/// notes. Anything the compiler would have to degrade is an issue, and any
/// issue makes the command fail.
pub async fn run(page_path: &Path) -> Result<()> {
    let (mut document, report) = load_page(page_path).await?;
    let mut notes = Vec::new();

    for (id, variation) in &report.recovered {
        notes.push(format!("component {}: variation {} recovered from legacy id", id, variation));
    }
    if report.filled_order > 0 {
        notes.push(format!("{} component(s) had no orderIndex", report.filled_order));
    }
    if report.assigned_ids > 0 {
        notes.push(format!("{} component(s) had no id", report.assigned_ids));
    }
    if report.renamed_tracking {
        notes.push("trackingConfig renamed to tracking".to_string());
    }
    let order = normalize_order(&mut document.components);
    if order.changed() {
        notes.push(format!("order re-sequenced ({} component(s) renumbered)", order.resequenced));
    }

    let mut issues: Vec<String> = report
        .unresolved
        .iter()
        .map(|id| format!("component {}: variation could not be recovered", id))
        .collect();
    issues.extend(component_issues(&document, &StyleVocabulary::builtin()));

    println!("{} ({} components)", document.slug, document.components.len());
    for note in &notes {
        println!("  note:  {}", note);
    }
    for issue in &issues {
        println!("  issue: {}", issue);
    }
    if issues.is_empty() {
        println!("OK");
        Ok(())
    } else {
        anyhow::bail!("{} issue(s) found", issues.len())
    }
}

fn component_issues(document: &PageDocument, vocabulary: &StyleVocabulary) -> Vec<String> {
    let mut issues = Vec::new();
    for component in document.ordered_components() {
        let id = &component.id;
        let Some(spec) = vocabulary.get(&component.variation) else {
            issues.push(format!("component {}: unknown variation {}", id, component.variation));
            continue;
        };
        for (element, styles) in &component.style_overrides {
            if !spec.class_map.contains_key(element) {
                issues.push(format!("component {}: style override on unknown element {:?}", id, element));
            }
            if let Err(e) = validate_style_map(styles) {
                issues.push(format!("component {}: {} on {:?}", id, e, element));
            }
        }
        for key in component.visibility.keys() {
            if !spec.metadata.declares(key) && !spec.class_map.contains_key(key) {
                issues.push(format!("component {}: visibility for unknown element {:?}", id, key));
            }
        }
    }
    issues
}
