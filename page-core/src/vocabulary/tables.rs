//! Token → declaration lookup tables.
//!
//! Every value comes from a fixed table; nothing is computed from the token
//! text, so a token either maps to exactly one declaration block or to none.

/// Spacing scale shared by padding, margin and gap utilities.
const SPACING: &[(&str, &str)] = &[
    ("0", "0"),
    ("px", "1px"),
    ("1", "0.25rem"),
    ("2", "0.5rem"),
    ("3", "0.75rem"),
    ("4", "1rem"),
    ("5", "1.25rem"),
    ("6", "1.5rem"),
    ("8", "2rem"),
    ("10", "2.5rem"),
    ("12", "3rem"),
    ("16", "4rem"),
    ("20", "5rem"),
    ("24", "6rem"),
    ("32", "8rem"),
];

/// Spacing utility prefix → CSS properties it sets.
const SPACING_PROPERTIES: &[(&str, &[&str])] = &[
    ("p", &["padding"]),
    ("px", &["padding-left", "padding-right"]),
    ("py", &["padding-top", "padding-bottom"]),
    ("pt", &["padding-top"]),
    ("pr", &["padding-right"]),
    ("pb", &["padding-bottom"]),
    ("pl", &["padding-left"]),
    ("m", &["margin"]),
    ("mx", &["margin-left", "margin-right"]),
    ("my", &["margin-top", "margin-bottom"]),
    ("mt", &["margin-top"]),
    ("mr", &["margin-right"]),
    ("mb", &["margin-bottom"]),
    ("ml", &["margin-left"]),
    ("gap", &["gap"]),
    ("gap-x", &["column-gap"]),
    ("gap-y", &["row-gap"]),
];

/// Named colors. Theme colors resolve to custom properties set from the
/// page theme.
const PALETTE: &[(&str, &str)] = &[
    ("primary", "var(--color-primary)"),
    ("secondary", "var(--color-secondary)"),
    ("background", "var(--color-background)"),
    ("transparent", "transparent"),
    ("white", "#ffffff"),
    ("black", "#000000"),
    ("gray-50", "#f9fafb"),
    ("gray-100", "#f3f4f6"),
    ("gray-200", "#e5e7eb"),
    ("gray-300", "#d1d5db"),
    ("gray-400", "#9ca3af"),
    ("gray-500", "#6b7280"),
    ("gray-600", "#4b5563"),
    ("gray-700", "#374151"),
    ("gray-800", "#1f2937"),
    ("gray-900", "#111827"),
    ("blue-500", "#3b82f6"),
    ("blue-600", "#2563eb"),
    ("blue-700", "#1d4ed8"),
    ("indigo-600", "#4f46e5"),
    ("green-500", "#22c55e"),
    ("red-500", "#ef4444"),
    ("yellow-400", "#facc15"),
];

/// Font size scale: (size, line-height).
const FONT_SIZES: &[(&str, &str, &str)] = &[
    ("xs", "0.75rem", "1rem"),
    ("sm", "0.875rem", "1.25rem"),
    ("base", "1rem", "1.5rem"),
    ("lg", "1.125rem", "1.75rem"),
    ("xl", "1.25rem", "1.75rem"),
    ("2xl", "1.5rem", "2rem"),
    ("3xl", "1.875rem", "2.25rem"),
    ("4xl", "2.25rem", "2.5rem"),
    ("5xl", "3rem", "1"),
    ("6xl", "3.75rem", "1"),
];

/// Utilities that map to a fixed declaration block.
const FIXED: &[(&str, &str)] = &[
    // layout
    ("block", "display:block"),
    ("inline-block", "display:inline-block"),
    ("inline", "display:inline"),
    ("flex", "display:flex"),
    ("inline-flex", "display:inline-flex"),
    ("grid", "display:grid"),
    ("hidden", "display:none"),
    ("flex-row", "flex-direction:row"),
    ("flex-col", "flex-direction:column"),
    ("flex-wrap", "flex-wrap:wrap"),
    ("flex-1", "flex:1 1 0%"),
    ("items-start", "align-items:flex-start"),
    ("items-center", "align-items:center"),
    ("items-end", "align-items:flex-end"),
    ("justify-start", "justify-content:flex-start"),
    ("justify-center", "justify-content:center"),
    ("justify-between", "justify-content:space-between"),
    ("justify-end", "justify-content:flex-end"),
    ("grid-cols-1", "grid-template-columns:repeat(1,minmax(0,1fr))"),
    ("grid-cols-2", "grid-template-columns:repeat(2,minmax(0,1fr))"),
    ("grid-cols-3", "grid-template-columns:repeat(3,minmax(0,1fr))"),
    ("grid-cols-4", "grid-template-columns:repeat(4,minmax(0,1fr))"),
    ("w-full", "width:100%"),
    ("h-full", "height:100%"),
    ("min-h-screen", "min-height:100vh"),
    ("max-w-sm", "max-width:24rem"),
    ("max-w-md", "max-width:28rem"),
    ("max-w-lg", "max-width:32rem"),
    ("max-w-xl", "max-width:36rem"),
    ("max-w-2xl", "max-width:42rem"),
    ("max-w-3xl", "max-width:48rem"),
    ("max-w-4xl", "max-width:56rem"),
    ("max-w-5xl", "max-width:64rem"),
    ("max-w-6xl", "max-width:72rem"),
    ("max-w-7xl", "max-width:80rem"),
    ("relative", "position:relative"),
    ("absolute", "position:absolute"),
    ("overflow-hidden", "overflow:hidden"),
    // typography
    ("text-left", "text-align:left"),
    ("text-center", "text-align:center"),
    ("text-right", "text-align:right"),
    ("font-normal", "font-weight:400"),
    ("font-medium", "font-weight:500"),
    ("font-semibold", "font-weight:600"),
    ("font-bold", "font-weight:700"),
    ("font-extrabold", "font-weight:800"),
    ("leading-tight", "line-height:1.25"),
    ("leading-normal", "line-height:1.5"),
    ("leading-relaxed", "line-height:1.625"),
    ("tracking-tight", "letter-spacing:-0.025em"),
    ("tracking-wide", "letter-spacing:0.025em"),
    ("uppercase", "text-transform:uppercase"),
    ("italic", "font-style:italic"),
    ("underline", "text-decoration-line:underline"),
    // effects
    ("rounded", "border-radius:0.25rem"),
    ("rounded-md", "border-radius:0.375rem"),
    ("rounded-lg", "border-radius:0.5rem"),
    ("rounded-xl", "border-radius:0.75rem"),
    ("rounded-full", "border-radius:9999px"),
    ("shadow", "box-shadow:0 1px 3px 0 rgba(0,0,0,0.1),0 1px 2px -1px rgba(0,0,0,0.1)"),
    ("shadow-md", "box-shadow:0 4px 6px -1px rgba(0,0,0,0.1),0 2px 4px -2px rgba(0,0,0,0.1)"),
    ("shadow-lg", "box-shadow:0 10px 15px -3px rgba(0,0,0,0.1),0 4px 6px -4px rgba(0,0,0,0.1)"),
    ("border", "border-width:1px;border-style:solid"),
    ("border-t", "border-top-width:1px;border-top-style:solid"),
    ("border-b", "border-bottom-width:1px;border-bottom-style:solid"),
    ("opacity-75", "opacity:0.75"),
    ("opacity-50", "opacity:0.5"),
    ("transition", "transition:all 150ms ease-in-out"),
    ("cursor-pointer", "cursor:pointer"),
];

fn lookup(table: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

fn spacing(utility: &str) -> Option<String> {
    let (prefix, value) = utility.rsplit_once('-')?;
    let properties = SPACING_PROPERTIES
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, props)| *props)?;
    let size = if value == "auto" && prefix.starts_with('m') {
        "auto"
    } else {
        lookup(SPACING, value)?
    };
    Some(
        properties
            .iter()
            .map(|p| format!("{}:{}", p, size))
            .collect::<Vec<_>>()
            .join(";"),
    )
}

fn color(utility: &str) -> Option<String> {
    let (property, name) = if let Some(name) = utility.strip_prefix("text-") {
        ("color", name)
    } else if let Some(name) = utility.strip_prefix("bg-") {
        ("background-color", name)
    } else if let Some(name) = utility.strip_prefix("border-") {
        ("border-color", name)
    } else {
        return None;
    };
    lookup(PALETTE, name).map(|value| format!("{}:{}", property, value))
}

fn font_size(utility: &str) -> Option<String> {
    let name = utility.strip_prefix("text-")?;
    FONT_SIZES
        .iter()
        .find(|(k, _, _)| *k == name)
        .map(|(_, size, line)| format!("font-size:{};line-height:{}", size, line))
}

/// Declaration block for an unprefixed utility, or `None` if the token is
/// not in the vocabulary.
pub fn declarations(utility: &str) -> Option<String> {
    if let Some(fixed) = lookup(FIXED, utility) {
        return Some(fixed.to_string());
    }
    spacing(utility)
        .or_else(|| font_size(utility))
        .or_else(|| color(utility))
}

/// Whether a hex or named color is fully transparent.
pub fn is_transparent(value: &str) -> bool {
    let v = value.trim().to_ascii_lowercase();
    v == "transparent" || v == "rgba(0,0,0,0)" || v == "rgba(0, 0, 0, 0)" || v == "#0000" || v == "#00000000"
}
