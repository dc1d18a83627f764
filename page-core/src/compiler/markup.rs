//! Minimal HTML writer with escaping.

/// Escape text content.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape an attribute value (always double-quoted).
pub fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Reduce a string to characters valid in an HTML id.
pub fn dom_id(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect()
}

/// Reject script-capable URL schemes.
pub fn safe_url(url: &str) -> String {
    let trimmed = url.trim();
    let lower: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    if lower.starts_with("javascript:") || lower.starts_with("vbscript:") || lower.starts_with("data:text/html") {
        "#".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Ordered attribute list. Empty values are skipped on output except for
/// boolean attributes added with [`Attrs::flag`].
#[derive(Debug, Default, Clone)]
pub struct Attrs {
    entries: Vec<(String, Option<String>)>,
}

impl Attrs {
    /// No attributes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `name="value"`; ignored when `value` is empty.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        if !value.is_empty() {
            self.entries.push((name.to_string(), Some(value)));
        }
        self
    }

    /// Builder form of [`Attrs::set`].
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Add a boolean attribute (`hidden`, `defer`).
    pub fn flag(mut self, name: &str) -> Self {
        self.entries.push((name.to_string(), None));
        self
    }

    fn write(&self, out: &mut String) {
        for (name, value) in &self.entries {
            out.push(' ');
            out.push_str(name);
            if let Some(value) = value {
                out.push_str("=\"");
                out.push_str(&escape_attr(value));
                out.push('"');
            }
        }
    }
}

/// Append-only HTML buffer.
#[derive(Debug, Default)]
pub struct Html {
    buf: String,
}

impl Html {
    /// Empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// `<tag attrs>`
    pub fn open(&mut self, tag: &str, attrs: &Attrs) {
        self.buf.push('<');
        self.buf.push_str(tag);
        attrs.write(&mut self.buf);
        self.buf.push('>');
    }

    /// `</tag>`
    pub fn close(&mut self, tag: &str) {
        self.buf.push_str("</");
        self.buf.push_str(tag);
        self.buf.push('>');
    }

    /// A void element (`<img>`, `<meta>`).
    pub fn void(&mut self, tag: &str, attrs: &Attrs) {
        self.open(tag, attrs);
    }

    /// `<tag attrs>text</tag>`
    pub fn element(&mut self, tag: &str, attrs: &Attrs, text: &str) {
        self.open(tag, attrs);
        self.text(text);
        self.close(tag);
    }

    /// Escaped text.
    pub fn text(&mut self, text: &str) {
        self.buf.push_str(&escape_text(text));
    }

    /// Unescaped markup.
    pub fn raw(&mut self, markup: &str) {
        self.buf.push_str(markup);
    }

    /// Line break between top-level blocks.
    pub fn newline(&mut self) {
        self.buf.push('\n');
    }

    /// The accumulated markup.
    pub fn finish(self) -> String {
        self.buf
    }
}
