//! Compiler output.

use std::fmt;

/// The three text files produced by compiling a page.
///
/// Immutable once produced; an edit requires a new compile.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CompiledArtifact {
    markup: String,
    stylesheet: String,
    script: String,
}

impl CompiledArtifact {
    /// Bundle compiled outputs.
    pub fn new(markup: String, stylesheet: String, script: String) -> Self {
        Self {
            markup,
            stylesheet,
            script,
        }
    }

    /// The HTML document.
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// The stylesheet.
    pub fn stylesheet(&self) -> &str {
        &self.stylesheet
    }

    /// The behavior script.
    pub fn script(&self) -> &str {
        &self.script
    }
}

impl fmt::Debug for CompiledArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledArtifact")
            .field("markup", &format!("[{} bytes]", self.markup.len()))
            .field("stylesheet", &format!("[{} bytes]", self.stylesheet.len()))
            .field("script", &format!("[{} bytes]", self.script.len()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_shows_sizes_not_contents() {
        let artifact = CompiledArtifact::new("<html>".into(), "a{}".into(), String::new());
        let debug = format!("{:?}", artifact);
        assert!(debug.contains("[6 bytes]"));
        assert!(!debug.contains("<html>"));
    }
}
