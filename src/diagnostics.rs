//! Diagnostics Collector - Collect and Continue
//!
//! Stages append diagnostics and substitute safe defaults.
//! Nothing recorded here ever aborts a resolution run.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// A rule of the document's track or of the publication process is violated.
    Error,
    /// Recommended practice is missing.
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnostic {
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<String>,
}

impl Diagnostic {
    pub fn error(rule: &str, message: impl Into<String>) -> Self {
        Self::new(rule, Severity::Error, message)
    }

    pub fn warning(rule: &str, message: impl Into<String>) -> Self {
        Self::new(rule, Severity::Warning, message)
    }

    fn new(rule: &str, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            severity,
            message: message.into(),
            hint: None,
            elements: vec![],
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.elements.push(element.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Append-only sink threaded through every stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(
            rule = %diagnostic.rule,
            severity = ?diagnostic.severity,
            "{}",
            diagnostic.message
        );
        self.entries.push(diagnostic);
    }

    pub fn error(&mut self, rule: &str, message: impl Into<String>) {
        self.push(Diagnostic::error(rule, message));
    }

    pub fn warning(&mut self, rule: &str, message: impl Into<String>) {
        self.push(Diagnostic::warning(rule, message));
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.severity == Severity::Warning)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

/// Joins choices as `"a"`, `"b"`, or `"c"`.
pub(crate) fn join_or<S: AsRef<str>>(items: &[S]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| format!("`\"{}\"`", s.as_ref())).collect();
    match quoted.len() {
        0 => String::new(),
        1 => quoted[0].clone(),
        n => format!("{}, or {}", quoted[..n - 1].join(", "), quoted[n - 1]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_keeps_insertion_order() {
        let mut diags = Diagnostics::new();
        diags.warning("versions", "first");
        diags.error("editors", "second");
        diags.push(Diagnostic::warning("license", "third").with_hint("do this"));

        let messages: Vec<_> = diags.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, ["first", "second", "third"]);
        assert!(diags.has_errors());
        assert_eq!(diags.errors().count(), 1);
        assert_eq!(diags.warnings().count(), 2);
    }

    #[test]
    fn warnings_alone_are_not_errors() {
        let mut diags = Diagnostics::new();
        diags.warning("versions", "missing edDraftURI");
        assert!(!diags.has_errors());
    }

    #[test]
    fn join_or_formats_choices() {
        assert_eq!(join_or(&["a"]), "`\"a\"`");
        assert_eq!(join_or(&["a", "b", "c"]), "`\"a\"`, `\"b\"`, or `\"c\"`");
    }
}
