//! Link classification: is a relevant page freely readable or form-gated?
//!
//! The default rule is deliberately coarse. It flags any markup containing an
//! input element, a form element, an `@` or a `.com` substring as `form`, which
//! also catches pages that merely mention an email address or a commercial
//! domain. `MarkupOnly` narrows the signal to actual form controls.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static LITERAL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<input|<form|@|\.com").expect("valid regex"));

static MARKUP_ONLY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<input|<form").expect("valid regex"));

/// Output category of a relevant link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkCategory {
    /// Freely accessible
    Open,
    /// Gated behind a form or contact wall
    Form,
}

impl LinkCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Form => "form",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "form" => Some(Self::Form),
            _ => None,
        }
    }
}

impl fmt::Display for LinkCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which pattern decides the `form` category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassifierRule {
    /// `<input`, `<form`, `@` or `.com`, case-insensitive
    #[default]
    Literal,
    /// `<input` or `<form` only
    MarkupOnly,
}

impl ClassifierRule {
    /// Classifies raw markup with this rule
    pub fn classify(&self, html: &str) -> LinkCategory {
        let pattern = match self {
            Self::Literal => &*LITERAL_PATTERN,
            Self::MarkupOnly => &*MARKUP_ONLY_PATTERN,
        };

        if pattern.is_match(html) {
            LinkCategory::Form
        } else {
            LinkCategory::Open
        }
    }
}

/// Classifies raw markup with the default rule
///
/// ```
/// use sieve_crawl::{classify, LinkCategory};
///
/// assert_eq!(classify("<form></form>"), LinkCategory::Form);
/// assert_eq!(classify("<p>hello</p>"), LinkCategory::Open);
/// ```
pub fn classify(html: &str) -> LinkCategory {
    ClassifierRule::Literal.classify(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_element() {
        assert_eq!(classify("<form></form>"), LinkCategory::Form);
        assert_eq!(classify("<FORM action='/x'>"), LinkCategory::Form);
    }

    #[test]
    fn test_input_element() {
        assert_eq!(classify(r#"<Input type="text">"#), LinkCategory::Form);
    }

    #[test]
    fn test_plain_paragraph_is_open() {
        assert_eq!(classify("<p>hello</p>"), LinkCategory::Open);
        assert_eq!(classify(""), LinkCategory::Open);
    }

    #[test]
    fn test_email_token_is_form() {
        assert_eq!(classify("contact me at a@b.com"), LinkCategory::Form);
        assert_eq!(classify("write to info@example.org"), LinkCategory::Form);
    }

    #[test]
    fn test_dot_com_is_form() {
        assert_eq!(classify("<p>see example.COM</p>"), LinkCategory::Form);
        assert_eq!(classify("<p>see example.org</p>"), LinkCategory::Open);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let html = "<div><a href='https://x.test/'>x</a></div>";
        let first = classify(html);
        for _ in 0..10 {
            assert_eq!(classify(html), first);
        }
    }

    #[test]
    fn test_markup_only_ignores_email_and_domains() {
        let rule = ClassifierRule::MarkupOnly;
        assert_eq!(rule.classify("contact me at a@b.com"), LinkCategory::Open);
        assert_eq!(rule.classify("<form></form>"), LinkCategory::Form);
        assert_eq!(rule.classify("<input name=q>"), LinkCategory::Form);
    }

    #[test]
    fn test_category_strings() {
        assert_eq!(LinkCategory::Open.to_string(), "open");
        assert_eq!(LinkCategory::from_str_opt("form"), Some(LinkCategory::Form));
        assert_eq!(LinkCategory::from_str_opt("other"), None);
    }
}
