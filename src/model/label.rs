//! Semantic row labels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fixed label vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Label {
    DocTitle,
    DocHeader,
    DocMeta,
    DocSalutation,
    DocBody,
    DocSignoff,
    PageContinuation,
    Unresolved,
}

impl Label {
    /// All labels, in vocabulary order.
    pub const ALL: [Label; 8] = [
        Label::DocTitle,
        Label::DocHeader,
        Label::DocMeta,
        Label::DocSalutation,
        Label::DocBody,
        Label::DocSignoff,
        Label::PageContinuation,
        Label::Unresolved,
    ];

    /// Wire name (e.g. `"doc-title"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::DocTitle => "doc-title",
            Label::DocHeader => "doc-header",
            Label::DocMeta => "doc-meta",
            Label::DocSalutation => "doc-salutation",
            Label::DocBody => "doc-body",
            Label::DocSignoff => "doc-signoff",
            Label::PageContinuation => "page-continuation",
            Label::Unresolved => "unresolved",
        }
    }

    /// Check if this is a real resolution (anything but `unresolved`).
    pub fn is_resolved(&self) -> bool {
        *self != Label::Unresolved
    }

    /// Label used for rows that never got resolved.
    pub fn or_body(self) -> Label {
        if self.is_resolved() {
            self
        } else {
            Label::DocBody
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Label::ALL
            .iter()
            .copied()
            .find(|label| label.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown label: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parse() {
        assert_eq!("doc-title".parse::<Label>(), Ok(Label::DocTitle));
        assert_eq!(" Page-Continuation ".parse::<Label>(), Ok(Label::PageContinuation));
        assert!("doc-subject".parse::<Label>().is_err());
    }

    #[test]
    fn test_label_serde_names() {
        let json = serde_json::to_string(&Label::DocSalutation).unwrap();
        assert_eq!(json, "\"doc-salutation\"");
        for label in Label::ALL {
            assert_eq!(serde_json::to_string(&label).unwrap(), format!("\"{}\"", label));
        }
    }

    #[test]
    fn test_or_body() {
        assert_eq!(Label::Unresolved.or_body(), Label::DocBody);
        assert_eq!(Label::DocMeta.or_body(), Label::DocMeta);
    }
}
