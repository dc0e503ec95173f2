//! Ordered, data-driven rule list.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::layout::geometry::is_centered;
use crate::layout::{is_party_line, is_salutation_opener};
use crate::model::{join_texts, Label, Row};

use super::ClassifierOptions;

/// Header dates are full `dd.mm.yyyy`; the looser geometry date hint
/// would also catch reference numbers like `1/2/24` in the right column.
static HEADER_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{2}[./-]\d{2}[./-]\d{4}").unwrap());
static NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.").unwrap());

const TITLE_MIN_CHARS: usize = 15;
const TITLE_MAX_CHARS: usize = 60;
const SIGNOFF_WORDS: [&str; 5] = ["yours", "sincerely", "regards", "faithfully", "truly"];
const SIGNOFF_MAX_TOKENS: usize = 4;

/// What a rule predicate sees about one row.
pub struct RuleContext<'a> {
    pub row: &'a Row,
    /// Joined row text
    pub text: String,
    /// First non-blank token
    pub first_token: &'a str,
    pub page_width: f32,
    pub options: &'a ClassifierOptions,
}

impl<'a> RuleContext<'a> {
    /// Build a context; rows without text yield `None`.
    pub fn new(row: &'a Row, page_width: f32, options: &'a ClassifierOptions) -> Option<Self> {
        let first_token = row.first_token()?;
        Some(Self {
            row,
            text: row.text(),
            first_token,
            page_width,
            options,
        })
    }

    /// Box texts left and right of the header split.
    pub fn split_columns(&self) -> (String, String) {
        let split = self.page_width * self.options.header_split_ratio;
        let (left, right): (Vec<_>, Vec<_>) = self
            .row
            .boxes()
            .iter()
            .cloned()
            .partition(|b| b.x() < split);
        (join_texts(&left), join_texts(&right))
    }
}

/// A named predicate and the label it assigns.
#[derive(Clone)]
pub struct Rule {
    pub name: &'static str,
    pub label: Label,
    predicate: fn(&RuleContext<'_>) -> bool,
}

impl Rule {
    pub fn new(name: &'static str, label: Label, predicate: fn(&RuleContext<'_>) -> bool) -> Self {
        Self {
            name,
            label,
            predicate,
        }
    }

    pub fn matches(&self, ctx: &RuleContext<'_>) -> bool {
        (self.predicate)(ctx)
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("label", &self.label)
            .finish()
    }
}

/// The built-in rules, in priority order.
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule::new("header", Label::DocHeader, is_header),
        Rule::new("uppercase-title", Label::DocTitle, is_uppercase_title),
        Rule::new("centered-title", Label::DocTitle, is_centered_title),
        Rule::new("continuation", Label::PageContinuation, |ctx| {
            ctx.text.starts_with("...")
        }),
        Rule::new("salutation", Label::DocSalutation, |ctx| {
            is_salutation_opener(ctx.first_token)
        }),
        Rule::new("meta", Label::DocMeta, is_meta),
        Rule::new("body", Label::DocBody, is_body),
        Rule::new("signoff", Label::DocSignoff, is_signoff),
    ]
}

/// Apply `rules` in order; the first match wins.
pub fn first_match<'r>(rules: &'r [Rule], ctx: &RuleContext<'_>) -> Option<&'r Rule> {
    rules.iter().find(|rule| rule.matches(ctx))
}

/// Text has a cased letter and no lowercase letter.
pub fn is_all_uppercase(text: &str) -> bool {
    let mut has_cased = false;
    for c in text.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}

fn is_header(ctx: &RuleContext<'_>) -> bool {
    let (left, right) = ctx.split_columns();
    if left.is_empty() || right.is_empty() {
        return false;
    }
    right.to_lowercase().contains("date") || HEADER_DATE.is_match(&right)
}

fn is_uppercase_title(ctx: &RuleContext<'_>) -> bool {
    let len = ctx.text.chars().count();
    is_all_uppercase(&ctx.text) && len > TITLE_MIN_CHARS && len < TITLE_MAX_CHARS
}

fn is_centered_title(ctx: &RuleContext<'_>) -> bool {
    is_all_uppercase(&ctx.text) && is_centered(ctx.row, ctx.page_width)
}

fn is_meta(ctx: &RuleContext<'_>) -> bool {
    is_party_line(ctx.first_token, &ctx.text)
}

fn is_body(ctx: &RuleContext<'_>) -> bool {
    let lower = ctx.text.to_lowercase();
    ctx.options
        .boilerplate_phrases
        .iter()
        .any(|p| lower.contains(&p.to_lowercase()))
        || NUMBERED.is_match(ctx.first_token)
}

fn is_signoff(ctx: &RuleContext<'_>) -> bool {
    let first = ctx
        .first_token
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .to_lowercase();
    ctx.row.token_count() <= SIGNOFF_MAX_TOKENS && SIGNOFF_WORDS.contains(&first.as_str())
}
