//! Hybrid row classification.
//!
//! Rows are first matched against an ordered rule list. Rows no rule claims
//! and whose OCR confidence is high enough are escalated to a
//! [`ClassificationOracle`]. The oracle's answer is untrusted: it is parsed
//! defensively, and only entries that name a row that was actually sent and
//! carry a known label are kept. Oracle labels never override rule labels,
//! and an oracle failure only costs the escalated rows their labels.

pub mod extract;
mod oracle;
mod rules;

pub use oracle::{
    system_prompt, tree_system_prompt, ClassificationOracle, NoOracle, OracleRequest, RowPayload,
    TreeOracle, TreeRequest,
};
#[cfg(feature = "http-oracle")]
pub use oracle::{HttpOracle, HttpOracleConfig};
pub use rules::{default_rules, first_match, is_all_uppercase, Rule, RuleContext};

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{Label, Row, TableRange, DEFAULT_HEADER_SPLIT_RATIO};

/// Options for the rule engine and escalation.
#[derive(Debug, Clone)]
pub struct ClassifierOptions {
    /// Minimum mean confidence for an unresolved row to be escalated
    pub escalation_threshold: f32,

    /// Header column split, as a page fraction
    pub header_split_ratio: f32,

    /// Phrases that mark a row as body text (case-insensitive)
    pub boilerplate_phrases: Vec<String>,
}

impl ClassifierOptions {
    /// Create new classifier options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the escalation confidence threshold.
    pub fn with_escalation_threshold(mut self, threshold: f32) -> Self {
        self.escalation_threshold = threshold;
        self
    }

    /// Set the header split ratio.
    pub fn with_header_split_ratio(mut self, ratio: f32) -> Self {
        self.header_split_ratio = ratio;
        self
    }

    /// Add a boilerplate body phrase.
    pub fn with_boilerplate_phrase(mut self, phrase: impl Into<String>) -> Self {
        self.boilerplate_phrases.push(phrase.into());
        self
    }
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        Self {
            escalation_threshold: 0.6,
            header_split_ratio: DEFAULT_HEADER_SPLIT_RATIO,
            boilerplate_phrases: vec!["instructions of my clients".to_string()],
        }
    }
}

/// What happened during escalation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OracleOutcome {
    /// Whether the oracle was called
    pub called: bool,
    /// Row indices sent to the oracle
    pub escalated: Vec<usize>,
    /// Entries accepted after validation
    pub accepted: usize,
    /// Entries discarded by validation
    pub rejected: usize,
    /// Failure message when the call or parse failed
    pub error: Option<String>,
}

/// Classifier result.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    /// Resolved labels by row index
    pub labels: BTreeMap<usize, Label>,
    /// Rows still unresolved after escalation
    pub unresolved: Vec<usize>,
    /// Rows labeled by rules
    pub rule_labeled: usize,
    /// Escalation record
    pub oracle: OracleOutcome,
}

/// Rule-first classifier with optional oracle escalation.
#[derive(Clone)]
pub struct HybridClassifier {
    options: ClassifierOptions,
    rules: Vec<Rule>,
    oracle: Arc<dyn ClassificationOracle>,
}

impl HybridClassifier {
    /// Create a classifier with the default rules and no oracle.
    pub fn new(options: ClassifierOptions) -> Self {
        Self {
            options,
            rules: default_rules(),
            oracle: Arc::new(NoOracle),
        }
    }

    /// Use an oracle for escalation.
    pub fn with_oracle<O: ClassificationOracle + 'static>(mut self, oracle: O) -> Self {
        self.oracle = Arc::new(oracle);
        self
    }

    /// Use a shared oracle for escalation.
    pub fn with_shared_oracle(mut self, oracle: Arc<dyn ClassificationOracle>) -> Self {
        self.oracle = oracle;
        self
    }

    /// Replace the options, keeping rules and oracle.
    pub fn with_options(mut self, options: ClassifierOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the rule list.
    pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn options(&self) -> &ClassifierOptions {
        &self.options
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Classify every row.
    pub fn classify(&self, rows: &[Row], page_width: f32) -> Classification {
        self.classify_excluding(rows, page_width, &[])
    }

    /// Classify rows outside `tables`; table rows get no label.
    pub fn classify_excluding(
        &self,
        rows: &[Row],
        page_width: f32,
        tables: &[TableRange],
    ) -> Classification {
        let mut labels = BTreeMap::new();
        let mut unresolved = Vec::new();

        for (i, row) in rows.iter().enumerate() {
            if tables.iter().any(|t| t.contains(i)) {
                continue;
            }
            let Some(ctx) = RuleContext::new(row, page_width, &self.options) else {
                unresolved.push(i);
                continue;
            };
            match first_match(&self.rules, &ctx) {
                Some(rule) => {
                    log::trace!("row {} matched rule '{}'", i, rule.name);
                    labels.insert(i, rule.label);
                }
                None => unresolved.push(i),
            }
        }
        let rule_labeled = labels.len();

        let candidates: Vec<usize> = unresolved
            .iter()
            .copied()
            .filter(|&i| {
                rows[i].first_token().is_some()
                    && rows[i].mean_confidence() >= self.options.escalation_threshold
            })
            .collect();

        let mut outcome = OracleOutcome::default();
        if self.oracle.is_enabled() && !candidates.is_empty() {
            let mut request = OracleRequest::new();
            for &i in &candidates {
                request.push(i, &rows[i]);
            }
            outcome = self.escalate(&request, &mut labels);
        }

        unresolved.retain(|i| !labels.contains_key(i));

        log::debug!(
            "classify: {} rows, {} by rules, {} escalated, {} by oracle, {} unresolved",
            rows.len(),
            rule_labeled,
            outcome.escalated.len(),
            outcome.accepted,
            unresolved.len()
        );

        Classification {
            labels,
            unresolved,
            rule_labeled,
            oracle: outcome,
        }
    }

    fn escalate(&self, request: &OracleRequest, labels: &mut BTreeMap<usize, Label>) -> OracleOutcome {
        let mut outcome = OracleOutcome {
            called: true,
            escalated: request.rows.keys().copied().collect(),
            ..Default::default()
        };

        let parsed = self
            .oracle
            .classify_rows(request)
            .and_then(|raw| parse_oracle_labels(&raw));

        let answers = match parsed {
            Ok(answers) => answers,
            Err(e) => {
                log::warn!(
                    "Oracle '{}' failed, keeping rule labels: {}",
                    self.oracle.name(),
                    e
                );
                outcome.error = Some(e.to_string());
                return outcome;
            }
        };

        for (key, value) in answers {
            match validate_answer(request, &key, &value) {
                Some((index, label)) if !labels.contains_key(&index) => {
                    labels.insert(index, label);
                    outcome.accepted += 1;
                }
                _ => {
                    log::debug!("Discarding oracle answer {:?} => {}", key, value);
                    outcome.rejected += 1;
                }
            }
        }
        outcome
    }
}

impl Default for HybridClassifier {
    fn default() -> Self {
        Self::new(ClassifierOptions::default())
    }
}

impl std::fmt::Debug for HybridClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HybridClassifier")
            .field("options", &self.options)
            .field("rules", &self.rules)
            .field("oracle", &self.oracle.name())
            .finish()
    }
}

/// Parse an oracle response into raw `(key, value)` answers.
///
/// Accepts `{"labels": {...}}` as well as a bare `{"3": "doc-body"}` map.
pub fn parse_oracle_labels(raw: &str) -> Result<Vec<(String, Value)>> {
    let mut object = extract::extract_object(raw)?;
    let map = match object.remove("labels") {
        Some(Value::Object(labels)) => labels,
        Some(other) => {
            return Err(Error::Parse(format!(
                "\"labels\" must be an object, got {}",
                other
            )))
        }
        None => object,
    };
    Ok(map.into_iter().collect())
}

fn validate_answer(request: &OracleRequest, key: &str, value: &Value) -> Option<(usize, Label)> {
    let index: usize = key.trim().parse().ok()?;
    if !request.contains(index) {
        return None;
    }
    let label: Label = value.as_str()?.parse().ok()?;
    label.is_resolved().then_some((index, label))
}
