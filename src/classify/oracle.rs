//! Classification oracle boundary.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{GeometryHints, Label, Row};

/// Row summary sent to the oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowPayload {
    /// Joined row text
    pub text: String,
    /// Row anchor y
    pub y: f32,
    /// Mean box confidence
    pub avg_conf: f32,
    /// Number of tokens
    #[serde(rename = "len")]
    pub token_count: usize,
}

impl RowPayload {
    pub fn from_row(row: &Row) -> Self {
        Self {
            text: row.text(),
            y: row.y(),
            avg_conf: row.mean_confidence(),
            token_count: row.token_count(),
        }
    }
}

/// Escalation request: `{"rows": {"<index>": {...}}}` keyed by the real row index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OracleRequest {
    pub rows: BTreeMap<usize, RowPayload>,
}

impl OracleRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, index: usize, row: &Row) {
        self.rows.insert(index, RowPayload::from_row(row));
    }

    /// Check if a row index was sent.
    pub fn contains(&self, index: usize) -> bool {
        self.rows.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Serialize to the wire format.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// An external classifier for rows the rules could not resolve.
///
/// Implementations return the raw, untrusted response text; parsing and
/// validation happen in the classifier.
pub trait ClassificationOracle: Send + Sync {
    /// Ask the oracle to label the request's rows.
    fn classify_rows(&self, request: &OracleRequest) -> Result<String>;

    /// Whether this oracle should be consulted at all.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Oracle name, for logs.
    fn name(&self) -> &str {
        "oracle"
    }
}

impl<T: ClassificationOracle + ?Sized> ClassificationOracle for Arc<T> {
    fn classify_rows(&self, request: &OracleRequest) -> Result<String> {
        (**self).classify_rows(request)
    }

    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Oracle that is never consulted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOracle;

impl ClassificationOracle for NoOracle {
    fn classify_rows(&self, _request: &OracleRequest) -> Result<String> {
        Ok("{}".to_string())
    }

    fn is_enabled(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// Whole-page request for an oracle that writes the document tree itself.
///
/// `raw_text` holds one line per row; `hints` is keyed by the same row
/// indices, counting lines from zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeRequest {
    pub raw_text: String,
    pub hints: GeometryHints,
}

impl TreeRequest {
    /// Build a request from reading-order rows and their hints.
    pub fn from_rows(rows: &[Row], hints: GeometryHints) -> Self {
        let raw_text = rows.iter().map(Row::text).collect::<Vec<_>>().join("\n");
        Self { raw_text, hints }
    }

    /// User message carrying the page text and the hints.
    pub fn to_prompt(&self) -> Result<String> {
        let hints = serde_json::to_string_pretty(&self.hints)?;
        Ok(format!(
            "OCR TEXT:\n\"\"\"\n{}\n\"\"\"\n\nGEOMETRY HINTS:\n{}",
            self.raw_text, hints
        ))
    }
}

/// An external model that turns page text into a document tree.
///
/// The returned text is untrusted; callers run it through
/// [`parse_doc_tree`](crate::render::tree::parse_doc_tree).
pub trait TreeOracle: Send + Sync {
    fn generate_tree(&self, request: &TreeRequest) -> Result<String>;

    fn name(&self) -> &str {
        "tree-oracle"
    }
}

impl<T: TreeOracle + ?Sized> TreeOracle for Arc<T> {
    fn generate_tree(&self, request: &TreeRequest) -> Result<String> {
        (**self).generate_tree(request)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// System prompt describing the document tree schema.
pub fn tree_system_prompt() -> String {
    "You convert OCR text from a scanned document into editor JSON.\n\
     \n\
     Output ONLY valid JSON, no Markdown and no explanations.\n\
     The root node is {\"type\": \"doc\", \"content\": [...]}.\n\
     \n\
     Headings are {\"type\": \"heading\", \"attrs\": {\"level\": 2, \"textAlign\": \"center\" or \"left\"}, \"content\": [...]}.\n\
     Always put level inside attrs and only use level 2.\n\
     The main title is centered; section headings are left aligned; both are bold.\n\
     Paragraphs are {\"type\": \"paragraph\", \"content\": [...]}.\n\
     Text is {\"type\": \"text\", \"text\": \"...\"}; bold text carries \"marks\": [{\"type\": \"bold\"}].\n\
     \n\
     Write visible blanks as \"__________\" and keep them inline. Do not invent field names.\n\
     Geometry hints only describe how rows look; do not invent structure from them alone."
        .to_string()
}

/// System prompt listing the label vocabulary.
pub fn system_prompt() -> String {
    let labels = Label::ALL
        .iter()
        .filter(|l| l.is_resolved())
        .map(|l| format!("- {}", l))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a document row classification engine.\n\
         \n\
         Classify each row into its document section.\n\
         Do not rewrite, merge or normalize the text.\n\
         \n\
         Return ONLY valid JSON in this format:\n\
         {{\"labels\": {{\"3\": \"doc-meta\", \"4\": \"doc-body\"}}}}\n\
         \n\
         Allowed labels:\n{}",
        labels
    )
}

#[cfg(feature = "http-oracle")]
pub use http::{HttpOracle, HttpOracleConfig};

#[cfg(feature = "http-oracle")]
mod http {
    use std::env;
    use std::time::Duration;

    use serde::{Deserialize, Serialize};

    use super::{
        system_prompt, tree_system_prompt, ClassificationOracle, OracleRequest, TreeOracle,
        TreeRequest,
    };
    use crate::error::{Error, Result};

    const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
    const DEFAULT_MODEL: &str = "mistralai/mistral-7b-instruct";
    const TREE_MAX_TOKENS: u32 = 3500;

    /// Settings for [`HttpOracle`].
    #[derive(Debug, Clone)]
    pub struct HttpOracleConfig {
        /// Chat-completions endpoint URL
        pub endpoint: String,
        /// Bearer token
        pub api_key: String,
        /// Model identifier
        pub model: String,
        /// Request timeout
        pub timeout: Duration,
        /// Sampling temperature
        pub temperature: f32,
    }

    impl HttpOracleConfig {
        /// Create a config with default endpoint, model and timeout.
        pub fn new(api_key: impl Into<String>) -> Self {
            Self {
                endpoint: DEFAULT_ENDPOINT.to_string(),
                api_key: api_key.into(),
                model: DEFAULT_MODEL.to_string(),
                timeout: Duration::from_secs(60),
                temperature: 0.0,
            }
        }

        /// Read `OPENROUTER_API_KEY`, then apply [`with_env_overrides`](Self::with_env_overrides).
        pub fn from_env() -> Result<Self> {
            let api_key = env::var("OPENROUTER_API_KEY").map_err(|_| {
                Error::Oracle("OPENROUTER_API_KEY environment variable not set".to_string())
            })?;
            Ok(Self::new(api_key).with_env_overrides())
        }

        /// Take the endpoint and model from `INKDOC_ORACLE_URL` and
        /// `INKDOC_ORACLE_MODEL` when they are set.
        pub fn with_env_overrides(mut self) -> Self {
            if let Ok(endpoint) = env::var("INKDOC_ORACLE_URL") {
                self.endpoint = endpoint;
            }
            if let Ok(model) = env::var("INKDOC_ORACLE_MODEL") {
                self.model = model;
            }
            self
        }

        pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
            self.endpoint = endpoint.into();
            self
        }

        pub fn with_model(mut self, model: impl Into<String>) -> Self {
            self.model = model.into();
            self
        }

        pub fn with_timeout(mut self, timeout: Duration) -> Self {
            self.timeout = timeout;
            self
        }

        pub fn with_temperature(mut self, temperature: f32) -> Self {
            self.temperature = temperature;
            self
        }
    }

    #[derive(Debug, Serialize)]
    struct ChatRequest<'a> {
        model: &'a str,
        temperature: f32,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_tokens: Option<u32>,
        messages: Vec<Message>,
    }

    #[derive(Debug, Serialize)]
    struct Message {
        role: &'static str,
        content: String,
    }

    #[derive(Debug, Deserialize)]
    struct ChatResponse {
        choices: Vec<Choice>,
    }

    #[derive(Debug, Deserialize)]
    struct Choice {
        message: ResponseMessage,
    }

    #[derive(Debug, Deserialize)]
    struct ResponseMessage {
        content: Option<String>,
    }

    /// Oracle backed by an OpenAI-style chat-completions endpoint.
    #[derive(Debug, Clone)]
    pub struct HttpOracle {
        config: HttpOracleConfig,
        client: reqwest::blocking::Client,
    }

    impl HttpOracle {
        pub fn new(config: HttpOracleConfig) -> Result<Self> {
            let client = reqwest::blocking::Client::builder()
                .timeout(config.timeout)
                .build()
                .map_err(|e| Error::Oracle(format!("failed to create HTTP client: {}", e)))?;
            Ok(Self { config, client })
        }

        pub fn config(&self) -> &HttpOracleConfig {
            &self.config
        }
    }

    impl HttpOracle {
        /// Send one system + user exchange and return the reply text.
        fn complete(&self, system: String, user: String, max_tokens: Option<u32>) -> Result<String> {
            let body = ChatRequest {
                model: &self.config.model,
                temperature: self.config.temperature,
                max_tokens,
                messages: vec![
                    Message {
                        role: "system",
                        content: system,
                    },
                    Message {
                        role: "user",
                        content: user,
                    },
                ],
            };

            let response = self
                .client
                .post(&self.config.endpoint)
                .bearer_auth(&self.config.api_key)
                .json(&body)
                .send()
                .map_err(|e| Error::Oracle(format!("request failed: {}", e)))?;

            let status = response.status();
            let text = response
                .text()
                .map_err(|e| Error::Oracle(format!("failed to read response: {}", e)))?;
            if !status.is_success() {
                return Err(Error::Oracle(format!(
                    "request failed with status {}: {}",
                    status, text
                )));
            }

            let chat: ChatResponse = serde_json::from_str(&text)
                .map_err(|e| Error::Oracle(format!("malformed completion: {}", e)))?;
            chat.choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .filter(|c| !c.trim().is_empty())
                .ok_or_else(|| Error::Oracle("completion had no content".to_string()))
        }
    }

    impl ClassificationOracle for HttpOracle {
        fn classify_rows(&self, request: &OracleRequest) -> Result<String> {
            self.complete(system_prompt(), request.to_json()?, None)
        }

        fn name(&self) -> &str {
            "http"
        }
    }

    impl TreeOracle for HttpOracle {
        fn generate_tree(&self, request: &TreeRequest) -> Result<String> {
            self.complete(
                tree_system_prompt(),
                request.to_prompt()?,
                Some(TREE_MAX_TOKENS),
            )
        }

        fn name(&self) -> &str {
            "http"
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_config_builder() {
            let config = HttpOracleConfig::new("key")
                .with_model("m")
                .with_timeout(Duration::from_secs(5));
            assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
            assert_eq!(config.model, "m");
            assert_eq!(config.timeout, Duration::from_secs(5));
            assert_eq!(config.temperature, 0.0);
        }

        #[test]
        fn test_unreachable_endpoint_is_oracle_error() {
            let config = HttpOracleConfig::new("key")
                .with_endpoint("http://127.0.0.1:9/v1/chat/completions")
                .with_timeout(Duration::from_millis(200));
            let oracle = HttpOracle::new(config).unwrap();
            let err = oracle.classify_rows(&OracleRequest::new()).unwrap_err();
            assert!(err.is_recoverable());
            let err = oracle.generate_tree(&TreeRequest::default()).unwrap_err();
            assert!(matches!(err, Error::Oracle(_)));
        }
    }
}
