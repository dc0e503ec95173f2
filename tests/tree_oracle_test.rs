//! Integration tests for oracle-written document trees.

use std::sync::Mutex;

use inkdoc::error::{Error, Result};
use inkdoc::{OcrDetection, Reconstructor, TreeOracle, TreeRequest};

const PAGE_WIDTH: f32 = 800.0;

fn det(text: &str, x: f32, y: f32, w: f32) -> OcrDetection {
    OcrDetection::new(text, 0.95, [x, y, x + w, y + 14.0])
}

fn page() -> Vec<OcrDetection> {
    vec![
        det("LEGAL NOTICE", 330.0, 40.0, 140.0),
        det("The tenant shall pay the rent", 40.0, 100.0, 300.0),
    ]
}

/// Oracle that records the request and replies with a fixed text.
struct ScriptedOracle {
    reply: Result<String>,
    seen: Mutex<Option<TreeRequest>>,
}

impl ScriptedOracle {
    fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            seen: Mutex::new(None),
        }
    }

    fn failing() -> Self {
        Self {
            reply: Err(Error::Oracle("service unavailable".to_string())),
            seen: Mutex::new(None),
        }
    }

    fn seen(&self) -> TreeRequest {
        self.seen.lock().unwrap().clone().unwrap()
    }
}

impl TreeOracle for ScriptedOracle {
    fn generate_tree(&self, request: &TreeRequest) -> Result<String> {
        *self.seen.lock().unwrap() = Some(request.clone());
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(e) => Err(Error::Oracle(e.to_string())),
        }
    }
}

#[test]
fn test_fenced_tree_is_parsed_and_normalized() {
    let oracle = ScriptedOracle::replying(
        "Here is the document:\n```json\n{\"type\": \"doc\", \"content\": [\
         {\"type\": \"heading\", \"level\": 3, \"content\": [{\"type\": \"text\", \"text\": \"LEGAL NOTICE\"}]},\
         {\"type\": \"paragraph\", \"content\": [{\"type\": \"text\", \"text\": \"The tenant shall pay the rent\"}]}\
         ]}\n```",
    );
    let tree = Reconstructor::new()
        .reconstruct_tree(&page(), PAGE_WIDTH, &oracle)
        .unwrap();

    assert_eq!(tree.node_type, "doc");
    let heading = &tree.content[0];
    assert_eq!(heading.node_type, "heading");
    assert!(heading.extra.get("level").is_none());
    assert_eq!(heading.attr("level").and_then(|v| v.as_u64()), Some(3));
    assert_eq!(heading.attr("textAlign").and_then(|v| v.as_str()), Some("left"));
    assert_eq!(tree.content[1].plain_text(), "The tenant shall pay the rent");
}

#[test]
fn test_request_carries_rows_and_hints() {
    let oracle = ScriptedOracle::replying("{\"type\": \"doc\"}");
    Reconstructor::new()
        .reconstruct_tree(&page(), PAGE_WIDTH, &oracle)
        .unwrap();

    let request = oracle.seen();
    assert_eq!(
        request.raw_text,
        "LEGAL NOTICE\nThe tenant shall pay the rent"
    );
    assert!(request.hints.get(0).unwrap().centered());
}

#[test]
fn test_malformed_tree_is_parse_error() {
    let truncated = ScriptedOracle::replying("{\"type\": \"doc\", \"content\": [");
    let result = Reconstructor::new().reconstruct_tree(&page(), PAGE_WIDTH, &truncated);
    assert!(matches!(result, Err(Error::Parse(_))));

    let wrong_root = ScriptedOracle::replying("{\"type\": \"paragraph\", \"content\": []}");
    let result = Reconstructor::new().reconstruct_tree(&page(), PAGE_WIDTH, &wrong_root);
    assert!(matches!(result, Err(Error::Parse(_))));
}

#[test]
fn test_oracle_failure_is_returned() {
    let oracle = ScriptedOracle::failing();
    let result = Reconstructor::new().reconstruct_tree(&page(), PAGE_WIDTH, &oracle);
    assert!(matches!(result, Err(Error::Oracle(_))));
}
