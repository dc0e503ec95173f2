//! Structured document tree in the rich-text editor schema.
//!
//! The root is `{"type": "doc", "content": [...]}`. Titles become
//! `heading` nodes, flow text becomes `paragraph` nodes, and tables use the
//! `table` / `tableRow` / `tableCell` node types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::classify::extract::extract_json;
use crate::error::{Error, Result};
use crate::model::ClassifiedDocument;

use super::{build_blocks, Align, JsonFormat, RenderBlock, RenderOptions};

const DEFAULT_HEADING_LEVEL: u64 = 2;

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocNode {
    #[serde(rename = "type")]
    pub node_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<DocNode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,

    /// Any other keys, kept as-is (e.g. a misplaced heading `level`)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Inline formatting mark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub mark_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Map<String, Value>>,
}

impl Mark {
    pub fn bold() -> Self {
        Self {
            mark_type: "bold".to_string(),
            attrs: None,
        }
    }
}

impl DocNode {
    /// Create an empty node of the given type.
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            attrs: None,
            content: Vec::new(),
            text: None,
            marks: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Create a text leaf.
    pub fn text(text: impl Into<String>) -> Self {
        let mut node = Self::new("text");
        node.text = Some(text.into());
        node
    }

    /// Set an attribute.
    pub fn with_attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attrs
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value.into());
        self
    }

    /// Append a child node.
    pub fn with_child(mut self, child: DocNode) -> Self {
        self.content.push(child);
        self
    }

    /// Add a mark (text nodes).
    pub fn with_mark(mut self, mark: Mark) -> Self {
        self.marks.push(mark);
        self
    }

    /// Attribute lookup.
    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.as_ref().and_then(|a| a.get(key))
    }

    /// Concatenated text of all descendant text nodes, separated by spaces.
    pub fn plain_text(&self) -> String {
        let mut parts = Vec::new();
        self.collect_text(&mut parts);
        parts.join(" ")
    }

    fn collect_text<'a>(&'a self, parts: &mut Vec<&'a str>) {
        if let Some(text) = self.text.as_deref() {
            if !text.is_empty() {
                parts.push(text);
            }
        }
        for child in &self.content {
            child.collect_text(parts);
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        let result = match format {
            JsonFormat::Pretty => serde_json::to_string_pretty(self),
            JsonFormat::Compact => serde_json::to_string(self),
        };
        result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
    }
}

/// Convert a classified document to a document tree.
pub fn to_doc_tree(doc: &ClassifiedDocument, options: &RenderOptions) -> Result<DocNode> {
    let blocks = build_blocks(doc);
    let mut root = blocks_to_tree(&blocks);

    if options.include_hints {
        let hints = serde_json::to_value(&doc.hints)
            .map_err(|e| Error::Render(format!("failed to serialize hints: {}", e)))?;
        root = root.with_attr("hints", hints);
    }
    Ok(root)
}

/// Convert a block list to a document tree.
pub fn blocks_to_tree(blocks: &[RenderBlock]) -> DocNode {
    let mut root = DocNode::new("doc");
    for block in blocks {
        root.content.extend(block_nodes(block));
    }
    root
}

fn block_nodes(block: &RenderBlock) -> Vec<DocNode> {
    match block {
        RenderBlock::Title { text } => vec![DocNode::new("heading")
            .with_attr("level", DEFAULT_HEADING_LEVEL)
            .with_attr("textAlign", Align::Center.as_str())
            .with_child(DocNode::text(text.clone()).with_mark(Mark::bold()))],
        RenderBlock::Header { left, right } => {
            let mut nodes = Vec::new();
            if !left.is_empty() {
                nodes.push(paragraph(&left.join(" "), Align::Left));
            }
            if !right.is_empty() {
                nodes.push(paragraph(&right.join(" "), Align::Right));
            }
            nodes
        }
        RenderBlock::Meta { text, align } => vec![paragraph(text, *align)],
        RenderBlock::Paragraph { text, .. } => {
            vec![DocNode::new("paragraph").with_child(DocNode::text(text.clone()))]
        }
        RenderBlock::Table { rows } => {
            let mut table = DocNode::new("table");
            for row in rows {
                let mut table_row = DocNode::new("tableRow");
                for cell in row {
                    table_row = table_row.with_child(
                        DocNode::new("tableCell").with_child(
                            DocNode::new("paragraph").with_child(DocNode::text(cell.clone())),
                        ),
                    );
                }
                table = table.with_child(table_row);
            }
            vec![table]
        }
    }
}

fn paragraph(text: &str, align: Align) -> DocNode {
    DocNode::new("paragraph")
        .with_attr("textAlign", align.as_str())
        .with_child(DocNode::text(text))
}

/// Parse an untrusted document tree.
///
/// The text goes through the defensive JSON extractor; the root must be a
/// `doc` node. Failures are [`Error::Parse`].
pub fn parse_doc_tree(raw: &str) -> Result<DocNode> {
    let value = extract_json(raw)?;
    match value.get("type").and_then(Value::as_str) {
        Some("doc") => {}
        Some(other) => {
            return Err(Error::Parse(format!(
                "root node must be \"doc\", got \"{}\"",
                other
            )))
        }
        None => return Err(Error::Parse("root node has no type".to_string())),
    }
    serde_json::from_value(value).map_err(|e| Error::Parse(format!("invalid document tree: {}", e)))
}

/// Fix up heading attributes throughout the tree.
///
/// A `level` found on the node itself moves into `attrs`; headings get
/// `level = 2` and `textAlign = "left"` unless already set.
pub fn normalize(mut node: DocNode) -> DocNode {
    if node.node_type == "heading" {
        let misplaced = node.extra.remove("level");
        let attrs = node.attrs.get_or_insert_with(Map::new);
        if let Some(level) = misplaced {
            attrs.insert("level".to_string(), level);
        }
        attrs
            .entry("level")
            .or_insert_with(|| Value::from(DEFAULT_HEADING_LEVEL));
        attrs
            .entry("textAlign")
            .or_insert_with(|| Value::from(Align::Left.as_str()));
    }

    node.content = node.content.into_iter().map(normalize).collect();
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Label;
    use serde_json::json;

    #[test]
    fn test_blocks_to_tree() {
        let tree = blocks_to_tree(&[
            RenderBlock::Title {
                text: "INVOICE".into(),
            },
            RenderBlock::Paragraph {
                class: Label::DocBody,
                text: "Total: 100".into(),
            },
            RenderBlock::Table {
                rows: vec![vec!["a".into(), "b".into()]],
            },
        ]);

        let value = serde_json::to_value(&tree).unwrap();
        assert_eq!(value["type"], "doc");
        assert_eq!(value["content"][0]["type"], "heading");
        assert_eq!(value["content"][0]["attrs"], json!({"level": 2, "textAlign": "center"}));
        assert_eq!(value["content"][0]["content"][0]["marks"], json!([{"type": "bold"}]));
        assert_eq!(value["content"][1]["content"][0]["text"], "Total: 100");
        assert!(value["content"][1].get("attrs").is_none());
        assert_eq!(
            value["content"][2]["content"][0]["content"][1]["type"],
            "tableCell"
        );
        assert_eq!(tree.plain_text(), "INVOICE Total: 100 a b");
    }

    #[test]
    fn test_parse_doc_tree() {
        let tree = parse_doc_tree("```json\n{\"type\": \"doc\", \"content\": [{\"type\": \"paragraph\"}]}\n```")
            .unwrap();
        assert_eq!(tree.content.len(), 1);

        assert!(matches!(
            parse_doc_tree(r#"{"type": "paragraph"}"#),
            Err(Error::Parse(_))
        ));
        assert!(matches!(parse_doc_tree("[]"), Err(Error::Parse(_))));
        assert!(matches!(parse_doc_tree("garbage"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_normalize_headings() {
        let tree = parse_doc_tree(
            r#"{"type": "doc", "content": [
                {"type": "heading", "level": 1, "content": [{"type": "text", "text": "A"}]},
                {"type": "heading", "attrs": {"textAlign": "center"}},
                {"type": "table", "content": [{"type": "heading"}]}
            ]}"#,
        )
        .unwrap();
        let tree = normalize(tree);

        assert_eq!(tree.content[0].attr("level"), Some(&json!(1)));
        assert_eq!(tree.content[0].attr("textAlign"), Some(&json!("left")));
        assert!(tree.content[0].extra.is_empty());
        assert_eq!(tree.content[1].attr("level"), Some(&json!(2)));
        assert_eq!(tree.content[1].attr("textAlign"), Some(&json!("center")));
        assert_eq!(tree.content[2].content[0].attr("level"), Some(&json!(2)));
    }

    #[test]
    fn test_unknown_keys_survive() {
        let tree = parse_doc_tree(r#"{"type": "doc", "version": 3}"#).unwrap();
        let json = tree.to_json(JsonFormat::Compact).unwrap();
        assert_eq!(json, r#"{"type":"doc","version":3}"#);
    }
}
