//! Rendering module for converting classified documents to output formats.
//!
//! Every view is derived from the same block list built by
//! [`build_blocks`], so HTML, the document tree, Markdown and plain text
//! always agree on paragraph boundaries.

mod blocks;
mod html;
mod json;
mod markdown;
mod options;
mod text;
pub mod tree;

pub use blocks::{blocks_text, build_blocks, Align, RenderBlock};
pub use html::{escape_html, to_html, HtmlRenderer};
pub use json::{hints_to_json, to_json, JsonFormat};
pub use markdown::{to_markdown, MarkdownRenderer};
pub use options::RenderOptions;
pub use text::to_text;
pub use tree::{normalize, parse_doc_tree, to_doc_tree, DocNode, Mark};
