//! Markdown rendering for classified documents.

use crate::model::ClassifiedDocument;

use super::{build_blocks, RenderBlock, RenderOptions};

/// Convert a classified document to Markdown.
pub fn to_markdown(doc: &ClassifiedDocument, options: &RenderOptions) -> String {
    MarkdownRenderer::new(options.clone()).render(doc)
}

/// Markdown renderer.
pub struct MarkdownRenderer {
    options: RenderOptions,
}

impl MarkdownRenderer {
    /// Create a new renderer with options.
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Render the document.
    pub fn render(&self, doc: &ClassifiedDocument) -> String {
        let blocks = build_blocks(doc);
        let mut output = String::new();
        for block in &blocks {
            self.render_block(&mut output, block);
        }
        output.trim_end().to_string() + "\n"
    }

    fn render_block(&self, output: &mut String, block: &RenderBlock) {
        match block {
            RenderBlock::Title { text } => {
                output.push_str(&format!("## {}\n\n", self.escape(text)));
            }
            RenderBlock::Header { left, right } => {
                for line in left.iter().chain(right) {
                    output.push_str(&format!("{}  \n", self.escape(line)));
                }
                output.push('\n');
            }
            RenderBlock::Meta { text, .. } | RenderBlock::Paragraph { text, .. } => {
                output.push_str(&format!("{}\n\n", self.escape(text)));
            }
            RenderBlock::Table { rows } => self.render_table(output, rows),
        }
    }

    fn render_table(&self, output: &mut String, rows: &[Vec<String>]) {
        let col_count = rows.iter().map(Vec::len).max().unwrap_or(0);
        if col_count == 0 {
            return;
        }

        for (i, row) in rows.iter().enumerate() {
            output.push('|');
            for col in 0..col_count {
                let cell = row.get(col).map(String::as_str).unwrap_or("");
                output.push_str(&format!(" {} |", escape_markdown(cell.trim())));
            }
            output.push('\n');

            // Add separator after header row
            if i == 0 {
                output.push('|');
                output.push_str(&" --- |".repeat(col_count));
                output.push('\n');
            }
        }

        output.push('\n');
    }

    fn escape(&self, text: &str) -> String {
        if self.options.escape_special_chars {
            escape_markdown(text)
        } else {
            text.to_string()
        }
    }
}

/// Escape characters that could be misinterpreted as Markdown syntax.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '`' | '*' | '_' | '[' | ']' | '|' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}
