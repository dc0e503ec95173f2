//! HTML fragment rendering.

use crate::model::ClassifiedDocument;

use super::{build_blocks, RenderBlock, RenderOptions};

/// Convert a classified document to an HTML fragment.
pub fn to_html(doc: &ClassifiedDocument, options: &RenderOptions) -> String {
    HtmlRenderer::new(options.clone()).render(doc)
}

/// HTML renderer.
pub struct HtmlRenderer {
    options: RenderOptions,
}

impl HtmlRenderer {
    /// Create a new renderer with options.
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Render the document.
    pub fn render(&self, doc: &ClassifiedDocument) -> String {
        let blocks = build_blocks(doc);
        self.render_blocks(&blocks)
    }

    /// Render an already built block list.
    pub fn render_blocks(&self, blocks: &[RenderBlock]) -> String {
        let mut lines = vec![format!(
            "<div class=\"{}\">",
            escape_html(&self.options.document_class)
        )];

        for block in blocks {
            self.render_block(&mut lines, block);
        }

        lines.push("</div>".to_string());
        lines.join("\n")
    }

    fn render_block(&self, lines: &mut Vec<String>, block: &RenderBlock) {
        match block {
            RenderBlock::Title { text } => lines.push(format!(
                "<p class=\"doc-title\" style=\"text-align:center; font-weight:bold; margin:12px 0;\">{}</p>",
                escape_html(text)
            )),
            RenderBlock::Header { left, right } => {
                lines.push(
                    "<div class=\"doc-header\" style=\"display:flex; justify-content:space-between; margin-bottom:12px;\">"
                        .to_string(),
                );
                lines.push(format!("<div>{}</div>", line_breaks(left)));
                lines.push(format!(
                    "<div style=\"text-align:right;\">{}</div>",
                    line_breaks(right)
                ));
                lines.push("</div>".to_string());
            }
            RenderBlock::Meta { text, align } => lines.push(format!(
                "<p class=\"doc-meta\" style=\"text-align:{};\">{}</p>",
                align.as_str(),
                escape_html(text)
            )),
            RenderBlock::Paragraph { class, text } => {
                lines.push(format!("<p class=\"{}\">{}</p>", class, escape_html(text)))
            }
            RenderBlock::Table { rows } => self.render_table(lines, rows),
        }
    }

    fn render_table(&self, lines: &mut Vec<String>, rows: &[Vec<String>]) {
        if self.options.table_border {
            lines.push(
                "<table border=\"1\" style=\"border-collapse:collapse; width:100%;\">".to_string(),
            );
        } else {
            lines.push("<table style=\"width:100%;\">".to_string());
        }
        for row in rows {
            let cells: String = row
                .iter()
                .map(|cell| format!("<td>{}</td>", escape_html(cell)))
                .collect();
            lines.push(format!("<tr>{}</tr>", cells));
        }
        lines.push("</table>".to_string());
    }
}

fn line_breaks(lines: &[String]) -> String {
    lines
        .iter()
        .map(|l| format!("{}<br>", escape_html(l)))
        .collect()
}

/// Escape text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
