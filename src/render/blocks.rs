//! Block model shared by every output view.

use serde::{Deserialize, Serialize};

use crate::layout::should_merge_rows;
use crate::model::{join_texts, ClassifiedDocument, Label, Row, Segment};

/// Horizontal alignment of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    pub fn as_str(&self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
        }
    }
}

/// One renderable block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderBlock {
    /// Centered, bold title
    Title { text: String },

    /// Two-column header; each entry is one visual line
    Header { left: Vec<String>, right: Vec<String> },

    /// Short aligned note such as a page continuation marker
    Meta { text: String, align: Align },

    /// Paragraph of flow text
    Paragraph { class: Label, text: String },

    /// Table cells, row-major
    Table { rows: Vec<Vec<String>> },
}

impl RenderBlock {
    /// Plain text of the block; table cells are joined row-major.
    pub fn text(&self) -> String {
        match self {
            RenderBlock::Title { text }
            | RenderBlock::Meta { text, .. }
            | RenderBlock::Paragraph { text, .. } => text.clone(),
            RenderBlock::Header { left, right } => left
                .iter()
                .chain(right)
                .filter(|t| !t.is_empty())
                .cloned()
                .collect::<Vec<_>>()
                .join(" "),
            RenderBlock::Table { rows } => rows
                .iter()
                .flatten()
                .filter(|t| !t.is_empty())
                .cloned()
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// Label-style class name for HTML output.
    pub fn class_name(&self) -> &'static str {
        match self {
            RenderBlock::Title { .. } => "doc-title",
            RenderBlock::Header { .. } => "doc-header",
            RenderBlock::Meta { .. } => "doc-meta",
            RenderBlock::Paragraph { class, .. } => class.as_str(),
            RenderBlock::Table { .. } => "doc-table",
        }
    }
}

/// Build the block list in a single forward pass.
///
/// Header split and paragraph merge gap come from the document's
/// [`settings`](ClassifiedDocument::settings), so rendering agrees with
/// the classification it renders.
pub fn build_blocks(doc: &ClassifiedDocument) -> Vec<RenderBlock> {
    let split = doc.page_width * doc.settings.header_split_ratio;
    let mut builder = BlockBuilder::new(doc.settings.merge_gap_factor);

    for segment in &doc.segments {
        match segment {
            Segment::Table { rows, .. } => {
                builder.push(RenderBlock::Table {
                    rows: rows.iter().map(table_cells).collect(),
                });
            }
            Segment::Row { label, row, .. } => {
                let text = row.text();
                if text.is_empty() {
                    continue;
                }
                match label {
                    Label::DocBody | Label::Unresolved => builder.body(row),
                    Label::PageContinuation => builder.push(RenderBlock::Meta {
                        text,
                        align: Align::Right,
                    }),
                    Label::DocHeader => builder.push(header_block(row, split)),
                    Label::DocTitle => builder.push(RenderBlock::Title { text }),
                    Label::DocSalutation | Label::DocMeta | Label::DocSignoff => {
                        builder.push(RenderBlock::Paragraph {
                            class: *label,
                            text,
                        })
                    }
                }
            }
        }
    }

    builder.finish()
}

/// Concatenated text of all blocks, in order.
pub fn blocks_text(blocks: &[RenderBlock]) -> String {
    blocks
        .iter()
        .map(RenderBlock::text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn table_cells(row: &Row) -> Vec<String> {
    row.boxes()
        .iter()
        .map(|b| b.text().trim().to_string())
        .collect()
}

fn header_block(row: &Row, split: f32) -> RenderBlock {
    let mut left = Vec::new();
    let mut right = Vec::new();

    for line in row.lines() {
        let (l, r): (Vec<_>, Vec<_>) = line.iter().cloned().partition(|b| b.x() < split);
        let l = join_texts(&l);
        let r = join_texts(&r);
        if !l.is_empty() {
            left.push(l);
        }
        if !r.is_empty() {
            right.push(r);
        }
    }

    RenderBlock::Header { left, right }
}

/// Accumulates body rows and flushes them exactly once per paragraph.
struct BlockBuilder {
    blocks: Vec<RenderBlock>,
    buffer: Option<Row>,
    merge_gap_factor: f32,
}

impl BlockBuilder {
    fn new(merge_gap_factor: f32) -> Self {
        Self {
            blocks: Vec::new(),
            buffer: None,
            merge_gap_factor,
        }
    }

    fn push(&mut self, block: RenderBlock) {
        self.flush();
        self.blocks.push(block);
    }

    fn body(&mut self, row: &Row) {
        self.buffer = match self.buffer.take() {
            Some(open) if should_merge_rows(&open, row, self.merge_gap_factor) => {
                Some(open.merged_with(row.clone()))
            }
            Some(open) => {
                self.emit(open);
                Some(row.clone())
            }
            None => Some(row.clone()),
        };
    }

    fn flush(&mut self) {
        if let Some(open) = self.buffer.take() {
            self.emit(open);
        }
    }

    fn emit(&mut self, row: Row) {
        let text = row.text();
        if text.is_empty() {
            return;
        }
        self.blocks.push(RenderBlock::Paragraph {
            class: Label::DocBody,
            text,
        });
    }

    fn finish(mut self) -> Vec<RenderBlock> {
        self.flush();
        self.blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocumentSettings, GeometryHints, OcrBox, TableRange};
    use std::collections::BTreeMap;

    fn row(boxes: &[(&str, f32)], y: f32) -> Row {
        Row::from_boxes(
            boxes
                .iter()
                .map(|(t, x)| OcrBox::new(*t, *x, y, 60.0, 12.0, 0.9))
                .collect(),
        )
    }

    fn doc(rows: Vec<Row>, labels: &[(usize, Label)], tables: &[TableRange]) -> ClassifiedDocument {
        let labels: BTreeMap<usize, Label> = labels.iter().copied().collect();
        ClassifiedDocument::assemble(rows, tables, &labels, 800.0, GeometryHints::new())
    }

    #[test]
    fn test_body_rows_merge_into_paragraph() {
        let d = doc(
            vec![
                row(&[("The tenant", 20.0)], 0.0),
                row(&[("shall pay", 20.0)], 20.0),
                row(&[("Another point", 20.0)], 40.0),
            ],
            &[],
            &[],
        );
        let blocks = build_blocks(&d);
        assert_eq!(
            blocks,
            vec![
                RenderBlock::Paragraph {
                    class: Label::DocBody,
                    text: "The tenant shall pay".into()
                },
                RenderBlock::Paragraph {
                    class: Label::DocBody,
                    text: "Another point".into()
                },
            ]
        );
    }

    #[test]
    fn test_distant_page_number_is_its_own_paragraph() {
        let d = doc(
            vec![
                row(&[("The total payable is", 20.0)], 40.0),
                row(&[("12", 380.0)], 900.0),
            ],
            &[],
            &[],
        );
        let blocks = build_blocks(&d);
        let texts: Vec<String> = blocks.iter().map(RenderBlock::text).collect();
        assert_eq!(texts, vec!["The total payable is", "12"]);
    }

    #[test]
    fn test_paragraph_gap_follows_document_settings() {
        let rows = vec![
            row(&[("The tenant", 20.0)], 0.0),
            row(&[("shall pay", 20.0)], 60.0),
        ];
        let d = doc(rows.clone(), &[], &[]);
        assert_eq!(build_blocks(&d).len(), 2);

        let wide = doc(rows, &[], &[]).with_settings(DocumentSettings {
            merge_gap_factor: 5.0,
            ..Default::default()
        });
        assert_eq!(build_blocks(&wide).len(), 1);
    }

    #[test]
    fn test_header_split_follows_document_settings() {
        let d = doc(
            vec![row(&[("Advocate", 20.0), ("Date: 01.02.2024", 380.0)], 0.0)],
            &[(0, Label::DocHeader)],
            &[],
        )
        .with_settings(DocumentSettings {
            header_split_ratio: 0.4,
            ..Default::default()
        });
        assert_eq!(
            build_blocks(&d)[0],
            RenderBlock::Header {
                left: vec!["Advocate".into()],
                right: vec!["Date: 01.02.2024".into()],
            }
        );
    }

    #[test]
    fn test_non_body_block_flushes_buffer() {
        let d = doc(
            vec![
                row(&[("Body text", 20.0)], 0.0),
                row(&[("To", 20.0)], 20.0),
                row(&[("continued", 20.0)], 40.0),
            ],
            &[(1, Label::DocSalutation)],
            &[],
        );
        let blocks = build_blocks(&d);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1].class_name(), "doc-salutation");
        assert_eq!(blocks[2].text(), "continued");
    }

    #[test]
    fn test_header_and_meta_blocks() {
        let d = doc(
            vec![
                row(&[("Advocate", 20.0), ("Date: 01.02.2024", 600.0)], 0.0),
                row(&[("...5", 700.0)], 40.0),
            ],
            &[(0, Label::DocHeader), (1, Label::PageContinuation)],
            &[],
        );
        let blocks = build_blocks(&d);
        assert_eq!(
            blocks[0],
            RenderBlock::Header {
                left: vec!["Advocate".into()],
                right: vec!["Date: 01.02.2024".into()],
            }
        );
        assert_eq!(
            blocks[1],
            RenderBlock::Meta {
                text: "...5".into(),
                align: Align::Right
            }
        );
    }

    #[test]
    fn test_table_block_and_round_trip() {
        let rows = vec![
            row(&[("Intro text", 20.0)], 0.0),
            row(&[("a", 20.0), ("b", 300.0)], 20.0),
            row(&[("c", 20.0), ("d", 300.0)], 40.0),
            row(&[("Closing", 20.0)], 60.0),
        ];
        let expected: Vec<String> = rows.iter().map(Row::text).collect();
        let d = doc(rows, &[], &[TableRange::new(1, 2, 2)]);
        let blocks = build_blocks(&d);

        assert_eq!(
            blocks[1],
            RenderBlock::Table {
                rows: vec![vec!["a".into(), "b".into()], vec!["c".into(), "d".into()]]
            }
        );
        assert_eq!(blocks_text(&blocks), expected.join(" "));
    }
}
