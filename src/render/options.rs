//! Rendering options and configuration.

/// Options for rendering classified documents.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Attach geometry hints to the document tree root
    pub include_hints: bool,

    /// Draw table borders in HTML output
    pub table_border: bool,

    /// CSS class of the HTML wrapper element
    pub document_class: String,

    /// Escape special Markdown characters
    pub escape_special_chars: bool,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Include or omit geometry hints in the document tree.
    pub fn with_hints(mut self, include: bool) -> Self {
        self.include_hints = include;
        self
    }

    /// Enable or disable HTML table borders.
    pub fn with_table_border(mut self, border: bool) -> Self {
        self.table_border = border;
        self
    }

    /// Set the HTML wrapper class.
    pub fn with_document_class(mut self, class: impl Into<String>) -> Self {
        self.document_class = class.into();
        self
    }

    /// Enable or disable Markdown escaping.
    pub fn with_escape_special_chars(mut self, escape: bool) -> Self {
        self.escape_special_chars = escape;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            include_hints: false,
            table_border: true,
            document_class: "document".to_string(),
            escape_special_chars: true,
        }
    }
}
