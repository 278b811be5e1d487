//! The immutable syntax tree a template parses into.
//!
//! Every node references the original template (`Arc<str>`) by byte span
//! instead of copying substrings; the only owned text in a tree is the
//! decoded form of literal runs that contained escape sequences. This is
//! what makes the round-trip law hold: concatenating each item's
//! [`source_text`](FormatItem::source_text) reproduces the input
//! bit-for-bit, and a parsed tree can be cached and replayed against many
//! argument sets without touching the source again.

use core::ops::Range;
use std::sync::Arc;

use crate::error::ParseIssue;

/// An ordered sequence of format items: the root of a parsed template, and
/// the nested sub-template of every placeholder that carries one.
#[derive(Debug, Clone)]
pub struct Format {
    pub(crate) src: Arc<str>,
    pub(crate) span: Range<usize>,
    pub(crate) items: Vec<FormatItem>,
}

impl Format {
    /// The full template this tree was parsed from.
    pub fn source(&self) -> &str {
        &self.src
    }

    /// The exact substring of the source this node covers.
    pub fn source_text(&self) -> &str {
        &self.src[self.span.clone()]
    }

    /// This node's byte span within the source.
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    /// The items in source order.
    pub fn items(&self) -> &[FormatItem] {
        &self.items
    }

    /// True if any direct item is a placeholder. Formatters use this to
    /// decide between "format string" and "sub-template" interpretations
    /// of their nested format.
    pub fn has_placeholders(&self) -> bool {
        self.items.iter().any(|item| matches!(item, FormatItem::Placeholder(_)))
    }

    /// The decoded literal text of this format, ignoring placeholders and
    /// issues. For a format with no placeholders this is the whole body
    /// with escapes resolved.
    pub fn literal_text(&self) -> String {
        let mut out = String::new();
        for item in &self.items {
            if let FormatItem::Literal(lit) = item {
                out.push_str(lit.text());
            }
        }
        out
    }
}

/// One node of a parsed template.
#[derive(Debug, Clone)]
pub enum FormatItem {
    /// A verbatim run of output text (escapes already resolved).
    Literal(LiteralText),
    /// A `{...}` unit representing one value to resolve and render.
    Placeholder(Box<Placeholder>),
    /// A recoverable parse diagnostic carried through to format time so
    /// the configured error action can be applied there.
    Issue(ParseIssue),
}

impl FormatItem {
    /// The exact substring of the source this item covers.
    pub fn source_text<'f>(&'f self, format: &'f Format) -> &'f str {
        let span = match self {
            FormatItem::Literal(lit) => lit.span.clone(),
            FormatItem::Placeholder(ph) => ph.span.clone(),
            FormatItem::Issue(issue) => issue.span.clone(),
        };
        &format.src[span]
    }
}

/// A literal run of template text.
#[derive(Debug, Clone)]
pub struct LiteralText {
    pub(crate) src: Arc<str>,
    pub(crate) span: Range<usize>,
    /// `Some` only when the run contained escape sequences.
    pub(crate) decoded: Option<String>,
}

impl LiteralText {
    /// The output text of this run, with escapes resolved. Borrows from
    /// the source when no escapes were present.
    pub fn text(&self) -> &str {
        match &self.decoded {
            Some(decoded) => decoded,
            None => &self.src[self.span.clone()],
        }
    }

    /// The raw source text, escapes included.
    pub fn source_text(&self) -> &str {
        &self.src[self.span.clone()]
    }

    /// This run's byte span within the source.
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }
}

/// A `{...}` unit: selector chain, optional alignment, optional formatter
/// name/options, optional nested sub-template.
#[derive(Debug, Clone)]
pub struct Placeholder {
    pub(crate) src: Arc<str>,
    pub(crate) span: Range<usize>,
    pub(crate) selectors: Vec<Selector>,
    pub(crate) alignment: i32,
    pub(crate) formatter_name: Option<Range<usize>>,
    pub(crate) formatter_options: Option<Range<usize>>,
    pub(crate) format: Option<Format>,
}

impl Placeholder {
    /// The selector chain, in navigation order. Empty means "the current
    /// value".
    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    /// Column alignment: positive pads on the left (right-aligns),
    /// negative pads on the right, zero means none.
    pub fn alignment(&self) -> i32 {
        self.alignment
    }

    /// The explicitly requested formatter name, if one was written.
    pub fn formatter_name(&self) -> Option<&str> {
        self.formatter_name.clone().map(|r| &self.src[r])
    }

    /// The formatter options written in parentheses after the name.
    pub fn formatter_options(&self) -> Option<&str> {
        self.formatter_options.clone().map(|r| &self.src[r])
    }

    /// The nested sub-template after the format colon, if any.
    pub fn format(&self) -> Option<&Format> {
        self.format.as_ref()
    }

    /// The exact substring of the source this placeholder covers,
    /// including its braces.
    pub fn source_text(&self) -> &str {
        &self.src[self.span.clone()]
    }

    /// This placeholder's byte span within the source.
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }
}

/// One step in a selector chain.
#[derive(Debug, Clone)]
pub struct Selector {
    pub(crate) src: Arc<str>,
    pub(crate) text: Range<usize>,
    pub(crate) operator: Range<usize>,
    pub(crate) index: usize,
}

impl Selector {
    /// The selector token itself.
    pub fn text(&self) -> &str {
        &self.src[self.text.clone()]
    }

    /// The splitter run preceding this selector (empty for the first
    /// selector of a chain).
    pub fn operator(&self) -> &str {
        &self.src[self.operator.clone()]
    }

    /// This selector's position within its chain.
    pub fn index(&self) -> usize {
        self.index
    }
}
