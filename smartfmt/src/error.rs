//! Error types for parsing and evaluation.

use core::fmt::{self, Display};
use core::ops::Range;
use std::sync::Arc;

/// Specific kinds of parse-time issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseIssueKind {
    /// A placeholder was opened but the input ended before it closed.
    UnclosedPlaceholder,
    /// A `}` appeared with no placeholder open.
    UnexpectedClosingBrace,
    /// A character that is neither a selector character nor a splitter
    /// appeared in a selector position.
    InvalidSelectorChar(char),
    /// The text after the alignment marker was not a signed integer.
    InvalidAlignment,
    /// The escape character was not followed by an escapable character.
    DanglingEscape(char),
    /// Formatter options were opened with `(` but never closed.
    UnclosedFormatterOptions,
    /// A character appeared where the grammar allows none, e.g. between
    /// closed formatter options and the format colon.
    UnexpectedChar(char),
}

impl Display for ParseIssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseIssueKind::UnclosedPlaceholder => write!(f, "unclosed placeholder"),
            ParseIssueKind::UnexpectedClosingBrace => {
                write!(f, "closing brace without a matching opening brace")
            }
            ParseIssueKind::InvalidSelectorChar(c) => {
                write!(f, "invalid character {c:?} in selector")
            }
            ParseIssueKind::InvalidAlignment => write!(f, "alignment is not a signed integer"),
            ParseIssueKind::DanglingEscape(c) => {
                write!(f, "escape character followed by unescapable {c:?}")
            }
            ParseIssueKind::UnclosedFormatterOptions => {
                write!(f, "formatter options are missing the closing parenthesis")
            }
            ParseIssueKind::UnexpectedChar(c) => write!(f, "unexpected character {c:?}"),
        }
    }
}

/// One structured parse diagnostic: what went wrong, where, and the
/// offending span of the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    /// What went wrong.
    pub kind: ParseIssueKind,
    /// Byte offset of the offending character.
    pub index: usize,
    /// The span the issue invalidates. Under the maintain-tokens policy
    /// this span is emitted verbatim.
    pub span: Range<usize>,
}

impl Display for ParseIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at index {}", self.kind, self.index)
    }
}

/// Aggregate parse error: all issues found in one template, plus the
/// template text for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseErrors {
    /// The template that failed to parse.
    pub template: String,
    /// Every issue found, in source order.
    pub issues: Vec<ParseIssue>,
}

impl Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse template {:?}: ", self.template)?;
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl core::error::Error for ParseErrors {}

/// An error raised by a [`Source`](crate::Source) or
/// [`Formatter`](crate::Formatter) implementation.
///
/// Extensions signal "not handled" through their return value, never
/// through this type; a `FormattingError` is reserved for genuinely
/// exceptional failures.
#[derive(Debug)]
pub struct FormattingError {
    message: String,
    source: Option<Box<dyn core::error::Error + Send + Sync>>,
}

impl FormattingError {
    /// A new error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), source: None }
    }

    /// Attach an inner cause.
    pub fn with_source(
        mut self,
        source: impl core::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for FormattingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl core::error::Error for FormattingError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn core::error::Error + 'static))
    }
}

/// The evaluation engine's error type.
///
/// Format-time variants carry the template text and the byte offset of the
/// placeholder that failed, so a failure deep in a nested tree is still
/// diagnosable from the top.
#[derive(Debug)]
pub enum FormatError {
    /// The template failed to parse.
    Parse(ParseErrors),
    /// No registered source resolved a selector step.
    Selector {
        /// The selector text that nothing resolved.
        selector: String,
        /// The selector's position within its chain.
        chain_index: usize,
        /// Byte offset of the enclosing placeholder.
        index: usize,
        /// The template being evaluated.
        template: Arc<str>,
    },
    /// No registered formatter rendered the resolved value.
    NoFormatter {
        /// The explicitly requested formatter name, if any. `None` means
        /// every auto-detect formatter declined.
        name: Option<String>,
        /// Byte offset of the placeholder.
        index: usize,
        /// The template being evaluated.
        template: Arc<str>,
    },
    /// A source or formatter raised an unexpected error.
    Formatting {
        /// Byte offset of the placeholder being evaluated.
        index: usize,
        /// The template being evaluated.
        template: Arc<str>,
        /// The inner cause.
        source: FormattingError,
    },
    /// Nested evaluation exceeded the configured depth guard.
    NestingTooDeep {
        /// The configured limit.
        limit: usize,
    },
    /// The output sink refused a write.
    Output,
}

impl Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::Parse(errors) => write!(f, "{errors}"),
            FormatError::Selector { selector, chain_index, index, .. } => write!(
                f,
                "no source handled selector {selector:?} (step {chain_index}) at index {index}"
            ),
            FormatError::NoFormatter { name: Some(name), index, .. } => {
                write!(f, "no formatter named {name:?} handled the value at index {index}")
            }
            FormatError::NoFormatter { name: None, index, .. } => {
                write!(f, "no formatter handled the value at index {index}")
            }
            FormatError::Formatting { index, source, .. } => {
                write!(f, "formatting failed at index {index}: {source}")
            }
            FormatError::NestingTooDeep { limit } => {
                write!(f, "nested evaluation exceeded the depth limit of {limit}")
            }
            FormatError::Output => write!(f, "the output sink refused a write"),
        }
    }
}

impl core::error::Error for FormatError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            FormatError::Parse(errors) => Some(errors),
            FormatError::Formatting { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ParseErrors> for FormatError {
    fn from(errors: ParseErrors) -> Self {
        FormatError::Parse(errors)
    }
}
