//! Parser and formatter configuration.
//!
//! A [`Settings`] value is immutable once handed to a
//! [`SmartFormatter`](crate::SmartFormatter); sharing it read-only across
//! concurrent format calls is the intended usage. [`ParserSettings`]
//! implements `Hash` so caches can fingerprint the configuration a template
//! was parsed under.

use core::hash::{Hash, Hasher};
use std::hash::DefaultHasher;

/// What to do when parsing or formatting fails.
///
/// The same policy shape applies at parse time and at format time; see the
/// `error_action` fields on [`ParserSettings`] and [`FormatterSettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorAction {
    /// Raise immediately. Recommended during development.
    #[default]
    Throw,
    /// Splice a diagnostic marker into the output in place of the failing
    /// span and continue with the remaining items.
    OutputErrorInResult,
    /// Suppress the error and emit best-effort partial output.
    Ignore,
    /// Leave the original, unresolved source text verbatim in the output.
    MaintainTokens,
}

/// How literal braces and control characters are written in templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EscapeStyle {
    /// `{{` and `}}` produce literal braces (the default).
    DoubleBrace,
    /// A designated escape character (conventionally `\`) followed by one
    /// of `{ } \ : n t r` produces the literal character or control
    /// shorthand. Brace doubling is disabled in this style.
    Char(char),
}

/// Configuration consumed by the [`Parser`](crate::Parser).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParserSettings {
    /// Escaping style for literal text.
    pub escape: EscapeStyle,
    /// Characters that separate selectors in a chain. Runs of consecutive
    /// splitters collapse into a single operator.
    pub splitters: Vec<char>,
    /// The character introducing an alignment suffix (`{0,10}`).
    pub alignment_marker: char,
    /// The operator character that short-circuits resolution when the
    /// current value is null (`{a?.b}`).
    pub nullable_marker: char,
    /// Policy for malformed templates.
    pub error_action: ErrorAction,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            escape: EscapeStyle::DoubleBrace,
            splitters: vec!['.', '?', '[', ']', '(', ')'],
            alignment_marker: ',',
            nullable_marker: '?',
            error_action: ErrorAction::Throw,
        }
    }
}

impl ParserSettings {
    /// True if `c` separates selectors.
    pub fn is_splitter(&self, c: char) -> bool {
        self.splitters.contains(&c)
    }

    /// A stable digest of this configuration, used to scope cache entries
    /// so a settings change never serves a stale tree.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

/// Configuration consumed by the evaluation engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormatterSettings {
    /// Policy for failures raised while evaluating a placeholder.
    pub error_action: ErrorAction,
    /// Maximum nested-evaluation depth before the engine fails fast with
    /// [`FormatError::NestingTooDeep`](crate::FormatError::NestingTooDeep).
    /// `None` disables the guard.
    pub max_nesting_depth: Option<usize>,
    /// Whether map lookups in the built-in value source require an exact
    /// case match. When false, a case-insensitive retry runs after the
    /// exact lookup fails.
    pub case_sensitive: bool,
}

impl Default for FormatterSettings {
    fn default() -> Self {
        Self {
            error_action: ErrorAction::Throw,
            max_nesting_depth: Some(64),
            case_sensitive: true,
        }
    }
}

/// Combined configuration for a [`SmartFormatter`](crate::SmartFormatter).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Settings {
    /// Parser-side settings.
    pub parser: ParserSettings,
    /// Formatter-side settings.
    pub formatter: FormatterSettings,
}

impl Settings {
    /// Default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one error action to both parse-time and format-time failures.
    pub fn with_error_action(mut self, action: ErrorAction) -> Self {
        self.parser.error_action = action;
        self.formatter.error_action = action;
        self
    }

    /// Set the escaping style.
    pub fn with_escape(mut self, escape: EscapeStyle) -> Self {
        self.parser.escape = escape;
        self
    }

    /// Replace the selector splitter set.
    pub fn with_splitters(mut self, splitters: impl IntoIterator<Item = char>) -> Self {
        self.parser.splitters = splitters.into_iter().collect();
        self
    }

    /// Set or disable the recursion-depth guard.
    pub fn with_max_nesting_depth(mut self, depth: Option<usize>) -> Self {
        self.formatter.max_nesting_depth = depth;
        self
    }

    /// Toggle case sensitivity for built-in value lookups.
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.formatter.case_sensitive = case_sensitive;
        self
    }
}
