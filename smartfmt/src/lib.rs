//! A composition-first string formatting engine.
//!
//! Templates mix literal text with `{...}` placeholders. A placeholder
//! names a value through a selector chain (`{Person.Address.City}`),
//! optionally aligns it (`{Total,10}`), optionally names a formatter with
//! options (`{Items:list(, )}`), and may nest a whole sub-template as its
//! format body (`{Order:{Id} of {Total}}`). Parsing and evaluation are
//! separate phases: templates parse once into an immutable, shareable
//! tree, then render any number of times against different arguments.
//!
//! ```
//! use smartfmt::SmartFormatter;
//! use smartfmt_value::map;
//!
//! let fmt = SmartFormatter::default();
//! let user = map! { "Name" => "Ada", "Logins" => 42 };
//! let out = fmt.format("{0.Name} has {0.Logins:N0} logins", &[user]).unwrap();
//! assert_eq!(out, "Ada has 42 logins");
//! ```
//!
//! Resolution and rendering are both pluggable: register [`Source`] and
//! [`Formatter`] implementations to teach the engine new selector
//! semantics or new output styles without touching the engine itself.

#[cfg(feature = "tracing")]
macro_rules! trace {
    ($($tt:tt)*) => {
        tracing::trace!($($tt)*)
    };
}
#[cfg(not(feature = "tracing"))]
macro_rules! trace {
    ($($tt:tt)*) => {};
}

#[cfg(feature = "tracing")]
macro_rules! debug {
    ($($tt:tt)*) => {
        tracing::debug!($($tt)*)
    };
}
#[cfg(not(feature = "tracing"))]
macro_rules! debug {
    ($($tt:tt)*) => {};
}

mod ast;
mod cache;
mod error;
pub mod extensions;
mod format;
mod output;
mod parser;
mod pool;
mod settings;

pub use ast::{Format, FormatItem, LiteralText, Placeholder, Selector};
pub use cache::FormatCache;
pub use error::{FormatError, FormattingError, ParseErrors, ParseIssue, ParseIssueKind};
pub use extensions::{Formatter, Priority, SelectorInfo, Source, SourceOutcome};
pub use format::{FormattingInfo, SmartFormatter};
pub use output::{FmtOutput, IoOutput, Output, StringOutput};
pub use parser::{Parser, split_nested, split_nested_bounded};
pub use pool::{BufferPool, PooledBuffer};
pub use settings::{ErrorAction, EscapeStyle, FormatterSettings, ParserSettings, Settings};

/// The dynamic value model, re-exported for convenience.
pub use smartfmt_value as value;
pub use smartfmt_value::Value;

use std::sync::LazyLock;

/// Format `template` against `args` with a shared stock engine.
///
/// Convenience for one-off calls; construct a [`SmartFormatter`] to
/// configure settings or register extensions.
pub fn format(template: &str, args: &[Value]) -> Result<String, FormatError> {
    static STOCK: LazyLock<SmartFormatter> = LazyLock::new(SmartFormatter::default);
    STOCK.format(template, args)
}
