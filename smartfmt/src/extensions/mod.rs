//! The two contracts plugins implement, and the built-in implementations.
//!
//! The engine depends only on [`Source`] and [`Formatter`]; everything
//! concrete — including the defaults in this module — goes through the
//! same priority-ordered registries user extensions do. New capabilities
//! are added by registering plugins, never by modifying the engine.

use smartfmt_value::Value;

use crate::ast::{Placeholder, Selector};
use crate::error::FormattingError;
use crate::format::FormattingInfo;
use crate::settings::Settings;

mod default_formatter;
mod default_source;
mod value_source;

pub use default_formatter::DefaultFormatter;
pub use default_source::DefaultSource;
pub use value_source::ValueSource;

/// Where a plugin sits in its chain. Chains run `High` through `Fallback`;
/// within a tier, registration order is preserved.
///
/// `Builtin` and `Fallback` are reserved for the stock extensions: the
/// built-in defaults must run after every user extension, and `Fallback`
/// exists for last-resort behavior that should only trigger once
/// structural resolution has failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    /// Before the normal tier.
    High,
    /// The default for user extensions.
    #[default]
    Normal,
    /// After the normal tier.
    Low,
    /// Reserved tier for the built-in defaults.
    Builtin,
    /// Reserved tier for extreme fallback behavior.
    Fallback,
}

/// What a [`Source`] did with a selector step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    /// The source resolved the step; the result was stored on the
    /// [`SelectorInfo`].
    Resolved,
    /// The source does not understand this step; try the next one.
    Unhandled,
    /// Stop evaluating this placeholder and render the given replacement
    /// text (or nothing) instead. This is an intentional short-circuit,
    /// not an error: the source is saying "this value is unformattable
    /// right now, render the placeholder as this".
    Abort(Option<String>),
}

/// Everything a [`Source`] sees for one selector step.
pub struct SelectorInfo<'a> {
    pub(crate) current: &'a Value,
    pub(crate) selector: &'a Selector,
    pub(crate) placeholder: &'a Placeholder,
    pub(crate) args: &'a [Value],
    pub(crate) settings: &'a Settings,
    pub(crate) result: Option<Value>,
}

impl<'a> SelectorInfo<'a> {
    /// The value the chain has resolved to so far.
    pub fn current(&self) -> &Value {
        self.current
    }

    /// The selector token being resolved.
    pub fn selector(&self) -> &str {
        self.selector.text()
    }

    /// The operator preceding this selector (empty for the first step).
    pub fn operator(&self) -> &str {
        self.selector.operator()
    }

    /// This step's position within the chain.
    pub fn selector_index(&self) -> usize {
        self.selector.index()
    }

    /// The placeholder this chain belongs to.
    pub fn placeholder(&self) -> &Placeholder {
        self.placeholder
    }

    /// The top-level argument list of the format call.
    pub fn args(&self) -> &[Value] {
        self.args
    }

    /// The shared formatting settings.
    pub fn settings(&self) -> &Settings {
        self.settings
    }

    /// Store the resolved value for this step. Must be called before
    /// returning [`SourceOutcome::Resolved`].
    pub fn set_result(&mut self, value: Value) {
        self.result = Some(value);
    }
}

/// A pluggable resolver turning a (context, selector) pair into a new
/// context.
///
/// Implementations must be side-effect-free with respect to shared state
/// beyond their own private fields and safe to invoke concurrently from
/// independent format calls — the `Send + Sync` bound is a hard
/// requirement, not a convenience.
pub trait Source: Send + Sync {
    /// Attempt to resolve one selector step. Return
    /// [`SourceOutcome::Unhandled`] to defer to the next source in the
    /// chain; reserve `Err` for genuinely exceptional failures.
    fn try_resolve(&self, info: &mut SelectorInfo<'_>) -> Result<SourceOutcome, FormattingError>;
}

/// A pluggable renderer turning a resolved value (and optional nested
/// sub-template) into output text.
///
/// Results are written exclusively through the [`FormattingInfo`] handle.
/// Returning `Ok(false)` means "not handled" and defers to the next
/// candidate — an explicit contract point that lets composite formatters
/// treat "unhandled" as a valid branch. The same side-effect and
/// thread-safety rules as [`Source`] apply.
pub trait Formatter: Send + Sync {
    /// The name this formatter answers to in `{value:name(...)}` syntax.
    fn name(&self) -> &str;

    /// Whether this formatter participates in implicit (unnamed)
    /// dispatch.
    fn auto_detect(&self) -> bool;

    /// Attempt to render the resolved value.
    fn try_format(&self, info: &mut FormattingInfo<'_, '_>) -> Result<bool, FormattingError>;
}

/// A priority-ordered plugin list. Iteration yields `High` through
/// `Fallback`, preserving registration order within each tier.
pub(crate) struct Registry<T> {
    entries: Vec<(Priority, T)>,
}

// not derived: a derive would demand `T: Default`
impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T> Registry<T> {
    pub(crate) fn add(&mut self, priority: Priority, item: T) {
        let at = self.entries.partition_point(|(p, _)| *p <= priority);
        self.entries.insert(at, (priority, item));
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, item)| item)
    }
}
