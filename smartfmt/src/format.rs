//! The evaluation engine.
//!
//! [`SmartFormatter`] walks a parsed [`Format`] against an argument list,
//! resolving each placeholder's selector chain through the source chain
//! and rendering the resolved value through the formatter chain. The
//! engine owns no structural or rendering knowledge itself; it only
//! orchestrates the registered plugins, applies alignment, enforces the
//! depth guard, and carries out the configured error policy.

use std::sync::Arc;

use smartfmt_value::Value;

use crate::ast::{Format, FormatItem, Placeholder};
use crate::cache::FormatCache;
use crate::error::{FormatError, FormattingError, ParseErrors, ParseIssue};
use crate::extensions::{
    DefaultFormatter, DefaultSource, Formatter, Priority, Registry, SelectorInfo, Source,
    SourceOutcome, ValueSource,
};
use crate::output::Output;
use crate::parser::Parser;
use crate::pool::BufferPool;
use crate::settings::{ErrorAction, Settings};

const NULL: &Value = &Value::Null;

/// The composition engine: a parser, a source chain, a formatter chain,
/// and the settings they share.
///
/// A configured formatter is immutable and safe to share across threads;
/// registration happens up front, evaluation takes `&self`.
pub struct SmartFormatter {
    settings: Settings,
    parser: Parser,
    sources: Registry<Box<dyn Source>>,
    formatters: Registry<Box<dyn Formatter>>,
    pool: BufferPool,
}

impl Default for SmartFormatter {
    /// The stock engine: default settings plus the built-in extensions.
    fn default() -> Self {
        Self::default_with(Settings::default())
    }
}

impl SmartFormatter {
    /// An engine with no extensions registered. Formatting anything with
    /// it fails until at least one source and one formatter are added;
    /// most callers want [`SmartFormatter::default_with`].
    pub fn new(settings: Settings) -> Self {
        let parser = Parser::new(settings.parser.clone());
        Self {
            settings,
            parser,
            sources: Registry::default(),
            formatters: Registry::default(),
            pool: BufferPool::new(),
        }
    }

    /// An engine with the given settings and the built-in extensions
    /// registered at [`Priority::Builtin`].
    pub fn default_with(settings: Settings) -> Self {
        let mut fmt = Self::new(settings);
        fmt.add_source_with_priority(Priority::Builtin, DefaultSource);
        fmt.add_source_with_priority(Priority::Builtin, ValueSource);
        fmt.add_formatter_with_priority(Priority::Builtin, DefaultFormatter);
        fmt
    }

    /// The settings this engine was built with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The parser this engine uses, for callers that pre-parse templates
    /// (see [`FormatCache`]).
    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    /// Register a source at [`Priority::Normal`].
    pub fn add_source(&mut self, source: impl Source + 'static) -> &mut Self {
        self.add_source_with_priority(Priority::Normal, source)
    }

    /// Register a source at an explicit priority tier.
    pub fn add_source_with_priority(
        &mut self,
        priority: Priority,
        source: impl Source + 'static,
    ) -> &mut Self {
        self.sources.add(priority, Box::new(source));
        self
    }

    /// Register a formatter at [`Priority::Normal`].
    pub fn add_formatter(&mut self, formatter: impl Formatter + 'static) -> &mut Self {
        self.add_formatter_with_priority(Priority::Normal, formatter)
    }

    /// Register a formatter at an explicit priority tier.
    pub fn add_formatter_with_priority(
        &mut self,
        priority: Priority,
        formatter: impl Formatter + 'static,
    ) -> &mut Self {
        self.formatters.add(priority, Box::new(formatter));
        self
    }

    /// Parse `template` and render it against `args` into a fresh string.
    pub fn format(&self, template: &str, args: &[Value]) -> Result<String, FormatError> {
        let mut out = String::with_capacity(template.len());
        self.format_into(&mut out, template, args)?;
        Ok(out)
    }

    /// Parse `template` and render it against `args` into `output`.
    pub fn format_into(
        &self,
        output: &mut dyn Output,
        template: &str,
        args: &[Value],
    ) -> Result<(), FormatError> {
        let format = self.parser.parse(template)?;
        self.format_parsed_into(output, &format, args)
    }

    /// Render a pre-parsed tree against `args` into a fresh string.
    pub fn format_parsed(&self, format: &Format, args: &[Value]) -> Result<String, FormatError> {
        let mut out = String::with_capacity(format.source().len());
        self.format_parsed_into(&mut out, format, args)?;
        Ok(out)
    }

    /// Render a pre-parsed tree against `args` into `output`.
    pub fn format_parsed_into(
        &self,
        output: &mut dyn Output,
        format: &Format,
        args: &[Value],
    ) -> Result<(), FormatError> {
        let current = args.first().unwrap_or(NULL);
        self.evaluate(format, args, current, 0, output)
    }

    /// Render `template` against `args`, consulting `cache` for the
    /// parsed tree.
    pub fn format_cached(
        &self,
        cache: &FormatCache,
        template: &str,
        args: &[Value],
    ) -> Result<String, FormatError> {
        let format = cache.get_or_parse(&self.parser, template)?;
        self.format_parsed(&format, args)
    }

    pub(crate) fn evaluate(
        &self,
        format: &Format,
        args: &[Value],
        current: &Value,
        depth: usize,
        output: &mut dyn Output,
    ) -> Result<(), FormatError> {
        for item in format.items() {
            match item {
                FormatItem::Literal(lit) => {
                    output.write_literal(lit).map_err(|_| FormatError::Output)?;
                }
                FormatItem::Placeholder(ph) => {
                    if let Err(error) = self.eval_placeholder(ph, args, current, depth, output) {
                        self.apply_format_error_action(error, ph, output)?;
                    }
                }
                FormatItem::Issue(issue) => {
                    self.apply_parse_issue_action(issue, format, output)?;
                }
            }
        }
        Ok(())
    }

    fn eval_placeholder(
        &self,
        ph: &Placeholder,
        args: &[Value],
        current: &Value,
        depth: usize,
        output: &mut dyn Output,
    ) -> Result<(), FormatError> {
        if let Some(limit) = self.settings.formatter.max_nesting_depth
            && depth > limit
        {
            return Err(FormatError::NestingTooDeep { limit });
        }
        debug!("evaluating placeholder at {} (depth {depth})", ph.span().start);

        let resolved = match self.resolve_chain(ph, args, current)? {
            Resolution::Value(value) => value,
            Resolution::Abort(replacement) => {
                if let Some(text) = replacement {
                    write_out(output, &text)?;
                }
                return Ok(());
            }
        };
        self.render(ph, args, &resolved, depth, output)
    }

    /// Walk the selector chain, threading the resolved value through the
    /// source chain one step at a time.
    fn resolve_chain(
        &self,
        ph: &Placeholder,
        args: &[Value],
        start: &Value,
    ) -> Result<Resolution, FormatError> {
        let mut current = start.clone();
        for selector in ph.selectors() {
            // null propagation: `a?.b` renders empty instead of failing
            if selector.operator().contains(self.settings.parser.nullable_marker)
                && current.is_null()
            {
                trace!("null shortcut at selector {:?}", selector.text());
                return Ok(Resolution::Value(Value::Null));
            }

            let mut info = SelectorInfo {
                current: &current,
                selector,
                placeholder: ph,
                args,
                settings: &self.settings,
                result: None,
            };
            let mut resolved = None;
            for source in self.sources.iter() {
                let outcome = source.try_resolve(&mut info).map_err(|source| {
                    FormatError::Formatting {
                        index: ph.span().start,
                        template: ph_template(ph),
                        source,
                    }
                })?;
                match outcome {
                    SourceOutcome::Resolved => {
                        resolved = Some(info.result.take().unwrap_or(Value::Null));
                        break;
                    }
                    SourceOutcome::Unhandled => continue,
                    SourceOutcome::Abort(replacement) => {
                        return Ok(Resolution::Abort(replacement));
                    }
                }
            }
            match resolved {
                Some(value) => current = value,
                None => {
                    return Err(FormatError::Selector {
                        selector: selector.text().to_string(),
                        chain_index: selector.index(),
                        index: ph.span().start,
                        template: ph_template(ph),
                    });
                }
            }
        }
        Ok(Resolution::Value(current))
    }

    /// Apply alignment (if any) around formatter dispatch.
    fn render(
        &self,
        ph: &Placeholder,
        args: &[Value],
        value: &Value,
        depth: usize,
        output: &mut dyn Output,
    ) -> Result<(), FormatError> {
        let alignment = ph.alignment();
        if alignment == 0 {
            return self.dispatch(ph, args, value, depth, output);
        }

        // render into a pooled scratch buffer, then pad around it
        let mut scratch = self.pool.rent();
        self.dispatch(ph, args, value, depth, &mut *scratch)?;
        let width = alignment.unsigned_abs() as usize;
        let written = scratch.chars().count();
        if alignment > 0 {
            for _ in written..width {
                write_out(output, " ")?;
            }
            write_out(output, &scratch)?;
        } else {
            write_out(output, &scratch)?;
            for _ in written..width {
                write_out(output, " ")?;
            }
        }
        Ok(())
    }

    /// Run the formatter chain for one resolved value.
    fn dispatch(
        &self,
        ph: &Placeholder,
        args: &[Value],
        value: &Value,
        depth: usize,
        output: &mut dyn Output,
    ) -> Result<(), FormatError> {
        let explicit = ph.formatter_name().filter(|name| !name.is_empty());
        let mut info = FormattingInfo {
            engine: self,
            args,
            placeholder: ph,
            current: value,
            depth,
            output,
        };
        for formatter in self.formatters.iter() {
            // an explicit name forecloses auto-detection entirely
            let eligible = match explicit {
                Some(name) => formatter.name() == name,
                None => formatter.auto_detect(),
            };
            if !eligible {
                continue;
            }
            let handled = formatter.try_format(&mut info).map_err(|source| {
                FormatError::Formatting {
                    index: ph.span().start,
                    template: ph_template(ph),
                    source,
                }
            })?;
            if handled {
                return Ok(());
            }
        }
        Err(FormatError::NoFormatter {
            name: explicit.map(str::to_string),
            index: ph.span().start,
            template: ph_template(ph),
        })
    }

    /// Carry out the format-time error policy for one failed placeholder.
    fn apply_format_error_action(
        &self,
        error: FormatError,
        ph: &Placeholder,
        output: &mut dyn Output,
    ) -> Result<(), FormatError> {
        match self.settings.formatter.error_action {
            ErrorAction::Throw => Err(error),
            ErrorAction::OutputErrorInResult => {
                debug!("splicing format error into output: {error}");
                write_out(output, &format!("{{error: {error}}}"))
            }
            ErrorAction::Ignore => Ok(()),
            ErrorAction::MaintainTokens => output
                .write_range(&ph.src, ph.span())
                .map_err(|_| FormatError::Output),
        }
    }

    /// Carry out the parse-time error policy for an issue node reached at
    /// format time. Issue nodes only exist in trees parsed under a
    /// tolerant policy, but the tree may be evaluated by an engine
    /// configured differently, so the policy is re-read here.
    fn apply_parse_issue_action(
        &self,
        issue: &ParseIssue,
        format: &Format,
        output: &mut dyn Output,
    ) -> Result<(), FormatError> {
        match self.settings.parser.error_action {
            ErrorAction::Throw => Err(FormatError::Parse(ParseErrors {
                template: format.source().to_string(),
                issues: vec![issue.clone()],
            })),
            ErrorAction::OutputErrorInResult => {
                write_out(output, &format!("{{error: {issue}}}"))
            }
            ErrorAction::Ignore => Ok(()),
            ErrorAction::MaintainTokens => output
                .write_range(format.source(), issue.span.clone())
                .map_err(|_| FormatError::Output),
        }
    }
}

fn write_out(output: &mut dyn Output, s: &str) -> Result<(), FormatError> {
    output.write_str(s).map_err(|_| FormatError::Output)
}

fn ph_template(ph: &Placeholder) -> Arc<str> {
    ph.src.clone()
}

enum Resolution {
    Value(Value),
    Abort(Option<String>),
}

/// Everything a [`Formatter`] sees for one placeholder: the resolved
/// value, the placeholder's nested format and options, and the output
/// sink. All writes go through this handle.
pub struct FormattingInfo<'a, 'o> {
    engine: &'a SmartFormatter,
    args: &'a [Value],
    placeholder: &'a Placeholder,
    current: &'a Value,
    depth: usize,
    output: &'o mut dyn Output,
}

impl FormattingInfo<'_, '_> {
    /// The resolved value to render.
    pub fn current(&self) -> &Value {
        self.current
    }

    /// The placeholder being rendered.
    pub fn placeholder(&self) -> &Placeholder {
        self.placeholder
    }

    /// The placeholder's nested format, if one was written.
    pub fn format(&self) -> Option<&Format> {
        self.placeholder.format()
    }

    /// The formatter options written in parentheses, or `""`.
    pub fn options(&self) -> &str {
        self.placeholder.formatter_options().unwrap_or("")
    }

    /// The placeholder's alignment. The engine applies padding itself;
    /// this is exposed for formatters that want width-aware layout.
    pub fn alignment(&self) -> i32 {
        self.placeholder.alignment()
    }

    /// The top-level argument list of the format call.
    pub fn args(&self) -> &[Value] {
        self.args
    }

    /// The engine's settings.
    pub fn settings(&self) -> &Settings {
        &self.engine.settings
    }

    /// Append text to the output.
    pub fn write(&mut self, s: &str) -> Result<(), FormattingError> {
        self.output
            .write_str(s)
            .map_err(|_| FormattingError::new("the output sink refused a write"))
    }

    /// Evaluate a nested format against a new current value, one level
    /// deeper. This is the recursion point composite formatters build on;
    /// the depth guard counts these calls.
    pub fn format_as_child(
        &mut self,
        format: &Format,
        value: &Value,
    ) -> Result<(), FormattingError> {
        self.engine
            .evaluate(format, self.args, value, self.depth + 1, self.output)
            .map_err(|error| {
                FormattingError::new(format!("nested format failed: {error}")).with_source(error)
            })
    }
}

#[cfg(test)]
mod tests {
    use smartfmt_value::{Value, map};

    use super::*;

    #[test]
    fn literal_only_template_passes_through() {
        let fmt = SmartFormatter::default();
        assert_eq!(fmt.format("just text", &[]).unwrap(), "just text");
    }

    #[test]
    fn alignment_pads_to_width() {
        let fmt = SmartFormatter::default();
        let args = [Value::from("hi")];
        assert_eq!(fmt.format("[{0,5}]", &args).unwrap(), "[   hi]");
        assert_eq!(fmt.format("[{0,-5}]", &args).unwrap(), "[hi   ]");
        assert_eq!(fmt.format("[{0,2}]", &args).unwrap(), "[hi]");
    }

    #[test]
    fn empty_selector_chain_formats_the_current_value() {
        let fmt = SmartFormatter::default();
        assert_eq!(fmt.format("{,6}!", &[Value::from("wide")]).unwrap(), "  wide!");
    }

    #[test]
    fn null_propagation_renders_empty() {
        let fmt = SmartFormatter::default();
        let person = map! { "Name" => Value::Null };
        assert_eq!(fmt.format("x{0.Name?.Length}y", &[person]).unwrap(), "xy");
    }

    #[test]
    fn depth_guard_stops_runaway_recursion() {
        let fmt =
            SmartFormatter::default_with(Settings::new().with_max_nesting_depth(Some(2)));
        let err = fmt.format("{0:{0:{0:{0:{0}}}}}", &[Value::from(1)]).unwrap_err();
        assert!(err.to_string().contains("depth limit"));
    }

    #[test]
    fn bare_engine_fails_at_each_missing_chain() {
        // no sources: resolution fails first
        let mut fmt = SmartFormatter::new(Settings::default());
        let err = fmt.format("{0}", &[Value::from(1)]).unwrap_err();
        assert!(err.to_string().contains("no source handled selector"));

        // with a source but no formatters, dispatch fails instead
        fmt.add_source(DefaultSource);
        let err = fmt.format("{0}", &[Value::from(1)]).unwrap_err();
        assert!(err.to_string().contains("no formatter handled the value"));
    }
}
