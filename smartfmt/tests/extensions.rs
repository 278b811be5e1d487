//! The plugin contracts: chain order, deferral, aborts, and explicit
//! formatter names.

use std::sync::{Arc, Mutex};

use smartfmt::{
    Formatter, FormattingError, FormattingInfo, Priority, SelectorInfo, SmartFormatter, Source,
    SourceOutcome, Value, split_nested,
};
use smartfmt_value::{list, map};

/// Observes every selector step without resolving any of them.
struct RecordingSource {
    seen: Arc<Mutex<Vec<String>>>,
}

impl Source for RecordingSource {
    fn try_resolve(&self, info: &mut SelectorInfo<'_>) -> Result<SourceOutcome, FormattingError> {
        self.seen
            .lock()
            .unwrap()
            .push(format!("{}{}", info.operator(), info.selector()));
        Ok(SourceOutcome::Unhandled)
    }
}

#[test]
fn selector_steps_run_in_chain_order() {
    smartfmt_testhelpers::setup();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut fmt = SmartFormatter::default();
    fmt.add_source_with_priority(Priority::High, RecordingSource { seen: seen.clone() });

    let person = map! { "Address" => map! { "City" => "London" } };
    fmt.format("{0.Address.City}", &[person]).unwrap();
    assert_eq!(*seen.lock().unwrap(), vec!["0", ".Address", ".City"]);
}

/// Replaces one selector with fixed text instead of resolving it.
struct RedactingSource;

impl Source for RedactingSource {
    fn try_resolve(&self, info: &mut SelectorInfo<'_>) -> Result<SourceOutcome, FormattingError> {
        match info.selector() {
            "secret" => Ok(SourceOutcome::Abort(Some("[redacted]".to_string()))),
            "hidden" => Ok(SourceOutcome::Abort(None)),
            _ => Ok(SourceOutcome::Unhandled),
        }
    }
}

#[test]
fn abort_substitutes_or_silences_the_placeholder() {
    smartfmt_testhelpers::setup();
    let mut fmt = SmartFormatter::default();
    fmt.add_source(RedactingSource);
    let args = [Value::from("ok")];
    assert_eq!(fmt.format("{0} {secret} {0}", &args).unwrap(), "ok [redacted] ok");
    assert_eq!(fmt.format("a{hidden}b", &args).unwrap(), "ab");
}

/// Handles only integers; defers everything else with `Ok(false)`.
struct IntTagger;

impl Formatter for IntTagger {
    fn name(&self) -> &str {
        "int"
    }

    fn auto_detect(&self) -> bool {
        true
    }

    fn try_format(&self, info: &mut FormattingInfo<'_, '_>) -> Result<bool, FormattingError> {
        let Value::Int(n) = *info.current() else {
            return Ok(false);
        };
        info.write(&format!("int:{n}"))?;
        Ok(true)
    }
}

#[test]
fn returning_false_defers_to_the_next_formatter() {
    smartfmt_testhelpers::setup();
    let mut fmt = SmartFormatter::default();
    fmt.add_formatter(IntTagger);
    assert_eq!(fmt.format("{0}", &[Value::from(5)]).unwrap(), "int:5");
    assert_eq!(fmt.format("{0}", &[Value::from("five")]).unwrap(), "five");
}

struct Upper;

impl Formatter for Upper {
    fn name(&self) -> &str {
        "upper"
    }

    fn auto_detect(&self) -> bool {
        false
    }

    fn try_format(&self, info: &mut FormattingInfo<'_, '_>) -> Result<bool, FormattingError> {
        let text = info.current().to_string().to_uppercase();
        info.write(&text)?;
        Ok(true)
    }
}

#[test]
fn explicit_names_foreclose_auto_detection() {
    smartfmt_testhelpers::setup();
    let mut fmt = SmartFormatter::default();
    fmt.add_formatter(Upper);
    let args = [Value::from("hi")];

    // named dispatch reaches a non-auto-detect formatter
    assert_eq!(fmt.format("{0:upper()}", &args).unwrap(), "HI");
    // unnamed dispatch skips it
    assert_eq!(fmt.format("{0}", &args).unwrap(), "hi");
    // an unknown name never falls back, even though the default
    // formatter would have handled the value
    let err = fmt.format("{0:missing()}", &args).unwrap_err();
    assert!(err.to_string().contains("no formatter named \"missing\""));
}

/// Renders list values item-by-item through the nested format, separated
/// by the option text.
struct ListFormatter;

impl Formatter for ListFormatter {
    fn name(&self) -> &str {
        "list"
    }

    fn auto_detect(&self) -> bool {
        false
    }

    fn try_format(&self, info: &mut FormattingInfo<'_, '_>) -> Result<bool, FormattingError> {
        let Some(items) = info.current().as_list().map(<[Value]>::to_vec) else {
            return Ok(false);
        };
        let Some(format) = info.format().cloned() else {
            return Ok(false);
        };
        let separator = info.options().to_string();
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                info.write(&separator)?;
            }
            info.format_as_child(&format, item)?;
        }
        Ok(true)
    }
}

#[test]
fn composite_formatter_recurses_through_the_engine() {
    smartfmt_testhelpers::setup();
    let mut fmt = SmartFormatter::default();
    fmt.add_formatter(ListFormatter);
    let people = list![
        map! { "Name" => "Ada", "Logins" => 42 },
        map! { "Name" => "Grace", "Logins" => 7 },
    ];
    let out = fmt
        .format("{0:list(; ):{Name} ({Logins:N0})}", &[people])
        .unwrap();
    assert_eq!(out, "Ada (42); Grace (7)");
}

#[test]
fn higher_priority_formatters_run_first() {
    smartfmt_testhelpers::setup();
    struct Tag(&'static str);
    impl Formatter for Tag {
        fn name(&self) -> &str {
            "tag"
        }
        fn auto_detect(&self) -> bool {
            true
        }
        fn try_format(&self, info: &mut FormattingInfo<'_, '_>) -> Result<bool, FormattingError> {
            info.write(self.0)?;
            Ok(true)
        }
    }

    let mut fmt = SmartFormatter::default();
    fmt.add_formatter(Tag("normal"));
    fmt.add_formatter_with_priority(Priority::High, Tag("high"));
    assert_eq!(fmt.format("{0}", &[Value::from(1)]).unwrap(), "high");
}

#[test]
fn split_nested_is_available_to_plugins() {
    smartfmt_testhelpers::setup();
    // option syntax like "a|b{x|y}" must split around nested braces
    assert_eq!(split_nested("a|b{x|y}", '|'), vec!["a", "b{x|y}"]);
}
