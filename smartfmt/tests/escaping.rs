//! Brace escaping in both styles, including the hard cases where `}}`
//! inside a format body must be read as an escaped literal brace.

use smartfmt::{EscapeStyle, Settings, SmartFormatter, Value};

fn args() -> Vec<Value> {
    vec![Value::from("Zero"), Value::from(1)]
}

#[test]
fn double_braces_escape_outside_placeholders() {
    smartfmt_testhelpers::setup();
    let fmt = SmartFormatter::default();
    assert_eq!(fmt.format("{{0}} - {{{0}}}", &args()).unwrap(), "{0} - {Zero}");
}

#[test]
fn double_braces_escape_inside_format_bodies() {
    smartfmt_testhelpers::setup();
    let fmt = SmartFormatter::default();
    let out = fmt
        .format("{1:N0} }} - {1:N0}0}} - {1:N0}}0} - {1:N0}}}", &args())
        .unwrap();
    assert_eq!(out, "1 } - 10} - N0}1 - N1}");
}

#[test]
fn deep_nesting_still_closes_eagerly() {
    smartfmt_testhelpers::setup();
    // four closers close four placeholders; none of them pair up as
    // escapes, because more than one placeholder is open
    let fmt = SmartFormatter::default();
    let format = fmt.parser().parse("{a:{b:{c:{d}}}}").unwrap();
    assert_eq!(format.items().len(), 1);
    assert_eq!(format.source_text(), "{a:{b:{c:{d}}}}");
}

#[test]
fn escape_char_style_replaces_doubling() {
    smartfmt_testhelpers::setup();
    let fmt =
        SmartFormatter::default_with(Settings::new().with_escape(EscapeStyle::Char('\\')));
    assert_eq!(fmt.format("\\{not a placeholder\\}", &args()).unwrap(), "{not a placeholder}");
    assert_eq!(fmt.format("tab\\there {0}", &args()).unwrap(), "tab\there Zero");

    // doubling is plain text in this style: two literal opens start two
    // placeholders, so this template is malformed
    assert!(fmt.format("{{0}}", &args()).is_err());
}
