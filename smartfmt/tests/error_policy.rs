//! The error-action matrix, applied at parse time and at format time.

use smartfmt::{ErrorAction, Settings, SmartFormatter, Value};

fn engine(action: ErrorAction) -> SmartFormatter {
    SmartFormatter::default_with(Settings::new().with_error_action(action))
}

#[test]
fn parse_failures_follow_the_policy() {
    smartfmt_testhelpers::setup();
    let args = [Value::from("v")];
    let template = "a{bad";

    let err = engine(ErrorAction::Throw).format(template, &args).unwrap_err();
    insta::assert_snapshot!(
        err,
        @r#"failed to parse template "a{bad": unclosed placeholder at index 1"#
    );

    // the unclosed placeholder swallows the rest of the input, so the
    // tolerant policies act on "{bad" as one unit
    assert_eq!(
        engine(ErrorAction::MaintainTokens).format(template, &args).unwrap(),
        "a{bad"
    );
    assert_eq!(engine(ErrorAction::Ignore).format(template, &args).unwrap(), "a");
    let spliced = engine(ErrorAction::OutputErrorInResult).format(template, &args).unwrap();
    assert!(spliced.starts_with('a'));
    assert!(spliced.contains("unclosed placeholder"));
}

#[test]
fn resolution_failures_follow_the_policy() {
    smartfmt_testhelpers::setup();
    let args = [Value::from("v")];
    let template = "<{missing}>";

    let err = engine(ErrorAction::Throw).format(template, &args).unwrap_err();
    insta::assert_snapshot!(
        err,
        @r#"no source handled selector "missing" (step 0) at index 1"#
    );

    assert_eq!(
        engine(ErrorAction::MaintainTokens).format(template, &args).unwrap(),
        "<{missing}>"
    );
    assert_eq!(engine(ErrorAction::Ignore).format(template, &args).unwrap(), "<>");
    let spliced = engine(ErrorAction::OutputErrorInResult).format(template, &args).unwrap();
    assert!(spliced.contains("no source handled selector"));
}

#[test]
fn failures_after_partial_output_keep_the_prefix() {
    smartfmt_testhelpers::setup();
    // items before the failing placeholder render normally under every
    // tolerant policy
    let out = engine(ErrorAction::Ignore)
        .format("{0} then {missing} then {0}", &[Value::from("x")])
        .unwrap();
    assert_eq!(out, "x then  then x");
}

#[test]
fn stray_closing_brace_is_reported_with_its_offset() {
    smartfmt_testhelpers::setup();
    let err = engine(ErrorAction::Throw).format("ab } cd", &[]).unwrap_err();
    insta::assert_snapshot!(
        err,
        @r#"failed to parse template "ab } cd": closing brace without a matching opening brace at index 3"#
    );

    assert_eq!(engine(ErrorAction::MaintainTokens).format("ab } cd", &[]).unwrap(), "ab } cd");
}
