//! Positional-argument resolution.

use crate::error::FormattingError;
use crate::extensions::{SelectorInfo, Source, SourceOutcome};

/// Resolves a numeric selector at the head of a chain to the
/// corresponding positional argument: `{0}`, `{1.Name}`, …
///
/// Only the first step of a chain can be positional; a numeric token
/// later in a chain is list indexing and belongs to
/// [`ValueSource`](super::ValueSource).
#[derive(Debug, Default)]
pub struct DefaultSource;

impl Source for DefaultSource {
    fn try_resolve(&self, info: &mut SelectorInfo<'_>) -> Result<SourceOutcome, FormattingError> {
        if info.selector_index() != 0 {
            return Ok(SourceOutcome::Unhandled);
        }
        let token = info.selector();
        if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(SourceOutcome::Unhandled);
        }
        let Ok(index) = token.parse::<usize>() else {
            return Ok(SourceOutcome::Unhandled);
        };
        match info.args().get(index) {
            Some(value) => {
                let value = value.clone();
                info.set_result(value);
                Ok(SourceOutcome::Resolved)
            }
            // out of range: let the chain (and ultimately the error
            // policy) deal with it
            None => Ok(SourceOutcome::Unhandled),
        }
    }
}

#[cfg(test)]
mod tests {
    use smartfmt_value::Value;

    use crate::SmartFormatter;

    #[test]
    fn positional_arguments_resolve_by_index() {
        let fmt = SmartFormatter::default();
        let out = fmt.format("{1}-{0}", &[Value::from("a"), Value::from("b")]).unwrap();
        assert_eq!(out, "b-a");
    }

    #[test]
    fn out_of_range_index_is_a_resolution_failure() {
        let fmt = SmartFormatter::default();
        let err = fmt.format("{5}", &[Value::from("a")]).unwrap_err();
        assert!(err.to_string().contains("no source handled selector"));
    }
}
