//! Structural navigation over the dynamic value model.

use crate::error::FormattingError;
use crate::extensions::{SelectorInfo, Source, SourceOutcome};

/// Resolves named selectors against [`Value`](smartfmt_value::Value)
/// graphs: map-key lookup and numeric indexing into lists.
///
/// This is the engine's stand-in for reflection: all structural knowledge
/// about argument objects lives here, behind the [`Source`] contract, so
/// the engine itself never inspects a value. Lookups are exact-case by
/// default; setting
/// [`FormatterSettings::case_sensitive`](crate::FormatterSettings) to
/// false adds a case-insensitive retry after an exact miss.
#[derive(Debug, Default)]
pub struct ValueSource;

impl Source for ValueSource {
    fn try_resolve(&self, info: &mut SelectorInfo<'_>) -> Result<SourceOutcome, FormattingError> {
        let token = info.selector();
        if token.is_empty() {
            return Ok(SourceOutcome::Unhandled);
        }
        let current = info.current();

        let found = if info.settings().formatter.case_sensitive {
            current.get(token)
        } else {
            current.get_ignore_case(token)
        };
        if let Some(value) = found {
            let value = value.clone();
            info.set_result(value);
            return Ok(SourceOutcome::Resolved);
        }

        if token.bytes().all(|b| b.is_ascii_digit())
            && let Ok(index) = token.parse::<usize>()
            && let Some(value) = current.index(index)
        {
            let value = value.clone();
            info.set_result(value);
            return Ok(SourceOutcome::Resolved);
        }

        Ok(SourceOutcome::Unhandled)
    }
}

#[cfg(test)]
mod tests {
    use smartfmt_value::{Value, list, map};

    use crate::{Settings, SmartFormatter};

    fn person() -> Value {
        map! {
            "Name" => "Ada",
            "Address" => map! { "City" => "London", "Lines" => list!["12 Crescent", "Marylebone"] },
        }
    }

    #[test]
    fn dotted_chain_navigates_maps_and_lists() {
        let fmt = SmartFormatter::default();
        let out = fmt.format("{0.Address.Lines[1]}", &[person()]).unwrap();
        assert_eq!(out, "Marylebone");
    }

    #[test]
    fn case_insensitive_retry_is_opt_in() {
        let fmt = SmartFormatter::default();
        assert!(fmt.format("{0.name}", &[person()]).is_err());

        let relaxed = SmartFormatter::default_with(Settings::new().with_case_sensitive(false));
        assert_eq!(relaxed.format("{0.name}", &[person()]).unwrap(), "Ada");
    }
}
