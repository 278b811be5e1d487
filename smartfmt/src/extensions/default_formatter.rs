//! The last-resort renderer.

use smartfmt_value::Value;

use crate::error::FormattingError;
use crate::extensions::Formatter;
use crate::format::FormattingInfo;

/// Renders any value, so it terminates every auto-detect chain.
///
/// Three behaviors, in order:
/// 1. a nested format containing placeholders is a sub-template and is
///    evaluated against the current value (this is what makes
///    `{Order:{Id} of {Total}}` work without a named formatter);
/// 2. numbers are rendered through the format body as a numeric format
///    string — standard forms (`N2`, `F1`, `D5`, `X`) and custom
///    digit-placeholder patterns (`0`/`#`, literals pass through);
/// 3. everything else renders via `Display`.
#[derive(Debug, Default)]
pub struct DefaultFormatter;

impl Formatter for DefaultFormatter {
    fn name(&self) -> &str {
        "default"
    }

    fn auto_detect(&self) -> bool {
        true
    }

    fn try_format(&self, info: &mut FormattingInfo<'_, '_>) -> Result<bool, FormattingError> {
        if let Some(format) = info.format()
            && format.has_placeholders()
        {
            let format = format.clone();
            let current = info.current().clone();
            info.format_as_child(&format, &current)?;
            return Ok(true);
        }

        let spec = info.format().map(|f| f.literal_text()).unwrap_or_default();
        let rendered = match info.current() {
            Value::Int(n) => numeric::format_int(*n, &spec),
            Value::Float(x) => numeric::format_float(*x, &spec),
            other => other.to_string(),
        };
        info.write(&rendered)?;
        Ok(true)
    }
}

/// Invariant-culture numeric rendering in the shape of .NET format
/// strings: a standard specifier is one letter plus an optional precision
/// (`N2`, `D5`, `X`), anything else is a custom pattern where `0` and `#`
/// are digit placeholders and other characters are literals.
mod numeric {
    enum Num {
        Int(i64),
        Float(f64),
    }

    pub(super) fn format_int(n: i64, spec: &str) -> String {
        format_number(Num::Int(n), spec)
    }

    pub(super) fn format_float(x: f64, spec: &str) -> String {
        if !x.is_finite() {
            return x.to_string();
        }
        format_number(Num::Float(x), spec)
    }

    fn format_number(num: Num, spec: &str) -> String {
        if spec.is_empty() {
            return match num {
                Num::Int(n) => n.to_string(),
                Num::Float(x) => x.to_string(),
            };
        }
        if let Some((kind, precision)) = standard_spec(spec) {
            match kind {
                'N' | 'n' => return fixed(&num, precision.unwrap_or(2), true),
                'F' | 'f' => return fixed(&num, precision.unwrap_or(2), false),
                'D' | 'd' => {
                    if let Num::Int(n) = num {
                        let digits = n.unsigned_abs().to_string();
                        let width = precision.unwrap_or(0).max(digits.len());
                        let sign = if n < 0 { "-" } else { "" };
                        return format!("{sign}{digits:0>width$}");
                    }
                }
                'X' => {
                    if let Num::Int(n) = num {
                        let width = precision.unwrap_or(0);
                        return format!("{n:0width$X}");
                    }
                }
                'x' => {
                    if let Num::Int(n) = num {
                        let width = precision.unwrap_or(0);
                        return format!("{n:0width$x}");
                    }
                }
                'G' | 'g' => {
                    return match num {
                        Num::Int(n) => n.to_string(),
                        Num::Float(x) => x.to_string(),
                    };
                }
                _ => {}
            }
        }
        custom(&num, spec)
    }

    /// `N2` → `('N', Some(2))`, `X` → `('X', None)`; anything with
    /// non-digit trailing characters is not a standard specifier.
    fn standard_spec(spec: &str) -> Option<(char, Option<usize>)> {
        let mut chars = spec.chars();
        let kind = chars.next()?;
        if !kind.is_ascii_alphabetic() {
            return None;
        }
        let rest = &spec[kind.len_utf8()..];
        if rest.is_empty() {
            return Some((kind, None));
        }
        if rest.bytes().all(|b| b.is_ascii_digit()) {
            return Some((kind, rest.parse().ok()));
        }
        None
    }

    /// Fixed-point rendering with `decimals` fraction digits, optionally
    /// with thousands separators.
    fn fixed(num: &Num, decimals: usize, grouped: bool) -> String {
        let (negative, int_digits, frac_digits) = split_digits(num, decimals);
        let mut out = String::new();
        if negative {
            out.push('-');
        }
        if grouped {
            out.push_str(&group(&int_digits));
        } else {
            out.push_str(&int_digits);
        }
        if decimals > 0 {
            out.push('.');
            out.push_str(&frac_digits);
        }
        out
    }

    /// The absolute value as integer and fraction digit strings, rounded
    /// to `decimals` places.
    fn split_digits(num: &Num, decimals: usize) -> (bool, String, String) {
        match num {
            Num::Int(n) => (*n < 0, n.unsigned_abs().to_string(), "0".repeat(decimals)),
            Num::Float(x) => {
                let rendered = format!("{:.*}", decimals, x.abs());
                let negative = x.is_sign_negative() && rendered.bytes().any(|b| b != b'0' && b != b'.');
                match rendered.split_once('.') {
                    Some((int_part, frac_part)) => {
                        (negative, int_part.to_string(), frac_part.to_string())
                    }
                    None => (negative, rendered, String::new()),
                }
            }
        }
    }

    /// Insert a thousands separator every three digits from the right.
    fn group(digits: &str) -> String {
        let mut out = String::with_capacity(digits.len() + digits.len() / 3);
        let len = digits.len();
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (len - i) % 3 == 0 {
                out.push(',');
            }
            out.push(c);
        }
        out
    }

    /// Custom pattern: `0` pads with zeros, `#` with nothing, the first
    /// `.` separates integer and fraction sections, `,` enables grouping,
    /// every other character is a literal. Surplus integer digits land at
    /// the leftmost digit placeholder.
    fn custom(num: &Num, spec: &str) -> String {
        let (int_pat, frac_pat) = match spec.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (spec, None),
        };
        let frac_slots =
            frac_pat.map_or(0, |p| p.chars().filter(|&c| c == '0' || c == '#').count());
        let grouped = int_pat.contains(',');
        let (negative, int_digits, frac_digits) = split_digits(num, frac_slots);
        let int_digits = if grouped { group(&int_digits) } else { int_digits };

        // integer section fills right-to-left; build reversed, then flip
        let slot_count = int_pat.chars().filter(|&c| c == '0' || c == '#').count();
        let mut digits = int_digits.chars().rev();
        let mut slots_seen = 0;
        let mut reversed = String::new();
        for c in int_pat.chars().rev() {
            match c {
                '0' | '#' => {
                    slots_seen += 1;
                    match digits.next() {
                        Some(d) => {
                            reversed.push(d);
                            if slots_seen == slot_count {
                                // leftmost placeholder absorbs the surplus
                                reversed.extend(digits.by_ref());
                            }
                        }
                        None => {
                            if c == '0' {
                                reversed.push('0');
                            }
                        }
                    }
                }
                ',' => {}
                other => reversed.push(other),
            }
        }
        if negative {
            reversed.push('-');
        }
        let mut out: String = reversed.chars().rev().collect();

        if let Some(frac_pat) = frac_pat {
            out.push('.');
            let mut frac = frac_digits.chars();
            for c in frac_pat.chars() {
                match c {
                    '0' | '#' => {
                        if let Some(d) = frac.next() {
                            out.push(d);
                        }
                    }
                    other => out.push(other),
                }
            }
        }
        out
    }

}
