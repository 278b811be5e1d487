//! The template parser: a single left-to-right scan that turns a template
//! string into a [`Format`] tree.
//!
//! The scanner works on byte offsets and never materializes substrings;
//! literal runs only allocate when they contain escape sequences (the
//! decoded form is stored next to the span). Nested formats are parsed by
//! recursive descent — recursion depth is bounded by the input, not by a
//! fixed constant.
//!
//! Malformed input is collected as structured issues. Under
//! [`ErrorAction::Throw`](crate::ErrorAction::Throw) parsing returns the
//! aggregate [`ParseErrors`]; under the tolerant policies each offending
//! span becomes a [`FormatItem::Issue`] node and the evaluation engine
//! decides what to emit for it.

use core::ops::Range;
use std::sync::Arc;

use crate::ast::{Format, FormatItem, LiteralText, Placeholder, Selector};
use crate::error::{ParseErrors, ParseIssue, ParseIssueKind};
use crate::settings::{ErrorAction, EscapeStyle, ParserSettings};

/// Split `input` on `sep`, but only where brace-nesting depth is zero at
/// the split point.
///
/// This is the nesting-aware primitive renderer plugins use to split their
/// own sub-syntax (list-item separators and the like) without cutting
/// through nested placeholders.
pub fn split_nested(input: &str, sep: char) -> Vec<&str> {
    split_nested_bounded(input, sep, usize::MAX)
}

/// Like [`split_nested`], but yields at most `max` segments; the last
/// segment absorbs the remainder unsplit. `max == 0` yields nothing.
pub fn split_nested_bounded(input: &str, sep: char, max: usize) -> Vec<&str> {
    if max == 0 {
        return Vec::new();
    }
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 && parts.len() + 1 < max => {
                parts.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

/// Parses template strings into [`Format`] trees.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    settings: ParserSettings,
}

impl Parser {
    /// A parser with the given settings.
    pub fn new(settings: ParserSettings) -> Self {
        Self { settings }
    }

    /// The settings this parser was built with.
    pub fn settings(&self) -> &ParserSettings {
        &self.settings
    }

    /// Parse a template.
    ///
    /// Returns `Err` only under [`ErrorAction::Throw`]; the tolerant
    /// policies embed issues into the tree instead.
    pub fn parse(&self, template: &str) -> Result<Format, ParseErrors> {
        trace!("parsing template ({} bytes)", template.len());
        let src: Arc<str> = Arc::from(template);
        let mut cur = Cursor { src: template, pos: 0, issues: Vec::new() };
        let items = self.parse_body(&mut cur, &src, 0);
        debug_assert_eq!(cur.pos, template.len());
        if self.settings.error_action == ErrorAction::Throw && !cur.issues.is_empty() {
            return Err(ParseErrors { template: template.to_string(), issues: cur.issues });
        }
        trace!("parsed {} top-level items, {} issues", items.len(), cur.issues.len());
        Ok(Format { src, span: 0..template.len(), items })
    }

    /// Scan literal text and placeholders until the end of this nesting
    /// level. `depth` counts the placeholders currently open; the closing
    /// `}` of an enclosing placeholder is left unconsumed for the caller.
    fn parse_body(&self, cur: &mut Cursor<'_>, src: &Arc<str>, depth: usize) -> Vec<FormatItem> {
        let mut items = Vec::new();
        let mut lit = LiteralRun::new(cur.pos);
        loop {
            let Some(c) = cur.peek() else {
                lit.flush(cur.pos, src, &mut items);
                return items;
            };
            match c {
                esc if self.escape_char() == Some(esc) => {
                    match cur.peek_second().and_then(|e| self.decode_escape(e, depth)) {
                        Some(decoded) => {
                            lit.escape(cur.src, cur.pos, decoded);
                            cur.bump();
                            cur.bump();
                        }
                        None => {
                            let next = cur.peek_second().unwrap_or(esc);
                            cur.issue_at(ParseIssueKind::DanglingEscape(next), cur.pos);
                            lit.push(esc);
                            cur.bump();
                        }
                    }
                }
                '{' => {
                    if self.double_brace() && cur.peek_second() == Some('{') {
                        lit.escape(cur.src, cur.pos, '{');
                        cur.bump();
                        cur.bump();
                    } else {
                        lit.flush(cur.pos, src, &mut items);
                        items.push(self.parse_placeholder(cur, src, depth));
                        lit = LiteralRun::new(cur.pos);
                    }
                }
                '}' => {
                    // With more than one placeholder open, `}` always
                    // closes the innermost one; the `}}` escape pair only
                    // exists at the root and directly inside a top-level
                    // placeholder's format body.
                    if depth >= 2 {
                        lit.flush(cur.pos, src, &mut items);
                        return items;
                    }
                    if self.double_brace() && cur.peek_second() == Some('}') {
                        lit.escape(cur.src, cur.pos, '}');
                        cur.bump();
                        cur.bump();
                    } else if depth == 1 {
                        lit.flush(cur.pos, src, &mut items);
                        return items;
                    } else {
                        let index = cur.pos;
                        cur.issue_at(ParseIssueKind::UnexpectedClosingBrace, index);
                        lit.flush(cur.pos, src, &mut items);
                        cur.bump();
                        items.push(FormatItem::Issue(ParseIssue {
                            kind: ParseIssueKind::UnexpectedClosingBrace,
                            index,
                            span: index..cur.pos,
                        }));
                        lit = LiteralRun::new(cur.pos);
                    }
                }
                _ => {
                    lit.push(c);
                    cur.bump();
                }
            }
        }
    }

    /// Parse one placeholder; `cur` sits on its `{`. A placeholder that
    /// accumulates issues collapses into a single [`FormatItem::Issue`]
    /// spanning its whole source text, so the tolerant error actions have
    /// one well-defined span to maintain, replace or drop.
    fn parse_placeholder(&self, cur: &mut Cursor<'_>, src: &Arc<str>, depth: usize) -> FormatItem {
        let start = cur.pos;
        cur.bump(); // '{'

        let mut selectors: Vec<Selector> = Vec::new();
        let mut alignment = 0i32;
        let mut op_range: Range<usize> = cur.pos..cur.pos;
        let mut formatter_name = None;
        let mut formatter_options = None;
        let mut format = None;
        // First issue raised by this placeholder itself (not by a nested
        // format) — it collapses the whole placeholder into an issue item.
        let mut own_issue: Option<(ParseIssueKind, usize)> = None;

        loop {
            match cur.peek() {
                None => {
                    cur.issue_span(ParseIssueKind::UnclosedPlaceholder, start, start..cur.pos);
                    own_issue.get_or_insert((ParseIssueKind::UnclosedPlaceholder, start));
                    break;
                }
                Some('}') => {
                    cur.bump();
                    break;
                }
                Some(':') => {
                    cur.bump();
                    let closed = self.parse_formatter_section(
                        cur,
                        src,
                        depth,
                        &mut formatter_name,
                        &mut formatter_options,
                        &mut format,
                        &mut own_issue,
                    );
                    if !closed {
                        cur.issue_span(ParseIssueKind::UnclosedPlaceholder, start, start..cur.pos);
                        own_issue.get_or_insert((ParseIssueKind::UnclosedPlaceholder, start));
                    }
                    break;
                }
                Some(c) if c == self.settings.alignment_marker => {
                    cur.bump();
                    let a_start = cur.pos;
                    while let Some(c) = cur.peek() {
                        if c == '-' || c == '+' || c.is_ascii_digit() {
                            cur.bump();
                        } else {
                            break;
                        }
                    }
                    match cur.src[a_start..cur.pos].parse::<i32>() {
                        Ok(a) => alignment = a,
                        Err(_) => {
                            cur.issue_span(
                                ParseIssueKind::InvalidAlignment,
                                a_start,
                                a_start..cur.pos,
                            );
                            own_issue
                                .get_or_insert((ParseIssueKind::InvalidAlignment, a_start));
                        }
                    }
                    op_range = cur.pos..cur.pos;
                }
                Some(c) if self.settings.is_splitter(c) => {
                    let op_start = cur.pos;
                    while let Some(c) = cur.peek() {
                        if self.settings.is_splitter(c) {
                            cur.bump();
                        } else {
                            break;
                        }
                    }
                    op_range = op_start..cur.pos;
                }
                Some(c) if is_selector_char(c) => {
                    let text_start = cur.pos;
                    // a configured splitter always terminates the token,
                    // even when it is also a valid selector character
                    while let Some(c) = cur.peek() {
                        if is_selector_char(c) && !self.settings.is_splitter(c) {
                            cur.bump();
                        } else {
                            break;
                        }
                    }
                    selectors.push(Selector {
                        src: src.clone(),
                        text: text_start..cur.pos,
                        operator: op_range.clone(),
                        index: selectors.len(),
                    });
                    op_range = cur.pos..cur.pos;
                }
                Some(c) => {
                    cur.issue_at(ParseIssueKind::InvalidSelectorChar(c), cur.pos);
                    own_issue.get_or_insert((ParseIssueKind::InvalidSelectorChar(c), cur.pos));
                    cur.bump();
                }
            }
        }

        if let Some((kind, index)) = own_issue {
            return FormatItem::Issue(ParseIssue { kind, index, span: start..cur.pos });
        }

        trace!(
            "placeholder at {start}: {} selectors, name {:?}",
            selectors.len(),
            formatter_name
        );
        FormatItem::Placeholder(Box::new(Placeholder {
            src: src.clone(),
            span: start..cur.pos,
            selectors,
            alignment,
            formatter_name,
            formatter_options,
            format,
        }))
    }

    /// Everything after the first `:` of a placeholder: optional formatter
    /// name, optional parenthesized options, optional nested format.
    /// Returns false if the input ended before the placeholder closed.
    ///
    /// A leading identifier-like run is a formatter name only when it is
    /// terminated by `(` or by a further `:`; a run that ends at `}` is
    /// format text (`{1:N2}` formats with the default formatter, it does
    /// not look up a formatter named "N2").
    fn parse_formatter_section(
        &self,
        cur: &mut Cursor<'_>,
        src: &Arc<str>,
        depth: usize,
        formatter_name: &mut Option<Range<usize>>,
        formatter_options: &mut Option<Range<usize>>,
        format: &mut Option<Format>,
        own_issue: &mut Option<(ParseIssueKind, usize)>,
    ) -> bool {
        let section_start = cur.pos;
        let name_len: usize = cur.src[section_start..]
            .chars()
            .take_while(|&c| is_formatter_name_char(c))
            .map(char::len_utf8)
            .sum();
        let name_end = section_start + name_len;

        match cur.src[name_end..].chars().next() {
            Some('(') => {
                *formatter_name = Some(section_start..name_end);
                cur.pos = name_end;
                cur.bump(); // '('
                let opt_start = cur.pos;
                loop {
                    match cur.peek() {
                        None => {
                            cur.issue_at(ParseIssueKind::UnclosedFormatterOptions, opt_start);
                            own_issue.get_or_insert((
                                ParseIssueKind::UnclosedFormatterOptions,
                                opt_start,
                            ));
                            return false;
                        }
                        Some(')') => {
                            *formatter_options = Some(opt_start..cur.pos);
                            cur.bump();
                            break;
                        }
                        Some(esc) if self.escape_char() == Some(esc) => {
                            cur.bump();
                            if cur.peek().is_some() {
                                cur.bump();
                            }
                        }
                        Some(_) => cur.bump(),
                    }
                }
                match cur.peek() {
                    Some(':') => {
                        cur.bump();
                        self.parse_nested_format(cur, src, depth, format)
                    }
                    Some('}') => {
                        cur.bump();
                        true
                    }
                    Some(c) => {
                        cur.issue_at(ParseIssueKind::UnexpectedChar(c), cur.pos);
                        own_issue.get_or_insert((ParseIssueKind::UnexpectedChar(c), cur.pos));
                        // skip to the end of the placeholder
                        while let Some(c) = cur.peek() {
                            cur.bump();
                            if c == '}' {
                                return true;
                            }
                        }
                        false
                    }
                    None => false,
                }
            }
            Some(':') => {
                *formatter_name = Some(section_start..name_end);
                cur.pos = name_end;
                cur.bump(); // ':'
                self.parse_nested_format(cur, src, depth, format)
            }
            _ => {
                // not a name; the whole section is the nested format
                cur.pos = section_start;
                self.parse_nested_format(cur, src, depth, format)
            }
        }
    }

    /// Parse a nested format body up to (and including) the placeholder's
    /// closing brace. Returns false on end of input.
    fn parse_nested_format(
        &self,
        cur: &mut Cursor<'_>,
        src: &Arc<str>,
        depth: usize,
        format: &mut Option<Format>,
    ) -> bool {
        let fmt_start = cur.pos;
        let items = self.parse_body(cur, src, depth + 1);
        match cur.peek() {
            Some('}') => {
                *format = Some(Format { src: src.clone(), span: fmt_start..cur.pos, items });
                cur.bump();
                true
            }
            _ => false,
        }
    }

    fn double_brace(&self) -> bool {
        self.settings.escape == EscapeStyle::DoubleBrace
    }

    fn escape_char(&self) -> Option<char> {
        match self.settings.escape {
            EscapeStyle::DoubleBrace => None,
            EscapeStyle::Char(c) => Some(c),
        }
    }

    /// The fixed escape set for the escape-character style. The colon is
    /// only escapable inside a format body, where it would otherwise
    /// terminate a formatter name.
    fn decode_escape(&self, c: char, depth: usize) -> Option<char> {
        match c {
            '{' => Some('{'),
            '}' => Some('}'),
            'n' => Some('\n'),
            't' => Some('\t'),
            'r' => Some('\r'),
            ':' if depth > 0 => Some(':'),
            c if self.escape_char() == Some(c) => Some(c),
            _ => None,
        }
    }
}

fn is_selector_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_formatter_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Scanning state: position plus accumulated issues.
struct Cursor<'s> {
    src: &'s str,
    pos: usize,
    issues: Vec<ParseIssue>,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.src[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn issue_at(&mut self, kind: ParseIssueKind, index: usize) {
        let len = self.src[index..].chars().next().map_or(0, char::len_utf8);
        self.issues.push(ParseIssue { kind, index, span: index..index + len });
    }

    fn issue_span(&mut self, kind: ParseIssueKind, index: usize, span: Range<usize>) {
        self.issues.push(ParseIssue { kind, index, span });
    }
}

/// A literal run under construction. `decoded` stays `None` until the
/// first escape sequence forces an owned copy.
struct LiteralRun {
    start: usize,
    decoded: Option<String>,
}

impl LiteralRun {
    fn new(start: usize) -> Self {
        Self { start, decoded: None }
    }

    fn push(&mut self, c: char) {
        if let Some(decoded) = &mut self.decoded {
            decoded.push(c);
        }
    }

    fn escape(&mut self, src: &str, pos: usize, decoded_char: char) {
        let decoded = self.decoded.get_or_insert_with(|| src[self.start..pos].to_string());
        decoded.push(decoded_char);
    }

    fn flush(self, end: usize, src: &Arc<str>, items: &mut Vec<FormatItem>) {
        if end > self.start {
            items.push(FormatItem::Literal(LiteralText {
                src: src.clone(),
                span: self.start..end,
                decoded: self.decoded,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(template: &str) -> Format {
        Parser::default().parse(template).unwrap()
    }

    fn placeholder(format: &Format, idx: usize) -> &Placeholder {
        match &format.items()[idx] {
            FormatItem::Placeholder(ph) => ph,
            other => panic!("expected placeholder at {idx}, got {other:?}"),
        }
    }

    #[test]
    fn split_respects_nesting() {
        assert_eq!(split_nested("a|b{1|2|3}|c", '|'), vec!["a", "b{1|2|3}", "c"]);
        assert_eq!(split_nested_bounded("a|b{1|2|3}|c", '|', 2), vec!["a", "b{1|2|3}|c"]);
        assert_eq!(split_nested("", '|'), vec![""]);
        assert_eq!(split_nested("{a|b}", '|'), vec!["{a|b}"]);
        assert_eq!(split_nested_bounded("a|b|c", '|', 0), Vec::<&str>::new());
    }

    #[test]
    fn selector_chain_tokenization() {
        let f = parse("{Person.Address?.State}");
        let ph = placeholder(&f, 0);
        let sels: Vec<_> = ph.selectors().iter().map(|s| (s.text(), s.operator())).collect();
        assert_eq!(sels, vec![("Person", ""), ("Address", "."), ("State", "?.")]);
        assert_eq!(ph.selectors()[2].index(), 2);
    }

    #[test]
    fn consecutive_splitters_collapse() {
        let f = parse("{addr[0].city}");
        let ph = placeholder(&f, 0);
        let sels: Vec<_> = ph.selectors().iter().map(|s| (s.text(), s.operator())).collect();
        // the "]." run collapses into one operator, "[" stays with "0"
        assert_eq!(sels, vec![("addr", ""), ("0", "["), ("city", "].")]);
    }

    #[test]
    fn configured_splitters_override_selector_characters() {
        // '_' is a selector character by default, but once configured as
        // a splitter it must terminate the token instead
        let settings = ParserSettings { splitters: vec!['_'], ..Default::default() };
        let f = Parser::new(settings).parse("{a_b}").unwrap();
        let ph = placeholder(&f, 0);
        let sels: Vec<_> = ph.selectors().iter().map(|s| (s.text(), s.operator())).collect();
        assert_eq!(sels, vec![("a", ""), ("b", "_")]);

        let f = parse("{a_b}");
        assert_eq!(placeholder(&f, 0).selectors().len(), 1);
    }

    #[test]
    fn empty_selector_chain_is_current_value() {
        let f = parse("{}");
        assert!(placeholder(&f, 0).selectors().is_empty());
        let f = parse("{:x}");
        let ph = placeholder(&f, 0);
        assert!(ph.selectors().is_empty());
        assert_eq!(ph.format().unwrap().literal_text(), "x");
    }

    #[test]
    fn alignment_suffix() {
        let f = parse("{0,10}");
        assert_eq!(placeholder(&f, 0).alignment(), 10);
        let f = parse("{0,-4:x}");
        let ph = placeholder(&f, 0);
        assert_eq!(ph.alignment(), -4);
        assert_eq!(ph.format().unwrap().literal_text(), "x");
    }

    #[test]
    fn formatter_name_requires_terminator() {
        // a run ending at `}` is format text, not a name
        let f = parse("{1:N2}");
        let ph = placeholder(&f, 0);
        assert_eq!(ph.formatter_name(), None);
        assert_eq!(ph.format().unwrap().literal_text(), "N2");

        // a further colon makes it a name
        let f = parse("{0:upper:rest}");
        let ph = placeholder(&f, 0);
        assert_eq!(ph.formatter_name(), Some("upper"));
        assert_eq!(ph.format().unwrap().literal_text(), "rest");

        // parentheses make it a name with options
        let f = parse("{0:list(, ):{}}");
        let ph = placeholder(&f, 0);
        assert_eq!(ph.formatter_name(), Some("list"));
        assert_eq!(ph.formatter_options(), Some(", "));
        assert!(ph.format().unwrap().has_placeholders());

        // options with no trailing format
        let f = parse("{0:pad(3)}");
        let ph = placeholder(&f, 0);
        assert_eq!(ph.formatter_name(), Some("pad"));
        assert_eq!(ph.formatter_options(), Some("3"));
        assert!(ph.format().is_none());
    }

    #[test]
    fn name_with_space_is_format_text() {
        let f = parse("{0:hello world}");
        let ph = placeholder(&f, 0);
        assert_eq!(ph.formatter_name(), None);
        assert_eq!(ph.format().unwrap().literal_text(), "hello world");
    }

    #[test]
    fn issues_are_aggregated_under_throw() {
        let err = Parser::default().parse("{bad").unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert_eq!(err.issues[0].kind, ParseIssueKind::UnclosedPlaceholder);
        assert_eq!(err.issues[0].index, 0);

        let err = Parser::default().parse("a } b").unwrap_err();
        assert_eq!(err.issues[0].kind, ParseIssueKind::UnexpectedClosingBrace);
        assert_eq!(err.issues[0].index, 2);
    }

    #[test]
    fn tolerant_parse_embeds_issue_items() {
        let settings =
            ParserSettings { error_action: ErrorAction::MaintainTokens, ..Default::default() };
        let f = Parser::new(settings).parse("x{bad").unwrap();
        assert_eq!(f.items().len(), 2);
        match &f.items()[1] {
            FormatItem::Issue(issue) => {
                assert_eq!(issue.kind, ParseIssueKind::UnclosedPlaceholder);
                assert_eq!(issue.span, 1..5);
            }
            other => panic!("expected issue, got {other:?}"),
        }
    }

    #[test]
    fn escape_char_style() {
        let settings =
            ParserSettings { escape: EscapeStyle::Char('\\'), ..Default::default() };
        let f = Parser::new(settings).parse("\\{a\\} \\n{0}").unwrap();
        match &f.items()[0] {
            FormatItem::Literal(lit) => assert_eq!(lit.text(), "{a} \n"),
            other => panic!("expected literal, got {other:?}"),
        }
        assert!(matches!(&f.items()[1], FormatItem::Placeholder(_)));
    }
}
