//! Lenient front end for the Modulefile DSL.
//!
//! A Modulefile is a sequence of calls, one per line: a key followed by
//! comma-separated string arguments, optionally parenthesized. Unknown
//! keys and arity mismatches produce warnings and are skipped, and every
//! call recognized before a hard syntax error has already been delivered
//! to the sink.

use crate::calls::{Arg, CallSink, CallSymbol, SourceSpan, SourceSyntax};
use crate::error::{ParseError, ParseResult};
use crate::lexer::{dsl_tokens, DslToken};
use crate::value::Value;
use modfile_common::{Diagnostic, DiagnosticSink, ModuleName};
use std::ops::Range;

/// Parses `source` as a Modulefile, emitting one call per recognized
/// construct. Returns `Err` on the first hard syntax error; calls emitted
/// before that point stand.
pub fn parse_modulefile(
    source: &str,
    sink: &mut dyn CallSink,
    diagnostics: &mut dyn DiagnosticSink,
) -> ParseResult<()> {
    tracing::debug!(len = source.len(), "parsing Modulefile");
    ModulefileParser {
        source,
        tokens: dsl_tokens(source),
        pos: 0,
        sink,
        diagnostics,
    }
    .parse_document()
}

struct ModulefileParser<'src, 'a> {
    source: &'src str,
    tokens: Vec<(Result<DslToken<'src>, ()>, Range<usize>)>,
    pos: usize,
    sink: &'a mut dyn CallSink,
    diagnostics: &'a mut dyn DiagnosticSink,
}

impl<'src> ModulefileParser<'src, '_> {
    fn parse_document(&mut self) -> ParseResult<()> {
        while let Some((token, range)) = self.peek() {
            match token {
                Ok(DslToken::Newline) => {
                    self.advance();
                }
                Ok(DslToken::Ident(key)) => {
                    let key = *key;
                    let range = range.clone();
                    self.parse_call(key, range)?;
                }
                Ok(other) => {
                    return Err(ParseError::unexpected_token(
                        range.start,
                        "call keyword",
                        token_name(other),
                    ));
                }
                Err(()) => return Err(ParseError::lexer_error(range.start)),
            }
        }
        Ok(())
    }

    fn parse_call(&mut self, key: &'src str, key_range: Range<usize>) -> ParseResult<()> {
        self.advance();

        let mut parens = false;
        if matches!(self.peek_ok(), Some(DslToken::LParen)) {
            parens = true;
            self.advance();
        }

        let mut args = Vec::new();
        let mut end = key_range.end;
        let mut first = true;
        loop {
            if parens {
                self.skip_newlines();
            }

            // End of the argument list?
            match self.peek() {
                None => {
                    if parens {
                        return Err(ParseError::unexpected_eof(self.source.len()));
                    }
                    break;
                }
                Some((Ok(DslToken::Newline), _)) if !parens => {
                    self.advance();
                    break;
                }
                Some((Ok(DslToken::RParen), range)) if parens => {
                    end = range.end;
                    self.advance();
                    break;
                }
                Some((Err(()), range)) => return Err(ParseError::lexer_error(range.start)),
                _ => {}
            }

            if !first {
                match self.peek_ok() {
                    Some(DslToken::Comma) => {
                        self.advance();
                        // Arguments may continue on the next line after a comma.
                        self.skip_newlines();
                    }
                    _ => {
                        let pos = self
                            .peek()
                            .map(|(_, range)| range.start)
                            .unwrap_or(self.source.len());
                        return Err(ParseError::unexpected_token(
                            pos,
                            "','",
                            self.describe_current(),
                        ));
                    }
                }
            }

            match self.peek() {
                Some((Ok(DslToken::DoubleString(s)), range)) => {
                    let (s, range) = (*s, range.clone());
                    args.push(Arg::new(
                        SourceSpan::from_range(range.clone()),
                        Value::String(unescape_double(s)),
                    ));
                    end = range.end;
                    self.advance();
                }
                Some((Ok(DslToken::SingleString(s)), range)) => {
                    let (s, range) = (*s, range.clone());
                    args.push(Arg::new(
                        SourceSpan::from_range(range.clone()),
                        Value::String(unescape_single(s)),
                    ));
                    end = range.end;
                    self.advance();
                }
                Some((Ok(_), range)) => {
                    return Err(ParseError::unexpected_token(
                        range.start,
                        "string literal",
                        self.describe_current(),
                    ));
                }
                Some((Err(()), range)) => return Err(ParseError::lexer_error(range.start)),
                None => {
                    if parens {
                        return Err(ParseError::unexpected_eof(self.source.len()));
                    }
                    break;
                }
            }
            first = false;
        }

        self.dispatch(key, key_range, end, args);
        Ok(())
    }

    /// Applies the shape table and lenient-recovery rules, then emits.
    fn dispatch(&mut self, key: &str, key_range: Range<usize>, end: usize, args: Vec<Arg>) {
        let line = self.line_of(key_range.start);
        let symbol = match CallSymbol::from_key(key) {
            Some(s) if s.valid_in(SourceSyntax::Modulefile) => s,
            _ => {
                self.warn(format!("Unexpected call '{key}'"), line);
                return;
            }
        };

        if symbol == CallSymbol::Description {
            self.warn("Ignoring description".to_string(), line);
            return;
        }

        let shape = symbol.shape();
        let nargs = args.len();
        if nargs < shape.min_args || shape.max_args.is_some_and(|max| nargs > max) {
            self.warn(
                format!("Unexpected number of arguments ({nargs}) for '{key}'"),
                line,
            );
            return;
        }
        if symbol == CallSymbol::Dependency && nargs == 3 {
            self.warn("Ignoring third argument to dependency".to_string(), line);
        }
        if symbol == CallSymbol::Name {
            if let Some(name) = args.first().and_then(|a| a.value.as_str()) {
                if let Err(e) = ModuleName::parse(name) {
                    self.diagnostics
                        .report(Diagnostic::error(e.to_string()).at_line(line));
                }
            }
        }

        self.sink.call(
            symbol,
            SourceSpan::new(key_range.start, end - key_range.start),
            args,
        );
    }

    fn peek(&self) -> Option<&(Result<DslToken<'src>, ()>, Range<usize>)> {
        self.tokens.get(self.pos)
    }

    fn peek_ok(&self) -> Option<&DslToken<'src>> {
        match self.tokens.get(self.pos) {
            Some((Ok(token), _)) => Some(token),
            _ => None,
        }
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek_ok(), Some(DslToken::Newline)) {
            self.advance();
        }
    }

    fn describe_current(&self) -> String {
        match self.peek() {
            Some((Ok(token), _)) => token_name(token).to_string(),
            Some((Err(()), _)) => "invalid token".to_string(),
            None => "end of file".to_string(),
        }
    }

    fn line_of(&self, offset: usize) -> u32 {
        line_of_offset(self.source, offset)
    }

    fn warn(&mut self, message: String, line: u32) {
        tracing::warn!(line, "{message}");
        self.diagnostics
            .report(Diagnostic::warning(message).at_line(line));
    }
}

pub(crate) fn line_of_offset(source: &str, offset: usize) -> u32 {
    let end = offset.min(source.len());
    source[..end].bytes().filter(|b| *b == b'\n').count() as u32 + 1
}

fn token_name(token: &DslToken<'_>) -> &'static str {
    match token {
        DslToken::Newline => "newline",
        DslToken::Comment => "comment",
        DslToken::Ident(_) => "identifier",
        DslToken::DoubleString(_) | DslToken::SingleString(_) => "string literal",
        DslToken::Comma => "','",
        DslToken::LParen => "'('",
        DslToken::RParen => "')'",
    }
}

/// Double-quoted strings honor `\n`, `\t` and pass any other escaped
/// character through verbatim.
fn unescape_double(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Single-quoted strings only recognize `\'` and `\\`; any other backslash
/// is literal text.
fn unescape_single(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some('\'') | Some('\\') => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                _ => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calls::CallRecorder;
    use modfile_common::DiagnosticList;

    fn parse(source: &str) -> (CallRecorder, DiagnosticList, ParseResult<()>) {
        let mut recorder = CallRecorder::new();
        let mut diags = DiagnosticList::new();
        let result = parse_modulefile(source, &mut recorder, &mut diags);
        (recorder, diags, result)
    }

    #[test]
    fn test_scalar_calls() {
        let source = "name 'alice/demo'\nversion \"1.0.0\"\nauthor 'alice'\n";
        let (recorder, diags, result) = parse(source);
        assert!(result.is_ok());
        assert!(diags.is_empty());
        assert_eq!(recorder.calls.len(), 3);

        let name = &recorder.calls[0];
        assert_eq!(name.symbol, CallSymbol::Name);
        assert_eq!(name.span.offset, 0);
        assert_eq!(&source[name.span.offset..name.span.end()], "name 'alice/demo'");
        assert_eq!(name.args[0].value, Value::string("alice/demo"));
        assert_eq!(
            &source[name.args[0].span.offset..name.args[0].span.end()],
            "'alice/demo'"
        );
    }

    #[test]
    fn test_dependency_with_version() {
        let (recorder, _, result) = parse("dependency 'a/b', '>=1.0.0'\n");
        assert!(result.is_ok());
        let call = &recorder.calls[0];
        assert_eq!(call.symbol, CallSymbol::Dependency);
        assert_eq!(call.args.len(), 2);
        assert_eq!(call.args[1].value, Value::string(">=1.0.0"));
    }

    #[test]
    fn test_parenthesized_call() {
        let (recorder, _, result) = parse("tags('web', 'proxy')\n");
        assert!(result.is_ok());
        assert_eq!(recorder.calls[0].args.len(), 2);
    }

    #[test]
    fn test_continuation_after_comma() {
        let (recorder, _, result) = parse("operatingsystem_support 'RedHat',\n  '6', '7'\n");
        assert!(result.is_ok());
        assert_eq!(recorder.calls[0].args.len(), 3);
    }

    #[test]
    fn test_unknown_key_warns_and_skips() {
        let (recorder, diags, result) = parse("frobnicate 'x'\nauthor 'a'\n");
        assert!(result.is_ok());
        assert_eq!(recorder.calls.len(), 1);
        assert_eq!(diags.warnings().count(), 1);
    }

    #[test]
    fn test_description_is_ignored_with_warning() {
        let (recorder, diags, result) = parse("description 'long text'\n");
        assert!(result.is_ok());
        assert!(recorder.calls.is_empty());
        assert!(diags.warnings().any(|d| d.message.contains("description")));
    }

    #[test]
    fn test_third_dependency_argument_warns_but_emits() {
        let (recorder, diags, result) = parse("dependency 'a/b', '>=1.0.0', 'extra'\n");
        assert!(result.is_ok());
        assert_eq!(recorder.calls.len(), 1);
        assert_eq!(recorder.calls[0].args.len(), 3);
        assert!(diags.warnings().any(|d| d.message.contains("third argument")));
    }

    #[test]
    fn test_partial_parse_keeps_earlier_calls() {
        let (recorder, _, result) = parse("name 'a/b'\nversion = broken\n");
        assert!(result.is_err());
        assert_eq!(recorder.calls.len(), 1);
        assert_eq!(recorder.calls[0].symbol, CallSymbol::Name);
    }

    #[test]
    fn test_comments_are_transparent() {
        let (recorder, _, result) = parse("# Modulefile\nlicense 'MIT' # trailing\n");
        assert!(result.is_ok());
        assert_eq!(recorder.calls.len(), 1);
        assert_eq!(recorder.calls[0].symbol, CallSymbol::License);
    }

    #[test]
    fn test_escapes_round_trip() {
        assert_eq!(unescape_single(r"'it\'s'"), "it's");
        assert_eq!(unescape_single(r"'a\b'"), r"a\b");
        assert_eq!(unescape_double(r#""a\"b\n""#), "a\"b\n");
    }
}
