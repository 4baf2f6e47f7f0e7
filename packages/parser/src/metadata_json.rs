//! Lenient front end for metadata.json.
//!
//! Walks the top-level object member by member and emits a call per
//! recognized key. Spans cover whole literals (quotes and brackets
//! included): a scalar member's single argument spans its value literal,
//! a collection member's arguments span each element of the array.
//! Members recognized before a syntax error have already been emitted.

use crate::calls::{Arg, CallSink, CallSymbol, ShapeKind, SourceSpan, SourceSyntax};
use crate::error::{ParseError, ParseResult};
use crate::lexer::{json_tokens, JsonToken};
use crate::modulefile::line_of_offset;
use crate::value::Value;
use modfile_common::{Diagnostic, DiagnosticSink, ModuleName};
use std::ops::Range;

/// Parses `source` as metadata.json, emitting one call per recognized
/// top-level member.
pub fn parse_metadata_json(
    source: &str,
    sink: &mut dyn CallSink,
    diagnostics: &mut dyn DiagnosticSink,
) -> ParseResult<()> {
    tracing::debug!(len = source.len(), "parsing metadata.json");
    MetadataJsonParser {
        source,
        tokens: json_tokens(source),
        pos: 0,
        sink,
        diagnostics,
    }
    .parse_document()
}

struct MetadataJsonParser<'src, 'a> {
    source: &'src str,
    tokens: Vec<(Result<JsonToken<'src>, ()>, Range<usize>)>,
    pos: usize,
    sink: &'a mut dyn CallSink,
    diagnostics: &'a mut dyn DiagnosticSink,
}

impl<'src> MetadataJsonParser<'src, '_> {
    fn parse_document(&mut self) -> ParseResult<()> {
        self.expect(JsonToken::LBrace, "'{'")?;
        if matches!(self.peek_ok(), Some(JsonToken::RBrace)) {
            self.advance();
            return Ok(());
        }
        loop {
            let (key, key_range) = self.parse_key()?;
            self.expect(JsonToken::Colon, "':'")?;
            self.parse_member(&key, key_range.start)?;

            match self.next_token()? {
                (JsonToken::Comma, _) => {}
                (JsonToken::RBrace, _) => return Ok(()),
                (other, range) => {
                    return Err(ParseError::unexpected_token(
                        range.start,
                        "',' or '}'",
                        token_name(&other),
                    ));
                }
            }
        }
    }

    fn parse_member(&mut self, key: &str, key_start: usize) -> ParseResult<()> {
        let line = line_of_offset(self.source, key_start);
        let symbol = CallSymbol::from_key(key).filter(|s| s.valid_in(SourceSyntax::MetadataJson));
        let Some(symbol) = symbol else {
            let _ = self.parse_value()?;
            self.warn(format!("Ignoring unknown key '{key}'"), line);
            return Ok(());
        };

        if symbol == CallSymbol::Description {
            let _ = self.parse_value()?;
            self.warn("Ignoring description".to_string(), line);
            return Ok(());
        }

        match symbol.shape().kind {
            ShapeKind::Scalar => {
                let (value, range) = self.parse_value()?;
                if symbol == CallSymbol::Name {
                    if let Some(name) = value.as_str() {
                        if let Err(e) = ModuleName::parse(name) {
                            self.diagnostics
                                .report(Diagnostic::error(e.to_string()).at_line(line));
                        }
                    }
                }
                self.sink.call(
                    symbol,
                    SourceSpan::new(key_start, range.end - key_start),
                    vec![Arg::new(SourceSpan::from_range(range), value)],
                );
            }
            ShapeKind::ScalarList | ShapeKind::ObjectList => {
                if matches!(self.peek_ok(), Some(JsonToken::LBracket)) {
                    let (args, end) = self.parse_array_args()?;
                    self.sink
                        .call(symbol, SourceSpan::new(key_start, end - key_start), args);
                } else {
                    let _ = self.parse_value()?;
                    self.warn(format!("Expected array value for '{key}'"), line);
                }
            }
        }
        Ok(())
    }

    /// Array elements as call arguments, one span per element literal.
    fn parse_array_args(&mut self) -> ParseResult<(Vec<Arg>, usize)> {
        let _ = self.next_token()?; // consumes '['
        let mut args = Vec::new();
        if matches!(self.peek_ok(), Some(JsonToken::RBracket)) {
            let (_, close) = self.next_token()?;
            return Ok((args, close.end));
        }
        loop {
            let (value, range) = self.parse_value()?;
            args.push(Arg::new(SourceSpan::from_range(range), value));
            match self.next_token()? {
                (JsonToken::Comma, _) => {}
                (JsonToken::RBracket, range) => return Ok((args, range.end)),
                (other, range) => {
                    return Err(ParseError::unexpected_token(
                        range.start,
                        "',' or ']'",
                        token_name(&other),
                    ));
                }
            }
        }
    }

    fn parse_value(&mut self) -> ParseResult<(Value, Range<usize>)> {
        match self.next_token()? {
            (JsonToken::Str(s), range) => {
                let value = unescape_json(s, range.start)?;
                Ok((Value::String(value), range))
            }
            (JsonToken::Number(n), range) => Ok((Value::string(n), range)),
            (JsonToken::True, range) => Ok((Value::string("true"), range)),
            (JsonToken::False, range) => Ok((Value::string("false"), range)),
            (JsonToken::Null, range) => Ok((Value::Null, range)),
            (JsonToken::LBracket, open) => {
                let mut items = Vec::new();
                if matches!(self.peek_ok(), Some(JsonToken::RBracket)) {
                    let (_, close) = self.next_token()?;
                    return Ok((Value::Array(items), open.start..close.end));
                }
                loop {
                    let (value, _) = self.parse_value()?;
                    items.push(value);
                    match self.next_token()? {
                        (JsonToken::Comma, _) => {}
                        (JsonToken::RBracket, close) => {
                            return Ok((Value::Array(items), open.start..close.end));
                        }
                        (other, range) => {
                            return Err(ParseError::unexpected_token(
                                range.start,
                                "',' or ']'",
                                token_name(&other),
                            ));
                        }
                    }
                }
            }
            (JsonToken::LBrace, open) => {
                let mut fields = Vec::new();
                if matches!(self.peek_ok(), Some(JsonToken::RBrace)) {
                    let (_, close) = self.next_token()?;
                    return Ok((Value::Object(fields), open.start..close.end));
                }
                loop {
                    let (key, _) = self.parse_key()?;
                    self.expect(JsonToken::Colon, "':'")?;
                    let (value, _) = self.parse_value()?;
                    fields.push((key, value));
                    match self.next_token()? {
                        (JsonToken::Comma, _) => {}
                        (JsonToken::RBrace, close) => {
                            return Ok((Value::Object(fields), open.start..close.end));
                        }
                        (other, range) => {
                            return Err(ParseError::unexpected_token(
                                range.start,
                                "',' or '}'",
                                token_name(&other),
                            ));
                        }
                    }
                }
            }
            (other, range) => Err(ParseError::unexpected_token(
                range.start,
                "value",
                token_name(&other),
            )),
        }
    }

    fn parse_key(&mut self) -> ParseResult<(String, Range<usize>)> {
        match self.next_token()? {
            (JsonToken::Str(s), range) => {
                let key = unescape_json(s, range.start)?;
                Ok((key, range))
            }
            (other, range) => Err(ParseError::unexpected_token(
                range.start,
                "string key",
                token_name(&other),
            )),
        }
    }

    fn next_token(&mut self) -> ParseResult<(JsonToken<'src>, Range<usize>)> {
        match self.tokens.get(self.pos) {
            Some((Ok(token), range)) => {
                let out = (token.clone(), range.clone());
                self.pos += 1;
                Ok(out)
            }
            Some((Err(()), range)) => Err(ParseError::lexer_error(range.start)),
            None => Err(ParseError::unexpected_eof(self.source.len())),
        }
    }

    fn peek_ok(&self) -> Option<&JsonToken<'src>> {
        match self.tokens.get(self.pos) {
            Some((Ok(token), _)) => Some(token),
            _ => None,
        }
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn expect(&mut self, expected: JsonToken<'src>, name: &str) -> ParseResult<()> {
        match self.next_token()? {
            (token, _) if token == expected => Ok(()),
            (other, range) => Err(ParseError::unexpected_token(
                range.start,
                name,
                token_name(&other),
            )),
        }
    }

    fn warn(&mut self, message: String, line: u32) {
        tracing::warn!(line, "{message}");
        self.diagnostics
            .report(Diagnostic::warning(message).at_line(line));
    }
}

fn token_name(token: &JsonToken<'_>) -> &'static str {
    match token {
        JsonToken::LBrace => "'{'",
        JsonToken::RBrace => "'}'",
        JsonToken::LBracket => "'['",
        JsonToken::RBracket => "']'",
        JsonToken::Colon => "':'",
        JsonToken::Comma => "','",
        JsonToken::Str(_) => "string",
        JsonToken::Number(_) => "number",
        JsonToken::True | JsonToken::False => "boolean",
        JsonToken::Null => "null",
    }
}

/// Delegates to serde_json so unescaping is the exact inverse of the JSON
/// serializer's escaping.
fn unescape_json(quoted: &str, pos: usize) -> ParseResult<String> {
    serde_json::from_str::<String>(quoted)
        .map_err(|_| ParseError::invalid_syntax(pos, "invalid string escape"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calls::CallRecorder;
    use modfile_common::DiagnosticList;

    fn parse(source: &str) -> (CallRecorder, DiagnosticList, ParseResult<()>) {
        let mut recorder = CallRecorder::new();
        let mut diags = DiagnosticList::new();
        let result = parse_metadata_json(source, &mut recorder, &mut diags);
        (recorder, diags, result)
    }

    #[test]
    fn test_scalar_member_spans() {
        let source = r#"{
  "name": "alice/demo",
  "version": "1.0.0"
}"#;
        let (recorder, diags, result) = parse(source);
        assert!(result.is_ok());
        assert!(diags.is_empty());
        assert_eq!(recorder.calls.len(), 2);

        let name = &recorder.calls[0];
        assert_eq!(name.symbol, CallSymbol::Name);
        assert_eq!(
            &source[name.span.offset..name.span.end()],
            r#""name": "alice/demo""#
        );
        assert_eq!(
            &source[name.args[0].span.offset..name.args[0].span.end()],
            r#""alice/demo""#
        );
        assert_eq!(name.args[0].value, Value::string("alice/demo"));
    }

    #[test]
    fn test_dependencies_element_spans() {
        let source = r#"{"dependencies": [{"name": "a/b", "version_requirement": ">=1.0.0"}]}"#;
        let (recorder, _, result) = parse(source);
        assert!(result.is_ok());
        let call = &recorder.calls[0];
        assert_eq!(call.symbol, CallSymbol::Dependencies);
        assert_eq!(call.args.len(), 1);
        let dep = &call.args[0];
        assert!(source[dep.span.offset..dep.span.end()].starts_with('{'));
        assert_eq!(
            dep.value.get("version_requirement").and_then(Value::as_str),
            Some(">=1.0.0")
        );
    }

    #[test]
    fn test_tags_elements() {
        let (recorder, _, result) = parse(r#"{"tags": ["web", "proxy"]}"#);
        assert!(result.is_ok());
        let call = &recorder.calls[0];
        assert_eq!(call.symbol, CallSymbol::Tags);
        assert_eq!(call.args.len(), 2);
        assert_eq!(call.args[1].value, Value::string("proxy"));
    }

    #[test]
    fn test_unknown_key_is_skipped_with_warning() {
        let (recorder, diags, result) = parse(r#"{"checksums": {"a": "b"}, "author": "x"}"#);
        assert!(result.is_ok());
        assert_eq!(recorder.calls.len(), 1);
        assert_eq!(recorder.calls[0].symbol, CallSymbol::Author);
        assert!(diags.warnings().any(|d| d.message.contains("checksums")));
    }

    #[test]
    fn test_partial_parse_keeps_earlier_members() {
        let (recorder, _, result) = parse(r#"{"name": "a/b", "version": }"#);
        assert!(result.is_err());
        assert_eq!(recorder.calls.len(), 1);
        assert_eq!(recorder.calls[0].symbol, CallSymbol::Name);
    }

    #[test]
    fn test_null_reads_as_absent() {
        let (recorder, _, result) =
            parse(r#"{"dependencies": [{"name": "a/b", "version_requirement": null}]}"#);
        assert!(result.is_ok());
        let dep = &recorder.calls[0].args[0];
        assert_eq!(
            dep.value.get("version_requirement").and_then(Value::as_str),
            None
        );
    }
}
