//! Logos tokenizers for the two concrete syntaxes.

use logos::Logos;
use std::ops::Range;

/// Tokens of the Modulefile DSL. Line oriented: newlines are significant
/// (they terminate calls), comments run to end of line.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+")]
pub enum DslToken<'src> {
    #[token("\n")]
    Newline,

    #[regex(r"#[^\n]*", logos::skip)]
    Comment,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice())]
    Ident(&'src str),

    #[regex(r#""([^"\\\n]|\\[^\n])*""#, |lex| lex.slice())]
    DoubleString(&'src str),

    #[regex(r"'([^'\\\n]|\\[^\n])*'", |lex| lex.slice())]
    SingleString(&'src str),

    #[token(",")]
    Comma,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,
}

/// JSON tokens. Whitespace is insignificant everywhere.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum JsonToken<'src> {
    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(":")]
    Colon,

    #[token(",")]
    Comma,

    #[regex(r#""([^"\\]|\\.)*""#, |lex| lex.slice())]
    Str(&'src str),

    #[regex(r"-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| lex.slice())]
    Number(&'src str),

    #[token("true")]
    True,

    #[token("false")]
    False,

    #[token("null")]
    Null,
}

/// Tokenizes the whole input, keeping lexer failures in the stream so the
/// parser can turn them into positioned syntax errors.
pub fn dsl_tokens(source: &str) -> Vec<(Result<DslToken<'_>, ()>, Range<usize>)> {
    DslToken::lexer(source).spanned().collect()
}

pub fn json_tokens(source: &str) -> Vec<(Result<JsonToken<'_>, ()>, Range<usize>)> {
    JsonToken::lexer(source).spanned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dsl_call_line() {
        let tokens = dsl_tokens("author 'alice'\n");
        let kinds: Vec<_> = tokens.into_iter().map(|(t, _)| t.unwrap()).collect();
        assert_eq!(
            kinds,
            vec![
                DslToken::Ident("author"),
                DslToken::SingleString("'alice'"),
                DslToken::Newline,
            ]
        );
    }

    #[test]
    fn test_dsl_comment_skipped() {
        let tokens = dsl_tokens("# header\nname 'a/b'\n");
        assert_eq!(tokens[0].0, Ok(DslToken::Newline));
        assert_eq!(tokens[1].0, Ok(DslToken::Ident("name")));
    }

    #[test]
    fn test_dsl_lexer_error_position() {
        let tokens = dsl_tokens("version 1.0\n");
        let err = tokens.iter().find(|(t, _)| t.is_err()).unwrap();
        assert_eq!(err.1.start, 8);
    }

    #[test]
    fn test_json_string_span_includes_quotes() {
        let tokens = json_tokens(r#"{"name": "x"}"#);
        assert_eq!(tokens[1].0, Ok(JsonToken::Str("\"name\"")));
        assert_eq!(tokens[1].1, 1..7);
    }
}
