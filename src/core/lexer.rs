//! Lexical analysis for recipe text.
//!
//! Lexemes are unit variants; the parser reads their text back from the
//! source through the span, so quoting and unit suffixes stay intact for
//! the compiler. Brace blocks (`{ ... }`) are a single lexeme so that
//! condition bodies pass through untouched.

use logos::{Lexer, Logos};
use std::ops::Range;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\f]+")]
#[logos(skip r"//[^\n]*")]
pub enum Lexeme {
    #[token("\n")]
    Newline,

    #[token("#pragma")]
    Pragma,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,

    #[token(":")]
    Colon,

    #[token("=")]
    Equals,

    #[token("!")]
    Bang,

    #[token("true", ignore(ascii_case))]
    #[token("false", ignore(ascii_case))]
    Bool,

    /// `:name` column reference.
    #[regex(r":[A-Za-z_@$][A-Za-z0-9_.\-@$]*")]
    Column,

    #[regex(r"'([^'\\]|\\.)*'")]
    #[regex(r#""([^"\\]|\\.)*""#)]
    Str,

    #[regex(r"-?[0-9]+(\.[0-9]+)?")]
    Number,

    /// Number immediately followed by a unit suffix, e.g. `10KB`, `1.5h`.
    #[regex(r"[0-9]+(\.[0-9]+)?[A-Za-z]+")]
    UnitLiteral,

    #[regex(r"[A-Za-z_][A-Za-z0-9_\-]*")]
    Identifier,

    /// Balanced `{ ... }` including the braces.
    #[token("{", block)]
    Block,
}

impl Lexeme {
    /// Terminates a directive or pragma.
    pub fn is_terminator(self) -> bool {
        matches!(self, Self::Semicolon | Self::Newline)
    }
}

/// Consume up to the matching `}`; quoted text may contain braces.
fn block(lex: &mut Lexer<'_, Lexeme>) -> bool {
    let mut depth = 1usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in lex.remainder().char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    lex.bump(i + 1);
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

/// A lexeme with its byte range in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub lexeme: Lexeme,
    pub span: Range<usize>,
}

/// A byte range the lexer could not match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexFailure {
    pub span: Range<usize>,
    pub message: String,
}

/// Lex `source`, shifting every span by `base` so sub-ranges of a larger
/// text report absolute offsets.
pub fn tokenize(source: &str, base: usize) -> Result<Vec<Spanned>, LexFailure> {
    let mut out = Vec::new();
    let mut lexer = Lexeme::lexer(source);
    while let Some(next) = lexer.next() {
        let span = lexer.span();
        let shifted = span.start + base..span.end + base;
        match next {
            Ok(lexeme) => out.push(Spanned {
                lexeme,
                span: shifted,
            }),
            Err(()) => {
                let rest = &source[span.start..];
                let message = match rest.chars().next() {
                    Some('{') => "unterminated block".to_string(),
                    Some('\'') | Some('"') => "unterminated string literal".to_string(),
                    Some(c) => format!("unexpected character '{}'", c),
                    None => "unexpected end of input".to_string(),
                };
                return Err(LexFailure {
                    span: shifted,
                    message,
                });
            }
        }
    }
    Ok(out)
}
