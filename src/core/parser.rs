//! Recursive-descent parser producing the recipe syntax tree.
//!
//! Grammar (informal):
//!
//! ```text
//! recipe    := (pragma | directive)* separated by ';' or newlines
//! pragma    := '#pragma' ( 'load-directives' ident (',' ident)*
//!                        | 'version' (number | ident) )
//! directive := (ident | '!' ident) argument*
//! argument  := column (',' column)*
//!            | string (',' string)*
//!            | bool (',' bool)*
//!            | number (',' number)*
//!            | range (',' range)*            range := number ':' number '=' (number | string)
//!            | unit-literal
//!            | 'prop' ':' '{' (key '=' value (',' key '=' value)*)? '}'
//!            | 'exp' ':' block | block
//!            | ident
//! ```

use super::lexer::{tokenize, LexFailure, Lexeme, Spanned};
use super::syntax::{Position, Rule, SyntaxNode};
use crate::error::CompileError;
use crate::units::TimeUnit;
use std::ops::Range;

/// Parse recipe text into a [`Rule::Recipe`] tree.
pub fn parse(source: &str) -> Result<SyntaxNode, CompileError> {
    let lines = line_starts(source);
    let lexemes = tokenize(source, 0).map_err(|f| lex_error(source, &lines, f))?;
    let mut parser = Parser::new(source, &lines, lexemes, source.len());
    parser.recipe()
}

/// Byte offsets at which each line starts.
fn line_starts(source: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(source.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

fn position(source: &str, lines: &[usize], offset: usize) -> Position {
    let line = lines.partition_point(|&start| start <= offset).max(1);
    let line_start = lines[line - 1];
    let column = source
        .get(line_start..offset)
        .map(|s| s.chars().count())
        .unwrap_or(0);
    Position {
        offset,
        line,
        column,
    }
}

fn lex_error(source: &str, lines: &[usize], failure: LexFailure) -> CompileError {
    let at = position(source, lines, failure.span.start);
    CompileError::Syntax {
        line: at.line,
        column: at.column,
        message: failure.message,
    }
}

fn describe(lexeme: Lexeme) -> &'static str {
    match lexeme {
        Lexeme::Newline => "newline",
        Lexeme::Pragma => "'#pragma'",
        Lexeme::Semicolon => "';'",
        Lexeme::Comma => "','",
        Lexeme::Colon => "':'",
        Lexeme::Equals => "'='",
        Lexeme::Bang => "'!'",
        Lexeme::Bool => "boolean",
        Lexeme::Column => "column reference",
        Lexeme::Str => "string",
        Lexeme::Number => "number",
        Lexeme::UnitLiteral => "unit literal",
        Lexeme::Identifier => "identifier",
        Lexeme::Block => "block",
    }
}

/// Time suffixes become durations; anything else is treated as a byte size
/// so the compiler reports the unit.
fn unit_rule(literal: &str) -> Rule {
    let suffix = literal.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.');
    if TimeUnit::from_name(suffix).is_some() {
        Rule::TimeDuration
    } else {
        Rule::ByteSize
    }
}

struct Parser<'a> {
    source: &'a str,
    lines: &'a [usize],
    lexemes: Vec<Spanned>,
    pos: usize,
    /// Offset reported for errors at end of input.
    end: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, lines: &'a [usize], lexemes: Vec<Spanned>, end: usize) -> Self {
        Self {
            source,
            lines,
            lexemes,
            pos: 0,
            end,
        }
    }

    // ------------------------------------------------------------------------
    // Cursor
    // ------------------------------------------------------------------------

    fn peek(&self) -> Option<Lexeme> {
        self.peek_at(0)
    }

    fn peek_at(&self, ahead: usize) -> Option<Lexeme> {
        self.lexemes.get(self.pos + ahead).map(|s| s.lexeme)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let next = self.lexemes.get(self.pos).cloned();
        if next.is_some() {
            self.pos += 1;
        }
        next
    }

    fn at_boundary(&self) -> bool {
        self.peek().map_or(true, Lexeme::is_terminator)
    }

    fn skip_terminators(&mut self) {
        while self.peek().is_some_and(Lexeme::is_terminator) {
            self.pos += 1;
        }
    }

    fn skip_newlines(&mut self) {
        while self.peek() == Some(Lexeme::Newline) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, lexeme: Lexeme, context: &str) -> Result<Spanned, CompileError> {
        match self.lexemes.get(self.pos) {
            Some(next) if next.lexeme == lexeme => {
                self.pos += 1;
                Ok(next.clone())
            }
            _ => {
                let message = format!("expected {} {}", describe(lexeme), context);
                Err(self.unexpected(message.trim_end()))
            }
        }
    }

    fn unexpected(&self, message: &str) -> CompileError {
        let (offset, found) = match self.lexemes.get(self.pos) {
            Some(next) => (next.span.start, describe(next.lexeme)),
            None => (self.end, "end of input"),
        };
        let at = position(self.source, self.lines, offset);
        CompileError::Syntax {
            line: at.line,
            column: at.column,
            message: format!("{}, found {}", message, found),
        }
    }

    // ------------------------------------------------------------------------
    // Node construction
    // ------------------------------------------------------------------------

    fn node(&self, rule: Rule, range: Range<usize>, children: Vec<SyntaxNode>) -> SyntaxNode {
        let text = &self.source[range.clone()];
        let start = position(self.source, self.lines, range.start);
        let stop = match text.chars().next_back() {
            Some(last) => position(self.source, self.lines, range.end - last.len_utf8()),
            None => start,
        };
        SyntaxNode {
            rule,
            text: text.to_string(),
            start,
            stop,
            children,
        }
    }

    fn leaf(&self, rule: Rule, lexeme: &Spanned) -> SyntaxNode {
        self.node(rule, lexeme.span.clone(), Vec::new())
    }

    // ------------------------------------------------------------------------
    // Rules
    // ------------------------------------------------------------------------

    fn recipe(&mut self) -> Result<SyntaxNode, CompileError> {
        let mut children = Vec::new();
        loop {
            self.skip_terminators();
            match self.peek() {
                None => break,
                Some(Lexeme::Pragma) => children.push(self.pragma()?),
                Some(_) => children.push(self.directive()?),
            }
            if !self.at_boundary() {
                return Err(self.unexpected("expected ';' or newline after directive"));
            }
        }
        Ok(self.node(Rule::Recipe, 0..self.source.len(), children))
    }

    fn pragma(&mut self) -> Result<SyntaxNode, CompileError> {
        let start = self.expect(Lexeme::Pragma, "")?;
        let name = self.expect(Lexeme::Identifier, "after '#pragma'")?;
        let source = self.source;
        match &source[name.span.clone()] {
            "load-directives" => {
                let mut children = Vec::new();
                let first = self.expect(Lexeme::Identifier, "in load-directives list")?;
                let mut end = first.span.end;
                children.push(self.leaf(Rule::Identifier, &first));
                while self.peek() == Some(Lexeme::Comma) {
                    self.pos += 1;
                    let next = self.expect(Lexeme::Identifier, "after ','")?;
                    end = next.span.end;
                    children.push(self.leaf(Rule::Identifier, &next));
                }
                Ok(self.node(Rule::PragmaLoadDirective, start.span.start..end, children))
            }
            "version" => {
                let value = match self.peek() {
                    Some(Lexeme::Number) => self.advance().map(|v| (Rule::Number, v)),
                    Some(Lexeme::Identifier) => self.advance().map(|v| (Rule::Identifier, v)),
                    _ => None,
                };
                let (rule, value) =
                    value.ok_or_else(|| self.unexpected("expected version after 'version'"))?;
                let child = self.leaf(rule, &value);
                Ok(self.node(
                    Rule::PragmaVersion,
                    start.span.start..value.span.end,
                    vec![child],
                ))
            }
            other => {
                let at = position(self.source, self.lines, name.span.start);
                Err(CompileError::Syntax {
                    line: at.line,
                    column: at.column,
                    message: format!("unknown pragma '{}'", other),
                })
            }
        }
    }

    fn directive(&mut self) -> Result<SyntaxNode, CompileError> {
        let command = match self.peek() {
            Some(Lexeme::Identifier) => self
                .advance()
                .map(|name| self.leaf(Rule::Command, &name)),
            Some(Lexeme::Bang) => {
                let bang = self.expect(Lexeme::Bang, "")?;
                let name = self.expect(Lexeme::Identifier, "after '!'")?;
                Some(self.node(Rule::Ecommand, bang.span.start..name.span.end, Vec::new()))
            }
            _ => None,
        };
        let command = command.ok_or_else(|| self.unexpected("expected directive name"))?;
        let start = command.start.offset;
        let mut end = start + command.text.len();
        let mut children = vec![command];

        while !self.at_boundary() {
            let (arg, arg_end) = self.argument()?;
            end = arg_end;
            children.push(arg);
        }
        Ok(self.node(Rule::Directive, start..end, children))
    }

    /// One argument and the byte offset where it ends.
    fn argument(&mut self) -> Result<(SyntaxNode, usize), CompileError> {
        let lexeme = self
            .peek()
            .ok_or_else(|| self.unexpected("expected argument"))?;
        match lexeme {
            Lexeme::Column => self.list(Lexeme::Column, Rule::Column, Rule::ColList),
            Lexeme::Str => self.list(Lexeme::Str, Rule::Text, Rule::StringList),
            Lexeme::Bool => self.list(Lexeme::Bool, Rule::Bool, Rule::BoolList),
            Lexeme::Number if self.peek_at(1) == Some(Lexeme::Colon) => self.ranges(),
            Lexeme::Number => self.list(Lexeme::Number, Rule::Number, Rule::NumberList),
            Lexeme::UnitLiteral => {
                let lit = self.expect(Lexeme::UnitLiteral, "")?;
                let rule = unit_rule(&self.source[lit.span.clone()]);
                Ok((self.leaf(rule, &lit), lit.span.end))
            }
            Lexeme::Block => {
                let block = self.expect(Lexeme::Block, "")?;
                Ok((self.leaf(Rule::Condition, &block), block.span.end))
            }
            Lexeme::Identifier => {
                let is_block_arg = self.peek_at(1) == Some(Lexeme::Colon)
                    && self.peek_at(2) == Some(Lexeme::Block);
                let ident = self.expect(Lexeme::Identifier, "")?;
                let source = self.source;
                let name = &source[ident.span.clone()];
                match (name, is_block_arg) {
                    ("prop", true) => {
                        self.pos += 1;
                        let block = self.expect(Lexeme::Block, "")?;
                        let props = self.properties(&block)?;
                        let range = ident.span.start..block.span.end;
                        Ok((self.node(Rule::PropertyList, range, props), block.span.end))
                    }
                    ("exp", true) => {
                        self.pos += 1;
                        let block = self.expect(Lexeme::Block, "")?;
                        let range = ident.span.start..block.span.end;
                        Ok((self.node(Rule::Condition, range, Vec::new()), block.span.end))
                    }
                    _ => Ok((self.leaf(Rule::Identifier, &ident), ident.span.end)),
                }
            }
            other => Err(self.unexpected(&format!("unexpected {}", describe(other)))),
        }
    }

    /// A single item, or a comma-separated list of items of the same kind.
    fn list(
        &mut self,
        item: Lexeme,
        item_rule: Rule,
        list_rule: Rule,
    ) -> Result<(SyntaxNode, usize), CompileError> {
        let first = self.expect(item, "")?;
        if self.peek() != Some(Lexeme::Comma) {
            return Ok((self.leaf(item_rule, &first), first.span.end));
        }
        let mut end = first.span.end;
        let mut children = vec![self.leaf(item_rule, &first)];
        while self.peek() == Some(Lexeme::Comma) {
            self.pos += 1;
            let next = self.expect(item, "after ','")?;
            end = next.span.end;
            children.push(self.leaf(item_rule, &next));
        }
        Ok((self.node(list_rule, first.span.start..end, children), end))
    }

    fn ranges(&mut self) -> Result<(SyntaxNode, usize), CompileError> {
        let mut children = Vec::new();
        let mut start = None;
        let mut end;
        loop {
            let low = self.expect(Lexeme::Number, "as range lower bound")?;
            self.expect(Lexeme::Colon, "in range")?;
            let high = self.expect(Lexeme::Number, "as range upper bound")?;
            self.expect(Lexeme::Equals, "after range bounds")?;
            let label = match self.peek() {
                Some(Lexeme::Number) => self.advance().map(|l| (Rule::Number, l)),
                Some(Lexeme::Str) => self.advance().map(|l| (Rule::Text, l)),
                _ => None,
            };
            let (label_rule, label) =
                label.ok_or_else(|| self.unexpected("expected range value"))?;
            end = label.span.end;
            start.get_or_insert(low.span.start);
            let parts = vec![
                self.leaf(Rule::Number, &low),
                self.leaf(Rule::Number, &high),
                self.leaf(label_rule, &label),
            ];
            children.push(self.node(Rule::NumberRange, low.span.start..end, parts));
            if self.peek() != Some(Lexeme::Comma) {
                break;
            }
            self.pos += 1;
        }
        let start = start.unwrap_or(end);
        Ok((self.node(Rule::NumberRanges, start..end, children), end))
    }

    /// Parse `key=value` pairs inside a `prop:{...}` block.
    fn properties(&self, block: &Spanned) -> Result<Vec<SyntaxNode>, CompileError> {
        let inner = block.span.start + 1..block.span.end - 1;
        let lexemes = tokenize(&self.source[inner.clone()], inner.start)
            .map_err(|f| lex_error(self.source, self.lines, f))?;
        let mut sub = Parser::new(self.source, self.lines, lexemes, inner.end);

        let mut props = Vec::new();
        loop {
            sub.skip_newlines();
            let key = match sub.peek() {
                None => break,
                Some(Lexeme::Identifier) => sub.advance().map(|k| sub.leaf(Rule::Identifier, &k)),
                Some(Lexeme::Str) => sub.advance().map(|k| sub.leaf(Rule::Text, &k)),
                _ => None,
            };
            let key = key.ok_or_else(|| sub.unexpected("expected property name"))?;
            sub.expect(Lexeme::Equals, "after property name")?;
            let value = match sub.peek() {
                Some(Lexeme::Number) => sub.advance().map(|v| (Rule::Number, v)),
                Some(Lexeme::Bool) => sub.advance().map(|v| (Rule::Bool, v)),
                Some(Lexeme::Str) => sub.advance().map(|v| (Rule::Text, v)),
                Some(Lexeme::Identifier) => sub.advance().map(|v| (Rule::Identifier, v)),
                _ => None,
            };
            let (value_rule, value) =
                value.ok_or_else(|| sub.unexpected("expected property value"))?;
            let range = key.start.offset..value.span.end;
            let value = sub.leaf(value_rule, &value);
            props.push(sub.node(Rule::Property, range, vec![key, value]));

            sub.skip_newlines();
            match sub.peek() {
                None => break,
                Some(Lexeme::Comma) => sub.pos += 1,
                Some(_) => return Err(sub.unexpected("expected ',' between properties")),
            }
        }
        Ok(props)
    }
}
