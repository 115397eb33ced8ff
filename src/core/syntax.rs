//! Syntax tree handed from a grammar engine to the recipe compiler.
//!
//! Nodes carry their grammar rule, the exact source text they matched,
//! start/stop positions and their children. The compiler only reads the
//! tree; any grammar engine that produces this shape can feed it.

use std::fmt;

/// Grammar rules the compiler knows how to turn into tokens or metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    Recipe,
    Directive,
    /// Directive name in command position.
    Command,
    /// Custom directive name written as `!name`.
    Ecommand,
    Identifier,
    Column,
    ColList,
    Text,
    StringList,
    Number,
    NumberList,
    Bool,
    BoolList,
    ByteSize,
    TimeDuration,
    PropertyList,
    Property,
    NumberRanges,
    NumberRange,
    Condition,
    PragmaLoadDirective,
    PragmaVersion,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A point in the source stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Byte offset into the source.
    pub offset: usize,
    /// 1-based line.
    pub line: usize,
    /// 0-based character column within the line.
    pub column: usize,
}

/// One node of the syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxNode {
    pub rule: Rule,
    /// Source text matched by this node.
    pub text: String,
    /// Position of the first character.
    pub start: Position,
    /// Position of the last character (inclusive).
    pub stop: Position,
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    pub fn leaf(rule: Rule, text: impl Into<String>, start: Position, stop: Position) -> Self {
        Self {
            rule,
            text: text.into(),
            start,
            stop,
            children: Vec::new(),
        }
    }

    /// Children matching `rule`, in order.
    pub fn children_by_rule(&self, rule: Rule) -> impl Iterator<Item = &SyntaxNode> {
        self.children.iter().filter(move |c| c.rule == rule)
    }

    /// First child matching `rule`.
    pub fn child(&self, rule: Rule) -> Option<&SyntaxNode> {
        self.children_by_rule(rule).next()
    }
}
