use std::{
    fmt::{Debug, Display},
    ops::Range,
};

use logos::{Lexer, Logos};
use strum::{Display, EnumDiscriminants, EnumProperty, IntoStaticStr};

/// A byte range into the grammar source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub(crate) start: usize,
    pub(crate) end: usize,
}

impl From<Range<usize>> for Span {
    fn from(Range { start, end }: Range<usize>) -> Self {
        Span { start, end }
    }
}

impl Span {
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub(crate) fn union(s: Span, t: Span) -> Span {
        Span {
            start: s.start.min(t.start),
            end: s.end.max(t.end),
        }
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Span { start, end } = self;
        write!(f, "[{start}..{end}]")
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token<'a> {
    pub(crate) span: Span,
    pub(crate) payload: TokenPayload<'a>,
}

impl Token<'_> {
    pub(crate) fn is_trivial(&self) -> bool {
        self.payload.get_bool("trivial").unwrap_or(false)
    }
}

impl Debug for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        #[allow(clippy::enum_glob_use)]
        use TokenPayload::*;
        let kind = TokenKind::from(&self.payload);
        let span = &self.span;
        write!(f, "{kind} {span}")?;
        match &self.payload {
            Word(s) | Literal(s) => write!(f, "(\"{}\")", s.escape_debug()),
            Comment(_) | Whitespace | Equals | Termination | Alternation | Concatenation
            | OpeningSquare | ClosingSquare | OpeningBrace | ClosingBrace | OpeningGroup
            | ClosingGroup => Ok(()),
        }
    }
}

/// Why the lexer stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum LexFailure {
    #[default]
    UnexpectedCharacter,
    UnterminatedLiteral,
    UnterminatedComment,
}

/// Scans to the first unescaped `"`. Literals are lexed whole, so every
/// operator character inside quotes is already inert by the time anything
/// downstream looks at a token.
fn lex_literal<'a>(lex: &mut Lexer<'a, TokenPayload<'a>>) -> Result<&'a str, LexFailure> {
    let rest = lex.remainder();
    let mut escaped = false;
    for (i, c) in rest.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => {
                lex.bump(i + 1);
                return Ok(&rest[..i]);
            }
            _ => {}
        }
    }
    Err(LexFailure::UnterminatedLiteral)
}

/// Comments don't nest: the first `*)` closes.
fn lex_comment<'a>(lex: &mut Lexer<'a, TokenPayload<'a>>) -> Result<&'a str, LexFailure> {
    let rest = lex.remainder();
    let end = rest.find("*)").ok_or(LexFailure::UnterminatedComment)?;
    lex.bump(end + 2);
    Ok(&rest[..end])
}

#[derive(EnumDiscriminants, IntoStaticStr, EnumProperty)]
#[strum_discriminants(name(TokenKind), derive(Display))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Logos)]
#[logos(error = LexFailure)]
pub(crate) enum TokenPayload<'a> {
    #[regex(r#"[^\s"=;|,\[\]{}()]+"#)]
    Word(&'a str),
    #[token("\"", lex_literal)]
    Literal(&'a str),
    #[strum(props(trivial = true))]
    #[token("(*", lex_comment)]
    Comment(&'a str),
    #[strum(props(trivial = true))]
    #[regex(r"\s+")]
    Whitespace,
    #[token("=")]
    Equals,
    #[token(";")]
    Termination,
    #[token("|")]
    Alternation,
    #[token(",")]
    Concatenation,
    #[token("[")]
    OpeningSquare,
    #[token("]")]
    ClosingSquare,
    #[token("{")]
    OpeningBrace,
    #[token("}")]
    ClosingBrace,
    #[token("(")]
    OpeningGroup,
    #[token(")")]
    ClosingGroup,
}

impl TokenPayload<'_> {
    pub(crate) fn operator(&self) -> Option<Operator> {
        #[allow(clippy::enum_glob_use)]
        use TokenPayload::*;
        let op = match self {
            Equals => Operator::Equals,
            Alternation => Operator::Alternation,
            Concatenation => Operator::Concatenation,
            OpeningSquare => Operator::OpenedSquare,
            ClosingSquare => Operator::ClosedSquare,
            OpeningBrace => Operator::OpenedBrace,
            ClosingBrace => Operator::ClosedBrace,
            OpeningGroup => Operator::OpenedGroup,
            ClosingGroup => Operator::ClosedGroup,
            Word(_) | Literal(_) | Comment(_) | Whitespace | Termination => return None,
        };
        Some(op)
    }
}

/// Operators that survive sanitization and drive the rule parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumProperty, IntoStaticStr)]
pub enum Operator {
    #[strum(props(repr = "="))]
    Equals,
    #[strum(props(repr = "|"))]
    Alternation,
    #[strum(props(repr = ","))]
    Concatenation,
    #[strum(props(repr = "["))]
    OpenedSquare,
    #[strum(props(repr = "]"))]
    ClosedSquare,
    #[strum(props(repr = "{"))]
    OpenedBrace,
    #[strum(props(repr = "}"))]
    ClosedBrace,
    #[strum(props(repr = "("))]
    OpenedGroup,
    #[strum(props(repr = ")"))]
    ClosedGroup,
}

impl Operator {
    pub fn repr(self) -> &'static str {
        self.get_str("repr").unwrap_or_default()
    }

    /// The bracket that closes this one, if this is an opening bracket.
    pub(crate) fn closer(self) -> Option<Operator> {
        match self {
            Operator::OpenedSquare => Some(Operator::ClosedSquare),
            Operator::OpenedBrace => Some(Operator::ClosedBrace),
            Operator::OpenedGroup => Some(Operator::ClosedGroup),
            _ => None,
        }
    }

    pub(crate) fn is_closing(self) -> bool {
        matches!(
            self,
            Operator::ClosedSquare | Operator::ClosedBrace | Operator::ClosedGroup
        )
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.repr())
    }
}
