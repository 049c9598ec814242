use std::fmt::Display;

use crate::{
    error::{EbnfError, FailureReason},
    lexing::Statement,
    token_data::{Operator, Span, TokenPayload},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    pub(crate) span: Span,
    pub(crate) payload: LexemePayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexemePayload {
    /// A rule identifier, with any interior whitespace already collapsed
    Name(String),
    /// Literal contents with escapes resolved
    Literal(String),
    Operator(Operator),
}

impl Lexeme {
    pub fn span(&self) -> Span {
        self.span
    }

    pub fn payload(&self) -> &LexemePayload {
        &self.payload
    }

    pub(crate) fn operator(&self) -> Option<Operator> {
        match self.payload {
            LexemePayload::Operator(op) => Some(op),
            LexemePayload::Name(_) | LexemePayload::Literal(_) => None,
        }
    }

    pub(crate) fn is(&self, op: Operator) -> bool {
        self.operator() == Some(op)
    }
}

impl Display for Lexeme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.payload {
            LexemePayload::Name(name) => f.write_str(name),
            LexemePayload::Literal(text) => write!(f, "\"{}\"", escape(text)),
            LexemePayload::Operator(op) => write!(f, "{op}"),
        }
    }
}

/// A statement with its insignificant whitespace removed. Prints back
/// as the compact statement text, e.g. `SignedNumber=[Sign],WholeNumber`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedStatement<'a> {
    pub(crate) span: Span,
    pub(crate) source: &'a str,
    pub(crate) lexemes: Vec<Lexeme>,
}

impl<'a> SanitizedStatement<'a> {
    pub fn lexemes(&self) -> &[Lexeme] {
        &self.lexemes
    }

    /// The statement as it was written.
    pub fn source(&self) -> &'a str {
        self.source
    }

    pub(crate) fn error(&self, reason: FailureReason, span: Span) -> EbnfError {
        EbnfError::syntax(reason, self.source, span)
    }
}

impl Display for SanitizedStatement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for lexeme in &self.lexemes {
            write!(f, "{lexeme}")?;
        }
        Ok(())
    }
}

/// Drops whitespace everywhere outside literals. Runs of words that were
/// separated only by whitespace collapse into a single name, which is how
/// `Whole Number` becomes `WholeNumber`.
pub fn sanitize<'a>(statement: &Statement<'a>) -> SanitizedStatement<'a> {
    let mut lexemes: Vec<Lexeme> = Vec::with_capacity(statement.tokens.len());

    for token in statement.tokens.iter().filter(|t| !t.is_trivial()) {
        let span = token.span;
        let payload = match token.payload {
            TokenPayload::Word(word) => {
                if let Some(Lexeme {
                    span: previous,
                    payload: LexemePayload::Name(name),
                }) = lexemes.last_mut()
                {
                    name.push_str(word);
                    *previous = Span::union(*previous, span);
                    continue;
                }
                LexemePayload::Name(word.to_owned())
            }
            TokenPayload::Literal(raw) => LexemePayload::Literal(unescape(raw)),
            ref other => match other.operator() {
                Some(op) => LexemePayload::Operator(op),
                // Terminators and comments never reach a statement
                None => continue,
            },
        };
        lexemes.push(Lexeme { span, payload });
    }

    SanitizedStatement {
        span: statement.span,
        source: statement.text,
        lexemes,
    }
}

pub(crate) fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(n @ ('"' | '\\')) => out.push(n),
            Some(n) => {
                out.push('\\');
                out.push(n);
            }
            None => out.push('\\'),
        }
    }
    out
}

pub(crate) fn escape(literal: &str) -> String {
    literal.replace('\\', "\\\\").replace('"', "\\\"")
}
