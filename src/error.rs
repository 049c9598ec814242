use ariadne::{Config, IndexType, Label, Report, ReportKind, Source};
use strum::EnumDiscriminants;
use thiserror::Error;

use crate::token_data::{LexFailure, Span};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EbnfError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error("grammar contains no rules")]
    EmptyInput,
    #[error("unknown rule `{0}`")]
    UnknownRule(String),
    #[error("recursion limit of {limit} exceeded while matching rule `{rule}`")]
    RecursionLimitExceeded { rule: String, limit: usize },
}

impl EbnfError {
    pub(crate) fn syntax(reason: FailureReason, statement: &str, span: Span) -> EbnfError {
        EbnfError::Syntax(SyntaxError {
            reason,
            statement: statement.trim().to_owned(),
            span,
        })
    }

    pub fn reason(&self) -> Option<&FailureReason> {
        match self {
            EbnfError::Syntax(e) => Some(&e.reason),
            _ => None,
        }
    }

    /// The kind of compile-time failure, if this is one.
    pub fn kind(&self) -> Option<FailureKind> {
        self.reason().map(FailureKind::from)
    }
}

/// A compile-time failure, tied to the statement it was found in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason} in statement `{statement}` at {span}")]
pub struct SyntaxError {
    pub reason: FailureReason,
    /// Source text of the offending statement, without its terminator
    pub statement: String,
    /// The most specific offending location
    pub span: Span,
}

impl SyntaxError {
    /// Renders a caret diagnostic against the grammar text the error came from.
    pub fn report(&self, source: &str) -> String {
        let range = self.span.range();
        let mut rendered = Vec::new();
        let written = Report::build(ReportKind::Error, range.clone())
            .with_config(
                Config::default()
                    .with_color(false)
                    .with_index_type(IndexType::Byte),
            )
            .with_message(&self.reason)
            .with_label(Label::new(range).with_message(self.reason.label()))
            .finish()
            .write(Source::from(source), &mut rendered);

        match written {
            Ok(()) => String::from_utf8_lossy(&rendered).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, EnumDiscriminants)]
#[strum_discriminants(name(FailureKind), derive(Hash))]
pub enum FailureReason {
    #[error("unterminated literal")]
    UnterminatedLiteral,
    #[error("unterminated comment")]
    UnterminatedComment,
    #[error("unexpected character")]
    UnexpectedCharacter,
    #[error("missing statement terminator `;`")]
    MissingTerminator,
    #[error("missing defining symbol `=`")]
    MissingDefiningSymbol,
    #[error("missing rule identifier before `=`")]
    EmptyIdentifier,
    #[error("rule identifier must be a single name")]
    MalformedIdentifier,
    #[error("empty alternative")]
    EmptyAlternative,
    #[error("empty atom")]
    EmptyAtom,
    #[error("malformed atom `{0}`")]
    MalformedAtom(String),
    #[error("unbalanced bracket")]
    UnbalancedBracket,
    #[error("duplicate identifier `{0}`")]
    DuplicateIdentifier(String),
    #[error("unresolved reference to `{name}` in rule `{rule}`")]
    UnresolvedReference { name: String, rule: String },
}

impl FailureReason {
    fn label(&self) -> &'static str {
        match self {
            FailureReason::UnterminatedLiteral => "literal opened here is never closed",
            FailureReason::UnterminatedComment => "comment opened here is never closed",
            FailureReason::UnexpectedCharacter => "not part of any token",
            FailureReason::MissingTerminator => "statement needs a `;`",
            FailureReason::MissingDefiningSymbol => "statement has no `=`",
            FailureReason::EmptyIdentifier | FailureReason::MalformedIdentifier => {
                "rule name expected here"
            }
            FailureReason::EmptyAlternative => "nothing between these separators",
            FailureReason::EmptyAtom => "expected a literal, name or bracket group",
            FailureReason::MalformedAtom(_) => "cannot classify this atom",
            FailureReason::UnbalancedBracket => "bracket has no partner",
            FailureReason::DuplicateIdentifier(_) => "already defined",
            FailureReason::UnresolvedReference { .. } => "referenced rule is never defined",
        }
    }
}

impl From<LexFailure> for FailureReason {
    fn from(value: LexFailure) -> Self {
        match value {
            LexFailure::UnexpectedCharacter => FailureReason::UnexpectedCharacter,
            LexFailure::UnterminatedLiteral => FailureReason::UnterminatedLiteral,
            LexFailure::UnterminatedComment => FailureReason::UnterminatedComment,
        }
    }
}
