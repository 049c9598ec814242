use std::{fmt::Debug, iter::FusedIterator};

use logos::{Logos, SpannedIter};

use crate::{
    error::{EbnfError, FailureReason},
    token_data::{Span, Token, TokenPayload},
};

/// One `;`-terminated statement of a grammar, with comments already removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement<'a> {
    pub(crate) span: Span,
    pub(crate) text: &'a str,
    pub(crate) tokens: Vec<Token<'a>>,
}

impl<'a> Statement<'a> {
    /// Where the statement sits in the grammar, from its first significant
    /// token up to (not including) the terminator.
    pub fn span(&self) -> Span {
        self.span
    }

    pub fn text(&self) -> &'a str {
        self.text
    }
}

/// Lazily splits grammar text into statements.
///
/// The underlying lexer reads quoted literals and comments as single
/// tokens, so a `;` only terminates a statement when it is outside both.
/// The first failure is yielded as an error and ends the iteration.
pub struct StatementSplitter<'a> {
    source: &'a str,
    lexer: SpannedIter<'a, TokenPayload<'a>>,
    finished: bool,
}

impl<'a> StatementSplitter<'a> {
    pub fn new(source: &'a str) -> StatementSplitter<'a> {
        StatementSplitter {
            source,
            lexer: TokenPayload::lexer(source).spanned(),
            finished: false,
        }
    }

    fn fail(&mut self, reason: FailureReason, start: usize, at: Span) -> EbnfError {
        self.finished = true;
        let line_end = self.source[at.end..]
            .find('\n')
            .map_or(self.source.len(), |n| at.end + n);
        EbnfError::syntax(reason, &self.source[start..line_end], at)
    }
}

impl Debug for StatementSplitter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatementSplitter")
            .field("remaining", &self.lexer.remainder())
            .field("finished", &self.finished)
            .finish()
    }
}

impl<'a> Iterator for StatementSplitter<'a> {
    type Item = Result<Statement<'a>, EbnfError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut tokens = Vec::new();
        // Covers significant tokens only, so leading whitespace is not part of the statement
        let mut covered: Option<Span> = None;

        loop {
            let Some((payload, range)) = self.lexer.next() else {
                self.finished = true;
                return covered.map(|span| {
                    Err(EbnfError::syntax(
                        FailureReason::MissingTerminator,
                        &self.source[span.range()],
                        span,
                    ))
                });
            };
            let span = Span::from(range);

            let payload = match payload {
                Ok(payload) => payload,
                Err(failure) => {
                    let start = covered.map_or(span.start, |c| c.start);
                    return Some(Err(self.fail(failure.into(), start, span)));
                }
            };

            match payload {
                TokenPayload::Termination => {
                    if let Some(span) = covered {
                        return Some(Ok(Statement {
                            span,
                            text: &self.source[span.range()],
                            tokens,
                        }));
                    }
                    // Nothing but whitespace before this `;`
                    tokens.clear();
                }
                TokenPayload::Comment(_) => {}
                payload => {
                    let token = Token { span, payload };
                    if !token.is_trivial() {
                        covered = Some(covered.map_or(span, |c| Span::union(c, span)));
                    }
                    tokens.push(token);
                }
            }
        }
    }
}

impl FusedIterator for StatementSplitter<'_> {}
