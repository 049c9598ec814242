use crate::{
    error::{EbnfError, FailureReason},
    expr::{Definitions, Expr, Production},
    sanitizer::{Lexeme, LexemePayload, SanitizedStatement},
    token_data::{Operator, Span},
};

/// Parses `name = definitions` out of one sanitized statement. Everything
/// before the first `=` must be a single name.
pub(crate) fn parse_statement(statement: &SanitizedStatement<'_>) -> Result<Production, EbnfError> {
    let lexemes = statement.lexemes();

    let Some(equals) = lexemes.iter().position(|l| l.is(Operator::Equals)) else {
        return Err(statement.error(FailureReason::MissingDefiningSymbol, statement.span));
    };
    let equals_span = lexemes[equals].span;

    let name = match &lexemes[..equals] {
        [] => return Err(statement.error(FailureReason::EmptyIdentifier, equals_span)),
        [
            Lexeme {
                payload: LexemePayload::Name(name),
                ..
            },
        ] => name.clone(),
        head => {
            let span = covering(head, equals_span);
            return Err(statement.error(FailureReason::MalformedIdentifier, span));
        }
    };

    let body = parse_definitions(statement, &lexemes[equals + 1..], equals_span)?;

    Ok(Production {
        name,
        span: statement.span,
        body,
    })
}

/// `context` is what gets blamed when there is nothing to parse at all.
fn parse_definitions(
    statement: &SanitizedStatement<'_>,
    lexemes: &[Lexeme],
    context: Span,
) -> Result<Definitions, EbnfError> {
    let mut definitions = vec![];

    for alternative in split_top_level(statement, lexemes, Operator::Alternation)? {
        if alternative.is_empty() {
            return Err(statement.error(FailureReason::EmptyAlternative, context));
        }
        let context = covering(alternative, context);

        let mut atoms = vec![];
        for atom in split_top_level(statement, alternative, Operator::Concatenation)? {
            atoms.push(parse_atom(statement, atom, context)?);
        }
        definitions.push(atoms);
    }

    Ok(definitions)
}

/// Splits on `separator` wherever it sits outside every bracket pair.
/// Literals arrive as single lexemes, so quoting needs no tracking here.
fn split_top_level<'l>(
    statement: &SanitizedStatement<'_>,
    lexemes: &'l [Lexeme],
    separator: Operator,
) -> Result<Vec<&'l [Lexeme]>, EbnfError> {
    let mut expected_closers: Vec<(Operator, Span)> = vec![];
    let mut pieces = vec![];
    let mut start = 0;

    for (i, lexeme) in lexemes.iter().enumerate() {
        let Some(op) = lexeme.operator() else {
            continue;
        };
        if let Some(closer) = op.closer() {
            expected_closers.push((closer, lexeme.span));
        } else if op.is_closing() {
            match expected_closers.pop() {
                Some((expected, _)) if expected == op => {}
                _ => return Err(statement.error(FailureReason::UnbalancedBracket, lexeme.span)),
            }
        } else if op == separator && expected_closers.is_empty() {
            pieces.push(&lexemes[start..i]);
            start = i + 1;
        }
    }

    if let Some((_, opened_at)) = expected_closers.pop() {
        return Err(statement.error(FailureReason::UnbalancedBracket, opened_at));
    }
    pieces.push(&lexemes[start..]);
    Ok(pieces)
}

fn parse_atom(
    statement: &SanitizedStatement<'_>,
    atom: &[Lexeme],
    context: Span,
) -> Result<Expr, EbnfError> {
    match atom {
        [] => Err(statement.error(FailureReason::EmptyAtom, context)),
        [
            Lexeme {
                span,
                payload: LexemePayload::Literal(text),
            },
        ] => Ok(Expr::Literal {
            span: *span,
            text: text.clone(),
        }),
        [
            Lexeme {
                span,
                payload: LexemePayload::Name(name),
            },
        ] => Ok(Expr::Nonterminal {
            span: *span,
            name: name.clone(),
        }),
        [open, inner @ .., close] if encloses(open, inner, close) => {
            let span = Span::union(open.span, close.span);
            let body = parse_definitions(statement, inner, span)?;
            Ok(match open.operator() {
                Some(Operator::OpenedSquare) => Expr::Optional { span, body },
                Some(Operator::OpenedBrace) => Expr::Repetition { span, body },
                _ => Expr::Group { span, body },
            })
        }
        _ => {
            let text = atom.iter().map(ToString::to_string).collect();
            Err(statement.error(FailureReason::MalformedAtom(text), covering(atom, context)))
        }
    }
}

/// Whether `open` and `close` are partners, making the atom exactly one
/// bracket group rather than several glued together.
fn encloses(open: &Lexeme, inner: &[Lexeme], close: &Lexeme) -> bool {
    let Some(closer) = open.operator().and_then(Operator::closer) else {
        return false;
    };
    if !close.is(closer) {
        return false;
    }

    let mut depth = 0usize;
    for op in inner.iter().filter_map(Lexeme::operator) {
        if op.closer().is_some() {
            depth += 1;
        } else if op.is_closing() {
            let Some(d) = depth.checked_sub(1) else {
                return false;
            };
            depth = d;
        }
    }
    depth == 0
}

fn covering(lexemes: &[Lexeme], fallback: Span) -> Span {
    lexemes
        .iter()
        .map(|l| l.span)
        .reduce(Span::union)
        .unwrap_or(fallback)
}
