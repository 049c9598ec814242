#![cfg(test)]
use crate::{Expr, Grammar, Production, Span, expr::Definitions};
use proptest::prelude::*;
use proptest::prop_oneof;
use proptest_derive::Arbitrary;

const DUMMY_SPAN: Span = Span { start: 0, end: 0 };

const DIGITS: &str = r#"
    Number = Digit, {Digit};
    Digit = "0" | "1" | "2" | "3" | "4" | "5" | "6" | "7" | "8" | "9";
"#;

#[derive(Debug, Clone, Copy, Arbitrary)]
enum Piece {
    Digit(#[proptest(strategy = "0..10u8")] u8),
    Letter(#[proptest(strategy = "b'a'..=b'z'")] u8),
    Blank,
}

impl Piece {
    fn push_to(self, out: &mut String) {
        match self {
            Piece::Digit(d) => out.push(char::from(b'0' + d)),
            Piece::Letter(c) => out.push(char::from(c)),
            Piece::Blank => out.push(' '),
        }
    }
}

fn body_strategy(atom: impl Strategy<Value = Expr>) -> impl Strategy<Value = Definitions> {
    prop::collection::vec(prop::collection::vec(atom, 1..4), 1..3)
}

fn expr_strategy() -> impl Strategy<Value = Expr> {
    let leaf = prop_oneof![
        "[A-Z][a-zA-Z0-9_]{0,5}".prop_map(|name| Expr::Nonterminal {
            span: DUMMY_SPAN,
            name
        }),
        r#"[a-z0-9+\-=;|,(){}\[\]"\\ ]{1,4}"#.prop_map(|text| Expr::Literal {
            span: DUMMY_SPAN,
            text
        }),
    ];

    leaf.prop_recursive(3, 24, 3, |inner| {
        prop_oneof![
            body_strategy(inner.clone()).prop_map(|body| Expr::Optional {
                span: DUMMY_SPAN,
                body
            }),
            body_strategy(inner.clone()).prop_map(|body| Expr::Repetition {
                span: DUMMY_SPAN,
                body
            }),
            body_strategy(inner).prop_map(|body| Expr::Group {
                span: DUMMY_SPAN,
                body
            }),
        ]
    })
}

/// Spans are the only thing allowed to differ after a reparse.
fn strip_spans(body: &mut Definitions) {
    for expr in body.iter_mut().flatten() {
        match expr {
            Expr::Literal { span, .. } | Expr::Nonterminal { span, .. } => *span = DUMMY_SPAN,
            Expr::Optional { span, body }
            | Expr::Repetition { span, body }
            | Expr::Group { span, body } => {
                *span = DUMMY_SPAN;
                strip_spans(body);
            }
        }
    }
}

#[test]
fn dummy_span_is_empty() {
    assert!(DUMMY_SPAN.is_empty());
}

proptest! {
    #[test]
    fn display_roundtrip(body in body_strategy(expr_strategy())) {
        let original = Production { name: "Root".into(), span: DUMMY_SPAN, body };
        let text = original.to_string();
        let mut reparsed = Production::new(&text).unwrap_or_else(|e| panic!("{e}\n{text}"));

        strip_spans(&mut reparsed.body);
        prop_assert_eq!(&reparsed.name, &original.name);
        prop_assert_eq!(reparsed.body, original.body, "{}", text);
    }
}

proptest! {
    #[test]
    fn repetition_takes_the_longest_digit_prefix(pieces in prop::collection::vec(any::<Piece>(), 0..24)) {
        let grammar = Grammar::new(DIGITS).unwrap();
        let mut input = String::new();
        for piece in pieces {
            piece.push_to(&mut input);
        }

        let digits = input.bytes().take_while(u8::is_ascii_digit).count();
        let m = grammar.match_input("Number", &input).unwrap();

        prop_assert_eq!(m.success, digits > 0);
        if m.success {
            prop_assert_eq!(m.tree.value, &input[..digits]);
            prop_assert_eq!(m.remainder, &input[digits..]);
            prop_assert_eq!(m.tree.children.len(), digits);
        } else {
            prop_assert_eq!(m.remainder, input.as_str());
        }
    }
}

proptest! {
    #[test]
    fn matching_is_deterministic(pieces in prop::collection::vec(any::<Piece>(), 0..16)) {
        let grammar = Grammar::new(DIGITS).unwrap();
        let mut input = String::new();
        for piece in pieces {
            piece.push_to(&mut input);
        }

        let first = grammar.match_input("Number", &input).unwrap();
        let second = grammar.match_input("Number", &input).unwrap();
        prop_assert_eq!(first, second);
    }
}
