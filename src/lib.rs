#![forbid(unsafe_code)]
#![warn(explicit_outlives_requirements)]
#![warn(missing_debug_implementations)]
#![warn(clippy::pedantic)]
#![warn(missing_copy_implementations)]
#![warn(redundant_lifetimes)]
//#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![warn(unused_crate_dependencies)]
#![warn(unused_qualifications)]
#![allow(clippy::must_use_candidate)]

//! Compiles grammars written in Extended Backus-Naur form and matches text
//! against them.
//!
//! ```
//! let grammar = ebnf_compiler::compile(
//!     r#"
//!     SignedNumber = [Sign], WholeNumber;
//!     WholeNumber = Digit, {Digit};
//!     Digit = "0" | "1" | "2" | "3" | "4" | "5" | "6" | "7" | "8" | "9";
//!     Sign = "+" | "-";
//!     "#,
//! )?;
//!
//! let result = grammar.match_input("SignedNumber", "-10")?;
//! assert!(result.is_complete());
//! assert_eq!(result.tree.children[1].value, "10");
//! # Ok::<(), ebnf_compiler::EbnfError>(())
//! ```

mod debug;
mod error;
mod expr;
mod lexing;
mod matcher;
mod nodes;
mod parser;
mod proptesting;
mod rule;
mod sanitizer;
mod synthesis;
mod token_data;

pub use error::{EbnfError, FailureKind, FailureReason, SyntaxError};
pub use expr::{Definitions, Expr, ExprKind, Production};
pub use lexing::{Statement, StatementSplitter};
pub use matcher::{DEFAULT_DEPTH_LIMIT, MatchResult, Matcher, match_input};
pub use nodes::ParseNode;
pub use rule::{Alternative, Atom, AtomKind, Grammar, GroupKind, Origin, Rule};
pub use sanitizer::{Lexeme, LexemePayload, SanitizedStatement, sanitize};
pub use token_data::{Operator, Span};

/// Compiles grammar text into a [`Grammar`]. Same as [`Grammar::new`].
pub fn compile(text: &str) -> Result<Grammar, EbnfError> {
    Grammar::new(text)
}

#[cfg(test)]
mod tests {
    use display_tree::format_tree;

    use crate::{FailureKind, compile};

    const SIGNED: &str = r#"
        SignedNumber = [Sign], WholeNumber;
        WholeNumber = Digit, {Digit};
        Digit = "0" | "1" | "2" | "3" | "4" | "5" | "6" | "7" | "8" | "9";
        Sign = "+" | "-";
    "#;

    #[test]
    fn basic_success() {
        let grammar = compile(SIGNED).unwrap_or_else(|e| panic!("{e}"));
        let m = grammar.match_input("SignedNumber", "+42 apples").unwrap();

        assert!(m.success);
        assert_eq!(m.remainder, " apples");
        let tree = format_tree!(m.tree);
        insta::assert_snapshot!(tree, @r#"
        SignedNumber "+42"
        └─0: Sign "+"
          1: WholeNumber "42"
             └─0: Digit "4"
               1: Digit "2"
        "#);
    }

    #[test]
    fn unsigned_number() {
        let grammar = compile(SIGNED).unwrap();
        let m = grammar.match_input("SignedNumber", "7").unwrap();
        assert!(m.is_complete());
        insta::assert_snapshot!(m.tree, @r#"SignedNumber("7")[WholeNumber("7")[Digit("7")]]"#);
    }

    #[test]
    fn no_grammar_on_any_error() {
        let src = format!("{SIGNED} Broken = Sign,;");
        let err = compile(&src).unwrap_err();
        assert_eq!(err.kind(), Some(FailureKind::EmptyAtom));
    }

    #[test]
    fn basic_span_check() {
        let src = "message = hello; hello = \"hi\";";
        let grammar = compile(src).unwrap();
        let rule = grammar.get("hello").unwrap();
        assert_eq!(&src[rule.span().range()], "hello = \"hi\"");
    }
}
