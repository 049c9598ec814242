use std::{collections::VecDeque, fmt::Display};

use strum::{EnumDiscriminants, IntoStaticStr};

use crate::{
    EbnfError, Span,
    lexing::StatementSplitter,
    parser::parse_statement,
    rule::GroupKind,
    sanitizer::{escape, sanitize},
};

/// An ordered list of alternatives, each an ordered list of atoms.
pub type Definitions = Vec<Vec<Expr>>;

/// One atom of a parsed statement, before bracket groups are lifted into
/// rules of their own.
#[derive(Debug, Clone, PartialEq, Eq, EnumDiscriminants)]
#[strum_discriminants(name(ExprKind), derive(IntoStaticStr))]
pub enum Expr {
    Literal { span: Span, text: String },
    Nonterminal { span: Span, name: String },
    Optional { span: Span, body: Definitions },
    Repetition { span: Span, body: Definitions },
    Group { span: Span, body: Definitions },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal { span, .. }
            | Expr::Nonterminal { span, .. }
            | Expr::Optional { span, .. }
            | Expr::Repetition { span, .. }
            | Expr::Group { span, .. } => *span,
        }
    }

    /// The bracket kind and interior of a group atom.
    pub fn group(&self) -> Option<(GroupKind, &Definitions)> {
        match self {
            Expr::Optional { body, .. } => Some((GroupKind::Optional, body)),
            Expr::Repetition { body, .. } => Some((GroupKind::Repetition, body)),
            Expr::Group { body, .. } => Some((GroupKind::Group, body)),
            Expr::Literal { .. } | Expr::Nonterminal { .. } => None,
        }
    }
}

/// A single parsed statement: `name = definitions;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub name: String,
    pub span: Span,
    pub body: Definitions,
}

impl Production {
    /// Parses the first statement of `src` on its own, without checking that
    /// the rules it refers to exist anywhere.
    pub fn new(src: &str) -> Result<Production, EbnfError> {
        let statement = StatementSplitter::new(src)
            .next()
            .ok_or(EbnfError::EmptyInput)??;
        parse_statement(&sanitize(&statement))
    }

    /// Every rule name referenced, breadth first through nested groups.
    pub fn nonterminals(&self) -> Vec<&str> {
        let mut queue: VecDeque<&Expr> = self.body.iter().flatten().collect();
        let mut names = vec![];

        while let Some(expr) = queue.pop_front() {
            match expr {
                Expr::Literal { .. } => {}
                Expr::Nonterminal { name, .. } => names.push(name.as_str()),
                Expr::Optional { body, .. }
                | Expr::Repetition { body, .. }
                | Expr::Group { body, .. } => queue.extend(body.iter().flatten()),
            }
        }
        names
    }
}

fn write_definitions(
    f: &mut std::fmt::Formatter<'_>,
    definitions: &[Vec<impl Display>],
) -> std::fmt::Result {
    for (ind, alternative) in definitions.iter().enumerate() {
        if ind > 0 {
            write!(f, " | ")?;
        }
        for (ind, atom) in alternative.iter().enumerate() {
            if ind > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{atom}")?;
        }
    }
    Ok(())
}

impl Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Literal { text, .. } => write!(f, "\"{}\"", escape(text)),
            Expr::Nonterminal { name, .. } => write!(f, "{name}"),
            Expr::Optional { body, .. } => write_group(f, GroupKind::Optional, body),
            Expr::Repetition { body, .. } => write_group(f, GroupKind::Repetition, body),
            Expr::Group { body, .. } => write_group(f, GroupKind::Group, body),
        }
    }
}

fn write_group(
    f: &mut std::fmt::Formatter<'_>,
    kind: GroupKind,
    body: &Definitions,
) -> std::fmt::Result {
    let (open, close) = kind.brackets();
    write!(f, "{open}")?;
    write_definitions(f, body)?;
    write!(f, "{close}")
}

impl Display for Production {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = ", self.name)?;
        write_definitions(f, &self.body)?;
        write!(f, ";")
    }
}

#[cfg(test)]
mod test {
    use super::{Expr, ExprKind, Production};

    #[test]
    fn canonical_display() {
        let src = "Signed Number = [ Sign ] , Whole Number | \"x\" , { Digit | \"_\" } , ( \"a\" , \"b\" ) ;";
        let parse = Production::new(src).unwrap_or_else(|e| panic!("{e}"));
        insta::assert_snapshot!(parse, @r#"SignedNumber = [Sign], WholeNumber | "x", {Digit | "_"}, ("a", "b");"#);
    }

    #[test]
    fn display_reparses_to_same_shape() {
        let src = r#"Quote = "\"", { Char | "\\" }, "\"";"#;
        let first = Production::new(src).unwrap();
        let second = Production::new(&first.to_string()).unwrap();
        assert_eq!(first.name, second.name);
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn nonterminals_order() {
        let parse = Production::new("X = [A, B], C;").unwrap();
        insta::assert_compact_debug_snapshot!(parse.nonterminals(), @r#"["C", "A", "B"]"#);
    }

    #[test]
    fn group_accessor() {
        let parse = Production::new("X = { \"a\" | B };").unwrap();
        let atom = &parse.body[0][0];
        assert_eq!(ExprKind::from(atom), ExprKind::Repetition);
        let (_, body) = atom.group().unwrap();
        assert_eq!(body.len(), 2);
        assert!(matches!(&body[1][0], Expr::Nonterminal { name, .. } if name == "B"));
    }

    #[test]
    fn span_check() {
        let src = "message = hello;";
        let parse = Production::new(src).unwrap();
        let s = parse.body[0][0].span();
        assert_eq!(&src[s.range()], "hello");
        assert_eq!(&src[parse.span.range()], "message = hello");
    }
}
