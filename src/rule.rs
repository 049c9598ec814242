use std::{collections::HashMap, fmt::Display};

use strum::{EnumDiscriminants, EnumProperty, IntoStaticStr};

use crate::{
    EbnfError, Span,
    lexing::StatementSplitter,
    matcher::{MatchResult, Matcher},
    parser::parse_statement,
    sanitizer::{escape, sanitize},
    synthesis::GrammarBuilder,
};

/// The bracket that introduced a synthesized rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumProperty, IntoStaticStr)]
pub enum GroupKind {
    /// `[ ... ]`, zero or one time
    #[strum(props(open = "[", close = "]"))]
    Optional,
    /// `{ ... }`, zero or more times
    #[strum(props(open = "{", close = "}"))]
    Repetition,
    /// `( ... )`, exactly once
    #[strum(props(open = "(", close = ")"))]
    Group,
}

impl GroupKind {
    pub fn brackets(self) -> (&'static str, &'static str) {
        (
            self.get_str("open").unwrap_or_default(),
            self.get_str("close").unwrap_or_default(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, EnumDiscriminants)]
#[strum_discriminants(name(AtomKind), derive(IntoStaticStr))]
pub enum Atom {
    Terminal(String),
    NonTerminal(String),
    /// Holds the name of the synthesized rule for the group
    Optional(String),
    Repetition(String),
    Group(String),
}

impl Atom {
    pub fn kind(&self) -> AtomKind {
        AtomKind::from(self)
    }

    /// The synthesized rule behind a bracket group atom.
    pub fn sub_rule(&self) -> Option<&str> {
        match self {
            Atom::Optional(name) | Atom::Repetition(name) | Atom::Group(name) => Some(name),
            Atom::Terminal(_) | Atom::NonTerminal(_) => None,
        }
    }
}

impl Display for Atom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Atom::Terminal(text) => write!(f, "\"{}\"", escape(text)),
            Atom::NonTerminal(name) => write!(f, "{name}"),
            Atom::Optional(name) => write!(f, "[{name}]"),
            Atom::Repetition(name) => write!(f, "{{{name}}}"),
            Atom::Group(name) => write!(f, "({name})"),
        }
    }
}

/// A non-empty sequence of atoms that must all match, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternative {
    pub(crate) atoms: Vec<Atom>,
}

impl Alternative {
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }
}

impl Display for Alternative {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (ind, atom) in self.atoms.iter().enumerate() {
            if ind > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{atom}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Written as a statement of its own
    Declared,
    /// Lifted out of a bracket group inside the rule `owner`
    Synthesized { owner: String, group: GroupKind },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub(crate) name: String,
    pub(crate) alternatives: Vec<Alternative>,
    pub(crate) origin: Origin,
    pub(crate) span: Span,
}

impl Rule {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alternatives(&self) -> &[Alternative] {
        &self.alternatives
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// The statement (or bracket group, for synthesized rules) this rule came from.
    pub fn span(&self) -> Span {
        self.span
    }

    pub fn is_synthesized(&self) -> bool {
        matches!(self.origin, Origin::Synthesized { .. })
    }

    /// The declared rule this one belongs to; itself if it is declared.
    pub fn owner(&self) -> &str {
        match &self.origin {
            Origin::Declared => &self.name,
            Origin::Synthesized { owner, .. } => owner,
        }
    }

    /// Names of other rules this rule refers to directly, in order of appearance.
    pub fn nonterminals(&self) -> Vec<&str> {
        self.alternatives
            .iter()
            .flat_map(|a| &a.atoms)
            .filter_map(|atom| match atom {
                Atom::NonTerminal(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = ", self.name)?;
        for (ind, alternative) in self.alternatives.iter().enumerate() {
            if ind > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{alternative}")?;
        }
        write!(f, ";")
    }
}

/// A compiled grammar: every declared and synthesized rule, addressable by
/// name. Immutable once built, so it can be shared between threads and
/// matched against concurrently.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Grammar {
    pub(crate) rules: HashMap<String, Rule>,
    pub(crate) order: Vec<String>,
}

impl Grammar {
    /// Compiles grammar text. Nothing is returned unless every statement
    /// parses and every reference resolves.
    pub fn new(input: &str) -> Result<Grammar, EbnfError> {
        let mut builder = GrammarBuilder::new();

        for statement in StatementSplitter::new(input) {
            let statement = sanitize(&statement?);
            let production = parse_statement(&statement)?;
            builder.add_production(production, &statement)?;
        }

        let grammar = builder.finish()?;
        tracing::debug!(
            declared = grammar.declared_rules().count(),
            total = grammar.len(),
            "compiled grammar"
        );
        Ok(grammar)
    }

    /// Every rule name, declared and synthesized, in declaration order.
    /// Synthesized rules follow the rule that owns them.
    pub fn rule_identifiers(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All rules in declaration order.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.order.iter().filter_map(|name| self.rules.get(name))
    }

    pub fn declared_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules().filter(|r| !r.is_synthesized())
    }

    /// The declared rule a rule belongs to, for grouping node types.
    pub fn owner_of(&self, name: &str) -> Option<&str> {
        self.get(name).map(Rule::owner)
    }

    pub fn matcher(&self) -> Matcher<'_> {
        Matcher::new(self)
    }

    /// Matches a prefix of `input` against `rule` with the default depth limit.
    pub fn match_input<'a>(
        &'a self,
        rule: &str,
        input: &'a str,
    ) -> Result<MatchResult<'a>, EbnfError> {
        self.matcher().run(rule, input)
    }
}

impl Display for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for rule in self.rules() {
            writeln!(f, "{rule}")?;
        }
        Ok(())
    }
}
