use std::collections::{HashMap, HashSet};

use crate::{
    Span,
    error::{EbnfError, FailureReason},
    expr::{Definitions, Expr, Production},
    rule::{Alternative, Atom, Grammar, GroupKind, Origin, Rule},
    sanitizer::SanitizedStatement,
};

/// A use of a rule name, kept until every statement is in so it can be
/// checked against the finished registry.
#[derive(Debug)]
struct Reference {
    name: String,
    rule: String,
    span: Span,
    statement: String,
}

/// Per-statement state while lowering one production.
struct Scope<'s, 'a> {
    owner: &'s str,
    statement: &'s SanitizedStatement<'a>,
    next_index: usize,
}

/// Mutable registry used only while compiling. Every bracket group is
/// lifted into a rule of its own, so the finished [`Grammar`] holds nothing
/// but flat alternatives of terminals and references.
#[derive(Debug, Default)]
pub(crate) struct GrammarBuilder {
    rules: HashMap<String, Rule>,
    order: Vec<String>,
    taken: HashSet<String>,
    references: Vec<Reference>,
}

impl GrammarBuilder {
    pub(crate) fn new() -> GrammarBuilder {
        GrammarBuilder::default()
    }

    pub(crate) fn add_production(
        &mut self,
        production: Production,
        statement: &SanitizedStatement<'_>,
    ) -> Result<(), EbnfError> {
        let Production { name, span, body } = production;
        self.reserve(&name, statement, span)?;

        let mut scope = Scope {
            owner: &name,
            statement,
            next_index: 1,
        };
        let alternatives = self.lower(&mut scope, body)?;

        tracing::trace!(rule = %name, "registered rule");
        self.rules.insert(
            name.clone(),
            Rule {
                name,
                alternatives,
                origin: Origin::Declared,
                span,
            },
        );
        Ok(())
    }

    /// Claims a name and its slot in declaration order.
    fn reserve(
        &mut self,
        name: &str,
        statement: &SanitizedStatement<'_>,
        span: Span,
    ) -> Result<(), EbnfError> {
        if !self.taken.insert(name.to_owned()) {
            let reason = FailureReason::DuplicateIdentifier(name.to_owned());
            return Err(statement.error(reason, span));
        }
        self.order.push(name.to_owned());
        Ok(())
    }

    fn lower(
        &mut self,
        scope: &mut Scope<'_, '_>,
        body: Definitions,
    ) -> Result<Vec<Alternative>, EbnfError> {
        let mut alternatives = Vec::with_capacity(body.len());
        for exprs in body {
            let mut atoms = Vec::with_capacity(exprs.len());
            for expr in exprs {
                atoms.push(self.lower_atom(scope, expr)?);
            }
            alternatives.push(Alternative { atoms });
        }
        Ok(alternatives)
    }

    fn lower_atom(&mut self, scope: &mut Scope<'_, '_>, expr: Expr) -> Result<Atom, EbnfError> {
        let atom = match expr {
            Expr::Literal { text, .. } => Atom::Terminal(text),
            Expr::Nonterminal { span, name } => {
                self.references.push(Reference {
                    name: name.clone(),
                    rule: scope.owner.to_owned(),
                    span,
                    statement: scope.statement.source().to_owned(),
                });
                Atom::NonTerminal(name)
            }
            Expr::Optional { span, body } => {
                Atom::Optional(self.synthesize(scope, GroupKind::Optional, span, body)?)
            }
            Expr::Repetition { span, body } => {
                Atom::Repetition(self.synthesize(scope, GroupKind::Repetition, span, body)?)
            }
            Expr::Group { span, body } => {
                Atom::Group(self.synthesize(scope, GroupKind::Group, span, body)?)
            }
        };
        Ok(atom)
    }

    /// Names are `<owner>SubDef<k>`, numbered per declared rule in the order
    /// the groups open, so recompiling the same text gives the same names.
    fn synthesize(
        &mut self,
        scope: &mut Scope<'_, '_>,
        group: GroupKind,
        span: Span,
        body: Definitions,
    ) -> Result<String, EbnfError> {
        let name = format!("{}SubDef{}", scope.owner, scope.next_index);
        scope.next_index += 1;
        self.reserve(&name, scope.statement, span)?;

        let alternatives = self.lower(scope, body)?;

        tracing::trace!(rule = %name, owner = scope.owner, ?group, "synthesized sub-rule");
        self.rules.insert(
            name.clone(),
            Rule {
                name: name.clone(),
                alternatives,
                origin: Origin::Synthesized {
                    owner: scope.owner.to_owned(),
                    group,
                },
                span,
            },
        );
        Ok(name)
    }

    /// Checks references and freezes the registry.
    pub(crate) fn finish(self) -> Result<Grammar, EbnfError> {
        if self.order.is_empty() {
            return Err(EbnfError::EmptyInput);
        }

        if let Some(dangling) = self
            .references
            .iter()
            .find(|r| !self.rules.contains_key(&r.name))
        {
            let reason = FailureReason::UnresolvedReference {
                name: dangling.name.clone(),
                rule: dangling.rule.clone(),
            };
            return Err(EbnfError::syntax(reason, &dangling.statement, dangling.span));
        }

        Ok(Grammar {
            rules: self.rules,
            order: self.order,
        })
    }
}
