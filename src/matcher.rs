use crate::{
    EbnfError,
    nodes::ParseNode,
    rule::{Atom, Grammar},
};

/// How many rule applications may be nested below the one a match starts at.
///
/// Sized so an unoptimised build stays within a 2 MiB thread stack, the
/// default for spawned threads and the test harness. Raise it only for
/// threads with a larger stack.
pub const DEFAULT_DEPTH_LIMIT: usize = 256;

/// Outcome of matching a rule against a prefix of the input. A failed match
/// is an ordinary result: `remainder` is the whole input and the tree is an
/// empty node for the rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult<'a> {
    pub success: bool,
    pub remainder: &'a str,
    pub tree: ParseNode<'a>,
}

impl<'a> MatchResult<'a> {
    fn failure(rule: &'a str, input: &'a str) -> Self {
        MatchResult {
            success: false,
            remainder: input,
            tree: ParseNode::new(rule, "", Vec::new()),
        }
    }

    /// Matched and consumed the whole input.
    pub fn is_complete(&self) -> bool {
        self.success && self.remainder.is_empty()
    }
}

/// Recursive-descent matcher over a compiled [`Grammar`].
///
/// Alternatives are tried in order and the first to succeed wins. There is
/// no memoisation; instead every nested rule application counts against a
/// depth limit, so a grammar that recurses without consuming input fails
/// with [`EbnfError::RecursionLimitExceeded`] instead of exhausting the stack.
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'g> {
    grammar: &'g Grammar,
    depth_limit: usize,
}

impl<'g> Matcher<'g> {
    pub fn new(grammar: &'g Grammar) -> Matcher<'g> {
        Matcher {
            grammar,
            depth_limit: DEFAULT_DEPTH_LIMIT,
        }
    }

    #[must_use]
    pub fn with_depth_limit(self, depth_limit: usize) -> Matcher<'g> {
        Matcher {
            depth_limit,
            ..self
        }
    }

    pub fn depth_limit(&self) -> usize {
        self.depth_limit
    }

    /// Matches a prefix of `input` against `rule`.
    pub fn run<'a>(&self, rule: &str, input: &'a str) -> Result<MatchResult<'a>, EbnfError>
    where
        'g: 'a,
    {
        self.apply(rule, input, 0)
    }

    fn apply<'a>(
        &self,
        rule: &str,
        input: &'a str,
        depth: usize,
    ) -> Result<MatchResult<'a>, EbnfError>
    where
        'g: 'a,
    {
        let grammar: &'g Grammar = self.grammar;
        let Some(rule) = grammar.get(rule) else {
            return Err(EbnfError::UnknownRule(rule.to_owned()));
        };
        let name: &'a str = rule.name();

        if depth > self.depth_limit {
            tracing::debug!(rule = name, limit = self.depth_limit, "recursion limit exceeded");
            return Err(EbnfError::RecursionLimitExceeded {
                rule: name.to_owned(),
                limit: self.depth_limit,
            });
        }
        tracing::trace!(rule = name, depth, "applying rule");

        'alternatives: for alternative in rule.alternatives() {
            let mut remainder = input;
            let mut children = Vec::new();

            for atom in alternative.atoms() {
                match atom {
                    Atom::Terminal(literal) => match remainder.strip_prefix(literal.as_str()) {
                        Some(rest) => remainder = rest,
                        None => continue 'alternatives,
                    },
                    Atom::NonTerminal(callee) => {
                        let sub = self.apply(callee, remainder, depth + 1)?;
                        if !sub.success {
                            continue 'alternatives;
                        }
                        remainder = sub.remainder;
                        children.push(sub.tree);
                    }
                    Atom::Group(callee) => {
                        let sub = self.apply(callee, remainder, depth + 1)?;
                        if !sub.success {
                            continue 'alternatives;
                        }
                        remainder = sub.remainder;
                        children.extend(sub.tree.children);
                    }
                    Atom::Optional(callee) => {
                        let sub = self.apply(callee, remainder, depth + 1)?;
                        if sub.success {
                            remainder = sub.remainder;
                            children.extend(sub.tree.children);
                        }
                    }
                    Atom::Repetition(callee) => loop {
                        let sub = self.apply(callee, remainder, depth + 1)?;
                        if !sub.success {
                            break;
                        }
                        children.extend(sub.tree.children);
                        // An iteration that consumes nothing would repeat forever
                        if sub.remainder.len() == remainder.len() {
                            break;
                        }
                        remainder = sub.remainder;
                    },
                }
            }

            let value = &input[..input.len() - remainder.len()];
            return Ok(MatchResult {
                success: true,
                remainder,
                tree: ParseNode::new(name, value, children),
            });
        }

        Ok(MatchResult::failure(name, input))
    }
}

/// Matches a prefix of `input` against `rule` with the default depth limit.
pub fn match_input<'a>(
    grammar: &'a Grammar,
    rule: &str,
    input: &'a str,
) -> Result<MatchResult<'a>, EbnfError> {
    Matcher::new(grammar).run(rule, input)
}

#[cfg(test)]
mod test {
    use super::{DEFAULT_DEPTH_LIMIT, match_input};
    use crate::{EbnfError, Grammar, ParseNode};

    fn grammar(src: &str) -> Grammar {
        Grammar::new(src).unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn terminal_is_exact_prefix_and_case_sensitive() {
        let g = grammar(r#"X = "ab";"#);

        let m = match_input(&g, "X", "abc").unwrap();
        assert!(m.success);
        assert_eq!(m.remainder, "c");
        assert_eq!(m.tree.value, "ab");

        let m = match_input(&g, "X", "Abc").unwrap();
        assert!(!m.success);
        assert_eq!(m.remainder, "Abc");
    }

    #[test]
    fn first_alternative_wins() {
        let g = grammar(r#"X = "a" | "ab";"#);
        let m = match_input(&g, "X", "ab").unwrap();
        assert!(m.success);
        assert_eq!(m.remainder, "b");
        assert_eq!(m.tree.value, "a");
    }

    #[test]
    fn failed_alternative_restarts_from_the_same_point() {
        let g = grammar(r#"X = "a", "b", "c" | "a", "b", "d"; "#);
        let m = match_input(&g, "X", "abd!").unwrap();
        assert!(m.success);
        assert_eq!(m.remainder, "!");
        assert_eq!(m.tree.value, "abd");
    }

    #[test]
    fn optional_never_aborts() {
        let g = grammar(r#"X = [Y], "z"; Y = "y";"#);
        let m = match_input(&g, "X", "z").unwrap();
        assert!(m.is_complete());
        assert!(m.tree.is_leaf());

        let m = match_input(&g, "X", "yz").unwrap();
        assert!(m.is_complete());
        insta::assert_snapshot!(m.tree, @r#"X("yz")[Y("y")]"#);
    }

    #[test]
    fn repetition_is_greedy() {
        let g = grammar(
            r#"Digits = Digit, {Digit};
               Digit = "0"|"1"|"2"|"3"|"4"|"5"|"6"|"7"|"8"|"9";"#,
        );
        let m = match_input(&g, "Digits", "123a").unwrap();
        assert!(m.success);
        assert_eq!(m.tree.value, "123");
        assert_eq!(m.remainder, "a");
        assert_eq!(m.tree.children.len(), 3);
    }

    #[test]
    fn repetition_of_empty_match_terminates() {
        let g = grammar(r#"X = {[Y]}, "!"; Y = "y";"#);
        let m = match_input(&g, "X", "yy!").unwrap();
        assert!(m.is_complete());
        assert_eq!(m.tree.children.len(), 2);

        let m = match_input(&g, "X", "!").unwrap();
        assert!(m.is_complete());
    }

    #[test]
    fn empty_iteration_keeps_its_children() {
        let g = grammar(r#"X = {E}, "!"; E = ["a"];"#);
        let m = match_input(&g, "X", "!").unwrap();
        assert!(m.is_complete());
        insta::assert_snapshot!(m.tree, @r#"X("!")[E("")]"#);

        let m = match_input(&g, "X", "aa!").unwrap();
        assert!(m.is_complete());
        insta::assert_snapshot!(m.tree, @r#"X("aa!")[E("a"), E("a"), E("")]"#);
    }

    #[test]
    fn deep_nesting_at_the_default_limit_is_an_error() {
        let g = grammar(r#"List = "x", [List];"#);
        let input = "x".repeat(500);
        let err = match_input(&g, "List", &input).unwrap_err();
        assert_eq!(
            err,
            EbnfError::RecursionLimitExceeded {
                rule: "List".into(),
                limit: DEFAULT_DEPTH_LIMIT
            }
        );

        // Within the limit on the same thread
        let input = "x".repeat(100);
        assert!(match_input(&g, "List", &input).unwrap().is_complete());
    }

    #[test]
    fn group_must_match_once() {
        let g = grammar(r#"X = ("a" | "b"), Y; Y = "y";"#);
        let m = match_input(&g, "X", "by").unwrap();
        assert!(m.is_complete());
        insta::assert_snapshot!(m.tree, @r#"X("by")[Y("y")]"#);

        assert!(!match_input(&g, "X", "y").unwrap().success);
    }

    #[test]
    fn signed_number() {
        let g = grammar(
            r#"SignedNumber = [Sign], WholeNumber;
               WholeNumber = Digit, {Digit};
               Digit = "0"|"1";
               Sign = "+"|"-";"#,
        );
        let m = match_input(&g, "SignedNumber", "-10").unwrap();
        assert!(m.success);
        assert_eq!(m.remainder, "");
        insta::assert_snapshot!(m.tree, @r#"SignedNumber("-10")[Sign("-"), WholeNumber("10")[Digit("1"), Digit("0")]]"#);

        let expected = ParseNode {
            rule: "SignedNumber",
            value: "-10",
            children: vec![
                ParseNode {
                    rule: "Sign",
                    value: "-",
                    children: vec![],
                },
                ParseNode {
                    rule: "WholeNumber",
                    value: "10",
                    children: vec![
                        ParseNode {
                            rule: "Digit",
                            value: "1",
                            children: vec![],
                        },
                        ParseNode {
                            rule: "Digit",
                            value: "0",
                            children: vec![],
                        },
                    ],
                },
            ],
        };
        assert_eq!(m.tree, expected);
    }

    #[test]
    fn failure_resets_remainder_and_tree() {
        let g = grammar(r#"X = "a";"#);
        let m = match_input(&g, "X", "b").unwrap();
        assert!(!m.success);
        assert_eq!(m.remainder, "b");
        assert_eq!(m.tree.rule, "X");
        assert!(m.tree.is_leaf());
    }

    #[test]
    fn partial_children_do_not_leak() {
        let g = grammar(r#"X = A, B | A, C; A = "a"; B = "b"; C = "c";"#);
        let m = match_input(&g, "X", "ac").unwrap();
        insta::assert_snapshot!(m.tree, @r#"X("ac")[A("a"), C("c")]"#);

        let m = match_input(&g, "X", "ad").unwrap();
        assert!(!m.success);
        assert!(m.tree.is_leaf());
    }

    #[test]
    fn unknown_rule_is_an_error() {
        let g = grammar(r#"X = "a";"#);
        let err = match_input(&g, "Y", "a").unwrap_err();
        assert_eq!(err, EbnfError::UnknownRule("Y".into()));
    }

    #[test]
    fn left_recursion_hits_the_limit() {
        let g = grammar(r#"X = X, "a" | "a";"#);
        let err = g.matcher().with_depth_limit(32).run("X", "aaa").unwrap_err();
        assert_eq!(
            err,
            EbnfError::RecursionLimitExceeded {
                rule: "X".into(),
                limit: 32
            }
        );
    }

    #[test]
    fn depth_limit_counts_nested_applications() {
        let g = grammar(r#"List = "x", [List];"#);
        let input = "x".repeat(10);

        // Two levels per element, plus the failed attempt at an eleventh
        let m = g.matcher().with_depth_limit(20).run("List", &input).unwrap();
        assert!(m.is_complete());
        assert!(g.matcher().with_depth_limit(19).run("List", &input).is_err());
        assert_eq!(g.matcher().depth_limit(), DEFAULT_DEPTH_LIMIT);
    }

    #[test]
    fn matching_is_deterministic() {
        let g = grammar(r#"X = {"a" | "b"}, ["c"];"#);
        let first = match_input(&g, "X", "abbac").unwrap();
        let second = match_input(&g, "X", "abbac").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn grammar_is_shared_between_threads() {
        let g = grammar(r#"Word = Letter, {Letter}; Letter = "a" | "b";"#);
        let g = &g;
        let inputs = ["ab", "ba!", "bbb", "c"];
        let results: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = inputs
                .into_iter()
                .map(|input| {
                    s.spawn(move || g.match_input("Word", input).map(|m| m.remainder.len()))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(results, [Ok(0), Ok(1), Ok(0), Ok(1)]);
    }
}
