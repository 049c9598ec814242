use std::{sync::Arc, thread};

use ebnf_compiler::{EbnfError, Grammar, compile};

static SRC: &str = r#"
(* Integer arithmetic with the usual precedence *)
Expression = Term, {AddOp, Term};
Term       = Factor, {MulOp, Factor};
Factor     = Number | "(", Expression, ")";
AddOp      = "+" | "-";
MulOp      = "*" | "/";
Number     = Digit, {Digit};
Digit      = "0" | "1" | "2" | "3" | "4" | "5" | "6" | "7" | "8" | "9";
"#;

fn grammar() -> Grammar {
    compile(SRC).unwrap_or_else(|e| panic!("{e}"))
}

#[test]
fn arithmetic_grammar() {
    let g = grammar();
    insta::assert_compact_debug_snapshot!(g.rule_identifiers(), @r#"["Expression", "ExpressionSubDef1", "Term", "TermSubDef1", "Factor", "AddOp", "MulOp", "Number", "NumberSubDef1", "Digit"]"#);
    insta::assert_snapshot!(g, @r#"
    Expression = Term, {ExpressionSubDef1};
    ExpressionSubDef1 = AddOp, Term;
    Term = Factor, {TermSubDef1};
    TermSubDef1 = MulOp, Factor;
    Factor = Number | "(", Expression, ")";
    AddOp = "+" | "-";
    MulOp = "*" | "/";
    Number = Digit, {NumberSubDef1};
    NumberSubDef1 = Digit;
    Digit = "0" | "1" | "2" | "3" | "4" | "5" | "6" | "7" | "8" | "9";
    "#);
}

#[test]
fn precedence_shows_in_the_tree() {
    let g = grammar();
    let m = g.match_input("Expression", "1+2*3").unwrap();
    assert!(m.is_complete());
    insta::assert_snapshot!(m.tree, @r#"Expression("1+2*3")[Term("1")[Factor("1")[Number("1")[Digit("1")]]], AddOp("+"), Term("2*3")[Factor("2")[Number("2")[Digit("2")]], MulOp("*"), Factor("3")[Number("3")[Digit("3")]]]]"#);
}

#[test]
fn parentheses_nest_expressions() {
    let g = grammar();
    let m = g.match_input("Expression", "(12-3)/4").unwrap();
    assert!(m.is_complete());

    let inner = m.tree.find("Factor").and_then(|f| f.find("Expression")).unwrap();
    assert_eq!(inner.value, "12-3");

    let numbers: Vec<_> = m
        .tree
        .iter()
        .filter(|n| n.rule == "Number")
        .map(|n| n.value)
        .collect();
    assert_eq!(numbers, ["12", "3", "4"]);

    // Every node type belongs to a declared rule
    assert!(m.tree.iter().all(|n| g.owner_of(n.rule) == Some(n.rule)));
}

#[test]
fn prefix_matches_leave_a_remainder() {
    let g = grammar();

    let m = g.match_input("Expression", "2*").unwrap();
    assert!(m.success);
    assert_eq!(m.tree.value, "2");
    assert_eq!(m.remainder, "*");

    let m = g.match_input("Expression", "(1+2").unwrap();
    assert!(!m.success);
    assert_eq!(m.remainder, "(1+2");

    let m = g.match_input("Expression", " 1").unwrap();
    assert!(!m.success);
}

#[test]
fn left_recursion_is_reported_not_overflowed() {
    let g = compile(r#"Sum = Sum, "+", Num | Num; Num = "1";"#).unwrap();
    let err = g.match_input("Sum", "1+1").unwrap_err();
    assert_eq!(
        err,
        EbnfError::RecursionLimitExceeded {
            rule: "Sum".into(),
            limit: ebnf_compiler::DEFAULT_DEPTH_LIMIT
        }
    );
}

#[test]
fn deeply_nested_parentheses_hit_the_limit() {
    let g = grammar();
    let input = format!("{}1{}", "(".repeat(300), ")".repeat(300));
    let err = g.match_input("Expression", &input).unwrap_err();
    assert!(matches!(err, EbnfError::RecursionLimitExceeded { .. }), "{err}");

    let input = format!("{}1{}", "(".repeat(10), ")".repeat(10));
    assert!(g.match_input("Expression", &input).unwrap().is_complete());
}

#[test]
fn shared_between_threads() {
    let g = Arc::new(grammar());
    let handles: Vec<_> = ["1", "2+2", "(3)*(4-1)", "x"]
        .into_iter()
        .map(|input| {
            let g = Arc::clone(&g);
            thread::spawn(move || g.match_input("Expression", input).unwrap().is_complete())
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results, [true, true, true, false]);
}
