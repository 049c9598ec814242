use crate::{
    ParseNode,
    rule::{Alternative, Atom, AtomKind, Rule},
};
use display_tree::{AsTree, DisplayTree, Style};
use std::{
    fmt::{Formatter, Write},
    iter::once,
};

const EMPTY_STRING: &str = "";

impl DisplayTree for ParseNode<'_> {
    fn fmt(&self, f: &mut Formatter, style: Style) -> std::fmt::Result {
        let header = format!("{} {:?}", self.rule, self.value);
        writeln!(f, "{}", style.leaf_style.apply(&header))?;
        print_vec_tree(f, style, &self.children)
    }
}

impl DisplayTree for Atom {
    fn fmt(&self, f: &mut Formatter, style: Style) -> std::fmt::Result {
        let indentation = style.indentation as usize - 1;
        let horizontal_bar = format!("{:indentation$}", style.char_set.horizontal);

        let kind: &str = AtomKind::from(self).into();
        writeln!(f, "{}", style.leaf_style.apply(kind))?;
        write!(
            f,
            "{}",
            style.branch_style.apply(&format!(
                "{}{horizontal_bar} {self}",
                style.char_set.end_connector
            ))
        )
    }
}

impl DisplayTree for Alternative {
    fn fmt(&self, f: &mut Formatter, style: Style) -> std::fmt::Result {
        writeln!(f, "{}", style.leaf_style.apply("Alternative"))?;
        print_vec_tree(f, style, self.atoms())
    }
}

impl DisplayTree for Rule {
    fn fmt(&self, f: &mut Formatter, style: Style) -> std::fmt::Result {
        let indentation = style.indentation as usize - 1;
        let horizontal_bar = format!("{:indentation$}", style.char_set.horizontal);
        writeln!(f, "{}", style.leaf_style.apply("Rule"))?;
        writeln!(
            f,
            "{1}{horizontal_bar}name: {0}",
            self.name(),
            style.char_set.connector
        )?;

        print_vec_tree(f, style, self.alternatives())
    }
}

/// Writes `body` as the numbered children of whatever was written last.
/// Writes nothing for an empty slice.
pub(crate) fn print_vec_tree<T: DisplayTree>(
    f: &mut impl Write,
    style: Style,
    body: &[T],
) -> Result<(), std::fmt::Error> {
    if body.is_empty() {
        return Ok(());
    }
    let indentation = style.indentation as usize - 1;
    let spacer = format!(" {EMPTY_STRING:indentation$}");
    let horizontal_bar = format!("{:indentation$}", style.char_set.horizontal);
    let vec_output = fmt_vec(body, style);

    for (block_no, block) in vec_output.into_iter().enumerate() {
        for (n, line) in block.lines().enumerate() {
            if n == 0 && block_no == 0 {
                write!(f, "{}{horizontal_bar}", style.char_set.end_connector,)?;
            } else {
                write!(f, "{spacer}")?;
            }
            writeln!(f, "{line}")?;
        }
    }
    Ok(())
}

fn fmt_vec<T: DisplayTree>(v: &[T], style: Style) -> impl Iterator<Item = String> + '_ {
    let max_index = v.len().saturating_sub(1);
    let num_width = format!("{max_index}",).len();

    let vertical = style
        .branch_style
        .apply(&style.char_set.vertical.to_string());

    v.iter().enumerate().map(move |(n, item)| {
        let vertical = vertical.clone();
        let continued_vertical: &str = if n < max_index { &vertical } else { " " };

        let indent = format!(" {:num_width$}", "");
        let tree = AsTree::with_style(item, style).to_string();
        let mut tree_lines = tree.lines().enumerate().map(move |(line_num, line)| {
            let line = style.leaf_style.apply(line);
            if line_num > 0 {
                format!("{continued_vertical}{indent}{line}\n")
            } else {
                format!("{line}\n")
            }
        });
        let lead_line = tree_lines.next().unwrap_or_default();

        let lead = format!("{n:<0num_width$}: {lead_line}");

        once(lead).chain(tree_lines).collect()
    })
}

#[cfg(test)]
mod test {
    use display_tree::AsTree;

    use crate::{Grammar, ParseNode};

    #[test]
    fn rule_tree() {
        let g = Grammar::new(r#"Sign = "+" | "-";"#).unwrap();
        let rule = g.get("Sign").unwrap();

        insta::assert_snapshot!(AsTree::new(rule), @r#"
        Rule
        ├─name: Sign
        └─0: Alternative
          │  └─0: Terminal
          │       └─ "+"
          1: Alternative
             └─0: Terminal
                  └─ "-"
        "#);
    }

    #[test]
    fn sub_rule_atoms_show_their_brackets() {
        let g = Grammar::new(r#"Number = [Sign], Digit, {Digit}; Sign = "-"; Digit = "1";"#).unwrap();
        let rule = g.get("Number").unwrap();

        insta::assert_snapshot!(AsTree::new(rule), @r"
        Rule
        ├─name: Number
        └─0: Alternative
             └─0: Optional
               │  └─ [NumberSubDef1]
               1: NonTerminal
               │  └─ Digit
               2: Repetition
                  └─ {NumberSubDef2}
        ");
    }

    #[test]
    fn parse_tree() {
        let g = Grammar::new(
            r#"SignedNumber = [Sign], WholeNumber;
               WholeNumber = Digit, {Digit};
               Digit = "0" | "1";
               Sign = "+" | "-";"#,
        )
        .unwrap();
        let m = g.match_input("SignedNumber", "-10").unwrap();

        insta::assert_snapshot!(AsTree::new(&m.tree), @r#"
        SignedNumber "-10"
        └─0: Sign "-"
          1: WholeNumber "10"
             └─0: Digit "1"
               1: Digit "0"
        "#);
    }

    #[test]
    fn long_list_test() {
        let values: Vec<_> = (0..12).map(|n| n.to_string()).collect();
        let children = values
            .iter()
            .map(|v| ParseNode::new("Item", v, vec![]))
            .collect();
        let root = ParseNode::new("List", "", children);

        insta::assert_snapshot!(AsTree::new(&root), @r#"
        List ""
        └─00: Item "0"
          01: Item "1"
          02: Item "2"
          03: Item "3"
          04: Item "4"
          05: Item "5"
          06: Item "6"
          07: Item "7"
          08: Item "8"
          09: Item "9"
          10: Item "10"
          11: Item "11"
        "#);
    }
}
