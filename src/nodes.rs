use std::fmt::Display;

/// One successful rule application.
///
/// Bracket groups never show up as nodes of their own: whatever the rule
/// behind a group matched is spliced straight into the node of the rule the
/// group was written in. Terminals contribute to `value` but not to `children`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNode<'a> {
    /// Name of the rule that produced this node
    pub rule: &'a str,
    /// The part of the input this application consumed
    pub value: &'a str,
    pub children: Vec<ParseNode<'a>>,
}

impl<'a> ParseNode<'a> {
    pub(crate) fn new(rule: &'a str, value: &'a str, children: Vec<ParseNode<'a>>) -> Self {
        ParseNode {
            rule,
            value,
            children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Pre-order walk over this node and all of its descendants.
    pub fn iter(&self) -> impl Iterator<Item = &ParseNode<'a>> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// First node produced by `rule`, in pre-order.
    pub fn find(&self, rule: &str) -> Option<&ParseNode<'a>> {
        self.iter().find(|n| n.rule == rule)
    }
}

/// Compact form: `Rule("value")` with children in brackets.
impl Display for ParseNode<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({:?})", self.rule, self.value)?;
        if !self.children.is_empty() {
            write!(f, "[")?;
            for (ind, child) in self.children.iter().enumerate() {
                if ind > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{child}")?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}
