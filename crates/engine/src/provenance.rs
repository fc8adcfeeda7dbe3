//! Explanation trees attached to every computed value.
//!
//! An [`EvaluatedValue`] is the root of an immutable tree built bottom-up
//! during evaluation. Inner nodes are the results of child rules, leaves
//! are facts. Child values are stored rendered (via `Debug`) because a
//! rule graph mixes value types; the root keeps its typed value.

use std::fmt;

use crate::rule::{RuleKind, RuleMeta, RuleReference};

/// A fact leaf in the provenance tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactNode {
    pub value: String,
    pub source: String,
    pub description: String,
}

/// The result of one child rule, with its own provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleNode {
    pub rule: RuleMeta,
    pub kind: RuleKind,
    pub value: String,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Fact(FactNode),
    Rule(RuleNode),
}

impl Node {
    /// Number of rule levels on the longest path below and including
    /// this node. Facts count as zero.
    pub fn depth(&self) -> usize {
        match self {
            Node::Fact(_) => 0,
            Node::Rule(rule) => 1 + max_depth(&rule.children),
        }
    }

    fn collect_facts<'a>(&'a self, out: &mut Vec<&'a FactNode>) {
        match self {
            Node::Fact(fact) => out.push(fact),
            Node::Rule(rule) => rule.children.iter().for_each(|c| c.collect_facts(out)),
        }
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a RuleReference>) {
        if let Node::Rule(rule) = self {
            out.push(&rule.rule.reference);
            rule.children
                .iter()
                .for_each(|c| c.collect_references(out));
        }
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        match self {
            Node::Fact(fact) => writeln!(
                f,
                "{:indent$}fact {} ({}) from {}",
                "",
                fact.value,
                fact.description,
                fact.source,
                indent = indent
            ),
            Node::Rule(rule) => {
                write_rule_line(f, indent, &rule.value, rule.kind, &rule.rule)?;
                rule.children
                    .iter()
                    .try_for_each(|c| c.write_tree(f, indent + 2))
            }
        }
    }
}

/// A rule's output value with the rule that produced it and the
/// provenance of every input it used.
///
/// Never empty: each evaluated value has at least one child node.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedValue<T> {
    pub value: T,
    pub rule: RuleMeta,
    pub kind: RuleKind,
    pub children: Vec<Node>,
}

impl<T> EvaluatedValue<T> {
    pub(crate) fn new(value: T, rule: RuleMeta, kind: RuleKind, children: Vec<Node>) -> Self {
        debug_assert!(
            !children.is_empty(),
            "rule {} produced a value without provenance",
            rule.reference
        );
        EvaluatedValue {
            value,
            rule,
            kind,
            children,
        }
    }

    pub fn depth(&self) -> usize {
        1 + max_depth(&self.children)
    }

    /// All fact leaves, depth-first, left to right.
    pub fn facts(&self) -> Vec<&FactNode> {
        let mut out = Vec::new();
        self.children.iter().for_each(|c| c.collect_facts(&mut out));
        out
    }

    /// The reference of this rule and every rule below it, depth-first.
    /// A rule used in several places appears once per use.
    pub fn rule_references(&self) -> Vec<&RuleReference> {
        let mut out = vec![&self.rule.reference];
        self.children
            .iter()
            .for_each(|c| c.collect_references(&mut out));
        out
    }
}

impl<T: fmt::Debug> EvaluatedValue<T> {
    pub fn to_node(&self) -> Node {
        Node::Rule(RuleNode {
            rule: self.rule.clone(),
            kind: self.kind,
            value: format!("{:?}", self.value),
            children: self.children.clone(),
        })
    }

    pub fn into_node(self) -> Node {
        Node::Rule(RuleNode {
            value: format!("{:?}", self.value),
            rule: self.rule,
            kind: self.kind,
            children: self.children,
        })
    }
}

/// Renders the tree one node per line, children indented two spaces.
impl<T: fmt::Debug> fmt::Display for EvaluatedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_rule_line(f, 0, &format!("{:?}", self.value), self.kind, &self.rule)?;
        self.children.iter().try_for_each(|c| c.write_tree(f, 2))
    }
}

fn write_rule_line(
    f: &mut fmt::Formatter<'_>,
    indent: usize,
    value: &str,
    kind: RuleKind,
    rule: &RuleMeta,
) -> fmt::Result {
    writeln!(
        f,
        "{:indent$}{} = {} [{} {}, valid from {}]",
        "",
        rule.description,
        value,
        kind,
        rule.reference,
        rule.valid_from,
        indent = indent
    )
}

fn max_depth(children: &[Node]) -> usize {
    children.iter().map(Node::depth).max().unwrap_or(0)
}
