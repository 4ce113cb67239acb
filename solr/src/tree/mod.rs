//! Intermediate tree between the expression and the Solr query.
//!
//! Leaves wrap one or more matches of a single argument together with the instruction how to render them.
//! Inner nodes are combinations, or node-type groups whose members are rendered inside one join.

mod grouping;
mod helper;
mod wrapper;

pub use grouping::NodeTypeGrouper;
pub use helper::MatchTreeHelper;
pub use wrapper::{BetweenMatchWrapper, MatchInstruction, MatchWrapperType, MultiMatchWrapper, SingleMatchWrapper};

use audlang::CombiType;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchTreeElement {
    Single(SingleMatchWrapper),
    Multi(MultiMatchWrapper),
    Between(BetweenMatchWrapper),
    Combined(CombinedMatchTreeElement),
    Group(NodeTypeMatchTreeElementGroup),
}

impl MatchTreeElement {
    pub fn is_leaf(&self) -> bool { matches!(self, MatchTreeElement::Single(_) | MatchTreeElement::Multi(_) | MatchTreeElement::Between(_)) }

    /// The node type of all matches below this element, if there is exactly one
    pub fn common_node_type(&self) -> Option<&str> {
        match self {
            MatchTreeElement::Single(w) => Some(w.node_type()),
            MatchTreeElement::Multi(w) => Some(w.node_type()),
            MatchTreeElement::Between(w) => Some(w.node_type()),
            MatchTreeElement::Combined(c) => c.common_node_type(),
            MatchTreeElement::Group(g) => Some(g.node_type()),
        }
    }

    pub fn contains_any_negation(&self) -> bool {
        match self {
            MatchTreeElement::Single(w) => w.is_effectively_negated(),
            MatchTreeElement::Multi(w) => w.instruction().is_negation(),
            MatchTreeElement::Between(w) => w.instruction().is_negation(),
            MatchTreeElement::Combined(c) => c.contains_any_negation(),
            MatchTreeElement::Group(g) => g.children().iter().any(MatchTreeElement::contains_any_negation),
        }
    }

    /// Instruction of a leaf
    pub fn instruction(&self) -> Option<MatchInstruction> {
        match self {
            MatchTreeElement::Single(w) => Some(w.instruction()),
            MatchTreeElement::Multi(w) => Some(w.instruction()),
            MatchTreeElement::Between(w) => Some(w.instruction()),
            _ => None,
        }
    }

    /// Argument of a leaf
    pub fn arg_name(&self) -> Option<&str> {
        match self {
            MatchTreeElement::Single(w) => Some(w.arg_name()),
            MatchTreeElement::Multi(w) => Some(w.arg_name()),
            MatchTreeElement::Between(w) => Some(w.arg_name()),
            _ => None,
        }
    }

    /// Whether a leaf may share a join with other conditions on its node type
    pub fn is_grouping_eligible(&self) -> bool {
        match self {
            MatchTreeElement::Single(w) => w.is_grouping_eligible(),
            MatchTreeElement::Multi(w) => w.is_grouping_eligible(),
            MatchTreeElement::Between(w) => w.is_grouping_eligible(),
            MatchTreeElement::Combined(_) => false,
            MatchTreeElement::Group(_) => true,
        }
    }

    /// All argument names below this element, including referenced ones, in order of first appearance
    pub fn arg_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_arg_names(&mut names);
        names
    }

    fn collect_arg_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        let leaf_names: Vec<&'a str> = match self {
            MatchTreeElement::Single(w) => w.match_expr().arg_names(),
            MatchTreeElement::Multi(w) => std::iter::once(w.arg_name()).chain(w.referenced_arg_name()).collect(),
            MatchTreeElement::Between(w) => vec![w.arg_name()],
            MatchTreeElement::Combined(c) => return c.children().iter().for_each(|child| child.collect_arg_names(names)),
            MatchTreeElement::Group(g) => return g.children().iter().for_each(|child| child.collect_arg_names(names)),
        };
        for name in leaf_names {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedMatchTreeElement {
    combi_type: CombiType,
    children: Vec<MatchTreeElement>,
    common_node_type: Option<String>,
    contains_any_negation: bool,
}

impl CombinedMatchTreeElement {
    /// # Panics
    /// With less than two children.
    pub fn new(combi_type: CombiType, children: Vec<MatchTreeElement>) -> Self {
        assert!(children.len() >= 2, "combined element needs at least two children");
        let first = children[0].common_node_type();
        let common_node_type = match first {
            Some(nt) if children.iter().all(|c| c.common_node_type() == Some(nt)) => Some(nt.to_string()),
            _ => None,
        };
        let contains_any_negation = children.iter().any(MatchTreeElement::contains_any_negation);
        Self { combi_type, children, common_node_type, contains_any_negation }
    }

    pub fn combi_type(&self) -> CombiType { self.combi_type }

    pub fn children(&self) -> &[MatchTreeElement] { &self.children }

    pub fn into_children(self) -> Vec<MatchTreeElement> { self.children }

    pub fn common_node_type(&self) -> Option<&str> { self.common_node_type.as_deref() }

    pub fn contains_any_negation(&self) -> bool { self.contains_any_negation }
}

/// Members of one node type that are rendered inside the same join
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTypeMatchTreeElementGroup {
    combi_type: CombiType,
    node_type: String,
    children: Vec<MatchTreeElement>,
}

impl NodeTypeMatchTreeElementGroup {
    /// # Panics
    /// With less than two children or a child of another node type.
    pub fn new(combi_type: CombiType, node_type: impl Into<String>, children: Vec<MatchTreeElement>) -> Self {
        let node_type = node_type.into();
        assert!(children.len() >= 2, "node type group needs at least two children");
        assert!(
            children.iter().all(|c| c.common_node_type() == Some(node_type.as_str())),
            "all members of a group must be of node type {node_type}"
        );
        Self { combi_type, node_type, children }
    }

    pub fn combi_type(&self) -> CombiType { self.combi_type }

    pub fn node_type(&self) -> &str { &self.node_type }

    pub fn children(&self) -> &[MatchTreeElement] { &self.children }
}

fn instruction_prefix(instruction: MatchInstruction) -> &'static str {
    match instruction {
        MatchInstruction::Default => "",
        MatchInstruction::Negate => "NOT ",
        MatchInstruction::NegateVerifyLeftHasAnyValue => "NOT(L) ",
        MatchInstruction::NegateVerifyRightHasAnyValue => "NOT(R) ",
        MatchInstruction::NegateVerifyBothHaveAnyValue => "NOT(LR) ",
    }
}

fn write_children(f: &mut fmt::Formatter<'_>, combi_type: CombiType, children: &[MatchTreeElement]) -> fmt::Result {
    f.write_str("(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", combi_type.keyword())?;
        }
        write!(f, "{child}")?;
    }
    f.write_str(")")
}

fn write_members<'a>(f: &mut fmt::Formatter<'_>, members: impl Iterator<Item = &'a audlang::MatchExpression>) -> fmt::Result {
    f.write_str("[")?;
    for (i, member) in members.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{member}")?;
    }
    f.write_str("]")
}

impl fmt::Display for MatchTreeElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchTreeElement::Single(w) => write!(f, "{}{}", instruction_prefix(w.instruction()), w.match_expr()),
            MatchTreeElement::Multi(w) => {
                f.write_str(instruction_prefix(w.instruction()))?;
                write_members(f, w.members().iter())
            }
            MatchTreeElement::Between(w) => {
                f.write_str(instruction_prefix(w.instruction()))?;
                write_members(f, w.members().into_iter())
            }
            MatchTreeElement::Combined(c) => write_children(f, c.combi_type(), c.children()),
            MatchTreeElement::Group(g) => {
                write!(f, "{}:", g.node_type())?;
                write_children(f, g.combi_type(), g.children())
            }
        }
    }
}
