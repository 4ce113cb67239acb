use super::{CombinedMatchTreeElement, MatchTreeElement, NodeTypeMatchTreeElementGroup};
use crate::context::SolrConversionProcessContext;
use crate::error::ConversionError;
use audlang::CombiType;
use indexmap::IndexMap;

/// Collects members of a combination that can share one join into node type groups.
///
/// Groups keep the position of their first member and the relative order of all members. Under AND,
/// conditions on multi-doc arguments stay separate: each may be satisfied by a different document.
pub struct NodeTypeGrouper<'c, 'a> {
    ctx: &'c SolrConversionProcessContext<'a>,
}

impl<'c, 'a> NodeTypeGrouper<'c, 'a> {
    pub fn new(ctx: &'c SolrConversionProcessContext<'a>) -> Self { Self { ctx } }

    pub fn group(&self, tree: &MatchTreeElement) -> Result<MatchTreeElement, ConversionError> {
        let grouped = self.group_element(tree)?;
        tracing::debug!("grouped match tree: {}", grouped);
        Ok(grouped)
    }

    fn group_element(&self, element: &MatchTreeElement) -> Result<MatchTreeElement, ConversionError> {
        match element {
            MatchTreeElement::Combined(combined) => {
                let children = combined.children().iter().map(|child| self.group_element(child)).collect::<Result<Vec<_>, _>>()?;
                self.group_level(combined.combi_type(), children)
            }
            other => Ok(other.clone()),
        }
    }

    /// Node type of an element that can be placed into a join as a whole
    fn join_node_type(element: &MatchTreeElement) -> Option<&str> {
        match element {
            MatchTreeElement::Group(group) => Some(group.node_type()),
            leaf if leaf.is_leaf() && leaf.is_grouping_eligible() => leaf.common_node_type(),
            _ => None,
        }
    }

    fn involves_multi_doc(&self, element: &MatchTreeElement) -> Result<bool, ConversionError> {
        for arg_name in element.arg_names() {
            if self.ctx.is_multi_doc(arg_name)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn group_level(&self, combi_type: CombiType, children: Vec<MatchTreeElement>) -> Result<MatchTreeElement, ConversionError> {
        let mut by_node_type: IndexMap<&str, Vec<usize>> = IndexMap::new();
        for (index, child) in children.iter().enumerate() {
            let Some(node_type) = Self::join_node_type(child) else {
                continue;
            };
            if combi_type == CombiType::And && self.involves_multi_doc(child)? {
                continue;
            }
            by_node_type.entry(node_type).or_default().push(index);
        }
        let groups: Vec<(String, Vec<usize>)> =
            by_node_type.into_iter().filter(|(_, indices)| indices.len() >= 2).map(|(node_type, indices)| (node_type.to_string(), indices)).collect();
        if groups.is_empty() {
            return Ok(MatchTreeElement::Combined(CombinedMatchTreeElement::new(combi_type, children)));
        }

        let mut slots: Vec<Option<MatchTreeElement>> = children.into_iter().map(Some).collect();
        let mut result = Vec::with_capacity(slots.len());
        for index in 0..slots.len() {
            if let Some((node_type, indices)) = groups.iter().find(|(_, indices)| indices[0] == index) {
                let mut members = Vec::with_capacity(indices.len());
                for member in indices.iter().filter_map(|&i| slots[i].take()) {
                    match member {
                        MatchTreeElement::Group(inner) if inner.combi_type() == combi_type => members.extend(inner.children().iter().cloned()),
                        other => members.push(other),
                    }
                }
                tracing::trace!("grouping {} member(s) of node type {}", members.len(), node_type);
                result.push(MatchTreeElement::Group(NodeTypeMatchTreeElementGroup::new(combi_type, node_type.as_str(), members)));
            } else if let Some(element) = slots[index].take() {
                result.push(element);
            }
        }

        Ok(match result.len() {
            1 => result.remove(0),
            _ => MatchTreeElement::Combined(CombinedMatchTreeElement::new(combi_type, result)),
        })
    }
}
