use super::field::SolrQueryField;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Kinds of conditions a filter query is made of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SolrConditionType {
    /// `*:*`, usually the left side of a complement
    AllDocs,
    /// Restriction on the node type field
    FilterNodeType,
    /// Document filter configured for a node type
    FilterDocument,
    /// Field has any value (`f:*`)
    AnyValue,
    /// Field has one of the given values
    Value,
    /// Wildcard text search
    Contains,
    /// Value range
    Range,
    /// Field-to-field comparison through a function range query
    FuncRange,
    /// Block join from nested documents to their parent
    JoinNested,
    /// Join from dependent documents to the main document
    JoinDependent,
}

/// A single Solr filter query with the fields and condition types it uses.
///
/// Equality and ordering only consider the query string.
#[derive(Debug, Clone, Serialize)]
pub struct SolrFilterQuery {
    query_string: String,
    fields: BTreeSet<SolrQueryField>,
    condition_types: BTreeSet<SolrConditionType>,
}

impl SolrFilterQuery {
    /// # Panics
    /// If the query string is blank or no field is involved.
    pub fn new(
        query_string: impl Into<String>,
        fields: impl IntoIterator<Item = SolrQueryField>,
        condition_types: impl IntoIterator<Item = SolrConditionType>,
    ) -> Self {
        let query_string = query_string.into().trim().to_string();
        let fields: BTreeSet<SolrQueryField> = fields.into_iter().collect();
        let condition_types: BTreeSet<SolrConditionType> = condition_types.into_iter().collect();
        assert!(!query_string.is_empty(), "filter query must not be blank");
        assert!(!fields.is_empty(), "filter query {query_string} must reference at least one field");
        assert!(!condition_types.is_empty(), "filter query {query_string} must have at least one condition type");
        Self { query_string, fields, condition_types }
    }

    pub fn query_string(&self) -> &str { &self.query_string }

    pub fn fields(&self) -> &BTreeSet<SolrQueryField> { &self.fields }

    pub fn condition_types(&self) -> &BTreeSet<SolrConditionType> { &self.condition_types }

    /// The node type of all fields, `None` if the fields span multiple node types
    pub fn node_type(&self) -> Option<&str> {
        let mut node_types = self.fields.iter().map(|f| f.node_type());
        let first = node_types.next()?;
        node_types.all(|nt| nt == first).then_some(first)
    }
}

impl PartialEq for SolrFilterQuery {
    fn eq(&self, other: &Self) -> bool { self.query_string == other.query_string }
}

impl Eq for SolrFilterQuery {}

impl Hash for SolrFilterQuery {
    fn hash<H: Hasher>(&self, state: &mut H) { self.query_string.hash(state) }
}

impl PartialOrd for SolrFilterQuery {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for SolrFilterQuery {
    fn cmp(&self, other: &Self) -> Ordering { self.query_string.cmp(&other.query_string) }
}

impl fmt::Display for SolrFilterQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.query_string) }
}
