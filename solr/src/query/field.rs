use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Checks the name rules shared by node types and Solr fields: a letter first, then letters, digits or
/// underscores, never ending with an underscore.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') && !name.ends_with('_')
}

/// A Solr field of a particular node type referenced by a filter query
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SolrQueryField {
    node_type: String,
    field_name: String,
}

impl SolrQueryField {
    pub fn new(node_type: impl Into<String>, field_name: impl Into<String>) -> Result<Self, ConfigError> {
        let node_type = node_type.into();
        let field_name = field_name.into();
        if !is_valid_name(&node_type) {
            return Err(ConfigError::InvalidName { what: "node type", name: node_type });
        }
        if !is_valid_name(&field_name) {
            return Err(ConfigError::InvalidName { what: "field", name: field_name });
        }
        Ok(Self { node_type, field_name })
    }

    pub fn node_type(&self) -> &str { &self.node_type }

    pub fn field_name(&self) -> &str { &self.field_name }
}

impl fmt::Display for SolrQueryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}.{}", self.node_type, self.field_name) }
}
