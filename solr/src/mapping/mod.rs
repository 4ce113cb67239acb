//! Mapping of Audlang arguments to Solr fields and node types.

mod auto;
mod default;

pub use auto::{AutoMappingPolicy, DynamicFieldAutoMappingPolicy};
pub use default::{DefaultSolrMappingConfig, SolrMappingConfigBuilder};

use crate::error::ConversionError;
use crate::types::{AdlType, SolrType};
use std::fmt;

pub const DEFAULT_NODE_TYPE_FIELD_NAME: &str = "node_type";
pub const DEFAULT_UNIQUE_KEY_FIELD_NAME: &str = "id";
pub const DEFAULT_DEPENDENT_MAIN_KEY_FIELD_NAME: &str = "main_id";

/// How documents of a node type relate to the main document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolrDocumentNature {
    Main,
    /// Child documents indexed in the same block as their parent
    Nested,
    /// Separate documents referring to their main document by key
    Dependent,
}

/// A fixed condition every document of a node type must satisfy, e.g. `tenant:${tenant}`.
///
/// The value may contain `${name}` placeholders resolved from the global variables of a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterField {
    pub node_type: String,
    pub field_name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTypeMetaInfo {
    pub node_type: String,
    pub nature: SolrDocumentNature,
    pub document_filters: Vec<FilterField>,
}

impl NodeTypeMetaInfo {
    pub fn main(node_type: impl Into<String>) -> Self { Self::new(node_type, SolrDocumentNature::Main) }

    pub fn nested(node_type: impl Into<String>) -> Self { Self::new(node_type, SolrDocumentNature::Nested) }

    pub fn dependent(node_type: impl Into<String>) -> Self { Self::new(node_type, SolrDocumentNature::Dependent) }

    fn new(node_type: impl Into<String>, nature: SolrDocumentNature) -> Self {
        Self { node_type: node_type.into(), nature, document_filters: Vec::new() }
    }

    pub fn with_document_filter(mut self, field_name: impl Into<String>, value: impl Into<String>) -> Self {
        self.document_filters.push(FilterField { node_type: self.node_type.clone(), field_name: field_name.into(), value: value.into() });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolrDocumentField {
    pub node_type: String,
    pub field_name: String,
    pub field_type: SolrType,
    pub is_collection: bool,
}

impl SolrDocumentField {
    pub fn new(node_type: impl Into<String>, field_name: impl Into<String>, field_type: impl Into<SolrType>) -> Self {
        Self { node_type: node_type.into(), field_name: field_name.into(), field_type: field_type.into(), is_collection: false }
    }

    pub fn collection(mut self) -> Self {
        self.is_collection = true;
        self
    }
}

/// Where an argument is stored.
///
/// `is_multi_doc` marks arguments on nested or dependent node types where each main document can have several
/// documents of that type; conditions on such arguments may be satisfied by different documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgFieldAssignment {
    pub arg_name: String,
    pub arg_type: AdlType,
    pub field: SolrDocumentField,
    pub is_multi_doc: bool,
}

impl ArgFieldAssignment {
    pub fn new(arg_name: impl Into<String>, arg_type: AdlType, field: SolrDocumentField) -> Self {
        Self { arg_name: arg_name.into(), arg_type, field, is_multi_doc: false }
    }

    pub fn multi_doc(mut self) -> Self {
        self.is_multi_doc = true;
        self
    }

    pub fn is_collection(&self) -> bool { self.field.is_collection }

    pub fn node_type(&self) -> &str { &self.field.node_type }
}

/// Lookup of argument assignments and node type information
pub trait SolrMappingConfig: fmt::Debug + Send + Sync {
    fn main_node_type(&self) -> &NodeTypeMetaInfo;

    fn lookup_assignment(&self, arg_name: &str) -> Result<ArgFieldAssignment, ConversionError>;

    fn node_type_meta_info(&self, node_type: &str) -> Result<&NodeTypeMetaInfo, ConversionError>;

    fn lookup_node_type_meta_info(&self, arg_name: &str) -> Result<&NodeTypeMetaInfo, ConversionError> {
        let assignment = self.lookup_assignment(arg_name)?;
        self.node_type_meta_info(assignment.node_type())
    }

    fn contains_argument(&self, arg_name: &str) -> bool { self.lookup_assignment(arg_name).is_ok() }

    fn node_type_field_name(&self) -> &str { DEFAULT_NODE_TYPE_FIELD_NAME }

    fn unique_key_field_name(&self) -> &str { DEFAULT_UNIQUE_KEY_FIELD_NAME }

    /// Field of dependent documents holding the unique key of their main document
    fn dependent_main_key_field_name(&self) -> &str { DEFAULT_DEPENDENT_MAIN_KEY_FIELD_NAME }
}
