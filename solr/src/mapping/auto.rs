use super::{ArgFieldAssignment, SolrDocumentField};
use crate::query::is_valid_name;
use crate::types::{AdlType, DefaultSolrType};
use std::fmt;

/// Maps arguments without an explicit assignment, e.g. by naming convention.
pub trait AutoMappingPolicy: fmt::Debug + Send + Sync {
    fn try_map(&self, arg_name: &str) -> Option<ArgFieldAssignment>;
}

// longer suffixes first, `_dts` must win over `_ds`/`_s`
const DYNAMIC_FIELD_SUFFIXES: &[(&str, AdlType, DefaultSolrType, bool)] = &[
    ("_dts", AdlType::Date, DefaultSolrType::SolrDate, true),
    ("_ss", AdlType::String, DefaultSolrType::SolrString, true),
    ("_is", AdlType::Integer, DefaultSolrType::SolrInteger, true),
    ("_ls", AdlType::Integer, DefaultSolrType::SolrLong, true),
    ("_ds", AdlType::Decimal, DefaultSolrType::SolrDouble, true),
    ("_dt", AdlType::Date, DefaultSolrType::SolrDate, false),
    ("_s", AdlType::String, DefaultSolrType::SolrString, false),
    ("_i", AdlType::Integer, DefaultSolrType::SolrInteger, false),
    ("_l", AdlType::Integer, DefaultSolrType::SolrLong, false),
    ("_d", AdlType::Decimal, DefaultSolrType::SolrDouble, false),
    ("_b", AdlType::Bool, DefaultSolrType::SolrBoolean, false),
];

/// Maps arguments named like Solr dynamic fields (`color_s`, `scores_is`, `updated_dt`, ...) to a field of the
/// same name on one node type. An optional prefix (e.g. `sub.`) is stripped from the argument name first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicFieldAutoMappingPolicy {
    node_type: String,
    arg_name_prefix: String,
    multi_doc: bool,
}

impl DynamicFieldAutoMappingPolicy {
    pub fn new(node_type: impl Into<String>) -> Self { Self { node_type: node_type.into(), arg_name_prefix: String::new(), multi_doc: false } }

    pub fn with_arg_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.arg_name_prefix = prefix.into();
        self
    }

    pub fn multi_doc(mut self) -> Self {
        self.multi_doc = true;
        self
    }

    pub fn node_type(&self) -> &str { &self.node_type }
}

impl AutoMappingPolicy for DynamicFieldAutoMappingPolicy {
    fn try_map(&self, arg_name: &str) -> Option<ArgFieldAssignment> {
        let field_name = arg_name.strip_prefix(self.arg_name_prefix.as_str())?;
        if !is_valid_name(field_name) {
            return None;
        }
        let (_, arg_type, field_type, is_collection) =
            DYNAMIC_FIELD_SUFFIXES.iter().find(|(suffix, ..)| field_name.len() > suffix.len() && field_name.ends_with(suffix))?;

        let mut field = SolrDocumentField::new(self.node_type.as_str(), field_name, *field_type);
        field.is_collection = *is_collection;
        let mut assignment = ArgFieldAssignment::new(arg_name, *arg_type, field);
        assignment.is_multi_doc = self.multi_doc;
        tracing::debug!("auto-mapped argument {} to {}.{}", arg_name, self.node_type, field_name);
        Some(assignment)
    }
}
