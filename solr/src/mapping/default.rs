use super::{
    ArgFieldAssignment, AutoMappingPolicy, NodeTypeMetaInfo, SolrDocumentNature, SolrMappingConfig, DEFAULT_DEPENDENT_MAIN_KEY_FIELD_NAME,
    DEFAULT_NODE_TYPE_FIELD_NAME, DEFAULT_UNIQUE_KEY_FIELD_NAME,
};
use crate::error::{ConfigError, ConversionError};
use crate::query::is_valid_name;
use indexmap::IndexMap;
use std::sync::Arc;

/// Mapping with explicit assignments, falling back to auto-mapping policies in registration order
#[derive(Debug, Clone)]
pub struct DefaultSolrMappingConfig {
    main_node_type: String,
    node_types: IndexMap<String, NodeTypeMetaInfo>,
    assignments: IndexMap<String, ArgFieldAssignment>,
    auto_mapping_policies: Vec<Arc<dyn AutoMappingPolicy>>,
    node_type_field_name: String,
    unique_key_field_name: String,
    dependent_main_key_field_name: String,
}

/// Collects node types and assignments; [`SolrMappingConfigBuilder::build`] validates the whole mapping.
#[derive(Debug, Clone)]
pub struct SolrMappingConfigBuilder {
    main: NodeTypeMetaInfo,
    node_types: Vec<NodeTypeMetaInfo>,
    assignments: Vec<ArgFieldAssignment>,
    auto_mapping_policies: Vec<Arc<dyn AutoMappingPolicy>>,
    node_type_field_name: String,
    unique_key_field_name: String,
    dependent_main_key_field_name: String,
}

impl DefaultSolrMappingConfig {
    pub fn builder(main: NodeTypeMetaInfo) -> SolrMappingConfigBuilder {
        SolrMappingConfigBuilder {
            main: NodeTypeMetaInfo { nature: SolrDocumentNature::Main, ..main },
            node_types: Vec::new(),
            assignments: Vec::new(),
            auto_mapping_policies: Vec::new(),
            node_type_field_name: DEFAULT_NODE_TYPE_FIELD_NAME.to_string(),
            unique_key_field_name: DEFAULT_UNIQUE_KEY_FIELD_NAME.to_string(),
            dependent_main_key_field_name: DEFAULT_DEPENDENT_MAIN_KEY_FIELD_NAME.to_string(),
        }
    }

    pub fn assignments(&self) -> impl Iterator<Item = &ArgFieldAssignment> { self.assignments.values() }

    pub fn node_types(&self) -> impl Iterator<Item = &NodeTypeMetaInfo> { self.node_types.values() }

    fn validate_assignment(&self, assignment: &ArgFieldAssignment) -> Result<(), ConfigError> {
        validate_assignment(assignment, &self.main_node_type, |nt| self.node_types.contains_key(nt))
    }
}

fn validate_assignment(assignment: &ArgFieldAssignment, main_node_type: &str, declared: impl Fn(&str) -> bool) -> Result<(), ConfigError> {
    let field = &assignment.field;
    if assignment.arg_name.trim().is_empty() {
        return Err(ConfigError::InvalidArgName(assignment.arg_name.clone()));
    }
    if !is_valid_name(&field.field_name) {
        return Err(ConfigError::InvalidName { what: "field", name: field.field_name.clone() });
    }
    if !declared(&field.node_type) {
        return Err(ConfigError::UndeclaredNodeType { node_type: field.node_type.clone(), referenced_by: assignment.arg_name.clone() });
    }
    if !assignment.arg_type.is_compatible_with(field.field_type.base()) {
        return Err(ConfigError::IncompatibleTypes {
            arg_name: assignment.arg_name.clone(),
            arg_type: assignment.arg_type,
            field_type: field.field_type.base(),
        });
    }
    if assignment.is_multi_doc && field.node_type == main_node_type {
        return Err(ConfigError::MultiDocOnMainNodeType(assignment.arg_name.clone()));
    }
    Ok(())
}

fn validate_node_type(info: &NodeTypeMetaInfo) -> Result<(), ConfigError> {
    if !is_valid_name(&info.node_type) {
        return Err(ConfigError::InvalidName { what: "node type", name: info.node_type.clone() });
    }
    for filter in &info.document_filters {
        if !is_valid_name(&filter.field_name) {
            return Err(ConfigError::InvalidName { what: "field", name: filter.field_name.clone() });
        }
        if filter.node_type != info.node_type {
            return Err(ConfigError::UndeclaredNodeType { node_type: filter.node_type.clone(), referenced_by: filter.field_name.clone() });
        }
        if filter.value.trim().is_empty() {
            return Err(ConfigError::BlankDocumentFilter { node_type: info.node_type.clone(), field_name: filter.field_name.clone() });
        }
    }
    Ok(())
}

impl SolrMappingConfigBuilder {
    /// Declares a nested or dependent node type.
    pub fn node_type(mut self, info: NodeTypeMetaInfo) -> Self {
        self.node_types.push(info);
        self
    }

    pub fn assign(mut self, assignment: ArgFieldAssignment) -> Self {
        self.assignments.push(assignment);
        self
    }

    pub fn auto_mapping(mut self, policy: impl AutoMappingPolicy + 'static) -> Self {
        self.auto_mapping_policies.push(Arc::new(policy));
        self
    }

    pub fn node_type_field_name(mut self, name: impl Into<String>) -> Self {
        self.node_type_field_name = name.into();
        self
    }

    pub fn unique_key_field_name(mut self, name: impl Into<String>) -> Self {
        self.unique_key_field_name = name.into();
        self
    }

    pub fn dependent_main_key_field_name(mut self, name: impl Into<String>) -> Self {
        self.dependent_main_key_field_name = name.into();
        self
    }

    pub fn build(self) -> Result<DefaultSolrMappingConfig, ConfigError> {
        for name in [&self.node_type_field_name, &self.unique_key_field_name, &self.dependent_main_key_field_name] {
            if !is_valid_name(name) {
                return Err(ConfigError::InvalidName { what: "key field", name: name.clone() });
            }
        }

        let main_node_type = self.main.node_type.clone();
        let mut node_types = IndexMap::new();
        validate_node_type(&self.main)?;
        node_types.insert(main_node_type.clone(), self.main);
        for info in self.node_types {
            validate_node_type(&info)?;
            if info.nature == SolrDocumentNature::Main {
                return Err(ConfigError::SecondMainNodeType(info.node_type));
            }
            if node_types.contains_key(&info.node_type) {
                return Err(ConfigError::DuplicateNodeType(info.node_type));
            }
            node_types.insert(info.node_type.clone(), info);
        }

        let mut assignments = IndexMap::new();
        for assignment in self.assignments {
            validate_assignment(&assignment, &main_node_type, |nt| node_types.contains_key(nt))?;
            if assignments.contains_key(&assignment.arg_name) {
                return Err(ConfigError::DuplicateArgument(assignment.arg_name));
            }
            assignments.insert(assignment.arg_name.clone(), assignment);
        }

        tracing::debug!("built mapping with {} node type(s) and {} assignment(s)", node_types.len(), assignments.len());
        Ok(DefaultSolrMappingConfig {
            main_node_type,
            node_types,
            assignments,
            auto_mapping_policies: self.auto_mapping_policies,
            node_type_field_name: self.node_type_field_name,
            unique_key_field_name: self.unique_key_field_name,
            dependent_main_key_field_name: self.dependent_main_key_field_name,
        })
    }
}

impl SolrMappingConfig for DefaultSolrMappingConfig {
    fn main_node_type(&self) -> &NodeTypeMetaInfo { &self.node_types[&self.main_node_type] }

    fn lookup_assignment(&self, arg_name: &str) -> Result<ArgFieldAssignment, ConversionError> {
        if let Some(assignment) = self.assignments.get(arg_name) {
            return Ok(assignment.clone());
        }
        for policy in &self.auto_mapping_policies {
            if let Some(assignment) = policy.try_map(arg_name) {
                self.validate_assignment(&assignment)?;
                return Ok(assignment);
            }
        }
        Err(ConversionError::NoMapping(arg_name.to_string()))
    }

    fn node_type_meta_info(&self, node_type: &str) -> Result<&NodeTypeMetaInfo, ConversionError> {
        self.node_types.get(node_type).ok_or_else(|| ConversionError::UnknownNodeType(node_type.to_string()))
    }

    fn node_type_field_name(&self) -> &str { &self.node_type_field_name }

    fn unique_key_field_name(&self) -> &str { &self.unique_key_field_name }

    fn dependent_main_key_field_name(&self) -> &str { &self.dependent_main_key_field_name }
}
