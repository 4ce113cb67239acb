use crate::config::{ConversionDirective, SolrConversionConfig, DIRECTIVES_VARIABLE};
use crate::error::ConversionError;
use crate::format::escape;
use crate::mapping::{ArgFieldAssignment, NodeTypeMetaInfo, SolrMappingConfig};
use crate::query::{SolrConditionType, SolrFilterQuery, SolrFormatStyle, SolrQueryField};
use audlang::MatchOperator;
use std::collections::{BTreeSet, HashMap};

/// State of a single conversion: the configuration template plus the global variables and directives in
/// effect for this call.
#[derive(Debug)]
pub struct SolrConversionProcessContext<'a> {
    config: &'a SolrConversionConfig,
    global_variables: HashMap<String, String>,
    directives: BTreeSet<ConversionDirective>,
}

impl<'a> SolrConversionProcessContext<'a> {
    pub fn new(config: &'a SolrConversionConfig) -> Self {
        let mut context = Self { config, global_variables: HashMap::new(), directives: BTreeSet::new() };
        context.reset();
        context
    }

    /// Restores the variables and directives of the configuration template.
    pub fn reset(&mut self) {
        self.global_variables = self.config.global_variables().clone();
        self.refresh_directives();
    }

    fn refresh_directives(&mut self) {
        let mut directives = self.config.directives().clone();
        if let Some(list) = self.global_variables.get(DIRECTIVES_VARIABLE) {
            directives.extend(ConversionDirective::parse_list(list));
        }
        self.directives = directives;
    }

    pub fn set_global_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let refresh = name == DIRECTIVES_VARIABLE;
        self.global_variables.insert(name, value.into());
        if refresh {
            self.refresh_directives();
        }
    }

    pub fn set_global_variables(&mut self, variables: HashMap<String, String>) {
        self.global_variables.extend(variables);
        self.refresh_directives();
    }

    pub fn global_variable(&self, name: &str) -> Option<&str> { self.global_variables.get(name).map(String::as_str) }

    pub fn directives(&self) -> &BTreeSet<ConversionDirective> { &self.directives }

    pub fn is_directive_enabled(&self, directive: ConversionDirective) -> bool { self.directives.contains(&directive) }

    pub fn mapping(&self) -> &'a dyn SolrMappingConfig { self.config.mapping() }

    pub fn style(&self) -> SolrFormatStyle { self.config.style() }

    pub fn main_node_type(&self) -> &'a str { &self.mapping().main_node_type().node_type }

    pub fn is_main_node_type(&self, node_type: &str) -> bool { self.main_node_type() == node_type }

    pub fn lookup_assignment(&self, arg_name: &str) -> Result<ArgFieldAssignment, ConversionError> { self.mapping().lookup_assignment(arg_name) }

    pub fn node_type_meta_info(&self, node_type: &str) -> Result<&'a NodeTypeMetaInfo, ConversionError> {
        self.mapping().node_type_meta_info(node_type)
    }

    pub fn is_multi_doc(&self, arg_name: &str) -> Result<bool, ConversionError> { Ok(self.lookup_assignment(arg_name)?.is_multi_doc) }

    /// Date arguments stored in timestamp fields are compared by day unless alignment is disabled.
    pub fn requires_date_alignment(&self, assignment: &ArgFieldAssignment) -> bool {
        assignment.arg_type == crate::types::AdlType::Date
            && assignment.field.field_type.base().is_timestamp()
            && !self.is_directive_enabled(ConversionDirective::DisableDateTimeAlignment)
    }

    pub fn requires_date_alignment_for(&self, arg_name: &str) -> Result<bool, ConversionError> {
        Ok(self.requires_date_alignment(&self.lookup_assignment(arg_name)?))
    }

    pub fn format_value(&self, assignment: &ArgFieldAssignment, value: &str, operator: MatchOperator) -> Result<String, ConversionError> {
        assignment.field.field_type.format_value(&assignment.arg_name, assignment.arg_type, value, operator)
    }

    /// Replaces `${name}` placeholders with global variables.
    pub fn resolve_variables(&self, text: &str) -> Result<String, ConversionError> {
        let mut resolved = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find("${") {
            let Some(len) = rest[start + 2..].find('}') else {
                break;
            };
            let name = &rest[start + 2..start + 2 + len];
            let value = self.global_variable(name).ok_or_else(|| ConversionError::UnresolvedVariable(name.to_string()))?;
            resolved.push_str(&rest[..start]);
            resolved.push_str(value);
            rest = &rest[start + 3 + len..];
        }
        resolved.push_str(rest);
        Ok(resolved)
    }

    /// `node_type:<main>`, restricting results to main documents
    pub fn main_node_type_filter_query(&self) -> Result<SolrFilterQuery, ConversionError> {
        let field_name = self.mapping().node_type_field_name();
        let main = self.main_node_type();
        Ok(SolrFilterQuery::new(
            format!("{field_name}:{}", escape(main)),
            [SolrQueryField::new(main, field_name)?],
            [SolrConditionType::FilterNodeType],
        ))
    }

    /// The document filters of a node type with all variables resolved
    pub fn document_filter_queries(&self, node_type: &str) -> Result<Vec<SolrFilterQuery>, ConversionError> {
        let info = self.node_type_meta_info(node_type)?;
        info.document_filters
            .iter()
            .map(|filter| {
                let value = self.resolve_variables(&filter.value)?;
                Ok::<_, ConversionError>(SolrFilterQuery::new(
                    format!("{}:{}", filter.field_name, escape(&value)),
                    [SolrQueryField::new(filter.node_type.as_str(), filter.field_name.as_str())?],
                    [SolrConditionType::FilterDocument],
                ))
            })
            .collect()
    }
}
