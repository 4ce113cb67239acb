use super::field::SolrQueryField;
use super::filter::{SolrConditionType, SolrFilterQuery};
use crate::error::ConfigError;
use crate::mapping::SolrMappingConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Layout of generated query strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SolrFormatStyle {
    /// Everything on one line
    #[default]
    Inline,
    /// Line breaks before AND/OR, indented by nesting depth
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BuilderState {
    AtMain,
    InNestedJoin(String),
    InDependentJoin(String),
}

/// Assembles a single filter query from filter query fragments, braces and joins.
///
/// The builder tracks the join scope and the brace depth of each scope. Any call that would produce a
/// malformed query (closing a brace that was never opened, nesting joins, appending a fragment of the wrong
/// node type, taking the result while a scope is open) is a programming error and panics.
#[derive(Debug)]
pub struct SolrFilterQueryBuilder {
    main_node_type: String,
    node_type_field: String,
    unique_key_field: String,
    dependent_key_field: String,
    style: SolrFormatStyle,
    buffer: String,
    state: BuilderState,
    main_depth: usize,
    join_depth: usize,
    fields: BTreeSet<SolrQueryField>,
    condition_types: BTreeSet<SolrConditionType>,
}

impl SolrFilterQueryBuilder {
    pub fn new(
        main_node_type: impl Into<String>,
        node_type_field: impl Into<String>,
        unique_key_field: impl Into<String>,
        dependent_key_field: impl Into<String>,
        style: SolrFormatStyle,
    ) -> Result<Self, ConfigError> {
        let main_node_type = main_node_type.into();
        let node_type_field = node_type_field.into();
        let unique_key_field = unique_key_field.into();
        let dependent_key_field = dependent_key_field.into();
        // validates all names once, later field creation cannot fail for them
        SolrQueryField::new(&main_node_type, &node_type_field)?;
        SolrQueryField::new(&main_node_type, &unique_key_field)?;
        SolrQueryField::new(&main_node_type, &dependent_key_field)?;
        Ok(Self {
            main_node_type,
            node_type_field,
            unique_key_field,
            dependent_key_field,
            style,
            buffer: String::new(),
            state: BuilderState::AtMain,
            main_depth: 0,
            join_depth: 0,
            fields: BTreeSet::new(),
            condition_types: BTreeSet::new(),
        })
    }

    pub fn for_mapping(mapping: &dyn SolrMappingConfig, style: SolrFormatStyle) -> Result<Self, ConfigError> {
        Self::new(
            mapping.main_node_type().node_type.as_str(),
            mapping.node_type_field_name(),
            mapping.unique_key_field_name(),
            mapping.dependent_main_key_field_name(),
            style,
        )
    }

    /// The node type fragments must currently belong to
    pub fn current_node_type(&self) -> &str {
        match &self.state {
            BuilderState::AtMain => &self.main_node_type,
            BuilderState::InNestedJoin(node_type) | BuilderState::InDependentJoin(node_type) => node_type,
        }
    }

    pub fn is_at_main(&self) -> bool { self.state == BuilderState::AtMain }

    fn depth(&self) -> usize {
        match self.state {
            BuilderState::AtMain => self.main_depth,
            _ => self.main_depth + 1 + self.join_depth,
        }
    }

    fn depth_mut(&mut self) -> &mut usize {
        match self.state {
            BuilderState::AtMain => &mut self.main_depth,
            _ => &mut self.join_depth,
        }
    }

    fn line_break(&mut self) {
        match self.style {
            SolrFormatStyle::Inline => self.buffer.push(' '),
            SolrFormatStyle::Pretty => {
                let indent = "    ".repeat(self.depth());
                self.buffer.push('\n');
                self.buffer.push_str(&indent);
            }
        }
    }

    fn field(&self, node_type: &str, field_name: &str) -> Result<SolrQueryField, ConfigError> { SolrQueryField::new(node_type, field_name) }

    fn start_join(&mut self, state: BuilderState, header: String, node_type: &str, document_filters: &[SolrFilterQuery]) {
        assert!(self.is_at_main(), "cannot start a join on {node_type} inside the join on {}", self.current_node_type());
        self.buffer.push_str(&header);
        self.buffer.push('(');
        self.state = state;
        self.join_depth = 0;
        if self.style == SolrFormatStyle::Pretty {
            self.line_break();
        }
        self.buffer.push_str(&format!("{}:{}", self.node_type_field, node_type));
        for filter in document_filters {
            self.append_and();
            self.append_filter_query(filter);
        }
        self.append_and();
    }

    /// Opens a block join selecting main documents by conditions on their nested documents.
    pub fn start_nested_join(&mut self, node_type: &str, document_filters: &[SolrFilterQuery]) -> Result<(), ConfigError> {
        let header = format!("{{!parent which=\"{}:{}\"}}", self.node_type_field, self.main_node_type);
        let fields = [self.field(&self.main_node_type, &self.node_type_field)?, self.field(node_type, &self.node_type_field)?];
        self.fields.extend(fields);
        self.condition_types.extend([SolrConditionType::JoinNested, SolrConditionType::FilterNodeType]);
        self.start_join(BuilderState::InNestedJoin(node_type.to_string()), header, node_type, document_filters);
        Ok(())
    }

    /// Opens a join selecting main documents by conditions on dependent documents referring to them.
    pub fn start_dependent_join(&mut self, node_type: &str, document_filters: &[SolrFilterQuery]) -> Result<(), ConfigError> {
        let header = format!("{{!join from={} to={}}}", self.dependent_key_field, self.unique_key_field);
        let fields = [
            self.field(&self.main_node_type, &self.unique_key_field)?,
            self.field(node_type, &self.dependent_key_field)?,
            self.field(node_type, &self.node_type_field)?,
        ];
        self.fields.extend(fields);
        self.condition_types.extend([SolrConditionType::JoinDependent, SolrConditionType::FilterNodeType]);
        self.start_join(BuilderState::InDependentJoin(node_type.to_string()), header, node_type, document_filters);
        Ok(())
    }

    pub fn end_join(&mut self) {
        assert!(!self.is_at_main(), "end_join() without an open join");
        assert_eq!(self.join_depth, 0, "end_join() with {} unclosed brace(s) inside the join on {}", self.join_depth, self.current_node_type());
        self.state = BuilderState::AtMain;
        if self.style == SolrFormatStyle::Pretty {
            self.line_break();
        }
        self.buffer.push(')');
    }

    pub fn open_brace(&mut self) {
        self.buffer.push('(');
        *self.depth_mut() += 1;
    }

    pub fn close_brace(&mut self) {
        let depth = self.depth_mut();
        assert!(*depth > 0, "close_brace() without an open brace");
        *depth -= 1;
        self.buffer.push(')');
    }

    /// Opens the complement of whatever follows: `(*:* -`, to be closed with [`Self::close_brace`].
    pub fn open_negation(&mut self) {
        self.open_brace();
        self.buffer.push_str("*:* -");
        self.condition_types.insert(SolrConditionType::AllDocs);
    }

    pub fn append_and(&mut self) {
        self.line_break();
        self.buffer.push_str("AND ");
    }

    pub fn append_or(&mut self) {
        self.line_break();
        self.buffer.push_str("OR ");
    }

    /// Appends a fragment, which must belong to the node type of the current scope.
    pub fn append_filter_query(&mut self, filter_query: &SolrFilterQuery) {
        let expected = self.current_node_type();
        assert_eq!(
            filter_query.node_type(),
            Some(expected),
            "fragment {} does not belong to node type {expected}",
            filter_query.query_string()
        );
        self.buffer.push_str(filter_query.query_string());
        self.fields.extend(filter_query.fields().iter().cloned());
        self.condition_types.extend(filter_query.condition_types().iter().copied());
    }

    /// Takes the assembled filter query and resets the builder.
    pub fn get_result(&mut self) -> SolrFilterQuery {
        assert!(self.is_at_main(), "get_result() inside the join on {}", self.current_node_type());
        assert_eq!(self.main_depth, 0, "get_result() with {} unclosed brace(s)", self.main_depth);
        assert!(!self.fields.is_empty(), "get_result() without any content");
        let fq = SolrFilterQuery::new(
            std::mem::take(&mut self.buffer),
            std::mem::take(&mut self.fields),
            std::mem::take(&mut self.condition_types),
        );
        tracing::trace!("built filter query {}", fq);
        fq
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.state = BuilderState::AtMain;
        self.main_depth = 0;
        self.join_depth = 0;
        self.fields.clear();
        self.condition_types.clear();
    }
}
