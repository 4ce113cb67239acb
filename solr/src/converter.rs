use crate::config::SolrConversionConfig;
use crate::context::SolrConversionProcessContext;
use crate::error::ConversionError;
use crate::factory::MatchFilterFactory;
use crate::mapping::SolrDocumentNature;
use crate::negation::NegationPropagator;
use crate::query::{SolrConditionType, SolrFilterQuery, SolrFilterQueryBuilder, SolrQueryDefinition, SolrQueryField, DEFAULT_MAIN_QUERY};
use crate::tree::{MatchInstruction, MatchTreeElement, MatchTreeHelper, NodeTypeGrouper, NodeTypeMatchTreeElementGroup};
use audlang::{CombiType, CoreExpression, SpecialSetType};
use std::collections::HashMap;
use tracing::debug;

/// Converts Audlang core expressions into Solr query definitions.
///
/// The converter itself is immutable and can be shared; every call works on a fresh process context
/// created from the configuration.
#[derive(Debug, Clone)]
pub struct SolrExpressionConverter {
    config: SolrConversionConfig,
}

impl SolrExpressionConverter {
    pub fn new(config: SolrConversionConfig) -> Self { Self { config } }

    pub fn config(&self) -> &SolrConversionConfig { &self.config }

    pub fn convert(&self, expression: &CoreExpression) -> Result<SolrQueryDefinition, ConversionError> {
        self.convert_with_variables(expression, HashMap::new())
    }

    /// Converts with additional global variables for this call only; they override the configured ones
    /// and may carry `directives`.
    pub fn convert_with_variables(
        &self,
        expression: &CoreExpression,
        variables: HashMap<String, String>,
    ) -> Result<SolrQueryDefinition, ConversionError> {
        let mut ctx = SolrConversionProcessContext::new(&self.config);
        ctx.set_global_variables(variables);

        let normalized = expression.normalized();
        debug!("converting {}", normalized);

        let mut filter_queries = vec![ctx.main_node_type_filter_query()?];
        filter_queries.extend(ctx.document_filter_queries(ctx.main_node_type())?);
        match &normalized {
            CoreExpression::SpecialSet(SpecialSetType::All) => {}
            CoreExpression::SpecialSet(SpecialSetType::None) => filter_queries.push(match_nothing(&ctx)?),
            _ => {
                let propagated = NegationPropagator::propagate(&normalized);
                let helper = MatchTreeHelper::new(&ctx);
                let tree = helper.create_match_tree(&propagated)?;
                let consolidated = helper.consolidate(&tree)?;
                let grouped = NodeTypeGrouper::new(&ctx).group(&consolidated)?;
                filter_queries.extend(FilterQueryEmitter::new(&ctx)?.emit(&grouped)?);
            }
        }

        let definition = SolrQueryDefinition::new(DEFAULT_MAIN_QUERY, filter_queries, ctx.mapping().unique_key_field_name());
        debug!("converted {} to {} filter queries", normalized, definition.filter_queries().len());
        Ok(definition)
    }
}

/// `(*:* -node_type:main)`, which together with the node type filter matches nothing
fn match_nothing(ctx: &SolrConversionProcessContext) -> Result<SolrFilterQuery, ConversionError> {
    let node_type_filter = ctx.main_node_type_filter_query()?;
    Ok(SolrFilterQuery::new(
        format!("(*:* -{})", node_type_filter.query_string()),
        [SolrQueryField::new(ctx.main_node_type(), ctx.mapping().node_type_field_name())?],
        [SolrConditionType::AllDocs, SolrConditionType::FilterNodeType],
    ))
}

/// Walks the grouped match tree and writes it into filter queries.
///
/// Conjunctions at the root, including the main document conditions within them, become separate filter
/// queries; everything else ends up in one.
struct FilterQueryEmitter<'c, 'a> {
    ctx: &'c SolrConversionProcessContext<'a>,
    factory: MatchFilterFactory<'c, 'a>,
    builder: SolrFilterQueryBuilder,
}

impl<'c, 'a> FilterQueryEmitter<'c, 'a> {
    fn new(ctx: &'c SolrConversionProcessContext<'a>) -> Result<Self, ConversionError> {
        let builder = SolrFilterQueryBuilder::for_mapping(ctx.mapping(), ctx.style())?;
        Ok(Self { ctx, factory: MatchFilterFactory::new(ctx), builder })
    }

    /// Members of a conjunction on the main document, or the element itself
    fn main_conjuncts<'t>(&self, element: &'t MatchTreeElement) -> Vec<&'t MatchTreeElement> {
        match element {
            MatchTreeElement::Group(g) if g.combi_type() == CombiType::And && self.ctx.is_main_node_type(g.node_type()) => {
                g.children().iter().collect()
            }
            other => vec![other],
        }
    }

    fn emit(mut self, root: &MatchTreeElement) -> Result<Vec<SolrFilterQuery>, ConversionError> {
        let parts: Vec<&MatchTreeElement> = match root {
            MatchTreeElement::Combined(c) if c.combi_type() == CombiType::And => {
                c.children().iter().flat_map(|child| self.main_conjuncts(child)).collect()
            }
            other => self.main_conjuncts(other),
        };
        let mut result = Vec::with_capacity(parts.len());
        for part in parts {
            self.element(part, true)?;
            let fq = self.builder.get_result();
            debug!("emitted filter query {}", fq);
            result.push(fq);
        }
        Ok(result)
    }

    fn separator(&mut self, combi_type: CombiType) {
        match combi_type {
            CombiType::And => self.builder.append_and(),
            CombiType::Or => self.builder.append_or(),
        }
    }

    fn children(&mut self, combi_type: CombiType, children: &[MatchTreeElement]) -> Result<(), ConversionError> {
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                self.separator(combi_type);
            }
            self.element(child, false)?;
        }
        Ok(())
    }

    fn element(&mut self, element: &MatchTreeElement, top_level: bool) -> Result<(), ConversionError> {
        match element {
            MatchTreeElement::Combined(c) => {
                if !top_level {
                    self.builder.open_brace();
                }
                self.children(c.combi_type(), c.children())?;
                if !top_level {
                    self.builder.close_brace();
                }
                Ok(())
            }
            MatchTreeElement::Group(g) => self.group(g, top_level),
            leaf => self.leaf(leaf),
        }
    }

    fn group(&mut self, group: &NodeTypeMatchTreeElementGroup, top_level: bool) -> Result<(), ConversionError> {
        if self.builder.current_node_type() == group.node_type() {
            if !top_level {
                self.builder.open_brace();
            }
            self.children(group.combi_type(), group.children())?;
            if !top_level {
                self.builder.close_brace();
            }
            return Ok(());
        }
        self.start_join(group.node_type())?;
        // the join content is already ANDed with the node type condition
        let braced = group.combi_type() == CombiType::Or;
        if braced {
            self.builder.open_brace();
        }
        self.children(group.combi_type(), group.children())?;
        if braced {
            self.builder.close_brace();
        }
        self.builder.end_join();
        Ok(())
    }

    fn start_join(&mut self, node_type: &str) -> Result<(), ConversionError> {
        let document_filters = self.ctx.document_filter_queries(node_type)?;
        match self.ctx.node_type_meta_info(node_type)?.nature {
            SolrDocumentNature::Nested => self.builder.start_nested_join(node_type, &document_filters)?,
            SolrDocumentNature::Dependent => self.builder.start_dependent_join(node_type, &document_filters)?,
            SolrDocumentNature::Main => panic!("main node type {node_type} cannot be joined from {}", self.builder.current_node_type()),
        }
        Ok(())
    }

    /// Appends a fragment, joining to its node type unless already there.
    fn scoped(&mut self, node_type: &str, fq: &SolrFilterQuery) -> Result<(), ConversionError> {
        if self.builder.current_node_type() == node_type {
            self.builder.append_filter_query(fq);
            return Ok(());
        }
        self.start_join(node_type)?;
        self.builder.append_filter_query(fq);
        self.builder.end_join();
        Ok(())
    }

    /// `(*:* -X)`
    fn complement(&mut self, node_type: &str, fq: &SolrFilterQuery) -> Result<(), ConversionError> {
        self.builder.open_negation();
        self.scoped(node_type, fq)?;
        self.builder.close_brace();
        Ok(())
    }

    fn leaf(&mut self, leaf: &MatchTreeElement) -> Result<(), ConversionError> {
        let (Some(node_type), Some(instruction), Some(arg_name)) = (leaf.common_node_type(), leaf.instruction(), leaf.arg_name()) else {
            panic!("not a leaf: {leaf}");
        };
        if instruction.is_verify() {
            return self.verified(leaf, node_type, instruction);
        }
        match leaf {
            MatchTreeElement::Single(w) if w.is_unknown_check() => {
                let any = self.factory.create_has_any_value_filter_query(arg_name)?;
                match instruction {
                    MatchInstruction::Default => self.complement(node_type, &any),
                    _ => self.scoped(node_type, &any),
                }
            }
            MatchTreeElement::Multi(w) if instruction.is_negation() && !w.wrapper_type().is_reference_match() => {
                self.in_document_complement(leaf, node_type, arg_name)
            }
            MatchTreeElement::Between(_) if instruction.is_negation() => self.in_document_complement(leaf, node_type, arg_name),
            _ => {
                let fq = self.factory.create_filter_query(leaf)?;
                match instruction {
                    MatchInstruction::Default => self.scoped(node_type, &fq),
                    _ => self.complement(node_type, &fq),
                }
            }
        }
    }

    /// Documents with a value that does not match. On multi-doc arguments outside of a join on their node
    /// type this means: some document has a value, no document matches.
    fn in_document_complement(&mut self, leaf: &MatchTreeElement, node_type: &str, arg_name: &str) -> Result<(), ConversionError> {
        if self.builder.current_node_type() == node_type || !self.ctx.is_multi_doc(arg_name)? {
            let fq = self.factory.create_in_document_complement(leaf)?;
            return self.scoped(node_type, &fq);
        }
        let any = self.factory.create_has_any_value_filter_query(arg_name)?;
        let positive = self.factory.create_filter_query(leaf)?;
        self.builder.open_brace();
        self.scoped(node_type, &any)?;
        self.builder.append_and();
        self.complement(node_type, &positive)?;
        self.builder.close_brace();
        Ok(())
    }

    /// `(f:* AND g:* AND (*:* -P))` with a value check for each verified side
    fn verified(&mut self, leaf: &MatchTreeElement, node_type: &str, instruction: MatchInstruction) -> Result<(), ConversionError> {
        let (left, right) = match leaf {
            MatchTreeElement::Single(w) => (w.arg_name(), w.match_expr().referenced_arg_name()),
            MatchTreeElement::Multi(w) => (w.arg_name(), w.referenced_arg_name()),
            other => panic!("{instruction:?} requires a reference match, got {other}"),
        };
        let mut sides = Vec::with_capacity(2);
        if instruction.verifies_left() {
            sides.push(left);
        }
        if let Some(right) = right.filter(|_| instruction.verifies_right()) {
            sides.push(right);
        }

        let positive = self.factory.create_filter_query(leaf)?;
        self.builder.open_brace();
        for side in sides {
            let any = self.factory.create_has_any_value_filter_query(side)?;
            self.scoped(node_type, &any)?;
            self.builder.append_and();
        }
        self.complement(node_type, &positive)?;
        self.builder.close_brace();
        Ok(())
    }
}
