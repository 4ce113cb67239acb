use tracing::Level;

use audlang::{CoreExpression, MatchExpression};
use audlang_solr::mapping::{ArgFieldAssignment, DefaultSolrMappingConfig, DynamicFieldAutoMappingPolicy, NodeTypeMetaInfo, SolrDocumentField};
use audlang_solr::{AdlType, DefaultSolrType, SolrConversionConfig, SolrExpressionConverter, SolrQueryDefinition};

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() { tracing_subscriber::fmt().with_max_level(Level::INFO).with_test_writer().init(); }

fn arg(arg_name: &str, arg_type: AdlType, node_type: &str, field_name: &str, field_type: DefaultSolrType) -> ArgFieldAssignment {
    ArgFieldAssignment::new(arg_name, arg_type, SolrDocumentField::new(node_type, field_name, field_type))
}

/// A customer profile (main), their orders (nested, many per customer), their contract (nested, one per
/// customer) and support tickets (dependent, many per customer, filtered by tenant).
pub fn mapping() -> DefaultSolrMappingConfig {
    use AdlType::*;
    use DefaultSolrType::*;
    DefaultSolrMappingConfig::builder(NodeTypeMetaInfo::main("profile"))
        .node_type(NodeTypeMetaInfo::nested("orders"))
        .node_type(NodeTypeMetaInfo::nested("contract"))
        .node_type(NodeTypeMetaInfo::dependent("tickets").with_document_filter("tenant", "${tenant}"))
        .assign(arg("provider", String, "profile", "provider", SolrString))
        .assign(arg("home-country", String, "profile", "country", SolrString))
        .assign(arg("age", Integer, "profile", "age", SolrInteger))
        .assign(arg("min-age", Integer, "profile", "min_age", SolrInteger))
        .assign(arg("date-of-birth", Date, "profile", "date_of_birth", SolrDate))
        .assign(arg("member-since", Date, "profile", "member_since", SolrLong))
        .assign(arg("vip", Bool, "profile", "vip", SolrBoolean))
        .assign(arg("notes", String, "profile", "notes", SolrString))
        .assign(arg("color", String, "orders", "color", SolrString).multi_doc())
        .assign(arg("taste", String, "orders", "taste", SolrString).multi_doc())
        .assign(arg("plan", String, "contract", "plan", SolrString))
        .assign(arg("seats", Integer, "contract", "seats", SolrInteger))
        .assign(arg("ticket-state", String, "tickets", "state", SolrString).multi_doc())
        .auto_mapping(DynamicFieldAutoMappingPolicy::new("profile").with_arg_name_prefix("x."))
        .build()
        .expect("test mapping is valid")
}

pub fn config() -> SolrConversionConfig { SolrConversionConfig::new(mapping()).with_global_variable("tenant", "acme") }

pub fn converter() -> SolrExpressionConverter { SolrExpressionConverter::new(config()) }

/// The filter queries besides the node type filter every definition carries
#[allow(unused)]
pub fn conditions(definition: &SolrQueryDefinition) -> Vec<&str> {
    definition.filter_query_strings().into_iter().filter(|fq| *fq != "node_type:profile").collect()
}

#[allow(unused)]
pub fn eq(arg: &str, value: &str) -> CoreExpression { MatchExpression::equals(arg, value).into() }

#[allow(unused)]
pub fn gt(arg: &str, value: &str) -> CoreExpression { MatchExpression::greater_than(arg, value).into() }

#[allow(unused)]
pub fn lt(arg: &str, value: &str) -> CoreExpression { MatchExpression::less_than(arg, value).into() }

/// `a >= x`, decomposed the way it arrives from Audlang
#[allow(unused)]
pub fn gte(arg: &str, value: &str) -> CoreExpression { CoreExpression::or(vec![gt(arg, value), eq(arg, value)]) }

#[allow(unused)]
pub fn lte(arg: &str, value: &str) -> CoreExpression { CoreExpression::or(vec![lt(arg, value), eq(arg, value)]) }

#[allow(unused)]
pub fn not_eq(arg: &str, value: &str) -> CoreExpression { CoreExpression::not(MatchExpression::equals(arg, value)) }

#[allow(unused)]
pub fn strict_not_eq(arg: &str, value: &str) -> CoreExpression { CoreExpression::strict_not(MatchExpression::equals(arg, value)) }
