//! Mapping fixture shared by the unit tests.

use crate::config::SolrConversionConfig;
use crate::mapping::{ArgFieldAssignment, DefaultSolrMappingConfig, NodeTypeMetaInfo, SolrDocumentField};
use crate::types::{AdlType, DefaultSolrType};

fn arg(arg_name: &str, arg_type: AdlType, node_type: &str, field_name: &str, field_type: DefaultSolrType) -> ArgFieldAssignment {
    ArgFieldAssignment::new(arg_name, arg_type, SolrDocumentField::new(node_type, field_name, field_type))
}

/// main: provider, home-country, age, dob, day, score, active, tags, comment, limit
/// node1 (nested, multi-doc): color, taste; shade is single-doc
/// node2 (nested, single-doc): quality, size
/// node3 (dependent, multi-doc, filtered by tenant): status, updated
pub(crate) fn sample_config() -> SolrConversionConfig {
    use AdlType::*;
    use DefaultSolrType::*;
    let mapping = DefaultSolrMappingConfig::builder(NodeTypeMetaInfo::main("main"))
        .node_type(NodeTypeMetaInfo::nested("node1"))
        .node_type(NodeTypeMetaInfo::nested("node2"))
        .node_type(NodeTypeMetaInfo::dependent("node3").with_document_filter("tenant", "${tenant}"))
        .assign(arg("provider", String, "main", "provider", SolrString))
        .assign(arg("home-country", String, "main", "country", SolrString))
        .assign(arg("age", Integer, "main", "age", SolrInteger))
        .assign(arg("limit", Integer, "main", "limit_age", SolrInteger))
        .assign(arg("dob", Date, "main", "date_of_birth", SolrDate))
        .assign(arg("day", Date, "main", "day_code", SolrInteger))
        .assign(arg("score", Decimal, "main", "score", SolrDouble))
        .assign(arg("active", Bool, "main", "active", SolrBoolean))
        .assign(ArgFieldAssignment::new("tags", String, SolrDocumentField::new("main", "tags", SolrString).collection()))
        .assign(arg("comment", String, "main", "comment", SolrString))
        .assign(arg("color", String, "node1", "color", SolrString).multi_doc())
        .assign(arg("taste", String, "node1", "taste", SolrString).multi_doc())
        .assign(arg("shade", String, "node1", "shade", SolrString))
        .assign(arg("quality", String, "node2", "quality", SolrString))
        .assign(arg("size", Integer, "node2", "size", SolrInteger))
        .assign(arg("status", String, "node3", "status", SolrString).multi_doc())
        .assign(arg("updated", Date, "node3", "updated", SolrLong).multi_doc())
        .build()
        .expect("sample mapping is valid");
    SolrConversionConfig::new(mapping).with_global_variable("tenant", "acme")
}
