mod common;
use anyhow::Result;
use audlang::{MatchExpression, MatchOperator};
use audlang_solr::mapping::{
    ArgFieldAssignment, DefaultSolrMappingConfig, NodeTypeMetaInfo, SolrDocumentField, SolrMappingConfig, DEFAULT_NODE_TYPE_FIELD_NAME,
};
use audlang_solr::{
    AdlType, ConfigError, ConversionDirective, ConversionError, DefaultSolrType, SolrConversionConfig, SolrConversionProcessContext,
    SolrExpressionConverter, SolrType, SolrValueFormatter,
};
use common::*;
use std::sync::Arc;

fn field(node_type: &str, name: &str, field_type: DefaultSolrType) -> SolrDocumentField { SolrDocumentField::new(node_type, name, field_type) }

#[test]
fn mapping_validation() {
    let base = || DefaultSolrMappingConfig::builder(NodeTypeMetaInfo::main("profile"));

    let err = base().assign(ArgFieldAssignment::new("a", AdlType::String, field("orders", "a", DefaultSolrType::SolrString))).build().unwrap_err();
    assert_eq!(err, ConfigError::UndeclaredNodeType { node_type: "orders".into(), referenced_by: "a".into() });

    let err = base().node_type(NodeTypeMetaInfo::nested("orders")).node_type(NodeTypeMetaInfo::dependent("orders")).build().unwrap_err();
    assert_eq!(err, ConfigError::DuplicateNodeType("orders".into()));

    let err = base().node_type(NodeTypeMetaInfo::main("other")).build().unwrap_err();
    assert_eq!(err, ConfigError::SecondMainNodeType("other".into()));

    let err = base().assign(ArgFieldAssignment::new("a", AdlType::Date, field("profile", "a", DefaultSolrType::SolrBoolean))).build().unwrap_err();
    assert!(matches!(err, ConfigError::IncompatibleTypes { .. }));

    let err = base()
        .assign(ArgFieldAssignment::new("a", AdlType::String, field("profile", "a", DefaultSolrType::SolrString)).multi_doc())
        .build()
        .unwrap_err();
    assert_eq!(err, ConfigError::MultiDocOnMainNodeType("a".into()));

    let err = base().assign(ArgFieldAssignment::new("a", AdlType::String, field("profile", "bad-name", DefaultSolrType::SolrString))).build().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidName { what: "field", .. }));

    let err = base()
        .assign(ArgFieldAssignment::new("a", AdlType::String, field("profile", "a", DefaultSolrType::SolrString)))
        .assign(ArgFieldAssignment::new("a", AdlType::String, field("profile", "b", DefaultSolrType::SolrString)))
        .build()
        .unwrap_err();
    assert_eq!(err, ConfigError::DuplicateArgument("a".into()));

    let err = base().node_type_field_name("type_").build().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidName { what: "key field", .. }));
}

#[test]
fn lookup_contract() -> Result<()> {
    let mapping = mapping();
    assert_eq!(mapping.node_type_field_name(), DEFAULT_NODE_TYPE_FIELD_NAME);
    assert_eq!(mapping.lookup_node_type_meta_info("taste")?.node_type, "orders");
    assert!(mapping.contains_argument("x.nickname_s"));
    assert!(!mapping.contains_argument("nickname_s"));
    assert_eq!(mapping.lookup_node_type_meta_info("nope").unwrap_err(), ConversionError::NoMapping("nope".into()));
    Ok(())
}

#[test]
fn custom_key_fields() -> Result<()> {
    let mapping = DefaultSolrMappingConfig::builder(NodeTypeMetaInfo::main("profile"))
        .node_type(NodeTypeMetaInfo::dependent("tickets"))
        .assign(ArgFieldAssignment::new("state", AdlType::String, field("tickets", "state", DefaultSolrType::SolrString)))
        .node_type_field_name("doc_type")
        .unique_key_field_name("pk")
        .dependent_main_key_field_name("owner_pk")
        .build()?;
    let definition = SolrExpressionConverter::new(SolrConversionConfig::new(mapping)).convert(&eq("state", "open"))?;
    assert_eq!(definition.unique_key_field_name(), "pk");
    assert_eq!(definition.filter_query_strings(), vec!["doc_type:profile", "{!join from=owner_pk to=pk}(doc_type:tickets AND state:open)"]);
    Ok(())
}

/// Stores country names upper case with a prefix
#[derive(Debug)]
struct CountryCodeFormatter;

impl SolrValueFormatter for CountryCodeFormatter {
    fn format(&self, _arg_name: &str, value: &str, _operator: MatchOperator) -> Result<String, ConversionError> {
        Ok(format!("C_{}", value.to_uppercase()))
    }
}

#[test]
fn custom_value_formatter() -> Result<()> {
    let field_type = SolrType::with_formatter(DefaultSolrType::SolrString, Arc::new(CountryCodeFormatter));
    let mapping = DefaultSolrMappingConfig::builder(NodeTypeMetaInfo::main("profile"))
        .assign(ArgFieldAssignment::new("home-country", AdlType::String, SolrDocumentField::new("profile", "country", field_type)))
        .build()?;
    let definition = SolrExpressionConverter::new(SolrConversionConfig::new(mapping)).convert(&eq("home-country", "usa"))?;
    assert_eq!(definition.filter_query_strings(), vec!["country:C_USA", "node_type:profile"]);
    Ok(())
}

/// Maps every argument to a string field of the same name, with `-` replaced
#[derive(Debug)]
struct FlatMapping {
    main: NodeTypeMetaInfo,
}

impl SolrMappingConfig for FlatMapping {
    fn main_node_type(&self) -> &NodeTypeMetaInfo { &self.main }

    fn lookup_assignment(&self, arg_name: &str) -> Result<ArgFieldAssignment, ConversionError> {
        let field_name = arg_name.replace('-', "_");
        Ok(ArgFieldAssignment::new(arg_name, AdlType::String, field("doc", &field_name, DefaultSolrType::SolrString)))
    }

    fn node_type_meta_info(&self, node_type: &str) -> Result<&NodeTypeMetaInfo, ConversionError> {
        match node_type {
            "doc" => Ok(&self.main),
            _ => Err(ConversionError::UnknownNodeType(node_type.to_string())),
        }
    }
}

#[test]
fn custom_mapping_implementation() -> Result<()> {
    let converter = SolrExpressionConverter::new(SolrConversionConfig::new(FlatMapping { main: NodeTypeMetaInfo::main("doc") }));
    let definition = converter.convert(&eq("home-country", "USA"))?;
    assert_eq!(definition.filter_query_strings(), vec!["home_country:USA", "node_type:doc"]);
    Ok(())
}

#[test]
fn directives() {
    assert_eq!("DISABLE_LT_GT".parse::<ConversionDirective>(), Ok(ConversionDirective::DisableLessThanGreaterThan));
    let parsed = ConversionDirective::parse_list("DISABLE_CONTAINS, nonsense ,DISABLE_REFERENCE_MATCHING");
    assert_eq!(parsed.into_iter().collect::<Vec<_>>(), vec![ConversionDirective::DisableContains, ConversionDirective::DisableReferenceMatching]);
}

#[test]
fn process_context_reset() {
    let config = config().with_directive(ConversionDirective::DisableContains);
    let mut ctx = SolrConversionProcessContext::new(&config);
    assert!(ctx.is_directive_enabled(ConversionDirective::DisableContains));

    ctx.set_global_variable("directives", "DISABLE_DATE_TIME_ALIGNMENT");
    ctx.set_global_variable("tenant", "beta");
    assert!(ctx.is_directive_enabled(ConversionDirective::DisableDateTimeAlignment));
    assert!(ctx.is_directive_enabled(ConversionDirective::DisableContains));
    assert_eq!(ctx.global_variable("tenant"), Some("beta"));

    ctx.reset();
    assert!(!ctx.is_directive_enabled(ConversionDirective::DisableDateTimeAlignment));
    assert_eq!(ctx.global_variable("tenant"), Some("acme"));
}

#[test]
fn configured_directives_apply_to_every_call() {
    let converter = SolrExpressionConverter::new(config().with_directive(ConversionDirective::DisableContains));
    let err = converter.convert(&MatchExpression::contains("notes", "x").into()).unwrap_err();
    assert!(matches!(err, ConversionError::ContainsNotSupported { .. }));
    assert_eq!(converter.config().directives().len(), 1);
}
