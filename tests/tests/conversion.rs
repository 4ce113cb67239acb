mod common;
use anyhow::Result;
use audlang::{CoreExpression, MatchExpression};
use audlang_solr::query::SolrFormatStyle;
use audlang_solr::{CapabilityReason, ConversionDirective, ConversionError, ConversionErrorKind, SolrExpressionConverter};
use common::*;
use std::collections::HashMap;

#[test]
fn main_document_conditions() -> Result<()> {
    let definition = converter().convert(&CoreExpression::and(vec![eq("provider", "LOGMOTH"), eq("home-country", "USA")]))?;
    assert_eq!(definition.main_query_string(), "*:*");
    assert_eq!(definition.unique_key_field_name(), "id");
    assert_eq!(definition.filter_query_strings(), vec!["country:USA", "node_type:profile", "provider:LOGMOTH"]);
    Ok(())
}

#[test]
fn main_document_conditions_next_to_a_join_are_split() -> Result<()> {
    let expression = CoreExpression::and(vec![eq("provider", "LOGMOTH"), eq("home-country", "USA"), eq("plan", "gold")]);
    let definition = converter().convert(&expression)?;
    assert_eq!(conditions(&definition), vec![
        "country:USA",
        "provider:LOGMOTH",
        "{!parent which=\"node_type:profile\"}(node_type:contract AND plan:gold)"
    ]);
    Ok(())
}

#[test]
fn member_order_does_not_matter() -> Result<()> {
    let converter = converter();
    let a = converter.convert(&CoreExpression::and(vec![eq("provider", "LOGMOTH"), eq("age", "40")]))?;
    let b = converter.convert(&CoreExpression::and(vec![eq("age", "40"), eq("provider", "LOGMOTH")]))?;
    assert_eq!(a, b);
    Ok(())
}

#[test]
fn inclusive_bounds_under_or_are_never_a_between() -> Result<()> {
    let definition = converter().convert(&CoreExpression::or(vec![gte("age", "18"), lte("age", "5")]))?;
    assert_eq!(conditions(&definition), vec!["age:[18 TO *] OR age:[* TO 5]"]);
    Ok(())
}

#[test]
fn ranges() -> Result<()> {
    let converter = converter();
    let between = converter.convert(&CoreExpression::and(vec![gte("age", "18"), lte("age", "20")]))?;
    assert_eq!(conditions(&between), vec!["age:[18 TO 20]"]);

    let open = converter.convert(&CoreExpression::and(vec![gt("age", "18"), lt("age", "20")]))?;
    assert_eq!(conditions(&open), vec!["age:{18 TO 20}"]);

    // three bounds on one argument stay apart
    let three = converter.convert(&CoreExpression::and(vec![gt("age", "18"), lt("age", "20"), lt("age", "30")]))?;
    assert_eq!(conditions(&three), vec!["age:[* TO 20}", "age:[* TO 30}", "age:{18 TO *]"]);
    Ok(())
}

#[test]
fn ranges_on_multi_valued_arguments_stay_apart() -> Result<()> {
    let converter = converter();
    // a collection with values {a, e} matches both bounds but no value lies in between
    let collection = converter.convert(&CoreExpression::and(vec![gt("x.labels_ss", "b"), lt("x.labels_ss", "d")]))?;
    assert_eq!(conditions(&collection), vec!["labels_ss:[* TO d}", "labels_ss:{b TO *]"]);

    let nested = converter.convert(&CoreExpression::and(vec![gt("color", "b"), lt("color", "d")]))?;
    assert_eq!(conditions(&nested), vec![
        "{!parent which=\"node_type:profile\"}(node_type:orders AND color:[* TO d})",
        "{!parent which=\"node_type:profile\"}(node_type:orders AND color:{b TO *])",
    ]);

    let dependent = converter.convert(&CoreExpression::and(vec![gt("ticket-state", "b"), lt("ticket-state", "d")]))?;
    assert_eq!(conditions(&dependent), vec![
        "{!join from=main_id to=id}(node_type:tickets AND tenant:acme AND state:[* TO d})",
        "{!join from=main_id to=id}(node_type:tickets AND tenant:acme AND state:{b TO *])",
    ]);

    let negated = converter.convert(&CoreExpression::or(vec![
        CoreExpression::not(MatchExpression::greater_than("x.labels_ss", "b")),
        CoreExpression::not(MatchExpression::less_than("x.labels_ss", "d")),
    ]))?;
    assert_eq!(conditions(&negated), vec!["(*:* -labels_ss:{b TO *]) OR (*:* -labels_ss:[* TO d})"]);

    // one contract per profile, so the bounds still merge
    let single_doc = converter.convert(&CoreExpression::and(vec![gt("seats", "3"), lt("seats", "9")]))?;
    assert_eq!(conditions(&single_doc), vec!["{!parent which=\"node_type:profile\"}(node_type:contract AND seats:{3 TO 9})"]);
    Ok(())
}

#[test]
fn reference_match_on_nested_documents() -> Result<()> {
    let definition = converter().convert(&MatchExpression::ref_equals("color", "taste").into())?;
    assert_eq!(conditions(&definition), vec![
        "{!parent which=\"node_type:profile\"}(node_type:orders AND (color:* AND taste:* AND {!frange l=1 u=1 v='if(eq(color,taste),1,0)'}))"
    ]);
    Ok(())
}

#[test]
fn reference_match_on_day_aligned_dates() -> Result<()> {
    let definition = converter().convert(&MatchExpression::ref_less_than("date-of-birth", "member-since").into())?;
    assert_eq!(conditions(&definition), vec![
        "(date_of_birth:* AND member_since:* AND {!frange l=1 u=1 v='if(lt(\
         sub(ms(date_of_birth),sub(ms(date_of_birth),product(floor(div(ms(date_of_birth),86400000)),86400000))),\
         sub(member_since,sub(member_since,product(floor(div(member_since,86400000)),86400000)))),1,0)'})"
    ]);
    Ok(())
}

#[test]
fn reference_match_rejections() {
    let converter = converter();
    let err = converter.convert(&MatchExpression::ref_equals("color", "plan").into()).unwrap_err();
    assert_eq!(err.kind(), ConversionErrorKind::Capability);
    assert!(matches!(err, ConversionError::ReferenceMatchNotSupported { reason: CapabilityReason::NodeTypeMismatch { .. }, .. }));

    let err = converter.convert(&MatchExpression::ref_greater_than("provider", "notes").into()).unwrap_err();
    assert!(matches!(err, ConversionError::ReferenceMatchNotSupported { .. }));

    let variables = HashMap::from([("directives".to_string(), "DISABLE_REFERENCE_MATCHING".to_string())]);
    let err = converter.convert_with_variables(&MatchExpression::ref_equals("age", "min-age").into(), variables).unwrap_err();
    assert!(matches!(err, ConversionError::ReferenceMatchNotSupported { reason: CapabilityReason::DisabledByDirective, .. }));
}

#[test]
fn dates() -> Result<()> {
    let converter = converter();
    let aligned = converter.convert(&eq("date-of-birth", "2025-03-01"))?;
    assert_eq!(conditions(&aligned), vec!["date_of_birth:[2025\\-03\\-01T00\\:00\\:00Z TO 2025\\-03\\-02T00\\:00\\:00Z}"]);
    let with_time = converter.convert(&eq("date-of-birth", "2025-03-01 12:30:00"))?;
    assert_eq!(with_time, aligned);

    let variables = HashMap::from([("directives".to_string(), "DISABLE_DATE_TIME_ALIGNMENT".to_string())]);
    let exact = converter.convert_with_variables(&eq("date-of-birth", "2025-03-01"), variables)?;
    assert_eq!(conditions(&exact), vec!["date_of_birth:2025\\-03\\-01T00\\:00\\:00Z"]);

    let millis = converter.convert(&eq("member-since", "2025-03-01"))?;
    assert_eq!(conditions(&millis), vec!["member_since:[1740787200000 TO 1740873600000}"]);

    let after = converter.convert(&gte("date-of-birth", "2025-03-01 13:45:00"))?;
    assert_eq!(conditions(&after), vec!["date_of_birth:[2025\\-03\\-01T00\\:00\\:00Z TO *]"]);
    Ok(())
}

#[test]
fn escaping() -> Result<()> {
    let converter = converter();
    let definition = converter.convert(&MatchExpression::contains("notes", "the lazy dog").into())?;
    assert_eq!(conditions(&definition), vec!["notes:*the\\ lazy\\ dog*"]);

    let definition = converter.convert(&eq("provider", "A+B (C)"))?;
    assert_eq!(conditions(&definition), vec!["provider:A\\+B\\ \\(C\\)"]);
    Ok(())
}

#[test]
fn multi_values() -> Result<()> {
    let definition = converter().convert(&CoreExpression::or(vec![eq("provider", "X"), eq("provider", "A"), eq("home-country", "USA")]))?;
    assert_eq!(conditions(&definition), vec!["provider:(A OR X) OR country:USA"]);
    Ok(())
}

#[test]
fn or_groups_share_joins() -> Result<()> {
    let expression = CoreExpression::or(vec![eq("color", "red"), eq("plan", "basic"), eq("taste", "sweet"), eq("seats", "5")]);
    let definition = converter().convert(&expression)?;
    assert_eq!(conditions(&definition), vec![
        "{!parent which=\"node_type:profile\"}(node_type:orders AND (color:red OR taste:sweet)) OR \
         {!parent which=\"node_type:profile\"}(node_type:contract AND (plan:basic OR seats:5))"
    ]);
    Ok(())
}

#[test]
fn and_keeps_multi_doc_conditions_apart() -> Result<()> {
    let converter = converter();
    let orders = converter.convert(&CoreExpression::and(vec![eq("color", "red"), eq("taste", "sweet")]))?;
    assert_eq!(conditions(&orders), vec![
        "{!parent which=\"node_type:profile\"}(node_type:orders AND color:red)",
        "{!parent which=\"node_type:profile\"}(node_type:orders AND taste:sweet)"
    ]);

    let contract = converter.convert(&CoreExpression::and(vec![eq("plan", "basic"), gte("seats", "5")]))?;
    assert_eq!(conditions(&contract), vec!["{!parent which=\"node_type:profile\"}(node_type:contract AND plan:basic AND seats:[5 TO *])"]);
    Ok(())
}

#[test]
fn dependent_documents() -> Result<()> {
    let converter = converter();
    let definition = converter.convert(&eq("ticket-state", "open"))?;
    assert_eq!(conditions(&definition), vec!["{!join from=main_id to=id}(node_type:tickets AND tenant:acme AND state:open)"]);

    let variables = HashMap::from([("tenant".to_string(), "beta".to_string())]);
    let definition = converter.convert_with_variables(&eq("ticket-state", "open"), variables)?;
    assert_eq!(conditions(&definition), vec!["{!join from=main_id to=id}(node_type:tickets AND tenant:beta AND state:open)"]);
    Ok(())
}

#[test]
fn unresolved_document_filter_variable() {
    let converter = SolrExpressionConverter::new(config_without_tenant());
    assert_eq!(converter.convert(&eq("ticket-state", "open")).unwrap_err(), ConversionError::UnresolvedVariable("tenant".into()));
}

fn config_without_tenant() -> audlang_solr::SolrConversionConfig { audlang_solr::SolrConversionConfig::new(mapping()) }

#[test]
fn negations() -> Result<()> {
    let converter = converter();
    let lax = converter.convert(&CoreExpression::not(MatchExpression::equals("vip", "1")))?;
    assert_eq!(conditions(&lax), vec!["(*:* -vip:true)"]);

    let not_any_of = converter.convert(&CoreExpression::and(vec![not_eq("age", "5"), not_eq("age", "6")]))?;
    assert_eq!(conditions(&not_any_of), vec!["(age:* -age:(5 OR 6)) OR (*:* -age:*)"]);

    let strict = converter.convert(&CoreExpression::and(vec![strict_not_eq("age", "5"), strict_not_eq("age", "6")]))?;
    assert_eq!(conditions(&strict), vec!["(age:* -age:(5 OR 6))", "age:*"]);

    let nested = converter.convert(&not_eq("color", "red"))?;
    assert_eq!(conditions(&nested), vec!["(*:* -{!parent which=\"node_type:profile\"}(node_type:orders AND color:red))"]);
    Ok(())
}

#[test]
fn negated_between() -> Result<()> {
    let not_gte = CoreExpression::and(vec![CoreExpression::not(MatchExpression::greater_than("age", "18")), not_eq("age", "18")]);
    let not_lte = CoreExpression::and(vec![CoreExpression::not(MatchExpression::less_than("age", "20")), not_eq("age", "20")]);
    let definition = converter().convert(&CoreExpression::or(vec![not_gte, not_lte]))?;
    assert_eq!(conditions(&definition), vec!["(age:* -age:[18 TO 20]) OR (*:* -age:*)"]);
    Ok(())
}

#[test]
fn strict_negation_under_or() -> Result<()> {
    let expression = CoreExpression::or(vec![strict_not_eq("plan", "basic"), eq("provider", "X")]);
    let definition = converter().convert(&expression)?;
    assert_eq!(conditions(&definition), vec![
        "({!parent which=\"node_type:profile\"}(node_type:contract AND plan:*) AND \
         (*:* -{!parent which=\"node_type:profile\"}(node_type:contract AND plan:basic))) OR provider:X"
    ]);
    Ok(())
}

#[test]
fn capability_errors() {
    let converter = converter();
    let err = converter.convert(&MatchExpression::contains("age", "1").into()).unwrap_err();
    assert!(matches!(err, ConversionError::ContainsNotSupported { .. }));

    let err = converter.convert(&gt("vip", "0")).unwrap_err();
    assert!(matches!(err, ConversionError::LessThanGreaterThanNotSupported { .. }));

    let variables = HashMap::from([("directives".to_string(), ConversionDirective::DisableLessThanGreaterThan.to_string())]);
    let err = converter.convert_with_variables(&gt("age", "5"), variables).unwrap_err();
    assert_eq!(err, ConversionError::LessThanGreaterThanNotSupported { arg_name: "age".into(), reason: CapabilityReason::DisabledByDirective });
}

#[test]
fn lookup_and_formatting_errors() {
    let converter = converter();
    let err = converter.convert(&eq("shoe-size", "42")).unwrap_err();
    assert_eq!(err, ConversionError::NoMapping("shoe-size".into()));
    assert_eq!(err.kind(), ConversionErrorKind::Lookup);

    let err = converter.convert(&eq("date-of-birth", "yesterday")).unwrap_err();
    assert_eq!(err.kind(), ConversionErrorKind::Formatting);
    assert!(err.to_string().contains("yesterday"), "{err}");
}

#[test]
fn special_sets() -> Result<()> {
    let converter = converter();
    assert_eq!(converter.convert(&CoreExpression::all())?.filter_query_strings(), vec!["node_type:profile"]);
    assert_eq!(converter.convert(&CoreExpression::none())?.filter_query_strings(), vec!["(*:* -node_type:profile)", "node_type:profile"]);
    let absorbed = converter.convert(&CoreExpression::or(vec![eq("provider", "X"), CoreExpression::all()]))?;
    assert_eq!(absorbed.filter_query_strings(), vec!["node_type:profile"]);
    Ok(())
}

#[test]
fn auto_mapped_arguments() -> Result<()> {
    let definition = converter().convert(&gt("x.score_d", "1.5"))?;
    assert_eq!(conditions(&definition), vec!["score_d:{1.5 TO *]"]);
    Ok(())
}

#[test]
fn pretty_style() -> Result<()> {
    let converter = SolrExpressionConverter::new(config().with_style(SolrFormatStyle::Pretty));
    let definition = converter.convert(&CoreExpression::or(vec![eq("color", "red"), eq("taste", "sweet")]))?;
    let fq = conditions(&definition)[0];
    assert!(fq.contains('\n'), "{fq}");
    assert!(fq.starts_with("{!parent which=\"node_type:profile\"}("));
    Ok(())
}

#[test]
fn definition_serializes() -> Result<()> {
    let definition = converter().convert(&eq("provider", "LOGMOTH"))?;
    let json = serde_json::to_value(&definition)?;
    assert_eq!(json["main_query_string"], "*:*");
    assert_eq!(json["filter_queries"][1]["query_string"], "provider:LOGMOTH");
    Ok(())
}
