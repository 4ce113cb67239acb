mod common;
use anyhow::Result;
use audlang::{CoreExpression, MatchExpression};
use audlang_solr::NegationPropagator;
use common::*;
use std::borrow::Cow;

#[test]
fn propagation_keeps_the_instance_when_nothing_changes() {
    let expression = CoreExpression::and(vec![eq("provider", "X"), not_eq("age", "5")]);
    let propagated = NegationPropagator::propagate(&expression);
    assert!(matches!(propagated, Cow::Borrowed(e) if std::ptr::eq(e, &expression)));
}

#[test]
fn propagation_guards_strict_negations() {
    let expression = CoreExpression::or(vec![
        CoreExpression::and(vec![strict_not_eq("color", "red"), eq("provider", "X")]),
        CoreExpression::and(vec![strict_not_eq("color", "blue"), eq("provider", "Y")]),
    ]);
    let propagated = NegationPropagator::propagate(&expression);
    assert_eq!(
        propagated.to_string(),
        "(NOT color IS UNKNOWN AND ((STRICT NOT color = red AND provider = X) OR (STRICT NOT color = blue AND provider = Y)))"
    );
}

#[test]
fn lax_negation_includes_unknown() -> Result<()> {
    // "age is not 5" holds for profiles without an age
    let definition = converter().convert(&not_eq("age", "5"))?;
    assert_eq!(conditions(&definition), vec!["(*:* -age:5)"]);
    Ok(())
}

#[test]
fn strict_negation_excludes_unknown() -> Result<()> {
    let definition = converter().convert(&strict_not_eq("age", "5"))?;
    assert_eq!(conditions(&definition), vec!["(*:* -age:5)", "age:*"]);
    Ok(())
}

#[test]
fn strict_reference_negation_requires_both_values() -> Result<()> {
    let definition = converter().convert(&CoreExpression::strict_not(MatchExpression::ref_greater_than("age", "min-age")))?;
    assert_eq!(conditions(&definition), vec![
        "(*:* -(age:* AND min_age:* AND {!frange l=1 u=1 v='if(gt(age,min_age),1,0)'}))",
        "age:*",
        "min_age:*"
    ]);
    Ok(())
}

#[test]
fn negated_bound_and_value_stay_complements() -> Result<()> {
    let expression = CoreExpression::or(vec![CoreExpression::not(MatchExpression::greater_than("seats", "3")), not_eq("seats", "3")]);
    let definition = converter().convert(&expression)?;
    assert_eq!(conditions(&definition), vec![
        "(*:* -{!parent which=\"node_type:profile\"}(node_type:contract AND seats:{3 TO *])) OR \
         (*:* -{!parent which=\"node_type:profile\"}(node_type:contract AND seats:3))"
    ]);
    Ok(())
}

#[test]
fn strict_negation_on_single_doc_nested_shares_the_join() -> Result<()> {
    let expression = CoreExpression::and(vec![
        strict_not_eq("plan", "basic"),
        strict_not_eq("plan", "trial"),
        eq("seats", "5"),
    ]);
    let definition = converter().convert(&expression)?;
    assert_eq!(conditions(&definition), vec![
        "{!parent which=\"node_type:profile\"}(node_type:contract AND plan:* AND (plan:* -plan:(basic OR trial)) AND seats:5)"
    ]);
    Ok(())
}
