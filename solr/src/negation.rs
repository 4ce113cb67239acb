//! Makes the "argument is known" part of strict negations explicit.
//!
//! `STRICT NOT color = red` only matches documents where color has a value. The propagator inserts the
//! guard `NOT color IS UNKNOWN` next to it, as far up in the tree as the logic allows, so later stages can
//! render every negation as a plain complement.

use audlang::{CombiType, CombinedExpression, CoreExpression, MatchExpression, MatchOperator, NegationExpression};
use std::borrow::Cow;

pub struct NegationPropagator;

impl NegationPropagator {
    /// Returns the expression with all required guards, borrowed if nothing had to be added.
    pub fn propagate(expression: &CoreExpression) -> Cow<'_, CoreExpression> {
        let result = match expression {
            CoreExpression::Combined(combined) if combined.combi_type() == CombiType::And => process(expression, &[]),
            _ => {
                // the root behaves like the only member of an AND
                let common = needs(expression);
                if common.is_empty() {
                    process(expression, &[])
                } else {
                    let inner = process(expression, &common).unwrap_or_else(|| expression.clone());
                    Some(CoreExpression::and(guards(&common).chain(std::iter::once(inner)).collect()))
                }
            }
        };
        match result {
            Some(propagated) => {
                tracing::debug!("propagated negations: {} -> {}", expression, propagated);
                Cow::Owned(propagated)
            }
            None => Cow::Borrowed(expression),
        }
    }
}

fn is_strict(negation: &NegationExpression) -> bool { negation.strict && negation.delegate.operator() != MatchOperator::IsUnknown }

/// `NOT arg IS UNKNOWN`
pub(crate) fn is_guard(expression: &CoreExpression) -> Option<&str> {
    match expression {
        CoreExpression::Negation(negation) if negation.delegate.operator() == MatchOperator::IsUnknown => Some(negation.delegate.arg_name()),
        _ => None,
    }
}

fn guards(arg_names: &[String]) -> impl Iterator<Item = CoreExpression> + '_ {
    arg_names.iter().map(|name| CoreExpression::not(MatchExpression::is_unknown(name.as_str())))
}

fn push_unique(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|n| n == name) {
        names.push(name.to_string());
    }
}

/// Arguments that must be known for the expression to match and are not yet guarded inside of it
fn needs(expression: &CoreExpression) -> Vec<String> {
    match expression {
        CoreExpression::Negation(negation) if is_strict(negation) => negation.delegate.arg_names().into_iter().map(String::from).collect(),
        CoreExpression::Combined(combined) => match combined.combi_type() {
            CombiType::And => {
                let explicit: Vec<&str> = combined.members().iter().filter_map(is_guard).collect();
                let mut names = Vec::new();
                for member in combined.members() {
                    for name in needs(member) {
                        if !explicit.contains(&name.as_str()) {
                            push_unique(&mut names, &name);
                        }
                    }
                }
                names
            }
            CombiType::Or => {
                let mut members = combined.members().iter();
                let Some(first) = members.next() else {
                    return Vec::new();
                };
                let mut common = needs(first);
                for member in members {
                    let other = needs(member);
                    common.retain(|name| other.contains(name));
                }
                common
            }
        },
        _ => Vec::new(),
    }
}

/// Adds the missing guards below `expression`, given the arguments already guarded by its ancestors.
/// `None` means unchanged.
fn process(expression: &CoreExpression, provided: &[String]) -> Option<CoreExpression> {
    match expression {
        CoreExpression::Negation(negation) if is_strict(negation) => {
            let missing: Vec<String> = needs(expression).into_iter().filter(|name| !provided.contains(name)).collect();
            if missing.is_empty() {
                None
            } else {
                Some(CoreExpression::and(guards(&missing).chain(std::iter::once(expression.clone())).collect()))
            }
        }
        CoreExpression::Combined(combined) => match combined.combi_type() {
            CombiType::And => process_and(combined, provided),
            CombiType::Or => {
                let processed: Vec<Option<CoreExpression>> = combined.members().iter().map(|member| process(member, provided)).collect();
                if processed.iter().all(Option::is_none) {
                    return None;
                }
                let members = processed.into_iter().zip(combined.members()).map(|(p, original)| p.unwrap_or_else(|| original.clone())).collect();
                Some(CoreExpression::or(members))
            }
        },
        _ => None,
    }
}

fn process_and(combined: &CombinedExpression, provided: &[String]) -> Option<CoreExpression> {
    let mut inner_provided: Vec<String> = provided.to_vec();
    for name in combined.members().iter().filter_map(is_guard) {
        push_unique(&mut inner_provided, name);
    }
    let mut missing = Vec::new();
    for member in combined.members() {
        for name in needs(member) {
            if !inner_provided.contains(&name) {
                push_unique(&mut missing, &name);
            }
        }
    }
    for name in &missing {
        push_unique(&mut inner_provided, name);
    }

    let processed: Vec<Option<CoreExpression>> = combined
        .members()
        .iter()
        .map(|member| match member {
            CoreExpression::Combined(_) => process(member, &inner_provided),
            _ => None,
        })
        .collect();

    if missing.is_empty() && processed.iter().all(Option::is_none) {
        return None;
    }
    let members = processed.into_iter().zip(combined.members()).map(|(p, original)| p.unwrap_or_else(|| original.clone()));
    Some(CoreExpression::and(guards(&missing).chain(members).collect()))
}
