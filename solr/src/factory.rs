//! Renders the leaves of the match tree as Solr filter query fragments.

use crate::config::ConversionDirective;
use crate::context::SolrConversionProcessContext;
use crate::error::{CapabilityReason, ConversionError};
use crate::format::{shift_date, MILLIS_PER_DAY};
use crate::mapping::ArgFieldAssignment;
use crate::query::{SolrConditionType, SolrFilterQuery, SolrQueryField};
use crate::tree::{BetweenMatchWrapper, MatchTreeElement, MatchWrapperType, MultiMatchWrapper, SingleMatchWrapper};
use crate::types::{AdlType, DefaultSolrType};
use audlang::{MatchExpression, MatchOperator};

/// Creates the positive fragment of a leaf; the emitter applies the instruction (complements, verification).
///
/// Fragments are self-contained: anything with more than one term is wrapped in parentheses.
pub struct MatchFilterFactory<'c, 'a> {
    ctx: &'c SolrConversionProcessContext<'a>,
}

impl<'c, 'a> MatchFilterFactory<'c, 'a> {
    pub fn new(ctx: &'c SolrConversionProcessContext<'a>) -> Self { Self { ctx } }

    /// # Panics
    /// If the element is not a leaf.
    pub fn create_filter_query(&self, element: &MatchTreeElement) -> Result<SolrFilterQuery, ConversionError> {
        match element {
            MatchTreeElement::Single(w) => self.single_filter(w),
            MatchTreeElement::Multi(w) => self.multi_filter(w),
            MatchTreeElement::Between(w) => self.between_filter(w),
            other => panic!("filter queries can only be created for leaves, got {other}"),
        }
    }

    /// `f:*`
    pub fn create_has_any_value_filter_query(&self, arg_name: &str) -> Result<SolrFilterQuery, ConversionError> {
        let assignment = self.ctx.lookup_assignment(arg_name)?;
        Ok(SolrFilterQuery::new(format!("{}:*", assignment.field.field_name), [query_field(&assignment)?], [SolrConditionType::AnyValue]))
    }

    /// `(f:* -P)`: documents with a value for the argument that do not match the leaf
    pub fn create_in_document_complement(&self, element: &MatchTreeElement) -> Result<SolrFilterQuery, ConversionError> {
        let Some(arg_name) = element.arg_name() else {
            panic!("in-document complements can only be created for leaves, got {element}");
        };
        let positive = self.create_filter_query(element)?;
        let any = self.create_has_any_value_filter_query(arg_name)?;
        Ok(SolrFilterQuery::new(
            format!("({} -{})", any.query_string(), positive.query_string()),
            positive.fields().iter().chain(any.fields()).cloned(),
            positive.condition_types().iter().chain(any.condition_types()).copied(),
        ))
    }

    fn check_contains(&self, assignment: &ArgFieldAssignment) -> Result<(), ConversionError> {
        let field_type = assignment.field.field_type.base();
        let reason = if self.ctx.is_directive_enabled(ConversionDirective::DisableContains) {
            CapabilityReason::DisabledByDirective
        } else if !field_type.supports_contains() {
            CapabilityReason::UnsupportedType(field_type)
        } else {
            return Ok(());
        };
        Err(ConversionError::ContainsNotSupported { arg_name: assignment.arg_name.clone(), reason })
    }

    fn check_less_than_greater_than(&self, assignment: &ArgFieldAssignment) -> Result<(), ConversionError> {
        let field_type = assignment.field.field_type.base();
        let reason = if self.ctx.is_directive_enabled(ConversionDirective::DisableLessThanGreaterThan) {
            CapabilityReason::DisabledByDirective
        } else if !field_type.supports_less_than_greater_than() {
            CapabilityReason::UnsupportedType(field_type)
        } else {
            return Ok(());
        };
        Err(ConversionError::LessThanGreaterThanNotSupported { arg_name: assignment.arg_name.clone(), reason })
    }

    fn format(&self, assignment: &ArgFieldAssignment, value: &str, operator: MatchOperator) -> Result<String, ConversionError> {
        self.ctx.format_value(assignment, value, operator)
    }

    /// The formatted day after the given date value
    fn format_next_day(&self, assignment: &ArgFieldAssignment, value: &str) -> Result<String, ConversionError> {
        self.format(assignment, &shift_date(&assignment.arg_name, value, 1)?, MatchOperator::Equals)
    }

    fn single_filter(&self, w: &SingleMatchWrapper) -> Result<SolrFilterQuery, ConversionError> {
        let m = w.match_expr();
        if m.operator() == MatchOperator::IsUnknown {
            return self.create_has_any_value_filter_query(m.arg_name());
        }
        if m.is_reference_match() {
            return self.reference_filter(std::slice::from_ref(m));
        }
        let assignment = self.ctx.lookup_assignment(m.arg_name())?;
        let (condition, condition_type) = self.value_condition(&assignment, m)?;
        Ok(SolrFilterQuery::new(format!("{}:{condition}", assignment.field.field_name), [query_field(&assignment)?], [condition_type]))
    }

    /// The part after `field:` for a single value match
    fn value_condition(&self, assignment: &ArgFieldAssignment, m: &MatchExpression) -> Result<(String, SolrConditionType), ConversionError> {
        let value = m.value().unwrap_or_default();
        let aligned = self.ctx.requires_date_alignment(assignment);
        Ok(match m.operator() {
            MatchOperator::Contains => {
                self.check_contains(assignment)?;
                (self.format(assignment, value, MatchOperator::Contains)?, SolrConditionType::Contains)
            }
            MatchOperator::Equals if aligned => {
                let range = format!("[{} TO {}}}", self.format(assignment, value, MatchOperator::Equals)?, self.format_next_day(assignment, value)?);
                (range, SolrConditionType::Range)
            }
            MatchOperator::Equals => (self.format(assignment, value, MatchOperator::Equals)?, SolrConditionType::Value),
            MatchOperator::GreaterThan => {
                self.check_less_than_greater_than(assignment)?;
                let range = if aligned {
                    format!("[{} TO *]", self.format_next_day(assignment, value)?)
                } else {
                    format!("{{{} TO *]", self.format(assignment, value, MatchOperator::GreaterThan)?)
                };
                (range, SolrConditionType::Range)
            }
            MatchOperator::LessThan => {
                self.check_less_than_greater_than(assignment)?;
                (format!("[* TO {}}}", self.format(assignment, value, MatchOperator::LessThan)?), SolrConditionType::Range)
            }
            MatchOperator::IsUnknown => unreachable!("IS UNKNOWN has no value condition"),
        })
    }

    fn multi_filter(&self, w: &MultiMatchWrapper) -> Result<SolrFilterQuery, ConversionError> {
        if w.wrapper_type().is_reference_match() {
            return self.reference_filter(w.members());
        }
        let assignment = self.ctx.lookup_assignment(w.arg_name())?;
        let field_name = &assignment.field.field_name;
        let (query, condition_type) = match w.wrapper_type() {
            MatchWrapperType::ValueOrEqMatch => (format!("{field_name}:{}", self.inclusive_bound(&assignment, w)?), SolrConditionType::Range),
            MatchWrapperType::MultiValueMatch if w.leading_operator() == MatchOperator::Equals && !self.ctx.requires_date_alignment(&assignment) => {
                let values = w
                    .members()
                    .iter()
                    .map(|m| self.format(&assignment, m.value().unwrap_or_default(), MatchOperator::Equals))
                    .collect::<Result<Vec<_>, _>>()?;
                (format!("{field_name}:({})", values.join(" OR ")), SolrConditionType::Value)
            }
            MatchWrapperType::MultiValueMatch => {
                let mut conditions = Vec::with_capacity(w.members().len());
                let mut condition_type = SolrConditionType::Value;
                for m in w.members() {
                    let (condition, kind) = self.value_condition(&assignment, m)?;
                    conditions.push(format!("{field_name}:{condition}"));
                    condition_type = kind;
                }
                (format!("({})", conditions.join(" OR ")), condition_type)
            }
            _ => {
                let m = &w.members()[0];
                let (condition, condition_type) = self.value_condition(&assignment, m)?;
                (format!("{field_name}:{condition}"), condition_type)
            }
        };
        Ok(SolrFilterQuery::new(query, [query_field(&assignment)?], [condition_type]))
    }

    /// `[x TO *]` or `[* TO x]`, day-aligned `[* TO x+1}`
    fn inclusive_bound(&self, assignment: &ArgFieldAssignment, w: &MultiMatchWrapper) -> Result<String, ConversionError> {
        self.check_less_than_greater_than(assignment)?;
        let value = w.bound_value().unwrap_or_default();
        let operator = w.leading_operator();
        Ok(match operator {
            MatchOperator::GreaterThan => format!("[{} TO *]", self.format(assignment, value, operator)?),
            _ if self.ctx.requires_date_alignment(assignment) => format!("[* TO {}}}", self.format_next_day(assignment, value)?),
            _ => format!("[* TO {}]", self.format(assignment, value, operator)?),
        })
    }

    fn between_filter(&self, w: &BetweenMatchWrapper) -> Result<SolrFilterQuery, ConversionError> {
        let assignment = self.ctx.lookup_assignment(w.arg_name())?;
        self.check_less_than_greater_than(&assignment)?;
        let aligned = self.ctx.requires_date_alignment(&assignment);
        let (left, right) = (w.left(), w.right());
        let lower_value = left.bound_value().unwrap_or_default();
        let upper_value = right.bound_value().unwrap_or_default();

        let lower = match (left.is_inclusive(), aligned) {
            (true, _) => format!("[{}", self.format(&assignment, lower_value, MatchOperator::GreaterThan)?),
            (false, true) => format!("[{}", self.format_next_day(&assignment, lower_value)?),
            (false, false) => format!("{{{}", self.format(&assignment, lower_value, MatchOperator::GreaterThan)?),
        };
        let upper = match (right.is_inclusive(), aligned) {
            (true, true) => format!("{}}}", self.format_next_day(&assignment, upper_value)?),
            (true, false) => format!("{}]", self.format(&assignment, upper_value, MatchOperator::LessThan)?),
            (false, _) => format!("{}}}", self.format(&assignment, upper_value, MatchOperator::LessThan)?),
        };
        Ok(SolrFilterQuery::new(
            format!("{}:{lower} TO {upper}", assignment.field.field_name),
            [query_field(&assignment)?],
            [SolrConditionType::Range],
        ))
    }

    /// Field-to-field comparison: `(f:* AND g:* AND {!frange l=1 u=1 v='if(gt(f,g),1,0)'})`
    fn reference_filter(&self, members: &[MatchExpression]) -> Result<SolrFilterQuery, ConversionError> {
        let m = &members[0];
        let ref_arg_name = m.referenced_arg_name().unwrap_or_default();
        let left = self.ctx.lookup_assignment(m.arg_name())?;
        let right = self.ctx.lookup_assignment(ref_arg_name)?;
        let refuse = |reason| ConversionError::ReferenceMatchNotSupported { arg_name: left.arg_name.clone(), ref_arg_name: right.arg_name.clone(), reason };

        if self.ctx.is_directive_enabled(ConversionDirective::DisableReferenceMatching) {
            return Err(refuse(CapabilityReason::DisabledByDirective));
        }
        if left.node_type() != right.node_type() {
            return Err(refuse(CapabilityReason::NodeTypeMismatch { left: left.node_type().to_string(), right: right.node_type().to_string() }));
        }
        for side in [&left, &right] {
            if side.is_collection() {
                return Err(refuse(CapabilityReason::CollectionField(side.field.field_name.clone())));
            }
        }
        let (left_type, right_type) = (left.field.field_type.base(), right.field.field_type.base());
        if !comparable(&left, &right) {
            return Err(refuse(CapabilityReason::IncompatibleTypes { left: left_type, right: right_type }));
        }

        let function = match (m.operator(), members.len() > 1) {
            (MatchOperator::Equals, _) => "eq",
            (MatchOperator::GreaterThan, false) => "gt",
            (MatchOperator::GreaterThan, true) => "gte",
            (MatchOperator::LessThan, false) => "lt",
            (MatchOperator::LessThan, true) => "lte",
            (operator @ (MatchOperator::Contains | MatchOperator::IsUnknown), _) => {
                unreachable!("{} cannot compare {} with @{}", operator.symbol(), m.arg_name(), ref_arg_name)
            }
        };
        if function != "eq" {
            if self.ctx.is_directive_enabled(ConversionDirective::DisableLessThanGreaterThan) {
                return Err(ConversionError::LessThanGreaterThanNotSupported {
                    arg_name: left.arg_name.clone(),
                    reason: CapabilityReason::DisabledByDirective,
                });
            }
            for field_type in [left_type, right_type] {
                if !field_type.supports_function_ordering() {
                    return Err(refuse(CapabilityReason::UnsupportedType(field_type)));
                }
            }
        }

        let aligned = self.ctx.requires_date_alignment(&left) && self.ctx.requires_date_alignment(&right);
        let (f, g) = (&left.field.field_name, &right.field.field_name);
        let query = format!(
            "({f}:* AND {g}:* AND {{!frange l=1 u=1 v='if({function}({},{}),1,0)'}})",
            value_source(&left, aligned),
            value_source(&right, aligned)
        );
        Ok(SolrFilterQuery::new(query, [query_field(&left)?, query_field(&right)?], [SolrConditionType::AnyValue, SolrConditionType::FuncRange]))
    }
}

fn query_field(assignment: &ArgFieldAssignment) -> Result<SolrQueryField, ConversionError> {
    Ok(SolrQueryField::new(assignment.node_type(), assignment.field.field_name.as_str())?)
}

/// Whether two arguments can be compared in a function query
fn comparable(left: &ArgFieldAssignment, right: &ArgFieldAssignment) -> bool {
    let (left_type, right_type) = (left.field.field_type.base(), right.field.field_type.base());
    match (left.arg_type, right.arg_type) {
        (AdlType::Date, AdlType::Date) => left_type.is_timestamp() == right_type.is_timestamp(),
        (a, b) if a.is_numeric() && b.is_numeric() => true,
        (a, b) => a == b && left_type == right_type,
    }
}

/// The function query value of a field; day-aligned timestamps are truncated to midnight
fn value_source(assignment: &ArgFieldAssignment, aligned: bool) -> String {
    let field_name = &assignment.field.field_name;
    let source = match assignment.field.field_type.base() {
        DefaultSolrType::SolrDate => format!("ms({field_name})"),
        _ => field_name.to_string(),
    };
    if aligned {
        format!("sub({source},sub({source},product(floor(div({source},{MILLIS_PER_DAY})),{MILLIS_PER_DAY})))")
    } else {
        source
    }
}
