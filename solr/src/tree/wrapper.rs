use audlang::{MatchExpression, MatchOperator};
use crate::query::is_valid_name;
use std::cmp::Ordering;

/// How a wrapped match is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchInstruction {
    Default,
    Negate,
    /// Negated reference match that must also ensure the left argument has a value
    NegateVerifyLeftHasAnyValue,
    NegateVerifyRightHasAnyValue,
    NegateVerifyBothHaveAnyValue,
}

impl MatchInstruction {
    pub fn is_negation(&self) -> bool { *self != MatchInstruction::Default }

    pub fn is_verify(&self) -> bool { self.verifies_left() || self.verifies_right() }

    pub fn verifies_left(&self) -> bool {
        matches!(self, MatchInstruction::NegateVerifyLeftHasAnyValue | MatchInstruction::NegateVerifyBothHaveAnyValue)
    }

    pub fn verifies_right(&self) -> bool {
        matches!(self, MatchInstruction::NegateVerifyRightHasAnyValue | MatchInstruction::NegateVerifyBothHaveAnyValue)
    }

    /// The strict negation instruction checking exactly the given sides
    pub fn verify(left: bool, right: bool) -> MatchInstruction {
        match (left, right) {
            (true, true) => MatchInstruction::NegateVerifyBothHaveAnyValue,
            (true, false) => MatchInstruction::NegateVerifyLeftHasAnyValue,
            (false, true) => MatchInstruction::NegateVerifyRightHasAnyValue,
            (false, false) => MatchInstruction::Negate,
        }
    }
}

/// Shape of the condition a wrapper stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchWrapperType {
    /// `IS UNKNOWN`, rendered through "has any value"
    AnyValueMatch,
    ValueMatch,
    /// `a > x OR a = x` (or `<`)
    ValueOrEqMatch,
    /// Several values (or snippets) of one argument, any of them matching
    MultiValueMatch,
    RefMatch,
    RefOrEqMatch,
    ValueGtAndLtMatch,
    ValueGtAndLteMatch,
    ValueGteAndLtMatch,
    ValueGteAndLteMatch,
}

impl MatchWrapperType {
    pub fn is_reference_match(&self) -> bool { matches!(self, MatchWrapperType::RefMatch | MatchWrapperType::RefOrEqMatch) }

    pub fn is_between(&self) -> bool {
        matches!(
            self,
            MatchWrapperType::ValueGtAndLtMatch
                | MatchWrapperType::ValueGtAndLteMatch
                | MatchWrapperType::ValueGteAndLtMatch
                | MatchWrapperType::ValueGteAndLteMatch
        )
    }
}

/// A single match of the expression on one node type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleMatchWrapper {
    node_type: String,
    match_expr: MatchExpression,
    instruction: MatchInstruction,
    grouping_eligible: bool,
}

impl SingleMatchWrapper {
    /// # Panics
    /// If a verify instruction is applied to a value match.
    pub fn new(node_type: impl Into<String>, match_expr: MatchExpression, instruction: MatchInstruction, grouping_eligible: bool) -> Self {
        let node_type = node_type.into();
        assert!(is_valid_name(&node_type), "invalid node type {node_type:?} for {match_expr}");
        assert!(
            !instruction.is_verify() || match_expr.is_reference_match(),
            "{instruction:?} requires a reference match, got {match_expr}"
        );
        Self { node_type, match_expr, instruction, grouping_eligible }
    }

    pub fn node_type(&self) -> &str { &self.node_type }

    pub fn match_expr(&self) -> &MatchExpression { &self.match_expr }

    pub fn arg_name(&self) -> &str { self.match_expr.arg_name() }

    pub fn operator(&self) -> MatchOperator { self.match_expr.operator() }

    pub fn instruction(&self) -> MatchInstruction { self.instruction }

    pub fn is_grouping_eligible(&self) -> bool { self.grouping_eligible }

    pub fn wrapper_type(&self) -> MatchWrapperType {
        if self.match_expr.operator() == MatchOperator::IsUnknown {
            MatchWrapperType::AnyValueMatch
        } else if self.match_expr.is_reference_match() {
            MatchWrapperType::RefMatch
        } else {
            MatchWrapperType::ValueMatch
        }
    }

    /// `IS UNKNOWN` is the complement of "has any value", so it flips the instruction.
    pub fn is_effectively_negated(&self) -> bool { self.instruction.is_negation() != (self.match_expr.operator() == MatchOperator::IsUnknown) }

    pub fn is_unknown_check(&self) -> bool { self.match_expr.operator() == MatchOperator::IsUnknown }

    /// `NOT arg IS UNKNOWN`
    pub fn is_guard(&self) -> bool { self.is_unknown_check() && self.instruction.is_negation() }
}

fn operator_rank(operator: MatchOperator) -> u8 {
    match operator {
        MatchOperator::GreaterThan => 0,
        MatchOperator::LessThan => 1,
        MatchOperator::Equals => 2,
        MatchOperator::Contains => 3,
        MatchOperator::IsUnknown => 4,
    }
}

fn canonical_order(a: &MatchExpression, b: &MatchExpression) -> Ordering {
    operator_rank(a.operator()).cmp(&operator_rank(b.operator())).then_with(|| a.operand().cmp(&b.operand()))
}

/// Several matches of the same argument combined into one condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiMatchWrapper {
    node_type: String,
    members: Vec<MatchExpression>,
    instruction: MatchInstruction,
    grouping_eligible: bool,
    wrapper_type: MatchWrapperType,
}

impl MultiMatchWrapper {
    /// Members are sorted canonically (bounds before equality, then by operand) and deduplicated.
    ///
    /// # Panics
    /// If the members do not form a valid combination: different arguments, `IS UNKNOWN`, mixed operators
    /// other than a bound with its equality, or a verify instruction on value matches.
    pub fn new(node_type: impl Into<String>, mut members: Vec<MatchExpression>, instruction: MatchInstruction, grouping_eligible: bool) -> Self {
        let node_type = node_type.into();
        assert!(is_valid_name(&node_type), "invalid node type {node_type:?} for {members:?}");
        assert!(!members.is_empty(), "multi match without members");
        members.sort_by(canonical_order);
        members.dedup();
        let arg_name = members[0].arg_name();
        assert!(members.iter().all(|m| m.arg_name() == arg_name), "multi match members must share the argument: {members:?}");
        let wrapper_type = classify(&members);
        assert!(
            !instruction.is_verify() || wrapper_type.is_reference_match(),
            "{instruction:?} requires a reference match, got {wrapper_type:?}"
        );
        Self { node_type, members, instruction, grouping_eligible, wrapper_type }
    }

    pub fn node_type(&self) -> &str { &self.node_type }

    pub fn members(&self) -> &[MatchExpression] { &self.members }

    pub fn arg_name(&self) -> &str { self.members[0].arg_name() }

    pub fn referenced_arg_name(&self) -> Option<&str> { self.members[0].referenced_arg_name() }

    pub fn instruction(&self) -> MatchInstruction { self.instruction }

    pub fn is_grouping_eligible(&self) -> bool { self.grouping_eligible }

    pub fn wrapper_type(&self) -> MatchWrapperType { self.wrapper_type }

    /// The first member, which is the bound of a `>=`/`<=` combination
    pub fn leading_operator(&self) -> MatchOperator { self.members[0].operator() }

    /// Value-based lower bound: `a > x` or `a >= x`
    pub fn is_lower_bound(&self) -> bool {
        !self.wrapper_type.is_reference_match() && self.leading_operator() == MatchOperator::GreaterThan
    }

    /// Value-based upper bound: `a < x` or `a <= x`
    pub fn is_upper_bound(&self) -> bool { !self.wrapper_type.is_reference_match() && self.leading_operator() == MatchOperator::LessThan }

    /// Whether the bound includes its value (`>=`, `<=`)
    pub fn is_inclusive(&self) -> bool { matches!(self.wrapper_type, MatchWrapperType::ValueOrEqMatch | MatchWrapperType::RefOrEqMatch) }

    /// The compared value of the leading member
    pub fn bound_value(&self) -> Option<&str> { self.members[0].value() }
}

fn classify(members: &[MatchExpression]) -> MatchWrapperType {
    assert!(members.iter().all(|m| m.operator() != MatchOperator::IsUnknown), "IS UNKNOWN cannot be part of a multi match: {members:?}");
    let first = &members[0];
    if members.len() == 1 {
        return if first.is_reference_match() { MatchWrapperType::RefMatch } else { MatchWrapperType::ValueMatch };
    }
    if members.len() == 2
        && matches!(first.operator(), MatchOperator::GreaterThan | MatchOperator::LessThan)
        && members[1].operator() == MatchOperator::Equals
        && first.operand() == members[1].operand()
    {
        return if first.is_reference_match() { MatchWrapperType::RefOrEqMatch } else { MatchWrapperType::ValueOrEqMatch };
    }
    let same_operator = members.iter().all(|m| m.operator() == first.operator());
    let values_only = members.iter().all(|m| m.value().is_some());
    assert!(
        same_operator && values_only && matches!(first.operator(), MatchOperator::Equals | MatchOperator::Contains),
        "incompatible multi match members: {members:?}"
    );
    MatchWrapperType::MultiValueMatch
}

/// Lower and upper bound of one argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetweenMatchWrapper {
    left: MultiMatchWrapper,
    right: MultiMatchWrapper,
    grouping_eligible: bool,
    wrapper_type: MatchWrapperType,
}

impl BetweenMatchWrapper {
    /// # Panics
    /// If `left` is not a lower bound, `right` not an upper bound, or both disagree in argument, node type
    /// or instruction.
    pub fn new(left: MultiMatchWrapper, right: MultiMatchWrapper, grouping_eligible: bool) -> Self {
        assert!(left.is_lower_bound(), "left side of a between must be a lower bound: {:?}", left.members());
        assert!(right.is_upper_bound(), "right side of a between must be an upper bound: {:?}", right.members());
        assert_eq!(left.arg_name(), right.arg_name(), "between bounds must share the argument");
        assert_eq!(left.node_type(), right.node_type(), "between bounds must share the node type");
        assert_eq!(left.instruction(), right.instruction(), "between bounds must share the instruction");
        assert!(!left.instruction().is_verify(), "between cannot verify values");
        let wrapper_type = match (left.is_inclusive(), right.is_inclusive()) {
            (false, false) => MatchWrapperType::ValueGtAndLtMatch,
            (false, true) => MatchWrapperType::ValueGtAndLteMatch,
            (true, false) => MatchWrapperType::ValueGteAndLtMatch,
            (true, true) => MatchWrapperType::ValueGteAndLteMatch,
        };
        Self { left, right, grouping_eligible, wrapper_type }
    }

    pub fn left(&self) -> &MultiMatchWrapper { &self.left }

    pub fn right(&self) -> &MultiMatchWrapper { &self.right }

    pub fn members(&self) -> Vec<&MatchExpression> { self.left.members().iter().chain(self.right.members()).collect() }

    pub fn node_type(&self) -> &str { self.left.node_type() }

    pub fn arg_name(&self) -> &str { self.left.arg_name() }

    pub fn instruction(&self) -> MatchInstruction { self.left.instruction() }

    pub fn is_grouping_eligible(&self) -> bool { self.grouping_eligible }

    pub fn wrapper_type(&self) -> MatchWrapperType { self.wrapper_type }
}
