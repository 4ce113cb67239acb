use crate::error::ExpressionError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CoreExpression {
    Match(MatchExpression),
    Negation(NegationExpression),
    Combined(CombinedExpression),
    SpecialSet(SpecialSetType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MatchOperator {
    Equals,      // =
    LessThan,    // <
    GreaterThan, // >
    Contains,    // CONTAINS
    IsUnknown,   // IS UNKNOWN
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Operand {
    Value(String),
    /// Name of another argument (`@name` in Audlang)
    Reference(String),
}

/// A single comparison of an argument against a value, another argument, or nothing (`IS UNKNOWN`).
///
/// Deserialization runs the same checks as [`MatchExpression::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawMatchExpression")]
pub struct MatchExpression {
    arg_name: String,
    operator: MatchOperator,
    operand: Option<Operand>,
}

#[derive(Deserialize)]
struct RawMatchExpression {
    arg_name: String,
    operator: MatchOperator,
    operand: Option<Operand>,
}

impl TryFrom<RawMatchExpression> for MatchExpression {
    type Error = ExpressionError;

    fn try_from(raw: RawMatchExpression) -> Result<Self, Self::Error> { MatchExpression::new(raw.arg_name, raw.operator, raw.operand) }
}

/// `NOT <match>`; a strict negation additionally requires the argument(s) to be known.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NegationExpression {
    pub delegate: MatchExpression,
    pub strict: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CombiType {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CombinedExpression {
    combi_type: CombiType,
    members: Vec<CoreExpression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpecialSetType {
    All,
    None,
}

impl MatchOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            MatchOperator::Equals => "=",
            MatchOperator::LessThan => "<",
            MatchOperator::GreaterThan => ">",
            MatchOperator::Contains => "CONTAINS",
            MatchOperator::IsUnknown => "IS UNKNOWN",
        }
    }
}

impl CombiType {
    pub fn switched(&self) -> CombiType {
        match self {
            CombiType::And => CombiType::Or,
            CombiType::Or => CombiType::And,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            CombiType::And => "AND",
            CombiType::Or => "OR",
        }
    }
}

impl MatchExpression {
    /// Creates a match after checking the operator/operand combination.
    pub fn new(arg_name: impl Into<String>, operator: MatchOperator, operand: Option<Operand>) -> Result<Self, ExpressionError> {
        let arg_name = arg_name.into();
        if arg_name.trim().is_empty() {
            return Err(ExpressionError::EmptyArgName);
        }
        match (&operator, &operand) {
            (MatchOperator::IsUnknown, None) => {}
            (MatchOperator::IsUnknown, Some(_)) => return Err(ExpressionError::UnexpectedOperand { arg_name }),
            (_, None) => return Err(ExpressionError::MissingOperand { arg_name, operator }),
            (MatchOperator::Contains, Some(Operand::Reference(_))) => {
                return Err(ExpressionError::ReferenceNotAllowed { arg_name, operator });
            }
            (_, Some(Operand::Reference(ref_name))) if ref_name.trim().is_empty() => return Err(ExpressionError::EmptyArgName),
            _ => {}
        }
        Ok(Self { arg_name, operator, operand })
    }

    fn value_match(arg_name: impl Into<String>, operator: MatchOperator, value: impl Into<String>) -> Self {
        Self { arg_name: arg_name.into(), operator, operand: Some(Operand::Value(value.into())) }
    }

    fn reference_match(arg_name: impl Into<String>, operator: MatchOperator, ref_arg_name: impl Into<String>) -> Self {
        Self { arg_name: arg_name.into(), operator, operand: Some(Operand::Reference(ref_arg_name.into())) }
    }

    pub fn equals(arg_name: impl Into<String>, value: impl Into<String>) -> Self { Self::value_match(arg_name, MatchOperator::Equals, value) }

    pub fn less_than(arg_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::value_match(arg_name, MatchOperator::LessThan, value)
    }

    pub fn greater_than(arg_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::value_match(arg_name, MatchOperator::GreaterThan, value)
    }

    pub fn contains(arg_name: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self::value_match(arg_name, MatchOperator::Contains, snippet)
    }

    pub fn is_unknown(arg_name: impl Into<String>) -> Self { Self { arg_name: arg_name.into(), operator: MatchOperator::IsUnknown, operand: None } }

    pub fn ref_equals(arg_name: impl Into<String>, ref_arg_name: impl Into<String>) -> Self {
        Self::reference_match(arg_name, MatchOperator::Equals, ref_arg_name)
    }

    pub fn ref_less_than(arg_name: impl Into<String>, ref_arg_name: impl Into<String>) -> Self {
        Self::reference_match(arg_name, MatchOperator::LessThan, ref_arg_name)
    }

    pub fn ref_greater_than(arg_name: impl Into<String>, ref_arg_name: impl Into<String>) -> Self {
        Self::reference_match(arg_name, MatchOperator::GreaterThan, ref_arg_name)
    }

    pub fn arg_name(&self) -> &str { &self.arg_name }

    pub fn operator(&self) -> MatchOperator { self.operator }

    pub fn operand(&self) -> Option<&Operand> { self.operand.as_ref() }

    /// The compared value, `None` for reference matches and `IS UNKNOWN`.
    pub fn value(&self) -> Option<&str> {
        match &self.operand {
            Some(Operand::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// The referenced argument of a field-to-field comparison.
    pub fn referenced_arg_name(&self) -> Option<&str> {
        match &self.operand {
            Some(Operand::Reference(name)) => Some(name),
            _ => None,
        }
    }

    pub fn is_reference_match(&self) -> bool { matches!(self.operand, Some(Operand::Reference(_))) }

    /// Copy of this match with the given value (same argument and operator).
    pub fn with_value(&self, value: impl Into<String>) -> Self { Self::value_match(self.arg_name.clone(), self.operator, value) }

    /// Argument names involved in this match, left side first.
    pub fn arg_names(&self) -> Vec<&str> {
        match self.referenced_arg_name() {
            Some(ref_name) => vec![self.arg_name.as_str(), ref_name],
            None => vec![self.arg_name.as_str()],
        }
    }
}

impl NegationExpression {
    pub fn new(delegate: MatchExpression) -> Self { Self { delegate, strict: false } }

    pub fn strict(delegate: MatchExpression) -> Self { Self { delegate, strict: true } }
}

impl CombinedExpression {
    pub fn combi_type(&self) -> CombiType { self.combi_type }

    pub fn members(&self) -> &[CoreExpression] { &self.members }

    pub fn into_members(self) -> Vec<CoreExpression> { self.members }
}

impl CoreExpression {
    pub fn all() -> Self { CoreExpression::SpecialSet(SpecialSetType::All) }

    pub fn none() -> Self { CoreExpression::SpecialSet(SpecialSetType::None) }

    pub fn and(members: Vec<CoreExpression>) -> Self { Self::combine(CombiType::And, members) }

    pub fn or(members: Vec<CoreExpression>) -> Self { Self::combine(CombiType::Or, members) }

    pub fn not(delegate: MatchExpression) -> Self { CoreExpression::Negation(NegationExpression::new(delegate)) }

    pub fn strict_not(delegate: MatchExpression) -> Self { CoreExpression::Negation(NegationExpression::strict(delegate)) }

    /// Combines the members, flattening nested combinations of the same type, absorbing special sets and
    /// dropping duplicates while keeping the first occurrence. A single remaining member is returned as is.
    pub fn combine(combi_type: CombiType, members: Vec<CoreExpression>) -> Self {
        let (neutral, absorbing) = match combi_type {
            CombiType::And => (SpecialSetType::All, SpecialSetType::None),
            CombiType::Or => (SpecialSetType::None, SpecialSetType::All),
        };

        let mut flat: Vec<CoreExpression> = Vec::with_capacity(members.len());
        for member in members {
            match member {
                CoreExpression::SpecialSet(set) if set == absorbing => return CoreExpression::SpecialSet(absorbing),
                CoreExpression::SpecialSet(set) if set == neutral => {}
                CoreExpression::Combined(inner) if inner.combi_type == combi_type => {
                    for nested in inner.members {
                        if !flat.contains(&nested) {
                            flat.push(nested);
                        }
                    }
                }
                other => {
                    if !flat.contains(&other) {
                        flat.push(other);
                    }
                }
            }
        }

        match flat.len() {
            0 => CoreExpression::SpecialSet(neutral),
            1 => flat.remove(0),
            _ => CoreExpression::Combined(CombinedExpression { combi_type, members: flat }),
        }
    }

    /// Rebuilds the tree through [`CoreExpression::combine`], so special sets only remain at the root and
    /// nested combinations of the same type are flattened.
    pub fn normalized(&self) -> CoreExpression {
        match self {
            CoreExpression::Combined(combined) => {
                let members = combined.members.iter().map(|member| member.normalized()).collect();
                let result = Self::combine(combined.combi_type, members);
                tracing::trace!("normalized {} -> {}", self, result);
                result
            }
            other => other.clone(),
        }
    }

    pub fn is_special_set(&self) -> bool { matches!(self, CoreExpression::SpecialSet(_)) }

    /// Collects all argument names in order of first appearance.
    pub fn arg_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_arg_names(&mut names);
        names
    }

    fn collect_arg_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        let push_all = |names: &mut Vec<&'a str>, m: &'a MatchExpression| {
            for name in m.arg_names() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        };
        match self {
            CoreExpression::Match(m) => push_all(names, m),
            CoreExpression::Negation(n) => push_all(names, &n.delegate),
            CoreExpression::Combined(c) => c.members.iter().for_each(|member| member.collect_arg_names(names)),
            CoreExpression::SpecialSet(_) => {}
        }
    }
}

impl From<MatchExpression> for CoreExpression {
    fn from(value: MatchExpression) -> Self { CoreExpression::Match(value) }
}

impl From<NegationExpression> for CoreExpression {
    fn from(value: NegationExpression) -> Self { CoreExpression::Negation(value) }
}
