//! Renders expressions in Audlang core notation, e.g. `(age > 18 OR age = 18) AND STRICT NOT color = @taste`.

use crate::ast::{CombinedExpression, CoreExpression, MatchExpression, MatchOperator, NegationExpression, Operand, SpecialSetType};
use std::fmt::{self, Display};

/// Quotes a value unless it is a plain word
fn write_value(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    let plain = !value.is_empty() && value.chars().all(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | ':'));
    if plain {
        return f.write_str(value);
    }
    f.write_str("\"")?;
    for c in value.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            _ => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

impl Display for MatchExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.arg_name(), self.operator().symbol())?;
        match self.operand() {
            Some(Operand::Value(value)) => {
                f.write_str(" ")?;
                write_value(f, value)
            }
            Some(Operand::Reference(ref_arg_name)) => write!(f, " @{ref_arg_name}"),
            None => Ok(()),
        }
    }
}

impl Display for NegationExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let strict = self.strict && self.delegate.operator() != MatchOperator::IsUnknown;
        if strict {
            write!(f, "STRICT NOT {}", self.delegate)
        } else {
            write!(f, "NOT {}", self.delegate)
        }
    }
}

impl Display for CombinedExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, member) in self.members().iter().enumerate() {
            if i > 0 {
                write!(f, " {} ", self.combi_type().keyword())?;
            }
            write!(f, "{member}")?;
        }
        f.write_str(")")
    }
}

impl Display for CoreExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreExpression::Match(m) => m.fmt(f),
            CoreExpression::Negation(n) => n.fmt(f),
            CoreExpression::Combined(c) => c.fmt(f),
            CoreExpression::SpecialSet(SpecialSetType::All) => f.write_str("<ALL>"),
            CoreExpression::SpecialSet(SpecialSetType::None) => f.write_str("<NONE>"),
        }
    }
}
