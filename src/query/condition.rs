//! Named-field conditions

use std::cmp::Ordering;

use super::value::{FieldSource, FieldValue};

/// Comparison applied between a field and a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
}

impl Comparison {
    /// Parse an operator as written on the command line
    pub fn parse(op: &str) -> Option<Self> {
        let cmp = match op {
            "eq" | "=" | "==" => Comparison::Eq,
            "ne" | "!=" => Comparison::Ne,
            "gt" | ">" => Comparison::Gt,
            "lt" | "<" => Comparison::Lt,
            "ge" | ">=" => Comparison::Ge,
            "le" | "<=" => Comparison::Le,
            "contains" => Comparison::Contains,
            "not-contains" | "not_contains" => Comparison::NotContains,
            "starts-with" | "starts_with" => Comparison::StartsWith,
            "ends-with" | "ends_with" => Comparison::EndsWith,
            _ => return None,
        };
        Some(cmp)
    }
}

/// `entry[field] <op> value`
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    field: String,
    op: Comparison,
    value: FieldValue,
}

impl Condition {
    pub fn new(field: impl Into<String>, op: Comparison, value: impl Into<FieldValue>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, Comparison::Eq, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, Comparison::Ne, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, Comparison::Gt, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, Comparison::Lt, value)
    }

    pub fn ge(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, Comparison::Ge, value)
    }

    pub fn le(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, Comparison::Le, value)
    }

    pub fn contains(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, Comparison::Contains, value)
    }

    pub fn not_contains(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, Comparison::NotContains, value)
    }

    pub fn starts_with(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, Comparison::StartsWith, value)
    }

    pub fn ends_with(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, Comparison::EndsWith, value)
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn op(&self) -> Comparison {
        self.op
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    /// Evaluate against an entry.
    ///
    /// A missing field, or values of kinds that do not compare, only satisfy
    /// the negated comparisons (`Ne`, `NotContains`). The substring
    /// comparisons only look at text.
    pub fn matches<S: FieldSource + ?Sized>(&self, source: &S) -> bool {
        let actual = match source.field(&self.field) {
            Some(actual) => actual,
            None => return matches!(self.op, Comparison::Ne | Comparison::NotContains),
        };

        let ordering = actual.partial_cmp(&self.value);
        match self.op {
            Comparison::Eq => ordering == Some(Ordering::Equal),
            Comparison::Ne => ordering != Some(Ordering::Equal),
            Comparison::Gt => ordering == Some(Ordering::Greater),
            Comparison::Lt => ordering == Some(Ordering::Less),
            Comparison::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            Comparison::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
            Comparison::Contains => text_pair(&actual, &self.value).is_some_and(|(a, b)| a.contains(b)),
            Comparison::NotContains => !text_pair(&actual, &self.value).is_some_and(|(a, b)| a.contains(b)),
            Comparison::StartsWith => text_pair(&actual, &self.value).is_some_and(|(a, b)| a.starts_with(b)),
            Comparison::EndsWith => text_pair(&actual, &self.value).is_some_and(|(a, b)| a.ends_with(b)),
        }
    }
}

fn text_pair<'a>(actual: &'a FieldValue, expected: &'a FieldValue) -> Option<(&'a str, &'a str)> {
    Some((actual.as_text()?, expected.as_text()?))
}
