//! Attribute queries over features
//!
//! A small where-clause model: field comparisons combined with AND.
//! `Display` renders the SQL-like text used in log messages, e.g.
//! `gridcode = 2 AND Shape_Area > 1000`.

use super::{AttributeValue, Feature};
use std::fmt;

/// Attribute predicate evaluated against a single feature
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(String, AttributeValue),
    Gt(String, f64),
    /// Field equals any of the values
    In(String, Vec<AttributeValue>),
    IsNull(String),
    And(Box<Predicate>, Box<Predicate>),
}

impl Predicate {
    pub fn equals(field: &str, value: impl Into<AttributeValue>) -> Self {
        Predicate::Eq(field.to_string(), value.into())
    }

    pub fn gt(field: &str, value: f64) -> Self {
        Predicate::Gt(field.to_string(), value)
    }

    pub fn is_in<V: Into<AttributeValue>>(field: &str, values: impl IntoIterator<Item = V>) -> Self {
        Predicate::In(field.to_string(), values.into_iter().map(Into::into).collect())
    }

    pub fn is_null(field: &str) -> Self {
        Predicate::IsNull(field.to_string())
    }

    pub fn and(self, other: Predicate) -> Self {
        Predicate::And(Box::new(self), Box::new(other))
    }

    /// Evaluate against a feature. Missing fields compare as null, which
    /// never satisfies a comparison.
    pub fn matches(&self, feature: &Feature) -> bool {
        match self {
            Predicate::Eq(field, value) => feature
                .get_property(field)
                .map_or(false, |v| values_equal(v, value)),
            Predicate::Gt(field, bound) => feature
                .get_property(field)
                .and_then(AttributeValue::as_f64)
                .map_or(false, |v| v > *bound),
            Predicate::In(field, values) => feature
                .get_property(field)
                .map_or(false, |v| values.iter().any(|candidate| values_equal(v, candidate))),
            Predicate::IsNull(field) => feature.is_null(field),
            Predicate::And(a, b) => a.matches(feature) && b.matches(feature),
        }
    }
}

fn values_equal(a: &AttributeValue, b: &AttributeValue) -> bool {
    if a.is_null() || b.is_null() {
        return false;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Eq(field, value) => write!(f, "{} = {}", field, value),
            Predicate::Gt(field, value) => write!(f, "{} > {}", field, value),
            Predicate::In(field, values) => {
                let list: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "{} IN ({})", field, list.join(", "))
            }
            Predicate::IsNull(field) => write!(f, "{} IS NULL", field),
            Predicate::And(a, b) => write!(f, "{} AND {}", a, b),
        }
    }
}
