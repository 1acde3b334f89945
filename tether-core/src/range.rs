//! Range predicates and type tags for parameters.

use std::fmt::{self, Display};

use serde_json::Value;

/// A membership test over parameter values, with a tag for remote introspection.
pub trait ParamRange<T>: Send + Sync {
    /// Whether `value` lies within the range.
    fn contains(&self, value: &T) -> bool;

    /// Short textual description sent to remote peers.
    fn tag(&self) -> String;
}

/// Inclusive numeric bounds. Either side may be open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericRange<T> {
    /// Lowest accepted value, if bounded below.
    pub lower: Option<T>,
    /// Highest accepted value, if bounded above.
    pub upper: Option<T>,
}

impl<T> NumericRange<T> {
    /// Bounded on both sides.
    pub fn new(lower: T, upper: T) -> Self {
        Self {
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    /// Bounded below only.
    pub fn at_least(lower: T) -> Self {
        Self {
            lower: Some(lower),
            upper: None,
        }
    }

    /// Bounded above only.
    pub fn at_most(upper: T) -> Self {
        Self {
            lower: None,
            upper: Some(upper),
        }
    }
}

fn bound_tag<T: Display>(bound: &Option<T>) -> String {
    match bound {
        Some(b) => b.to_string(),
        None => "None".to_owned(),
    }
}

impl<T> ParamRange<T> for NumericRange<T>
where
    T: PartialOrd + Display + Send + Sync,
{
    fn contains(&self, value: &T) -> bool {
        if let Some(lower) = &self.lower
            && value < lower
        {
            return false;
        }
        if let Some(upper) = &self.upper
            && value > upper
        {
            return false;
        }
        true
    }

    fn tag(&self) -> String {
        format!("{} {}", bound_tag(&self.lower), bound_tag(&self.upper))
    }
}

/// Membership in a fixed set of labels.
#[derive(Debug, Clone, PartialEq)]
pub struct NominalRange<T> {
    labels: Vec<T>,
}

impl<T> NominalRange<T> {
    /// Accept exactly the given labels.
    pub fn new(labels: impl IntoIterator<Item = T>) -> Self {
        Self {
            labels: labels.into_iter().collect(),
        }
    }

    /// The accepted labels, in declaration order.
    pub fn labels(&self) -> &[T] {
        &self.labels
    }
}

impl<T> ParamRange<T> for NominalRange<T>
where
    T: PartialEq + Display + Send + Sync,
{
    fn contains(&self, value: &T) -> bool {
        self.labels.contains(value)
    }

    fn tag(&self) -> String {
        self.labels
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Declared wire shape of a parameter, checked against its serialized value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    /// An integer.
    Int,
    /// A floating point number.
    Float,
    /// A string.
    Str,
    /// A boolean.
    Bool,
    /// A list of any length.
    List,
    /// A list of exactly this many elements.
    ListSized(usize),
    /// An application-defined tag. Cannot be compared.
    Custom(String),
}

impl ParamType {
    /// Whether values of this type can be checked at all.
    pub fn is_comparable(&self) -> bool {
        !matches!(self, Self::Custom(_))
    }

    /// Whether `value` has this shape. Always `false` for [`ParamType::Custom`].
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Int => value.is_i64() || value.is_u64(),
            Self::Float => value.is_f64(),
            Self::Str => value.is_string(),
            Self::Bool => value.is_boolean(),
            Self::List => value.is_array(),
            Self::ListSized(n) => value.as_array().is_some_and(|a| a.len() == *n),
            Self::Custom(_) => false,
        }
    }

    /// The implied range for this type, if any. Booleans map onto `0..=1`.
    pub fn implied_range(&self) -> Option<NumericRange<i64>> {
        match self {
            Self::Bool => Some(NumericRange::new(0, 1)),
            _ => None,
        }
    }
}

impl Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => f.write_str("int"),
            Self::Float => f.write_str("float"),
            Self::Str => f.write_str("str"),
            Self::Bool => f.write_str("bool"),
            Self::List => f.write_str("list"),
            Self::ListSized(n) => write!(f, "list[{n}]"),
            Self::Custom(tag) => f.write_str(tag),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_range_is_inclusive() {
        let r = NumericRange::new(0.0, 1.0);
        assert!(r.contains(&0.0));
        assert!(r.contains(&1.0));
        assert!(!r.contains(&1.5));
        assert!(!r.contains(&-0.1));
        assert_eq!(r.tag(), "0 1");
    }

    #[test]
    fn open_bounds_render_as_none() {
        let r = NumericRange::at_least(3);
        assert!(r.contains(&1000));
        assert!(!r.contains(&2));
        assert_eq!(r.tag(), "3 None");
    }

    #[test]
    fn nominal_range_membership_and_tag() {
        let r = NominalRange::new(["sine".to_owned(), "saw".to_owned()]);
        assert!(r.contains(&"saw".to_owned()));
        assert!(!r.contains(&"square".to_owned()));
        assert_eq!(r.tag(), "sine saw");
    }

    #[test]
    fn type_tags_match_wire_shapes() {
        assert!(ParamType::Int.matches(&json!(3)));
        assert!(!ParamType::Int.matches(&json!(3.5)));
        assert!(ParamType::Float.matches(&json!(3.5)));
        assert!(ParamType::ListSized(2).matches(&json!([1, 2])));
        assert!(!ParamType::ListSized(2).matches(&json!([1])));
        assert!(!ParamType::Custom("buffer".into()).matches(&json!(1)));
        assert_eq!(ParamType::ListSized(4).to_string(), "list[4]");
        assert_eq!(ParamType::Bool.implied_range(), Some(NumericRange::new(0, 1)));
    }
}
