// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Runtime values and the static type metadata attached to expression nodes.

use std::{borrow::Cow, cmp::Ordering, collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// A runtime value flowing through an expression tree.
///
/// Values are what closed-over sub-trees evaluate to, what constants hold, and
/// what extra key parameters are made of.
///
/// # Examples
///
/// ```
/// use querykey::Value;
///
/// let ids = Value::from(vec![1, 2, 3]);
/// assert_eq!(ids, Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]));
/// assert_eq!(Value::from(Option::<i64>::None), Value::Null);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// The absent value.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    Str(String),
    /// An ordered collection.
    List(Vec<Self>),
    /// A record with named fields, kept in field-name order.
    Record(BTreeMap<String, Self>),
}

impl Value {
    /// Builds a record value from `(field, value)` pairs.
    ///
    /// # Examples
    ///
    /// ```
    /// use querykey::Value;
    ///
    /// let book = Value::record([("Title", Value::from("Dune")), ("Price", Value::from(12))]);
    /// assert_eq!(book.field("Title"), Some(&Value::from("Dune")));
    /// ```
    pub fn record<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Self)>,
        S: Into<String>,
    {
        Self::Record(fields.into_iter().map(|(name, value)| (name.into(), value)).collect())
    }

    /// Returns the named field of a record, or `None` for missing fields and non-records.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Self> {
        match self {
            Self::Record(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the boolean payload, if this is a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the string payload, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Orders two values of compatible kinds; integers and floats compare numerically.
    #[must_use]
    #[expect(clippy::cast_precision_loss, reason = "mixed int/float comparisons follow float semantics")]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Int(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            (Self::Float(a), Self::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Self::Str(a), Self::Str(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Returns a value that renders as a literal inside an expression.
    pub(crate) fn literal(&self) -> Literal<'_> {
        Literal(self)
    }
}

/// Natural textual form: strings unquoted, `Null` as the empty string, lists and
/// records in a bracketed form.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Record(fields) => {
                f.write_str("{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{name}={value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Renders a value the way a constant appears in expression text: strings are
/// quoted and escaped, floats always carry a fractional part, `Null` is `null`.
pub(crate) struct Literal<'a>(&'a Value);

impl fmt::Display for Literal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item.literal())?;
                }
                f.write_str("]")
            }
            Value::Record(fields) => {
                f.write_str("{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {}", value.literal())?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self> + Clone> From<&[T]> for Value {
    fn from(value: &[T]) -> Self {
        Self::List(value.iter().cloned().map(Into::into).collect())
    }
}

/// Static type metadata declared by every expression node.
///
/// The partial evaluator and the collection rewriter never inspect runtime
/// values to decide what to do; they ask the declared type instead.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Any value; accepts everything.
    Any,
    /// A boolean.
    Bool,
    /// A signed integer.
    Int,
    /// A floating point number.
    Float,
    /// A string.
    Str,
    /// A named record type.
    Record(Cow<'static, str>),
    /// An in-memory sequence of the element type.
    Sequence(Box<Self>),
    /// A deferred query producing elements of the element type.
    Queryable(Box<Self>),
    /// A lambda.
    Function,
}

impl ValueType {
    /// A sequence of `element`.
    #[must_use]
    pub fn sequence(element: Self) -> Self {
        Self::Sequence(Box::new(element))
    }

    /// A queryable sequence of `element`.
    #[must_use]
    pub fn queryable(element: Self) -> Self {
        Self::Queryable(Box::new(element))
    }

    /// A named record type.
    #[must_use]
    pub fn record(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Record(name.into())
    }

    /// Infers the type of a value. Lists infer their element type from the
    /// first element, records are anonymous.
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Any,
            Value::Bool(_) => Self::Bool,
            Value::Int(_) => Self::Int,
            Value::Float(_) => Self::Float,
            Value::Str(_) => Self::Str,
            Value::List(items) => Self::sequence(items.first().map_or(Self::Any, Self::of)),
            Value::Record(_) => Self::record(""),
        }
    }

    /// Returns `true` for closed "sequence of T" types, queryables included.
    #[must_use]
    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::Sequence(_) | Self::Queryable(_))
    }

    /// Returns `true` for query types, whose evaluation would run the query.
    #[must_use]
    pub fn is_queryable(&self) -> bool {
        matches!(self, Self::Queryable(_))
    }

    /// Returns `true` for types with a natural single-token textual form.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Bool | Self::Int | Self::Float | Self::Str)
    }

    /// The element type of a sequence or queryable.
    #[must_use]
    pub fn element(&self) -> Option<&Self> {
        match self {
            Self::Sequence(element) | Self::Queryable(element) => Some(element),
            _ => None,
        }
    }

    /// Returns `true` if a value declared as `source` may stand where `self` is expected.
    ///
    /// A string stands for a sequence of scalars: it is the textual summary of
    /// the elements.
    ///
    /// # Examples
    ///
    /// ```
    /// use querykey::ValueType;
    ///
    /// let ids = ValueType::sequence(ValueType::Int);
    /// assert!(ids.is_assignable_from(&ValueType::Str));
    /// assert!(!ValueType::sequence(ValueType::record("Book")).is_assignable_from(&ValueType::Str));
    /// ```
    #[must_use]
    pub fn is_assignable_from(&self, source: &Self) -> bool {
        match (self, source) {
            (Self::Any, _) => true,
            (target, source) if target == source => true,
            (Self::Float, Self::Int) => true,
            (Self::Sequence(target), Self::Sequence(source) | Self::Queryable(source)) => target.is_assignable_from(source),
            (Self::Sequence(element), Self::Str) => **element == Self::Any || element.is_scalar(),
            _ => false,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Bool => f.write_str("bool"),
            Self::Int => f.write_str("int"),
            Self::Float => f.write_str("float"),
            Self::Str => f.write_str("string"),
            Self::Record(name) => f.write_str(name),
            Self::Sequence(element) => write!(f, "seq<{element}>"),
            Self::Queryable(element) => write!(f, "query<{element}>"),
            Self::Function => f.write_str("fn"),
        }
    }
}
