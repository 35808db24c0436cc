// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The expression tree queries are built from.
//!
//! The node set is closed: [`Expr`] lists every kind the key derivation needs to
//! reason about. Each node answers [`Expr::ty`] from static metadata, which is
//! all the partial evaluator and the collection rewriter look at when deciding
//! what to fold or summarize.
//!
//! The [`Display`](std::fmt::Display) implementation is the canonical printer
//! used for keys: structurally equal trees holding equal constants always render
//! to the same text.

use std::{fmt, sync::Arc};

use crate::{EvaluationFailure, Value, ValueType};

type CaptureFn = dyn Fn() -> Result<Value, EvaluationFailure> + Send + Sync;
type MethodFn = dyn Fn(Option<&Value>, &[Value]) -> Result<Value, EvaluationFailure> + Send + Sync;

/// The bound variable of a lambda: "the current item".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parameter {
    name: Arc<str>,
    ty: ValueType,
}

impl Parameter {
    /// Declares a parameter named `name` of type `ty`.
    pub fn new(name: impl Into<Arc<str>>, ty: ValueType) -> Self {
        Self { name: name.into(), ty }
    }

    /// The parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type.
    #[must_use]
    pub fn ty(&self) -> &ValueType {
        &self.ty
    }

    /// A reference to this parameter as an expression.
    #[must_use]
    pub fn expr(&self) -> Expr {
        Expr::Parameter(self.clone())
    }

    /// Field access on this parameter, e.g. `x.Category`.
    #[must_use]
    pub fn field(&self, name: impl Into<Arc<str>>, ty: ValueType) -> Expr {
        self.expr().field(name, ty)
    }
}

/// A single-parameter lambda used as a predicate or a projection.
#[derive(Clone, Debug)]
pub struct Lambda {
    param: Parameter,
    body: Box<Expr>,
}

impl Lambda {
    /// Creates `param => body`.
    #[must_use]
    pub fn new(param: Parameter, body: Expr) -> Self {
        Self {
            param,
            body: Box::new(body),
        }
    }

    /// The bound parameter.
    #[must_use]
    pub fn param(&self) -> &Parameter {
        &self.param
    }

    /// The lambda body.
    #[must_use]
    pub fn body(&self) -> &Expr {
        &self.body
    }
}

/// A value captured from the enclosing scope, read on demand.
///
/// Reading may fail, e.g. when the captured resource is no longer available.
#[derive(Clone)]
pub struct Captured {
    name: Arc<str>,
    ty: ValueType,
    read: Arc<CaptureFn>,
}

impl Captured {
    /// The capture name, used when the capture is rendered unevaluated.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads the captured value.
    ///
    /// # Errors
    ///
    /// Returns whatever the capture's reader returns.
    pub fn read(&self) -> Result<Value, EvaluationFailure> {
        (self.read)()
    }
}

impl fmt::Debug for Captured {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Captured").field("name", &self.name).field("ty", &self.ty).finish_non_exhaustive()
    }
}

/// Query operators recognized by query sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryOperator {
    /// Keeps the rows for which the predicate holds.
    Where,
    /// Projects each row through the selector.
    Select,
}

/// Metadata and implementation of an operation invoked by a [`Expr::MethodCall`].
///
/// # Examples
///
/// ```
/// use querykey::{Method, Value, ValueType};
///
/// let double = Method::new("Double", vec![ValueType::Int], ValueType::Int, |_, args| {
///     Ok(match &args[0] {
///         Value::Int(i) => Value::Int(i * 2),
///         other => other.clone(),
///     })
/// });
/// assert_eq!(double.name(), "Double");
/// ```
#[derive(Clone)]
pub struct Method {
    name: Arc<str>,
    params: Arc<[ValueType]>,
    returns: ValueType,
    operator: Option<QueryOperator>,
    body: Arc<MethodFn>,
}

impl Method {
    /// Declares a method with its parameter types, return type and implementation.
    ///
    /// The implementation receives the evaluated instance (if the call has one)
    /// and the evaluated arguments.
    pub fn new<F>(name: impl Into<Arc<str>>, params: Vec<ValueType>, returns: ValueType, body: F) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Value, EvaluationFailure> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            params: params.into(),
            returns,
            operator: None,
            body: Arc::new(body),
        }
    }

    /// `Contains(seq<element>, element) -> bool`: sequence membership.
    #[must_use]
    pub fn contains(element: ValueType) -> Self {
        Self::new(
            "Contains",
            vec![ValueType::sequence(element.clone()), element],
            ValueType::Bool,
            |_, args| match args {
                [Value::List(items), needle] => Ok(Value::Bool(items.contains(needle))),
                [Value::Null, _] => Ok(Value::Bool(false)),
                _ => Err(EvaluationFailure::new("Contains")),
            },
        )
    }

    /// `string.StartsWith(string) -> bool`.
    #[must_use]
    pub fn starts_with() -> Self {
        Self::new("StartsWith", vec![ValueType::Str], ValueType::Bool, |instance, args| match (instance, args) {
            (Some(Value::Str(s)), [Value::Str(prefix)]) => Ok(Value::Bool(s.starts_with(prefix.as_str()))),
            _ => Err(EvaluationFailure::new("StartsWith")),
        })
    }

    /// `string.ToLower() -> string`.
    #[must_use]
    pub fn to_lowercase() -> Self {
        Self::new("ToLower", Vec::new(), ValueType::Str, |instance, _| match instance {
            Some(Value::Str(s)) => Ok(Value::Str(s.to_lowercase())),
            _ => Err(EvaluationFailure::new("ToLower")),
        })
    }

    /// `Length(value) -> int`: characters of a string or elements of a list.
    #[must_use]
    pub fn len() -> Self {
        Self::new("Length", vec![ValueType::Any], ValueType::Int, |_, args| match args {
            [Value::Str(s)] => Ok(Value::Int(i64::try_from(s.chars().count()).unwrap_or(i64::MAX))),
            [Value::List(items)] => Ok(Value::Int(i64::try_from(items.len()).unwrap_or(i64::MAX))),
            _ => Err(EvaluationFailure::new("Length")),
        })
    }

    /// `Where(query<row>, predicate) -> query<row>`.
    #[must_use]
    pub fn where_(row: ValueType) -> Self {
        let query = ValueType::queryable(row);
        Self::query_operator("Where", QueryOperator::Where, vec![query.clone(), ValueType::Function], query)
    }

    /// `Select(query<row>, selector) -> query<output>`.
    #[must_use]
    pub fn select(row: ValueType, output: ValueType) -> Self {
        Self::query_operator(
            "Select",
            QueryOperator::Select,
            vec![ValueType::queryable(row), ValueType::Function],
            ValueType::queryable(output),
        )
    }

    fn query_operator(name: &'static str, operator: QueryOperator, params: Vec<ValueType>, returns: ValueType) -> Self {
        Self {
            name: name.into(),
            params: params.into(),
            returns,
            operator: Some(operator),
            body: Arc::new(move |_: Option<&Value>, _: &[Value]| Err(EvaluationFailure::new(name))),
        }
    }

    /// The method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter types, excluding the instance.
    #[must_use]
    pub fn params(&self) -> &[ValueType] {
        &self.params
    }

    /// Declared return type.
    #[must_use]
    pub fn returns(&self) -> &ValueType {
        &self.returns
    }

    /// The query operator this method stands for, if any.
    #[must_use]
    pub fn operator(&self) -> Option<QueryOperator> {
        self.operator
    }

    /// Invokes the implementation.
    ///
    /// # Errors
    ///
    /// Returns whatever the implementation returns.
    pub fn invoke(&self, instance: Option<&Value>, args: &[Value]) -> Result<Value, EvaluationFailure> {
        (self.body)(instance, args)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    /// Logical negation.
    Not,
    /// Arithmetic negation.
    Negate,
}

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `&&`
    And,
    /// `||`
    Or,
    /// `+`, also string concatenation
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
}

impl BinaryOp {
    /// The operator token used when rendering.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "&&",
            Self::Or => "||",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
        }
    }

    fn result_type(self, left: &ValueType, right: &ValueType) -> ValueType {
        match self {
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge | Self::And | Self::Or => ValueType::Bool,
            Self::Add if *left == ValueType::Str || *right == ValueType::Str => ValueType::Str,
            _ => match (left, right) {
                (ValueType::Int, ValueType::Int) => ValueType::Int,
                (ValueType::Float | ValueType::Int, ValueType::Float | ValueType::Int) => ValueType::Float,
                _ => ValueType::Any,
            },
        }
    }
}

/// An immutable expression tree node.
#[derive(Clone, Debug)]
pub enum Expr {
    /// The bound variable of the enclosing lambda.
    Parameter(Parameter),
    /// A literal value with its declared type.
    Constant {
        /// The literal.
        value: Value,
        /// Declared type.
        ty: ValueType,
    },
    /// A value captured from the enclosing scope.
    Captured(Captured),
    /// The root of a query: a named data source.
    Source {
        /// Source name.
        name: Arc<str>,
        /// Declared type, a queryable.
        ty: ValueType,
    },
    /// A method invoked on an optional instance with arguments.
    MethodCall {
        /// Invoked method.
        method: Method,
        /// Receiver, `None` for static calls.
        instance: Option<Box<Self>>,
        /// Arguments, matched positionally with [`Method::params`].
        args: Vec<Self>,
    },
    /// A unary operation.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Self>,
    },
    /// A binary operation.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Self>,
        /// Right operand.
        right: Box<Self>,
    },
    /// Field access on a record.
    Member {
        /// Accessed record.
        target: Box<Self>,
        /// Field name.
        field: Arc<str>,
        /// Declared field type.
        ty: ValueType,
    },
    /// A lambda.
    Lambda(Lambda),
}

impl Expr {
    /// A constant whose type is inferred from the value.
    pub fn constant(value: impl Into<Value>) -> Self {
        let value = value.into();
        let ty = ValueType::of(&value);
        Self::Constant { value, ty }
    }

    /// A constant with an explicit declared type.
    pub fn typed_constant(value: impl Into<Value>, ty: ValueType) -> Self {
        Self::Constant { value: value.into(), ty }
    }

    /// A captured value read through `read` when the tree is evaluated.
    pub fn captured<F>(name: impl Into<Arc<str>>, ty: ValueType, read: F) -> Self
    where
        F: Fn() -> Result<Value, EvaluationFailure> + Send + Sync + 'static,
    {
        Self::Captured(Captured {
            name: name.into(),
            ty,
            read: Arc::new(read),
        })
    }

    /// A captured value that is already known.
    pub fn captured_value(name: impl Into<Arc<str>>, value: impl Into<Value>) -> Self {
        let value = value.into();
        let ty = ValueType::of(&value);
        Self::captured(name, ty, move || Ok(value.clone()))
    }

    /// A named query source producing rows of `row`.
    pub fn source(name: impl Into<Arc<str>>, row: ValueType) -> Self {
        Self::Source {
            name: name.into(),
            ty: ValueType::queryable(row),
        }
    }

    /// A static method call.
    #[must_use]
    pub fn call(method: Method, args: Vec<Self>) -> Self {
        Self::MethodCall {
            method,
            instance: None,
            args,
        }
    }

    /// A method call on `self`.
    #[must_use]
    pub fn call_on(self, method: Method, args: Vec<Self>) -> Self {
        Self::MethodCall {
            method,
            instance: Some(Box::new(self)),
            args,
        }
    }

    /// A binary operation.
    #[must_use]
    pub fn binary(op: BinaryOp, left: Self, right: Self) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// A unary operation.
    #[must_use]
    pub fn unary(op: UnaryOp, operand: Self) -> Self {
        Self::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// `self == other`
    #[must_use]
    pub fn equals(self, other: Self) -> Self {
        Self::binary(BinaryOp::Eq, self, other)
    }

    /// `self > other`
    #[must_use]
    pub fn greater_than(self, other: Self) -> Self {
        Self::binary(BinaryOp::Gt, self, other)
    }

    /// `self < other`
    #[must_use]
    pub fn less_than(self, other: Self) -> Self {
        Self::binary(BinaryOp::Lt, self, other)
    }

    /// `self && other`
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::binary(BinaryOp::And, self, other)
    }

    /// `self + other`
    #[must_use]
    pub fn plus(self, other: Self) -> Self {
        Self::binary(BinaryOp::Add, self, other)
    }

    /// `!self`
    #[must_use]
    pub fn logical_not(self) -> Self {
        Self::unary(UnaryOp::Not, self)
    }

    /// Field access `self.name`.
    #[must_use]
    pub fn field(self, name: impl Into<Arc<str>>, ty: ValueType) -> Self {
        Self::Member {
            target: Box::new(self),
            field: name.into(),
            ty,
        }
    }

    /// The declared type of the value this node produces.
    #[must_use]
    pub fn ty(&self) -> ValueType {
        match self {
            Self::Parameter(param) => param.ty.clone(),
            Self::Constant { ty, .. } | Self::Source { ty, .. } | Self::Member { ty, .. } => ty.clone(),
            Self::Captured(captured) => captured.ty.clone(),
            Self::MethodCall { method, .. } => method.returns.clone(),
            Self::Unary { op: UnaryOp::Not, .. } => ValueType::Bool,
            Self::Unary { op: UnaryOp::Negate, operand } => operand.ty(),
            Self::Binary { op, left, right } => op.result_type(&left.ty(), &right.ty()),
            Self::Lambda(_) => ValueType::Function,
        }
    }

    /// Direct children in a fixed order: instance before arguments, left before right.
    #[must_use]
    pub fn children(&self) -> Vec<&Self> {
        match self {
            Self::Parameter(_) | Self::Constant { .. } | Self::Captured(_) | Self::Source { .. } => Vec::new(),
            Self::MethodCall { instance, args, .. } => instance.as_deref().into_iter().chain(args).collect(),
            Self::Unary { operand, .. } => vec![operand.as_ref()],
            Self::Binary { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Self::Member { target, .. } => vec![target.as_ref()],
            Self::Lambda(lambda) => vec![lambda.body.as_ref()],
        }
    }

    /// Rebuilds this node with every child replaced by `f(index, child)`, using
    /// the order of [`Expr::children`]. Leaves are cloned.
    pub(crate) fn map_children<E>(&self, mut f: impl FnMut(usize, &Self) -> Result<Self, E>) -> Result<Self, E> {
        Ok(match self {
            Self::Parameter(_) | Self::Constant { .. } | Self::Captured(_) | Self::Source { .. } => self.clone(),
            Self::MethodCall { method, instance, args } => {
                let offset = usize::from(instance.is_some());
                let instance = instance.as_deref().map(|i| f(0, i)).transpose()?.map(Box::new);
                let args = args
                    .iter()
                    .enumerate()
                    .map(|(i, arg)| f(i + offset, arg))
                    .collect::<Result<Vec<_>, E>>()?;
                Self::MethodCall {
                    method: method.clone(),
                    instance,
                    args,
                }
            }
            Self::Unary { op, operand } => Self::unary(*op, f(0, operand.as_ref())?),
            Self::Binary { op, left, right } => {
                let left = f(0, left.as_ref())?;
                Self::binary(*op, left, f(1, right.as_ref())?)
            }
            Self::Member { target, field, ty } => Self::Member {
                target: Box::new(f(0, target.as_ref())?),
                field: Arc::clone(field),
                ty: ty.clone(),
            },
            Self::Lambda(lambda) => Self::Lambda(Lambda::new(lambda.param.clone(), f(0, lambda.body.as_ref())?)),
        })
    }
}

impl From<Lambda> for Expr {
    fn from(lambda: Lambda) -> Self {
        Self::Lambda(lambda)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parameter(param) => f.write_str(&param.name),
            Self::Constant { value, .. } => write!(f, "{}", value.literal()),
            Self::Captured(captured) => write!(f, "value({})", captured.name),
            Self::Source { name, .. } => write!(f, "source({name})"),
            Self::MethodCall { method, instance, args } => {
                if let Some(instance) = instance {
                    write!(f, "{instance}.")?;
                }
                write!(f, "{}(", method.name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Self::Unary { op: UnaryOp::Not, operand } => write!(f, "!({operand})"),
            Self::Unary { op: UnaryOp::Negate, operand } => write!(f, "-({operand})"),
            Self::Binary { op, left, right } => write!(f, "({left} {} {right})", op.symbol()),
            Self::Member { target, field, .. } => write!(f, "{target}.{field}"),
            Self::Lambda(lambda) => write!(f, "{} => {}", lambda.param.name, lambda.body),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn book() -> Parameter {
        Parameter::new("x", ValueType::record("Book"))
    }

    #[test]
    fn renders_predicate() {
        let x = book();
        let predicate = Lambda::new(x.clone(), x.field("Category", ValueType::Str).equals(Expr::constant("Books")));
        assert_eq!(Expr::from(predicate).to_string(), r#"x => (x.Category == "Books")"#);
    }

    #[test]
    fn renders_static_and_instance_calls() {
        let x = book();
        let contains = Expr::call(
            Method::contains(ValueType::Int),
            vec![Expr::constant(vec![1, 2]), x.field("Id", ValueType::Int)],
        );
        assert_eq!(contains.to_string(), "Contains([1, 2], x.Id)");

        let starts = x.field("Title", ValueType::Str).call_on(Method::starts_with(), vec![Expr::constant("D")]);
        assert_eq!(starts.to_string(), r#"x.Title.StartsWith("D")"#);
    }

    #[test]
    fn renders_captures_and_sources() {
        assert_eq!(Expr::captured_value("limit", 5).to_string(), "value(limit)");
        assert_eq!(Expr::source("books", ValueType::record("Book")).to_string(), "source(books)");
    }

    #[test]
    fn type_of_comparison_is_bool() {
        let x = book();
        let expr = x.field("Price", ValueType::Int).greater_than(Expr::constant(3));
        assert_eq!(expr.ty(), ValueType::Bool);
    }

    #[test]
    fn type_of_arithmetic_widens() {
        assert_eq!(Expr::constant(1).plus(Expr::constant(2)).ty(), ValueType::Int);
        assert_eq!(Expr::constant(1).plus(Expr::constant(2.5)).ty(), ValueType::Float);
        assert_eq!(Expr::constant("a").plus(Expr::constant(1)).ty(), ValueType::Str);
    }

    #[test]
    fn source_is_queryable() {
        let source = Expr::source("books", ValueType::record("Book"));
        assert!(source.ty().is_queryable());
    }

    #[test]
    fn children_put_instance_first() {
        let call = Expr::constant("abc").call_on(Method::starts_with(), vec![Expr::constant("a")]);
        let rendered: Vec<String> = call.children().iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec![r#""abc""#.to_string(), r#""a""#.to_string()]);
    }

    #[test]
    fn map_children_preserves_order() {
        let expr = Expr::constant(1).plus(Expr::constant(2));
        let mapped = expr
            .map_children(|i, _| Ok::<_, ()>(Expr::constant(i64::try_from(i).unwrap_or_default() * 10)))
            .expect("mapping cannot fail");
        assert_eq!(mapped.to_string(), "(0 + 10)");
    }

    #[test]
    fn query_operators_are_tagged() {
        assert_eq!(Method::where_(ValueType::Int).operator(), Some(QueryOperator::Where));
        assert_eq!(Method::contains(ValueType::Int).operator(), None);
    }
}
