//! Filter criteria
//!
//! One criteria is a `(field, function, value)` unit of a filter expression.
//! An expression is an ordered sequence of criteria with implicit AND
//! semantics; there is no OR or grouping.

/// The closed set of filter functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriteriaFunction {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    NotLike,
    In,
    NotIn,
    Between,
}

impl CriteriaFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CriteriaFunction::Eq => "eq",
            CriteriaFunction::Lt => "lt",
            CriteriaFunction::Le => "le",
            CriteriaFunction::Gt => "gt",
            CriteriaFunction::Ge => "ge",
            CriteriaFunction::Like => "like",
            CriteriaFunction::NotLike => "notlike",
            CriteriaFunction::In => "in",
            CriteriaFunction::NotIn => "notin",
            CriteriaFunction::Between => "between",
        }
    }

    /// Whether the function takes a parenthesized value list
    pub fn takes_list(&self) -> bool {
        matches!(
            self,
            CriteriaFunction::In | CriteriaFunction::NotIn | CriteriaFunction::Between
        )
    }
}

/// One unit of a filter expression.
///
/// `value` is the raw literal text; list-valued functions carry a
/// comma-delimited list. Coercion to the field's declared type happens at
/// predicate-build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criteria {
    pub field: String,
    pub function: CriteriaFunction,
    pub value: String,
}

impl Criteria {
    pub fn new(
        field: impl Into<String>,
        function: CriteriaFunction,
        value: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            function,
            value: value.into(),
        }
    }
}
