//! Field-level validation failures.

use serde_json::Value;
use std::fmt::{Display, Formatter};

/// Field name used when the input itself is not an object.
pub const ROOT_FIELD: &str = "<root>";

/// Why a single field was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldIssue {
    /// Required field absent or `null`.
    Missing,
    /// JSON type differs from the expected one.
    WrongType(&'static str),
    /// String value is not one of the declared enum members.
    NotOneOf(Vec<&'static str>),
    /// Value has the right type but breaks a field rule.
    Invalid(String),
    /// Input must be a JSON object.
    NotAnObject,
}

/// One rejected field, with the offending value when there was one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub value: Option<Value>,
    pub issue: FieldIssue,
}

impl FieldError {
    pub fn new(field: impl Into<String>, value: Option<Value>, issue: FieldIssue) -> Self {
        Self {
            field: field.into(),
            value,
            issue,
        }
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let field = self.field.as_str();
        match &self.issue {
            FieldIssue::Missing => write!(f, "`{field}` is required"),
            FieldIssue::WrongType(expected) => write!(f, "`{field}` must be a {expected}"),
            FieldIssue::NotOneOf(allowed) => {
                write!(f, "`{field}` must be one of: {}", allowed.join(", "))
            }
            FieldIssue::Invalid(reason) => write!(f, "`{field}` is invalid: {reason}"),
            FieldIssue::NotAnObject => write!(f, "payload must be a JSON object"),
        }
    }
}
