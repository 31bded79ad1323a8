//! Parameter binding.
//!
//! Turns the raw path captures and query string of a matched request into typed
//! values, following the parameter specs declared for the operation in
//! `operations::OPERATIONS`. Binding has no side effects.

use thiserror::Error;

use crate::operations::{OperationId, OperationSpec};

/// Declared type of a path parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// Decimal, signed 64-bit.
    Int64,
}

#[derive(Debug, Clone, Copy)]
pub struct PathParamSpec {
    pub name: &'static str,
    pub kind: PathKind,
}

/// Declared type of a query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Any text.
    Text,
    /// One of a closed set of values, compared case-insensitively.
    /// An explicit empty string is kept as-is so handlers can default it.
    OneOf(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy)]
pub struct QueryParamSpec {
    pub name: &'static str,
    pub required: bool,
    pub kind: QueryKind,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BindError {
    #[error("query parameter `{name}` is required")]
    RequiredParam { name: &'static str },
    #[error("invalid format for parameter `{name}`: {cause}")]
    InvalidParamFormat { name: &'static str, cause: String },
    #[error("malformed query string: {0}")]
    MalformedQuery(String),
}

/// A single bound value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundValue {
    Int(i64),
    /// `None` means the parameter was not supplied at all.
    Text(Option<String>),
}

/// BoundParams
///
/// The typed output of `bind`, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundParams {
    values: Vec<(&'static str, BoundValue)>,
}

impl BoundParams {
    fn push(&mut self, name: &'static str, value: BoundValue) {
        self.values.push((name, value));
    }

    fn get(&self, name: &str) -> Option<&BoundValue> {
        self.values
            .iter()
            .find(|(bound, _)| *bound == name)
            .map(|(_, value)| value)
    }

    /// A bound integer path parameter.
    pub fn int(&self, name: &'static str) -> Result<i64, BindError> {
        match self.get(name) {
            Some(BoundValue::Int(value)) => Ok(*value),
            _ => Err(BindError::InvalidParamFormat {
                name,
                cause: "not bound as an integer".to_string(),
            }),
        }
    }

    /// A bound query parameter declared as required, hence non-empty.
    pub fn required_text(&self, name: &'static str) -> Result<String, BindError> {
        match self.get(name) {
            Some(BoundValue::Text(Some(value))) => Ok(value.clone()),
            _ => Err(BindError::RequiredParam { name }),
        }
    }

    /// A bound optional query parameter; `None` when the caller did not send it.
    pub fn optional_text(&self, name: &'static str) -> Option<String> {
        match self.get(name) {
            Some(BoundValue::Text(value)) => value.clone(),
            _ => None,
        }
    }
}

/// OperationParams
///
/// Implemented by the typed parameter struct of each operation. `OPERATION` ties the
/// struct to its entry in the operation table, which drives binding and authorization.
pub trait OperationParams: Sized {
    const OPERATION: OperationId;

    fn from_bound(bound: &BoundParams) -> Result<Self, BindError>;
}

/// bind
///
/// `path` holds the captures of the matched route template, `query` the decoded
/// query pairs in request order. When a query key repeats, the first value wins.
pub fn bind(
    spec: &OperationSpec,
    path: &[(&str, &str)],
    query: &[(String, String)],
) -> Result<BoundParams, BindError> {
    let mut bound = BoundParams::default();

    for param in spec.path_params {
        let raw = path
            .iter()
            .find(|(name, _)| *name == param.name)
            .map(|(_, value)| *value)
            .ok_or_else(|| BindError::InvalidParamFormat {
                name: param.name,
                cause: "missing from path".to_string(),
            })?;

        let value = match param.kind {
            PathKind::Int64 => {
                raw.parse::<i64>()
                    .map_err(|err| BindError::InvalidParamFormat {
                        name: param.name,
                        cause: err.to_string(),
                    })?
            }
        };
        bound.push(param.name, BoundValue::Int(value));
    }

    for param in spec.query_params {
        let raw = query
            .iter()
            .find(|(name, _)| name == param.name)
            .map(|(_, value)| value.as_str());

        let value = match raw {
            None | Some("") if param.required => {
                return Err(BindError::RequiredParam { name: param.name });
            }
            None => None,
            Some(value) => {
                check_kind(param, value)?;
                Some(value.to_string())
            }
        };
        bound.push(param.name, BoundValue::Text(value));
    }

    Ok(bound)
}

fn check_kind(param: &QueryParamSpec, value: &str) -> Result<(), BindError> {
    match param.kind {
        QueryKind::Text => Ok(()),
        QueryKind::OneOf(_) if value.is_empty() => Ok(()),
        QueryKind::OneOf(allowed) => {
            if allowed.iter().any(|candidate| candidate.eq_ignore_ascii_case(value)) {
                Ok(())
            } else {
                Err(BindError::InvalidParamFormat {
                    name: param.name,
                    cause: format!("expected one of {}", allowed.join(", ")),
                })
            }
        }
    }
}
