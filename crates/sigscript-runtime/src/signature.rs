use pyo3::prelude::*;
use serde::{Serialize, Serializer};

use crate::error::BridgeError;
use crate::loader::ScriptCallable;
use crate::marshal::py_to_json;
use crate::namespace::Namespace;

/// Wire form of an unset default or annotation.
pub const EMPTY_MARKER: &str = "_empty";

/// How a parameter can be bound, numbered the way the interpreter's
/// `inspect.Parameter.kind` numbers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    PositionalOnly = 0,
    PositionalOrKeyword = 1,
    /// `*args`
    VarPositional = 2,
    KeywordOnly = 3,
    /// `**kwargs`
    VarKeyword = 4,
}

impl TryFrom<u8> for ParameterKind {
    type Error = BridgeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::PositionalOnly),
            1 => Ok(Self::PositionalOrKeyword),
            2 => Ok(Self::VarPositional),
            3 => Ok(Self::KeywordOnly),
            4 => Ok(Self::VarKeyword),
            other => Err(BridgeError::Introspection(format!(
                "unknown parameter kind {other}"
            ))),
        }
    }
}

impl std::fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterKind::PositionalOnly => write!(f, "positional_only"),
            ParameterKind::PositionalOrKeyword => write!(f, "positional_or_keyword"),
            ParameterKind::VarPositional => write!(f, "var_positional"),
            ParameterKind::KeywordOnly => write!(f, "keyword_only"),
            ParameterKind::VarKeyword => write!(f, "var_keyword"),
        }
    }
}

/// A parameter's default: either unset, or a concrete value (which may well
/// be `null`).
#[derive(Debug, Clone, PartialEq)]
pub enum ParamDefault {
    Empty,
    Value(serde_json::Value),
}

impl ParamDefault {
    pub fn is_empty(&self) -> bool {
        matches!(self, ParamDefault::Empty)
    }
}

impl Serialize for ParamDefault {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ParamDefault::Empty => serializer.serialize_str(EMPTY_MARKER),
            ParamDefault::Value(v) => v.serialize(serializer),
        }
    }
}

/// A parameter's declared type, reported by simple name (`float`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    Empty,
    Named(String),
}

impl Serialize for Annotation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Annotation::Empty => serializer.serialize_str(EMPTY_MARKER),
            Annotation::Named(name) => serializer.serialize_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionParameter {
    pub name: String,
    pub kind: ParameterKind,
    pub default: ParamDefault,
    pub annotation: Annotation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionSignature {
    pub name: String,
    /// Declaration order.
    pub parameters: Vec<FunctionParameter>,
}

impl FunctionSignature {
    pub fn parameter(&self, name: &str) -> Option<&FunctionParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Describe `callable` using the namespace's introspection helper.
pub fn inspect(
    namespace: &Namespace,
    callable: &ScriptCallable,
) -> Result<FunctionSignature, BridgeError> {
    Python::attach(|py| -> Result<FunctionSignature, BridgeError> {
        let func = callable.callable.bind(py);
        let helpers = namespace.helpers();
        let empty = helpers.empty.bind(py);

        let parameters = helpers
            .inspect_parameters
            .bind(py)
            .call1((func, empty))
            .map_err(introspection_error)?;

        let parameters = parameters
            .try_iter()
            .map_err(introspection_error)?
            .map(|entry| read_parameter(&entry.map_err(introspection_error)?, empty))
            .collect::<Result<Vec<_>, BridgeError>>()?;

        let name = func
            .getattr("__name__")
            .and_then(|n| n.extract::<String>())
            .unwrap_or_else(|_| callable.binding.clone());

        Ok(FunctionSignature { name, parameters })
    })
}

fn introspection_error(e: PyErr) -> BridgeError {
    BridgeError::Introspection(e.to_string())
}

fn read_parameter(
    entry: &Bound<'_, PyAny>,
    empty: &Bound<'_, PyAny>,
) -> Result<FunctionParameter, BridgeError> {
    let field = |key: &str| entry.get_item(key).map_err(introspection_error);

    let name = field("name")?
        .extract::<String>()
        .map_err(introspection_error)?;
    let kind = field("kind")?
        .extract::<u8>()
        .map_err(introspection_error)?;
    let kind = ParameterKind::try_from(kind)?;

    // the helper hands back the namespace's own marker object for unset slots
    let default = field("default")?;
    let default = if default.as_ptr() == empty.as_ptr() {
        ParamDefault::Empty
    } else {
        ParamDefault::Value(py_to_json(&default).map_err(introspection_error)?)
    };

    let annotation = field("annotation")?;
    let annotation = if annotation.as_ptr() == empty.as_ptr() {
        Annotation::Empty
    } else {
        Annotation::Named(annotation.extract::<String>().map_err(introspection_error)?)
    };

    Ok(FunctionParameter {
        name,
        kind,
        default,
        annotation,
    })
}
