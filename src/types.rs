//! Value kinds, typed values and declared parameters.
//!
//! Every parameter declares one of five kinds. Raw config text is coerced into
//! the matching [`Value`] variant when the parameter is declared, and rendered
//! back to text with [`Value::to_text`] when the store is written out.

use std::fmt;
use std::str::FromStr;

use crate::error::EzcfgError;
use crate::literal::{self, Literal};

/// The declared kind of a parameter, spelled `str`, `int`, `float`, `json` or
/// `obj` in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueKind {
    #[default]
    Str,
    Int,
    Float,
    Json,
    Obj,
}

impl ValueKind {
    pub const ALL: [ValueKind; 5] = [
        ValueKind::Str,
        ValueKind::Int,
        ValueKind::Float,
        ValueKind::Json,
        ValueKind::Obj,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Str => "str",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Json => "json",
            ValueKind::Obj => "obj",
        }
    }

    /// Coerce raw config text into a value of this kind.
    ///
    /// `key` is only used for error reporting.
    pub fn coerce(self, key: &str, raw: &str) -> Result<Value, EzcfgError> {
        let fail = |reason: String| EzcfgError::ValueCoercion {
            key: key.to_string(),
            kind: self.as_str().to_string(),
            value: raw.to_string(),
            reason,
        };
        match self {
            ValueKind::Str if raw.contains(['\n', '\r']) => {
                Err(fail("str values must fit on one line".to_string()))
            }
            ValueKind::Str => Ok(Value::Str(raw.to_string())),
            ValueKind::Int => raw
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| fail(e.to_string())),
            ValueKind::Float => raw
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| fail(e.to_string())),
            ValueKind::Json => serde_json::from_str(raw)
                .map(Value::Json)
                .map_err(|e| fail(e.to_string())),
            ValueKind::Obj => literal::parse(raw)
                .map(Value::Obj)
                .map_err(|e| fail(e.to_string())),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized kind token. Callers attach the parameter name when turning
/// this into [`EzcfgError::InvalidType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl FromStr for ValueKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ValueKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// A typed parameter value, one variant per [`ValueKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Json(serde_json::Value),
    Obj(Literal),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Str(_) => ValueKind::Str,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Json(_) => ValueKind::Json,
            Value::Obj(_) => ValueKind::Obj,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Value::Obj(v) => Some(v),
            _ => None,
        }
    }

    /// Text form used in config files. Coercing it with the value's own kind
    /// yields an equal value.
    pub fn to_text(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => literal::format_float(*f),
            Value::Json(v) => v.to_string(),
            Value::Obj(v) => v.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl From<Literal> for Value {
    fn from(v: Literal) -> Self {
        Value::Obj(v)
    }
}

/// A declared parameter inside a section.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub kind: ValueKind,
    pub description: String,
    /// Set by a command-line override; file-driven updates are skipped from
    /// then on.
    pub locked: bool,
    pub value: Value,
}

/// Kind, description and text form of a parameter, as returned by
/// [`ParameterSection::get_info`](crate::ParameterSection::get_info).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamInfo {
    pub kind: ValueKind,
    pub description: String,
    pub text: String,
}

/// Check a section or parameter name: `[A-Za-z0-9_]+`, not starting with a
/// digit or an underscore. Returns the reason on failure.
pub(crate) fn check_name(name: &str) -> Result<(), &'static str> {
    let Some(first) = name.chars().next() else {
        return Err("name is empty");
    };
    if first == '_' {
        return Err("name can not start with '_'");
    }
    if first.is_ascii_digit() {
        return Err("name can not start with a digit");
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err("name may only contain letters, digits and '_'");
    }
    Ok(())
}
