//! Override sources: where command-line values come from.
//!
//! The store asks an [`OverrideSource`] for a value per declared parameter
//! name. `clap::ArgMatches` implements it (behind the `clap` feature), and so
//! does [`Overrides`], a plain map that can be filled by hand or from any
//! `Serialize` value. Parameters that receive a value become locked.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::EzcfgError;
use crate::literal::Literal;
use crate::types::{Value, ValueKind};

/// A value supplied by an override source, before kind conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum OverrideValue {
    Text(String),
    Int(i64),
    Float(f64),
}

impl OverrideValue {
    /// Convert into a value of `kind`. Text is coerced like file content,
    /// integers widen to float, and a float can not become an integer.
    pub fn into_value(self, name: &str, kind: ValueKind) -> Result<Value, EzcfgError> {
        match (self, kind) {
            (OverrideValue::Text(raw), kind) => kind.coerce(name, &raw),
            (OverrideValue::Int(i), ValueKind::Int) => Ok(Value::Int(i)),
            (OverrideValue::Int(i), ValueKind::Float) => Ok(Value::Float(i as f64)),
            (OverrideValue::Int(i), ValueKind::Str) => Ok(Value::Str(i.to_string())),
            (OverrideValue::Int(i), ValueKind::Json) => Ok(Value::Json(i.into())),
            (OverrideValue::Int(i), ValueKind::Obj) => Ok(Value::Obj(Literal::Int(i))),
            (OverrideValue::Float(f), ValueKind::Float) => Ok(Value::Float(f)),
            (OverrideValue::Float(f), ValueKind::Str) => Ok(Value::Str(f.to_string())),
            (OverrideValue::Float(f), ValueKind::Json) => serde_json::Number::from_f64(f)
                .map(|n| Value::Json(n.into()))
                .ok_or_else(|| EzcfgError::UnwritableValue {
                    name: name.to_string(),
                    reason: format!("{f} has no JSON form"),
                }),
            (OverrideValue::Float(f), ValueKind::Obj) => Ok(Value::Obj(Literal::Float(f))),
            (OverrideValue::Float(f), ValueKind::Int) => Err(EzcfgError::UnwritableValue {
                name: name.to_string(),
                reason: format!("expected an integer, got {f}"),
            }),
        }
    }
}

/// Anything that can answer "was a value given for this parameter?".
pub trait OverrideSource {
    /// The value for `name`, if one was supplied. `kind` is the parameter's
    /// declared kind, for sources that need it to pick a typed accessor.
    fn value_for(&self, name: &str, kind: ValueKind) -> Option<OverrideValue>;

    /// Extra config file to load after the overrides are applied.
    fn config_path(&self) -> Option<PathBuf>;
}

/// An in-memory override source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    values: IndexMap<String, OverrideValue>,
    config: Option<PathBuf>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value. `None` is ignored, which suits optional CLI fields.
    pub fn set<V: Into<OverrideValue>>(mut self, name: &str, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.values.insert(name.to_string(), v.into());
        }
        self
    }

    pub fn config(mut self, path: impl AsRef<Path>) -> Self {
        self.config = Some(path.as_ref().to_path_buf());
        self
    }

    /// Collect overrides from the top-level fields of any serializable value.
    ///
    /// Null fields are skipped, a `config` string field becomes the extra
    /// config path, and nested arrays or objects are passed on as JSON text.
    pub fn from_serialize<S: Serialize>(source: &S) -> Result<Self, EzcfgError> {
        let json = serde_json::to_value(source).map_err(|e| EzcfgError::UnwritableValue {
            name: "<overrides>".into(),
            reason: e.to_string(),
        })?;
        let serde_json::Value::Object(fields) = json else {
            return Err(EzcfgError::UnwritableValue {
                name: "<overrides>".into(),
                reason: "source did not serialize to a struct or map".into(),
            });
        };

        let mut overrides = Overrides::new();
        for (name, value) in fields {
            let value = match value {
                serde_json::Value::Null => continue,
                serde_json::Value::String(s) if name == "config" => {
                    overrides.config = Some(PathBuf::from(s));
                    continue;
                }
                serde_json::Value::String(s) => OverrideValue::Text(s),
                serde_json::Value::Number(n) => match n.as_i64() {
                    Some(i) => OverrideValue::Int(i),
                    None => OverrideValue::Float(n.as_f64().unwrap_or(f64::NAN)),
                },
                other => OverrideValue::Text(other.to_string()),
            };
            overrides.values.insert(name, value);
        }
        Ok(overrides)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.config.is_none()
    }
}

impl OverrideSource for Overrides {
    fn value_for(&self, name: &str, _kind: ValueKind) -> Option<OverrideValue> {
        self.values.get(name).cloned()
    }

    fn config_path(&self) -> Option<PathBuf> {
        self.config.clone()
    }
}

impl From<&str> for OverrideValue {
    fn from(s: &str) -> Self {
        OverrideValue::Text(s.to_string())
    }
}

impl From<String> for OverrideValue {
    fn from(s: String) -> Self {
        OverrideValue::Text(s)
    }
}

impl From<i64> for OverrideValue {
    fn from(i: i64) -> Self {
        OverrideValue::Int(i)
    }
}

impl From<i32> for OverrideValue {
    fn from(i: i32) -> Self {
        OverrideValue::Int(i64::from(i))
    }
}

impl From<f64> for OverrideValue {
    fn from(f: f64) -> Self {
        OverrideValue::Float(f)
    }
}
