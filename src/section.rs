//! A named section: an ordered set of typed, declared parameters.

use std::collections::HashSet;
use std::fmt::Write as _;

use indexmap::IndexMap;

use crate::error::EzcfgError;
use crate::flags::FlagSpec;
use crate::literal::Literal;
use crate::overrides::{OverrideSource, OverrideValue};
use crate::types::{ParamInfo, Parameter, Value, ValueKind};

/// What [`ParameterSection::declare_or_update`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Declaration {
    Created,
    Updated,
    /// The parameter is locked by a command-line override; nothing changed.
    SkippedLocked,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSection {
    name: String,
    params: IndexMap<String, Parameter>,
}

impl ParameterSection {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            params: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.params.get(name)
    }

    pub fn is_locked(&self, name: &str) -> bool {
        self.params.get(name).is_some_and(|p| p.locked)
    }

    /// Declare a parameter or reassign an existing one from raw config text.
    ///
    /// New names are only accepted when `allow_new` is set. A locked
    /// parameter is left untouched. Re-declaring resets the description and
    /// kind to the new ones.
    pub fn declare_or_update(
        &mut self,
        name: &str,
        kind: &str,
        description: &str,
        raw: &str,
        allow_new: bool,
    ) -> Result<Declaration, EzcfgError> {
        if name.starts_with('_') {
            return Err(EzcfgError::InvalidName {
                name: name.to_string(),
                reason: "parameter name can not start with '_'".into(),
            });
        }
        let existing = self.params.get(name);
        if existing.is_none() && !allow_new {
            return Err(EzcfgError::UnexpectedKey {
                section: self.name.clone(),
                key: name.to_string(),
            });
        }
        let kind: ValueKind = kind.parse().map_err(|_| EzcfgError::InvalidType {
            key: name.to_string(),
            kind: kind.to_string(),
        })?;
        if existing.is_some_and(|p| p.locked) {
            tracing::debug!(section = %self.name, param = name, "parameter is locked, keeping override");
            return Ok(Declaration::SkippedLocked);
        }

        let value = kind.coerce(name, raw)?;
        let outcome = if existing.is_some() {
            Declaration::Updated
        } else {
            Declaration::Created
        };
        tracing::trace!(section = %self.name, param = name, %kind, "declared parameter");
        self.params.insert(
            name.to_string(),
            Parameter {
                kind,
                description: description.to_string(),
                locked: false,
                value,
            },
        );
        Ok(outcome)
    }

    /// Set `name` from an override value and lock it against later file
    /// updates.
    pub fn apply_override(&mut self, name: &str, value: OverrideValue) -> Result<(), EzcfgError> {
        let param = self
            .params
            .get_mut(name)
            .ok_or_else(|| EzcfgError::UnexpectedKey {
                section: self.name.clone(),
                key: name.to_string(),
            })?;
        param.value = value.into_value(name, param.kind)?;
        param.locked = true;
        tracing::debug!(section = %self.name, param = name, "applied command-line override");
        Ok(())
    }

    /// Apply every value `source` has for this section's parameters. Returns
    /// the names that were overridden.
    pub fn apply_overrides<S: OverrideSource + ?Sized>(
        &mut self,
        source: &S,
    ) -> Result<Vec<String>, EzcfgError> {
        let pending: Vec<(String, OverrideValue)> = self
            .params
            .iter()
            .filter_map(|(name, p)| source.value_for(name, p.kind).map(|v| (name.clone(), v)))
            .collect();
        let mut applied = Vec::with_capacity(pending.len());
        for (name, value) in pending {
            self.apply_override(&name, value)?;
            applied.push(name);
        }
        Ok(applied)
    }

    pub fn get_info(&self, name: &str) -> Result<ParamInfo, EzcfgError> {
        let param = self.require(name)?;
        Ok(ParamInfo {
            kind: param.kind,
            description: param.description.clone(),
            text: param.value.to_text(),
        })
    }

    /// Render as config text: a `[name]` header, then either one compact
    /// `(kind) name = value` line per parameter (preceded by `# DESC:` when
    /// it has a description) or the verbose `# TYPE:`/`# DESC:`/`name = value`
    /// block.
    pub fn serialize(&self, compact: bool) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "[{}]", self.name);
        for (name, param) in &self.params {
            let value = param.value.to_text();
            if compact {
                if !param.description.is_empty() {
                    let _ = writeln!(out, "# DESC: {}", param.description.replace('\n', " "));
                }
                let _ = writeln!(out, "({}) {name} = {value}", param.kind);
            } else {
                let _ = writeln!(out, "# TYPE: {}", param.kind);
                let _ = writeln!(out, "# DESC: {}", param.description.replace('\n', " "));
                let _ = writeln!(out, "{name} = {value}\n");
            }
        }
        out.push('\n');
        out
    }

    /// One flag per parameter whose name is in `active`, in declaration order.
    pub fn build_flag_schema(&self, active: &HashSet<String>) -> Vec<FlagSpec> {
        self.params
            .iter()
            .filter(|(name, _)| active.contains(name.as_str()))
            .map(|(name, p)| FlagSpec::new(name, p.kind, &p.description))
            .collect()
    }

    pub fn get(&self, name: &str) -> Result<&Value, EzcfgError> {
        self.require(name).map(|p| &p.value)
    }

    /// Assign a value, checked against the declared kind:
    ///
    /// - `str` and `int` need a value of exactly that kind; `str` text must
    ///   not contain line breaks.
    /// - `float` also takes integers and numeric text.
    /// - `json` and `obj` take anything that converts.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), EzcfgError> {
        let section = self.name.clone();
        let param = self
            .params
            .get_mut(name)
            .ok_or_else(|| EzcfgError::UnexpectedKey {
                section,
                key: name.to_string(),
            })?;
        param.value = convert_for_kind(name, param.kind, value.into())?;
        Ok(())
    }

    /// Parameter names in declaration order.
    pub fn names(&self) -> Names<'_> {
        Names(self.params.keys())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Parameter)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn require(&self, name: &str) -> Result<&Parameter, EzcfgError> {
        self.params
            .get(name)
            .ok_or_else(|| EzcfgError::UnexpectedKey {
                section: self.name.clone(),
                key: name.to_string(),
            })
    }
}

fn convert_for_kind(name: &str, kind: ValueKind, value: Value) -> Result<Value, EzcfgError> {
    let mismatch = |value: &Value| EzcfgError::UnwritableValue {
        name: name.to_string(),
        reason: format!("expected {kind}, got {}", value.kind()),
    };
    match kind {
        ValueKind::Str => match value {
            Value::Str(ref text) if text.contains(['\n', '\r']) => {
                Err(EzcfgError::UnwritableValue {
                    name: name.to_string(),
                    reason: "str values must fit on one line".into(),
                })
            }
            Value::Str(_) => Ok(value),
            _ => Err(mismatch(&value)),
        },
        ValueKind::Int if value.kind() == kind => Ok(value),
        ValueKind::Int => Err(mismatch(&value)),
        ValueKind::Float => match value {
            Value::Float(_) => Ok(value),
            Value::Int(i) => Ok(Value::Float(i as f64)),
            Value::Str(ref s) => ValueKind::Float.coerce(name, s),
            Value::Json(ref j) => j.as_f64().map(Value::Float).ok_or_else(|| mismatch(&value)),
            Value::Obj(_) => Err(mismatch(&value)),
        },
        ValueKind::Json => match value {
            Value::Json(_) => Ok(value),
            Value::Str(s) => Ok(Value::Json(s.into())),
            Value::Int(i) => Ok(Value::Json(i.into())),
            Value::Float(f) => Literal::Float(f)
                .to_json()
                .map(Value::Json)
                .ok_or_else(|| mismatch(&value)),
            Value::Obj(ref lit) => lit.to_json().map(Value::Json).ok_or_else(|| {
                EzcfgError::UnwritableValue {
                    name: name.to_string(),
                    reason: format!("{lit} has no JSON form"),
                }
            }),
        },
        ValueKind::Obj => Ok(Value::Obj(match value {
            Value::Obj(lit) => lit,
            Value::Str(s) => Literal::Str(s),
            Value::Int(i) => Literal::Int(i),
            Value::Float(f) => Literal::Float(f),
            Value::Json(j) => Literal::from_json(&j),
        })),
    }
}

/// Restartable iterator over a section's parameter names.
#[derive(Clone)]
pub struct Names<'a>(indexmap::map::Keys<'a, String, Parameter>);

impl<'a> Iterator for Names<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(String::as_str)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a> IntoIterator for &'a ParameterSection {
    type Item = &'a str;
    type IntoIter = Names<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.names()
    }
}
