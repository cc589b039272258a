//! Framework-agnostic command-line flag schema.
//!
//! The store derives one [`FlagSpec`] per unambiguous parameter, grouped by
//! section, plus the reserved `--config/-c` path flag. Nothing here depends on
//! a CLI library; the clap adapter turns a [`CliSchema`] into a
//! `clap::Command`.

use crate::types::ValueKind;

/// Flag names that parameters can never claim.
pub const RESERVED_FLAGS: [&str; 2] = ["config", "help"];

/// Value parser a flag should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagValueType {
    Int,
    Float,
    /// Plain text; `json` and `obj` parameters are decoded after parsing.
    Text,
}

impl From<ValueKind> for FlagValueType {
    fn from(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Int => FlagValueType::Int,
            ValueKind::Float => FlagValueType::Float,
            ValueKind::Str | ValueKind::Json | ValueKind::Obj => FlagValueType::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSpec {
    /// Parameter name, also the flag's id.
    pub name: String,
    /// Long form including dashes, e.g. `--batch`.
    pub flag: String,
    pub value_type: FlagValueType,
    pub help: String,
    /// Kind name uppercased, e.g. `FLOAT`.
    pub metavar: String,
}

impl FlagSpec {
    pub fn new(name: &str, kind: ValueKind, help: &str) -> Self {
        Self {
            name: name.to_string(),
            flag: format!("--{name}"),
            value_type: kind.into(),
            help: help.to_string(),
            metavar: kind.as_str().to_uppercase(),
        }
    }
}

/// Flags of one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagGroup {
    pub section: String,
    pub flags: Vec<FlagSpec>,
}

/// The `--config/-c` flag that loads one more override file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFlag {
    pub long: &'static str,
    pub short: char,
    pub help: &'static str,
}

impl Default for ConfigFlag {
    fn default() -> Self {
        Self {
            long: "config",
            short: 'c',
            help: "config file to load after the command-line values are applied",
        }
    }
}

/// Everything a CLI library needs to build the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliSchema {
    /// Program description (the store's note).
    pub description: String,
    pub config_flag: ConfigFlag,
    pub groups: Vec<FlagGroup>,
}

impl CliSchema {
    pub fn flags(&self) -> impl Iterator<Item = &FlagSpec> {
        self.groups.iter().flat_map(|g| g.flags.iter())
    }

    pub fn find(&self, name: &str) -> Option<&FlagSpec> {
        self.flags().find(|f| f.name == name)
    }
}
