use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[cfg_attr(feature = "rich-errors", derive(miette::Diagnostic))]
pub enum EzcfgError {
    #[error("Failed to parse {path} (line {line}): {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(ezcfg::parse)))]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Unexpected key '{key}' in section [{section}]")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(
            code(ezcfg::unexpected_key),
            help("only the default config may declare new parameters")
        )
    )]
    UnexpectedKey { section: String, key: String },

    #[error("Unknown attribute '{0}'")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(ezcfg::unknown_attribute)))]
    UnknownAttribute(String),

    #[error("Invalid type '{kind}' for '{key}' (expected one of str, int, float, json, obj)")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(ezcfg::invalid_type)))]
    InvalidType { key: String, kind: String },

    #[error("Invalid value for '{key}' as {kind}: {value:?} ({reason})")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(ezcfg::value_coercion)))]
    ValueCoercion {
        key: String,
        kind: String,
        value: String,
        reason: String,
    },

    #[error("Parameter '{name}' is vague, it is declared in sections {sections:?}")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(
            code(ezcfg::vague_parameter),
            help("access it through its section instead")
        )
    )]
    VagueParameter { name: String, sections: Vec<String> },

    #[error("Can not write '{name}': {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(ezcfg::unwritable_value)))]
    UnwritableValue { name: String, reason: String },

    #[error("Invalid name '{name}': {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(ezcfg::invalid_name)))]
    InvalidName { name: String, reason: String },

    #[error("Failed to access {path}: {source}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(ezcfg::io)))]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[cfg(feature = "clap")]
    #[error(transparent)]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(ezcfg::cli)))]
    Cli(#[from] clap::Error),
}
