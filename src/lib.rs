//! Typed, sectioned config files with generated command-line overrides.
//!
//! A config file is a list of `[SECTION]` blocks holding typed parameters.
//! The first file loaded (the default config) declares the schema; later
//! files and the command line may only change values of parameters that
//! already exist.
//!
//! ```ignore
//! let mut store = ConfigStore::from_file("config/default.cfg")?;
//! store.parse_args()?;
//! let lr = store.get("learning_rate")?.as_value().and_then(Value::as_float);
//! ```
//!
//! # File format
//!
//! Parameters come in two styles that can be mixed freely:
//!
//! ```text
//! # NOTE: image classifier defaults
//!
//! [MODEL]
//! # TYPE: float
//! # DESC: initial learning rate
//! learning_rate = 1e-3
//!
//! (obj) layer_size = [128, 64, 32]
//! ```
//!
//! The verbose style attaches the kind and a description through `# TYPE:`
//! and `# DESC:` comments (kind defaults to `str`). The compact style puts
//! the kind in parentheses. Kinds are:
//!
//! - `str`: the raw text after `=`, trimmed.
//! - `int`, `float`: numbers.
//! - `json`: any JSON document.
//! - `obj`: a plain literal ([`Literal`]): numbers, quoted strings,
//!   `True`/`False`/`None`, lists, tuples, sets and dicts.
//!
//! `# NOTE:` sets the store's note, used as the program description of the
//! generated CLI and written back by [`ConfigStore::write`]. Other `#` lines
//! are comments.
//!
//! # Short names
//!
//! Every section and every parameter is reachable by its bare name through
//! [`ConfigStore::get`]. A parameter declared in several sections is *vague*:
//! reading it by short name fails with [`EzcfgError::VagueParameter`], and
//! writing it does too unless the store was built with
//! [`allow_vague`](StoreBuilder::allow_vague). Section names win over
//! parameter names.
//!
//! # Precedence
//!
//! ```text
//! Default config          declares every parameter
//!        ↑ overridden by
//! Extra config files      ConfigStore::parse
//!        ↑ overridden by
//! Command line            locks what it sets; --config files can't change it
//! ```
//!
//! # Command line
//!
//! [`ConfigStore::cli_schema`] describes one `--name` flag per unambiguous
//! parameter, grouped by section, plus `--config/-c PATH`. It has no CLI
//! framework dependency; feed any parser's results back through an
//! [`OverrideSource`] such as [`Overrides`]. With the `clap` feature (on by
//! default) the store builds a `clap::Command` directly and reads
//! `ArgMatches` as an override source.
//!
//! # Logging
//!
//! Events go through [`tracing`]: debug events for loads, writes and applied
//! overrides, and a warning for each parameter repeated within one section.
//! Pass a [`tracing::Dispatch`] to [`StoreBuilder::logger`] to route a
//! store's events to a specific subscriber. Repeated-parameter warnings are
//! also kept in [`ConfigStore::warnings`].

pub mod error;
pub mod literal;
pub mod types;

mod builder;
#[cfg(feature = "clap")]
mod cli;
mod file;
mod flags;
mod index;
mod merge;
mod overrides;
mod parse;
mod persist;
mod section;
mod store;
mod template;

#[cfg(test)]
mod fixtures;

pub use builder::StoreBuilder;
pub use error::EzcfgError;
pub use flags::{CliSchema, ConfigFlag, FlagGroup, FlagSpec, FlagValueType, RESERVED_FLAGS};
pub use index::{FlatIndex, IndexEntry};
pub use literal::Literal;
pub use overrides::{OverrideSource, OverrideValue, Overrides};
pub use parse::ParseWarning;
pub use section::{Declaration, Names, ParameterSection};
pub use store::{Attr, ConfigStore};
pub use template::TEMPLATE;
pub use types::{ParamInfo, Parameter, Value, ValueKind};
