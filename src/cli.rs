//! Clap adapter.
//!
//! Compiled only with the `clap` feature (on by default). It turns a
//! [`CliSchema`] into a runtime-built `clap::Command` and reads the parsed
//! [`ArgMatches`] back as an [`OverrideSource`]. The store itself never
//! depends on clap; any CLI parser can feed it through
//! [`Overrides`](crate::Overrides) instead.
//!
//! ```ignore
//! let mut store = ConfigStore::from_file("default.cfg")?;
//! let matches = store.command("train").get_matches();
//! store.apply_matches(&matches)?;
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};

use crate::error::EzcfgError;
use crate::flags::{CliSchema, FlagValueType};
use crate::overrides::{OverrideSource, OverrideValue};
use crate::store::ConfigStore;
use crate::types::ValueKind;

impl CliSchema {
    /// Build a clap command with one `--name` arg per flag, under a help
    /// heading named after its section, plus `--config/-c`.
    pub fn to_command(&self, name: &str) -> Command {
        let mut cmd = Command::new(name.to_string()).arg(
            Arg::new(self.config_flag.long)
                .short(self.config_flag.short)
                .long(self.config_flag.long)
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .help(self.config_flag.help),
        );
        if !self.description.is_empty() {
            cmd = cmd.about(self.description.clone());
        }

        for group in &self.groups {
            for flag in &group.flags {
                let arg = Arg::new(flag.name.clone())
                    .long(flag.name.clone())
                    .action(ArgAction::Set)
                    .value_name(flag.metavar.clone())
                    .help(flag.help.clone())
                    .help_heading(group.section.clone());
                let arg = match flag.value_type {
                    FlagValueType::Int => arg.value_parser(value_parser!(i64)),
                    FlagValueType::Float => arg.value_parser(value_parser!(f64)),
                    FlagValueType::Text => arg.value_parser(value_parser!(String)),
                };
                cmd = cmd.arg(arg);
            }
        }
        cmd
    }
}

impl OverrideSource for ArgMatches {
    fn value_for(&self, name: &str, kind: ValueKind) -> Option<OverrideValue> {
        // Names without a flag, or typed differently, are simply absent.
        match FlagValueType::from(kind) {
            FlagValueType::Int => self
                .try_get_one::<i64>(name)
                .ok()
                .flatten()
                .map(|v| OverrideValue::Int(*v)),
            FlagValueType::Float => self
                .try_get_one::<f64>(name)
                .ok()
                .flatten()
                .map(|v| OverrideValue::Float(*v)),
            FlagValueType::Text => self
                .try_get_one::<String>(name)
                .ok()
                .flatten()
                .map(|v| OverrideValue::Text(v.clone())),
        }
    }

    fn config_path(&self) -> Option<PathBuf> {
        self.try_get_one::<PathBuf>("config").ok().flatten().cloned()
    }
}

impl ConfigStore {
    /// The clap command for this store's current parameters.
    pub fn command(&self, name: &str) -> Command {
        self.cli_schema().to_command(name)
    }

    pub fn apply_matches(&mut self, matches: &ArgMatches) -> Result<(), EzcfgError> {
        self.apply_cli_results(matches)
    }

    /// Parse `args` (program name first) and apply them.
    ///
    /// `--help` and usage errors come back as [`EzcfgError::Cli`]; call
    /// `exit()` on the inner error to print them the way clap would.
    pub fn try_parse_args_from<I, T>(&mut self, args: I) -> Result<(), EzcfgError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let name = args
            .first()
            .and_then(|arg| Path::new(arg).file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());
        let matches = self.command(&name).try_get_matches_from(args)?;
        self.apply_matches(&matches)
    }

    /// Parse the process arguments and apply them.
    pub fn parse_args(&mut self) -> Result<(), EzcfgError> {
        self.try_parse_args_from(std::env::args_os())
    }
}
