//! The config store: sections, the flat index, and every whole-store
//! operation (parse, write, merge, attribute access, command-line overrides).

use std::collections::{HashMap, HashSet};
use std::path::Path;

use indexmap::IndexMap;
use tracing::Dispatch;

use crate::builder::StoreBuilder;
use crate::error::EzcfgError;
use crate::file;
use crate::flags::{CliSchema, ConfigFlag, FlagGroup, RESERVED_FLAGS};
use crate::index::{FlatIndex, IndexEntry};
use crate::merge::merge_sections;
use crate::overrides::OverrideSource;
use crate::parse::{self, ParseWarning};
use crate::persist;
use crate::section::ParameterSection;
use crate::template;
use crate::types::{Value, check_name};

/// What a short name resolved to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Attr<'a> {
    Section(&'a ParameterSection),
    Value(&'a Value),
}

impl<'a> Attr<'a> {
    pub fn as_section(self) -> Option<&'a ParameterSection> {
        match self {
            Attr::Section(s) => Some(s),
            Attr::Value(_) => None,
        }
    }

    pub fn as_value(self) -> Option<&'a Value> {
        match self {
            Attr::Value(v) => Some(v),
            Attr::Section(_) => None,
        }
    }
}

/// Sectioned, typed configuration loaded from one or more files.
///
/// The first file parsed establishes the schema: it may declare any
/// parameter. Later files may only reassign parameters that already exist,
/// unless new declarations are requested explicitly.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    sections: IndexMap<String, ParameterSection>,
    note: String,
    allow_vague: bool,
    loaded: bool,
    index: FlatIndex,
    warnings: Vec<ParseWarning>,
    logger: Option<Dispatch>,
}

/// Run `f` with `logger` as the default tracing dispatcher, if one is set.
fn with_logger<T>(logger: Option<&Dispatch>, f: impl FnOnce() -> T) -> T {
    match logger {
        Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
        None => f(),
    }
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    /// A store whose schema comes from the file at `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EzcfgError> {
        Self::builder().default_file(path).build()
    }

    pub(crate) fn with_options(allow_vague: bool, logger: Option<Dispatch>) -> Self {
        Self {
            allow_vague,
            logger,
            ..Self::default()
        }
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn set_note(&mut self, note: &str) {
        self.note = note.to_string();
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn allows_vague(&self) -> bool {
        self.allow_vague
    }

    /// Duplicate-parameter warnings from every parse so far.
    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    pub fn sections(&self) -> impl Iterator<Item = &ParameterSection> {
        self.sections.values()
    }

    pub fn section(&self, name: &str) -> Option<&ParameterSection> {
        self.sections.get(name)
    }

    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    /// Parse the file at `path` into the store. New parameters are accepted
    /// only if nothing has been loaded yet.
    pub fn parse(&mut self, path: impl AsRef<Path>) -> Result<(), EzcfgError> {
        self.parse_with(path, false)
    }

    /// Like [`parse`](Self::parse), but `allow_new` permits new parameters
    /// even after the first load.
    pub fn parse_with(&mut self, path: impl AsRef<Path>, allow_new: bool) -> Result<(), EzcfgError> {
        let path = path.as_ref();
        let logger = self.logger.clone();
        with_logger(logger.as_ref(), || {
            let content = file::read_config(path)?;
            self.load_text(&content, path, allow_new)
        })
    }

    /// Parse in-memory config text. Errors are labelled `<memory>`.
    pub fn parse_str(&mut self, content: &str, allow_new: bool) -> Result<(), EzcfgError> {
        let logger = self.logger.clone();
        with_logger(logger.as_ref(), || {
            self.load_text(content, Path::new("<memory>"), allow_new)
        })
    }

    fn load_text(&mut self, content: &str, path: &Path, allow_new: bool) -> Result<(), EzcfgError> {
        let allow_new = allow_new || !self.loaded;
        let result = parse::parse_into(&mut self.sections, content, path, allow_new);
        // Rebuilt even on failure: a partial parse may already have added sections.
        self.rebuild_index();
        let outcome = result?;

        if let Some(note) = outcome.note {
            self.note = note;
        }
        self.warnings.extend(outcome.warnings);
        self.loaded = true;
        tracing::debug!(
            path = %path.display(),
            sections = self.sections.len(),
            "parsed config"
        );
        Ok(())
    }

    /// Declare (or reassign) one parameter programmatically, creating the
    /// section if needed.
    pub fn add_param(
        &mut self,
        section: &str,
        name: &str,
        kind: &str,
        description: &str,
        raw: &str,
    ) -> Result<(), EzcfgError> {
        check_name(section).map_err(|reason| EzcfgError::InvalidName {
            name: section.to_string(),
            reason: reason.into(),
        })?;
        check_name(name).map_err(|reason| EzcfgError::InvalidName {
            name: name.to_string(),
            reason: reason.into(),
        })?;
        let target = self
            .sections
            .entry(section.to_string())
            .or_insert_with(|| ParameterSection::new(section));
        let result = target.declare_or_update(name, kind, description, raw, true);
        self.rebuild_index();
        result.map(|_| ())
    }

    /// Render the whole store as config text. `note` replaces the stored
    /// note when given and non-empty.
    pub fn to_text(&self, note: Option<&str>, compact: bool) -> String {
        let note = note.filter(|n| !n.is_empty()).unwrap_or(&self.note);
        persist::render_document(&self.sections, note, &persist::local_timestamp(), compact)
    }

    /// Write the store to `path` (see [`to_text`](Self::to_text)).
    pub fn write(
        &self,
        path: impl AsRef<Path>,
        note: Option<&str>,
        compact: bool,
    ) -> Result<(), EzcfgError> {
        with_logger(self.logger.as_ref(), || {
            file::write_config(path.as_ref(), &self.to_text(note, compact))
        })
    }

    /// Write the commented starter config to `path`.
    pub fn write_template(path: impl AsRef<Path>) -> Result<(), EzcfgError> {
        template::write_template(path.as_ref())
    }

    /// Merge `other` into this store. Parameters already present here are
    /// only replaced when `overwrite` is set; locked ones never are.
    pub fn merge(&mut self, other: &ConfigStore, overwrite: bool) -> Result<(), EzcfgError> {
        let logger = self.logger.clone();
        with_logger(logger.as_ref(), || {
            let result = merge_sections(&mut self.sections, &other.sections, overwrite);
            self.rebuild_index();
            let changed = result?;
            tracing::debug!(changed, overwrite, "merged config");
            Ok(())
        })
    }

    fn rebuild_index(&mut self) {
        self.index = FlatIndex::build(&self.sections);
    }

    /// Resolve a short name: a section, or the value of a parameter declared
    /// in exactly one section.
    pub fn get(&self, name: &str) -> Result<Attr<'_>, EzcfgError> {
        match self.index.get(name) {
            None => Err(EzcfgError::UnknownAttribute(name.to_string())),
            Some(IndexEntry::Vague { sections }) => Err(EzcfgError::VagueParameter {
                name: name.to_string(),
                sections: sections.clone(),
            }),
            Some(IndexEntry::Section) => self
                .sections
                .get(name)
                .map(Attr::Section)
                .ok_or_else(|| EzcfgError::UnknownAttribute(name.to_string())),
            Some(IndexEntry::Param { section }) => self.get_in(section, name).map(Attr::Value),
        }
    }

    /// Read a parameter through its section, bypassing the flat index.
    pub fn get_in(&self, section: &str, name: &str) -> Result<&Value, EzcfgError> {
        self.sections
            .get(section)
            .ok_or_else(|| EzcfgError::UnknownAttribute(section.to_string()))?
            .get(name)
    }

    /// Assign a parameter by short name.
    ///
    /// A vague name fails unless the store allows vague access, in which
    /// case every section declaring it receives the value. Either all of
    /// them are updated or none is.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), EzcfgError> {
        let value = value.into();
        match self.index.get(name).cloned() {
            None => Err(EzcfgError::UnknownAttribute(name.to_string())),
            Some(IndexEntry::Section) => Err(EzcfgError::UnwritableValue {
                name: name.to_string(),
                reason: "sections can not be assigned".into(),
            }),
            Some(IndexEntry::Vague { sections }) if !self.allow_vague => {
                Err(EzcfgError::VagueParameter {
                    name: name.to_string(),
                    sections,
                })
            }
            Some(IndexEntry::Vague { sections }) => {
                let mut staged = Vec::with_capacity(sections.len());
                for section in &sections {
                    let mut copy = self
                        .sections
                        .get(section)
                        .ok_or_else(|| EzcfgError::UnknownAttribute(section.clone()))?
                        .clone();
                    copy.set(name, value.clone())?;
                    staged.push(copy);
                }
                for copy in staged {
                    self.sections.insert(copy.name().to_string(), copy);
                }
                Ok(())
            }
            Some(IndexEntry::Param { section }) => self.set_in(&section, name, value),
        }
    }

    /// Assign a parameter through its section, bypassing the flat index.
    pub fn set_in(
        &mut self,
        section: &str,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<(), EzcfgError> {
        self.sections
            .get_mut(section)
            .ok_or_else(|| EzcfgError::UnknownAttribute(section.to_string()))?
            .set(name, value)
    }

    /// Flag schema for the current parameters, grouped by section.
    ///
    /// A parameter gets a `--name` flag only if no other section declares
    /// the same name and the name is not reserved (`config`, `help`).
    pub fn cli_schema(&self) -> CliSchema {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for section in self.sections.values() {
            for name in section.names() {
                *counts.entry(name).or_default() += 1;
            }
        }
        let active: HashSet<String> = counts
            .into_iter()
            .filter(|(name, count)| *count == 1 && !RESERVED_FLAGS.contains(name))
            .map(|(name, _)| name.to_string())
            .collect();

        CliSchema {
            description: self.note.clone(),
            config_flag: ConfigFlag::default(),
            groups: self
                .sections
                .values()
                .map(|section| FlagGroup {
                    section: section.name().to_string(),
                    flags: section.build_flag_schema(&active),
                })
                .collect(),
        }
    }

    /// Apply parsed command-line values, then load the extra config file if
    /// one was given.
    ///
    /// Overridden parameters are locked first, so the extra file can not
    /// change them.
    pub fn apply_cli_results<S: OverrideSource + ?Sized>(
        &mut self,
        source: &S,
    ) -> Result<(), EzcfgError> {
        let logger = self.logger.clone();
        with_logger(logger.as_ref(), || {
            let mut applied = 0;
            for section in self.sections.values_mut() {
                applied += section.apply_overrides(source)?.len();
            }
            self.rebuild_index();
            tracing::debug!(applied, "applied command-line values");

            match source.config_path() {
                Some(path) => self.parse(path),
                None => Ok(()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::*;
    use crate::literal::Literal;
    use crate::overrides::Overrides;
    use crate::types::ValueKind;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn store(content: &str) -> ConfigStore {
        let mut store = ConfigStore::new();
        store.parse_str(content, false).unwrap();
        store
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn lr_batch_example() {
        let store = store(LR_BATCH);
        let model = store.section("MODEL").unwrap();
        assert_eq!(model.get("lr").unwrap(), &Value::Float(0.01));
        assert_eq!(model.get("batch").unwrap(), &Value::Int(32));
        assert_eq!(store.get("lr").unwrap().as_value(), Some(&Value::Float(0.01)));
        assert_eq!(
            store.get("MODEL").unwrap().as_section().map(|s| s.name()),
            Some("MODEL")
        );
    }

    #[test]
    fn first_parse_declares_later_parses_only_update() {
        let dir = TempDir::new().unwrap();
        let default = write(&dir, "default.cfg", MODEL_DEFAULT);
        let partial = write(&dir, "partial.cfg", MODEL_OVERRIDE);
        let unknown = write(&dir, "unknown.cfg", "[MODEL]\n(int) epochs = 3\n");

        let mut store = ConfigStore::from_file(&default).unwrap();
        assert!(store.is_loaded());
        store.parse(&partial).unwrap();
        assert_eq!(store.get("batch_size").unwrap().as_value(), Some(&Value::Int(128)));

        let err = store.parse(&unknown).unwrap_err();
        assert!(matches!(err, EzcfgError::UnexpectedKey { ref key, .. } if key == "epochs"));

        store.parse_with(&unknown, true).unwrap();
        assert_eq!(store.get("epochs").unwrap().as_value(), Some(&Value::Int(3)));
    }

    #[test]
    fn parsing_twice_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "m.cfg", SHARED_NAMES);
        let once = ConfigStore::from_file(&path).unwrap();
        let mut twice = ConfigStore::from_file(&path).unwrap();
        twice.parse(&path).unwrap();
        assert_eq!(once.index(), twice.index());
        assert_eq!(once.sections, twice.sections);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = ConfigStore::from_file(dir.path().join("nope.cfg")).unwrap_err();
        assert!(matches!(err, EzcfgError::Io { .. }));
    }

    #[test]
    fn note_is_read_from_file() {
        let store = store(MODEL_DEFAULT);
        assert_eq!(store.note(), "image classifier defaults");
    }

    #[test]
    fn vague_names_can_not_be_read() {
        let store = store(SHARED_NAMES);
        let err = store.get("dropout").unwrap_err();
        match err {
            EzcfgError::VagueParameter { sections, .. } => {
                assert_eq!(sections, vec!["ENCODER".to_string(), "DECODER".to_string()]);
            }
            other => panic!("Expected VagueParameter, got {other:?}"),
        }
        assert_eq!(store.get("depth").unwrap().as_value(), Some(&Value::Int(6)));
        assert_eq!(store.get_in("DECODER", "dropout").unwrap(), &Value::Float(0.2));
    }

    #[test]
    fn vague_reads_fail_even_when_vague_access_is_allowed() {
        let mut store = ConfigStore::builder().allow_vague(true).build().unwrap();
        store.parse_str(SHARED_NAMES, false).unwrap();
        assert!(matches!(
            store.get("dropout"),
            Err(EzcfgError::VagueParameter { .. })
        ));
    }

    #[test]
    fn vague_set_rejected_by_default() {
        let mut store = store(SHARED_NAMES);
        assert!(matches!(
            store.set("dropout", 0.5),
            Err(EzcfgError::VagueParameter { .. })
        ));
        assert_eq!(store.get_in("ENCODER", "dropout").unwrap(), &Value::Float(0.1));
    }

    #[test]
    fn vague_set_updates_every_section_when_allowed() {
        let mut store = ConfigStore::builder().allow_vague(true).build().unwrap();
        store.parse_str(SHARED_NAMES, false).unwrap();
        store.set("dropout", 0.5).unwrap();
        assert_eq!(store.get_in("ENCODER", "dropout").unwrap(), &Value::Float(0.5));
        assert_eq!(store.get_in("DECODER", "dropout").unwrap(), &Value::Float(0.5));
    }

    #[test]
    fn vague_set_is_all_or_nothing() {
        let mut store = ConfigStore::builder().allow_vague(true).build().unwrap();
        store
            .parse_str("[A]\n(float) x = 1.0\n[B]\n(int) x = 2\n", false)
            .unwrap();
        assert!(store.set("x", 0.5).is_err());
        assert_eq!(store.get_in("A", "x").unwrap(), &Value::Float(1.0));
    }

    #[test]
    fn section_names_shadow_parameters() {
        let store = store("[lr]\n(int) x = 1\n[MODEL]\n(float) lr = 0.1\n");
        assert!(store.get("lr").unwrap().as_section().is_some());
        assert_eq!(store.get_in("MODEL", "lr").unwrap(), &Value::Float(0.1));
    }

    #[test]
    fn unknown_attribute() {
        let mut store = store(LR_BATCH);
        assert!(matches!(
            store.get("momentum"),
            Err(EzcfgError::UnknownAttribute(_))
        ));
        assert!(matches!(
            store.set("momentum", 0.9),
            Err(EzcfgError::UnknownAttribute(_))
        ));
    }

    #[test]
    fn sections_are_not_assignable() {
        let mut store = store(LR_BATCH);
        assert!(matches!(
            store.set("MODEL", 1),
            Err(EzcfgError::UnwritableValue { .. })
        ));
    }

    #[test]
    fn set_through_short_name() {
        let mut store = store(LR_BATCH);
        store.set("batch", 64).unwrap();
        assert_eq!(store.get("batch").unwrap().as_value(), Some(&Value::Int(64)));
        assert!(matches!(
            store.set("batch", "many"),
            Err(EzcfgError::UnwritableValue { .. })
        ));
    }

    #[test]
    fn merge_keeps_or_overwrites() {
        let a_text = "[MODEL]\n(float) lr = 0.01\n";
        let b = store("[MODEL]\n(float) lr = 0.5\n(int) epochs = 3\n[DATA]\n(str) root = /data\n");

        let mut a = store(a_text);
        a.merge(&b, false).unwrap();
        assert_eq!(a.get("lr").unwrap().as_value(), Some(&Value::Float(0.01)));
        assert_eq!(a.get("epochs").unwrap().as_value(), Some(&Value::Int(3)));
        assert!(a.get("DATA").unwrap().as_section().is_some());

        let mut a = store(a_text);
        a.merge(&b, true).unwrap();
        assert_eq!(a.get("lr").unwrap().as_value(), Some(&Value::Float(0.5)));
    }

    #[test]
    fn merge_rebuilds_index() {
        let mut a = store("[A]\n(int) x = 1\n");
        let b = store("[B]\n(int) x = 2\n");
        a.merge(&b, false).unwrap();
        assert!(matches!(a.get("x"), Err(EzcfgError::VagueParameter { .. })));
    }

    #[test]
    fn write_then_parse_round_trips() {
        let dir = TempDir::new().unwrap();
        let original = store(ALL_KINDS);
        for compact in [true, false] {
            let path = dir.path().join(format!("out_{compact}.cfg"));
            original.write(&path, Some("round trip"), compact).unwrap();
            let back = ConfigStore::from_file(&path).unwrap();
            assert_eq!(back.sections, original.sections, "compact = {compact}");
            assert_eq!(back.note(), "round trip");
        }
    }

    #[test]
    fn descriptions_survive_both_write_modes() {
        let dir = TempDir::new().unwrap();
        let original = store(MODEL_DEFAULT);
        for compact in [true, false] {
            let path = dir.path().join(format!("described_{compact}.cfg"));
            original.write(&path, None, compact).unwrap();
            let back = ConfigStore::from_file(&path).unwrap();
            let info = back.section("MODEL").unwrap().get_info("batch_size").unwrap();
            assert_eq!(info.description, "batch size", "compact = {compact}");
            assert_eq!(back.sections, original.sections, "compact = {compact}");
        }
    }

    #[test]
    fn write_uses_stored_note_by_default() {
        let store = store(MODEL_DEFAULT);
        let text = store.to_text(None, true);
        assert!(text.starts_with("# NOTE: image classifier defaults\n# TIMESTAMP: "));
        assert!(store.to_text(Some(""), true).contains("image classifier defaults"));
        assert!(store.to_text(Some("other"), true).starts_with("# NOTE: other\n"));
    }

    #[test]
    fn cli_schema_skips_vague_and_reserved_names() {
        let store = store("[A]\n(int) x = 1\n(str) config = a\n(int) help = 1\n[B]\n(int) x = 2\n(float) y = 0.5\n");
        let schema = store.cli_schema();
        let names: Vec<&str> = schema.flags().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["y"]);
        assert_eq!(schema.groups.len(), 2);
        assert_eq!(schema.groups[1].section, "B");
        assert_eq!(schema.config_flag.long, "config");
        assert_eq!(schema.config_flag.short, 'c');
    }

    #[test]
    fn cli_schema_describes_with_note() {
        let store = store(MODEL_DEFAULT);
        let schema = store.cli_schema();
        assert_eq!(schema.description, "image classifier defaults");
        assert_eq!(schema.find("layer_size").unwrap().metavar, "OBJ");
    }

    #[test]
    fn cli_values_win_over_config_file() {
        let dir = TempDir::new().unwrap();
        let extra = write(
            &dir,
            "extra.cfg",
            "[MODEL]\n(float) lr = 0.9\n(int) batch = 256\n",
        );
        let mut store = store(LR_BATCH);
        let source = Overrides::new().set("lr", Some(0.3)).config(&extra);
        store.apply_cli_results(&source).unwrap();

        assert_eq!(store.get("lr").unwrap().as_value(), Some(&Value::Float(0.3)));
        assert_eq!(store.get("batch").unwrap().as_value(), Some(&Value::Int(256)));
        assert!(store.section("MODEL").unwrap().is_locked("lr"));
        assert!(!store.section("MODEL").unwrap().is_locked("batch"));
    }

    #[test]
    fn cli_text_is_decoded_for_structured_kinds() {
        let mut store = store(MODEL_DEFAULT);
        let source = Overrides::new().set("layer_size", Some("(256, 128)"));
        store.apply_cli_results(&source).unwrap();
        assert_eq!(
            store.get("layer_size").unwrap().as_value(),
            Some(&Value::Obj(Literal::Tuple(vec![
                Literal::Int(256),
                Literal::Int(128)
            ])))
        );
    }

    #[test]
    fn add_param_creates_section_and_indexes_it() {
        let mut store = ConfigStore::new();
        store.add_param("RUN", "seed", "int", "random seed", "42").unwrap();
        assert_eq!(store.get("seed").unwrap().as_value(), Some(&Value::Int(42)));
        let info = store.section("RUN").unwrap().get_info("seed").unwrap();
        assert_eq!(info.kind, ValueKind::Int);
        assert!(matches!(
            store.add_param("9RUN", "x", "int", "", "1"),
            Err(EzcfgError::InvalidName { .. })
        ));
    }

    #[test]
    fn duplicate_warnings_are_kept() {
        let store = store("[S]\nx = 1\nx = 2\n");
        assert_eq!(store.warnings().len(), 1);
        assert_eq!(store.warnings()[0].path, PathBuf::from("<memory>"));
    }

    #[test]
    fn failed_parse_keeps_index_in_sync() {
        let mut store = ConfigStore::new();
        let err = store
            .parse_str("[A]\n(int) x = 1\n[B]\n(int) y = oops\n", false)
            .unwrap_err();
        assert!(matches!(err, EzcfgError::ValueCoercion { .. }));
        assert!(!store.is_loaded());
        assert_eq!(store.get("x").unwrap().as_value(), Some(&Value::Int(1)));
        assert!(store.get("B").unwrap().as_section().is_some());
    }

    #[test]
    fn explicit_logger_receives_events() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .finish();
        let mut store = ConfigStore::builder()
            .logger(Dispatch::new(subscriber))
            .build()
            .unwrap();
        store.parse_str("[S]\nx = 1\nx = 2\n", false).unwrap();
        assert_eq!(store.warnings().len(), 1);
    }

    #[test]
    fn template_writes_loadable_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("template.cfg");
        ConfigStore::write_template(&path).unwrap();
        let store = ConfigStore::from_file(&path).unwrap();
        assert_eq!(
            store.get("batch_size").unwrap().as_value(),
            Some(&Value::Int(64))
        );
    }
}
