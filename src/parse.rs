//! Line grammar parser.
//!
//! Config files are read line by line. Each trimmed line is classified, in
//! this order:
//!
//! 1. `[NAME]` opens a section.
//! 2. `(kind) name = value` declares a parameter in compact mode, taking a
//!    pending `# DESC:` as its description.
//! 3. `# TYPE: kind` sets the kind for the next `name = value` line.
//! 4. `# DESC: text` sets the description for the next parameter line.
//! 5. `# NOTE: text` sets the store note. `# TIMESTAMP:` is informational.
//! 6. Any other line not starting with `#` that contains `=` declares a
//!    parameter with the pending kind (default `str`) and description.
//! 7. Everything else is ignored.
//!
//! A section may be declared only once per file, though a later file may add
//! to a section an earlier file created. A parameter repeated within one
//! section of one file is reported as a warning and the last value wins.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::error::EzcfgError;
use crate::section::ParameterSection;
use crate::types::{ValueKind, check_name};

/// A non-fatal problem found while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub path: PathBuf,
    pub line: usize,
    pub section: String,
    pub param: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parameter \"{}\" appears multiple times in [{}] of {} (line {})",
            self.param,
            self.section,
            self.path.display(),
            self.line
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    /// Text of the last `# NOTE:` line, if any.
    pub note: Option<String>,
    pub warnings: Vec<ParseWarning>,
}

/// One classified line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line<'a> {
    Section(&'a str),
    Compact {
        kind: &'a str,
        name: &'a str,
        raw: &'a str,
    },
    Type(&'a str),
    Desc(&'a str),
    Note(&'a str),
    Timestamp,
    Assign {
        name: &'a str,
        raw: &'a str,
    },
    Ignored,
}

fn classify(line: &str) -> Result<Line<'_>, String> {
    let line = line.trim_matches(|c| matches!(c, ' ' | '\n' | '\r' | '\t'));

    if line.starts_with('[') {
        return Ok(Line::Section(
            line.trim_matches(|c| matches!(c, '[' | ']' | ' ')),
        ));
    }
    if line.starts_with('(') {
        let close = line
            .find(')')
            .ok_or("missing ')' after the kind of a compact declaration")?;
        let kind = line[..close].trim_matches(|c| matches!(c, '(' | ')' | ' '));
        let (name, raw) = line[close + 1..]
            .split_once('=')
            .ok_or("missing '=' in compact declaration")?;
        return Ok(Line::Compact {
            kind,
            name: name.trim(),
            raw: raw.trim(),
        });
    }
    if let Some(rest) = line.strip_prefix("# TYPE:") {
        return Ok(Line::Type(rest.trim()));
    }
    if let Some(rest) = line.strip_prefix("# DESC:") {
        return Ok(Line::Desc(rest.trim()));
    }
    if let Some(rest) = line.strip_prefix("# NOTE:") {
        return Ok(Line::Note(rest.trim()));
    }
    if line.starts_with("# TIMESTAMP:") {
        return Ok(Line::Timestamp);
    }
    if !line.starts_with('#')
        && let Some((name, raw)) = line.split_once('=')
    {
        return Ok(Line::Assign {
            name: name.trim(),
            raw: raw.trim(),
        });
    }
    Ok(Line::Ignored)
}

/// Parse `content` into `sections`, creating sections as needed.
///
/// `path` only labels errors and warnings. With `allow_new` unset, only
/// parameters that already exist may be assigned.
pub fn parse_into(
    sections: &mut IndexMap<String, ParameterSection>,
    content: &str,
    path: &Path,
    allow_new: bool,
) -> Result<ParseOutcome, EzcfgError> {
    let mut parser = LineParser {
        sections,
        path,
        allow_new,
        current: None,
        pending_kind: ValueKind::default().as_str().to_string(),
        pending_desc: String::new(),
        seen_sections: HashSet::new(),
        seen_params: HashSet::new(),
        outcome: ParseOutcome::default(),
    };
    for (i, line) in content.lines().enumerate() {
        parser.feed(i + 1, line)?;
    }
    Ok(parser.outcome)
}

struct LineParser<'a> {
    sections: &'a mut IndexMap<String, ParameterSection>,
    path: &'a Path,
    allow_new: bool,
    current: Option<String>,
    pending_kind: String,
    pending_desc: String,
    seen_sections: HashSet<String>,
    seen_params: HashSet<String>,
    outcome: ParseOutcome,
}

impl LineParser<'_> {
    fn error(&self, line: usize, reason: impl Into<String>) -> EzcfgError {
        EzcfgError::Parse {
            path: self.path.to_path_buf(),
            line,
            reason: reason.into(),
        }
    }

    fn reset_pending(&mut self) {
        self.pending_kind = ValueKind::default().as_str().to_string();
        self.pending_desc.clear();
    }

    fn feed(&mut self, line_no: usize, line: &str) -> Result<(), EzcfgError> {
        match classify(line).map_err(|reason| self.error(line_no, reason))? {
            Line::Section(name) => self.open_section(line_no, name),
            Line::Compact { kind, name, raw } => {
                let desc = std::mem::take(&mut self.pending_desc);
                let result = self.declare(line_no, name, kind, &desc, raw);
                self.reset_pending();
                result
            }
            Line::Type(kind) => {
                self.pending_kind = kind.to_string();
                Ok(())
            }
            Line::Desc(desc) => {
                self.pending_desc = desc.to_string();
                Ok(())
            }
            Line::Note(note) => {
                self.outcome.note = Some(note.to_string());
                Ok(())
            }
            Line::Assign { name, raw } => {
                let kind = std::mem::take(&mut self.pending_kind);
                let desc = std::mem::take(&mut self.pending_desc);
                let result = self.declare(line_no, name, &kind, &desc, raw);
                self.reset_pending();
                result
            }
            Line::Timestamp | Line::Ignored => Ok(()),
        }
    }

    fn open_section(&mut self, line_no: usize, name: &str) -> Result<(), EzcfgError> {
        check_name(name)
            .map_err(|reason| self.error(line_no, format!("invalid section name '{name}': {reason}")))?;
        if !self.seen_sections.insert(name.to_string()) {
            return Err(self.error(line_no, format!("section [{name}] is declared twice")));
        }
        if !self.sections.contains_key(name) {
            tracing::debug!(section = name, path = %self.path.display(), "created section");
            self.sections
                .insert(name.to_string(), ParameterSection::new(name));
        }
        self.current = Some(name.to_string());
        self.seen_params.clear();
        self.reset_pending();
        Ok(())
    }

    fn declare(
        &mut self,
        line_no: usize,
        name: &str,
        kind: &str,
        desc: &str,
        raw: &str,
    ) -> Result<(), EzcfgError> {
        let Some(section) = self.current.clone() else {
            return Err(self.error(line_no, format!("parameter '{name}' appears before any section")));
        };
        check_name(name).map_err(|reason| {
            self.error(line_no, format!("invalid parameter name '{name}': {reason}"))
        })?;

        if !self.seen_params.insert(name.to_string()) {
            let warning = ParseWarning {
                path: self.path.to_path_buf(),
                line: line_no,
                section: section.clone(),
                param: name.to_string(),
            };
            tracing::warn!("{warning}");
            self.outcome.warnings.push(warning);
        }

        let target = self
            .sections
            .get_mut(&section)
            .ok_or_else(|| EzcfgError::UnknownAttribute(section.clone()))?;
        target.declare_or_update(name, kind, desc, raw, self.allow_new)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::*;
    use crate::literal::Literal;
    use crate::types::Value;

    fn parse(content: &str) -> Result<(IndexMap<String, ParameterSection>, ParseOutcome), EzcfgError> {
        let mut sections = IndexMap::new();
        let outcome = parse_into(&mut sections, content, Path::new("test.cfg"), true)?;
        Ok((sections, outcome))
    }

    fn parse_err(content: &str) -> EzcfgError {
        parse(content).unwrap_err()
    }

    #[test]
    fn classify_priority() {
        assert_eq!(classify("  [MODEL]\r\n").unwrap(), Line::Section("MODEL"));
        assert_eq!(classify("[ MODEL ]").unwrap(), Line::Section("MODEL"));
        assert_eq!(
            classify("(int) n = 7").unwrap(),
            Line::Compact {
                kind: "int",
                name: "n",
                raw: "7"
            }
        );
        assert_eq!(classify("# TYPE: float").unwrap(), Line::Type("float"));
        assert_eq!(classify("# DESC: a b").unwrap(), Line::Desc("a b"));
        assert_eq!(classify("# NOTE: hi").unwrap(), Line::Note("hi"));
        assert_eq!(classify("# TIMESTAMP: now").unwrap(), Line::Timestamp);
        assert_eq!(
            classify("url = a=b").unwrap(),
            Line::Assign {
                name: "url",
                raw: "a=b"
            }
        );
        assert_eq!(classify("# x = 1").unwrap(), Line::Ignored);
        assert_eq!(classify("").unwrap(), Line::Ignored);
        assert_eq!(classify("just words").unwrap(), Line::Ignored);
    }

    #[test]
    fn compact_lines_need_paren_and_equals() {
        assert!(classify("(int n = 7").is_err());
        assert!(classify("(int) n 7").is_err());
    }

    #[test]
    fn verbose_and_compact_mix() {
        let (sections, outcome) = parse(MODEL_DEFAULT).unwrap();
        let model = &sections["MODEL"];
        assert_eq!(model.get("learning_rate").unwrap(), &Value::Float(0.001));
        assert_eq!(model.get("batch_size").unwrap(), &Value::Int(64));
        assert_eq!(
            model.get("model_dir").unwrap(),
            &Value::Str("/home/models/test".into())
        );
        assert_eq!(
            model.get("layer_size").unwrap(),
            &Value::Obj(Literal::List(vec![
                Literal::Int(128),
                Literal::Int(64),
                Literal::Int(32)
            ]))
        );
        assert_eq!(
            model.get_info("batch_size").unwrap().description,
            "batch size"
        );
        assert_eq!(outcome.note.as_deref(), Some("image classifier defaults"));
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn compact_lines_take_pending_description() {
        let (sections, _) =
            parse("[S]\n# TYPE: int\n# DESC: count\n(float) n = 1\nplain = x\n").unwrap();
        let s = &sections["S"];
        assert_eq!(s.get_info("n").unwrap().description, "count");
        assert_eq!(s.get_info("n").unwrap().kind, ValueKind::Float);
        assert_eq!(s.get_info("plain").unwrap().description, "");
        assert_eq!(s.get_info("plain").unwrap().kind, ValueKind::Str);
    }

    #[test]
    fn pending_kind_resets_after_each_parameter() {
        let (sections, _) = parse("[S]\n# TYPE: int\na = 1\nb = 2\n").unwrap();
        assert_eq!(sections["S"].get("a").unwrap(), &Value::Int(1));
        assert_eq!(sections["S"].get("b").unwrap(), &Value::Str("2".into()));
    }

    #[test]
    fn section_header_resets_pending() {
        let (sections, _) = parse("[A]\n# TYPE: int\n[B]\nx = 5\n").unwrap();
        assert_eq!(sections["B"].get("x").unwrap(), &Value::Str("5".into()));
    }

    #[test]
    fn all_kinds() {
        let (sections, _) = parse(ALL_KINDS).unwrap();
        let s = &sections["ALL"];
        assert_eq!(s.get("n").unwrap(), &Value::Int(7));
        assert_eq!(
            s.get("arr").unwrap().as_json().unwrap().as_array().unwrap().len(),
            3
        );
        assert_eq!(
            s.get("shape").unwrap(),
            &Value::Obj(Literal::Tuple(vec![
                Literal::Int(3),
                Literal::Int(224),
                Literal::Int(224)
            ]))
        );
    }

    #[test]
    fn invalid_int_fails_coercion() {
        let err = parse_err("[S]\n(int) n = abc\n");
        assert!(matches!(err, EzcfgError::ValueCoercion { .. }));
    }

    #[test]
    fn invalid_kind_token() {
        let err = parse_err("[S]\n# TYPE: bool\nflag = true\n");
        assert!(matches!(err, EzcfgError::InvalidType { .. }));
    }

    #[test]
    fn bad_section_names() {
        for content in ["[]\n", "[_hidden]\n", "[2nd]\n", "[my section]\n", "[a-b]\n"] {
            let err = parse_err(content);
            assert!(
                matches!(err, EzcfgError::Parse { line: 1, .. }),
                "{content:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn bad_parameter_names() {
        for content in [
            "[S]\n(int) 1x = 1\n",
            "[S]\n(int) _x = 1\n",
            "[S]\nmy key = 1\n",
            "[S]\n= 1\n",
        ] {
            let err = parse_err(content);
            assert!(
                matches!(err, EzcfgError::Parse { line: 2, .. }),
                "{content:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn duplicate_section_in_one_file() {
        let err = parse_err("[A]\nx = 1\n[B]\n[A]\n");
        match err {
            EzcfgError::Parse { line, reason, .. } => {
                assert_eq!(line, 4);
                assert!(reason.contains("declared twice"));
            }
            other => panic!("Expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn section_can_grow_across_files() {
        let mut sections = IndexMap::new();
        parse_into(&mut sections, "[A]\nx = 1\n", Path::new("a.cfg"), true).unwrap();
        parse_into(&mut sections, "[A]\ny = 2\n", Path::new("b.cfg"), true).unwrap();
        assert_eq!(sections["A"].len(), 2);
    }

    #[test]
    fn parameter_without_section() {
        let err = parse_err("x = 1\n");
        assert!(matches!(err, EzcfgError::Parse { line: 1, .. }));
    }

    #[test]
    fn duplicate_parameter_warns_and_last_wins() {
        let (sections, outcome) = parse("[S]\n(int) n = 1\n(int) n = 2\n[T]\n(int) n = 3\n").unwrap();
        assert_eq!(sections["S"].get("n").unwrap(), &Value::Int(2));
        assert_eq!(outcome.warnings.len(), 1);
        let warning = &outcome.warnings[0];
        assert_eq!(warning.line, 3);
        assert_eq!(warning.section, "S");
        assert!(warning.to_string().contains("test.cfg"));
    }

    #[test]
    fn new_keys_rejected_when_not_allowed() {
        let mut sections = IndexMap::new();
        parse_into(&mut sections, LR_BATCH, Path::new("a.cfg"), true).unwrap();
        let err = parse_into(
            &mut sections,
            "[MODEL]\n(int) epochs = 3\n",
            Path::new("b.cfg"),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, EzcfgError::UnexpectedKey { .. }));
    }

    #[test]
    fn values_keep_inner_equals_signs() {
        let (sections, _) = parse("[S]\n(str) url = postgres://h/db?a=b\n").unwrap();
        assert_eq!(
            sections["S"].get("url").unwrap().as_str(),
            Some("postgres://h/db?a=b")
        );
    }
}
