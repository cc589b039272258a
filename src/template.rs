//! Starter config showing both declaration styles.

use std::path::Path;

use crate::error::EzcfgError;
use crate::file;

pub const TEMPLATE: &str = "\
# Kinds: str, int, float, json (JSON text) and obj (plain literals such as
# lists, tuples, dicts, numbers, quoted strings, True/False/None).
#
# Verbose style: a parameter is preceded by optional \"# TYPE:\" and
# \"# DESC:\" lines. The kind defaults to str and the description to empty.
# Both lines must start exactly with \"# TYPE:\" / \"# DESC:\".
#
# Compact style: (kind) name = value, on a single line.
#
# [NAME] opens a section; every parameter belongs to one. Section and
# parameter names may contain letters, digits and '_', and must not start
# with a digit or '_'.

[MODEL]
# TYPE: float
# DESC: initial learning rate
learning_rate = 1e-3

# TYPE: int
# DESC: batch size
batch_size = 64

# TYPE: str
# DESC: model storage directory
model_dir = /home/user/models/test

# compact style
(obj) layer_size = [128, 64, 32]
";

/// Write [`TEMPLATE`] to `path`.
pub fn write_template(path: &Path) -> Result<(), EzcfgError> {
    file::write_config(path, TEMPLATE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;
    use indexmap::IndexMap;
    use tempfile::TempDir;

    #[test]
    fn template_is_a_valid_config() {
        let mut sections = IndexMap::new();
        let outcome =
            crate::parse::parse_into(&mut sections, TEMPLATE, Path::new("t.cfg"), true).unwrap();
        assert!(outcome.warnings.is_empty());
        let model = &sections["MODEL"];
        assert_eq!(model.len(), 4);
        assert_eq!(model.get("batch_size").unwrap(), &Value::Int(64));
    }

    #[test]
    fn write_template_to_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("starter.cfg");
        write_template(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), TEMPLATE);
    }
}
