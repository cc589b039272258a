use indexmap::IndexMap;

use crate::error::EzcfgError;
use crate::section::{Declaration, ParameterSection};

/// Merge `overlay` sections into `base`.
///
/// Missing sections are created. A parameter is copied (kind, description
/// and value) when `base` does not have it yet, or always when `overwrite` is
/// set. Locked parameters in `base` keep their value either way. Returns the
/// number of parameters that were created or updated.
pub fn merge_sections(
    base: &mut IndexMap<String, ParameterSection>,
    overlay: &IndexMap<String, ParameterSection>,
    overwrite: bool,
) -> Result<usize, EzcfgError> {
    let mut changed = 0;
    for (name, other) in overlay {
        let local = base
            .entry(name.clone())
            .or_insert_with(|| ParameterSection::new(name));
        for param in other.names() {
            if local.contains(param) && !overwrite {
                continue;
            }
            let info = other.get_info(param)?;
            let outcome = local.declare_or_update(
                param,
                info.kind.as_str(),
                &info.description,
                &info.text,
                true,
            )?;
            if outcome != Declaration::SkippedLocked {
                changed += 1;
            }
        }
    }
    Ok(changed)
}
