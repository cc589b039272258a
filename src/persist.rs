//! Rendering a whole store back to config text.
//!
//! [`render_document`] is pure so the output can be checked without touching
//! the filesystem; the store's `write` wraps it with the current local time
//! and a file write.

use std::fmt::Write as _;

use indexmap::IndexMap;

use crate::section::ParameterSection;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Header comment block followed by every section in order.
pub fn render_document(
    sections: &IndexMap<String, ParameterSection>,
    note: &str,
    timestamp: &str,
    compact: bool,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# NOTE: {}", note.replace('\n', " "));
    let _ = writeln!(out, "# TIMESTAMP: {timestamp}\n");
    for section in sections.values() {
        out.push_str(&section.serialize(compact));
    }
    out
}

pub fn local_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}
