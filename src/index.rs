//! The flat index: short names resolved to sections or parameters.
//!
//! Section names are claimed first and always win. A parameter name declared
//! in exactly one section resolves to that section; one declared in two or
//! more becomes [`IndexEntry::Vague`], recording every candidate. The index is
//! derived data and is rebuilt in full after every structural change.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::section::ParameterSection;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexEntry {
    Section,
    /// The name is a parameter of this section.
    Param { section: String },
    /// The name is a parameter of several sections.
    Vague { sections: Vec<String> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatIndex {
    entries: HashMap<String, IndexEntry>,
}

impl FlatIndex {
    pub fn build(sections: &IndexMap<String, ParameterSection>) -> Self {
        let mut entries: HashMap<String, IndexEntry> = sections
            .keys()
            .map(|name| (name.clone(), IndexEntry::Section))
            .collect();

        for (section, params) in sections {
            for param in params.names() {
                match entries.get_mut(param) {
                    None => {
                        entries.insert(
                            param.to_string(),
                            IndexEntry::Param {
                                section: section.clone(),
                            },
                        );
                    }
                    Some(entry) => match entry {
                        IndexEntry::Section => {}
                        IndexEntry::Param { section: first } => {
                            let first = std::mem::take(first);
                            *entry = IndexEntry::Vague {
                                sections: vec![first, section.clone()],
                            };
                        }
                        IndexEntry::Vague { sections } => sections.push(section.clone()),
                    },
                }
            }
        }

        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&IndexEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `name` resolves to exactly one parameter.
    pub fn is_unique_param(&self, name: &str) -> bool {
        matches!(self.entries.get(name), Some(IndexEntry::Param { .. }))
    }
}
