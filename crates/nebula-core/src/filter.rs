// Nested-key filter engine
//
// Selects or removes sub-trees of a configuration document by dotted path
// (`reply.host.force4`). Pure: no I/O, no knowledge of categories. Paths
// that do not resolve are skipped with a warning.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use nebula_api::ConfigDocument;

/// Whether a filter keeps or drops the listed paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum FilterMode {
    Include,
    Exclude,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("both include and exclude keys are set")]
    ConflictingModes,

    #[error("empty key path in filter")]
    EmptyPath,
}

/// A validated filter: one mode plus the ordered key paths it applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    mode: FilterMode,
    keys: Vec<String>,
}

impl FilterSpec {
    pub fn new(mode: FilterMode, keys: Vec<String>) -> Result<Self, FilterError> {
        if keys.iter().any(|key| key.trim().is_empty()) {
            return Err(FilterError::EmptyPath);
        }
        Ok(Self { mode, keys })
    }

    /// Build a filter from separately configured include and exclude lists.
    ///
    /// Neither list set yields `None` (take the whole category). Setting both
    /// is rejected.
    pub fn from_lists(
        include: Option<Vec<String>>,
        exclude: Option<Vec<String>>,
    ) -> Result<Option<Self>, FilterError> {
        let include = include.filter(|keys| !keys.is_empty());
        let exclude = exclude.filter(|keys| !keys.is_empty());

        match (include, exclude) {
            (Some(_), Some(_)) => Err(FilterError::ConflictingModes),
            (Some(keys), None) => Self::new(FilterMode::Include, keys).map(Some),
            (None, Some(keys)) => Self::new(FilterMode::Exclude, keys).map(Some),
            (None, None) => Ok(None),
        }
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Apply this filter to `document`, returning a new document.
    pub fn apply(&self, document: &ConfigDocument) -> ConfigDocument {
        filter(self.mode, &self.keys, document)
    }
}

/// Filter `document` by `mode` over the dotted `keys`.
pub fn filter<S: AsRef<str>>(mode: FilterMode, keys: &[S], document: &ConfigDocument) -> ConfigDocument {
    match mode {
        FilterMode::Include => include_keys(document, keys),
        FilterMode::Exclude => exclude_keys(document, keys),
    }
}

/// Copy only the requested paths (leaf or sub-tree) into a fresh document.
fn include_keys<S: AsRef<str>>(document: &ConfigDocument, keys: &[S]) -> ConfigDocument {
    let mut result = Map::new();

    for key in keys {
        let key = key.as_ref();
        let segments: Vec<&str> = key.split('.').collect();
        match get_nested(document, &segments) {
            Some(value) => set_nested(&mut result, &segments, value.clone()),
            None => warn!(key, "attempted to include missing config"),
        }
    }

    result
}

/// Deep-copy the document and remove each requested path.
fn exclude_keys<S: AsRef<str>>(document: &ConfigDocument, keys: &[S]) -> ConfigDocument {
    let mut result = document.clone();

    for key in keys {
        let key = key.as_ref();
        let segments: Vec<&str> = key.split('.').collect();
        if !remove_nested(&mut result, &segments) {
            warn!(key, "attempted to exclude missing config");
        }
    }

    result
}

fn get_nested<'a>(document: &'a ConfigDocument, segments: &[&str]) -> Option<&'a Value> {
    let (last, parents) = segments.split_last()?;
    let mut current = document;
    for segment in parents {
        match current.get(*segment)? {
            Value::Object(next) => current = next,
            _ => return None,
        }
    }
    current.get(*last)
}

fn set_nested(target: &mut ConfigDocument, segments: &[&str], value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut current = target;
    for segment in parents {
        let entry = current
            .entry((*segment).to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Value::Object(next) = entry else {
            return;
        };
        current = next;
    }

    current.insert((*last).to_owned(), value);
}

/// Remove the path; returns `false` if it did not resolve.
///
/// A parent left empty by the removal is removed too, recursively. Parents
/// that were already empty or still hold other keys stay.
fn remove_nested(target: &mut ConfigDocument, segments: &[&str]) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        return false;
    };

    if rest.is_empty() {
        return target.remove(*first).is_some();
    }

    let Some(Value::Object(nested)) = target.get_mut(*first) else {
        return false;
    };

    let removed = remove_nested(nested, rest);
    if removed && nested.is_empty() {
        target.remove(*first);
    }
    removed
}
