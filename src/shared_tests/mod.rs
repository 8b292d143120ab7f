//! Shared test corpus: fixture types and the loader that reads them from disk.
//!
//! The corpus root holds three folders. `context-lists` holds `ContextTest`
//! files, `functions` holds `FunctionTest` files and `invalid` holds
//! `FunctionTest` files that expect a failure. Sub-folders nest freely and are
//! mirrored as nested `TestFolder`s.

mod runner;

pub use runner::{run_context_test, run_folder, run_function_test, RunSummary, TestOutcome};

use crate::context::{DataSources, NodeContext};
use crate::errors::FixtureError;
use itertools::Itertools;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Fields every fixture carries.
#[derive(Debug, Clone, Deserialize)]
pub struct SharedTest {
    pub name: String,
    /// `layouts`, `dataModel`, `instanceContext` and `frontendSettings`.
    #[serde(flatten)]
    pub sources: DataSources,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextTest {
    #[serde(flatten)]
    pub base: SharedTest,
    pub expected_contexts: Vec<NodeContext>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionTest {
    #[serde(flatten)]
    pub base: SharedTest,
    /// Kept raw: invalid fixtures hold expressions that do not parse.
    pub expression: Value,
    /// `Some(Value::Null)` when the fixture expects null.
    #[serde(default, deserialize_with = "present")]
    pub expects: Option<Value>,
    #[serde(default)]
    pub expects_failure: Option<String>,
    #[serde(default)]
    pub context: Option<NodeContext>,
}

fn present<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(d).map(Some)
}

/// A fixture type the loader can produce.
pub trait SharedTestCase: DeserializeOwned {
    fn base(&self) -> &SharedTest;
    fn base_mut(&mut self) -> &mut SharedTest;

    fn name(&self) -> &str {
        &self.base().name
    }
}

impl SharedTestCase for ContextTest {
    fn base(&self) -> &SharedTest {
        &self.base
    }
    fn base_mut(&mut self) -> &mut SharedTest {
        &mut self.base
    }
}

impl SharedTestCase for FunctionTest {
    fn base(&self) -> &SharedTest {
        &self.base
    }
    fn base_mut(&mut self) -> &mut SharedTest {
        &mut self.base
    }
}

#[derive(Debug, Clone)]
pub enum TestEntry<T> {
    Folder(TestFolder<T>),
    Test(T),
}

/// A directory of fixtures, mirroring the layout on disk.
#[derive(Debug, Clone)]
pub struct TestFolder<T> {
    pub folder_name: String,
    pub content: Vec<TestEntry<T>>,
}

impl<T> TestFolder<T> {
    /// Every fixture in this folder and below, depth first.
    pub fn tests(&self) -> Vec<&T> {
        let mut out = Vec::new();
        self.collect_into(&mut out);
        out
    }

    fn collect_into<'a>(&'a self, out: &mut Vec<&'a T>) {
        for entry in &self.content {
            match entry {
                TestEntry::Folder(f) => f.collect_into(out),
                TestEntry::Test(t) => out.push(t),
            }
        }
    }

    pub fn subfolders(&self) -> impl Iterator<Item = &TestFolder<T>> {
        self.content.iter().filter_map(|e| match e {
            TestEntry::Folder(f) => Some(f),
            TestEntry::Test(_) => None,
        })
    }
}

/// The three top-level folders of the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderKind {
    ContextLists,
    Functions,
    Invalid,
}

impl FolderKind {
    pub fn dir_name(self) -> &'static str {
        match self {
            FolderKind::ContextLists => "context-lists",
            FolderKind::Functions => "functions",
            FolderKind::Invalid => "invalid",
        }
    }
}

/// Load `root/<sub_path>` recursively. Entries are visited in file name
/// order and each fixture name gets ` (<file name>)` appended.
pub fn load_shared_tests<T: SharedTestCase>(
    root: &Path,
    sub_path: &str,
) -> Result<TestFolder<T>, FixtureError> {
    load_dir(&root.join(sub_path), sub_path.to_string())
}

pub fn load_context_lists(root: &Path) -> Result<TestFolder<ContextTest>, FixtureError> {
    load_shared_tests(root, FolderKind::ContextLists.dir_name())
}

pub fn load_functions(root: &Path) -> Result<TestFolder<FunctionTest>, FixtureError> {
    load_shared_tests(root, FolderKind::Functions.dir_name())
}

pub fn load_invalid(root: &Path) -> Result<TestFolder<FunctionTest>, FixtureError> {
    load_shared_tests(root, FolderKind::Invalid.dir_name())
}

fn load_dir<T: SharedTestCase>(dir: &Path, folder_name: String) -> Result<TestFolder<T>, FixtureError> {
    if !dir.is_dir() {
        return Err(FixtureError::NotFound(dir.to_path_buf()));
    }
    let io_err = |source| FixtureError::Io {
        path: dir.to_path_buf(),
        source,
    };
    // `DirEntry::file_type` does not follow symlinks.
    let entries = fs::read_dir(dir)
        .map_err(io_err)?
        .map(|entry| entry.and_then(|e| Ok((e.path(), e.file_type()?))))
        .collect::<Result<Vec<(PathBuf, fs::FileType)>, _>>()
        .map_err(io_err)?;

    tracing::debug!(folder = %dir.display(), entries = entries.len(), "loading fixture folder");
    let mut content = Vec::new();
    for (path, file_type) in entries
        .into_iter()
        .sorted_by(|(a, _), (b, _)| a.file_name().cmp(&b.file_name()))
    {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if file_type.is_dir() {
            content.push(TestEntry::Folder(load_dir(&path, file_name)?));
        } else if file_type.is_symlink() && path.is_dir() {
            tracing::debug!(path = %path.display(), "skipping symlinked folder");
        } else if file_name.ends_with(".json") {
            content.push(TestEntry::Test(load_file::<T>(&path, &file_name)?));
        }
    }
    Ok(TestFolder {
        folder_name,
        content,
    })
}

fn load_file<T: SharedTestCase>(path: &Path, file_name: &str) -> Result<T, FixtureError> {
    let raw = fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut test: T = serde_json::from_str(&raw).map_err(|source| FixtureError::Parse {
        file: path.to_path_buf(),
        source,
    })?;
    test.base_mut().name.push_str(&format!(" ({file_name})"));
    tracing::debug!(name = test.name(), "loaded fixture");
    Ok(test)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn expects_null_is_distinct_from_missing() {
        let with_null: FunctionTest = serde_json::from_value(json!({
            "name": "null", "expression": ["dataModel", "Missing"], "expects": null
        }))
        .unwrap();
        assert_eq!(with_null.expects, Some(Value::Null));

        let failing: FunctionTest = serde_json::from_value(json!({
            "name": "fail", "expression": ["rowIndex"], "expectsFailure": "rowIndex"
        }))
        .unwrap();
        assert_eq!(failing.expects, None);
    }

    #[test]
    fn shared_fields_are_flattened() {
        let test: FunctionTest = serde_json::from_value(json!({
            "name": "settings",
            "expression": ["frontendSettings", "a"],
            "expects": 1,
            "frontendSettings": {"a": 1},
            "dataModel": {"x": true}
        }))
        .unwrap();
        assert_eq!(test.base.sources.application_settings.get("a"), Some(&json!(1)));
        assert_eq!(test.base.sources.form_data, json!({"x": true}));
    }
}
