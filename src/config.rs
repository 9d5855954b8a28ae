//! Compiler configuration.
//!
//! Read from a JSON file; every field has a default so an empty object is a valid configuration. Command
//! line flags override individual fields after loading.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CompileError, Result};

fn default_resource_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_root_package() -> String {
    "fx2j.builder".to_string()
}

fn default_document_suffix() -> String {
    ".fxml.json".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("build/fxml")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".fxml-cache")
}

fn default_use_cache() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerConfig {
    /// Directory documents are discovered under; builder packages are derived relative to it.
    #[serde(default = "default_resource_root")]
    pub resource_root: PathBuf,

    /// Package prefix of every generated builder. May be empty.
    #[serde(default = "default_root_package")]
    pub root_package: String,

    /// File name suffix of serialized markup trees.
    #[serde(default = "default_document_suffix")]
    pub document_suffix: String,

    /// Metadata tables merged into the type universe, in order.
    #[serde(default)]
    pub metadata: Vec<PathBuf>,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            resource_root: default_resource_root(),
            root_package: default_root_package(),
            document_suffix: default_document_suffix(),
            metadata: Vec::new(),
            output_dir: default_output_dir(),
            cache_dir: default_cache_dir(),
            use_cache: default_use_cache(),
        }
    }
}

impl CompilerConfig {
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| CompileError::io(path, e))?;
        Self::from_json_str(&text).map_err(|e| CompileError::json(path, e))
    }

    /// Markup name of a serialized tree: `main-view.fxml.json` → `main-view.fxml`.
    pub fn markup_name<'p>(&self, file_name: &'p str) -> &'p str {
        let tree_extension = self.tree_extension();
        file_name.strip_suffix(tree_extension).unwrap_or(file_name)
    }

    /// What a serialized tree appends to its markup file name, `.json` for `.fxml.json`.
    pub fn tree_extension(&self) -> &str {
        match self.document_suffix.rfind('.') {
            Some(index) if index > 0 => &self.document_suffix[index..],
            _ => &self.document_suffix,
        }
    }
}
