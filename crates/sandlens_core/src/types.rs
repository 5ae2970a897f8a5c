use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Classification tag of a manifest file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Component,
    Page,
    Hook,
    Context,
    Config,
    #[default]
    Utility,
    Style,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    Static,
    Dynamic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportInfo {
    pub source: String,
    pub kind: ImportKind,
    /// Local bindings introduced by the import (empty for side-effect imports)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
}

/// Structural facts extracted from one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleStructure {
    pub imports: Vec<ImportInfo>,
    pub exports: Vec<String>,
    /// Capitalized JSX element names rendered by the file
    pub jsx_components: Vec<String>,
    pub has_jsx: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub content: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
    /// Absolute-style path rooted at `/`
    pub path: String,
    pub relative_path: String,
    pub last_modified: i64,
    #[serde(flatten)]
    pub structure: ModuleStructure,
}

/// Manifest files keyed by absolute path.
pub type FileMap = BTreeMap<String, FileInfo>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteInfo {
    pub path: String,
    /// Absolute path of the file declaring the route
    pub component: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentNode {
    pub file_type: FileType,
    pub imports: Vec<String>,
    pub imported_by: Vec<String>,
    pub renders: Vec<String>,
}

/// Dependency graph keyed by file path.
pub type ComponentTree = BTreeMap<String, ComponentNode>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileManifest {
    pub files: FileMap,
    pub routes: Vec<RouteInfo>,
    pub component_tree: ComponentTree,
    pub entry_point: String,
    pub style_files: Vec<String>,
    pub timestamp: i64,
}

pub const NPM_MISSING: &str = "npm-missing";
pub const UNKNOWN_FILE: &str = "Unknown";

/// A missing, non-relative import attributed to a package.
///
/// Fields default so that partially written snapshot records still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyError {
    #[serde(rename = "type", default = "default_error_type")]
    pub error_type: String,
    #[serde(default)]
    pub package: String,
    #[serde(default)]
    pub message: String,
    #[serde(default = "default_error_file")]
    pub file: String,
}

impl DependencyError {
    pub fn npm_missing(package: impl Into<String>, specifier: &str) -> Self {
        Self {
            error_type: NPM_MISSING.to_string(),
            package: package.into(),
            message: format!("Failed to resolve import \"{}\"", specifier),
            file: UNKNOWN_FILE.to_string(),
        }
    }
}

fn default_error_type() -> String {
    NPM_MISSING.to_string()
}

fn default_error_file() -> String {
    UNKNOWN_FILE.to_string()
}
