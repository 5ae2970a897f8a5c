//! Constants for file extensions and discovery policy.
//!
//! Centralizes extension handling so discovery, parsing, tree resolution and
//! route derivation agree on what a source file is.

/// Extensions that go through the structural parser
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "jsx", // JavaScript with JSX
    "js",  // JavaScript
    "tsx", // TypeScript with JSX
    "ts",  // TypeScript
];

/// Extensions collected by file discovery
pub const DISCOVERY_EXTENSIONS: &[&str] = &["jsx", "js", "tsx", "ts", "css", "json"];

/// Directory names pruned from the file walk
pub const PRUNED_DIRS: &[&str] = &["node_modules", ".git", "dist", "build"];

/// Directory names excluded from the structure summary
pub const STRUCTURE_EXCLUDED_DIRS: &[&str] = &["node_modules", ".git"];

/// Extensions to try when resolving an extensionless relative import (in priority order)
pub const RESOLVE_EXTENSIONS: &[&str] = &["jsx", "tsx", "js", "ts"];

/// Index file names to try when resolving directory imports
pub const INDEX_FILES: &[&str] = &["index.jsx", "index.tsx", "index.js", "index.ts"];

/// Files at or above this size (bytes) are listed but never read
pub const DEFAULT_SIZE_THRESHOLD: u64 = 10_000;

/// Maximum number of directory lines kept in the structure summary
pub const DEFAULT_STRUCTURE_LIMIT: usize = 50;

/// Returns true if `path` ends with one of the structurally parsed extensions
pub fn is_source_path(path: &str) -> bool {
    path.rsplit_once('.').is_some_and(|(_, ext)| SOURCE_EXTENSIONS.contains(&ext))
}
