use dashmap::DashMap;
use log::{debug, trace};
use path_clean::clean;
use rayon::prelude::*;
use std::path::Path;

use crate::{
    constants::{INDEX_FILES, RESOLVE_EXTENSIONS, is_source_path},
    types::{ComponentNode, ComponentTree, FileMap},
};

/// Turns per-file structure into a dependency graph.
pub trait ComponentTreeBuilder: Send + Sync {
    fn build(&self, files: &FileMap) -> ComponentTree;
}

/// Builds the graph from relative imports that land on other manifest files.
///
/// Package imports and imports of files outside the manifest produce no edge.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportGraphBuilder;

impl ComponentTreeBuilder for ImportGraphBuilder {
    fn build(&self, files: &FileMap) -> ComponentTree {
        let resolve_cache: DashMap<(String, String), Option<String>> = DashMap::new();

        let edges: Vec<(String, Vec<String>)> = files
            .par_iter()
            .filter(|(path, _)| is_source_path(path))
            .map(|(path, info)| {
                let mut targets: Vec<String> = Vec::new();
                for import in &info.structure.imports {
                    if let Some(target) = resolve_in_manifest(files, path, &import.source, &resolve_cache)
                        && !targets.contains(&target)
                    {
                        targets.push(target);
                    }
                }
                (path.clone(), targets)
            })
            .collect();

        let mut tree = ComponentTree::new();
        for (path, imports) in &edges {
            let Some(info) = files.get(path) else { continue };
            tree.insert(
                path.clone(),
                ComponentNode {
                    file_type: info.file_type,
                    imports: imports.clone(),
                    imported_by: Vec::new(),
                    renders: info.structure.jsx_components.clone(),
                },
            );
        }

        for (path, imports) in edges {
            for target in imports {
                if let Some(node) = tree.get_mut(&target)
                    && !node.imported_by.contains(&path)
                {
                    node.imported_by.push(path.clone());
                }
            }
        }

        debug!(
            "Built component tree with {} nodes ({} cached resolutions)",
            tree.len(),
            resolve_cache.len()
        );
        tree
    }
}

/// Resolves `request` made from `from_file` to a key of `files`.
pub fn resolve_in_manifest(
    files: &FileMap,
    from_file: &str,
    request: &str,
    cache: &DashMap<(String, String), Option<String>>,
) -> Option<String> {
    if !(request.starts_with("./") || request.starts_with("../") || request.starts_with('/')) {
        trace!("Not a manifest-relative import: '{}'", request);
        return None;
    }

    let key = (from_file.to_string(), request.to_string());
    if let Some(v) = cache.get(&key) {
        trace!("Cache hit for resolve: '{}' from {}", request, from_file);
        return v.clone();
    }

    let base = Path::new(from_file).parent().unwrap_or(Path::new("/"));
    let candidate = clean(base.join(request)).to_string_lossy().into_owned();
    let resolved = resolve_candidate(files, &candidate);
    trace!("Resolved '{}' from {} to {:?}", request, from_file, resolved);

    cache.insert(key, resolved.clone());
    resolved
}

fn resolve_candidate(files: &FileMap, candidate: &str) -> Option<String> {
    if files.contains_key(candidate) {
        return Some(candidate.to_string());
    }

    for ext in RESOLVE_EXTENSIONS {
        let with_ext = format!("{}.{}", candidate, ext);
        if files.contains_key(&with_ext) {
            return Some(with_ext);
        }
    }

    let dir = candidate.trim_end_matches('/');
    for index_file in INDEX_FILES {
        let index = format!("{}/{}", dir, index_file);
        if files.contains_key(&index) {
            return Some(index);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FileInfo, FileType, ImportInfo, ImportKind, ModuleStructure};

    fn file(path: &str, file_type: FileType, imports: &[&str], renders: &[&str]) -> (String, FileInfo) {
        let structure = ModuleStructure {
            imports: imports
                .iter()
                .map(|s| ImportInfo { source: s.to_string(), kind: ImportKind::Static, names: vec![] })
                .collect(),
            exports: vec![],
            jsx_components: renders.iter().map(|s| s.to_string()).collect(),
            has_jsx: !renders.is_empty(),
        };
        (
            path.to_string(),
            FileInfo {
                content: String::new(),
                file_type,
                path: path.to_string(),
                relative_path: path.trim_start_matches('/').to_string(),
                last_modified: 0,
                structure,
            },
        )
    }

    fn sample() -> FileMap {
        FileMap::from([
            file("/src/main.jsx", FileType::Utility, &["react", "./App", "./index.css"], &["App"]),
            file("/src/App.jsx", FileType::Component, &["./components/Header", "./lib"], &["Header"]),
            file("/src/components/Header.jsx", FileType::Component, &["../lib/format.js"], &[]),
            file("/src/lib/index.js", FileType::Utility, &[], &[]),
            file("/src/lib/format.js", FileType::Utility, &[], &[]),
            file("/src/index.css", FileType::Style, &[], &[]),
        ])
    }

    #[test]
    fn test_resolves_extension_and_index() {
        let files = sample();
        let cache = DashMap::new();
        assert_eq!(
            resolve_in_manifest(&files, "/src/main.jsx", "./App", &cache),
            Some("/src/App.jsx".to_string())
        );
        assert_eq!(
            resolve_in_manifest(&files, "/src/App.jsx", "./lib", &cache),
            Some("/src/lib/index.js".to_string())
        );
        assert_eq!(
            resolve_in_manifest(&files, "/src/components/Header.jsx", "../lib/format.js", &cache),
            Some("/src/lib/format.js".to_string())
        );
        assert_eq!(resolve_in_manifest(&files, "/src/main.jsx", "react", &cache), None);
        assert_eq!(resolve_in_manifest(&files, "/src/main.jsx", "./missing", &cache), None);
    }

    #[test]
    fn test_resolve_cache_is_used() {
        let files = sample();
        let cache = DashMap::new();
        resolve_in_manifest(&files, "/src/main.jsx", "./App", &cache);
        resolve_in_manifest(&files, "/src/main.jsx", "./App", &cache);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_tree_edges_and_reverse_edges() {
        let tree = ImportGraphBuilder.build(&sample());

        // Style files are not nodes
        assert_eq!(tree.len(), 5);
        assert!(!tree.contains_key("/src/index.css"));

        let main = &tree["/src/main.jsx"];
        assert_eq!(main.imports, vec!["/src/App.jsx", "/src/index.css"]);
        assert_eq!(main.renders, vec!["App"]);

        let app = &tree["/src/App.jsx"];
        assert_eq!(app.file_type, FileType::Component);
        assert_eq!(app.imported_by, vec!["/src/main.jsx"]);
        assert_eq!(app.imports, vec!["/src/components/Header.jsx", "/src/lib/index.js"]);

        let format = &tree["/src/lib/format.js"];
        assert_eq!(format.imported_by, vec!["/src/components/Header.jsx"]);
    }

    #[test]
    fn test_empty_manifest() {
        assert!(ImportGraphBuilder.build(&FileMap::new()).is_empty());
    }
}
