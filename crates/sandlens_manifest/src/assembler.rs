use chrono::Utc;
use log::{debug, trace};
use rayon::prelude::*;
use std::collections::BTreeMap;

use sandlens_core::{
    ComponentTreeBuilder, FileInfo, FileManifest, FileType, ImportGraphBuilder,
    ModuleStructure, OxcStructuralParser, ParsedModule, StructuralParser, is_source_path,
};

use crate::routes::{HeuristicRouteExtractor, RouteExtractor};

/// Relative paths that always win entry-point detection.
const PRIMARY_ENTRIES: &[&str] = &["src/main.jsx", "src/index.jsx"];
/// Relative paths used only when no primary entry was seen.
const FALLBACK_ENTRIES: &[&str] = &["src/App.jsx", "App.jsx"];

/// Turns retrieved file contents into a [`FileManifest`].
pub struct ManifestAssembler<'a> {
    parser: &'a dyn StructuralParser,
    tree_builder: &'a dyn ComponentTreeBuilder,
    route_extractor: &'a dyn RouteExtractor,
}

impl Default for ManifestAssembler<'static> {
    fn default() -> Self {
        Self {
            parser: &OxcStructuralParser,
            tree_builder: &ImportGraphBuilder,
            route_extractor: &HeuristicRouteExtractor,
        }
    }
}

impl<'a> ManifestAssembler<'a> {
    pub fn new(
        parser: &'a dyn StructuralParser,
        tree_builder: &'a dyn ComponentTreeBuilder,
        route_extractor: &'a dyn RouteExtractor,
    ) -> Self {
        Self { parser, tree_builder, route_extractor }
    }

    /// Builds a manifest from `{ relativePath: content }`.
    pub fn assemble(&self, contents: &BTreeMap<String, String>) -> FileManifest {
        let now = Utc::now().timestamp_millis();

        // Parsing needs no round-trips, so it runs in parallel
        let parsed: BTreeMap<&str, ParsedModule> = contents
            .par_iter()
            .filter(|(relative_path, _)| is_source_path(relative_path))
            .map(|(relative_path, content)| {
                let full_path = format!("/{}", relative_path);
                (relative_path.as_str(), self.parser.parse(content, &full_path))
            })
            .collect();
        debug!("Parsed {} of {} files", parsed.len(), contents.len());

        let mut manifest = FileManifest { timestamp: now, ..Default::default() };

        for (relative_path, content) in contents {
            let full_path = format!("/{}", relative_path);
            let mut info = FileInfo {
                content: content.clone(),
                file_type: FileType::Utility,
                path: full_path.clone(),
                relative_path: relative_path.clone(),
                last_modified: now,
                structure: ModuleStructure::default(),
            };

            if let Some(module) = parsed.get(relative_path.as_str()) {
                info.structure = module.structure.clone();
                if let Some(file_type) = module.file_type {
                    info.file_type = file_type;
                }

                if PRIMARY_ENTRIES.contains(&relative_path.as_str()) {
                    trace!("Entry point: {}", full_path);
                    manifest.entry_point = full_path.clone();
                }
                if FALLBACK_ENTRIES.contains(&relative_path.as_str())
                    && manifest.entry_point.is_empty()
                {
                    trace!("Fallback entry point: {}", full_path);
                    manifest.entry_point = full_path.clone();
                }
            }

            if relative_path.ends_with(".css") {
                info.file_type = FileType::Style;
                manifest.style_files.push(full_path.clone());
            }

            manifest.files.insert(full_path, info);
        }

        manifest.component_tree = self.tree_builder.build(&manifest.files);
        manifest.routes = self.route_extractor.extract(&manifest.files);

        debug!(
            "Assembled manifest: {} files, {} routes, {} style files, entry '{}'",
            manifest.files.len(),
            manifest.routes.len(),
            manifest.style_files.len(),
            manifest.entry_point
        );
        manifest
    }
}
