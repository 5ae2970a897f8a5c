use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeMap;

use sandlens_core::{FileManifest, RemoteShell, ScanResult, Session};

use crate::{
    assembler::ManifestAssembler,
    config::ManifestConfig,
    discovery::{directory_structure, discover_files},
    retrieval::{RetrievalPolicy, SkipReason, retrieve_all},
};

/// Everything a manifest build returns to its caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxFiles {
    /// Raw `{ relativePath: content }` map of retrieved files
    pub files: BTreeMap<String, String>,
    pub structure: String,
    pub file_count: usize,
    pub manifest: FileManifest,
    #[serde(skip)]
    pub skipped: Vec<(String, SkipReason)>,
}

/// Discovers, retrieves and assembles the sandbox project, then caches the
/// manifest on the session.
pub fn fetch_sandbox_files(
    session: &mut Session,
    cfg: &ManifestConfig,
    assembler: &ManifestAssembler,
) -> ScanResult<SandboxFiles> {
    cfg.validate()?;
    info!("Fetching and analyzing file structure under {}", cfg.root);

    let shell = RemoteShell::new(session.executor()?);
    let paths = discover_files(&shell, &cfg.root)?;

    let policy =
        RetrievalPolicy { size_threshold: cfg.size_threshold, stat_flavor: cfg.stat_flavor };
    let report = retrieve_all(&shell, &cfg.root, &paths, policy);
    let structure = directory_structure(&shell, &cfg.root, cfg.structure_limit);

    let manifest = assembler.assemble(&report.fetched);
    debug!("Publishing manifest with {} files to session", manifest.files.len());
    session.publish_manifest(manifest.clone());

    Ok(SandboxFiles {
        file_count: report.fetched.len(),
        files: report.fetched,
        structure,
        manifest,
        skipped: report.skipped,
    })
}
