use log::{debug, info};

use crate::{
    error::{ScanError, ScanResult},
    exec::CommandExecutor,
    types::FileManifest,
};

/// One caller's view of one sandbox.
///
/// Owns the execution transport and the most recently built manifest.
/// Dropping or closing the session releases both.
#[derive(Default)]
pub struct Session {
    executor: Option<Box<dyn CommandExecutor>>,
    manifest: Option<FileManifest>,
}

impl Session {
    pub fn new(executor: impl CommandExecutor + 'static) -> Self {
        info!("Opening sandbox session");
        Self { executor: Some(Box::new(executor)), manifest: None }
    }

    /// A session with no sandbox attached; every operation fails with 404.
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.executor.is_some()
    }

    pub fn executor(&self) -> ScanResult<&dyn CommandExecutor> {
        self.executor.as_deref().ok_or(ScanError::NoActiveSandbox)
    }

    /// Replaces any previously cached manifest.
    pub fn publish_manifest(&mut self, manifest: FileManifest) {
        debug!("Caching manifest with {} files", manifest.files.len());
        self.manifest = Some(manifest);
    }

    pub fn manifest(&self) -> Option<&FileManifest> {
        self.manifest.as_ref()
    }

    pub fn close(&mut self) {
        info!("Closing sandbox session");
        self.executor = None;
        self.manifest = None;
    }
}
