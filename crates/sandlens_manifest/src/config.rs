use clap::Parser;
use log::debug;

use sandlens_core::{DEFAULT_SIZE_THRESHOLD, DEFAULT_STRUCTURE_LIMIT, ScanError, ScanResult, StatFlavor};

#[derive(Debug, Clone, Parser)]
#[command(name = "files")]
#[command(about = "Build a file manifest of the project inside the sandbox")]
pub struct ManifestConfig {
    /// Project root inside the sandbox
    #[arg(long, default_value = ".")]
    pub root: String,

    /// Files of this many bytes or more are listed but not read
    #[arg(long, default_value_t = DEFAULT_SIZE_THRESHOLD)]
    pub size_threshold: u64,

    /// Maximum number of directories in the structure summary
    #[arg(long, default_value_t = DEFAULT_STRUCTURE_LIMIT)]
    pub structure_limit: usize,

    /// `stat` dialect of the sandbox (gnu or bsd)
    #[arg(long, default_value_t = StatFlavor::Gnu)]
    pub stat_flavor: StatFlavor,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            root: ".".to_string(),
            size_threshold: DEFAULT_SIZE_THRESHOLD,
            structure_limit: DEFAULT_STRUCTURE_LIMIT,
            stat_flavor: StatFlavor::Gnu,
        }
    }
}

impl ManifestConfig {
    /// Reject configurations that cannot produce a meaningful manifest
    pub fn validate(&self) -> ScanResult<()> {
        debug!("Validating manifest config: {:?}", self);
        if self.root.trim().is_empty() {
            return Err(ScanError::InvalidRequest("root must not be empty".to_string()));
        }
        if self.size_threshold == 0 {
            return Err(ScanError::InvalidRequest(
                "size threshold must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
