use clap::Parser;
use log::debug;

use sandlens_core::{ScanError, ScanResult};

#[derive(Debug, Clone, Parser)]
#[command(name = "logs")]
#[command(about = "Inspect Vite dev-server logs inside the sandbox")]
pub struct LogConfig {
    /// Error snapshot left behind by earlier runs
    #[arg(long, default_value = "/tmp/vite-errors.json")]
    pub error_snapshot: String,

    /// Directory searched for Vite log files
    #[arg(long, default_value = "/tmp")]
    pub log_dir: String,

    /// Maximum number of log files searched for resolve errors
    #[arg(long, default_value = "3")]
    pub max_scanned_logs: usize,

    /// Maximum number of log files whose tail is reported
    #[arg(long, default_value = "2")]
    pub max_tailed_logs: usize,

    /// Number of trailing lines read from each reported log file
    #[arg(long, default_value = "10")]
    pub tail_lines: usize,

    /// Maximum number of matching processes listed
    #[arg(long, default_value = "3")]
    pub max_listed_processes: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            error_snapshot: "/tmp/vite-errors.json".to_string(),
            log_dir: "/tmp".to_string(),
            max_scanned_logs: 3,
            max_tailed_logs: 2,
            tail_lines: 10,
            max_listed_processes: 3,
        }
    }
}

impl LogConfig {
    pub fn validate(&self) -> ScanResult<()> {
        debug!("Validating log config: {:?}", self);
        if self.log_dir.trim().is_empty() {
            return Err(ScanError::InvalidRequest("log dir must not be empty".to_string()));
        }
        if self.tail_lines == 0 {
            return Err(ScanError::InvalidRequest(
                "tail lines must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
