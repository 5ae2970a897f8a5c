use log::{debug, info, trace};
use serde::Serialize;
use std::fmt;

use sandlens_core::{RemoteShell, ScanResult, Session};

use crate::{config::LogConfig, miner::find_vite_files};

const PROCESS_MARKERS: &[&str] = &["vite", "npm run dev"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViteStatus {
    Running,
    #[default]
    Stopped,
}

impl fmt::Display for ViteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViteStatus::Running => write!(f, "running"),
            ViteStatus::Stopped => write!(f, "stopped"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogStatus {
    pub has_errors: bool,
    pub logs: Vec<String>,
    pub status: ViteStatus,
}

/// Reports whether the dev server is running and the tail of its log files.
///
/// A transport failure while listing processes fails the call; everything
/// after that is best-effort.
pub fn sandbox_logs(session: &Session, cfg: &LogConfig) -> ScanResult<LogStatus> {
    cfg.validate()?;
    info!("Fetching Vite dev server logs");
    let shell = RemoteShell::new(session.executor()?);

    let mut result = LogStatus::default();

    let ps = shell.ps_aux()?;
    if ps.success() {
        let listing = ps.stdout_lossy();
        let processes: Vec<&str> = listing.lines().filter(|line| is_vite_process(line)).collect();
        debug!("{} Vite processes", processes.len());

        if processes.is_empty() {
            result.logs.push("Vite process not found".to_string());
        } else {
            result.status = ViteStatus::Running;
            result.logs.push("Vite is running".to_string());
            result.logs.extend(
                processes.iter().take(cfg.max_listed_processes).map(|line| line.to_string()),
            );
        }
    } else {
        trace!("ps exited with {}", ps.exit_code);
    }

    let log_files = find_vite_files(&shell, &cfg.log_dir, &["*vite*", "*.log"]);
    for log_file in log_files.iter().take(cfg.max_tailed_logs) {
        match shell.tail(cfg.tail_lines, log_file) {
            Ok(output) if output.success() => {
                result.logs.push(format!("--- {} ---", log_file));
                result.logs.push(output.stdout_lossy());
            }
            Ok(output) => trace!("tail exited with {} for {}", output.exit_code, log_file),
            Err(e) => debug!("Skipping {}: {}", log_file, e),
        }
    }

    Ok(result)
}

fn is_vite_process(line: &str) -> bool {
    let line = line.to_lowercase();
    PROCESS_MARKERS.iter().any(|marker| line.contains(marker))
}
