use log::{debug, info, trace};
use std::{collections::BTreeMap, fmt};

use sandlens_core::{ExecError, RemoteShell, StatFlavor};

use crate::discovery::relative_path;

/// Why a discovered file has no manifest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    TooLarge { size: u64, threshold: u64 },
    StatFailed { exit_code: i32 },
    UnparsableSize(String),
    ReadFailed { exit_code: i32 },
    Undecodable,
    Transport(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TooLarge { size, threshold } => {
                write!(f, "{} bytes is not below the {} byte limit", size, threshold)
            }
            SkipReason::StatFailed { exit_code } => write!(f, "stat exited with {}", exit_code),
            SkipReason::UnparsableSize(raw) => write!(f, "unparsable size '{}'", raw),
            SkipReason::ReadFailed { exit_code } => write!(f, "cat exited with {}", exit_code),
            SkipReason::Undecodable => write!(f, "content is not valid UTF-8"),
            SkipReason::Transport(msg) => write!(f, "transport failure: {}", msg),
        }
    }
}

impl From<ExecError> for SkipReason {
    fn from(err: ExecError) -> Self {
        match err {
            ExecError::Decode { .. } => SkipReason::Undecodable,
            other => SkipReason::Transport(other.to_string()),
        }
    }
}

/// Outcome of retrieving one discovered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retrieval {
    Fetched { relative_path: String, content: String },
    Skipped { path: String, reason: SkipReason },
}

#[derive(Debug, Clone, Copy)]
pub struct RetrievalPolicy {
    pub size_threshold: u64,
    pub stat_flavor: StatFlavor,
}

/// Fetches `path` if it is strictly smaller than the size threshold.
pub fn retrieve_file(
    shell: &RemoteShell,
    root: &str,
    path: &str,
    policy: RetrievalPolicy,
) -> Retrieval {
    match fetch(shell, path, policy) {
        Ok(content) => Retrieval::Fetched { relative_path: relative_path(root, path), content },
        Err(reason) => Retrieval::Skipped { path: path.to_string(), reason },
    }
}

fn fetch(shell: &RemoteShell, path: &str, policy: RetrievalPolicy) -> Result<String, SkipReason> {
    let stat = shell.stat_size(path, policy.stat_flavor)?;
    if !stat.success() {
        return Err(SkipReason::StatFailed { exit_code: stat.exit_code });
    }
    let raw = stat.stdout()?;
    let size: u64 =
        raw.trim().parse().map_err(|_| SkipReason::UnparsableSize(raw.trim().to_string()))?;
    trace!("{} is {} bytes", path, size);

    if size >= policy.size_threshold {
        return Err(SkipReason::TooLarge { size, threshold: policy.size_threshold });
    }

    let cat = shell.cat(path)?;
    if !cat.success() {
        return Err(SkipReason::ReadFailed { exit_code: cat.exit_code });
    }
    Ok(cat.stdout()?)
}

/// Retrieved contents keyed by relative path, plus what was left out.
#[derive(Debug, Clone, Default)]
pub struct RetrievalReport {
    pub fetched: BTreeMap<String, String>,
    pub skipped: Vec<(String, SkipReason)>,
}

/// Retrieves every path in turn; individual failures only add to `skipped`.
pub fn retrieve_all(
    shell: &RemoteShell,
    root: &str,
    paths: &[String],
    policy: RetrievalPolicy,
) -> RetrievalReport {
    let mut report = RetrievalReport::default();
    for path in paths {
        match retrieve_file(shell, root, path, policy) {
            Retrieval::Fetched { relative_path, content } => {
                report.fetched.insert(relative_path, content);
            }
            Retrieval::Skipped { path, reason } => {
                debug!("Skipping {}: {}", path, reason);
                report.skipped.push((path, reason));
            }
        }
    }
    info!("Retrieved {} files, skipped {}", report.fetched.len(), report.skipped.len());
    report
}
