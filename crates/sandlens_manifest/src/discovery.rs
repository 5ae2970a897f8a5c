use log::{debug, info, trace, warn};

use sandlens_core::{
    DISCOVERY_EXTENSIONS, PRUNED_DIRS, RemoteShell, STRUCTURE_EXCLUDED_DIRS, ScanError, ScanResult,
    non_blank_lines,
};

/// `find` arguments that prune build and VCS directories and keep only
/// regular files with a discovery extension.
pub fn discovery_args(root: &str) -> Vec<String> {
    let mut args = vec![root.to_string()];
    for &dir in PRUNED_DIRS {
        args.extend(["-name", dir, "-prune", "-o"].map(String::from));
    }
    args.extend(["-type", "f", "("].map(String::from));
    for (idx, ext) in DISCOVERY_EXTENSIONS.iter().enumerate() {
        if idx > 0 {
            args.push("-o".to_string());
        }
        args.push("-name".to_string());
        args.push(format!("*.{}", ext));
    }
    args.extend([")", "-print"].map(String::from));
    args
}

/// Lists candidate source files under `root`.
///
/// There is no partial discovery: a failing `find` aborts the build.
pub fn discover_files(shell: &RemoteShell, root: &str) -> ScanResult<Vec<String>> {
    debug!("Discovering files under {}", root);
    let args = discovery_args(root);
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

    let output = shell.find(&arg_refs)?;
    if !output.success() {
        warn!("File discovery failed with exit code {}", output.exit_code);
        return Err(ScanError::DiscoveryFailed { exit_code: output.exit_code });
    }

    // Odd names survive as U+FFFD and are skipped later at stat
    let files = non_blank_lines(&output.stdout_lossy());
    info!("Found {} files", files.len());
    Ok(files)
}

/// Path relative to the project root, without a leading `./` or `/`.
pub fn relative_path(root: &str, found: &str) -> String {
    let trimmed = found.strip_prefix("./").unwrap_or(found);
    // `/` trims to "" and `./` to "", both leave `trimmed` as is
    let root = root.strip_prefix("./").unwrap_or(root).trim_end_matches('/');
    let rest = match trimmed.strip_prefix(root) {
        Some(rest) if !root.is_empty() && root != "." && rest.starts_with('/') => rest,
        _ => trimmed,
    };
    rest.trim_start_matches('/').to_string()
}

/// First `limit` directories under `root`, newline separated.
///
/// Best effort: any failure yields an empty string.
pub fn directory_structure(shell: &RemoteShell, root: &str, limit: usize) -> String {
    let mut args = vec![root.to_string(), "-type".to_string(), "d".to_string()];
    for dir in STRUCTURE_EXCLUDED_DIRS {
        args.extend(["-not".to_string(), "-path".to_string(), format!("*/{}*", dir)]);
    }
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

    let lines = match shell.find(&arg_refs).map(|output| RemoteShell::lines_if_success(&output)) {
        Ok(Some(lines)) => lines,
        Ok(None) => {
            debug!("Directory walk exited non-zero, structure left empty");
            return String::new();
        }
        Err(e) => {
            warn!("Directory walk failed: {}", e);
            return String::new();
        }
    };

    trace!("Directory walk returned {} entries, keeping {}", lines.len(), limit);
    lines.into_iter().take(limit).collect::<Vec<_>>().join("\n")
}
