use log::{debug, info, trace, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

use sandlens_core::{
    DependencyError, NPM_MISSING, RemoteShell, ScanResult, Session, UNKNOWN_FILE,
};

use crate::config::LogConfig;

const RESOLVE_SIGNATURE: &str = "failed to resolve import";

/// First double-quoted, non-empty substring of a line
static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]+)""#).unwrap());

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViteErrors {
    pub has_errors: bool,
    pub errors: Vec<DependencyError>,
}

/// Collects missing-package errors from the error snapshot and live Vite logs.
///
/// Only a missing sandbox or a bad config fail the call; every command
/// failure along the way just contributes nothing.
pub fn monitor_vite_logs(session: &Session, cfg: &LogConfig) -> ScanResult<ViteErrors> {
    cfg.validate()?;
    info!("Checking Vite process logs");
    let shell = RemoteShell::new(session.executor()?);

    let mut errors = read_error_snapshot(&shell, &cfg.error_snapshot);
    debug!("Seeded {} errors from snapshot", errors.len());
    scan_vite_logs(&shell, cfg, &mut errors);

    let errors = dedupe_by_package(errors);
    info!("Found {} missing packages", errors.len());
    Ok(ViteErrors { has_errors: !errors.is_empty(), errors })
}

/// Errors recorded by a previous run, or nothing if absent or malformed.
pub fn read_error_snapshot(shell: &RemoteShell, path: &str) -> Vec<DependencyError> {
    let text = match shell.cat(path) {
        Ok(output) if output.success() => match output.stdout() {
            Ok(text) => text,
            Err(e) => {
                debug!("Unreadable error snapshot {}: {}", path, e);
                return Vec::new();
            }
        },
        Ok(output) => {
            trace!("No error snapshot at {} (exit {})", path, output.exit_code);
            return Vec::new();
        }
        Err(e) => {
            warn!("Failed to read error snapshot {}: {}", path, e);
            return Vec::new();
        }
    };

    let snapshot: Value = match serde_json::from_str(&text) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            debug!("Ignoring malformed error snapshot {}: {}", path, e);
            return Vec::new();
        }
    };

    // Records are read one by one so a bad record only loses itself
    let Some(records) = snapshot.get("errors").and_then(Value::as_array) else {
        trace!("Error snapshot {} has no errors list", path);
        return Vec::new();
    };
    records.iter().filter_map(snapshot_record).collect()
}

/// A snapshot record with scalar fields coerced to text and the rest defaulted.
fn snapshot_record(record: &Value) -> Option<DependencyError> {
    let fields = record.as_object()?;
    let text = |key: &str| match fields.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    };
    Some(DependencyError {
        error_type: text("type").unwrap_or_else(|| NPM_MISSING.to_string()),
        package: text("package").unwrap_or_default(),
        message: text("message").unwrap_or_default(),
        file: text("file").unwrap_or_else(|| UNKNOWN_FILE.to_string()),
    })
}

/// Files under `dir` matching every `-name` pattern, or none on failure.
pub fn find_vite_files(shell: &RemoteShell, dir: &str, name_patterns: &[&str]) -> Vec<String> {
    let mut args = vec![dir];
    for &pattern in name_patterns {
        args.extend(["-name", pattern]);
    }
    args.extend(["-type", "f"]);

    match shell.find(&args).map(|output| RemoteShell::lines_if_success(&output)) {
        Ok(Some(files)) => files,
        Ok(None) => Vec::new(),
        Err(e) => {
            debug!("Log file search in {} failed: {}", dir, e);
            Vec::new()
        }
    }
}

/// Greps up to `max_scanned_logs` Vite files and appends one error per
/// package not already in `errors`.
pub fn scan_vite_logs(shell: &RemoteShell, cfg: &LogConfig, errors: &mut Vec<DependencyError>) {
    let log_files = find_vite_files(shell, &cfg.log_dir, &["*vite*"]);
    debug!("Found {} Vite files in {}", log_files.len(), cfg.log_dir);

    for log_file in log_files.iter().take(cfg.max_scanned_logs) {
        let lines = match shell
            .grep_insensitive(RESOLVE_SIGNATURE, log_file)
            .map(|output| RemoteShell::lines_if_success(&output))
        {
            Ok(Some(lines)) => lines,
            Ok(None) => {
                trace!("No resolve errors in {}", log_file);
                continue;
            }
            Err(e) => {
                debug!("Skipping {}: {}", log_file, e);
                continue;
            }
        };

        for line in &lines {
            let Some(error) = dependency_error_from_line(line) else { continue };
            if errors.iter().any(|existing| existing.package == error.package) {
                trace!("Already reported package '{}'", error.package);
                continue;
            }
            debug!("Missing package '{}' in {}", error.package, log_file);
            errors.push(error);
        }
    }
}

/// The import specifier quoted in a resolve-error line.
pub fn extract_specifier(line: &str) -> Option<&str> {
    QUOTED.captures(line).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// npm package owning `specifier`: `@scope/name` for scoped packages,
/// otherwise the first path segment.
pub fn package_name(specifier: &str) -> String {
    if specifier.starts_with('@') {
        let parts: Vec<&str> = specifier.split('/').collect();
        if parts.len() >= 2 {
            return parts[..2].join("/");
        }
        return specifier.to_string();
    }
    specifier.split('/').next().unwrap_or(specifier).to_string()
}

/// A dependency error for a non-relative import named in `line`.
pub fn dependency_error_from_line(line: &str) -> Option<DependencyError> {
    let specifier = extract_specifier(line)?;
    if specifier.starts_with('.') {
        return None;
    }
    Some(DependencyError::npm_missing(package_name(specifier), specifier))
}

/// Keeps the first error per package, in first-seen order.
pub fn dedupe_by_package(errors: Vec<DependencyError>) -> Vec<DependencyError> {
    let mut seen = HashSet::new();
    errors
        .into_iter()
        .filter(|error| !error.package.is_empty() && seen.insert(error.package.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandlens_core::{ScanError, testing::ScriptedExecutor};

    const FIND_VITE: &[&str] = &["/tmp", "-name", "*vite*", "-type", "f"];

    fn grep(exec: ScriptedExecutor, file: &str, out: &str) -> ScriptedExecutor {
        exec.respond("grep", &["-i", RESOLVE_SIGNATURE, file], 0, out)
    }

    fn line(specifier: &str) -> String {
        format!(
            "[vite] Internal server error: Failed to resolve import \"{}\" from \"src/App.jsx\". Does the file exist?\n",
            specifier
        )
    }

    #[test]
    fn test_package_name() {
        assert_eq!(package_name("lodash"), "lodash");
        assert_eq!(package_name("lodash/merge"), "lodash");
        assert_eq!(package_name("@radix-ui/react-dialog"), "@radix-ui/react-dialog");
        assert_eq!(package_name("@radix-ui/react-dialog/dist/x"), "@radix-ui/react-dialog");
        assert_eq!(package_name("@scope"), "@scope");
    }

    #[test]
    fn test_extract_specifier_takes_first_quoted() {
        assert_eq!(extract_specifier(&line("react-icons/fa")), Some("react-icons/fa"));
        assert_eq!(extract_specifier("no quotes here"), None);
        assert_eq!(extract_specifier(r#"empty "" then "x""#), Some(" then "));
    }

    #[test]
    fn test_relative_imports_are_ignored() {
        assert_eq!(dependency_error_from_line(&line("./utils")), None);
        assert_eq!(dependency_error_from_line(&line("../lib/api")), None);
    }

    #[test]
    fn test_error_from_line() {
        let error = dependency_error_from_line(&line("framer-motion")).unwrap();
        assert_eq!(error.package, "framer-motion");
        assert_eq!(error.error_type, "npm-missing");
        assert_eq!(error.file, "Unknown");
        assert_eq!(error.message, "Failed to resolve import \"framer-motion\"");
    }

    #[test]
    fn test_subpath_and_root_dedupe_to_one() {
        let exec = grep(
            ScriptedExecutor::new().respond("find", FIND_VITE, 0, "/tmp/vite.log\n"),
            "/tmp/vite.log",
            &(line("lodash/merge") + &line("lodash") + &line("./utils")),
        );
        let session = Session::new(exec);
        let result = monitor_vite_logs(&session, &LogConfig::default()).unwrap();
        assert!(result.has_errors);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].package, "lodash");
        assert_eq!(result.errors[0].message, "Failed to resolve import \"lodash/merge\"");
    }

    #[test]
    fn test_snapshot_seeds_and_wins() {
        let snapshot = r#"{"errors":[{"type":"npm-missing","package":"axios","message":"from snapshot","file":"src/api.js"}]}"#;
        let exec = grep(
            ScriptedExecutor::new()
                .respond("cat", &["/tmp/vite-errors.json"], 0, snapshot)
                .respond("find", FIND_VITE, 0, "/tmp/vite.log\n"),
            "/tmp/vite.log",
            &(line("axios") + &line("@tanstack/react-query/devtools")),
        );
        let result = monitor_vite_logs(&Session::new(exec), &LogConfig::default()).unwrap();
        let packages: Vec<&str> = result.errors.iter().map(|e| e.package.as_str()).collect();
        assert_eq!(packages, vec!["axios", "@tanstack/react-query"]);
        assert_eq!(result.errors[0].message, "from snapshot");
    }

    #[test]
    fn test_snapshot_duplicates_are_collapsed() {
        let snapshot = r#"{"errors":[{"package":"a"},{"package":"b"},{"package":"a"},{"message":"no package"}]}"#;
        let exec = ScriptedExecutor::new().respond("cat", &["/tmp/vite-errors.json"], 0, snapshot);
        let result = monitor_vite_logs(&Session::new(exec), &LogConfig::default()).unwrap();
        let packages: Vec<&str> = result.errors.iter().map(|e| e.package.as_str()).collect();
        assert_eq!(packages, vec!["a", "b"]);
    }

    #[test]
    fn test_bad_snapshot_record_keeps_the_others() {
        let snapshot = r#"{"errors":[
            {"package":"axios","file":null},
            {"package":42,"message":"numeric"},
            "not a record",
            {"package":null},
            {"package":"zod","file":"src/schema.ts"}
        ]}"#;
        let exec = ScriptedExecutor::new().respond("cat", &["/tmp/vite-errors.json"], 0, snapshot);
        let errors = read_error_snapshot(&RemoteShell::new(&exec), "/tmp/vite-errors.json");
        let packages: Vec<&str> = errors.iter().map(|e| e.package.as_str()).collect();
        assert_eq!(packages, vec!["axios", "42", "", "zod"]);
        assert_eq!(errors[0].file, "Unknown");
        assert_eq!(errors[0].error_type, "npm-missing");
        assert_eq!(errors[3].file, "src/schema.ts");

        let packages: Vec<String> = dedupe_by_package(errors).into_iter().map(|e| e.package).collect();
        assert_eq!(packages, vec!["axios", "42", "zod"]);
    }

    #[test]
    fn test_invalid_utf8_grep_line_is_tolerated() {
        let exec = ScriptedExecutor::new()
            .respond("find", FIND_VITE, 0, "/tmp/vite.log\n")
            .respond(
                "grep",
                &["-i", RESOLVE_SIGNATURE, "/tmp/vite.log"],
                0,
                b"\xff Failed to resolve import \"clsx\" from \"src/a.jsx\"\n".to_vec(),
            );
        let result = monitor_vite_logs(&Session::new(exec), &LogConfig::default()).unwrap();
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].package, "clsx");
    }

    #[test]
    fn test_malformed_snapshot_is_ignored() {
        let exec = ScriptedExecutor::new().respond("cat", &["/tmp/vite-errors.json"], 0, "{not json");
        assert!(read_error_snapshot(&RemoteShell::new(&exec), "/tmp/vite-errors.json").is_empty());

        let exec = ScriptedExecutor::new().fail("cat", &["/tmp/vite-errors.json"], "timeout");
        assert!(read_error_snapshot(&RemoteShell::new(&exec), "/tmp/vite-errors.json").is_empty());

        let exec = ScriptedExecutor::new().respond("cat", &["/tmp/vite-errors.json"], 0, "{}");
        assert!(read_error_snapshot(&RemoteShell::new(&exec), "/tmp/vite-errors.json").is_empty());
    }

    #[test]
    fn test_only_first_three_logs_are_scanned() {
        let exec = ScriptedExecutor::new().respond(
            "find",
            FIND_VITE,
            0,
            "/tmp/vite-1.log\n/tmp/vite-2.log\n/tmp/vite-3.log\n/tmp/vite-4.log\n",
        );
        let exec = grep(exec, "/tmp/vite-1.log", &line("a"));
        let exec = grep(exec, "/tmp/vite-2.log", &line("b"));
        let exec = grep(exec, "/tmp/vite-3.log", &line("c"));
        let exec = grep(exec, "/tmp/vite-4.log", &line("d"));
        let session = Session::new(exec);

        let result = monitor_vite_logs(&session, &LogConfig::default()).unwrap();
        let packages: Vec<&str> = result.errors.iter().map(|e| e.package.as_str()).collect();
        assert_eq!(packages, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_command_failures_are_swallowed() {
        let exec = ScriptedExecutor::new()
            .fail("cat", &["/tmp/vite-errors.json"], "timeout")
            .respond("find", FIND_VITE, 0, "/tmp/vite-a.log\n/tmp/vite-b.log\n")
            .fail("grep", &["-i", RESOLVE_SIGNATURE, "/tmp/vite-a.log"], "connection lost");
        let exec = grep(exec, "/tmp/vite-b.log", &line("zod"));
        let result = monitor_vite_logs(&Session::new(exec), &LogConfig::default()).unwrap();
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].package, "zod");
    }

    #[test]
    fn test_nothing_found() {
        let result =
            monitor_vite_logs(&Session::new(ScriptedExecutor::new()), &LogConfig::default()).unwrap();
        assert_eq!(result, ViteErrors::default());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, serde_json::json!({ "hasErrors": false, "errors": [] }));
    }

    #[test]
    fn test_detached_session() {
        let err = monitor_vite_logs(&Session::detached(), &LogConfig::default()).unwrap_err();
        assert!(matches!(err, ScanError::NoActiveSandbox));
    }
}
