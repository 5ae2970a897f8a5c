//! Vite dev-server diagnostics for sandbox projects.
//!
//! Two read-only pipelines over a [`sandlens_core::Session`]:
//! - [`monitor_vite_logs`] mines the error snapshot and Vite log files for
//!   imports that failed to resolve, reporting one entry per missing package
//! - [`sandbox_logs`] reports whether the dev server is running and tails its
//!   most recent log files

mod config;
mod miner;
mod status;

// Re-export public API
pub use config::LogConfig;
pub use miner::{
    ViteErrors, dedupe_by_package, dependency_error_from_line, extract_specifier,
    find_vite_files, monitor_vite_logs, package_name, read_error_snapshot, scan_vite_logs,
};
pub use status::{LogStatus, ViteStatus, sandbox_logs};
