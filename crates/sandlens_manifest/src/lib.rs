//! File manifest construction for sandbox projects.
//!
//! Lists the project's source files through shell commands, fetches the ones
//! below a size threshold, classifies them, detects the entry point and style
//! files, and derives a best-effort route table.
//!
//! # Examples
//!
//! ```no_run
//! use sandlens_core::{Envelope, Session, ShellExecutor};
//! use sandlens_manifest::{ManifestAssembler, ManifestConfig, fetch_sandbox_files};
//!
//! let mut session = Session::new(ShellExecutor::local("/path/to/project"));
//! let result = fetch_sandbox_files(
//!     &mut session,
//!     &ManifestConfig::default(),
//!     &ManifestAssembler::default(),
//! );
//! println!("{}", serde_json::to_string_pretty(&Envelope::from_result(result)).unwrap());
//! ```

mod assembler;
mod checker;
mod config;
mod discovery;
mod retrieval;
mod routes;

// Re-export public API
pub use assembler::ManifestAssembler;
pub use checker::{SandboxFiles, fetch_sandbox_files};
pub use config::ManifestConfig;
pub use discovery::{directory_structure, discover_files, discovery_args, relative_path};
pub use retrieval::{
    Retrieval, RetrievalPolicy, RetrievalReport, SkipReason, retrieve_all, retrieve_file,
};
pub use routes::{HeuristicRouteExtractor, RouteExtractor, filesystem_route};
