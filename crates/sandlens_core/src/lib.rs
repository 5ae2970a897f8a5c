//! Core pieces shared by the sandlens pipelines.
//!
//! This crate provides:
//! - The command execution capability and typed helpers for the shell
//!   commands issued against a sandbox
//! - The manifest and dependency-error data model
//! - A session object owning the transport and the last-built manifest
//! - The error taxonomy and the response envelope
//! - Default structural parser (oxc) and component-tree builder

mod commands;
mod constants;
mod envelope;
mod error;
mod exec;
mod parser;
mod session;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
mod tree;
mod types;

// Re-export public API
pub use commands::{RemoteShell, StatFlavor, non_blank_lines};
pub use constants::{
    DEFAULT_SIZE_THRESHOLD, DEFAULT_STRUCTURE_LIMIT, DISCOVERY_EXTENSIONS, INDEX_FILES,
    PRUNED_DIRS, RESOLVE_EXTENSIONS, SOURCE_EXTENSIONS, STRUCTURE_EXCLUDED_DIRS, is_source_path,
};
pub use envelope::Envelope;
pub use error::{ScanError, ScanResult};
pub use exec::{CommandExecutor, CommandOutput, ExecError, ShellExecutor};
pub use parser::{OxcStructuralParser, ParsedModule, StructuralParser, module_structure};
pub use session::Session;
pub use tree::{ComponentTreeBuilder, ImportGraphBuilder, resolve_in_manifest};
pub use types::{
    ComponentNode, ComponentTree, DependencyError, FileInfo, FileManifest, FileMap, FileType,
    ImportInfo, ImportKind, ModuleStructure, NPM_MISSING, RouteInfo, UNKNOWN_FILE,
};
