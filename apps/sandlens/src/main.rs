use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::{debug, info};
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use sandlens_core::{Envelope, Session, ShellExecutor};
use sandlens_logs::LogConfig;
use sandlens_manifest::{ManifestAssembler, ManifestConfig};

#[derive(Parser)]
#[command(name = "sandlens")]
#[command(about = "Read-only inspection of a sandboxed web project", long_about = None)]
struct Cli {
    /// Run commands on this host over ssh
    #[arg(long, global = true)]
    ssh: Option<String>,

    /// Directory commands run in (local default: current directory)
    #[arg(long, global = true)]
    workdir: Option<PathBuf>,

    /// Run without a sandbox attached
    #[arg(long, global = true, conflicts_with_all = ["ssh", "workdir"])]
    detached: bool,

    /// Pretty-print the JSON response
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build the file manifest of the project
    Files(ManifestConfig),
    /// Report packages that Vite failed to resolve
    ViteErrors(LogConfig),
    /// Report dev server status and recent log output
    Logs(LogConfig),
}

fn open_session(cli: &Cli) -> Session {
    if cli.detached {
        return Session::detached();
    }
    match &cli.ssh {
        Some(destination) => {
            info!("Using ssh sandbox at {}", destination);
            let workdir = cli.workdir.as_ref().map(|dir| dir.to_string_lossy().into_owned());
            Session::new(ShellExecutor::ssh(destination.clone(), workdir))
        }
        None => {
            let workdir = cli.workdir.clone().unwrap_or_else(|| PathBuf::from("."));
            info!("Using local sandbox at {}", workdir.display());
            Session::new(ShellExecutor::local(workdir))
        }
    }
}

/// Writes the envelope as JSON and returns whether it reported success.
fn emit<T: Serialize>(out: &mut impl Write, envelope: &Envelope<T>, pretty: bool) -> Result<bool> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, envelope)?;
    } else {
        serde_json::to_writer(&mut *out, envelope)?;
    }
    writeln!(out)?;
    out.flush()?;
    Ok(envelope.is_success())
}

fn report_failure<T>(envelope: &Envelope<T>) {
    if let Envelope::Failure { error, .. } = envelope {
        eprintln!("{} {} ({})", "✗".red(), error, envelope.status().to_string().red());
    }
}

fn main() -> Result<()> {
    env_logger::init();

    // stdio is blocked by LineWriter, use a BufWriter to reduce syscalls.
    // See https://github.com/rust-lang/rust/issues/60673
    let mut stdout = BufWriter::new(std::io::stdout());

    let cli = Cli::parse();
    debug!("Parsed CLI arguments: {:?}", cli.command);

    let mut session = open_session(&cli);
    let start = Instant::now();

    let succeeded = match &cli.command {
        Commands::Files(cfg) => {
            debug!("Config: {:?}", cfg);
            let result =
                sandlens_manifest::fetch_sandbox_files(&mut session, cfg, &ManifestAssembler::default());
            if let Ok(files) = &result {
                for (path, reason) in &files.skipped {
                    debug!("Skipped {}: {}", path, reason);
                }
                eprintln!(
                    "{} {} files, {} routes, {} skipped, entry {}",
                    "●".bright_blue(),
                    files.file_count.to_string().cyan(),
                    files.manifest.routes.len().to_string().cyan(),
                    files.skipped.len().to_string().yellow(),
                    if files.manifest.entry_point.is_empty() {
                        "none".dimmed().to_string()
                    } else {
                        files.manifest.entry_point.cyan().to_string()
                    }
                );
            }
            let envelope = Envelope::from_result(result);
            report_failure(&envelope);
            emit(&mut stdout, &envelope, cli.pretty)?
        }
        Commands::ViteErrors(cfg) => {
            let result = sandlens_logs::monitor_vite_logs(&session, cfg);
            if let Ok(found) = &result {
                if found.has_errors {
                    for error in &found.errors {
                        eprintln!("{} missing package {}", "✗".red(), error.package.yellow());
                    }
                } else {
                    eprintln!("{} No unresolved imports", "✓".green());
                }
            }
            let envelope = Envelope::from_result(result);
            report_failure(&envelope);
            emit(&mut stdout, &envelope, cli.pretty)?
        }
        Commands::Logs(cfg) => {
            let result = sandlens_logs::sandbox_logs(&session, cfg);
            if let Ok(status) = &result {
                eprintln!("{} Vite is {}", "●".bright_blue(), status.status.to_string().cyan());
            }
            let envelope = Envelope::from_result(result);
            report_failure(&envelope);
            emit(&mut stdout, &envelope, cli.pretty)?
        }
    };

    session.close();
    eprintln!("{} Finished in {}ms.", "●".bright_blue(), start.elapsed().as_millis().to_string().cyan());

    if !succeeded {
        // Non-zero exit on a failure envelope
        std::process::exit(1);
    }
    Ok(())
}
