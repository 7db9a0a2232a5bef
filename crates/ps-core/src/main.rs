//! procs-tree: display the process tree below a PID.

use clap::Parser;
use ps_common::{Error, OutputFormat, ProcessId, StructuredError};
use ps_core::collect::{AuxPolicy, ProcFs};
use ps_core::config::{load_config, ConfigOptions};
use ps_core::exit_codes::ExitCode;
use ps_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use ps_core::output::{select_roots, tree_view, write_json, write_text};
use ps_core::tree::{build_with_retries, BuildOptions, Tree};
use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing::debug;

/// Display the tree of child processes for a given PID
#[derive(Parser, Debug)]
#[command(name = "procs-tree")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// PID of the process tree to display [default: 1, or every root if 1 is absent]
    pid: Option<u32>,

    /// Output format
    #[arg(long, short = 'f', default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Show the process and its direct children only
    #[arg(long)]
    children_only: bool,

    /// Fail when an auxiliary field cannot be read
    #[arg(long, conflicts_with = "lenient")]
    strict: bool,

    /// Leave unreadable auxiliary fields empty
    #[arg(long)]
    lenient: bool,

    /// Config file (default: $PSTREE_CONFIG, then XDG, then /etc/pstree)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory to read processes from
    #[arg(long)]
    proc_root: Option<PathBuf>,

    /// Scan worker threads
    #[arg(long)]
    threads: Option<NonZeroUsize>,

    /// Extra attempts when a parent exits mid-snapshot
    #[arg(long, default_value_t = 3)]
    retries: u32,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    log_level: Option<LogLevel>,

    /// Log format on stderr (human, jsonl)
    #[arg(long)]
    log_format: Option<LogFormat>,
}

fn main() -> std::process::ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = if e.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            return code.into();
        }
    };

    init_logging(&LogConfig::from_env(cli.log_level, cli.log_format));

    let code = match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            report_error(&err, cli.format);
            ExitCode::from(&err)
        }
    };
    code.into()
}

fn run(cli: &Cli) -> Result<ExitCode, Error> {
    let (root, options) = resolve_options(cli)?;
    let source = ProcFs::with_root(root);
    let tree = build_with_retries(&source, &options, cli.retries)?;

    let requested = cli.pid.map(ProcessId);
    let roots = select_roots(&tree, requested).ok_or(Error::UnknownPid {
        pid: cli.pid.unwrap_or_default(),
    })?;

    let max_depth = cli.children_only.then_some(1);
    match print_tree(&tree, requested, &roots, max_depth, cli.format) {
        Err(Error::Io(e)) if e.kind() == io::ErrorKind::BrokenPipe => Ok(ExitCode::Clean),
        Err(e) => Err(e),
        Ok(()) => Ok(ExitCode::Clean),
    }
}

/// Merge the config file with command-line flags; flags win.
fn resolve_options(cli: &Cli) -> Result<(PathBuf, BuildOptions), Error> {
    let resolved = load_config(&ConfigOptions {
        config_path: cli.config.clone(),
        skip_discovery: false,
    })?;
    debug!(source = %resolved.source, path = ?resolved.path, "configuration loaded");

    let mut options = resolved.build_options();
    if cli.strict {
        options.scan.aux_policy = AuxPolicy::Strict;
    }
    if cli.lenient {
        options.scan.aux_policy = AuxPolicy::Lenient;
    }
    if let Some(threads) = cli.threads {
        options.scan_threads = threads.get();
    }

    let root = cli
        .proc_root
        .clone()
        .unwrap_or_else(|| resolved.config.proc_root.clone());
    Ok((root, options))
}

fn print_tree(
    tree: &Tree,
    requested: Option<ProcessId>,
    roots: &[ProcessId],
    max_depth: Option<usize>,
    format: OutputFormat,
) -> Result<(), Error> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Text => write_text(&mut out, tree, roots, max_depth)?,
        OutputFormat::Json => {
            let view = tree_view(tree, requested, roots, max_depth);
            write_json(&mut out, &view)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn report_error(err: &Error, format: OutputFormat) {
    match format {
        OutputFormat::Text => eprintln!("procs-tree: {}", err.format_human()),
        OutputFormat::Json => eprintln!("{}", StructuredError::from(err).to_json()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_strict_and_lenient_conflict() {
        let err = Cli::try_parse_from(["procs-tree", "--strict", "--lenient"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_zero_threads_rejected() {
        assert!(Cli::try_parse_from(["procs-tree", "--threads", "0"]).is_err());
    }

    #[test]
    fn test_parse_full() {
        let cli = Cli::try_parse_from([
            "procs-tree",
            "42",
            "--format",
            "json",
            "--lenient",
            "--children-only",
            "--log-level",
            "debug",
            "--log-format",
            "jsonl",
        ])
        .unwrap();
        assert_eq!(cli.pid, Some(42));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.lenient);
        assert!(cli.children_only);
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        assert_eq!(cli.log_format, Some(LogFormat::Jsonl));
        assert_eq!(cli.retries, 3);
    }
}
