//! crmsync CLI entry point.

use clap::Parser;
use crmsync::cli::commands;
use crmsync::cli::{Cli, Commands, OutputFormat};
use crmsync::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.silent {
        crmsync::SILENT.store(true, std::sync::atomic::Ordering::Relaxed);
    }
    if cli.dry_run {
        crmsync::DRY_RUN.store(true, std::sync::atomic::Ordering::Relaxed);
    }
    if cli.format == OutputFormat::Csv {
        crmsync::CSV_OUTPUT.store(true, std::sync::atomic::Ordering::Relaxed);
    }
    if cli.no_color {
        colored::control::set_override(false);
    }

    init_tracing(cli.verbose, cli.quiet);

    // --json OR --format json OR non-TTY stdout; an explicit csv or table
    // format keeps its own rendering.
    let json = cli.json
        || cli.format == OutputFormat::Json
        || (cli.format == OutputFormat::Table
            && !std::io::IsTerminal::is_terminal(&std::io::stdout())
            && !cli.silent);

    match run(&cli, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,rusqlite=info,reqwest=info,hyper=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli, json: bool) -> Result<(), Error> {
    let db = cli.db.as_ref();
    match &cli.command {
        Commands::Init { force } => commands::init::execute(db, *force, json),
        Commands::Version => commands::version::execute(json),

        // Reconciliation
        Commands::Sync(args) => commands::sync::execute(args, db, json),
        Commands::Import { file } => commands::import::execute(file, db, json),

        // Records
        Commands::List { kind } => commands::records::list(kind, db, json),
        Commands::Show { kind, id } => commands::records::show(kind, id, db, json),
        Commands::Delete { kind, id, yes } => commands::records::delete(kind, id, *yes, db, json),
        Commands::Clear { yes } => commands::records::clear(*yes, db, json),

        Commands::Status => commands::status::execute(db, json),
        Commands::Export { command } => commands::export::execute(command, db, json),
        Commands::Watch {
            interval_ms,
            max_updates,
        } => commands::watch::execute(*interval_ms, *max_updates, db, json),

        Commands::Completions { shell } => commands::completions::execute(shell),
    }
}
