//! CLI layer: argument parsing, command dispatch, and subcommand
//! implementations. All registry logic lives in the library; this module
//! only renders results and picks exit codes.

pub mod args;

pub use args::*;

use clap::{Parser, Subcommand};
use std::path::Path;

use locport::{Indexer, IndexerConfig, LocportError, ProjectRegistry};

// ─── CLI ─────────────────────────────────────────────────────────────

/// Track which hostname:port pairs your local projects claim
#[derive(Parser, Debug)]
#[command(name = "locport", version, about)]
pub(crate) struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Index a directory's registration files and save the tracked list
    Index(IndexArgs),

    /// List tracked projects with their addresses, conflicts marked
    List,

    /// Claim an address for a project (auto-assigns a port for a bare host)
    Add(AddArgs),

    /// Probe whether a port is accepting connections on 127.0.0.1
    Check(CheckArgs),

    /// Print the tracked registration-file paths
    Paths,
}

// ─── Main entry point ───────────────────────────────────────────────

pub fn run() {
    let cli = Cli::parse();

    let log_level = match cli.log_level.as_str() {
        "error" => tracing::Level::ERROR,
        "info" => tracing::Level::INFO,
        "debug" => tracing::Level::DEBUG,
        "trace" => tracing::Level::TRACE,
        _ => tracing::Level::WARN,
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Index(args) => cmd_index(args),
        Commands::List => cmd_list(),
        Commands::Add(args) => cmd_add(args),
        Commands::Check(args) => cmd_check(args),
        Commands::Paths => cmd_paths(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

// ─── Commands ───────────────────────────────────────────────────────

fn cmd_index(args: IndexArgs) -> Result<(), LocportError> {
    let mut indexer = Indexer::new(IndexerConfig::default());
    indexer.index(Path::new(&args.path), args.recursive);
    indexer.save()?;
    eprintln!("Tracking {} registration file(s)", indexer.dotfiles().len());
    Ok(())
}

fn cmd_list() -> Result<(), LocportError> {
    let mut indexer = Indexer::new(IndexerConfig::default());
    let registry = indexer.load_projects();
    if registry.is_empty() {
        eprintln!("No addresses tracked. Use 'locport index <dir>' first.");
        return Ok(());
    }
    print_registry(registry);
    Ok(())
}

fn print_registry(registry: &ProjectRegistry) {
    for (key, records) in registry.iter() {
        println!("{key}");
        for record in records {
            let mut flags = String::new();
            if !record.host_conflicts.is_empty() {
                flags.push_str(" [host conflict]");
            }
            if !record.port_conflicts.is_empty() {
                flags.push_str(" [port conflict]");
            }
            println!("  {}:{}{}", record.host, record.port, flags);
        }
    }
}

fn cmd_add(args: AddArgs) -> Result<(), LocportError> {
    let dir = Path::new(&args.dir);
    let mut indexer = Indexer::new(IndexerConfig::default());
    indexer.load_projects();
    let idx = indexer.create_address(&args.address, dir);

    let record = indexer.projects().records[idx].clone();
    println!("{}:{}", record.host, record.port);
    for &other in &record.host_conflicts {
        let peer = &indexer.projects().records[other];
        eprintln!("  host conflict: {} line {}", peer.source_path, peer.line_number);
    }
    for &other in &record.port_conflicts {
        let peer = &indexer.projects().records[other];
        eprintln!("  port conflict: {} line {}", peer.source_path, peer.line_number);
    }

    if args.write {
        indexer.append_address_to_dotfile(&record, dir)?;
        indexer.index(dir, false);
        indexer.save()?;
    }
    Ok(())
}

fn cmd_check(args: CheckArgs) -> Result<(), LocportError> {
    let indexer = Indexer::new(IndexerConfig::default());
    if indexer.is_listening(args.port) {
        println!("{}: listening", args.port);
        Ok(())
    } else {
        println!("{}: not listening", args.port);
        std::process::exit(1);
    }
}

fn cmd_paths() -> Result<(), LocportError> {
    let indexer = Indexer::new(IndexerConfig::default());
    for dotfile in indexer.dotfiles() {
        println!("{}", dotfile.display());
    }
    Ok(())
}
