//! CLI argument structs for all subcommands.

use clap::Parser;

#[derive(Parser, Debug)]
pub struct IndexArgs {
    /// Directory to index (defaults to the current directory)
    #[arg(default_value = ".")]
    pub path: String,

    /// Walk the whole subtree instead of just the directory itself
    #[arg(short, long)]
    pub recursive: bool,
}

#[derive(Parser, Debug)]
pub struct AddArgs {
    /// Address to claim: `host:port`, or a bare host to auto-assign a port
    pub address: String,

    /// Project directory owning the claim
    #[arg(short, long, default_value = ".")]
    pub dir: String,

    /// Append the address to the project's registration file and save
    #[arg(short, long)]
    pub write: bool,
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Port to probe on 127.0.0.1
    pub port: u16,
}
