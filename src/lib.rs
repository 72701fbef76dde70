//! # locport — local host/port registry
//!
//! Tracks locally-developed projects and the `hostname:port` pairs each one
//! claims for local HTTP-style services, so collisions across projects are
//! visible at a glance.
//!
//! ## Library usage
//!
//! This crate is primarily a CLI tool, but the [`Indexer`] and its
//! collaborators are exposed as a library for integration and testing.

use std::ops::RangeInclusive;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

pub mod conflict;
pub mod error;
pub mod indexer;
pub mod probe;
pub mod scanner;
pub mod store;

pub use error::LocportError;
pub use indexer::{Indexer, IndexerConfig, ProjectRegistry};
pub use probe::PortProbe;
pub use store::IndexStore;

/// Per-project registration file name, found at the project root.
pub const DOTFILE: &str = ".localhost";

/// Range sampled by the unused-port allocator.
pub const PORT_RANGE: RangeInclusive<u16> = 30000..=60000;

// ─── Core public types ───────────────────────────────────────────────

/// One parsed `host:port` claim plus provenance and conflict annotations.
///
/// Host and port are fixed at creation. The conflict lists are indices into
/// the flat record arena of the registry the record lives in; they are wiped
/// and recomputed on every [`conflict::annotate`] pass, never maintained
/// incrementally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    pub host: String,
    pub port: u16,
    /// Home-relative path of the registration file this claim came from.
    pub source_path: String,
    /// 1-based line within the registration file.
    pub line_number: usize,
    /// Arena indices of records sharing this record's host.
    pub host_conflicts: Vec<usize>,
    /// Arena indices of records sharing this record's port.
    pub port_conflicts: Vec<usize>,
}

impl AddressRecord {
    #[must_use]
    pub fn new(host: String, port: u16, source_path: String, line_number: usize) -> Self {
        Self {
            host,
            port,
            source_path,
            line_number,
            host_conflicts: Vec::new(),
            port_conflicts: Vec::new(),
        }
    }

    /// True if any other record shares this record's host or port.
    #[must_use]
    pub fn has_conflicts(&self) -> bool {
        !self.host_conflicts.is_empty() || !self.port_conflicts.is_empty()
    }
}

// ─── Line parsing ────────────────────────────────────────────────────

fn address_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.+):(\d+)$").expect("address line regex is valid"))
}

/// Parse one registration-file line of the form `host:port`.
///
/// The host is everything before the *final* colon (hosts like
/// `http://x.localhost` keep their scheme colon); the port must be all
/// digits and fit in a `u16`. Anything else yields `None` — non-matching
/// lines are skipped, never errors.
///
/// # Examples
///
/// ```
/// use locport::parse_address_line;
///
/// assert_eq!(
///     parse_address_line("http://alpha.localhost:30000"),
///     Some(("http://alpha.localhost".to_string(), 30000))
/// );
/// assert_eq!(parse_address_line("# a comment"), None);
/// ```
#[must_use]
pub fn parse_address_line(line: &str) -> Option<(String, u16)> {
    let caps = address_line_re().captures(line)?;
    let port = caps[2].parse::<u16>().ok()?;
    Some((caps[1].to_string(), port))
}

/// Canonical project key: the absolute project directory with a leading
/// home-directory prefix replaced by `~`. Paths outside the home directory
/// (or when no home is known) are rendered as-is.
#[must_use]
pub fn project_key(dir: &Path, home_dir: Option<&Path>) -> String {
    if let Some(home) = home_dir {
        if let Ok(rel) = dir.strip_prefix(home) {
            if rel.as_os_str().is_empty() {
                return "~".to_string();
            }
            return format!("~/{}", rel.display());
        }
    }
    dir.display().to_string()
}

// ─── Tests ───────────────────────────────────────────────────────────


// ─── Property-based tests (proptest) ─────────────────────────────────
