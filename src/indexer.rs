//! Indexer orchestration: discovery, registry construction, address
//! creation, and persistence.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::LocportError;
use crate::probe::PortProbe;
use crate::store::{default_data_dir, IndexStore};
use crate::{conflict, parse_address_line, project_key, scanner, AddressRecord, DOTFILE};

// ─── Configuration ───────────────────────────────────────────────────

/// Construction-time configuration for [`Indexer`].
///
/// The ambient home and data directories are resolved here, at the edge,
/// so the core stays deterministic and testable with injected paths.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Home directory used for `~` canonicalization of project keys.
    pub home_dir: Option<PathBuf>,
    /// Platform data directory holding the tracked-paths file.
    pub data_dir: PathBuf,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            home_dir: dirs::home_dir(),
            data_dir: default_data_dir(),
        }
    }
}

// ─── Registry ────────────────────────────────────────────────────────

/// The rebuilt-from-disk registry: a flat record arena plus per-project
/// groupings of arena indices.
///
/// Conflict lists in the arena refer to positions within the same rebuild
/// generation; the whole structure is discarded and rebuilt wholesale on
/// every [`Indexer::load_projects`] call, so no stale links survive.
#[derive(Debug, Default)]
pub struct ProjectRegistry {
    /// All records, in file-discovery-then-line order.
    pub records: Vec<AddressRecord>,
    /// Project key → arena indices, iterated in sorted key order.
    pub projects: BTreeMap<String, Vec<usize>>,
}

impl ProjectRegistry {
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate projects in sorted key order with their records resolved.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Vec<&AddressRecord>)> {
        self.projects
            .iter()
            .map(|(key, indices)| (key.as_str(), indices.iter().map(|&i| &self.records[i]).collect()))
    }
}

// ─── Indexer ─────────────────────────────────────────────────────────

/// Discovers registration files, builds the conflict-annotated registry,
/// creates and allocates addresses, and persists the tracked-paths list.
///
/// Single-threaded and single-run by design: constructed, used, and
/// discarded within one process invocation.
pub struct Indexer {
    config: IndexerConfig,
    store: IndexStore,
    probe: PortProbe,
    dotfiles: Vec<PathBuf>,
    registry: ProjectRegistry,
}

impl Indexer {
    /// Build an indexer over the given configuration, loading the tracked
    /// dotfile list from the store (empty when nothing was ever saved).
    #[must_use]
    pub fn new(config: IndexerConfig) -> Self {
        let store = IndexStore::new(&config.data_dir);
        let dotfiles = store.load();
        debug!(count = dotfiles.len(), "loaded tracked dotfiles");
        Self {
            config,
            store,
            probe: PortProbe::default(),
            dotfiles,
            registry: ProjectRegistry::default(),
        }
    }

    /// The raw tracked registration-file paths, sorted and de-duplicated.
    #[must_use]
    pub fn dotfiles(&self) -> &[PathBuf] {
        &self.dotfiles
    }

    /// Scan `path` for registration files and fold them into the tracked
    /// set. Re-indexing an already-known directory is a no-op: the set is
    /// sorted and de-duplicated after every scan.
    pub fn index(&mut self, path: &Path, recursive: bool) {
        let found = scanner::scan(path, recursive);
        info!(path = %path.display(), recursive, found = found.len(), "indexed");
        self.dotfiles.extend(found);
        self.dotfiles.sort();
        self.dotfiles.dedup();
    }

    /// Rebuild the registry from the tracked dotfiles and annotate
    /// conflicts. Unreadable registration files are skipped — the project
    /// may have been deleted since it was last indexed.
    pub fn load_projects(&mut self) -> &ProjectRegistry {
        let mut records: Vec<AddressRecord> = Vec::new();
        let mut projects: BTreeMap<String, Vec<usize>> = BTreeMap::new();

        for dotfile in &self.dotfiles {
            let Ok(raw) = fs::read_to_string(dotfile) else {
                debug!(path = %dotfile.display(), "skipping unreadable registration file");
                continue;
            };
            let Some(project_dir) = dotfile.parent() else {
                continue;
            };
            let key = project_key(project_dir, self.config.home_dir.as_deref());
            let source_path = format!("{key}/{DOTFILE}");

            for (i, line) in raw.lines().enumerate() {
                let Some((host, port)) = parse_address_line(line) else {
                    continue;
                };
                let idx = records.len();
                records.push(AddressRecord::new(host, port, source_path.clone(), i + 1));
                projects.entry(key.clone()).or_default().push(idx);
            }
        }

        conflict::annotate(&mut records);
        debug!(projects = projects.len(), records = records.len(), "registry rebuilt");
        self.registry = ProjectRegistry { records, projects };
        &self.registry
    }

    /// The registry from the most recent [`Self::load_projects`] call
    /// (empty before the first).
    #[must_use]
    pub fn projects(&self) -> &ProjectRegistry {
        &self.registry
    }

    /// Create an address for the project at `dir` and add it to the
    /// in-memory registry.
    ///
    /// `text` of the form `host:port` is taken verbatim — an explicitly
    /// requested port is honored even when it collides; the collision shows
    /// up in the returned record's conflict lists, and the accept/reject
    /// decision stays with the caller. Any other `text` is treated as a bare
    /// host and gets a freshly allocated port.
    ///
    /// Conflict annotation is re-run over the whole record set before
    /// returning, so the new record (at the returned arena index) can be
    /// inspected immediately.
    pub fn create_address(&mut self, text: &str, dir: &Path) -> usize {
        let (host, port) = match parse_address_line(text) {
            Some(parsed) => parsed,
            None => {
                let port = self.probe.allocate_port(&self.registry.records);
                (text.to_string(), port)
            }
        };

        let dir = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
        let key = project_key(&dir, self.config.home_dir.as_deref());
        let source_path = format!("{key}/{DOTFILE}");
        let line_number = self
            .registry
            .projects
            .get(&key)
            .map_or(0, Vec::len)
            + 1;

        info!(host, port, project = %key, "created address");
        let idx = self.registry.records.len();
        self.registry
            .records
            .push(AddressRecord::new(host, port, source_path, line_number));
        self.registry.projects.entry(key).or_default().push(idx);
        conflict::annotate(&mut self.registry.records);
        idx
    }

    /// Append `host:port` as a new line of `dir`'s registration file,
    /// creating the file on first use.
    pub fn append_address_to_dotfile(
        &self,
        record: &AddressRecord,
        dir: &Path,
    ) -> Result<(), LocportError> {
        let path = dir.join(DOTFILE);
        let write_err = |source| LocportError::DotfileWrite {
            path: path.display().to_string(),
            source,
        };
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(write_err)?;
        writeln!(file, "{}:{}", record.host, record.port).map_err(write_err)?;
        Ok(())
    }

    /// Best-effort check whether something is listening on `port`.
    #[must_use]
    pub fn is_listening(&self, port: u16) -> bool {
        self.probe.is_listening(port)
    }

    /// Persist the tracked project roots (the dotfiles' parent directories).
    pub fn save(&self) -> Result<(), LocportError> {
        let roots: Vec<PathBuf> = self
            .dotfiles
            .iter()
            .filter_map(|dotfile| dotfile.parent().map(Path::to_path_buf))
            .collect();
        self.store.save(&roots)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod indexer_tests {
    use super::*;
    use crate::PORT_RANGE;
    use std::fs;

    /// Projects laid out under a fake home so keys canonicalize to `~/...`.
    struct Fixture {
        _tmp: tempfile::TempDir,
        home: PathBuf,
        config: IndexerConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = tempfile::tempdir().unwrap();
            let home = tmp.path().join("home");
            fs::create_dir_all(&home).unwrap();
            let config = IndexerConfig {
                home_dir: Some(home.clone()),
                data_dir: tmp.path().join("data"),
            };
            Self { _tmp: tmp, home, config }
        }

        fn project(&self, name: &str, lines: &[&str]) -> PathBuf {
            let dir = self.home.join("projects").join(name);
            fs::create_dir_all(&dir).unwrap();
            let mut body = lines.join("\n");
            body.push('\n');
            fs::write(dir.join(DOTFILE), body).unwrap();
            dir
        }

        fn alpha_beta(&self) -> PathBuf {
            self.project(
                "alpha",
                &[
                    "http://alpha.localhost:30000",
                    "http://sub.alpha.localhost:30001",
                    "livereload:40003",
                ],
            );
            self.project(
                "beta",
                &[
                    "http://beta.localhost:31000",
                    "livereload:40002",
                    "conflict.localhost:30001",
                ],
            );
            self.home.join("projects")
        }
    }

    #[test]
    fn test_index_is_idempotent() {
        let fx = Fixture::new();
        let root = fx.alpha_beta();

        let mut indexer = Indexer::new(fx.config.clone());
        indexer.index(&root, true);
        let once = indexer.dotfiles().to_vec();
        indexer.index(&root, true);
        assert_eq!(indexer.dotfiles(), once.as_slice());
        assert_eq!(once.len(), 2);
    }

    #[test]
    fn test_index_nonexistent_path_is_empty() {
        let fx = Fixture::new();
        let mut indexer = Indexer::new(fx.config.clone());
        indexer.index(Path::new("/no/such/dir"), true);
        assert!(indexer.dotfiles().is_empty());
    }

    #[test]
    fn test_index_non_recursive_skips_subprojects() {
        let fx = Fixture::new();
        let root = fx.alpha_beta();

        let mut indexer = Indexer::new(fx.config.clone());
        indexer.index(&root, false);
        assert!(indexer.dotfiles().is_empty());

        indexer.index(&root.join("alpha"), false);
        assert_eq!(indexer.dotfiles().len(), 1);
    }

    #[test]
    fn test_load_projects_groups_and_sorts_by_key() {
        let fx = Fixture::new();
        let root = fx.alpha_beta();

        let mut indexer = Indexer::new(fx.config.clone());
        indexer.index(&root, true);
        let registry = indexer.load_projects();

        let keys: Vec<&str> = registry.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["~/projects/alpha", "~/projects/beta"]);

        let (_, alpha) = registry.iter().next().unwrap();
        let hosts: Vec<&str> = alpha.iter().map(|r| r.host.as_str()).collect();
        assert_eq!(
            hosts,
            vec!["http://alpha.localhost", "http://sub.alpha.localhost", "livereload"]
        );
        assert_eq!(alpha[0].line_number, 1);
        assert_eq!(alpha[2].line_number, 3);
        assert_eq!(alpha[0].source_path, "~/projects/alpha/.localhost");
    }

    #[test]
    fn test_load_projects_annotates_cross_project_conflicts() {
        let fx = Fixture::new();
        let root = fx.alpha_beta();

        let mut indexer = Indexer::new(fx.config.clone());
        indexer.index(&root, true);
        let registry = indexer.load_projects();

        // alpha records are arena 0..3, beta records 3..6
        assert_eq!(registry.records[1].port_conflicts, vec![5]);
        assert_eq!(registry.records[5].port_conflicts, vec![1]);
        assert_eq!(registry.records[2].host_conflicts, vec![4]);
        assert_eq!(registry.records[4].host_conflicts, vec![2]);
        for idx in [0, 3] {
            assert!(!registry.records[idx].has_conflicts());
        }
    }

    #[test]
    fn test_load_projects_skips_deleted_project() {
        let fx = Fixture::new();
        let root = fx.alpha_beta();

        let mut indexer = Indexer::new(fx.config.clone());
        indexer.index(&root, true);
        fs::remove_dir_all(root.join("alpha")).unwrap();

        let registry = indexer.load_projects();
        let keys: Vec<&str> = registry.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["~/projects/beta"]);
    }

    #[test]
    fn test_load_projects_ignores_prose_lines() {
        let fx = Fixture::new();
        let dir = fx.project("gamma", &["# ports", "", "app.localhost:32000", "not an address"]);

        let mut indexer = Indexer::new(fx.config.clone());
        indexer.index(&dir, false);
        let registry = indexer.load_projects();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.records[0].host, "app.localhost");
        assert_eq!(registry.records[0].line_number, 3);
    }

    #[test]
    fn test_create_address_explicit_port() {
        let fx = Fixture::new();
        let dir = fx.project("hello", &[]);

        let mut indexer = Indexer::new(fx.config.clone());
        let idx = indexer.create_address("hello.localhost:7777", &dir);

        let record = &indexer.projects().records[idx];
        assert_eq!(record.host, "hello.localhost");
        assert_eq!(record.port, 7777);
        assert!(!record.has_conflicts());
    }

    #[test]
    fn test_create_address_explicit_port_collision_is_visible() {
        let fx = Fixture::new();
        let root = fx.alpha_beta();

        let mut indexer = Indexer::new(fx.config.clone());
        indexer.index(&root, true);
        indexer.load_projects();

        // Explicit port is honored even though alpha already claims 30000
        let idx = indexer.create_address("late.localhost:30000", &root.join("beta"));
        let record = &indexer.projects().records[idx];
        assert_eq!(record.port, 30000);
        assert_eq!(record.port_conflicts, vec![0]);
        assert!(indexer.projects().records[0].port_conflicts.contains(&idx));
    }

    #[test]
    fn test_create_address_bare_host_allocates_port() {
        let fx = Fixture::new();
        let root = fx.alpha_beta();

        let mut indexer = Indexer::new(fx.config.clone());
        indexer.index(&root, true);
        indexer.load_projects();

        let idx = indexer.create_address("fresh.localhost", &root.join("alpha"));
        let record = &indexer.projects().records[idx];
        assert_eq!(record.host, "fresh.localhost");
        assert!(PORT_RANGE.contains(&record.port));
        // Allocation avoids every existing claim, so no port conflicts
        assert!(record.port_conflicts.is_empty());
        assert!(record.host_conflicts.is_empty());
    }

    #[test]
    fn test_append_address_to_dotfile() {
        let fx = Fixture::new();
        let dir = fx.home.join("projects").join("new");
        fs::create_dir_all(&dir).unwrap();

        let indexer = Indexer::new(fx.config.clone());
        let record = AddressRecord::new("a.localhost".into(), 30500, String::new(), 1);
        indexer.append_address_to_dotfile(&record, &dir).unwrap();
        let record2 = AddressRecord::new("b.localhost".into(), 30501, String::new(), 2);
        indexer.append_address_to_dotfile(&record2, &dir).unwrap();

        let raw = fs::read_to_string(dir.join(DOTFILE)).unwrap();
        assert_eq!(raw, "a.localhost:30500\nb.localhost:30501\n");
    }

    #[test]
    fn test_save_then_reload_roundtrip() {
        let fx = Fixture::new();
        let root = fx.alpha_beta();

        let mut indexer = Indexer::new(fx.config.clone());
        indexer.index(&root, true);
        let tracked = indexer.dotfiles().to_vec();
        indexer.save().unwrap();

        let reloaded = Indexer::new(fx.config.clone());
        assert_eq!(reloaded.dotfiles(), tracked.as_slice());
    }

    #[test]
    fn test_fresh_indexer_has_empty_registry() {
        let fx = Fixture::new();
        let indexer = Indexer::new(fx.config.clone());
        assert!(indexer.projects().is_empty());
        assert!(indexer.dotfiles().is_empty());
    }
}
