use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Previously entered lines, optionally backed by a plain-text file.
///
/// The file holds one line per entry, oldest first. Every IO failure is
/// logged and otherwise ignored: a broken history file must never stop the
/// shell.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: Option<PathBuf>,
    entries: Vec<String>,
    limit: usize,
}

impl HistoryStore {
    pub const FILE_NAME: &'static str = ".command_history";
    pub const DEFAULT_LIMIT: usize = 500;

    /// `~/.command_history`, if a home directory can be resolved.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(Self::FILE_NAME))
    }

    /// History that is never written anywhere.
    pub fn in_memory(limit: usize) -> Self {
        Self {
            path: None,
            entries: Vec::new(),
            limit,
        }
    }

    /// Load history from `path`.
    ///
    /// A missing file yields an empty history that will be saved to `path`.
    /// Invalid UTF-8 is decoded lossily. A file that exists but can't be read
    /// leaves the history memory only, so it is never overwritten. With no
    /// path the history is memory only.
    pub fn load(path: Option<PathBuf>, limit: usize) -> Self {
        let mut store = Self::in_memory(limit);
        let Some(path) = path else {
            debug!("no history path, history will not be persisted");
            return store;
        };

        match fs::read(&path) {
            Ok(bytes) => {
                store.entries = String::from_utf8_lossy(&bytes)
                    .lines()
                    .map(|line| line.trim_end_matches('\r'))
                    .filter(|line| !line.trim().is_empty())
                    .map(str::to_string)
                    .collect();
                store.truncate();
                debug!(path = %path.display(), entries = store.entries.len(), "history loaded");
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no history file yet");
            }
            Err(err) => {
                debug!(path = %path.display(), error = %err, "can't read history, not persisting");
                return store;
            }
        }
        store.path = Some(path);
        store
    }

    /// Record a line. Blank lines are skipped.
    pub fn append(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        self.entries.push(line.to_string());
        self.truncate();
    }

    /// Rewrite the history file with the current entries.
    pub fn save(&self) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(err) = self.write_to(path) {
            debug!(path = %path.display(), error = %err, "can't save history");
        }
    }

    fn write_to(&self, path: &Path) -> io::Result<()> {
        let mut out = String::new();
        for line in &self.entries {
            out.push_str(line);
            out.push('\n');
        }
        fs::write(path, out)
    }

    fn truncate(&mut self) {
        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_persistent(&self) -> bool {
        self.path.is_some()
    }
}
