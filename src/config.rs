use std::path::PathBuf;

use rustyline::CompletionType;

use crate::history::HistoryStore;

/// Where history is read from and written to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HistorySource {
    /// `~/.command_history`, or memory only when no home directory resolves.
    #[default]
    Home,
    /// An explicit file.
    File(PathBuf),
    /// Keep history in memory for this session only.
    Disabled,
}

impl HistorySource {
    /// Resolve to a concrete path, if any.
    pub fn resolve(&self) -> Option<PathBuf> {
        match self {
            HistorySource::Home => HistoryStore::default_path(),
            HistorySource::File(path) => Some(path.clone()),
            HistorySource::Disabled => None,
        }
    }
}

/// Which completed round-trips are recorded in history.
///
/// Lines classified as `exit` are never recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistoryPolicy {
    /// Every non-exit line, including `help` and unmatched input.
    #[default]
    EveryLine,
    /// Only lines that ran a registered command.
    DispatchedOnly,
    /// Nothing is recorded.
    Off,
}

/// How the terminal presents several completion candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompletionStyle {
    /// Complete the common prefix, then list all candidates.
    #[default]
    List,
    /// Cycle through candidates on repeated tab presses.
    Circular,
}

impl From<CompletionStyle> for CompletionType {
    fn from(style: CompletionStyle) -> Self {
        match style {
            CompletionStyle::List => CompletionType::List,
            CompletionStyle::Circular => CompletionType::Circular,
        }
    }
}

/// Tunables for an [`App`](crate::App).
///
/// Example
/// ```
/// use linecommand::{HistoryPolicy, HistorySource, Settings};
/// let settings = Settings::default()
///     .history(HistorySource::Disabled)
///     .history_policy(HistoryPolicy::DispatchedOnly);
/// assert_eq!(settings.history_limit, 500);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub history: HistorySource,
    pub history_policy: HistoryPolicy,
    /// Maximum number of lines kept and persisted.
    pub history_limit: usize,
    pub completion_style: CompletionStyle,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history: HistorySource::Home,
            history_policy: HistoryPolicy::EveryLine,
            history_limit: HistoryStore::DEFAULT_LIMIT,
            completion_style: CompletionStyle::List,
        }
    }
}

impl Settings {
    #[must_use]
    pub fn history(mut self, source: HistorySource) -> Self {
        self.history = source;
        self
    }

    #[must_use]
    pub fn history_policy(mut self, policy: HistoryPolicy) -> Self {
        self.history_policy = policy;
        self
    }

    #[must_use]
    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    #[must_use]
    pub fn completion_style(mut self, style: CompletionStyle) -> Self {
        self.completion_style = style;
        self
    }
}
