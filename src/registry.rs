use std::rc::Rc;

use crate::command::{AppId, Command, DefaultHandler};
use crate::completion::CompletionIndex;

/// Ordered collection of commands plus the fallback handler and prompt title.
///
/// Insertion order is the order used for `help`, completion and matching.
/// Names are not deduplicated: a later command whose name is shadowed by an
/// earlier prefix match is simply never selected.
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<Command>,
    index: CompletionIndex,
    default_handler: Option<Rc<dyn DefaultHandler>>,
    title: Option<String>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `command` on behalf of `app`.
    pub fn add_command(&mut self, app: AppId, mut command: Command) {
        command.stamp(app);
        self.index.push(command.name(), command.completions());
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn completion_index(&self) -> &CompletionIndex {
        &self.index
    }

    /// Position of the first command whose lower-cased name prefixes `line`.
    ///
    /// `line` is expected to be trimmed and lower-cased already.
    pub fn find_prefix(&self, line: &str) -> Option<usize> {
        self.commands
            .iter()
            .position(|command| line.starts_with(&command.name().to_lowercase()))
    }

    /// Exact, case-insensitive lookup by name.
    pub fn find(&self, name: &str) -> Option<&Command> {
        self.commands
            .iter()
            .find(|command| command.name().eq_ignore_ascii_case(name))
    }

    pub fn set_default_handler(&mut self, handler: impl DefaultHandler + 'static) {
        self.default_handler = Some(Rc::new(handler));
    }

    pub fn default_handler(&self) -> Option<Rc<dyn DefaultHandler>> {
        self.default_handler.clone()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Prompt rendered from the title: `"<title>> "`, or `"> "` when unset.
    pub fn prompt(&self) -> String {
        match self.title() {
            Some(title) if !title.is_empty() => format!("{title}> "),
            _ => "> ".to_string(),
        }
    }
}
