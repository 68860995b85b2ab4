use rustyline::Config;
use rustyline::Editor;
use rustyline::history::DefaultHistory;
use tracing::debug;

use crate::completion::{CommandHelper, CompletionEngine};
use crate::config::Settings;
use crate::error::{Error, Result};

/// The line-editing primitive the dispatch loop reads from.
///
/// Implementations own whatever terminal state they need (raw mode,
/// key bindings, in-memory recall list). The loop releases them with
/// [`close`](Terminal::close) exactly once when it stops.
pub trait Terminal {
    fn set_prompt(&mut self, prompt: &str);

    /// Route tab completion through `engine`.
    fn set_completer(&mut self, engine: CompletionEngine);

    /// Block until the user submits a line.
    ///
    /// Returns [`Error::Interrupted`] or [`Error::Eof`] when the user ends
    /// the session.
    fn read_line(&mut self) -> Result<String>;

    /// Make `line` available to in-session recall (up-arrow).
    fn add_history(&mut self, line: &str);

    fn close(&mut self);
}

/// [`Terminal`] backed by a rustyline editor.
pub struct LineEditor {
    editor: Option<Editor<CommandHelper, DefaultHistory>>,
    prompt: String,
}

impl LineEditor {
    /// Create the editor. Fails when the terminal can't be set up.
    pub fn new(settings: &Settings) -> Result<Self> {
        let config = Config::builder()
            .max_history_size(settings.history_limit)?
            .auto_add_history(false)
            .completion_type(settings.completion_style.into())
            .build();
        let mut editor = Editor::with_config(config)?;
        editor.set_helper(Some(CommandHelper::default()));
        debug!("line editor ready");
        Ok(Self {
            editor: Some(editor),
            prompt: String::new(),
        })
    }
}

impl Terminal for LineEditor {
    fn set_prompt(&mut self, prompt: &str) {
        self.prompt = prompt.to_string();
    }

    fn set_completer(&mut self, engine: CompletionEngine) {
        if let Some(editor) = self.editor.as_mut() {
            editor.set_helper(Some(CommandHelper::new(engine)));
        }
    }

    fn read_line(&mut self) -> Result<String> {
        let editor = self.editor.as_mut().ok_or(Error::Closed)?;
        Ok(editor.readline(&self.prompt)?)
    }

    fn add_history(&mut self, line: &str) {
        if let Some(editor) = self.editor.as_mut() {
            if let Err(err) = editor.add_history_entry(line) {
                debug!(error = %err, "can't add history entry");
            }
        }
    }

    fn close(&mut self) {
        // Dropping the editor restores the terminal mode.
        if self.editor.take().is_some() {
            debug!("line editor closed");
        }
    }
}
