use std::io::{self, Write};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::command::{AppId, Command, DefaultHandler};
use crate::completion::CompletionEngine;
use crate::config::{HistoryPolicy, Settings};
use crate::error::Result;
use crate::history::HistoryStore;
use crate::registry::CommandRegistry;
use crate::terminal::{LineEditor, Terminal};

const EXIT: &str = "exit";
const HELP: &str = "help";

/// How a single input line was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dispatch {
    Exit,
    Help,
    Command,
    Default,
    NotFound,
}

/// An interactive command shell.
///
/// Register commands with [`add_command`](App::add_command), then call
/// [`run`](App::run) to read and dispatch lines until the user types `exit`
/// or closes the input.
///
/// Example
/// ```
/// use linecommand::{App, Command, MemWriter};
/// let out = MemWriter::new();
/// let mut app = App::new().with_output(out.clone());
/// app.add_command(Command::new("echo", |_: &Command, args: &str| println!("{args}")).short("echo back"));
///
/// assert!(app.parse_command("echo hello"));
/// assert!(app.parse_command("help"));
/// assert!(out.contents().contains("echo\t\techo back"));
/// assert!(!app.parse_command("exit"));
/// ```
pub struct App {
    id: AppId,
    registry: CommandRegistry,
    settings: Settings,
    out: Box<dyn Write>,
}

impl Default for App {
    fn default() -> Self {
        Self {
            id: AppId::next(),
            registry: CommandRegistry::new(),
            settings: Settings::default(),
            out: Box::new(io::stdout()),
        }
    }
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Send `help` and "command not found" output to `out` instead of stdout.
    #[must_use]
    pub fn with_output(mut self, out: impl Write + 'static) -> Self {
        self.out = Box::new(out);
        self
    }

    pub fn id(&self) -> AppId {
        self.id
    }

    pub fn commands(&self) -> &[Command] {
        self.registry.commands()
    }

    pub fn add_command(&mut self, command: Command) {
        self.registry.add_command(self.id, command);
    }

    /// Title shown in the prompt as `"<title>> "`.
    pub fn set_command_title(&mut self, title: impl Into<String>) {
        self.registry.set_title(title);
    }

    /// Handler for lines that match no command. It receives the line as typed.
    pub fn set_default_handler(&mut self, handler: impl DefaultHandler + 'static) {
        self.registry.set_default_handler(handler);
    }

    /// Run the shell on a rustyline terminal.
    ///
    /// Returns `Ok(())` after `exit`. Interrupt and end of input are returned
    /// as [`Error::Interrupted`](crate::Error::Interrupted) and
    /// [`Error::Eof`](crate::Error::Eof).
    pub fn run(&mut self) -> Result<()> {
        let terminal = LineEditor::new(&self.settings)?;
        self.run_with(terminal)
    }

    /// Run the shell on any [`Terminal`].
    ///
    /// The terminal is closed when this returns, whichever way it returns.
    pub fn run_with<T: Terminal>(&mut self, terminal: T) -> Result<()> {
        let mut terminal = TerminalGuard::new(terminal);

        let mut history = HistoryStore::load(
            self.settings.history.resolve(),
            self.settings.history_limit,
        );
        terminal.set_prompt(&self.registry.prompt());
        terminal.set_completer(CompletionEngine::new(Arc::new(
            self.registry.completion_index().clone(),
        )));
        for line in history.entries() {
            terminal.add_history(line);
        }

        loop {
            let line = terminal.read_line().inspect_err(|err| {
                debug!(error = %err, "input ended");
            })?;
            let outcome = self.dispatch(&line);
            if outcome == Dispatch::Exit {
                debug!("exit requested");
                return Ok(());
            }
            if self.records(outcome) && !line.trim().is_empty() {
                history.append(&line);
                terminal.add_history(&line);
                history.save();
            }
        }
    }

    /// Handle one line. Returns `false` when the shell should stop.
    pub fn parse_command(&mut self, line: &str) -> bool {
        self.dispatch(line) != Dispatch::Exit
    }

    fn dispatch(&mut self, line: &str) -> Dispatch {
        let lowered = line.to_lowercase();
        let lowered = lowered.trim();

        if lowered.starts_with(EXIT) {
            return Dispatch::Exit;
        }
        if let Some(topic) = lowered.strip_prefix(HELP) {
            self.help(topic.trim());
            return Dispatch::Help;
        }

        if let Some(position) = self.registry.find_prefix(lowered) {
            let command = self.registry.commands()[position].clone();
            let args = remove_all(line, command.name());
            debug!(command = command.name(), args = %args, "dispatching");
            command.run(&args);
            return Dispatch::Command;
        }

        match self.registry.default_handler() {
            Some(handler) => {
                handler.execute(line);
                Dispatch::Default
            }
            None => {
                self.print(&format!("'{lowered}': command not found.\n"));
                Dispatch::NotFound
            }
        }
    }

    fn records(&self, outcome: Dispatch) -> bool {
        match self.settings.history_policy {
            HistoryPolicy::EveryLine => true,
            HistoryPolicy::DispatchedOnly => outcome == Dispatch::Command,
            HistoryPolicy::Off => false,
        }
    }

    fn help(&mut self, topic: &str) {
        let text = match self.registry.find(topic).filter(|_| !topic.is_empty()) {
            Some(command) => {
                let description = if command.long_description().is_empty() {
                    command.short_description()
                } else {
                    command.long_description()
                };
                format!("{}\t\t{}\n", command.name(), description)
            }
            None => {
                let mut text = String::from("Usage:\n");
                for command in self.registry.commands() {
                    text.push_str(&format!(
                        "{}\t\t{}\n",
                        command.name(),
                        command.short_description()
                    ));
                }
                text.push_str("exit\t\tquit the shell\n");
                text.push_str("help\t\tthis help text\n");
                text
            }
        };
        self.print(&text);
    }

    fn print(&mut self, text: &str) {
        if let Err(err) = self.out.write_all(text.as_bytes()).and_then(|()| self.out.flush()) {
            warn!(error = %err, "can't write shell output");
        }
    }
}

/// Remove every occurrence of the command name from the line, not only the
/// leading one, then trim. `"echo echo hi"` dispatched to `echo` yields `"hi"`.
fn remove_all(line: &str, name: &str) -> String {
    line.replace(name, "").trim().to_string()
}

/// Owns the terminal for the duration of a run and closes it on drop,
/// including when a handler panics.
struct TerminalGuard<T: Terminal> {
    terminal: T,
}

impl<T: Terminal> TerminalGuard<T> {
    fn new(terminal: T) -> Self {
        Self { terminal }
    }
}

impl<T: Terminal> Deref for TerminalGuard<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.terminal
    }
}

impl<T: Terminal> DerefMut for TerminalGuard<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.terminal
    }
}

impl<T: Terminal> Drop for TerminalGuard<T> {
    fn drop(&mut self) {
        self.terminal.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HistorySource;
    use crate::error::Error;
    use crate::io_adapters::MemWriter;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::fs;
    use std::panic::{self, AssertUnwindSafe};
    use std::rc::Rc;

    #[derive(Default)]
    struct TerminalLog {
        prompt: String,
        recalled: Vec<String>,
        completer: Option<CompletionEngine>,
        closed: usize,
    }

    /// Feeds a fixed list of lines, then reports `end`.
    struct ScriptedTerminal {
        lines: VecDeque<String>,
        end: fn() -> Error,
        log: Rc<RefCell<TerminalLog>>,
    }

    impl ScriptedTerminal {
        fn new(lines: &[&str]) -> (Self, Rc<RefCell<TerminalLog>>) {
            let log = Rc::new(RefCell::new(TerminalLog::default()));
            let terminal = Self {
                lines: lines.iter().map(|l| l.to_string()).collect(),
                end: || Error::Eof,
                log: log.clone(),
            };
            (terminal, log)
        }
    }

    impl Terminal for ScriptedTerminal {
        fn set_prompt(&mut self, prompt: &str) {
            self.log.borrow_mut().prompt = prompt.to_string();
        }

        fn set_completer(&mut self, engine: CompletionEngine) {
            self.log.borrow_mut().completer = Some(engine);
        }

        fn read_line(&mut self) -> Result<String> {
            self.lines.pop_front().ok_or_else(self.end)
        }

        fn add_history(&mut self, line: &str) {
            self.log.borrow_mut().recalled.push(line.to_string());
        }

        fn close(&mut self) {
            self.log.borrow_mut().closed += 1;
        }
    }

    type Calls = Rc<RefCell<Vec<(String, String)>>>;

    fn recording(name: &str, calls: &Calls) -> Command {
        let calls = calls.clone();
        Command::new(name, move |cmd: &Command, args: &str| {
            calls
                .borrow_mut()
                .push((cmd.name().to_string(), args.to_string()));
        })
    }

    fn explode(_: &Command, _: &str) {
        panic!("handler failed");
    }

    fn app_without_history() -> (App, MemWriter) {
        let out = MemWriter::new();
        let app = App::new()
            .with_settings(Settings::default().history(HistorySource::Disabled))
            .with_output(out.clone());
        (app, out)
    }

    #[test]
    fn test_exit_stops_case_insensitively() {
        let (mut app, _) = app_without_history();
        assert!(!app.parse_command("exit"));
        assert!(!app.parse_command("EXIT"));
        assert!(!app.parse_command("  Exit now  "));
    }

    #[test]
    fn test_help_lists_commands_and_footer() {
        let (mut app, out) = app_without_history();
        let calls = Calls::default();
        app.add_command(recording("echo", &calls).short("echo back what ever you say"));
        app.add_command(recording("list", &calls).short("list things"));

        assert!(app.parse_command("help"));
        assert_eq!(
            out.contents(),
            "Usage:\n\
             echo\t\techo back what ever you say\n\
             list\t\tlist things\n\
             exit\t\tquit the shell\n\
             help\t\tthis help text\n"
        );
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_help_with_command_name_prints_long_description() {
        let (mut app, out) = app_without_history();
        let calls = Calls::default();
        app.add_command(
            recording("echo", &calls)
                .short("echo back")
                .long("echo back what ever you say, verbatim"),
        );

        assert!(app.parse_command("help Echo"));
        assert_eq!(out.take(), "echo\t\techo back what ever you say, verbatim\n");

        assert!(app.parse_command("help nothing"));
        assert!(out.take().starts_with("Usage:\n"));
    }

    #[test]
    fn test_unmatched_without_default_prints_not_found() {
        let (mut app, out) = app_without_history();
        assert!(app.parse_command("  Unknown XYZ "));
        assert_eq!(out.contents(), "'unknown xyz': command not found.\n");
    }

    #[test]
    fn test_unmatched_goes_to_default_handler_verbatim() {
        let (mut app, out) = app_without_history();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        app.set_default_handler(move |line: &str| sink.borrow_mut().push(line.to_string()));

        assert!(app.parse_command("Unknown XYZ"));
        assert_eq!(*seen.borrow(), vec!["Unknown XYZ"]);
        assert_eq!(out.contents(), "");
    }

    #[test]
    fn test_command_receives_trimmed_arguments() {
        let (mut app, _) = app_without_history();
        let calls = Calls::default();
        app.add_command(recording("echo", &calls));

        assert!(app.parse_command("  echo   hello world  "));
        assert!(app.parse_command("echo"));
        assert_eq!(
            *calls.borrow(),
            vec![
                ("echo".to_string(), "hello world".to_string()),
                ("echo".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_every_occurrence_of_name_is_removed() {
        let (mut app, _) = app_without_history();
        let calls = Calls::default();
        app.add_command(recording("echo", &calls));

        app.parse_command("echo echo hi");
        app.parse_command("echo say echo");
        assert_eq!(calls.borrow()[0].1, "hi");
        assert_eq!(calls.borrow()[1].1, "say");
    }

    #[test]
    fn test_uppercase_input_matches_but_only_exact_case_is_removed() {
        let (mut app, _) = app_without_history();
        let calls = Calls::default();
        app.add_command(recording("echo", &calls));

        app.parse_command("ECHO Hi");
        assert_eq!(calls.borrow()[0].1, "ECHO Hi");
    }

    #[test]
    fn test_first_registered_prefix_wins() {
        let (mut app, _) = app_without_history();
        let calls = Calls::default();
        app.add_command(recording("a", &calls));
        app.add_command(recording("ab", &calls));
        app.parse_command("ab args");

        let (mut reversed, _) = app_without_history();
        reversed.add_command(recording("ab", &calls));
        reversed.add_command(recording("a", &calls));
        reversed.parse_command("ab args");

        assert_eq!(
            *calls.borrow(),
            vec![
                ("a".to_string(), "b rgs".to_string()),
                ("ab".to_string(), "args".to_string()),
            ]
        );
    }

    #[test]
    fn test_registered_commands_point_back_to_app() {
        let (mut app, _) = app_without_history();
        app.add_command(recording("echo", &Calls::default()));
        assert_eq!(app.commands()[0].app(), Some(app.id()));
    }

    #[test]
    fn test_clone_of_registered_command_joins_another_app() {
        let (mut first, _) = app_without_history();
        let (mut second, _) = app_without_history();
        let calls = Calls::default();
        first.add_command(recording("echo", &calls));

        second.add_command(first.commands()[0].clone());

        assert_eq!(first.commands()[0].app(), Some(first.id()));
        assert_eq!(second.commands()[0].app(), Some(second.id()));
        assert!(second.parse_command("echo hi"));
        assert_eq!(*calls.borrow(), vec![("echo".to_string(), "hi".to_string())]);
    }

    #[test]
    fn test_run_configures_terminal_and_stops_on_exit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history");
        let calls = Calls::default();
        let mut app = App::new()
            .with_settings(Settings::default().history(HistorySource::File(path.clone())))
            .with_output(MemWriter::new());
        app.set_command_title("demo");
        app.add_command(recording("echo", &calls).complete_options(["world"]));

        let (terminal, log) = ScriptedTerminal::new(&["echo hi", "help", "exit", "echo never"]);
        assert!(app.run_with(terminal).is_ok());

        assert_eq!(*calls.borrow(), vec![("echo".to_string(), "hi".to_string())]);
        assert_eq!(fs::read_to_string(&path).unwrap(), "echo hi\nhelp\n");

        let log = log.borrow();
        assert_eq!(log.closed, 1);
        assert_eq!(log.prompt, "demo> ");
        assert_eq!(log.recalled, vec!["echo hi", "help"]);
        let engine = log.completer.as_ref().unwrap();
        assert_eq!(engine.complete("ec", 2).suffixes(), vec!["ho"]);
        assert_eq!(engine.complete("echo w", 6).suffixes(), vec!["orld"]);
    }

    #[test]
    fn test_end_of_input_is_returned_and_terminal_closed() {
        let (mut app, _) = app_without_history();
        let (terminal, log) = ScriptedTerminal::new(&["anything"]);
        let err = app.run_with(terminal).unwrap_err();
        assert!(matches!(err, Error::Eof));
        assert_eq!(log.borrow().closed, 1);

        let (mut terminal, log) = ScriptedTerminal::new(&[]);
        terminal.end = || Error::Interrupted;
        let err = app.run_with(terminal).unwrap_err();
        assert!(err.is_end_of_input());
        assert_eq!(log.borrow().closed, 1);
    }

    #[test]
    fn test_panicking_handler_still_closes_terminal() {
        let (mut app, _) = app_without_history();
        app.add_command(Command::new("boom", explode));
        let (terminal, log) = ScriptedTerminal::new(&["boom"]);

        let result = panic::catch_unwind(AssertUnwindSafe(|| app.run_with(terminal)));
        assert!(result.is_err());
        assert_eq!(log.borrow().closed, 1);
    }

    #[test]
    fn test_history_is_loaded_into_terminal_and_extended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history");
        fs::write(&path, "old\n").unwrap();

        let mut app = App::new()
            .with_settings(Settings::default().history(HistorySource::File(path.clone())))
            .with_output(MemWriter::new());
        app.add_command(recording("echo", &Calls::default()));

        let (terminal, log) = ScriptedTerminal::new(&["echo new", "", "exit"]);
        app.run_with(terminal).unwrap();

        assert_eq!(log.borrow().recalled, vec!["old", "echo new"]);
        assert_eq!(fs::read_to_string(&path).unwrap(), "old\necho new\n");
    }

    #[test]
    fn test_dispatched_only_policy_skips_help_and_unmatched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history");
        let mut app = App::new()
            .with_settings(
                Settings::default()
                    .history(HistorySource::File(path.clone()))
                    .history_policy(HistoryPolicy::DispatchedOnly),
            )
            .with_output(MemWriter::new());
        app.add_command(recording("echo", &Calls::default()));

        let (terminal, _) = ScriptedTerminal::new(&["echo a", "nope", "help", "exit"]);
        app.run_with(terminal).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "echo a\n");
    }

    #[test]
    fn test_history_off_never_touches_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history");
        let mut app = App::new()
            .with_settings(
                Settings::default()
                    .history(HistorySource::File(path.clone()))
                    .history_policy(HistoryPolicy::Off),
            )
            .with_output(MemWriter::new());

        let (terminal, log) = ScriptedTerminal::new(&["whatever", "exit"]);
        app.run_with(terminal).unwrap();

        assert!(!path.exists());
        assert!(log.borrow().recalled.is_empty());
    }
}
