use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of the [`App`](crate::App) a command was registered with.
///
/// Commands only hold this token, never a reference to the app itself,
/// so registration does not create any ownership cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AppId(u64);

impl AppId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        AppId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Behavior attached to a [`Command`].
///
/// Receives the matched command and the remainder of the input line with
/// the command name removed. A blanket implementation exists for closures
/// of the form `Fn(&Command, &str)`.
pub trait CommandHandler {
    /// Runs the command.
    fn execute(&self, command: &Command, args: &str);
}

impl<F: Fn(&Command, &str)> CommandHandler for F {
    fn execute(&self, command: &Command, args: &str) {
        self(command, args)
    }
}

/// Fallback invoked with the full, unmodified line when nothing matches.
pub trait DefaultHandler {
    fn execute(&self, line: &str);
}

impl<F: Fn(&str)> DefaultHandler for F {
    fn execute(&self, line: &str) {
        self(line)
    }
}

/// A named command the shell can dispatch to.
///
/// Built with [`Command::new`] and the chained setters, then handed to
/// [`App::add_command`](crate::App::add_command). Once registered a command
/// is immutable.
///
/// Example
/// ```
/// use linecommand::Command;
/// let echo = Command::new("echo", |_cmd: &Command, args: &str| println!("{args}"))
///     .short("echo back what ever you say")
///     .complete_options(["hello", "world"]);
/// assert_eq!(echo.name(), "echo");
/// assert!(echo.app().is_none());
/// ```
#[derive(Clone)]
pub struct Command {
    name: String,
    short: String,
    long: String,
    handler: Rc<dyn CommandHandler>,
    complete_options: Vec<String>,
    app: Option<AppId>,
}

impl Command {
    /// Create a command with the given name and handler.
    pub fn new(name: impl Into<String>, handler: impl CommandHandler + 'static) -> Self {
        Self {
            name: name.into(),
            short: String::new(),
            long: String::new(),
            handler: Rc::new(handler),
            complete_options: Vec::new(),
            app: None,
        }
    }

    /// One-line description shown in the `help` listing.
    #[must_use]
    pub fn short(mut self, text: impl Into<String>) -> Self {
        self.short = text.into();
        self
    }

    /// Longer description shown by `help <name>`.
    #[must_use]
    pub fn long(mut self, text: impl Into<String>) -> Self {
        self.long = text.into();
        self
    }

    /// Static completions offered for the argument position.
    #[must_use]
    pub fn complete_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.complete_options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn short_description(&self) -> &str {
        &self.short
    }

    pub fn long_description(&self) -> &str {
        &self.long
    }

    pub fn completions(&self) -> &[String] {
        &self.complete_options
    }

    /// The app this command was registered with, `None` before registration.
    pub fn app(&self) -> Option<AppId> {
        self.app
    }

    /// Each registration owns its own value, so a clone of a registered
    /// command is restamped with the app it is added to.
    pub(crate) fn stamp(&mut self, app: AppId) {
        self.app = Some(app);
    }

    /// Invoke the handler with `args`.
    pub fn run(&self, args: &str) {
        self.handler.execute(self, args);
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("short", &self.short)
            .field("complete_options", &self.complete_options)
            .field("app", &self.app)
            .finish_non_exhaustive()
    }
}
