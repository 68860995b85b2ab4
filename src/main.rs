use std::path::PathBuf;

use argh::FromArgs;
use linecommand::{App, Command, HistorySource, Settings};
use tracing::level_filters::LevelFilter;

#[derive(FromArgs)]
/// A demo shell: `echo` repeats its arguments, `greet` says hello.
struct Args {
    #[argh(option, short = 't')]
    /// prompt title, shown as "<title>> "
    title: Option<String>,

    #[argh(option)]
    /// history file to use instead of ~/.command_history
    history_file: Option<PathBuf>,

    #[argh(switch)]
    /// keep history for this session only
    no_history: bool,

    #[argh(switch, short = 'v')]
    /// log engine activity to stderr
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();

    linecommand::logger::init(if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    });

    let history = if args.no_history {
        HistorySource::Disabled
    } else if let Some(path) = args.history_file {
        HistorySource::File(path)
    } else {
        HistorySource::Home
    };

    let mut app = App::new().with_settings(Settings::default().history(history));
    if let Some(title) = args.title {
        app.set_command_title(title);
    }

    app.add_command(
        Command::new("echo", |_: &Command, args: &str| println!("{args}"))
            .short("echo back what ever you say")
            .long("echo back what ever you say, exactly as typed"),
    );
    app.add_command(
        Command::new("greet", |_: &Command, args: &str| {
            let who = if args.is_empty() { "stranger" } else { args };
            println!("Hello, {who}!");
        })
        .short("say hello to someone")
        .complete_options(["world", "rustaceans"]),
    );
    app.set_default_handler(|line: &str| {
        println!("Oh noes that does not make sense. {line}");
    });

    match app.run() {
        Err(err) if err.is_end_of_input() => Ok(()),
        other => Ok(other?),
    }
}
