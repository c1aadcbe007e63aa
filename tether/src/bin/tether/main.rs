mod commands;
mod examples;
mod output;
mod theme;

use std::fmt::Write;
use std::io::{self, Write as IoWrite};
use std::path::PathBuf;

use anyhow::Result;
use clap::{
    ColorChoice, Command, CommandFactory, FromArgMatches, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Color as ClapColor, RgbColor, Style},
    },
    error::ErrorKind,
};
use colored::{Color as ThemeColor, Colorize, control::ShouldColorize};
use tether::TetherConfig;

use commands::{
    feed::{FeedArgs, handle_feed},
    graph::{GraphCommands, handle_graph_commands},
    serve::{ServeArgs, handle_serve},
    users::{UserCommands, handle_user_commands},
};
use examples::{ExampleGroup, command_examples};
use output::{GlobalOptions, OutputFormat, OutputManager};
use theme::{ICONS, THEME};

const ENVIRONMENT_VARIABLES: &[(&str, &str)] = &[
    ("REDIS_URL", "Redis connection URL (default redis://127.0.0.1:6379)"),
    ("TETHER_CONFIG", "Path to the configuration file (default ./tether.toml)"),
    ("RUST_LOG", "Log filter, e.g. 'tether=debug'"),
];

#[derive(Parser)]
#[command(name = "tether")]
#[command(version)]
#[command(
    about = "Follow graph, posts and feeds for a small social network",
    long_about = r#"Tether keeps accounts, follow relationships, posts, likes and comments in Redis
and serves them as a JSON API.

Commands:
  serve     Run the HTTP API
  users     List, inspect and register accounts
  graph     Follow, unfollow and inspect relationships
  feed      Print an account's feed
"#
)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, env = "TETHER_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "table", global = true)]
    output: OutputFormat,

    /// Suppress output (only errors will be shown)
    #[arg(short = 'q', long, global = true)]
    quiet: bool,

    /// Log at debug level
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve(ServeArgs),

    /// List, inspect and register accounts
    #[command(subcommand)]
    Users(UserCommands),

    /// Follow, unfollow and inspect relationships
    #[command(subcommand)]
    Graph(GraphCommands),

    /// Print the feed as a given account sees it
    Feed(FeedArgs),
}

impl Cli {
    fn parse_with_styles() -> Self {
        let command = build_cli_command();
        let error = match command.styles(help_styles()).try_get_matches() {
            Ok(matches) => match Cli::from_arg_matches(&matches) {
                Ok(cli) => return cli,
                Err(err) => err,
            },
            Err(err) => err,
        };
        match error.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print_padded(|| error.print(), false);
                std::process::exit(0);
            }
            ErrorKind::MissingSubcommand => handle_missing_subcommand(error),
            _ => {
                let exit_code = error.exit_code();
                print_padded(|| error.print(), true);
                std::process::exit(exit_code);
            }
        }
    }
}

fn print_padded(print: impl FnOnce() -> io::Result<()>, to_stderr: bool) {
    let blank: fn() -> io::Result<()> = if to_stderr { print_blank_line_stderr } else { print_blank_line_stdout };
    let _ = blank();
    if let Err(err) = print()
        && err.kind() != io::ErrorKind::BrokenPipe
    {
        eprintln!("Failed to write output: {err}");
    }
    let _ = blank();
}

fn handle_missing_subcommand(error: clap::error::Error) -> ! {
    let mut command = build_cli_command();
    let name = command.get_display_name().unwrap_or_else(|| command.get_name()).to_string();

    let _ = print_blank_line_stderr();
    eprintln!("error: '{name}' requires a subcommand but one was not provided");
    let _ = print_blank_line_stderr();

    command = command.styles(help_styles());
    let mut stderr = io::stderr();
    if command.write_long_help(&mut stderr).is_ok() {
        let _ = IoWrite::write_all(&mut stderr, b"\n");
        let _ = IoWrite::flush(&mut stderr);
    }
    std::process::exit(error.exit_code());
}

fn build_cli_command() -> Command {
    let use_color = ShouldColorize::from_env().should_colorize();
    let mut command = Cli::command()
        .after_long_help(render_top_level_appendix(use_color))
        .color(if use_color { ColorChoice::Auto } else { ColorChoice::Never });
    for example in command_examples() {
        if let Some(subcommand) = command.find_subcommand_mut(example.name) {
            *subcommand = subcommand.clone().after_long_help(render_examples(example.groups, use_color));
        }
    }
    command
}

fn render_examples(groups: &[ExampleGroup], use_color: bool) -> String {
    let mut buffer = String::new();
    let _ = writeln!(buffer, "{}", stylize("Examples:", THEME.highlight, true, use_color));

    for (index, group) in groups.iter().enumerate() {
        let _ = writeln!(buffer, "  {}", stylize(group.title, THEME.primary, true, use_color));
        for command in group.commands {
            let arrow = stylize(ICONS.arrow, THEME.secondary, false, use_color);
            let _ = writeln!(buffer, "    {arrow} {}", stylize(command, THEME.secondary, false, use_color));
        }
        if index + 1 < groups.len() {
            buffer.push('\n');
        }
    }
    buffer
}

fn render_top_level_appendix(use_color: bool) -> String {
    let mut buffer = String::new();
    let _ = writeln!(buffer, "{}", stylize("Environment Variables:", THEME.highlight, true, use_color));
    for (key, description) in ENVIRONMENT_VARIABLES {
        let _ = writeln!(
            buffer,
            "  {}  {}",
            stylize(key, THEME.key, true, use_color),
            stylize(description, THEME.value, false, use_color)
        );
    }
    buffer.push('\n');
    let tip = stylize(
        "Use 'tether <command> --help' to view examples for each command.",
        THEME.secondary,
        false,
        use_color,
    );
    let _ = writeln!(buffer, "{} {tip}", stylize("Tip:", THEME.highlight, true, use_color));
    buffer
}

fn print_blank_line_stdout() -> io::Result<()> {
    let mut stdout = io::stdout();
    IoWrite::write_all(&mut stdout, b"\n")?;
    IoWrite::flush(&mut stdout)
}

fn print_blank_line_stderr() -> io::Result<()> {
    let mut stderr = io::stderr();
    IoWrite::write_all(&mut stderr, b"\n")?;
    IoWrite::flush(&mut stderr)
}

fn stylize(text: &str, color: ThemeColor, bold: bool, use_color: bool) -> String {
    match (use_color, bold) {
        (false, _) => text.to_string(),
        (true, true) => text.color(color).bold().to_string(),
        (true, false) => text.color(color).to_string(),
    }
}

fn help_styles() -> Styles {
    Styles::styled()
        .usage(style_from_color(THEME.primary).bold())
        .header(style_from_color(THEME.highlight).bold())
        .literal(style_from_color(THEME.secondary))
        .placeholder(style_from_color(THEME.muted))
        .valid(style_from_color(THEME.success))
        .invalid(style_from_color(THEME.warning))
        .error(style_from_color(THEME.error).bold())
}

fn style_from_color(color: ThemeColor) -> Style {
    let color = match color {
        ThemeColor::Black => AnsiColor::Black,
        ThemeColor::Red => AnsiColor::Red,
        ThemeColor::Green => AnsiColor::Green,
        ThemeColor::Yellow => AnsiColor::Yellow,
        ThemeColor::Blue => AnsiColor::Blue,
        ThemeColor::Magenta => AnsiColor::Magenta,
        ThemeColor::Cyan => AnsiColor::Cyan,
        ThemeColor::White => AnsiColor::White,
        ThemeColor::BrightBlack => AnsiColor::BrightBlack,
        ThemeColor::BrightRed => AnsiColor::BrightRed,
        ThemeColor::BrightGreen => AnsiColor::BrightGreen,
        ThemeColor::BrightYellow => AnsiColor::BrightYellow,
        ThemeColor::BrightBlue => AnsiColor::BrightBlue,
        ThemeColor::BrightMagenta => AnsiColor::BrightMagenta,
        ThemeColor::BrightCyan => AnsiColor::BrightCyan,
        ThemeColor::BrightWhite => AnsiColor::BrightWhite,
        ThemeColor::TrueColor { r, g, b } => return Style::new().fg_color(Some(ClapColor::Rgb(RgbColor(r, g, b)))),
    };
    Style::new().fg_color(Some(ClapColor::Ansi(color)))
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "tether=debug" } else { "tether=info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse_with_styles();
    init_logging(cli.verbose);

    let _ = print_blank_line_stdout();
    match execute(cli).await {
        Ok(()) => {
            let _ = print_blank_line_stdout();
        }
        Err(err) => {
            eprintln!("Error: {err:#}");
            let _ = print_blank_line_stdout();
            std::process::exit(1);
        }
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let output = OutputManager::new(GlobalOptions {
        output_format: cli.output,
        quiet: cli.quiet,
        no_color: cli.no_color,
    });
    let config = TetherConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve(args) => handle_serve(args, config, &output).await?,
        Commands::Users(command) => handle_user_commands(command, &config, &output).await?,
        Commands::Graph(command) => handle_graph_commands(command, &config, &output).await?,
        Commands::Feed(args) => handle_feed(args, &config, &output).await?,
    }
    Ok(())
}
