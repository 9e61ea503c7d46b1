//! Purpose: `liftlog` CLI entry point.
//! Role: Binary crate root; parses args, selects a backend, runs commands.
//! Invariants: Tables go to stdout for humans; `--json` emits stable JSON on stdout.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: All client-side state changes go through `api::Session`.
#![allow(clippy::result_large_err)]
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use time::OffsetDateTime;
use time::macros::format_description;
use tracing_subscriber::EnvFilter;

mod command_dispatch;
mod render;
mod serve;

use liftlog::api::{
    BackendConfig, DEFAULT_LIMIT, Error, ErrorKind, WorkoutDraft, default_store_path,
    to_exit_code,
};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint("Run `liftlog --help` for usage."),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    if !matches!(cli.command, Command::Serve(_)) {
        init_client_tracing();
    }
    let options = GlobalOptions {
        store: cli.store,
        remote: cli.remote,
        limit: cli.limit,
        timeout: Duration::from_millis(cli.timeout_ms),
    };

    command_dispatch::dispatch_command(cli.command, options).map_err(|err| (err, color_mode))
}

#[derive(Parser)]
#[command(
    name = "liftlog",
    version,
    about = "Log workouts to a local file or a remote liftlog service",
    long_about = None,
    after_help = r#"EXAMPLES
  $ liftlog list
  $ liftlog add --exercise "Bench Press" --sets 3 --reps 8 --weight 135
  $ liftlog edit 4 --weight 145
  $ liftlog delete 4 --page 1
  $ liftlog stats
  $ liftlog serve --bind 127.0.0.1:5000
  $ liftlog --remote http://127.0.0.1:5000 list --page 2"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        value_name = "PATH",
        help = "Local JSON store (default: ~/.liftlog/workouts.json)",
        value_hint = clap::ValueHint::FilePath
    )]
    store: Option<PathBuf>,
    #[arg(
        long,
        value_name = "URL",
        help = "Use a remote liftlog service instead of the local store"
    )]
    remote: Option<String>,
    #[arg(long, default_value_t = DEFAULT_LIMIT, help = "Records per page")]
    limit: u64,
    #[arg(
        long,
        default_value_t = 10_000,
        value_name = "MS",
        help = "Remote request timeout in milliseconds"
    )]
    timeout_ms: u64,
    #[arg(
        long,
        value_enum,
        default_value = "auto",
        help = "Colorize error output: auto|always|never"
    )]
    color: ColorMode,
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

struct GlobalOptions {
    store: Option<PathBuf>,
    remote: Option<String>,
    limit: u64,
    timeout: Duration,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Show one page of workouts")]
    List {
        #[arg(long, default_value_t = 1)]
        page: u64,
        #[arg(long, help = "Emit the page as JSON")]
        json: bool,
    },
    #[command(about = "Log a new workout")]
    Add {
        #[command(flatten)]
        workout: WorkoutArgs,
        #[arg(long, help = "Emit the created record as JSON")]
        json: bool,
    },
    #[command(about = "Replace fields of an existing workout")]
    Edit {
        id: u64,
        #[command(flatten)]
        changes: WorkoutChanges,
        #[arg(long, help = "Emit the updated record as JSON")]
        json: bool,
    },
    #[command(about = "Delete a workout permanently")]
    Delete {
        id: u64,
        #[arg(long, default_value_t = 1, help = "Page being viewed when deleting")]
        page: u64,
        #[arg(long, help = "Emit the re-fetched page as JSON")]
        json: bool,
    },
    #[command(about = "Show total workouts and average weight")]
    Stats {
        #[arg(long, help = "Emit stats as JSON")]
        json: bool,
    },
    #[command(about = "Run the HTTP service over the local store")]
    Serve(ServeArgs),
    #[command(about = "Generate shell completions")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
struct WorkoutArgs {
    #[arg(long, help = "Workout date, YYYY-MM-DD (default: today, UTC)")]
    date: Option<String>,
    #[arg(long)]
    exercise: String,
    #[arg(long, allow_hyphen_values = true)]
    sets: i64,
    #[arg(long, allow_hyphen_values = true)]
    reps: i64,
    #[arg(long, allow_hyphen_values = true)]
    weight: f64,
}

impl WorkoutArgs {
    fn into_draft(self) -> Result<WorkoutDraft, Error> {
        let date = match self.date {
            Some(date) => date,
            None => today()?,
        };
        Ok(WorkoutDraft::new(
            date,
            self.exercise,
            self.sets,
            self.reps,
            self.weight,
        ))
    }
}

#[derive(Args)]
struct WorkoutChanges {
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    exercise: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    sets: Option<i64>,
    #[arg(long, allow_hyphen_values = true)]
    reps: Option<i64>,
    #[arg(long, allow_hyphen_values = true)]
    weight: Option<f64>,
}

impl WorkoutChanges {
    fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.exercise.is_none()
            && self.sets.is_none()
            && self.reps.is_none()
            && self.weight.is_none()
    }

    fn apply(self, mut draft: WorkoutDraft) -> WorkoutDraft {
        if let Some(date) = self.date {
            draft.date = date;
        }
        if let Some(exercise) = self.exercise {
            draft.exercise = exercise;
        }
        if let Some(sets) = self.sets {
            draft.sets = sets;
        }
        if let Some(reps) = self.reps {
            draft.reps = reps;
        }
        if let Some(weight) = self.weight {
            draft.weight = weight;
        }
        draft
    }
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long, default_value = serve::DEFAULT_BIND, help = "Bind address")]
    bind: String,
    #[arg(
        long = "cors-origin",
        value_name = "ORIGIN",
        help = "Allow browser requests from this origin (repeatable; `*` allows any)"
    )]
    cors_origin: Vec<String>,
    #[arg(long, help = "Allow non-loopback binds")]
    allow_non_loopback: bool,
    #[arg(long, default_value_t = serve::DEFAULT_MAX_LIMIT, help = "Largest accepted page size")]
    max_limit: u64,
    #[arg(long, default_value_t = serve::DEFAULT_MAX_BODY_BYTES, help = "Max request body size in bytes")]
    max_body_bytes: u64,
}

fn today() -> Result<String, Error> {
    OffsetDateTime::now_utc()
        .date()
        .format(format_description!("[year]-[month]-[day]"))
        .map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to format today's date")
                .with_source(err)
        })
}

fn resolve_backend_config(options: &GlobalOptions) -> Result<BackendConfig, Error> {
    match (&options.remote, &options.store) {
        (Some(_), Some(_)) => Err(Error::new(ErrorKind::Usage)
            .with_message("--remote and --store cannot be combined")
            .with_hint("Pick the local store or the remote service, not both.")),
        (Some(base_url), None) => Ok(BackendConfig::Remote {
            base_url: base_url.clone(),
            timeout: options.timeout,
        }),
        (None, store) => Ok(BackendConfig::Local {
            path: store.clone().unwrap_or_else(default_store_path),
        }),
    }
}

fn init_client_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.to_string();
    rendered
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.trim_start_matches("error:").trim().to_string())
        .unwrap_or_else(|| "invalid arguments".to_string())
}

fn emit_json(value: Value) {
    let json = if io::stdout().is_terminal() {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::Invalid => "invalid workout".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::Permission => "permission denied".to_string(),
        ErrorKind::Busy => "resource is busy".to_string(),
        ErrorKind::Corrupt => "corrupt data".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
        ErrorKind::Network => "could not reach backend".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(err.kind().as_str()));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(id) = err.id() {
        inner.insert("id".to_string(), json!(id));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));
    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(path) = err.path() {
        lines.push(format!(
            "{} {}",
            colorize_label("path:", use_color, AnsiColor::Yellow),
            path.display()
        ));
    }
    if let Some(id) = err.id() {
        lines.push(format!(
            "{} {id}",
            colorize_label("id:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(cause) = error_causes(err).first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("cause:", use_color, AnsiColor::Yellow)
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::{
        BackendConfig, Cli, GlobalOptions, WorkoutChanges, error_json, error_text,
        resolve_backend_config,
    };
    use clap::{CommandFactory, Parser};
    use liftlog::api::{Error, ErrorKind, WorkoutDraft};
    use std::path::PathBuf;
    use std::time::Duration;

    fn options(store: Option<&str>, remote: Option<&str>) -> GlobalOptions {
        GlobalOptions {
            store: store.map(PathBuf::from),
            remote: remote.map(str::to_string),
            limit: 10,
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn negative_numbers_parse_as_values() {
        let cli = Cli::try_parse_from([
            "liftlog", "add", "--exercise", "Squat", "--sets", "3", "--reps", "5", "--weight",
            "-1",
        ])
        .expect("parse");
        assert!(matches!(cli.command, super::Command::Add { .. }));
    }

    #[test]
    fn backend_selection_prefers_explicit_flags() {
        let local = resolve_backend_config(&options(Some("/tmp/w.json"), None)).expect("local");
        assert_eq!(
            local,
            BackendConfig::Local {
                path: PathBuf::from("/tmp/w.json")
            }
        );

        let remote =
            resolve_backend_config(&options(None, Some("http://127.0.0.1:5000"))).expect("remote");
        assert_eq!(
            remote,
            BackendConfig::Remote {
                base_url: "http://127.0.0.1:5000".to_string(),
                timeout: Duration::from_secs(5),
            }
        );

        let err = resolve_backend_config(&options(Some("/tmp/w.json"), Some("http://x")))
            .expect_err("both");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn changes_override_only_given_fields() {
        let changes = WorkoutChanges {
            date: None,
            exercise: None,
            sets: None,
            reps: Some(12),
            weight: Some(150.0),
        };
        assert!(!changes.is_empty());
        let draft = changes.apply(WorkoutDraft::new("2026-01-01", "Squat", 3, 5, 135.0));
        assert_eq!(draft, WorkoutDraft::new("2026-01-01", "Squat", 3, 12, 150.0));
    }

    #[test]
    fn error_text_respects_color_flag() {
        let err = Error::new(ErrorKind::Invalid).with_message("sets must be between 1 and 20");
        let colored = error_text(&err, true);
        let plain = error_text(&err, false);
        assert!(colored.contains("\u{1b}[31merror:\u{1b}[0m"));
        assert!(plain.starts_with("error: sets must be between 1 and 20"));
        assert!(!plain.contains("\u{1b}["));
    }

    #[test]
    fn error_without_message_uses_kind_fallback() {
        let value = error_json(&Error::new(ErrorKind::Busy));
        assert_eq!(value["error"]["message"], "resource is busy");
        let text = error_text(&Error::new(ErrorKind::Io), false);
        assert_eq!(text, "error: i/o error");
    }

    #[test]
    fn error_json_carries_kind_and_id() {
        let err = Error::new(ErrorKind::NotFound)
            .with_message("not found")
            .with_id(7);
        let value = error_json(&err);
        assert_eq!(value["error"]["kind"], "NotFound");
        assert_eq!(value["error"]["id"], 7);
        assert!(value["error"].get("hint").is_none());
    }
}
