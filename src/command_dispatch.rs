//! Purpose: Hold top-level CLI command dispatch for `liftlog`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Client commands act through one `Session` over the selected backend.
//! Invariants: After a mutation the affected page is re-fetched before printing.

use super::*;
use std::net::SocketAddr;

use liftlog::api::{Session, Stats};

pub(super) fn dispatch_command(
    command: Command,
    options: GlobalOptions,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "liftlog", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Serve(args) => {
            if options.remote.is_some() {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("serve cannot be combined with --remote")
                    .with_hint("The service always owns a local store; pass --store instead."));
            }
            let bind: SocketAddr = args.bind.parse().map_err(|_| {
                Error::new(ErrorKind::Usage)
                    .with_message("invalid bind address")
                    .with_hint("Use a host:port value like 127.0.0.1:5000.")
            })?;
            let config = serve::ServeConfig {
                bind,
                store_path: options.store.unwrap_or_else(default_store_path),
                cors_origins: args.cors_origin,
                allow_non_loopback: args.allow_non_loopback,
                max_limit: args.max_limit,
                max_body_bytes: args.max_body_bytes,
            };
            serve::validate_config(&config)?;
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("failed to start runtime")
                        .with_source(err)
                })?;
            runtime.block_on(serve::serve(config))?;
            Ok(RunOutcome::ok())
        }
        Command::List { page, json } => {
            let (mut backend, mut session) = connect(&options)?;
            session.fetch_page(backend.as_mut(), page)?;
            emit_page(&session, json);
            Ok(RunOutcome::ok())
        }
        Command::Add { workout, json } => {
            let (mut backend, mut session) = connect(&options)?;
            let draft = workout.into_draft()?;
            let saved = session.submit(backend.as_mut(), draft)?;
            if json {
                emit_json(record_json(&saved));
            } else {
                println!("Added workout {}.", saved.id);
            }
            Ok(RunOutcome::ok())
        }
        Command::Edit { id, changes, json } => {
            if changes.is_empty() {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("edit requires at least one field to change")
                    .with_hint("Pass one or more of --date, --exercise, --sets, --reps, --weight."));
            }
            let (mut backend, mut session) = connect(&options)?;
            session.find_record(backend.as_mut(), id)?;
            let prefill = session.begin_edit(id)?;
            let saved = session.submit(backend.as_mut(), changes.apply(prefill))?;
            if json {
                emit_json(record_json(&saved));
            } else {
                println!("Updated workout {}.", saved.id);
            }
            Ok(RunOutcome::ok())
        }
        Command::Delete { id, page, json } => {
            let (mut backend, mut session) = connect(&options)?;
            session.fetch_page(backend.as_mut(), page)?;
            session.delete(backend.as_mut(), id)?;
            if json {
                emit_page(&session, true);
            } else {
                println!("Deleted workout {id}.");
                emit_page(&session, false);
            }
            Ok(RunOutcome::ok())
        }
        Command::Stats { json } => {
            let (mut backend, session) = connect(&options)?;
            let stats = session.stats(backend.as_mut())?;
            if json {
                emit_json(stats_json(&stats));
            } else if io::stdout().is_terminal() {
                render::animate_stats(&stats, &mut io::stdout()).map_err(|err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write stats")
                        .with_source(err)
                })?;
            } else {
                for line in render::stats_lines(&stats, 1.0) {
                    println!("{line}");
                }
            }
            Ok(RunOutcome::ok())
        }
    }
}

fn connect(options: &GlobalOptions) -> Result<(Box<dyn liftlog::api::Backend>, Session), Error> {
    let config = resolve_backend_config(options)?;
    tracing::debug!(backend = %config.describe(), "connecting");
    let backend = config.connect()?;
    let session = Session::new(options.limit)?;
    Ok((backend, session))
}

fn emit_page(session: &Session, json: bool) {
    if json {
        let pager = session.pager();
        emit_json(json!({
            "records": session.records(),
            "total": session.total_records(),
            "page": session.current_page(),
            "limit": session.limit(),
            "totalPages": pager.max,
        }));
        return;
    }
    println!("{}", render::records_table(session.records()));
    println!("{}", render::pager_line(&session.pager()));
}

fn record_json(record: &liftlog::api::WorkoutRecord) -> Value {
    serde_json::to_value(record).unwrap_or_else(|_| json!({ "id": record.id }))
}

fn stats_json(stats: &Stats) -> Value {
    serde_json::to_value(stats).unwrap_or_else(|_| json!({ "total": stats.total }))
}
