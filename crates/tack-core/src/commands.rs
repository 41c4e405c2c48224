use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Context, anyhow};
use tracing::{debug, info, instrument, warn};

use crate::category::{Category, CategoryFilter};
use crate::cli::Invocation;
use crate::config::Config;
use crate::error::StoreError;
use crate::render::Renderer;
use crate::store::TaskStore;
use crate::task::Task;

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "add",
        "list",
        "done",
        "delete",
        "export",
        "categories",
        "shell",
        "_commands",
        "_show",
        "help",
        "version",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(store, cfg, renderer, inv))]
pub fn dispatch(
    store: &mut TaskStore,
    cfg: &Config,
    renderer: &mut Renderer,
    inv: Invocation,
) -> anyhow::Result<()> {
    let command = inv.command.as_str();

    debug!(
        command,
        filter = %inv.filter,
        args = ?inv.command_args,
        "dispatching command"
    );

    match command {
        "add" => cmd_add(store, cfg, inv.filter, &inv.command_args),
        "list" => cmd_list(store, renderer, inv.filter),
        "done" => cmd_done(store, inv.filter, &inv.command_args),
        "delete" => cmd_delete(store, inv.filter, &inv.command_args),
        "export" => cmd_export(store, inv.filter),
        "categories" => renderer.print_categories(store.tasks()),
        "shell" => cmd_shell(store, cfg, renderer),
        "_commands" => cmd_commands(),
        "_show" => cmd_show(cfg),
        "help" => cmd_help(),
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

#[instrument(skip(store, cfg, args))]
fn cmd_add(
    store: &mut TaskStore,
    cfg: &Config,
    filter: CategoryFilter,
    args: &[String],
) -> anyhow::Result<()> {
    info!("command add");

    let (text, explicit) = parse_text_and_category(args)?;
    let category = match (explicit, filter) {
        (Some(cat), _) => cat,
        (None, CategoryFilter::Only(cat)) => cat,
        (None, CategoryFilter::All) => cfg.default_category()?,
    };

    let id = store.add(&text, category)?;
    persist(store)?;

    debug!(%id, count = store.len(), "task added");
    println!("Added task to {category}.");
    Ok(())
}

#[instrument(skip(store, renderer))]
fn cmd_list(store: &TaskStore, renderer: &Renderer, filter: CategoryFilter) -> anyhow::Result<()> {
    info!("command list");
    renderer.print_view(&store.filter(filter))
}

#[instrument(skip(store, args))]
fn cmd_done(store: &mut TaskStore, filter: CategoryFilter, args: &[String]) -> anyhow::Result<()> {
    info!("command done");

    let shown = parse_position(args)?;
    let completed = store
        .toggle_complete_at(filter, shown - 1)
        .map_err(|err| selection_error(err, shown, filter))?;
    persist(store)?;

    if completed {
        println!("Completed task {shown}.");
    } else {
        println!("Reopened task {shown}.");
    }
    Ok(())
}

#[instrument(skip(store, args))]
fn cmd_delete(store: &mut TaskStore, filter: CategoryFilter, args: &[String]) -> anyhow::Result<()> {
    info!("command delete");

    let shown = parse_position(args)?;
    let removed = store
        .delete_at(filter, shown - 1)
        .map_err(|err| selection_error(err, shown, filter))?;
    persist(store)?;

    println!("Deleted task {shown}: {}", removed.text);
    Ok(())
}

#[instrument(skip(store))]
fn cmd_export(store: &TaskStore, filter: CategoryFilter) -> anyhow::Result<()> {
    info!("command export");

    let tasks: Vec<&Task> = store.filter(filter).iter().collect();
    let json = serde_json::to_string_pretty(&tasks).context("failed to serialize tasks")?;
    println!("{json}");
    Ok(())
}

#[instrument(skip(store, cfg, renderer))]
fn cmd_shell(store: &mut TaskStore, cfg: &Config, renderer: &mut Renderer) -> anyhow::Result<()> {
    info!("command shell");

    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    let failed = run_shell(store, cfg, renderer, stdin.lock(), io::stderr(), interactive)?;

    info!(count = store.len(), failed, "shell session ended");
    Ok(())
}

/// Runs one command per input line against a single store. Failures are
/// written to `out` as warnings and the session carries on with the
/// in-memory state. Returns how many lines failed.
pub fn run_shell<R: BufRead, W: Write>(
    store: &mut TaskStore,
    cfg: &Config,
    renderer: &mut Renderer,
    mut input: R,
    mut out: W,
    prompt: bool,
) -> anyhow::Result<usize> {
    let mut raw = Vec::new();
    let mut failed = 0;

    loop {
        if prompt {
            write!(out, "tack> ")?;
            out.flush()?;
        }

        raw.clear();
        if input.read_until(b'\n', &mut raw)? == 0 {
            break;
        }

        let line = String::from_utf8_lossy(&raw);
        let tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        match tokens.first().map(String::as_str) {
            None => continue,
            Some("quit" | "exit") => break,
            Some(_) => {}
        }

        let result = Invocation::from_tokens(cfg, tokens).and_then(|inv| {
            if inv.command == "shell" {
                return Err(anyhow!("already in a shell session"));
            }
            dispatch(store, cfg, renderer, inv)
        });

        if let Err(err) = result {
            failed += 1;
            let kind = err.downcast_ref::<StoreError>().map(StoreError::kind);
            warn!(?kind, error = %format!("{err:#}"), "command failed");
            writeln!(out, "warning: {err:#}")?;
        }
    }

    Ok(failed)
}

fn cmd_commands() -> anyhow::Result<()> {
    for command in known_command_names() {
        println!("{command}");
    }
    Ok(())
}

fn cmd_show(cfg: &Config) -> anyhow::Result<()> {
    let mut entries: Vec<_> = cfg.iter().collect();
    entries.sort();
    for (k, v) in entries {
        println!("{k}={v}");
    }
    Ok(())
}

fn cmd_help() -> anyhow::Result<()> {
    println!("usage: tack [options] [all|general|work|study|personal] <command> [args]");
    println!();
    println!("  add <text> [category:<name>]  add a task");
    println!("  list                          show tasks with their positions");
    println!("  done <position>               toggle completion of a listed task");
    println!("  delete <position>             delete a listed task");
    println!("  export                        print tasks as JSON");
    println!("  categories                    open/done counts per category");
    println!("  shell                         read commands from stdin");
    println!();
    println!("Positions refer to the list shown for the same filter.");
    Ok(())
}

fn persist(store: &TaskStore) -> anyhow::Result<()> {
    store.save().with_context(|| {
        format!(
            "change applied in memory but not saved to {}",
            store.path().display()
        )
    })
}

fn parse_text_and_category(args: &[String]) -> anyhow::Result<(String, Option<Category>)> {
    let mut words = Vec::with_capacity(args.len());
    let mut category = None;

    for arg in args {
        let value = arg
            .strip_prefix("category:")
            .or_else(|| arg.strip_prefix("cat:"));
        match value {
            Some(raw) => category = Some(raw.parse::<Category>()?),
            None => words.push(arg.as_str()),
        }
    }

    Ok((words.join(" "), category))
}

/// Reads the one-based position printed by `list`.
fn parse_position(args: &[String]) -> anyhow::Result<usize> {
    let raw = match args {
        [] => return Err(anyhow!("no task selected; pass a position from `list`")),
        [raw] => raw,
        [_, extra, ..] => return Err(anyhow!("expected a single position, also got: {extra}")),
    };

    let shown: usize = raw
        .parse()
        .with_context(|| format!("invalid position: {raw}"))?;
    if shown == 0 {
        return Err(anyhow!("positions start at 1"));
    }
    Ok(shown)
}

fn selection_error(err: StoreError, shown: usize, filter: CategoryFilter) -> anyhow::Error {
    match err {
        StoreError::OutOfRange { visible, .. } => {
            anyhow!("no task #{shown} in the {filter} list ({visible} shown)")
        }
        other => other.into(),
    }
}
