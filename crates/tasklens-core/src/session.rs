use std::io::{BufRead, Write};

use anyhow::{Context, anyhow};
use tracing::{debug, info, instrument, warn};

use crate::app::TodoApp;
use crate::filter::Filter;
use crate::render::Renderer;
use crate::store::IdGenerator;

const HELP: &str = "\
commands:
  list                              redraw the current page
  next | prev                       move one page forward or back
  filter <all|completed|pending>    change the filter (returns to page 1)
  add [--done|--pending] <title>    add an item at the top of the list
  done <id>                         mark an item completed
  delete <id>                       remove an item
  help                              show this text
  quit                              leave the session";

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "list", "next", "prev", "filter", "add", "done", "delete", "help", "quit",
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

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Next,
    Prev,
    Filter(Filter),
    Add { title: String, completed: bool },
    Done(String),
    Delete(String),
    Help,
    Quit,
}

impl Command {
    /// Parses one session line. Blank lines yield `None`.
    pub fn parse_line(line: &str) -> anyhow::Result<Option<Self>> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        Self::parse_tokens(&tokens)
    }

    pub fn parse_tokens(tokens: &[&str]) -> anyhow::Result<Option<Self>> {
        let Some((head, args)) = tokens.split_first() else {
            return Ok(None);
        };

        let known = known_command_names();
        let lowered = head.to_ascii_lowercase();
        let name = expand_command_abbrev(&lowered, &known)
            .ok_or_else(|| anyhow!("unknown or ambiguous command: {head}"))?;

        let cmd = match name {
            "list" => Self::List,
            "next" => Self::Next,
            "prev" => Self::Prev,
            "help" => Self::Help,
            "quit" => Self::Quit,
            "filter" => {
                let [value] = args else {
                    return Err(anyhow!("filter takes exactly one of: all, completed, pending"));
                };
                Self::Filter(value.parse()?)
            }
            "add" => parse_add(args),
            "done" => Self::Done(single_id(name, args)?),
            "delete" => Self::Delete(single_id(name, args)?),
            other => return Err(anyhow!("unhandled command: {other}")),
        };

        debug!(command = ?cmd, "parsed session command");
        Ok(Some(cmd))
    }
}

fn parse_add(args: &[&str]) -> Command {
    let mut completed = false;
    let mut words = Vec::with_capacity(args.len());
    for arg in args {
        match *arg {
            "--done" | "--completed" => completed = true,
            "--pending" => completed = false,
            word => words.push(word),
        }
    }

    Command::Add {
        title: words.join(" "),
        completed,
    }
}

fn single_id(command: &str, args: &[&str]) -> anyhow::Result<String> {
    match args {
        [id] => Ok((*id).to_string()),
        _ => Err(anyhow!("{command} takes exactly one item id")),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Render,
    Message(&'static str),
    Quit,
}

/// Applies one command to the controller. Unknown ids, blank titles and
/// out-of-range navigation are no-ops that still redraw.
#[instrument(skip(app))]
pub fn execute<G: IdGenerator>(app: &mut TodoApp<G>, cmd: Command) -> Outcome {
    match cmd {
        Command::List => {}
        Command::Next => {
            app.advance();
        }
        Command::Prev => {
            app.retreat();
        }
        Command::Filter(filter) => app.set_filter(filter),
        Command::Add { title, completed } => {
            if let Some(id) = app.insert(&title, completed) {
                info!(id = %id, completed, "added item");
            }
        }
        Command::Done(token) => match app.resolve_id(&token) {
            Some(id) => {
                app.mark_completed(&id);
            }
            None => debug!(token = %token, "done: no such item"),
        },
        Command::Delete(token) => match app.resolve_id(&token) {
            Some(id) => {
                app.remove(&id);
            }
            None => debug!(token = %token, "delete: no such item"),
        },
        Command::Help => return Outcome::Message(HELP),
        Command::Quit => return Outcome::Quit,
    }
    Outcome::Render
}

/// Runs commands from `input` until `quit` or end of input, redrawing after
/// each one. Bad command lines are reported and the session continues.
#[instrument(skip_all)]
pub fn run_interactive<G, R, W>(
    app: &mut TodoApp<G>,
    renderer: &Renderer,
    input: R,
    mut out: W,
) -> anyhow::Result<()>
where
    G: IdGenerator,
    R: BufRead,
    W: Write,
{
    renderer.render(&mut out, &app.snapshot())?;
    write!(out, "> ")?;
    out.flush()?;

    for line in input.lines() {
        let line = line.context("failed reading session input")?;
        match Command::parse_line(&line) {
            Ok(None) => {}
            Ok(Some(cmd)) => match execute(app, cmd) {
                Outcome::Quit => {
                    info!("session ended by user");
                    return Ok(());
                }
                Outcome::Message(text) => renderer.render_message(&mut out, text)?,
                Outcome::Render => renderer.render(&mut out, &app.snapshot())?,
            },
            Err(err) => {
                warn!(line = %line, error = %err, "rejected session command");
                renderer.render_message(&mut out, &format!("{err}"))?;
            }
        }
        write!(out, "> ")?;
        out.flush()?;
    }

    writeln!(out)?;
    info!("session input closed");
    Ok(())
}

/// One-shot mode: runs a single command given on the command line and draws
/// the result.
#[instrument(skip(app, renderer, out))]
pub fn run_once<G, W>(
    app: &mut TodoApp<G>,
    renderer: &Renderer,
    tokens: &[String],
    mut out: W,
) -> anyhow::Result<()>
where
    G: IdGenerator,
    W: Write,
{
    let borrowed: Vec<&str> = tokens.iter().map(String::as_str).collect();
    let Some(cmd) = Command::parse_tokens(&borrowed)? else {
        return renderer.render(&mut out, &app.snapshot());
    };

    match execute(app, cmd) {
        Outcome::Message(text) => renderer.render_message(&mut out, text),
        Outcome::Render | Outcome::Quit => renderer.render(&mut out, &app.snapshot()),
    }
}
