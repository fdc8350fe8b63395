pub mod app;
pub mod cli;
pub mod config;
pub mod filter;
pub mod item;
pub mod render;
pub mod session;
pub mod source;
pub mod store;
pub mod view;

use std::ffi::OsString;
use std::io;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info,
  warn
};

use crate::app::{
  FetchOutcome,
  TodoApp
};
use crate::source::ItemSource;
use crate::store::IdGenerator;

/// Exit status after Ctrl-C, as a
/// shell reports SIGINT.
pub const EXIT_INTERRUPTED: i32 = 130;

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting tasklens"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.rc_file.as_deref()
  )?;
  let source_overrides =
    cli.source_overrides();
  cfg.apply_overrides(
    pre
      .rc_overrides
      .into_iter()
      .chain(
        cli
          .rc_overrides
          .into_iter()
          .map(|kv| (kv.key, kv.value))
      )
      .chain(source_overrides)
  );

  let source =
    source::Source::from_config(&cfg)
      .context(
        "failed to configure item \
         source"
      )?;
  let renderer =
    render::Renderer::new(&cfg)?;

  let runtime =
    tokio::runtime::Builder::new_multi_thread()
      .worker_threads(1)
      .enable_all()
      .build()
      .context(
        "failed to start async \
         runtime"
      )?;

  let mut app = TodoApp::new();
  let outcome = runtime.block_on(
    load_initial(&mut app, &source)
  );
  debug!(?outcome, "initial load finished");

  // The fetch installed a SIGINT
  // handler; keep Ctrl-C fatal while
  // the session blocks on stdin.
  runtime.spawn(watch_interrupt(
    interrupted(),
    || {
      warn!("interrupted; exiting");
      std::process::exit(
        EXIT_INTERRUPTED
      )
    }
  ));

  let tokens: Vec<String> = cli
    .rest
    .iter()
    .map(|arg| {
      arg.to_string_lossy().to_string()
    })
    .collect();

  if tokens.is_empty() {
    session::run_interactive(
      &mut app,
      &renderer,
      io::stdin().lock(),
      io::stdout().lock()
    )?;
  } else {
    session::run_once(
      &mut app,
      &renderer,
      &tokens,
      io::stdout().lock()
    )?;
  }

  info!("done");
  Ok(())
}

/// Fetches the initial collection into
/// `app`. Ctrl-C before the fetch
/// resolves supersedes it and the
/// result is dropped. Never fails; a
/// fetch error leaves the collection
/// empty.
pub async fn load_initial<G, S>(
  app: &mut TodoApp<G>,
  source: &S
) -> FetchOutcome
where
  G: IdGenerator,
  S: ItemSource
{
  load_initial_until(
    app,
    source,
    interrupted()
  )
  .await
}

/// As [`load_initial`], with the
/// interrupt supplied by the caller.
pub async fn load_initial_until<G, S, I>(
  app: &mut TodoApp<G>,
  source: &S,
  interrupt: I
) -> FetchOutcome
where
  G: IdGenerator,
  S: ItemSource,
  I: Future<Output = ()>
{
  let ticket = app.begin_fetch();
  tokio::select! {
    result = source.fetch() => {
      app.complete_fetch(ticket, result)
    }
    _ = interrupt => {
      app.supersede_fetch();
      FetchOutcome::Discarded
    }
  }
}

/// Waits for `interrupt`, then runs
/// `on_interrupt`.
pub async fn watch_interrupt<I, F>(
  interrupt: I,
  on_interrupt: F
) where
  I: Future<Output = ()>,
  F: FnOnce()
{
  interrupt.await;
  on_interrupt();
}

async fn interrupted() {
  if let Err(err) =
    tokio::signal::ctrl_c().await
  {
    warn!(error = %err, "cannot listen for ctrl-c");
    std::future::pending::<()>().await;
  }
}
