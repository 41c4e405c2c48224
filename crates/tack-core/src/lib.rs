pub mod category;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod render;
pub mod store;
pub mod task;
pub mod view;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use crate::category::{
  Category,
  CategoryFilter
};
pub use crate::error::{
  ErrorKind,
  StoreError
};
pub use crate::store::TaskStore;
pub use crate::task::{
  Task,
  TaskId
};
pub use crate::view::View;

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
    "starting tack"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.tackrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let data_file =
    config::resolve_data_file(
      &cfg,
      cli.file.as_deref()
    )
    .context(
      "failed to resolve task file"
    )?;

  let mut store =
    store::TaskStore::open(&data_file)
      .with_context(|| {
        format!(
          "failed to open task file \
           {}",
          data_file.display()
        )
      })?;

  let mut renderer =
    render::Renderer::new(&cfg)?;
  let inv = cli::Invocation::parse(
    &cfg, cli.rest
  )?;

  commands::dispatch(
    &mut store,
    &cfg,
    &mut renderer,
    inv
  )?;

  info!("done");
  Ok(())
}
