use std::path::PathBuf;

use clap::Args;

#[derive(Args)]
pub struct SourceArgs {
  /// Directory holding the built bundles.
  #[clap(long, short = 'd', default_value = ".")]
  pub dir: PathBuf,

  /// URL prefix the bundle graph is keyed under.
  #[clap(long, short = 'b', default_value = "/")]
  pub base: String,

  /// Bundle-graph manifest, relative to the base.
  #[clap(long, short = 'g', default_value = "q-bundle-graph.json")]
  pub graph: String,
}

#[derive(Args)]
pub struct RunArgs {
  /// Entry bundles to warm; their dependency closures come along.
  pub entries: Vec<String>,

  /// Warm every bundle the graph names.
  #[clap(long)]
  pub all: bool,

  /// Maximum number of concurrent fetches.
  #[clap(long, short = 'c', default_value_t = 10)]
  pub concurrency: usize,

  #[clap(long, short = 'v')]
  pub verbose: bool,

  #[clap(long)]
  pub silent: bool,
}
