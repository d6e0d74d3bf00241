mod args;

use std::sync::Arc;
use std::time::Instant;

use ansi_term::Colour;
use args::{RunArgs, SourceArgs};
use arcstr::ArcStr;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use prefetcher::{
  BasePath, ControlMessage, FsFetcher, MemoryCache, PrefetchResult, PrefetchWorker, ResponseCache,
  SchedulerOptions,
};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Commands {
  #[clap(flatten)]
  source: SourceArgs,

  #[clap(flatten)]
  run: RunArgs,
}

fn print_cached_bundles(cache: &MemoryCache) {
  let mut left = 0;
  let mut right = 0;

  let mut keys = cache.keys();
  keys.sort_unstable();

  let mut bundles = Vec::with_capacity(keys.len());

  for url in keys {
    let Some(response) = cache.lookup(&url) else { continue };
    let size = format!("{:.2}", response.body.len() as f64 / 1024.0);

    if size.len() > right {
      right = size.len();
    }

    if url.len() > left {
      left = url.len();
    }

    bundles.push((url, size));
  }

  let dim = Colour::White.dimmed();
  let color = Colour::Cyan;

  for (url, size) in bundles {
    let url_len = url.len();

    println!(
      "{}{:left$} {}{:right$}{} kB",
      color.paint(url),
      "",
      dim.paint("size: "),
      "",
      size,
      left = left - url_len,
      right = right - size.len()
    );
  }
}

async fn warm(worker: &PrefetchWorker, source: &SourceArgs, run: &RunArgs) -> PrefetchResult<()> {
  let mut base = source.base.clone();
  if !base.ends_with('/') {
    base.push('/');
  }
  let base = BasePath::new(base);

  if run.verbose {
    worker.post(ControlMessage::Verbose).await?;
  }

  worker
    .post(ControlMessage::GraphUrl { base: base.clone(), manifest_path: source.graph.as_str().into() })
    .await?;

  if run.all {
    worker.post(ControlMessage::PrefetchAll { base }).await?;
  } else {
    let names = run.entries.iter().map(|name| ArcStr::from(name.as_str())).collect();
    worker.post(ControlMessage::Prefetch { base, names }).await?;
  }

  worker.idle().await;
  Ok(())
}

#[tokio::main]
async fn main() {
  let commands = Commands::parse();

  let filter = if commands.run.verbose { "debug" } else { "info" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
    .init();

  let fetcher = Arc::new(FsFetcher::new(&commands.source.dir));
  let cache = Arc::new(MemoryCache::new());
  let worker = PrefetchWorker::new(
    SchedulerOptions { concurrency: commands.run.concurrency },
    fetcher,
    Arc::<MemoryCache>::clone(&cache),
  );

  let start = Instant::now();
  match warm(&worker, &commands.source, &commands.run).await {
    Ok(()) => {
      if !commands.run.silent && !cache.is_empty() {
        print_cached_bundles(&cache);
      }

      let warmed = cache.len();
      let elapsed = format!("{:.2} ms", start.elapsed().as_secs_f64() * 1000.0);
      println!(
        "\n{} Warmed {} bundles in {}",
        Colour::Green.paint("✔"),
        Colour::White.bold().paint(warmed.to_string()),
        Colour::White.bold().paint(elapsed)
      );
    }
    Err(errors) => {
      for error in &*errors {
        println!("{} {}", Colour::Red.paint("Error:"), error);
      }
    }
  }

  worker.close().await;
}
