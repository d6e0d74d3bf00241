use anyhow::anyhow;
use arcstr::ArcStr;
use serde_json::Value;

use crate::base::BasePath;

/// Control messages accepted by the scheduler.
///
/// Wire form is a tagged array `[type, ...args]`; each variant maps to one
/// message kind so dispatch is an exhaustive match instead of chained tag
/// comparisons.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlMessage {
  /// Replace the graph of `base` with the given wire entries.
  Graph { base: BasePath, entries: Vec<Value> },
  /// Fetch the graph manifest under `base` and install its content.
  GraphUrl { base: BasePath, manifest_path: ArcStr },
  /// Prefetch the named bundles (and their dependencies) at baseline priority.
  Prefetch { base: BasePath, names: Vec<ArcStr> },
  /// Prefetch every bundle known to `base`.
  PrefetchAll { base: BasePath },
  /// Liveness probe; logged unconditionally.
  Ping,
  /// Enable verbose diagnostics for all subsequent operations.
  Verbose,
}

fn base_arg(items: &[Value], tag: &str) -> anyhow::Result<BasePath> {
  items
    .get(1)
    .and_then(Value::as_str)
    .map(BasePath::from)
    .ok_or_else(|| anyhow!("`{tag}` message is missing its base path"))
}

fn name_args(items: &[Value], tag: &str) -> anyhow::Result<Vec<ArcStr>> {
  items[2..]
    .iter()
    .map(|item| {
      item
        .as_str()
        .map(ArcStr::from)
        .ok_or_else(|| anyhow!("`{tag}` message has a non-string filename: {item}"))
    })
    .collect()
}

impl ControlMessage {
  pub fn from_json(text: &str) -> anyhow::Result<Self> {
    let value = serde_json::from_str(text)?;
    Self::from_value(&value)
  }

  pub fn from_value(value: &Value) -> anyhow::Result<Self> {
    let items = value.as_array().ok_or_else(|| anyhow!("message is not an array: {value}"))?;
    let tag = items
      .first()
      .and_then(Value::as_str)
      .ok_or_else(|| anyhow!("message is missing its type tag: {value}"))?;

    let message = match tag {
      "graph" => {
        Self::Graph { base: base_arg(items, tag)?, entries: items[2..].to_vec() }
      }
      "graph-url" => {
        let manifest_path = items
          .get(2)
          .and_then(Value::as_str)
          .map(ArcStr::from)
          .ok_or_else(|| anyhow!("`graph-url` message is missing its manifest path"))?;
        Self::GraphUrl { base: base_arg(items, tag)?, manifest_path }
      }
      "prefetch" => Self::Prefetch { base: base_arg(items, tag)?, names: name_args(items, tag)? },
      "prefetch-all" => Self::PrefetchAll { base: base_arg(items, tag)? },
      "ping" => Self::Ping,
      "verbose" => Self::Verbose,
      _ => return Err(anyhow!("unknown message type `{tag}`")),
    };

    Ok(message)
  }
}
