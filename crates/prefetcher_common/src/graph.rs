use std::hash::BuildHasherDefault;

use arcstr::ArcStr;
use indexmap::IndexMap;
use rustc_hash::{FxHashSet, FxHasher};
use serde_json::Value;

pub type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// Dependency graph of one base, keyed by bundle filename.
///
/// The wire format is a flat array where each entry is either a filename or
/// a numeric back-reference: the run of numbers following a filename holds
/// the indices of that file's direct dependencies, resolved against the same
/// array. The flat shape is folded into an adjacency list at ingestion and
/// not retained.
#[derive(Debug, Default, Clone)]
pub struct BundleGraph {
  edges: FxIndexMap<ArcStr, Vec<ArcStr>>,
}

/// Resolve a back-reference. A reference landing on another numeric entry
/// scans forward until a filename is found; running off the end of the
/// array resolves to nothing.
fn resolve_reference(entries: &[Value], index: usize) -> Option<&str> {
  let mut cursor = index;
  while let Some(entry) = entries.get(cursor) {
    match entry {
      Value::String(name) => return Some(name),
      Value::Number(_) => cursor += 1,
      _ => return None,
    }
  }
  None
}

impl BundleGraph {
  pub fn new() -> Self {
    Self::default()
  }

  /// Ingest a wire-format graph. Out-of-range back-references are skipped,
  /// not errors.
  pub fn from_wire(entries: &[Value]) -> Self {
    let mut graph = Self::default();
    let mut current: Option<ArcStr> = None;

    for entry in entries {
      match entry {
        Value::String(name) => {
          let name = ArcStr::from(name.as_str());
          graph.edges.entry(name.clone()).or_default();
          current = Some(name);
        }
        Value::Number(index) => {
          let Some(owner) = &current else { continue };
          let dep = index
            .as_u64()
            .and_then(|index| resolve_reference(entries, usize::try_from(index).ok()?));
          if let Some(dep) = dep {
            graph.edges[owner].push(ArcStr::from(dep));
          }
        }
        _ => {}
      }
    }

    graph
  }

  /// Register `name` with no dependencies, keeping existing edges if the
  /// file is already present.
  pub fn insert(&mut self, name: impl Into<ArcStr>) {
    self.edges.entry(name.into()).or_default();
  }

  pub fn contains(&self, name: &str) -> bool {
    self.edges.contains_key(name)
  }

  pub fn is_empty(&self) -> bool {
    self.edges.is_empty()
  }

  /// Filenames in wire order.
  pub fn filenames(&self) -> impl Iterator<Item = &ArcStr> {
    self.edges.keys()
  }

  /// Transitive closure of `name`: the file itself plus all direct and
  /// indirect dependencies, deduplicated. A filename not present in the
  /// graph yields only itself.
  pub fn dependencies_of(&self, name: &str) -> Vec<ArcStr> {
    let mut visited = FxHashSet::default();
    let mut closure = Vec::new();
    self.visit(&ArcStr::from(name), &mut visited, &mut closure);
    closure
  }

  fn visit(&self, name: &ArcStr, visited: &mut FxHashSet<ArcStr>, closure: &mut Vec<ArcStr>) {
    if !visited.insert(name.clone()) {
      return;
    }
    closure.push(name.clone());
    if let Some(deps) = self.edges.get(name) {
      for dep in deps {
        self.visit(dep, visited, closure);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::BundleGraph;

  fn wire(value: serde_json::Value) -> BundleGraph {
    BundleGraph::from_wire(value.as_array().unwrap())
  }

  #[test]
  fn closure_follows_back_references() {
    // The reference lands on a numeric entry and scans forward to "b.js".
    let graph = wire(json!(["a.js", 1, "b.js"]));
    assert_eq!(graph.dependencies_of("a.js"), ["a.js", "b.js"]);
  }

  #[test]
  fn closure_is_transitive() {
    // a -> b -> c
    let graph = wire(json!(["a.js", 2, "b.js", 4, "c.js"]));
    assert_eq!(graph.dependencies_of("a.js"), ["a.js", "b.js", "c.js"]);
    assert_eq!(graph.dependencies_of("b.js"), ["b.js", "c.js"]);
  }

  #[test]
  fn closure_terminates_on_cycles() {
    // a -> b -> a
    let graph = wire(json!(["a.js", 2, "b.js", 0]));
    assert_eq!(graph.dependencies_of("a.js"), ["a.js", "b.js"]);
    assert_eq!(graph.dependencies_of("b.js"), ["b.js", "a.js"]);
  }

  #[test]
  fn unknown_filename_yields_only_itself() {
    let graph = wire(json!(["a.js"]));
    assert_eq!(graph.dependencies_of("missing.js"), ["missing.js"]);
  }

  #[test]
  fn out_of_range_references_are_skipped() {
    let graph = wire(json!(["a.js", 99]));
    assert_eq!(graph.dependencies_of("a.js"), ["a.js"]);
  }

  #[test]
  fn filenames_keep_wire_order() {
    let graph = wire(json!(["b.js", "a.js", 0, "c.js"]));
    let names = graph.filenames().map(|name| name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, ["b.js", "a.js", "c.js"]);
  }

  #[test]
  fn shared_dependency_appears_once() {
    // a -> b, a -> c, b -> c
    let graph = wire(json!(["a.js", 3, 5, "b.js", 5, "c.js"]));
    assert_eq!(graph.dependencies_of("a.js"), ["a.js", "b.js", "c.js"]);
    assert_eq!(graph.dependencies_of("b.js"), ["b.js", "c.js"]);
  }
}
