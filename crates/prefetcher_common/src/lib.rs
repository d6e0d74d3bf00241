mod base;
mod deferred;
mod graph;
mod message;
mod options;
mod response;

pub use crate::{
  base::BasePath,
  deferred::Deferred,
  graph::{BundleGraph, FxIndexMap},
  message::ControlMessage,
  options::{SchedulerOptions, BASELINE_PRIORITY, DIRECT_PRIORITY},
  response::FetchResponse,
};
