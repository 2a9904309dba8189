//! Title normalization through an ordered pipeline of transform steps.
//!
//! The [`pipeline`] module is the core: steps, the audit sink contract, and
//! the runner. [`audit`] provides sinks, [`config`] the layered TOML
//! configuration, and [`cli`] the `retitle` binary's commands.

pub mod audit;
pub mod cli;
pub mod config;
pub mod pipeline;

pub use pipeline::{
    AuditSink, Auditor, Context, FnStep, Pipeline, Step, TransformStep, from_fn, run_pipeline,
};
