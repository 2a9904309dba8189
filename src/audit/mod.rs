//! Ready-made audit sinks.
//!
//! The pipeline only knows the [`AuditSink`] trait; these are the sinks the
//! CLI wires together:
//!
//! - [`CollectingSink`] keeps messages in memory (JSON output, tests).
//! - [`StderrSink`] echoes messages to stderr in color.
//! - [`JsonlSink`] appends messages to the audit log (`~/.retitle/audit-log.jsonl`).
//! - [`FanOut`] forwards every message to several sinks in order.

pub mod log;

use std::path::PathBuf;

use colored::Colorize;

use crate::pipeline::{AuditSink, Context};

// ---------------------------------------------------------------------------
// Collecting
// ---------------------------------------------------------------------------

/// Stores every message it receives.
#[derive(Debug, Default)]
pub struct CollectingSink {
    messages: Vec<String>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Take the collected messages, leaving the sink empty.
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }
}

impl AuditSink for CollectingSink {
    fn audit(&mut self, _ctx: &Context, message: &str) {
        self.messages.push(message.to_string());
    }
}

// ---------------------------------------------------------------------------
// Stderr
// ---------------------------------------------------------------------------

/// Prints each message to stderr, prefixed with the request id when set.
#[derive(Debug, Default)]
pub struct StderrSink;

impl AuditSink for StderrSink {
    fn audit(&mut self, ctx: &Context, message: &str) {
        match ctx.request_id() {
            Some(id) => eprintln!("{} {} {}", "audit".yellow(), format!("[{id}]").dimmed(), message),
            None => eprintln!("{} {}", "audit".yellow(), message),
        }
    }
}

// ---------------------------------------------------------------------------
// JSONL
// ---------------------------------------------------------------------------

/// Appends each message to a JSONL audit log.
///
/// Best effort: write failures are counted, never surfaced, so the sink
/// cannot fail a pipeline run.
#[derive(Debug)]
pub struct JsonlSink {
    path: Option<PathBuf>,
    failed_writes: usize,
}

impl JsonlSink {
    /// Log to the default location, `~/.retitle/audit-log.jsonl`.
    pub fn new() -> Self {
        Self {
            path: log::audit_log_path(),
            failed_writes: 0,
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            failed_writes: 0,
        }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    pub fn failed_writes(&self) -> usize {
        self.failed_writes
    }
}

impl Default for JsonlSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditSink for JsonlSink {
    fn audit(&mut self, ctx: &Context, message: &str) {
        let Some(path) = &self.path else {
            return;
        };
        let entry = log::AuditEntry::new(ctx, message);
        if log::append_entry(path, &entry).is_err() {
            self.failed_writes += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Fan-out
// ---------------------------------------------------------------------------

/// Forwards every message to each inner sink, in insertion order.
#[derive(Default)]
pub struct FanOut<'a> {
    sinks: Vec<&'a mut dyn AuditSink>,
}

impl<'a> FanOut<'a> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn push(&mut self, sink: &'a mut dyn AuditSink) {
        self.sinks.push(sink);
    }
}

impl AuditSink for FanOut<'_> {
    fn audit(&mut self, ctx: &Context, message: &str) {
        for sink in &mut self.sinks {
            sink.audit(ctx, message);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_sink_keeps_order_and_drains() {
        let ctx = Context::background();
        let mut sink = CollectingSink::new();
        sink.audit(&ctx, "first");
        sink.audit(&ctx, "second");
        assert_eq!(sink.messages(), ["first", "second"]);

        assert_eq!(sink.drain(), vec!["first", "second"]);
        assert!(sink.messages().is_empty());
    }

    #[test]
    fn fan_out_reaches_every_sink() {
        let ctx = Context::background();
        let mut a = CollectingSink::new();
        let mut b = CollectingSink::new();
        {
            let mut fan = FanOut::new();
            fan.push(&mut a);
            fan.push(&mut b);
            fan.audit(&ctx, "hello");
        }
        assert_eq!(a.messages(), ["hello"]);
        assert_eq!(b.messages(), ["hello"]);
    }

    #[test]
    fn jsonl_sink_without_path_is_a_no_op() {
        let ctx = Context::background();
        let mut sink = JsonlSink {
            path: None,
            failed_writes: 0,
        };
        sink.audit(&ctx, "ignored");
        assert_eq!(sink.failed_writes(), 0);
    }

    #[test]
    fn jsonl_sink_appends_entries() {
        let path = std::env::temp_dir().join(format!(
            "retitle-sink-test-{}.jsonl",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let ctx = Context::with_request_id("r1");
        let mut sink = JsonlSink::with_path(&path);
        sink.audit(&ctx, "one");
        sink.audit(&ctx, "two");
        assert_eq!(sink.failed_writes(), 0);

        let entries = log::read_entries(&path);
        let messages: Vec<&str> = entries.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["one", "two"]);
        assert_eq!(entries[0].request_id.as_deref(), Some("r1"));

        let _ = std::fs::remove_file(&path);
    }
}
