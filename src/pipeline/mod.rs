//! Transform pipeline for titles and other short strings.
//!
//! A pipeline is an ordered list of [`TransformStep`]s. Each step receives
//! the output of the previous one and may report what it did through an
//! [`Auditor`]. Reporting is fully decoupled from transformation: the caller
//! decides where audit messages go (stderr, a JSONL log, a `Vec`, nowhere).
//!
//! # Step shapes
//!
//! 1. **Functions / closures**: anything matching
//!    `Fn(&Context, &str, &mut Auditor<'_>) -> String`, adapted with
//!    [`from_fn`] or [`FnStep::named`].
//! 2. **Values**: any type implementing [`TransformStep`] directly.
//!
//! Both are stored as [`Step`] and dispatched the same way by
//! [`run_pipeline`].
//!
//! # Example
//!
//! ```rust,ignore
//! use retitle::pipeline::{Context, run_pipeline, suffix};
//!
//! let steps = vec![suffix::pipe_step(), suffix::hyphen_step()];
//! let title = run_pipeline(&Context::background(), "Title | Site", None, &steps);
//! assert_eq!(title, "Title");
//! ```

pub mod registry;
pub mod suffix;

use anyhow::Result;

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Request-scoped handle threaded through every step and audit call.
///
/// The runner never inspects it. Audit sinks may read the request id to
/// correlate messages.
#[derive(Debug, Clone, Default)]
pub struct Context {
    request_id: Option<String>,
}

impl Context {
    /// A context with no request id.
    pub fn background() -> Self {
        Self { request_id: None }
    }

    pub fn with_request_id(id: impl Into<String>) -> Self {
        Self {
            request_id: Some(id.into()),
        }
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Audit sink
// ---------------------------------------------------------------------------

/// Receiver of human-readable diagnostic messages.
///
/// Implemented for every `FnMut(&Context, &str)`, so a closure is usually
/// enough. Implementations must not panic on well-formed messages; the
/// pipeline does not guard against a failing sink.
pub trait AuditSink {
    fn audit(&mut self, ctx: &Context, message: &str);
}

impl<F> AuditSink for F
where
    F: FnMut(&Context, &str),
{
    fn audit(&mut self, ctx: &Context, message: &str) {
        self(ctx, message)
    }
}

/// Handle given to steps for emitting audit messages.
///
/// Wraps an optional sink: when no sink was supplied every emit is a no-op
/// and [`emit_with`](Auditor::emit_with) never builds its message.
pub struct Auditor<'a> {
    sink: Option<&'a mut dyn AuditSink>,
}

impl<'a> Auditor<'a> {
    pub fn new(sink: Option<&'a mut dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// An auditor that discards everything.
    pub fn silent() -> Self {
        Self { sink: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn emit(&mut self, ctx: &Context, message: &str) {
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.audit(ctx, message);
        }
    }

    /// Emit a message built lazily, only when a sink is present.
    pub fn emit_with<F>(&mut self, ctx: &Context, message: F)
    where
        F: FnOnce() -> String,
    {
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.audit(ctx, &message());
        }
    }
}

// ---------------------------------------------------------------------------
// Transform step
// ---------------------------------------------------------------------------

/// A single unit of work in a pipeline.
///
/// `transform` must be total: it returns a string for every input and never
/// panics. Returning `from` unchanged is always valid.
pub trait TransformStep {
    /// Short identifier used in listings and error messages.
    fn name(&self) -> &str {
        "custom"
    }

    fn transform(&self, ctx: &Context, from: &str, audit: &mut Auditor<'_>) -> String;

    fn boxed(self) -> Step
    where
        Self: Sized + Send + Sync + 'static,
    {
        Box::new(self)
    }
}

/// An owned, type-erased step.
pub type Step = Box<dyn TransformStep + Send + Sync>;

/// Adapter turning a function or closure into a [`TransformStep`].
pub struct FnStep<F> {
    name: &'static str,
    func: F,
}

impl<F> FnStep<F>
where
    F: Fn(&Context, &str, &mut Auditor<'_>) -> String,
{
    pub fn named(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

/// Wrap a function or closure as an anonymous step.
pub fn from_fn<F>(func: F) -> FnStep<F>
where
    F: Fn(&Context, &str, &mut Auditor<'_>) -> String,
{
    FnStep::named("custom", func)
}

impl<F> TransformStep for FnStep<F>
where
    F: Fn(&Context, &str, &mut Auditor<'_>) -> String,
{
    fn name(&self) -> &str {
        self.name
    }

    fn transform(&self, ctx: &Context, from: &str, audit: &mut Auditor<'_>) -> String {
        (self.func)(ctx, from, audit)
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Apply `steps` to `input` in order, threading each result into the next
/// step, and return the final string.
///
/// An empty step list returns `input` unchanged. With `audit = None` every
/// audit call is skipped. Audit messages reach the sink in the order the
/// steps emit them.
pub fn run_pipeline(
    ctx: &Context,
    input: &str,
    audit: Option<&mut dyn AuditSink>,
    steps: &[Step],
) -> String {
    let mut auditor = Auditor::new(audit);
    let mut result = input.to_string();

    for step in steps {
        result = step.transform(ctx, &result, &mut auditor);
    }

    result
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// An immutable, reusable list of steps.
///
/// Holds no per-run state, so one `Pipeline` may be shared by reference
/// across threads and runs.
#[derive(Default)]
pub struct Pipeline {
    steps: Vec<Step>,
}

impl Pipeline {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Build a pipeline from built-in step names.
    ///
    /// Fails on the first unknown name; see [`registry::build_steps`].
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        Ok(Self::new(registry::build_steps(names)?))
    }

    pub fn run(&self, ctx: &Context, input: &str, audit: Option<&mut dyn AuditSink>) -> String {
        run_pipeline(ctx, input, audit, &self.steps)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
