//! Name → step lookup for config files and the command line.
//!
//! Step lists coming from outside the program are plain strings. They are
//! resolved here, once, before any input is processed: an unknown name is a
//! configuration error and aborts construction of the whole list.

use anyhow::{Result, bail};

use crate::pipeline::{Step, suffix};

/// A built-in step that can be referenced by name.
pub struct StepInfo {
    pub name: &'static str,
    pub description: &'static str,
    build: fn() -> Step,
}

impl StepInfo {
    pub fn build(&self) -> Step {
        (self.build)()
    }
}

const BUILTIN_STEPS: &[StepInfo] = &[
    StepInfo {
        name: "pipe",
        description: "Remove everything from the first \" | \" onward",
        build: suffix::pipe_step,
    },
    StepInfo {
        name: "hyphen",
        description: "Remove everything from the first \" - \" onward",
        build: suffix::hyphen_step,
    },
    StepInfo {
        name: "warn-hyphen",
        description: "Report a \" - \" suffix without changing the text",
        build: suffix::warn_hyphen_step,
    },
    StepInfo {
        name: "warn-pipe",
        description: "Report a \" | \" suffix without changing the text",
        build: suffix::warn_pipe_step,
    },
    StepInfo {
        name: "first-sentence",
        description: "Keep only the text up to the first '.', '?' or '!'",
        build: suffix::first_sentence_step,
    },
];

/// All built-in steps, in listing order.
pub fn available_steps() -> &'static [StepInfo] {
    BUILTIN_STEPS
}

/// Look up a built-in step by name.
///
/// Matching ignores surrounding whitespace and case, and accepts `_` in
/// place of `-`.
pub fn lookup(name: &str) -> Option<&'static StepInfo> {
    let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
    BUILTIN_STEPS.iter().find(|info| info.name == normalized)
}

/// Build an ordered step list from names.
///
/// Fails on the first empty or unknown name, reporting its zero-based
/// position.
pub fn build_steps<S: AsRef<str>>(names: &[S]) -> Result<Vec<Step>> {
    let mut steps = Vec::with_capacity(names.len());

    for (position, name) in names.iter().enumerate() {
        let name = name.as_ref();
        if name.trim().is_empty() {
            bail!("empty transform step name at position {position}");
        }
        let Some(info) = lookup(name) else {
            let known: Vec<&str> = BUILTIN_STEPS.iter().map(|info| info.name).collect();
            bail!(
                "unknown transform step {name:?} at position {position} (known steps: {})",
                known.join(", ")
            );
        };
        steps.push(info.build());
    }

    Ok(steps)
}

/// Split a comma-separated step list (`"pipe, hyphen"`).
///
/// Blank entries are kept so [`build_steps`] can reject them with a position.
pub fn parse_step_list(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(',').map(|s| s.trim().to_string()).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
