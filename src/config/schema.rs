/// Configuration schema and defaults for retitle.
///
/// Defines the TOML-serializable configuration structure with the
/// `[pipeline]` and `[audit]` sections. Every field has a built-in default;
/// users only set what they want to override.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level retitle configuration.
///
/// Maps directly to `~/.retitle/config.toml` and `.retitle.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetitleConfig {
    pub pipeline: PipelineConfig,
    pub audit: AuditConfig,
}

// ---------------------------------------------------------------------------
// [pipeline]
// ---------------------------------------------------------------------------

/// Which steps run, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Built-in step names, applied first to last.
    pub steps: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            steps: vec!["pipe".to_string(), "hyphen".to_string()],
        }
    }
}

// ---------------------------------------------------------------------------
// [audit]
// ---------------------------------------------------------------------------

/// Where audit messages go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Echo audit messages to stderr.
    pub echo: bool,
    /// Append audit messages to the JSONL audit log.
    pub log: bool,
    /// Override for the audit log location. Defaults to
    /// `~/.retitle/audit-log.jsonl`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_path: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            echo: true,
            log: false,
            log_path: None,
        }
    }
}

impl RetitleConfig {
    /// Annotated default config written by `retitle config init`.
    pub fn default_toml() -> &'static str {
        r#"# retitle configuration
#
# Layers, lowest to highest precedence:
#   built-in defaults -> ~/.retitle/config.toml -> ./.retitle.toml
#   -> RETITLE_* environment variables -> command-line flags

[pipeline]
# Built-in steps, applied first to last. See `retitle steps`.
steps = ["pipe", "hyphen"]

[audit]
# Echo audit messages to stderr.
echo = true
# Append audit messages to ~/.retitle/audit-log.jsonl.
log = false
# log_path = "/path/to/audit-log.jsonl"
"#
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
