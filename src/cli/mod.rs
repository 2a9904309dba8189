//! CLI command implementations for retitle.
//!
//! Provides subcommand handlers for:
//! - `retitle strip [TITLE]...`: run the pipeline over titles or stdin lines
//! - `retitle steps`: list built-in steps
//! - `retitle audit --last N`: show recent audit log entries
//! - `retitle config show|init|set|reset`: configuration management

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use colored::Colorize;
use serde::Serialize;

use crate::audit::{CollectingSink, FanOut, JsonlSink, StderrSink, log};
use crate::config::{self, RetitleConfig};
use crate::pipeline::registry;
use crate::pipeline::{AuditSink, Context, Pipeline};

/// Output format for `strip` and `audit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

// ---------------------------------------------------------------------------
// retitle strip
// ---------------------------------------------------------------------------

/// Command-line overrides for `retitle strip`.
#[derive(Debug, Clone, Default)]
pub struct StripOptions {
    /// Comma-separated step names; replaces `[pipeline] steps`.
    pub steps: Option<String>,
    /// Suppress the stderr echo of audit messages.
    pub quiet: bool,
    /// Append audit messages to the JSONL log.
    pub log: bool,
}

/// Settings after merging config and command-line flags.
#[derive(Debug, Clone, PartialEq)]
pub struct StripSettings {
    pub steps: Vec<String>,
    pub echo: bool,
    pub log_path: Option<PathBuf>,
}

/// Merge the loaded config with command-line flags (flags win).
pub fn resolve_settings(cfg: &RetitleConfig, opts: &StripOptions) -> StripSettings {
    let steps = match &opts.steps {
        Some(raw) => registry::parse_step_list(raw),
        None => cfg.pipeline.steps.clone(),
    };

    let log_path = if opts.log || cfg.audit.log {
        cfg.audit
            .log_path
            .as_ref()
            .map(PathBuf::from)
            .or_else(log::audit_log_path)
    } else {
        None
    };

    StripSettings {
        steps,
        echo: cfg.audit.echo && !opts.quiet,
        log_path,
    }
}

/// Outcome of running the pipeline over one input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StripResult {
    pub input: String,
    pub output: String,
    pub audit: Vec<String>,
}

/// Run `pipeline` over every input, collecting each run's audit messages.
///
/// Every message is also forwarded to `extra`. Each input gets its own
/// [`Context`], whose request id is the 1-based input number.
pub fn process_inputs(
    pipeline: &Pipeline,
    inputs: &[String],
    extra: &mut dyn AuditSink,
) -> Vec<StripResult> {
    let mut results = Vec::with_capacity(inputs.len());

    for (index, input) in inputs.iter().enumerate() {
        let ctx = Context::with_request_id((index + 1).to_string());
        let mut collected = CollectingSink::new();
        let output = {
            let mut fan = FanOut::new();
            fan.push(&mut collected);
            fan.push(&mut *extra);
            pipeline.run(&ctx, input, Some(&mut fan))
        };

        results.push(StripResult {
            input: input.clone(),
            output,
            audit: collected.drain(),
        });
    }

    results
}

/// Strip titles given on the command line, or each stdin line when none are.
///
/// Step names are resolved before any input is read, so a misconfigured
/// pipeline fails without partial output.
pub fn run_strip(titles: Vec<String>, opts: &StripOptions, format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let settings = resolve_settings(&cfg, opts);
    let pipeline = Pipeline::from_names(&settings.steps)?;

    let inputs = if titles.is_empty() {
        read_stdin_lines()?
    } else {
        titles
    };

    let mut stderr_sink = StderrSink;
    let mut jsonl_sink = settings.log_path.clone().map(JsonlSink::with_path);
    let results = {
        let mut extra = FanOut::new();
        if settings.echo {
            extra.push(&mut stderr_sink);
        }
        if let Some(sink) = jsonl_sink.as_mut() {
            extra.push(sink);
        }
        process_inputs(&pipeline, &inputs, &mut extra)
    };

    if let Some(sink) = &jsonl_sink
        && sink.failed_writes() > 0
    {
        eprintln!(
            "{} {} audit entries could not be written to {}",
            "warning:".yellow().bold(),
            sink.failed_writes(),
            sink.path().map(|p| p.display().to_string()).unwrap_or_default()
        );
    }

    let mut stdout = std::io::stdout().lock();
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&results)?;
            writeln!(stdout, "{json}").context("failed writing output to stdout")?;
        }
        OutputFormat::Text => {
            for result in &results {
                writeln!(stdout, "{}", result.output).context("failed writing output to stdout")?;
            }
        }
    }

    Ok(())
}

fn read_stdin_lines() -> Result<Vec<String>> {
    std::io::stdin()
        .lock()
        .lines()
        .collect::<std::io::Result<Vec<_>>>()
        .context("failed reading titles from stdin")
}

// ---------------------------------------------------------------------------
// retitle steps
// ---------------------------------------------------------------------------

/// List the built-in steps and mark the ones the current config runs.
pub fn run_steps() -> Result<()> {
    let cfg = config::load();

    println!("{}", "Built-in Transform Steps".bold().cyan());
    println!("{}", "=".repeat(60));
    for info in registry::available_steps() {
        let active = cfg
            .pipeline
            .steps
            .iter()
            .any(|name| registry::lookup(name).is_some_and(|i| i.name == info.name));
        let marker = if active { "✓".green().bold() } else { "·".dimmed() };
        println!("  {} {:<16} {}", marker, info.name.bold(), info.description.dimmed());
    }
    println!();
    println!(
        "  {} {}",
        "Configured order:".bold(),
        if cfg.pipeline.steps.is_empty() {
            "(none, identity)".to_string()
        } else {
            cfg.pipeline.steps.join(" → ")
        }
    );

    Ok(())
}

// ---------------------------------------------------------------------------
// retitle audit
// ---------------------------------------------------------------------------

/// Print the last `last` entries of the audit log.
pub fn run_audit(last: usize, format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let path = cfg
        .audit
        .log_path
        .map(PathBuf::from)
        .or_else(log::audit_log_path)
        .context("could not determine home directory")?;

    let entries = log::read_last_entries(&path, last);

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!(
            "{}",
            format!("No audit entries in {}.", path.display()).yellow()
        );
        return Ok(());
    }

    for entry in &entries {
        let id = entry
            .request_id
            .as_deref()
            .map(|id| format!("[{id}] "))
            .unwrap_or_default();
        println!("{} {}{}", entry.timestamp.dimmed(), id.dimmed(), entry.message);
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// retitle config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let config = config::load();
    let toml_str = config::render_config(&config)?;
    println!("{}", "Effective retitle Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source("~/.retitle/config.toml", global_exists);
    print_source(".retitle.toml", project_exists);
    println!(
        "  {} {}",
        "·".dimmed(),
        "RETITLE_* environment variables".dimmed()
    );

    if let Err(err) = config::validate(&config) {
        println!();
        println!("{} {err:#}", "✗".red().bold());
    }

    Ok(())
}

fn print_source(label: &str, exists: bool) {
    if exists {
        println!("  {} {}", "✓".green(), label.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{label} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.retitle/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_output_format_parsing() {
        use clap::ValueEnum;

        assert_eq!(OutputFormat::default(), OutputFormat::Text);
        assert_eq!(OutputFormat::from_str("text", false), Ok(OutputFormat::Text));
        assert_eq!(OutputFormat::from_str("json", false), Ok(OutputFormat::Json));
        assert!(OutputFormat::from_str("jsn", false).is_err());
        assert!(OutputFormat::from_str("csv", false).is_err());
    }

    #[test]
    fn flags_override_config() {
        let cfg = RetitleConfig::default();
        let opts = StripOptions {
            steps: Some("warn-hyphen,hyphen".to_string()),
            quiet: true,
            log: false,
        };
        let settings = resolve_settings(&cfg, &opts);
        assert_eq!(settings.steps, vec!["warn-hyphen", "hyphen"]);
        assert!(!settings.echo);
        assert_eq!(settings.log_path, None);
    }

    #[test]
    fn config_log_path_is_used_when_logging() {
        let mut cfg = RetitleConfig::default();
        cfg.audit.log_path = Some("/tmp/custom.jsonl".to_string());

        let settings = resolve_settings(&cfg, &StripOptions::default());
        assert_eq!(settings.log_path, None);
        assert_eq!(settings.steps, vec!["pipe", "hyphen"]);
        assert!(settings.echo);

        let opts = StripOptions {
            log: true,
            ..StripOptions::default()
        };
        let settings = resolve_settings(&cfg, &opts);
        assert_eq!(settings.log_path, Some(PathBuf::from("/tmp/custom.jsonl")));
    }

    #[test]
    fn process_inputs_collects_per_input_audit() {
        let pipeline = Pipeline::from_names(&["warn-hyphen", "pipe", "hyphen"]).unwrap();
        let inputs = strings(&["Plain title", "Story - Site", "Other | Site"]);

        let mut forwarded = CollectingSink::new();
        let results = process_inputs(&pipeline, &inputs, &mut forwarded);

        assert_eq!(results[0].output, "Plain title");
        assert!(results[0].audit.is_empty());

        assert_eq!(results[1].output, "Story");
        assert_eq!(
            results[1].audit,
            vec![
                r#"Hyphenated suffix found in "Story - Site""#,
                r#"Removed hyphen suffix from "Story - Site", now "Story""#,
            ]
        );

        assert_eq!(results[2].output, "Other");
        assert_eq!(results[2].audit.len(), 1);

        assert_eq!(forwarded.messages().len(), 3);
    }

    #[test]
    fn process_inputs_tags_each_input_with_its_number() {
        let pipeline = Pipeline::from_names(&["pipe"]).unwrap();
        let inputs = strings(&["a | x", "b | y"]);

        let mut ids = Vec::new();
        let mut sink = |ctx: &Context, _: &str| ids.push(ctx.request_id().map(str::to_string));
        process_inputs(&pipeline, &inputs, &mut sink);

        assert_eq!(ids, vec![Some("1".to_string()), Some("2".to_string())]);
    }

    #[test]
    fn strip_results_serialize_as_objects() {
        let result = StripResult {
            input: "a | b".to_string(),
            output: "a".to_string(),
            audit: vec!["msg".to_string()],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["input"], "a | b");
        assert_eq!(json["output"], "a");
        assert_eq!(json["audit"][0], "msg");
    }
}
