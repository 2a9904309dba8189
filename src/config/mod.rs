/// Configuration system for retitle.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: hardcoded in [`schema::RetitleConfig::default()`]
/// 2. **User global config**: `~/.retitle/config.toml`
/// 3. **Project local config**: `.retitle.toml` in the current working directory
/// 4. **Environment variables**: `RETITLE_*` overrides
///
/// Command-line flags are applied on top by the CLI. Missing sections in a
/// TOML file fall back to the previous layer's values.
///
/// # Usage
///
/// ```rust,ignore
/// use retitle::config;
///
/// let cfg = config::load();
/// let pipeline = Pipeline::from_names(&cfg.pipeline.steps)?;
/// ```
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use toml::Table;

use crate::pipeline::registry;
pub use schema::RetitleConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges defaults → global TOML → project TOML → env vars.
pub fn load() -> RetitleConfig {
    let layers = [global_config_path(), project_config_path()]
        .into_iter()
        .filter_map(load_toml_file);
    let mut config = resolve_layers(layers);

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    config
}

/// Load a TOML config file from the given path (if it exists).
///
/// Returns `None` if the path is `None`, the file doesn't exist, or the
/// content is not valid TOML.
fn load_toml_file(path: Option<PathBuf>) -> Option<Table> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    toml::from_str(&content).ok()
}

/// Merge file layers (lowest precedence first) on top of the defaults.
///
/// Layers are merged key by key, so a section or key missing from a later
/// layer keeps the earlier layer's value. A layer that does not match the
/// schema on its own is ignored as a whole.
fn resolve_layers<I>(layers: I) -> RetitleConfig
where
    I: IntoIterator<Item = Table>,
{
    let mut merged = Table::new();

    for layer in layers {
        if toml::Value::Table(layer.clone())
            .try_into::<RetitleConfig>()
            .is_err()
        {
            continue;
        }
        merge_tables(&mut merged, layer);
    }

    toml::Value::Table(merged).try_into().unwrap_or_default()
}

/// Deep-merge `overlay` into `base`: nested tables merge, anything else
/// replaces.
fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(incoming) => {
                if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                    merge_tables(existing, incoming);
                } else {
                    base.insert(key, toml::Value::Table(incoming));
                }
            }
            other => {
                base.insert(key, other);
            }
        }
    }
}

/// Check that every configured step name resolves to a built-in step.
pub fn validate(config: &RetitleConfig) -> Result<()> {
    registry::build_steps(&config.pipeline.steps)
        .map(|_| ())
        .context("invalid [pipeline] steps")
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.retitle/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".retitle").join("config.toml"))
}

/// Path to the project local config: `.retitle.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".retitle.toml"))
}

/// Return the path to the global config file for display purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides.
///
/// Supported variables:
/// - `RETITLE_STEPS`: comma-separated step names
/// - `RETITLE_AUDIT_ECHO`: echo audit messages to stderr (`1`/`true`/`yes`/`on`)
/// - `RETITLE_AUDIT_LOG`: append audit messages to the JSONL log
/// - `RETITLE_AUDIT_LOG_PATH`: audit log location
///
/// `var` looks a variable up; [`load`] passes `std::env::var`.
fn apply_env_overrides<F>(config: &mut RetitleConfig, var: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = var("RETITLE_STEPS") {
        config.pipeline.steps = registry::parse_step_list(&val);
    }
    if let Some(val) = var("RETITLE_AUDIT_ECHO") {
        config.audit.echo = is_truthy(&val);
    }
    if let Some(val) = var("RETITLE_AUDIT_LOG") {
        config.audit.log = is_truthy(&val);
    }
    if let Some(val) = var("RETITLE_AUDIT_LOG_PATH")
        && !val.is_empty()
    {
        config.audit.log_path = Some(val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.retitle/config.toml`.
///
/// Returns an error if the file already exists (use `force = true` to
/// overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.retitle/ directory")?;
    }

    fs::write(&path, RetitleConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key in the global config file.
///
/// Supports dotted keys like `audit.log` or `pipeline.steps`. The result is
/// validated before it is written, so an unknown key or step name never
/// reaches disk.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let existing = if path.exists() {
        Some(fs::read_to_string(&path).context("failed to read config file")?)
    } else {
        None
    };

    let output = apply_config_edit(existing.as_deref(), key, value)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Apply `key = value` to a config file's content and return the new
/// content.
///
/// Only the edited key is added to the file; everything else the file
/// already holds is kept as is.
fn apply_config_edit(existing: Option<&str>, key: &str, raw_value: &str) -> Result<String> {
    let mut root: Table = match existing {
        Some(content) => toml::from_str(content).context("failed to parse config as TOML")?,
        None => Table::new(),
    };

    set_toml_value(&mut root, &schema_template()?, key, raw_value)?;

    let updated: RetitleConfig = toml::Value::Table(root.clone())
        .try_into()
        .context("updated config no longer matches the schema")?;
    validate(&updated)?;

    toml::to_string_pretty(&root).context("failed to serialize updated config")
}

/// Every settable key with a value of the right type.
///
/// Optional fields are filled in so they show up in the tree.
fn schema_template() -> Result<Table> {
    let mut config = RetitleConfig::default();
    config.audit.log_path = Some(String::new());

    match toml::Value::try_from(config).context("failed to serialize config schema")? {
        toml::Value::Table(table) => Ok(table),
        _ => anyhow::bail!("config schema is not a table"),
    }
}

/// Set a value in a TOML table using a dotted key path.
///
/// The key must exist in `template`, which also decides how `raw_value` is
/// parsed. Missing sections are created in `root`.
fn set_toml_value(root: &mut Table, template: &Table, key: &str, raw_value: &str) -> Result<()> {
    let Some((section, leaf)) = key.rsplit_once('.') else {
        anyhow::bail!("config key must be dotted, e.g. 'audit.log', got '{key}'");
    };

    let mut expected = template;
    let mut current = root;
    for part in section.split('.') {
        expected = expected
            .get(part)
            .and_then(toml::Value::as_table)
            .with_context(|| format!("unknown config section '{part}' in '{key}'"))?;
        current = current
            .entry(part)
            .or_insert_with(|| toml::Value::Table(Table::new()))
            .as_table_mut()
            .with_context(|| format!("expected table at '{part}' in '{key}'"))?;
    }

    let new_value = match expected.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Array(_)) => toml::Value::Array(
            registry::parse_step_list(raw_value)
                .into_iter()
                .map(toml::Value::String)
                .collect(),
        ),
        Some(toml::Value::String(_)) => toml::Value::String(raw_value.to_string()),
        Some(_) => anyhow::bail!("config key '{key}' cannot be set from the command line"),
        None => anyhow::bail!("unknown config key '{key}'"),
    };

    current.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Render a resolved config as TOML.
pub fn render_config(config: &RetitleConfig) -> Result<String> {
    toml::to_string_pretty(config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
