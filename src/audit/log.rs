use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::pipeline::Context;

// ---------------------------------------------------------------------------
// Audit log entry (JSONL)
// ---------------------------------------------------------------------------

/// A single line of the audit log (`~/.retitle/audit-log.jsonl`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// RFC 3339 time the message was emitted.
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub request_id: Option<String>,
    pub message: String,
}

impl AuditEntry {
    pub fn new(ctx: &Context, message: &str) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id: ctx.request_id().map(str::to_string),
            message: message.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

pub fn append_entry(path: &Path, entry: &AuditEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

/// Read every entry from an audit log.
///
/// Silently skips malformed lines. Returns an empty vec if the file does not
/// exist or cannot be read.
pub fn read_entries(path: &Path) -> Vec<AuditEntry> {
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str::<AuditEntry>(&line).ok())
        .collect()
}

/// Read the last `n` entries, oldest first.
pub fn read_last_entries(path: &Path, n: usize) -> Vec<AuditEntry> {
    let mut entries = read_entries(path);
    let skip = entries.len().saturating_sub(n);
    entries.drain(..skip);
    entries
}

/// Return the path to the default audit log file.
pub fn audit_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".retitle").join("audit-log.jsonl"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "retitle-log-{name}-{}.jsonl",
            std::process::id()
        ));
        let _ = fs::remove_file(&path);
        path
    }

    #[test]
    fn entry_omits_missing_request_id() {
        let entry = AuditEntry::new(&Context::background(), "msg");
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("request_id"));
        assert!(json.contains("\"message\":\"msg\""));
    }

    #[test]
    fn read_skips_malformed_lines() {
        let path = temp_log("malformed");
        let entry = AuditEntry::new(&Context::with_request_id("a"), "kept");
        append_entry(&path, &entry).unwrap();
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            writeln!(file, "not json").unwrap();
        }
        append_entry(&path, &entry).unwrap();

        let entries = read_entries(&path);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], entry);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn read_last_keeps_newest() {
        let path = temp_log("last");
        let ctx = Context::background();
        for message in ["1", "2", "3"] {
            append_entry(&path, &AuditEntry::new(&ctx, message)).unwrap();
        }

        let last: Vec<String> = read_last_entries(&path, 2)
            .into_iter()
            .map(|e| e.message)
            .collect();
        assert_eq!(last, vec!["2", "3"]);
        assert_eq!(read_last_entries(&path, 10).len(), 3);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn missing_file_reads_empty() {
        let path = temp_log("missing");
        assert!(read_entries(&path).is_empty());
    }
}
