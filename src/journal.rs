use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

const JOURNAL_FILE: &str = "operations.jsonl";
const MAX_ENTRIES: usize = 500;

#[derive(Debug, Serialize)]
pub struct JournalEntry<'a> {
    pub timestamp: &'a str,
    pub action: &'a str,
    pub from: &'a Path,
    pub to: &'a Path,
}

pub fn record_operation(dir: &Path, action: &str, from: &Path, to: &Path) -> Result<()> {
    let journal_path = ensure_journal_file(dir)?;
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".into());
    let entry = JournalEntry {
        timestamp: &timestamp,
        action,
        from,
        to,
    };
    let json = serde_json::to_string(&entry)?;
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(&journal_path)
        .with_context(|| format!("opening {journal_path:?}"))?;
    writeln!(file, "{json}")?;
    truncate_journal(&journal_path)?;
    Ok(())
}

fn ensure_journal_file(dir: &Path) -> Result<PathBuf> {
    if !dir.exists() {
        fs::create_dir_all(dir).with_context(|| format!("creating {dir:?}"))?;
    }
    Ok(dir.join(JOURNAL_FILE))
}

fn truncate_journal(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .read(true)
        .open(path)
        .with_context(|| format!("reading {path:?}"))?;
    let reader = BufReader::new(file);
    let entries: Vec<_> = reader.lines().collect::<Result<_, _>>()?;
    if entries.len() <= MAX_ENTRIES {
        return Ok(());
    }
    let keep = &entries[entries.len() - MAX_ENTRIES..];
    fs::write(path, keep.join("\n") + "\n")?;
    Ok(())
}
