use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tempfile::NamedTempFile;

/// How changed pairs are applied to the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    Move,
    Copy,
}

impl ApplyMode {
    pub fn verb(self) -> &'static str {
        match self {
            ApplyMode::Move => "renamed",
            ApplyMode::Copy => "copied",
        }
    }

    pub fn action(self) -> &'static str {
        match self {
            ApplyMode::Move => "move",
            ApplyMode::Copy => "copy",
        }
    }
}

/// One pending file operation, paired positionally from the edited list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Pair the original lines with the edited lines and collect the entries
/// that changed, validating the edit as a whole. Touches no files, so a
/// rejected edit leaves the filesystem untouched.
pub fn plan_operations(before: &[String], after: &[String]) -> Result<Vec<Operation>> {
    if before.len() != after.len() {
        bail!(
            "the number of lines has changed (expected {}, found {})",
            before.len(),
            after.len()
        );
    }

    let mut operations = Vec::new();
    for (index, (original, edited)) in before.iter().zip(after).enumerate() {
        if original == edited {
            continue;
        }
        if edited.is_empty() {
            bail!("line {} is empty; no destination for {original}", index + 1);
        }
        operations.push(Operation {
            from: PathBuf::from(original),
            to: PathBuf::from(edited),
        });
    }

    // Two entries landing on one destination would make one source silently
    // overwrite the other.
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for edited in after {
        *counts.entry(edited.as_str()).or_default() += 1;
    }
    for (original, edited) in before.iter().zip(after) {
        if original != edited && counts[edited.as_str()] > 1 {
            bail!("duplicate destination {edited}");
        }
    }

    Ok(operations)
}

impl Operation {
    /// Apply this operation, creating the destination's parent directory
    /// chain first.
    pub fn apply(&self, mode: ApplyMode) -> Result<()> {
        ensure_parent_dir(&self.to)?;
        match mode {
            ApplyMode::Move => fs::rename(&self.from, &self.to).with_context(|| {
                format!("renaming {} -> {}", self.from.display(), self.to.display())
            }),
            ApplyMode::Copy => copy_file(&self.from, &self.to),
        }
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Stream the source into a sibling temp file and rename it over the
/// destination, so an interrupted copy never leaves a truncated file.
/// The source is left untouched.
fn copy_file(from: &Path, to: &Path) -> Result<()> {
    let mut source = fs::File::open(from).with_context(|| format!("opening {}", from.display()))?;
    let dir = to
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut staged = NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;
    io::copy(&mut source, &mut staged)
        .with_context(|| format!("copying {} -> {}", from.display(), to.display()))?;
    staged
        .as_file()
        .sync_all()
        .with_context(|| format!("syncing {}", to.display()))?;
    staged
        .persist(to)
        .with_context(|| format!("replacing {}", to.display()))?;
    Ok(())
}
