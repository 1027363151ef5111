use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{ArgAction, Parser, ValueHint};

mod apply;
mod editor;
mod journal;
mod paths;

use apply::ApplyMode;
use editor::EditorCommand;

#[derive(Debug, Parser)]
#[command(name = "edmv", version, about = "Bulk-rename files in your text editor")]
struct Cli {
    /// Files to rename, one buffer line each.
    #[arg(value_name = "PATH", value_hint = ValueHint::AnyPath)]
    paths: Vec<PathBuf>,
    /// Copy files to their edited paths instead of moving them.
    #[arg(short = 'c', long = "copy", action = ArgAction::SetTrue)]
    copy: bool,
    /// Record applied operations as JSONL in this directory.
    #[arg(long = "journal", value_name = "DIR", value_hint = ValueHint::DirPath)]
    journal: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    if cli.paths.is_empty() {
        bail!("no paths given; usage: edmv [-c] FILE...");
    }
    let editor = EditorCommand::from_env()?;
    let mode = if cli.copy {
        ApplyMode::Copy
    } else {
        ApplyMode::Move
    };
    run_session(&cli.paths, &editor, mode, cli.journal.as_deref())
}

/// The whole pipeline: resolve -> edit -> plan -> apply. Planning validates
/// the edited list before any filesystem mutation; application is fail-fast
/// in line order.
fn run_session(
    inputs: &[PathBuf],
    editor: &EditorCommand,
    mode: ApplyMode,
    journal_dir: Option<&Path>,
) -> Result<()> {
    let before = paths::resolve_paths(inputs)?;
    let before_lines: Vec<String> = before
        .iter()
        .map(|path| path.display().to_string())
        .collect();
    let after_lines = editor::edit_path_list(editor, &before_lines)?;
    let operations = apply::plan_operations(&before_lines, &after_lines)?;

    let mut stats = RunStats {
        unchanged: before_lines.len() - operations.len(),
        ..RunStats::default()
    };
    for operation in &operations {
        operation.apply(mode)?;
        println!(
            "{} {} -> {}",
            mode.verb(),
            operation.from.display(),
            operation.to.display()
        );
        if let Some(dir) = journal_dir {
            let _ = journal::record_operation(dir, mode.action(), &operation.from, &operation.to);
        }
        stats.count(mode);
    }
    stats.print();
    Ok(())
}

#[derive(Default)]
struct RunStats {
    moved: usize,
    copied: usize,
    unchanged: usize,
}

impl RunStats {
    fn count(&mut self, mode: ApplyMode) {
        match mode {
            ApplyMode::Move => self.moved += 1,
            ApplyMode::Copy => self.copied += 1,
        }
    }

    fn print(&self) {
        println!(
            "summary: moved={}, copied={}, unchanged={}",
            self.moved, self.copied, self.unchanged
        );
    }
}
