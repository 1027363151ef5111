use std::env;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

/// Resolve every input to its absolute, lexically normalized form,
/// preserving input order. Entries are independent: no path's resolution
/// depends on another's, and nothing here touches the filesystem.
pub fn resolve_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut resolved = Vec::with_capacity(inputs.len());
    for input in inputs {
        resolved.push(absolutize(input)?);
    }
    Ok(resolved)
}

pub fn absolutize(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        let cwd = env::current_dir().context("resolving current directory")?;
        cwd.join(path)
    };
    Ok(normalize(&joined))
}

/// Lexical cleanup: drops `.` components and folds `..` against the
/// preceding component. `..` never pops past the root.
fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    parts.iter().map(|part| part.as_os_str()).collect()
}
